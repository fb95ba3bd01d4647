use std::time::Duration;

use blogsmith_core::error::AppError;
use blogsmith_core::publish::{PostPayload, PublishCredentials, PublishResult};
use blogsmith_core::traits::Publisher;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// WordPress REST API client authenticating with application passwords.
///
/// Holds no session state: credentials are supplied on every call.
#[derive(Clone)]
pub struct WordPressPublisher {
    client: Client,
    timeout_secs: u64,
}

impl WordPressPublisher {
    pub fn new() -> Result<Self, AppError> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::HttpError(e.to_string()))?;

        Ok(Self {
            client,
            timeout_secs: timeout.as_secs(),
        })
    }

    fn transport_error(&self, e: &reqwest::Error) -> String {
        if e.is_timeout() {
            format!("Request timed out after {} seconds", self.timeout_secs)
        } else if e.is_connect() {
            format!("Connection failed: {}", e)
        } else {
            e.to_string()
        }
    }
}

#[derive(Serialize)]
struct NewPost<'a> {
    title: &'a str,
    content: &'a str,
    status: &'a str,
    excerpt: &'a str,
}

#[derive(Deserialize)]
struct CreatedPost {
    id: u64,
    link: String,
}

#[derive(Deserialize)]
struct WpError {
    message: String,
}

/// Failure reason for a non-2xx response: the server's `message` if the body
/// carries one, else the status line.
async fn failure_reason(response: Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    serde_json::from_str::<WpError>(&body)
        .map(|e| e.message)
        .unwrap_or_else(|_| status_line(status))
}

fn status_line(status: StatusCode) -> String {
    format!(
        "HTTP {}: {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or("Unknown Status")
    )
}

fn endpoint(credentials: &PublishCredentials, route: &str) -> String {
    format!("{}/wp-json/wp/v2/{}", credentials.site_url(), route)
}

impl Publisher for WordPressPublisher {
    async fn probe(&self, credentials: &PublishCredentials) -> Result<(), AppError> {
        let response = self
            .client
            .get(endpoint(credentials, "users/me"))
            .basic_auth(
                credentials.username(),
                Some(credentials.application_password()),
            )
            .send()
            .await
            .map_err(|e| AppError::ConnectivityError(self.transport_error(&e)))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(AppError::ConnectivityError(failure_reason(response).await))
        }
    }

    async fn publish(&self, credentials: &PublishCredentials, post: &PostPayload) -> PublishResult {
        let body = NewPost {
            title: &post.title,
            content: &post.content,
            status: post.status.as_str(),
            excerpt: post.excerpt.as_deref().unwrap_or(""),
        };

        let response = match self
            .client
            .post(endpoint(credentials, "posts"))
            .basic_auth(
                credentials.username(),
                Some(credentials.application_password()),
            )
            .json(&body)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => return PublishResult::failed(self.transport_error(&e)),
        };

        if !response.status().is_success() {
            return PublishResult::failed(failure_reason(response).await);
        }

        let text = match response.text().await {
            Ok(t) => t,
            Err(e) => return PublishResult::failed(self.transport_error(&e)),
        };
        match serde_json::from_str::<CreatedPost>(&text) {
            Ok(created) => PublishResult::Published {
                remote_id: created.id,
                remote_url: created.link,
            },
            Err(e) => PublishResult::failed(
                AppError::MalformedResponse(format!("Unexpected post response: {}", e))
                    .to_string(),
            ),
        }
    }
}
