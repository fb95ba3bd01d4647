use blogsmith_core::error::AppError;
use blogsmith_core::models::Article;
use blogsmith_core::traits::ContentGenerator;
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};

use crate::config::{Endpoint, GeneratorConfig};

const SYSTEM_PROMPT: &str = "You are a professional blog writer.";

/// Chat-completions client that writes one blog article per topic.
///
/// Works with Azure OpenAI deployments and any OpenAI-compatible API;
/// see [`Endpoint`].
#[derive(Clone)]
pub struct ChatCompletionGenerator {
    client: Client,
    url: String,
    config: GeneratorConfig,
}

impl ChatCompletionGenerator {
    pub fn new(config: GeneratorConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AppError::HttpError(e.to_string()))?;

        let url = match &config.endpoint {
            Endpoint::Azure { api_version } => format!(
                "{}/openai/deployments/{}/chat/completions?api-version={}",
                config.base_url, config.deployment, api_version
            ),
            Endpoint::OpenAiCompatible => format!("{}/chat/completions", config.base_url),
        };

        Ok(Self {
            client,
            url,
            config,
        })
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.config.endpoint {
            Endpoint::Azure { .. } => request.header("api-key", &self.config.api_key),
            Endpoint::OpenAiCompatible => request.bearer_auth(&self.config.api_key),
        }
    }
}

/// User prompt for one article. The instruction, if any, is appended as-is.
pub fn build_prompt(topic: &str, instruction: Option<&str>) -> String {
    let mut prompt = format!(
        "Write a detailed blog post on the topic \"{topic}\". Include introduction, benefits, \
         implementation strategies, challenges, and future trends. Please provide all the \
         content with suitable html tags only. Remove html, header and body tags."
    );
    if let Some(instruction) = instruction {
        prompt.push(' ');
        prompt.push_str(instruction);
    }
    prompt
}

// ---- Chat completions API types ----

#[derive(Serialize)]
struct ChatRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
    messages: Vec<Message>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ApiError {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

impl ContentGenerator for ChatCompletionGenerator {
    async fn generate(
        &self,
        topic: &str,
        repetition_index: Option<u32>,
        instruction: Option<&str>,
    ) -> Result<Article, AppError> {
        let model = match self.config.endpoint {
            Endpoint::Azure { .. } => None,
            Endpoint::OpenAiCompatible => Some(self.config.deployment.as_str()),
        };
        let request = ChatRequest {
            model,
            messages: vec![
                Message {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                Message {
                    role: "user",
                    content: build_prompt(topic, instruction),
                },
            ],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        tracing::debug!(%topic, ?repetition_index, url = %self.url, "Requesting article");

        let response = self
            .authorize(self.client.post(&self.url))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::Timeout(self.config.timeout.as_secs())
                } else if e.is_connect() {
                    AppError::NetworkError(format!("Connection failed: {}", e))
                } else {
                    AppError::HttpError(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let status_code = status.as_u16();
            let body = response.text().await.unwrap_or_default();

            let message = serde_json::from_str::<ApiError>(&body)
                .map(|e| e.error.message)
                .unwrap_or_else(|_| format!("HTTP {}: {}", status_code, body));

            return Err(AppError::LlmError {
                message,
                status_code,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| AppError::NetworkError(format!("Failed to read response: {}", e)))?;
        let chat_response: ChatResponse = serde_json::from_str(&body).map_err(|e| {
            AppError::MalformedResponse(format!("Failed to parse completion: {}", e))
        })?;

        let content = chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| AppError::MalformedResponse("Empty completion".into()))?;

        Ok(Article::new(topic, format!("Blog on {topic}"), content))
    }
}
