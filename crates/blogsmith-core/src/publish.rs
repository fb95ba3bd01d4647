use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::AppError;
use crate::models::Article;

/// Whether a published post goes live immediately or lands as a draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Visibility {
    #[default]
    #[serde(rename = "draft")]
    Draft,
    #[serde(rename = "publish")]
    Live,
}

impl Visibility {
    /// Value sent to the publishing target.
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Draft => "draft",
            Visibility::Live => "publish",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Visibility {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "draft" => Ok(Visibility::Draft),
            "publish" | "live" => Ok(Visibility::Live),
            _ => Err(format!("Unknown visibility: {}", s)),
        }
    }
}

/// Site endpoint, account and application secret for the publishing target.
///
/// Passed explicitly to every probe/publish call; nothing is cached in the
/// client.
#[derive(Clone, PartialEq, Eq)]
pub struct PublishCredentials {
    site_url: String,
    username: String,
    application_password: String,
}

impl PublishCredentials {
    /// Validate and normalize credentials.
    ///
    /// A site URL without a scheme gets `https://`; other schemes than
    /// http(s) are rejected. Scheme and host are lowercased and trailing
    /// slashes removed.
    pub fn new(
        site_url: &str,
        username: impl Into<String>,
        application_password: impl Into<String>,
    ) -> Result<Self, AppError> {
        let username = username.into();
        let application_password = application_password.into();

        if site_url.trim().is_empty()
            || username.trim().is_empty()
            || application_password.trim().is_empty()
        {
            return Err(AppError::InvalidInput(
                "site URL, username and application password are all required".into(),
            ));
        }

        Ok(Self {
            site_url: normalize_site_url(site_url)?,
            username,
            application_password,
        })
    }

    pub fn site_url(&self) -> &str {
        &self.site_url
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn application_password(&self) -> &str {
        &self.application_password
    }
}

impl fmt::Debug for PublishCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublishCredentials")
            .field("site_url", &self.site_url)
            .field("username", &self.username)
            .field("application_password", &"<redacted>")
            .finish()
    }
}

fn normalize_site_url(raw: &str) -> Result<String, AppError> {
    let raw = raw.trim();
    let with_scheme = if raw.contains("://") {
        raw.to_string()
    } else {
        format!("https://{raw}")
    };

    let parsed = Url::parse(&with_scheme)
        .map_err(|e| AppError::InvalidInput(format!("Invalid site URL '{raw}': {e}")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(AppError::InvalidInput(format!(
            "Site URL '{raw}' must use http or https"
        )));
    }
    if parsed.host_str().is_none() {
        return Err(AppError::InvalidInput(format!(
            "Site URL '{raw}' has no host"
        )));
    }

    Ok(parsed.as_str().trim_end_matches('/').to_string())
}

/// A post as submitted to the publishing target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostPayload {
    pub title: String,
    pub content: String,
    pub status: Visibility,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
}

impl PostPayload {
    pub fn from_article(article: &Article, status: Visibility) -> Self {
        Self {
            title: article.title.clone(),
            content: article.body.clone(),
            status,
            excerpt: Some(article.summary.clone()),
        }
    }
}

/// Outcome of one publish attempt. Positional: the i-th result belongs to
/// the i-th submitted article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum PublishResult {
    Published { remote_id: u64, remote_url: String },
    Failed { error: String },
}

impl PublishResult {
    pub fn failed(error: impl Into<String>) -> Self {
        PublishResult::Failed {
            error: error.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, PublishResult::Published { .. })
    }

    pub fn remote_url(&self) -> Option<&str> {
        match self {
            PublishResult::Published { remote_url, .. } => Some(remote_url),
            PublishResult::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            PublishResult::Published { .. } => None,
            PublishResult::Failed { error } => Some(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visibility_wire_values() {
        assert_eq!(serde_json::to_string(&Visibility::Draft).unwrap(), "\"draft\"");
        assert_eq!(serde_json::to_string(&Visibility::Live).unwrap(), "\"publish\"");
        assert_eq!("publish".parse::<Visibility>().unwrap(), Visibility::Live);
        assert_eq!("DRAFT".parse::<Visibility>().unwrap(), Visibility::Draft);
        assert!("private".parse::<Visibility>().is_err());
    }

    #[test]
    fn credentials_add_scheme_and_trim_slash() {
        let creds = PublishCredentials::new("example.com/", "admin", "abcd efgh").unwrap();
        assert_eq!(creds.site_url(), "https://example.com");

        let creds = PublishCredentials::new("http://blog.local:8080//", "admin", "pw").unwrap();
        assert_eq!(creds.site_url(), "http://blog.local:8080");
    }

    #[test]
    fn credentials_scheme_is_case_insensitive() {
        let creds = PublishCredentials::new("HTTPS://Example.com/blog/", "admin", "pw").unwrap();
        assert_eq!(creds.site_url(), "https://example.com/blog");

        let creds = PublishCredentials::new("Http://blog.local", "admin", "pw").unwrap();
        assert_eq!(creds.site_url(), "http://blog.local");
    }

    #[test]
    fn credentials_reject_non_http_schemes() {
        for site in ["ftp://example.com", "file:///var/www", "https://"] {
            assert!(
                matches!(
                    PublishCredentials::new(site, "admin", "pw"),
                    Err(AppError::InvalidInput(_))
                ),
                "{site}"
            );
        }
    }

    #[test]
    fn credentials_require_all_fields() {
        assert!(matches!(
            PublishCredentials::new("example.com", "", "pw"),
            Err(AppError::InvalidInput(_))
        ));
        assert!(PublishCredentials::new("  ", "admin", "pw").is_err());
        assert!(PublishCredentials::new("example.com", "admin", " ").is_err());
    }

    #[test]
    fn credentials_debug_redacts_password() {
        let creds = PublishCredentials::new("example.com", "admin", "s3cret").unwrap();
        let printed = format!("{creds:?}");
        assert!(!printed.contains("s3cret"));
        assert!(printed.contains("admin"));
    }

    #[test]
    fn payload_from_article_uses_summary_as_excerpt() {
        let article = Article::new("Rust", "Blog on Rust", "<p>Body</p>");
        let payload = PostPayload::from_article(&article, Visibility::Live);
        assert_eq!(payload.title, "Blog on Rust");
        assert_eq!(payload.content, "<p>Body</p>");
        assert_eq!(payload.excerpt.as_deref(), Some(article.summary.as_str()));

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["status"], "publish");
    }

    #[test]
    fn publish_result_accessors() {
        let ok = PublishResult::Published {
            remote_id: 42,
            remote_url: "https://example.com/?p=42".into(),
        };
        assert!(ok.is_success());
        assert_eq!(ok.remote_url(), Some("https://example.com/?p=42"));
        assert!(ok.error().is_none());

        let bad = PublishResult::failed("Sorry, you are not allowed to create posts.");
        assert!(!bad.is_success());
        assert!(bad.remote_url().is_none());
        assert_eq!(bad.error(), Some("Sorry, you are not allowed to create posts."));
    }
}
