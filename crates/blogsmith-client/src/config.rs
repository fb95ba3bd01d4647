use std::time::Duration;

use blogsmith_core::AppError;

pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 1500;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Which flavour of chat-completions endpoint to call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// `{base}/openai/deployments/{deployment}/chat/completions?api-version=..`
    /// with an `api-key` header.
    Azure { api_version: String },
    /// `{base}/chat/completions` with a bearer token; the deployment is sent
    /// as `model`.
    OpenAiCompatible,
}

/// Configuration for the chat-completions content generator.
#[derive(Clone)]
pub struct GeneratorConfig {
    pub base_url: String,
    pub deployment: String,
    pub api_key: String,
    pub endpoint: Endpoint,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl std::fmt::Debug for GeneratorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneratorConfig")
            .field("base_url", &self.base_url)
            .field("deployment", &self.deployment)
            .field("api_key", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl GeneratorConfig {
    /// Configuration for an OpenAI-compatible endpoint with default sampling.
    pub fn new(
        base_url: impl Into<String>,
        deployment: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            deployment: deployment.into(),
            api_key: api_key.into(),
            endpoint: Endpoint::OpenAiCompatible,
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Switch to the Azure endpoint layout.
    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.endpoint = Endpoint::Azure {
            api_version: api_version.into(),
        };
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build a validated configuration from `BLOGSMITH_*` settings resolved
    /// through `lookup`.
    ///
    /// - `BLOGSMITH_BASE_URL`, `BLOGSMITH_DEPLOYMENT`, `BLOGSMITH_API_KEY` (required)
    /// - `BLOGSMITH_API_VERSION` (optional, selects the Azure layout)
    /// - `BLOGSMITH_TEMPERATURE` (optional, 0 to 2, defaults to 0.7)
    /// - `BLOGSMITH_MAX_TOKENS` (optional, at least 1, defaults to 1500)
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| AppError::ConfigError(format!("{key} not set")))
        };

        let mut config = Self::new(
            required("BLOGSMITH_BASE_URL")?,
            required("BLOGSMITH_DEPLOYMENT")?,
            required("BLOGSMITH_API_KEY")?,
        );

        if let Some(version) = lookup("BLOGSMITH_API_VERSION").filter(|v| !v.trim().is_empty()) {
            config = config.with_api_version(version.trim());
        }

        if let Some(raw) = lookup("BLOGSMITH_TEMPERATURE") {
            let parsed: f32 = raw.trim().parse().map_err(|_| {
                AppError::ConfigError(format!(
                    "Invalid BLOGSMITH_TEMPERATURE '{raw}': must be a number"
                ))
            })?;
            if !(0.0..=2.0).contains(&parsed) {
                return Err(AppError::ConfigError(
                    "BLOGSMITH_TEMPERATURE must be between 0 and 2".into(),
                ));
            }
            config.temperature = parsed;
        }

        if let Some(raw) = lookup("BLOGSMITH_MAX_TOKENS") {
            let parsed: u32 = raw.trim().parse().map_err(|_| {
                AppError::ConfigError(format!(
                    "Invalid BLOGSMITH_MAX_TOKENS '{raw}': must be a positive integer"
                ))
            })?;
            if parsed == 0 {
                return Err(AppError::ConfigError(
                    "BLOGSMITH_MAX_TOKENS must be at least 1".into(),
                ));
            }
            config.max_tokens = parsed;
        }

        Ok(config)
    }
}
