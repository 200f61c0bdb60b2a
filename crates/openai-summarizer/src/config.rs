//! Configuration for the OpenAI summarizer.

use std::env;

use summarizer_core::SummarizerError;

/// Configuration for [`crate::OpenAiSummarizer`].
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// API base URL.
    pub api_url: String,

    /// API key for authentication.
    pub api_key: String,

    /// Model name to use.
    pub model: String,

    /// Maximum tokens for the response.
    pub max_tokens: Option<u32>,

    /// Temperature for generation.
    pub temperature: Option<f32>,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.openai.com".to_string(),
            api_key: String::new(),
            model: "gpt-4o-mini".to_string(),
            max_tokens: Some(2048),
            temperature: Some(0.2),
        }
    }
}

impl OpenAiConfig {
    /// Create configuration from environment variables.
    ///
    /// Required:
    /// - `OPENAI_API_KEY` - API key for authentication
    ///
    /// Optional:
    /// - `OPENAI_API_URL` - API base URL (default: https://api.openai.com)
    /// - `OPENAI_MODEL` - model name (default: gpt-4o-mini)
    /// - `OPENAI_MAX_TOKENS` - max tokens (default: 2048)
    /// - `OPENAI_TEMPERATURE` - temperature (default: 0.2)
    pub fn from_env() -> Result<Self, SummarizerError> {
        let api_key = env::var("OPENAI_API_KEY")
            .map_err(|_| SummarizerError::Configuration("OPENAI_API_KEY not set".to_string()))?;

        let api_url =
            env::var("OPENAI_API_URL").unwrap_or_else(|_| "https://api.openai.com".to_string());

        let model = env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());

        let max_tokens = env::var("OPENAI_MAX_TOKENS")
            .ok()
            .and_then(|v| v.parse().ok())
            .or(Some(2048));

        let temperature = env::var("OPENAI_TEMPERATURE")
            .ok()
            .and_then(|v| v.parse().ok())
            .or(Some(0.2));

        Ok(Self {
            api_url,
            api_key,
            model,
            max_tokens,
            temperature,
        })
    }

    /// Create a new config builder.
    pub fn builder() -> OpenAiConfigBuilder {
        OpenAiConfigBuilder::default()
    }
}

/// Builder for [`OpenAiConfig`].
#[derive(Debug, Default)]
pub struct OpenAiConfigBuilder {
    config: OpenAiConfig,
}

impl OpenAiConfigBuilder {
    /// Set the API key.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = key.into();
        self
    }

    /// Set the API URL.
    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.config.api_url = url.into();
        self
    }

    /// Set the model name.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    /// Set the max tokens.
    pub fn max_tokens(mut self, tokens: u32) -> Self {
        self.config.max_tokens = Some(tokens);
        self
    }

    /// Set the temperature.
    pub fn temperature(mut self, temp: f32) -> Self {
        self.config.temperature = Some(temp);
        self
    }

    /// Build the configuration.
    pub fn build(self) -> OpenAiConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = OpenAiConfig::default();

        assert_eq!(config.api_url, "https://api.openai.com");
        assert!(config.api_key.is_empty());
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.max_tokens, Some(2048));
        assert_eq!(config.temperature, Some(0.2));
    }

    #[test]
    fn test_builder_all_options() {
        let config = OpenAiConfig::builder()
            .api_key("my-key")
            .api_url("https://custom.api.com")
            .model("gpt-4o")
            .max_tokens(512)
            .temperature(0.5)
            .build();

        assert_eq!(config.api_key, "my-key");
        assert_eq!(config.api_url, "https://custom.api.com");
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.max_tokens, Some(512));
        assert_eq!(config.temperature, Some(0.5));
    }
}
