use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Fallback timeout applied when the configuration does not set one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Sampling temperature applied when the configuration does not set one.
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Completion budget applied when the configuration does not set one.
pub const DEFAULT_MAX_TOKENS: u32 = 8192;

/// Configuration for one adapter instance.
///
/// Created once at adapter construction and never mutated afterwards. Absent
/// optional fields fall back to documented per-adapter defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AdapterConfig {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub timeout_ms: Option<u64>,
    pub filter_response_tags: Option<Vec<String>>,
}

impl AdapterConfig {
    /// Create an empty configuration; every field falls back to its default.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the API key.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set the model identifier.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the base URL (mainly useful for testing against a mock server).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the completion token budget.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set the timeout for outbound calls, in milliseconds.
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }

    /// Set the tag names stripped from final response text.
    pub fn with_filter_response_tags(
        mut self,
        tags: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.filter_response_tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    /// Effective timeout for outbound calls.
    pub fn timeout(&self) -> Duration {
        self.timeout_ms
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_TIMEOUT)
    }

    /// Effective sampling temperature.
    pub fn temperature(&self) -> f32 {
        self.temperature.unwrap_or(DEFAULT_TEMPERATURE)
    }

    /// Effective completion token budget.
    pub fn max_tokens(&self) -> u32 {
        self.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AdapterConfig::new();
        assert_eq!(config.timeout(), Duration::from_secs(60));
        assert_eq!(config.temperature(), 0.7);
        assert_eq!(config.max_tokens(), 8192);
    }

    #[test]
    fn test_overrides() {
        let config = AdapterConfig::new()
            .with_temperature(0.2)
            .with_max_tokens(256)
            .with_timeout_ms(10);
        assert_eq!(config.timeout(), Duration::from_millis(10));
        assert_eq!(config.temperature(), 0.2);
        assert_eq!(config.max_tokens(), 256);
    }

    #[test]
    fn test_camel_case_deserialization() {
        let config: AdapterConfig = serde_json::from_str(
            r#"{
                "apiKey": "sk-test",
                "baseUrl": "http://localhost:1234",
                "maxTokens": 512,
                "timeoutMs": 5000,
                "filterResponseTags": ["thinking"]
            }"#,
        )
        .unwrap();

        assert_eq!(config.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.base_url.as_deref(), Some("http://localhost:1234"));
        assert_eq!(config.max_tokens(), 512);
        assert_eq!(config.timeout(), Duration::from_millis(5000));
        assert_eq!(
            config.filter_response_tags,
            Some(vec!["thinking".to_string()])
        );
    }
}
