//! Gemini `generateContent` client

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use serde_json::json;

use crate::service::{
    config::TextGenerationConfig,
    textgen::{
        http_client::{CircuitState, EnhancedHttpClient},
        TextGenerator,
    },
    types::{health_check::HealthCheckResult, ServiceError},
};

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: Option<String>,
}

impl GenerateContentResponse {
    /// Text of the first part of the first candidate
    fn first_text(self) -> Option<String> {
        self.candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .next()?
            .text
    }
}

/// Text generator backed by the Gemini API
pub struct GeminiClient {
    client: Arc<EnhancedHttpClient>,
    /// `{api_url}/models/{model}:generateContent`, without the key
    endpoint: String,
    api_key: String,
}

impl GeminiClient {
    /// Create a client, reading the API key from the configured environment variable
    pub fn new(config: &TextGenerationConfig) -> Result<Self, ServiceError> {
        let api_key = std::env::var(&config.api_key_env).map_err(|_| {
            ServiceError::ConfigError(format!(
                "Text generation is enabled but ${} is not set",
                config.api_key_env
            ))
        })?;
        Self::with_api_key(config, api_key)
    }

    /// Create a client with an explicit API key
    pub fn with_api_key(
        config: &TextGenerationConfig,
        api_key: impl Into<String>,
    ) -> Result<Self, ServiceError> {
        let client = EnhancedHttpClient::new(
            config.connection_pool.as_ref(),
            config.circuit_breaker.as_ref(),
            config.rate_limit_ms,
            Duration::from_secs(config.timeout_seconds),
        )?;

        Ok(Self {
            client: Arc::new(client),
            endpoint: endpoint_url(&config.api_url, &config.model),
            api_key: api_key.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// Build the `generateContent` URL for a model
fn endpoint_url(api_url: &str, model: &str) -> String {
    format!(
        "{}/models/{}:generateContent",
        api_url.trim_end_matches('/'),
        model
    )
}

#[async_trait::async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, ServiceError> {
        let url = format!("{}?key={}", self.endpoint, self.api_key);
        let body = json!({
            "contents": [{
                "parts": [{ "text": prompt }]
            }]
        });

        let response = self.client.post_json(&url, &body).await?;
        let status = response.status();

        if !status.is_success() {
            let message = response
                .json::<ApiErrorBody>()
                .await
                .ok()
                .and_then(|b| b.error)
                .and_then(|e| e.message)
                .unwrap_or_else(|| status.to_string());
            return Err(ServiceError::TextGenerationFailed(format!(
                "API request failed: {}",
                message
            )));
        }

        let body: GenerateContentResponse = response.json().await.map_err(|e| {
            ServiceError::TextGenerationFailed(format!(
                "Failed to parse response: {}",
                e.without_url()
            ))
        })?;

        body.first_text().ok_or_else(|| {
            ServiceError::TextGenerationFailed("Response contained no text".to_string())
        })
    }

    async fn health_check(&self) -> HealthCheckResult {
        match self.client.circuit_state().await {
            CircuitState::Closed => HealthCheckResult::Healthy,
            CircuitState::HalfOpen => HealthCheckResult::Degraded {
                reason: "Recovering from upstream failures".to_string(),
            },
            CircuitState::Open { .. } => HealthCheckResult::Unhealthy {
                reason: format!(
                    "Circuit breaker open after {} failures",
                    self.client.stats().failure_count
                ),
            },
        }
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_url() {
        assert_eq!(
            endpoint_url("https://example.test/v1beta/", "gemini-2.0-flash"),
            "https://example.test/v1beta/models/gemini-2.0-flash:generateContent"
        );
    }

    #[test]
    fn test_first_text() {
        let body: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{"content": {"parts": [{"text": "hello"}, {"text": "ignored"}]}}]
        }))
        .unwrap();
        assert_eq!(body.first_text().as_deref(), Some("hello"));

        let empty: GenerateContentResponse = serde_json::from_value(json!({})).unwrap();
        assert_eq!(empty.first_text(), None);

        let no_content: GenerateContentResponse =
            serde_json::from_value(json!({"candidates": [{"finishReason": "SAFETY"}]})).unwrap();
        assert_eq!(no_content.first_text(), None);
    }

    #[test]
    fn test_missing_api_key_is_config_error() {
        let config = TextGenerationConfig {
            api_key_env: "PHENOMATCH_TEST_UNSET_KEY".to_string(),
            ..TextGenerationConfig::default()
        };
        assert!(matches!(
            GeminiClient::new(&config),
            Err(ServiceError::ConfigError(_))
        ));
    }

    #[tokio::test]
    async fn test_new_client_is_healthy() {
        let client =
            GeminiClient::with_api_key(&TextGenerationConfig::default(), "test-key").unwrap();
        assert_eq!(client.health_check().await, HealthCheckResult::Healthy);
        assert!(!client.endpoint().contains("test-key"));
    }
}
