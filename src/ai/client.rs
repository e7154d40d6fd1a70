//! Multi-provider text-completion client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;

use crate::config::{AiConfig, GenerationParams, ProviderKind};

/// Connection timeout for HTTP requests.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Overall request timeout for HTTP requests.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Maximum number of retries for transient failures.
const MAX_RETRIES: u32 = 3;

fn build_http_client() -> Result<Client, AiError> {
    Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(|e| AiError::RequestFailed(format!("Failed to build HTTP client: {e}")))
}

/// Determine if a request should be retried based on status code and attempt count.
fn should_retry(status_code: u16, attempt: u32) -> bool {
    if attempt >= MAX_RETRIES {
        return false;
    }
    (500..600).contains(&status_code)
}

/// Exponential backoff: 1s, 2s, 4s.
fn calculate_backoff(attempt: u32) -> Duration {
    Duration::from_secs(1 << attempt)
}

fn map_send_error(e: &reqwest::Error) -> AiError {
    if e.is_timeout() {
        AiError::Timeout
    } else {
        AiError::RequestFailed(e.to_string())
    }
}

/// Errors from the text-completion service.
#[derive(Error, Debug)]
pub enum AiError {
    #[error("API key not configured (env: {0})")]
    MissingApiKey(String),
    #[error("API request failed: {0}")]
    RequestFailed(String),
    #[error("Failed to parse response: {0}")]
    ParseError(String),
    #[error("Completion request timed out")]
    Timeout,
}

/// A service that turns a prompt into generated text.
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Complete `prompt` using the given generation parameters.
    async fn complete(&self, prompt: &str, params: &GenerationParams) -> Result<String, AiError>;
}

/// Gemini API provider.
#[derive(Debug, Clone)]
pub struct GeminiProvider {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl GeminiProvider {
    /// Create a new Gemini provider.
    ///
    /// # Errors
    ///
    /// Returns `AiError::RequestFailed` if the HTTP client cannot be built.
    pub fn new(base_url: String, api_key: String, model: String) -> Result<Self, AiError> {
        Ok(Self {
            client: build_http_client()?,
            base_url,
            api_key,
            model,
        })
    }

    fn request_body(prompt: &str, params: &GenerationParams) -> serde_json::Value {
        serde_json::json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": prompt }]
            }],
            "generationConfig": {
                "maxOutputTokens": params.max_length,
                "temperature": params.effective_temperature()
            }
        })
    }
}

#[async_trait]
impl CompletionService for GeminiProvider {
    async fn complete(&self, prompt: &str, params: &GenerationParams) -> Result<String, AiError> {
        let url = format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        );
        let body = Self::request_body(prompt, params);

        let mut attempt = 0;
        loop {
            let response = self
                .client
                .post(&url)
                .header("x-goog-api-key", &self.api_key)
                .header("Content-Type", "application/json")
                .json(&body)
                .send()
                .await
                .map_err(|e| map_send_error(&e))?;

            let status = response.status();
            if status.is_success() {
                let json: serde_json::Value = response
                    .json()
                    .await
                    .map_err(|e| AiError::ParseError(e.to_string()))?;

                return json["candidates"][0]["content"]["parts"][0]["text"]
                    .as_str()
                    .map(String::from)
                    .ok_or_else(|| AiError::ParseError("No text in Gemini response".to_string()));
            }

            if should_retry(status.as_u16(), attempt) {
                let backoff = calculate_backoff(attempt);
                tracing::warn!(%status, attempt, ?backoff, "Gemini request failed, retrying");
                tokio::time::sleep(backoff).await;
                attempt += 1;
                continue;
            }

            let text = response.text().await.unwrap_or_default();
            return Err(AiError::RequestFailed(format!("HTTP {status}: {text}")));
        }
    }
}

/// Claude API provider.
#[derive(Debug, Clone)]
pub struct ClaudeProvider {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl ClaudeProvider {
    /// Create a new Claude provider.
    ///
    /// # Errors
    ///
    /// Returns `AiError::RequestFailed` if the HTTP client cannot be built.
    pub fn new(base_url: String, api_key: String, model: String) -> Result<Self, AiError> {
        Ok(Self {
            client: build_http_client()?,
            base_url,
            api_key,
            model,
        })
    }

    fn request_body(&self, prompt: &str, params: &GenerationParams) -> serde_json::Value {
        serde_json::json!({
            "model": self.model,
            "max_tokens": params.max_length,
            "temperature": params.effective_temperature(),
            "messages": [{
                "role": "user",
                "content": prompt
            }]
        })
    }
}

#[async_trait]
impl CompletionService for ClaudeProvider {
    async fn complete(&self, prompt: &str, params: &GenerationParams) -> Result<String, AiError> {
        let url = format!("{}/v1/messages", self.base_url.trim_end_matches('/'));
        let body = self.request_body(prompt, params);

        let mut attempt = 0;
        loop {
            let response = self
                .client
                .post(&url)
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", "2023-06-01")
                .header("Content-Type", "application/json")
                .json(&body)
                .send()
                .await
                .map_err(|e| map_send_error(&e))?;

            let status = response.status();
            if status.is_success() {
                let json: serde_json::Value = response
                    .json()
                    .await
                    .map_err(|e| AiError::ParseError(e.to_string()))?;

                return json["content"][0]["text"]
                    .as_str()
                    .map(String::from)
                    .ok_or_else(|| AiError::ParseError("No text in Claude response".to_string()));
            }

            if should_retry(status.as_u16(), attempt) {
                let backoff = calculate_backoff(attempt);
                tracing::warn!(%status, attempt, ?backoff, "Claude request failed, retrying");
                tokio::time::sleep(backoff).await;
                attempt += 1;
                continue;
            }

            let text = response.text().await.unwrap_or_default();
            return Err(AiError::RequestFailed(format!("HTTP {status}: {text}")));
        }
    }
}

/// Provider enum for dispatch.
#[derive(Debug, Clone)]
pub enum Provider {
    Gemini(GeminiProvider),
    Claude(ClaudeProvider),
}

#[async_trait]
impl CompletionService for Provider {
    async fn complete(&self, prompt: &str, params: &GenerationParams) -> Result<String, AiError> {
        match self {
            Self::Gemini(p) => p.complete(prompt, params).await,
            Self::Claude(p) => p.complete(prompt, params).await,
        }
    }
}

/// Completion client built from configuration.
#[derive(Debug, Clone)]
pub struct AiClient {
    provider: Provider,
    config: AiConfig,
}

impl AiClient {
    /// Create client from configuration.
    ///
    /// # Errors
    ///
    /// Returns `AiError::MissingApiKey` if the configured API key environment
    /// variable is not set.
    pub fn from_config(config: AiConfig) -> Result<Self, AiError> {
        let api_key = std::env::var(&config.api_key_env)
            .map_err(|_| AiError::MissingApiKey(config.api_key_env.clone()))?;

        let provider = match config.provider {
            ProviderKind::Gemini => Provider::Gemini(GeminiProvider::new(
                config.base_url.clone(),
                api_key,
                config.model.clone(),
            )?),
            ProviderKind::Claude => Provider::Claude(ClaudeProvider::new(
                config.base_url.clone(),
                api_key,
                config.model.clone(),
            )?),
        };

        Ok(Self { provider, config })
    }

    /// Get the configured model.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Get the provider kind.
    #[must_use]
    pub fn provider_kind(&self) -> &ProviderKind {
        &self.config.provider
    }
}

#[async_trait]
impl CompletionService for AiClient {
    async fn complete(&self, prompt: &str, params: &GenerationParams) -> Result<String, AiError> {
        tracing::debug!(
            model = %self.config.model,
            prompt_len = prompt.len(),
            max_length = params.max_length,
            "Requesting completion"
        );
        self.provider.complete(prompt, params).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_retry_logic() {
        assert!(should_retry(500, 0));
        assert!(should_retry(502, 1));
        assert!(should_retry(503, 2));

        assert!(!should_retry(400, 0));
        assert!(!should_retry(401, 0));
        assert!(!should_retry(404, 0));
        assert!(!should_retry(429, 0));

        assert!(!should_retry(200, 0));

        assert!(!should_retry(500, MAX_RETRIES));
        assert!(!should_retry(503, MAX_RETRIES + 1));
    }

    #[test]
    fn test_calculate_backoff() {
        assert_eq!(calculate_backoff(0).as_secs(), 1);
        assert_eq!(calculate_backoff(1).as_secs(), 2);
        assert_eq!(calculate_backoff(2).as_secs(), 4);
    }

    #[test]
    fn test_gemini_body_carries_generation_params() {
        let params = GenerationParams {
            max_length: 300,
            temperature: 0.5,
            sample: true,
        };
        let body = GeminiProvider::request_body("hello", &params);
        assert_eq!(body["contents"][0]["parts"][0]["text"], "hello");
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 300);
        assert_eq!(body["generationConfig"]["temperature"], 0.5);
    }

    #[test]
    fn test_claude_body_greedy_when_sampling_disabled() {
        let provider = ClaudeProvider::new(
            "https://api.example.com".to_string(),
            "test-key".to_string(),
            "claude-test".to_string(),
        )
        .unwrap();
        let params = GenerationParams {
            max_length: 128,
            temperature: 0.9,
            sample: false,
        };
        let body = provider.request_body("prompt", &params);
        assert_eq!(body["model"], "claude-test");
        assert_eq!(body["max_tokens"], 128);
        assert_eq!(body["temperature"], 0.0);
        assert_eq!(body["messages"][0]["content"], "prompt");
    }

    #[test]
    fn test_from_config_missing_key() {
        let config = AiConfig {
            api_key_env: "SDLC_ASSISTANT_TEST_UNSET_KEY".to_string(),
            ..AiConfig::default()
        };
        let result = AiClient::from_config(config);
        assert!(matches!(result, Err(AiError::MissingApiKey(_))));
    }

    #[test]
    fn test_from_config_claude() {
        std::env::set_var("SDLC_ASSISTANT_TEST_CLAUDE_KEY", "test-key");
        let config = AiConfig {
            provider: ProviderKind::Claude,
            model: "claude-sonnet-4-20250514".to_string(),
            base_url: "https://api.anthropic.com".to_string(),
            api_key_env: "SDLC_ASSISTANT_TEST_CLAUDE_KEY".to_string(),
        };
        let client = AiClient::from_config(config).unwrap();
        assert!(matches!(client.provider, Provider::Claude(_)));
        assert_eq!(client.model(), "claude-sonnet-4-20250514");
        assert_eq!(client.provider_kind(), &ProviderKind::Claude);
        std::env::remove_var("SDLC_ASSISTANT_TEST_CLAUDE_KEY");
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_request_error() {
        let provider = GeminiProvider::new(
            "http://127.0.0.1:1".to_string(),
            "test-key".to_string(),
            "gemini-test".to_string(),
        )
        .unwrap();
        let result = provider.complete("hi", &GenerationParams::default()).await;
        assert!(matches!(
            result,
            Err(AiError::RequestFailed(_) | AiError::Timeout)
        ));
    }
}
