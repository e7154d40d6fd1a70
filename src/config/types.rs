//! Configuration types.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// AI provider kind.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Gemini,
    Claude,
}

/// Configuration for the text-completion client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    /// Provider to use (gemini or claude).
    #[serde(default)]
    pub provider: ProviderKind,
    /// Model to use for completions.
    #[serde(default = "default_model")]
    pub model: String,
    /// Base URL for the API.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Environment variable name for the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

fn default_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_api_key_env() -> String {
    "GEMINI_API_KEY".to_string()
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            model: default_model(),
            base_url: default_base_url(),
            api_key_env: default_api_key_env(),
        }
    }
}

/// Fixed generation parameters sent with every completion request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GenerationParams {
    /// Maximum output length in tokens.
    #[serde(default = "default_max_length")]
    pub max_length: u32,
    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Whether sampling is enabled. Greedy decoding when false.
    #[serde(default = "default_sample")]
    pub sample: bool,
}

const fn default_max_length() -> u32 {
    512
}

const fn default_temperature() -> f32 {
    0.7
}

const fn default_sample() -> bool {
    true
}

impl GenerationParams {
    /// Temperature actually sent to the provider.
    #[must_use]
    pub fn effective_temperature(&self) -> f32 {
        if self.sample {
            self.temperature
        } else {
            0.0
        }
    }
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_length: default_max_length(),
            temperature: default_temperature(),
            sample: default_sample(),
        }
    }
}

/// Feedback store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackConfig {
    /// Path to the `SQLite` database.
    #[serde(default = "crate::feedback::default_feedback_path")]
    pub database: PathBuf,
    /// Directory export files are written to.
    #[serde(default = "default_export_dir")]
    pub export_dir: PathBuf,
}

fn default_export_dir() -> PathBuf {
    PathBuf::from(".")
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            database: crate::feedback::default_feedback_path(),
            export_dir: default_export_dir(),
        }
    }
}

/// Default port for the HTTP server.
pub const DEFAULT_PORT: u16 = 7860;

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Whether to enable permissive CORS.
    #[serde(default = "default_cors")]
    pub cors_permissive: bool,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

const fn default_port() -> u16 {
    DEFAULT_PORT
}

const fn default_cors() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_permissive: default_cors(),
        }
    }
}

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub ai: AiConfig,
    #[serde(default)]
    pub generation: GenerationParams,
    #[serde(default)]
    pub feedback: FeedbackConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ai_config_defaults() {
        let config = AiConfig::default();
        assert_eq!(config.provider, ProviderKind::Gemini);
        assert_eq!(config.model, "gemini-2.0-flash");
        assert_eq!(config.api_key_env, "GEMINI_API_KEY");
    }

    #[test]
    fn test_ai_config_deserialize_claude() {
        let toml = r#"
            provider = "claude"
            model = "claude-sonnet-4-20250514"
            base_url = "https://api.anthropic.com"
            api_key_env = "ANTHROPIC_API_KEY"
        "#;
        let config: AiConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.provider, ProviderKind::Claude);
        assert_eq!(config.model, "claude-sonnet-4-20250514");
        assert_eq!(config.base_url, "https://api.anthropic.com");
    }

    #[test]
    fn test_generation_defaults() {
        let params = GenerationParams::default();
        assert_eq!(params.max_length, 512);
        assert!((params.temperature - 0.7).abs() < f32::EPSILON);
        assert!(params.sample);
    }

    #[test]
    fn test_greedy_decoding_zeroes_temperature() {
        let params = GenerationParams {
            sample: false,
            ..GenerationParams::default()
        };
        assert!(params.effective_temperature().abs() < f32::EPSILON);
    }

    #[test]
    fn test_server_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 7860);
        assert!(config.cors_permissive);
    }

    #[test]
    fn test_partial_app_config() {
        let toml = r#"
            [generation]
            max_length = 256

            [server]
            port = 9000
        "#;
        let config: AppConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.generation.max_length, 256);
        assert!(config.generation.sample);
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.ai.provider, ProviderKind::Gemini);
    }
}
