//! # Configuration
//! Everything the dispatch layer needs is passed in explicitly at construction time: [ModelParameters] say what to
//! ask the model, [ClientConfig] says where and with which credential.

use std::path::Path;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Default Anthropic API host.
pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
/// Value of the `anthropic-version` header.
pub const DEFAULT_API_VERSION: &str = "2023-06-01";
/// Environment variables consulted by [ClientConfig::from_env], in order.
pub const API_KEY_ENV_VARS: [&str; 2] = ["CLAUDE_API_KEY", "ANTHROPIC_API_KEY"];

/// Errors in configuration, detected before any request is sent.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("ConfigError: model must be provided in the model parameters")]
    MissingModel,
    #[error("ConfigError: API key must be provided or set as environment variable {vars}", vars = API_KEY_ENV_VARS.join(" or "))]
    MissingApiKey,
    #[error("ConfigError: invalid base url {url}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },
    #[error("ConfigError: temperature must be within [0, 1], got {0}")]
    TemperatureOutOfRange(f32),
    #[error("ConfigError: max_tokens must be at least 1")]
    ZeroMaxTokens,
}

/// Parameters of every completion request in a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelParameters {
    /// Model identifier, e.g. `claude-3-5-sonnet-20240620`
    pub model: Option<String>,
    #[serde(alias = "max_tokens_to_sample")]
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for ModelParameters {
    fn default() -> Self {
        Self {
            model: None,
            max_tokens: 1024,
            temperature: 0.5,
        }
    }
}

impl ModelParameters {
    pub fn new(model: impl Into<String>, max_tokens: u32, temperature: f32) -> Self {
        Self {
            model: Some(model.into()),
            max_tokens,
            temperature,
        }
    }

    /// Load parameters from a JSON file. Missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Checks the parameters and returns the model identifier.
    pub fn validate(&self) -> Result<&str, ConfigError> {
        let model = self.model
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .ok_or(ConfigError::MissingModel)?;
        if !(0.0..=1.0).contains(&self.temperature) {
            return Err(ConfigError::TemperatureOutOfRange(self.temperature));
        }
        if self.max_tokens == 0 {
            return Err(ConfigError::ZeroMaxTokens);
        }
        Ok(model)
    }
}

/// Connection settings of the completion endpoint.
#[derive(Debug, Clone, PartialEq)]
#[readonly::make]
pub struct ClientConfig {
    #[readonly]
    pub api_key: String,
    #[readonly]
    pub base_url: Url,
    pub api_version: String,
    /// Text appended to the `{"response": "` prefill of every request
    pub additional_prefill: Option<String>,
}

impl ClientConfig {
    /// Create a config against the default host. Fails if the key is blank.
    pub fn new(api_key: impl Into<String>) -> Result<Self, ConfigError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey);
        }
        Ok(Self {
            api_key,
            base_url: parse_base_url(DEFAULT_BASE_URL)?,
            api_version: DEFAULT_API_VERSION.to_string(),
            additional_prefill: None,
        })
    }

    /// Take the key from an explicit value, falling back to the environment variables in [API_KEY_ENV_VARS].
    pub fn from_env_or(api_key: Option<String>) -> Result<Self, ConfigError> {
        let api_key = api_key
            .filter(|k| !k.trim().is_empty())
            .or_else(|| API_KEY_ENV_VARS.iter().find_map(|var| std::env::var(var).ok()))
            .ok_or(ConfigError::MissingApiKey)?;
        Self::new(api_key)
    }

    /// Take the key from the environment variables in [API_KEY_ENV_VARS].
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_or(None)
    }

    pub fn with_base_url(mut self, base_url: &str) -> Result<Self, ConfigError> {
        self.base_url = parse_base_url(base_url)?;
        Ok(self)
    }

    pub fn with_additional_prefill(mut self, prefill: impl Into<String>) -> Self {
        self.additional_prefill = Some(prefill.into());
        self
    }

    /// The `/v1/messages` endpoint under the base url.
    pub fn messages_url(&self) -> Result<Url, ConfigError> {
        self.base_url
            .join("v1/messages")
            .map_err(|e| ConfigError::InvalidBaseUrl { url: self.base_url.to_string(), reason: e.to_string() })
    }
}

fn parse_base_url(url: &str) -> Result<Url, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidBaseUrl { url: url.to_string(), reason };
    let mut parsed = Url::parse(url).map_err(|e| invalid(e.to_string()))?;
    if parsed.cannot_be_a_base() {
        return Err(invalid("url cannot be a base".to_string()));
    }
    // `join` replaces the last segment unless the path ends with a slash
    if !parsed.path().ends_with('/') {
        let path = format!("{}/", parsed.path());
        parsed.set_path(&path);
    }
    Ok(parsed)
}

#[cfg(test)]
mod test_config {
    use super::{ClientConfig, ConfigError, ModelParameters};

    #[test]
    fn test_model_parameters_defaults_and_alias() {
        let params: ModelParameters = serde_json::from_str(r#"{"model": "claude-3-haiku-20240307", "max_tokens_to_sample": 200}"#).unwrap();
        assert_eq!(Some("claude-3-haiku-20240307".to_string()), params.model);
        assert_eq!(200, params.max_tokens);
        assert_eq!(0.5, params.temperature);
    }

    #[test]
    fn test_validate() {
        assert_eq!(Err(ConfigError::MissingModel), ModelParameters::default().validate());
        assert_eq!(Err(ConfigError::MissingModel), ModelParameters::new("  ", 10, 0.1).validate());
        assert_eq!(Err(ConfigError::TemperatureOutOfRange(1.5)), ModelParameters::new("m", 10, 1.5).validate());
        assert_eq!(Err(ConfigError::ZeroMaxTokens), ModelParameters::new("m", 0, 0.1).validate());
        assert_eq!(Ok("m"), ModelParameters::new("m", 10, 0.0).validate());
    }

    #[test]
    fn test_client_config() {
        assert_eq!(Err(ConfigError::MissingApiKey), ClientConfig::new(""));
        assert!(ClientConfig::from_env_or(Some("explicit".to_string())).is_ok());
        let config = ClientConfig::new("key").unwrap();
        assert_eq!("https://api.anthropic.com/v1/messages", config.messages_url().unwrap().as_str());
        let config = config.with_base_url("http://127.0.0.1:9000/proxy").unwrap();
        assert_eq!("http://127.0.0.1:9000/proxy/v1/messages", config.messages_url().unwrap().as_str());
        assert!(matches!(ClientConfig::new("key").unwrap().with_base_url("not a url"), Err(ConfigError::InvalidBaseUrl { .. })));
    }
}
