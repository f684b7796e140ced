//! Chat completion settings from the environment

use crate::logging::LogLevel;

use super::error::{ConfigError, ConfigResult};

pub const DEFAULT_MODEL: &str = "ministral-8b-latest";
pub const DEFAULT_API_ENDPOINT: &str = "https://api.mistral.ai/v1/chat/completions";

/// Settings for reaching the chat completion service
#[derive(Debug, Clone, PartialEq)]
pub struct ChatConfig {
    /// Bearer token for the service
    pub api_key: String,
    /// Model identifier
    pub model: String,
    /// Full chat completions endpoint URL
    pub api_endpoint: String,
    /// Minimum log level for console output
    pub log_level: LogLevel,
}

impl ChatConfig {
    /// Create a config with defaults for everything but the key
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            api_endpoint: DEFAULT_API_ENDPOINT.to_string(),
            log_level: LogLevel::Info,
        }
    }

    /// Set the model
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the endpoint URL
    pub fn with_api_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.api_endpoint = endpoint.into();
        self
    }

    /// Read `MISTRAL_API_KEY`, `MISTRAL_MODEL`, `MISTRAL_API_ENDPOINT` and `LOG_LEVEL`
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ChatConfig::from_env`] with an injectable variable source
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_key = non_empty("MISTRAL_API_KEY")
            .ok_or_else(|| ConfigError::MissingVariable("MISTRAL_API_KEY".to_string()))?;

        let log_level = match non_empty("LOG_LEVEL") {
            Some(raw) => raw.parse::<LogLevel>().map_err(|message| ConfigError::InvalidValue {
                key: "LOG_LEVEL".to_string(),
                message,
            })?,
            None => LogLevel::Info,
        };

        Ok(Self {
            api_key,
            model: non_empty("MISTRAL_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            api_endpoint: non_empty("MISTRAL_API_ENDPOINT")
                .unwrap_or_else(|| DEFAULT_API_ENDPOINT.to_string()),
            log_level,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ChatConfig::from_lookup(lookup(&[("MISTRAL_API_KEY", "sk-test")])).unwrap();
        assert_eq!(config.api_key, "sk-test");
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.api_endpoint, DEFAULT_API_ENDPOINT);
        assert_eq!(config.log_level, LogLevel::Info);
    }

    #[test]
    fn test_missing_key() {
        let err = ChatConfig::from_lookup(lookup(&[("MISTRAL_API_KEY", "  ")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingVariable(ref k) if k == "MISTRAL_API_KEY"));
    }

    #[test]
    fn test_overrides() {
        let config = ChatConfig::from_lookup(lookup(&[
            ("MISTRAL_API_KEY", "k"),
            ("MISTRAL_MODEL", "mistral-large-latest"),
            ("MISTRAL_API_ENDPOINT", "http://localhost:8080/v1/chat/completions"),
            ("LOG_LEVEL", "debug"),
        ]))
        .unwrap();
        assert_eq!(config.model, "mistral-large-latest");
        assert_eq!(config.api_endpoint, "http://localhost:8080/v1/chat/completions");
        assert_eq!(config.log_level, LogLevel::Debug);
    }

    #[test]
    fn test_invalid_log_level() {
        let err = ChatConfig::from_lookup(lookup(&[("MISTRAL_API_KEY", "k"), ("LOG_LEVEL", "chatty")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }
}
