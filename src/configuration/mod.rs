use serde::Deserialize;
use std::fs;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("File read error")]
    FileError,

    #[error("Deserialization error:{0}")]
    DeserializationError(String),

    #[error("Missing environment variable:{0}")]
    MissingEnvVar(String),
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub log_level: String,
    pub telegram: TelegramConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TelegramConfig {
    /// Chat id of the shared channel where admins claim and decide requests.
    pub admin_channel_id: i64,
}

#[derive(Debug, Clone)]
pub struct Context {
    pub config: Config,
}

impl Context {
    pub fn new(config_file: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            config: Config::new(config_file)?,
        })
    }
}

impl Config {
    pub fn new(config_file: &str) -> Result<Self, ConfigError> {
        let config_str = fs::read_to_string(config_file).map_err(|_| ConfigError::FileError)?;
        let config: Config = serde_json::from_str(&config_str)
            .map_err(|e| ConfigError::DeserializationError(e.to_string()))?;
        Ok(config)
    }
}

/// Startup check for a required environment variable. Keeps missing
/// credentials a boot failure instead of a first-use failure.
pub fn require_env(name: &str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_parses_with_admin_channel() {
        let raw = r#"{"log_level":"debug","telegram":{"admin_channel_id":-100123}}"#;
        let config: Config = serde_json::from_str(raw).unwrap();
        assert_eq!(config.telegram.admin_channel_id, -100123);
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn config_without_admin_channel_is_rejected() {
        let raw = r#"{"log_level":"info","telegram":{}}"#;
        let result: Result<Config, _> = serde_json::from_str(raw);
        assert!(result.is_err());
    }

    #[test]
    fn missing_env_var_is_an_error() {
        let result = require_env("DEPOSITDESK_DOES_NOT_EXIST");
        assert!(matches!(result, Err(ConfigError::MissingEnvVar(_))));
    }
}
