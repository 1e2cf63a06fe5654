//! Configuration management for competition-watch.
//!
//! Configuration is read from environment variables (a `.env` file is loaded first
//! by the binaries):
//! - `OPENAI_API_KEY` - Required. Key for the reasoning engine.
//! - `DENDRITE_API_KEY` - Required. Key for the hosted browser automation service.
//! - `OPENAI_BASE_URL` - Optional. Chat completions base URL. Defaults to `https://api.openai.com/v1`.
//! - `BROWSER_BASE_URL` - Optional. Automation service base URL. Defaults to `https://api.dendrite.systems/api/v1`.
//! - `DEFAULT_MODEL` - Optional. Model identifier. Defaults to `gpt-4o`.
//! - `MODEL_TEMPERATURE` - Optional. Sampling temperature. Defaults to `0`.
//! - `HOST` - Optional. Server host. Defaults to `127.0.0.1`.
//! - `PORT` - Optional. Server port. Defaults to `3000`.
//! - `MAX_ROUNDS` - Optional. Tool rounds allowed per turn. Defaults to `10`.
//! - `TOOL_TIMEOUT_SECS` - Optional. Per tool call timeout. Defaults to `120`.
//! - `LLM_TIMEOUT_SECS` - Optional. Per model request timeout. Defaults to `120`.

use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::agent::DEFAULT_MAX_ROUNDS;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Reasoning engine API key
    pub openai_api_key: String,

    /// Chat completions base URL
    pub openai_base_url: String,

    /// Browser automation service API key
    pub browser_api_key: String,

    /// Browser automation service base URL
    pub browser_base_url: String,

    /// Model identifier
    pub default_model: String,

    pub temperature: f32,

    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Maximum tool rounds per turn
    pub max_rounds: usize,

    pub tool_timeout: Duration,

    pub llm_timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` if either API key is not set, and
    /// `ConfigError::InvalidValue` if an optional value does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
        };

        let openai_api_key = required("OPENAI_API_KEY")?;
        let browser_api_key = required("DENDRITE_API_KEY")?;

        let openai_base_url = lookup("OPENAI_BASE_URL")
            .unwrap_or_else(|| "https://api.openai.com/v1".to_string());

        let browser_base_url = lookup("BROWSER_BASE_URL")
            .unwrap_or_else(|| "https://api.dendrite.systems/api/v1".to_string());

        let default_model = lookup("DEFAULT_MODEL").unwrap_or_else(|| "gpt-4o".to_string());

        let temperature: f32 = parse_or(&lookup, "MODEL_TEMPERATURE", 0.0)?;
        if !(0.0..=2.0).contains(&temperature) {
            return Err(ConfigError::InvalidValue(
                "MODEL_TEMPERATURE".to_string(),
                format!("{} is outside 0..=2", temperature),
            ));
        }

        let host = lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string());

        let port = parse_or(&lookup, "PORT", 3000u16)?;

        let max_rounds = parse_or(&lookup, "MAX_ROUNDS", DEFAULT_MAX_ROUNDS)?;
        if max_rounds == 0 {
            return Err(ConfigError::InvalidValue(
                "MAX_ROUNDS".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        let tool_timeout = Duration::from_secs(parse_or(&lookup, "TOOL_TIMEOUT_SECS", 120u64)?);
        let llm_timeout = Duration::from_secs(parse_or(&lookup, "LLM_TIMEOUT_SECS", 120u64)?);

        Ok(Self {
            openai_api_key,
            openai_base_url,
            browser_api_key,
            browser_base_url,
            default_model,
            temperature,
            host,
            port,
            max_rounds,
            tool_timeout,
            llm_timeout,
        })
    }

    /// Create a config with custom values (useful for testing).
    pub fn new(openai_api_key: String, browser_api_key: String) -> Self {
        Self {
            openai_api_key,
            openai_base_url: "https://api.openai.com/v1".to_string(),
            browser_api_key,
            browser_base_url: "https://api.dendrite.systems/api/v1".to_string(),
            default_model: "gpt-4o".to_string(),
            temperature: 0.0,
            host: "127.0.0.1".to_string(),
            port: 3000,
            max_rounds: DEFAULT_MAX_ROUNDS,
            tool_timeout: Duration::from_secs(120),
            llm_timeout: Duration::from_secs(120),
        }
    }
}

fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| ConfigError::InvalidValue(key.to_string(), format!("{}", e))),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    const KEYS: &[(&str, &str)] = &[("OPENAI_API_KEY", "sk-test"), ("DENDRITE_API_KEY", "dk-test")];

    #[test]
    fn defaults_apply_when_only_keys_are_set() {
        let config = Config::from_lookup(lookup(KEYS)).unwrap();
        assert_eq!(config.default_model, "gpt-4o");
        assert_eq!(config.max_rounds, 10);
        assert_eq!(config.port, 3000);
        assert_eq!(config.temperature, 0.0);
        assert_eq!(config.tool_timeout, Duration::from_secs(120));
        assert_eq!(config.openai_base_url, "https://api.openai.com/v1");
    }

    #[test]
    fn missing_keys_fail_fast() {
        let err = Config::from_lookup(lookup(&[("DENDRITE_API_KEY", "dk")])).unwrap_err();
        assert_eq!(err, ConfigError::MissingEnvVar("OPENAI_API_KEY".into()));

        let err = Config::from_lookup(lookup(&[("OPENAI_API_KEY", "sk"), ("DENDRITE_API_KEY", " ")]))
            .unwrap_err();
        assert_eq!(err, ConfigError::MissingEnvVar("DENDRITE_API_KEY".into()));
    }

    #[test]
    fn overrides_are_parsed() {
        let mut pairs = KEYS.to_vec();
        pairs.extend([
            ("MAX_ROUNDS", "4"),
            ("PORT", "8080"),
            ("TOOL_TIMEOUT_SECS", "30"),
            ("MODEL_TEMPERATURE", "0.7"),
            ("DEFAULT_MODEL", "gpt-4o-mini"),
        ]);
        let config = Config::from_lookup(lookup(&pairs)).unwrap();
        assert_eq!(config.max_rounds, 4);
        assert_eq!(config.port, 8080);
        assert_eq!(config.tool_timeout, Duration::from_secs(30));
        assert_eq!(config.temperature, 0.7);
        assert_eq!(config.default_model, "gpt-4o-mini");
    }

    #[test]
    fn invalid_values_are_reported() {
        let mut pairs = KEYS.to_vec();
        pairs.push(("MAX_ROUNDS", "0"));
        assert!(matches!(
            Config::from_lookup(lookup(&pairs)),
            Err(ConfigError::InvalidValue(key, _)) if key == "MAX_ROUNDS"
        ));

        let mut pairs = KEYS.to_vec();
        pairs.push(("PORT", "eighty"));
        assert!(matches!(
            Config::from_lookup(lookup(&pairs)),
            Err(ConfigError::InvalidValue(key, _)) if key == "PORT"
        ));
    }
}
