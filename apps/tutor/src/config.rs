//! Configuration from environment variables (and `.env`).

use std::path::PathBuf;
use thiserror::Error;
use vocab_core::session::DEFAULT_BATCH_SIZE;

pub const DEFAULT_AI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_AI_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_LANGUAGE: &str = "English";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

/// Settings of the AI endpoint.
#[derive(Debug, Clone)]
pub struct AiConfig {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: PathBuf,
    pub batch_size: usize,
    /// Language used for AI questions and feedback until the profile sets one.
    pub language: String,
    pub ai: AiConfig,
}

impl Config {
    /// Load `.env` if present, then read the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let batch_size = match lookup("VOCAB_BATCH_SIZE") {
            Some(value) => value
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or(ConfigError::Invalid {
                    key: "VOCAB_BATCH_SIZE",
                    value,
                })?,
            None => DEFAULT_BATCH_SIZE,
        };

        Ok(Self {
            db_path: lookup("VOCAB_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(default_db_path),
            batch_size,
            language: lookup("VOCAB_LANGUAGE").unwrap_or_else(|| DEFAULT_LANGUAGE.to_string()),
            ai: AiConfig {
                base_url: lookup("AI_BASE_URL").unwrap_or_else(|| DEFAULT_AI_BASE_URL.to_string()),
                model: lookup("AI_MODEL").unwrap_or_else(|| DEFAULT_AI_MODEL.to_string()),
                api_key: lookup("AI_API_KEY"),
            },
        })
    }
}

fn default_db_path() -> PathBuf {
    // Use app data directory, fallback to current dir
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("vocab-tutor")
        .join("vocab.db")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.batch_size, DEFAULT_BATCH_SIZE);
        assert_eq!(config.language, DEFAULT_LANGUAGE);
        assert_eq!(config.ai.base_url, DEFAULT_AI_BASE_URL);
        assert!(config.ai.api_key.is_none());
        assert!(config.db_path.ends_with("vocab-tutor/vocab.db"));
    }

    #[test]
    fn overrides() {
        let config = Config::from_lookup(lookup(&[
            ("VOCAB_BATCH_SIZE", "5"),
            ("VOCAB_DB_PATH", "/tmp/words.db"),
            ("AI_API_KEY", "sk-test"),
            ("AI_MODEL", "local-model"),
        ]))
        .unwrap();
        assert_eq!(config.batch_size, 5);
        assert_eq!(config.db_path, PathBuf::from("/tmp/words.db"));
        assert_eq!(config.ai.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.ai.model, "local-model");
    }

    #[test]
    fn invalid_batch_size() {
        for bad in ["zero", "0", "-1"] {
            let result = Config::from_lookup(lookup(&[("VOCAB_BATCH_SIZE", bad)]));
            assert!(matches!(
                result,
                Err(ConfigError::Invalid { key: "VOCAB_BATCH_SIZE", .. })
            ));
        }
    }
}
