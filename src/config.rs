//! Process configuration, resolved once at startup and passed down.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_DATASET_PATH: &str = "Myntra_Analytics_Dataset.csv";
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("API_KEY is not set; add it to the environment or a .env file")]
    MissingApiKey,
    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: &'static str,
    },
}

/// Settings for the text-generation backend.
#[derive(Clone, PartialEq, Eq)]
pub struct NarrativeConfig {
    pub api_key: String,
    pub endpoint: String,
    pub model: String,
    /// Per-attempt request timeout.
    pub timeout: Duration,
    /// Extra attempts after the first one fails with a retryable error.
    pub retries: u32,
    /// Base delay between attempts; grows linearly.
    pub backoff: Duration,
}

// Hand-written so the key never ends up in logs.
impl fmt::Debug for NarrativeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NarrativeConfig")
            .field("api_key", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .field("retries", &self.retries)
            .field("backoff", &self.backoff)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub dataset_path: PathBuf,
    pub narrative: NarrativeConfig,
}

impl AppConfig {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let api_key = get("API_KEY").ok_or(ConfigError::MissingApiKey)?;

        let timeout_secs = parse_number(&get, "NARRATIVE_TIMEOUT_SECS", 30)?;
        if timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "NARRATIVE_TIMEOUT_SECS",
                value: "0".into(),
                reason: "must be greater than zero",
            });
        }
        let retries = parse_number(&get, "NARRATIVE_RETRIES", 1)?;
        let backoff_ms = parse_number(&get, "NARRATIVE_BACKOFF_MS", 1000)?;

        Ok(AppConfig {
            dataset_path: get("DATASET_PATH")
                .unwrap_or_else(|| DEFAULT_DATASET_PATH.to_string())
                .into(),
            narrative: NarrativeConfig {
                api_key,
                endpoint: get("GEMINI_ENDPOINT").unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
                model: get("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
                timeout: Duration::from_secs(timeout_secs),
                retries: u32::try_from(retries).map_err(|_| ConfigError::Invalid {
                    key: "NARRATIVE_RETRIES",
                    value: retries.to_string(),
                    reason: "too large",
                })?,
                backoff: Duration::from_millis(backoff_ms),
            },
        })
    }

    /// Override the dataset location (e.g. from the command line).
    pub fn with_dataset_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.dataset_path = path.into();
        self
    }
}

fn parse_number(
    get: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: u64,
) -> Result<u64, ConfigError> {
    match get(key) {
        None => Ok(default),
        Some(value) => value.parse().map_err(|_| ConfigError::Invalid {
            key,
            value,
            reason: "expected a non-negative integer",
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_apply() {
        let cfg = config(&[("API_KEY", "secret")]).unwrap();
        assert_eq!(cfg.dataset_path, PathBuf::from(DEFAULT_DATASET_PATH));
        assert_eq!(cfg.narrative.api_key, "secret");
        assert_eq!(cfg.narrative.model, DEFAULT_MODEL);
        assert_eq!(cfg.narrative.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(cfg.narrative.timeout, Duration::from_secs(30));
        assert_eq!(cfg.narrative.retries, 1);
        assert_eq!(cfg.narrative.backoff, Duration::from_secs(1));
    }

    #[test]
    fn missing_or_blank_key_is_fatal() {
        assert_eq!(config(&[]), Err(ConfigError::MissingApiKey));
        assert_eq!(config(&[("API_KEY", "  ")]), Err(ConfigError::MissingApiKey));
    }

    #[test]
    fn overrides_are_read() {
        let cfg = config(&[
            ("API_KEY", "k"),
            ("DATASET_PATH", "/data/tx.parquet"),
            ("GEMINI_MODEL", "gemini-2.0-flash"),
            ("GEMINI_ENDPOINT", "http://localhost:8080"),
            ("NARRATIVE_TIMEOUT_SECS", "5"),
            ("NARRATIVE_RETRIES", "0"),
            ("NARRATIVE_BACKOFF_MS", "250"),
        ])
        .unwrap();
        assert_eq!(cfg.dataset_path, PathBuf::from("/data/tx.parquet"));
        assert_eq!(cfg.narrative.model, "gemini-2.0-flash");
        assert_eq!(cfg.narrative.endpoint, "http://localhost:8080");
        assert_eq!(cfg.narrative.timeout, Duration::from_secs(5));
        assert_eq!(cfg.narrative.retries, 0);
        assert_eq!(cfg.narrative.backoff, Duration::from_millis(250));

        let cfg = cfg.with_dataset_path("other.csv");
        assert_eq!(cfg.dataset_path, PathBuf::from("other.csv"));
    }

    #[test]
    fn bad_numbers_are_rejected() {
        let err = config(&[("API_KEY", "k"), ("NARRATIVE_TIMEOUT_SECS", "soon")]).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                key: "NARRATIVE_TIMEOUT_SECS",
                ..
            }
        ));

        let err = config(&[("API_KEY", "k"), ("NARRATIVE_TIMEOUT_SECS", "0")]).unwrap_err();
        assert!(err.to_string().contains("greater than zero"));
    }

    #[test]
    fn debug_output_hides_key() {
        let cfg = config(&[("API_KEY", "super-secret")]).unwrap();
        let debug = format!("{cfg:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("<redacted>"));
    }
}
