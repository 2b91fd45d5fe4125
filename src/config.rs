//! Bridge-Konfiguration
//!
//! Werte kommen aus Umgebungsvariablen (mit Defaults) oder aus JSON:
//! - `EVENT_BRIDGE_WORKER_NAME` - Name des Poll-Threads
//! - `EVENT_BRIDGE_POLL_TIMEOUT_MS` - maximale Wartezeit eines Polls
//! - `EVENT_BRIDGE_IDLE_BACKOFF_MS` - Pause nach einem leeren Poll

use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

pub const ENV_WORKER_NAME: &str = "EVENT_BRIDGE_WORKER_NAME";
pub const ENV_POLL_TIMEOUT_MS: &str = "EVENT_BRIDGE_POLL_TIMEOUT_MS";
pub const ENV_IDLE_BACKOFF_MS: &str = "EVENT_BRIDGE_IDLE_BACKOFF_MS";

const DEFAULT_WORKER_NAME: &str = "event-bridge-poll";

// ============================================================================
// ERROR TYPES
// ============================================================================

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    InvalidNumber { key: &'static str, value: String },

    #[error("Worker name must not be empty")]
    EmptyWorkerName,

    #[error("Invalid JSON configuration: {0}")]
    Json(String),
}

// ============================================================================
// BRIDGE CONFIG
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Name des Poll-Threads
    pub worker_name: String,

    /// Maximale Wartezeit eines Polls (`None` = blockiert bis Event oder Wake)
    #[serde(rename = "poll_timeout_ms", with = "opt_millis")]
    pub poll_timeout: Option<Duration>,

    /// Pause nach einem leeren Poll (`None` = sofort erneut pollen)
    #[serde(rename = "idle_backoff_ms", with = "opt_millis")]
    pub idle_backoff: Option<Duration>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            worker_name: DEFAULT_WORKER_NAME.to_string(),
            poll_timeout: None,
            idle_backoff: None,
        }
    }
}

impl BridgeConfig {
    /// Lädt die Konfiguration aus den Umgebungsvariablen
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Lädt die Konfiguration aus einem JSON-Dokument
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Json(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Lädt die Konfiguration über eine beliebige Key-Lookup-Funktion
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(name) = lookup(ENV_WORKER_NAME) {
            config.worker_name = name;
        }
        config.poll_timeout = parse_millis(ENV_POLL_TIMEOUT_MS, lookup(ENV_POLL_TIMEOUT_MS))?;
        config.idle_backoff = parse_millis(ENV_IDLE_BACKOFF_MS, lookup(ENV_IDLE_BACKOFF_MS))?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.worker_name.trim().is_empty() {
            return Err(ConfigError::EmptyWorkerName);
        }
        Ok(())
    }
}

fn parse_millis(
    key: &'static str,
    value: Option<String>,
) -> Result<Option<Duration>, ConfigError> {
    match value {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map(|ms| Some(Duration::from_millis(ms)))
            .map_err(|_| ConfigError::InvalidNumber { key, value: raw }),
    }
}

mod opt_millis {
    use serde::{Deserialize, Deserializer};
    use std::time::Duration;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_millis))
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_env() {
        let config = BridgeConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, BridgeConfig::default());
        assert_eq!(config.worker_name, "event-bridge-poll");
        assert_eq!(config.poll_timeout, None);
        assert_eq!(config.idle_backoff, None);
    }

    #[test]
    fn test_values_from_env() {
        let config = BridgeConfig::from_lookup(lookup(&[
            (ENV_WORKER_NAME, "p2p-events"),
            (ENV_POLL_TIMEOUT_MS, "250"),
            (ENV_IDLE_BACKOFF_MS, " 5 "),
        ]))
        .unwrap();

        assert_eq!(config.worker_name, "p2p-events");
        assert_eq!(config.poll_timeout, Some(Duration::from_millis(250)));
        assert_eq!(config.idle_backoff, Some(Duration::from_millis(5)));
    }

    #[test]
    fn test_invalid_number_is_rejected() {
        let err =
            BridgeConfig::from_lookup(lookup(&[(ENV_POLL_TIMEOUT_MS, "soon")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidNumber {
                key: ENV_POLL_TIMEOUT_MS,
                value: "soon".to_string()
            }
        );
    }

    #[test]
    fn test_empty_worker_name_is_rejected() {
        let err = BridgeConfig::from_lookup(lookup(&[(ENV_WORKER_NAME, "  ")])).unwrap_err();
        assert_eq!(err, ConfigError::EmptyWorkerName);
    }

    #[test]
    fn test_from_json() {
        let config =
            BridgeConfig::from_json(r#"{ "worker_name": "rtc", "idle_backoff_ms": 20 }"#).unwrap();

        assert_eq!(config.worker_name, "rtc");
        assert_eq!(config.poll_timeout, None);
        assert_eq!(config.idle_backoff, Some(Duration::from_millis(20)));

        assert!(matches!(
            BridgeConfig::from_json("{ not json"),
            Err(ConfigError::Json(_))
        ));
    }
}
