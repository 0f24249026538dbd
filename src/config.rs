//! Engine configuration
//!
//! Read from an optional Python dict at `init_engine` time; missing keys
//! fall back to defaults.

use pyo3::prelude::*;
use pyo3::types::PyDict;
use serde::Deserialize;

use crate::error::RuleEngineError;
use crate::rule::cache::{self, DEFAULT_CACHE_CAPACITY};

fn default_cache_enabled() -> bool {
    true
}

fn default_cache_capacity() -> usize {
    DEFAULT_CACHE_CAPACITY
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EngineConfig {
    /// Cache parsed trees by rule text
    #[serde(default = "default_cache_enabled")]
    pub cache_enabled: bool,
    /// Entries kept before the cache is cleared
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache_enabled: default_cache_enabled(),
            cache_capacity: default_cache_capacity(),
        }
    }
}

impl EngineConfig {
    /// Push the cache settings to the process-wide rule cache
    pub fn apply(&self) {
        cache::configure(self.cache_enabled, self.cache_capacity);
    }
}

/// Deserialize engine configuration from a Python dict
pub fn deserialize_config(dict: &Bound<'_, PyDict>) -> PyResult<EngineConfig> {
    let mut config = EngineConfig::default();

    if let Some(value) = dict.get_item("cache_enabled")? {
        config.cache_enabled = value.extract().map_err(|_| {
            RuleEngineError::DeserializationError("cache_enabled must be a bool".to_string())
        })?;
    }

    if let Some(value) = dict.get_item("cache_capacity")? {
        config.cache_capacity = value.extract().map_err(|_| {
            RuleEngineError::DeserializationError(
                "cache_capacity must be a non-negative int".to_string(),
            )
        })?;
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert!(config.cache_enabled);
        assert_eq!(config.cache_capacity, 2048);
        assert_eq!(serde_json::from_str::<EngineConfig>("{}").unwrap(), config);
    }

    #[test]
    fn test_deserialize_ignores_unknown_keys() {
        let config: EngineConfig = serde_json::from_str(
            r#"{"cache_enabled": false, "cache_capacity": 16, "extra": 1}"#,
        )
        .unwrap();
        assert!(!config.cache_enabled);
        assert_eq!(config.cache_capacity, 16);

        assert!(serde_json::from_str::<EngineConfig>(r#"{"cache_capacity": "lots"}"#).is_err());
    }
}
