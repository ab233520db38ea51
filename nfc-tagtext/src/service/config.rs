//! Service settings
//!
//! Defaults, overridable from the environment or from JSON handed over by
//! the front end.

use log::warn;
use serde::{Deserialize, Serialize};

use crate::page::{self, PageConfig, DEFAULT_CONFIG_NAME};
use crate::probe::DEFAULT_SAMPLE_LEN;

pub const ENV_DEFAULT_CONFIG: &str = "NFC_TAGTEXT_DEFAULT_CONFIG";
pub const ENV_QUEUE_DEPTH: &str = "NFC_TAGTEXT_QUEUE_DEPTH";
pub const ENV_SAMPLE_LEN: &str = "NFC_TAGTEXT_SAMPLE_LEN";

const DEFAULT_QUEUE_DEPTH: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ServiceConfig {
    /// Registry name used before the first probe
    pub default_config: String,
    /// Capacity of the notification channel
    pub queue_depth: usize,
    /// Bytes kept as hex sample per probe test
    pub sample_len: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            default_config: DEFAULT_CONFIG_NAME.to_string(),
            queue_depth: DEFAULT_QUEUE_DEPTH,
            sample_len: DEFAULT_SAMPLE_LEN,
        }
    }
}

impl ServiceConfig {
    /// Defaults overridden by `NFC_TAGTEXT_*` environment variables
    pub fn from_env() -> Self {
        Self::default().apply_overrides(|key| std::env::var(key).ok())
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    fn apply_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(name) = lookup(ENV_DEFAULT_CONFIG) {
            self.default_config = name;
        }
        if let Some(raw) = lookup(ENV_QUEUE_DEPTH) {
            match raw.parse() {
                Ok(depth) => self.queue_depth = depth,
                Err(e) => warn!("Ignoring {}={:?}: {}", ENV_QUEUE_DEPTH, raw, e),
            }
        }
        if let Some(raw) = lookup(ENV_SAMPLE_LEN) {
            match raw.parse() {
                Ok(len) => self.sample_len = len,
                Err(e) => warn!("Ignoring {}={:?}: {}", ENV_SAMPLE_LEN, raw, e),
            }
        }
        self
    }

    /// Initial active configuration, falling back to the registry default
    pub fn initial_page_config(&self) -> PageConfig {
        page::lookup(&self.default_config).unwrap_or_else(|| {
            warn!(
                "Unknown default configuration {}, using {}",
                self.default_config, DEFAULT_CONFIG_NAME
            );
            page::default_config()
        })
    }

    pub fn channel_capacity(&self) -> usize {
        self.queue_depth.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn overrides(pairs: &[(&str, &str)]) -> ServiceConfig {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServiceConfig::default().apply_overrides(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::default();
        assert_eq!(config.default_config, "PAGE_4");
        assert_eq!(config.queue_depth, 32);
        assert_eq!(config.sample_len, 8);
    }

    #[test]
    fn test_env_overrides() {
        let config = overrides(&[
            (ENV_DEFAULT_CONFIG, "PAGE_6"),
            (ENV_QUEUE_DEPTH, "4"),
            (ENV_SAMPLE_LEN, "16"),
        ]);
        assert_eq!(config.default_config, "PAGE_6");
        assert_eq!(config.queue_depth, 4);
        assert_eq!(config.sample_len, 16);
        assert_eq!(config.initial_page_config().page_number(), 6);
    }

    #[test]
    fn test_bad_numbers_are_ignored() {
        let config = overrides(&[(ENV_QUEUE_DEPTH, "lots"), (ENV_SAMPLE_LEN, "-1")]);
        assert_eq!(config.queue_depth, 32);
        assert_eq!(config.sample_len, 8);
    }

    #[test]
    fn test_unknown_default_falls_back() {
        let config = overrides(&[(ENV_DEFAULT_CONFIG, "PAGE_42")]);
        assert_eq!(config.initial_page_config().name(), "PAGE_4");
    }

    #[test]
    fn test_from_json_partial() {
        let config = ServiceConfig::from_json(r#"{"defaultConfig":"MULTI_PAGE"}"#).unwrap();
        assert_eq!(config.default_config, "MULTI_PAGE");
        assert_eq!(config.queue_depth, 32);
    }

    #[test]
    fn test_zero_capacity_clamped() {
        let config = overrides(&[(ENV_QUEUE_DEPTH, "0")]);
        assert_eq!(config.channel_capacity(), 1);
    }
}
