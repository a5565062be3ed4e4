//! Generation service configuration.
//!
//! Deserialized from `config.toml` by `toolforge-infra`; defaults apply when
//! the file is missing or malformed.

use serde::{Deserialize, Serialize};

/// Default stall interval before a silent stream is treated as failed.
pub const DEFAULT_STALL_TIMEOUT_SECS: u64 = 30;

/// Configuration for the external generation service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Base URL of the generation service.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Model identifier passed through to the service.
    #[serde(default = "default_model")]
    pub model: String,
    /// Seconds without stream data before the session fails as stalled.
    #[serde(default = "default_stall_timeout")]
    pub stall_timeout_secs: u64,
}

fn default_endpoint() -> String {
    "http://localhost:8787/v1/generate".to_string()
}

fn default_model() -> String {
    "toolforge-composer-1".to_string()
}

fn default_stall_timeout() -> u64 {
    DEFAULT_STALL_TIMEOUT_SECS
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            stall_timeout_secs: default_stall_timeout(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let config = GenerationConfig::default();
        assert_eq!(config.stall_timeout_secs, DEFAULT_STALL_TIMEOUT_SECS);
        assert!(config.endpoint.starts_with("http"));
    }

    #[test]
    fn partial_fields_fall_back_to_defaults() {
        let config: GenerationConfig =
            serde_json::from_str(r#"{"stall_timeout_secs": 5}"#).unwrap();
        assert_eq!(config.stall_timeout_secs, 5);
        assert_eq!(config.model, "toolforge-composer-1");
    }
}
