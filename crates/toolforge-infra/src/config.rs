//! Generation service configuration loader.
//!
//! Reads `config.toml` from the data directory and deserializes it into
//! [`GenerationConfig`]. Falls back to defaults when the file is missing or
//! malformed.

use std::path::Path;

use toolforge_types::config::GenerationConfig;

/// Load generation configuration from `{data_dir}/config.toml`.
///
/// - If the file does not exist, returns [`GenerationConfig::default()`].
/// - If the file exists but fails to parse, logs a warning and returns the
///   default.
/// - If the file exists and parses successfully, returns the parsed config.
pub async fn load_generation_config(data_dir: &Path) -> GenerationConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(
                "No config.toml found at {}, using defaults",
                config_path.display()
            );
            return GenerationConfig::default();
        }
        Err(err) => {
            tracing::warn!(
                "Failed to read {}: {err}, using defaults",
                config_path.display()
            );
            return GenerationConfig::default();
        }
    };

    match toml::from_str::<GenerationConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            GenerationConfig::default()
        }
    }
}
