//! Configuration loader for panelbus.
//!
//! Reads `config.toml` from the data directory (`~/.panelbus/` in production)
//! and deserializes it into [`PanelbusConfig`]. Falls back to defaults when
//! the file is missing or malformed.

use std::path::Path;

use panelbus_types::config::PanelbusConfig;

/// Load configuration from `{data_dir}/config.toml`.
///
/// - Missing file: [`PanelbusConfig::default()`].
/// - Unreadable or unparseable file: a warning, then the default.
pub async fn load_config(data_dir: &Path) -> PanelbusConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return PanelbusConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return PanelbusConfig::default();
        }
    };

    match toml::from_str::<PanelbusConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            PanelbusConfig::default()
        }
    }
}
