//! Data directory layout.

use std::path::{Path, PathBuf};

use panelbus_types::config::ServerConfig;

/// Resolve the data directory from environment or platform defaults.
///
/// Priority:
/// 1. `PANELBUS_DATA_DIR` environment variable
/// 2. `~/.panelbus`
/// 3. `./.panelbus`
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("PANELBUS_DATA_DIR") {
        return PathBuf::from(dir);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".panelbus");
    }

    PathBuf::from(".panelbus")
}

/// Directory holding bundle manifests. Relative paths are taken from `data_dir`.
pub fn resolve_bundles_dir(data_dir: &Path, server: &ServerConfig) -> PathBuf {
    let configured = Path::new(&server.bundles_dir);
    if configured.is_absolute() {
        configured.to_path_buf()
    } else {
        data_dir.join(configured)
    }
}
