//! Configuration paths

use std::path::PathBuf;

/// Load `.env` from the working directory (or a parent).
///
/// Must run before anything reads the environment, including path resolution.
pub fn load_dotenv() -> Option<PathBuf> {
    dotenvy::dotenv().ok()
}

/// Get the configuration directory
pub fn config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("SANDBOX_GATEWAY_CONFIG_DIR") {
        return PathBuf::from(dir);
    }

    // Use XDG config directory or fallback
    dirs::config_dir()
        .map(|d| d.join("sandbox-gateway"))
        .unwrap_or_else(|| {
            dirs::home_dir()
                .map(|h| h.join(".config").join("sandbox-gateway"))
                .unwrap_or_else(|| PathBuf::from(".sandbox-gateway"))
        })
}

/// Get the main configuration file path
pub fn config_path() -> PathBuf {
    if let Ok(path) = std::env::var("SANDBOX_GATEWAY_CONFIG") {
        return PathBuf::from(path);
    }

    config_dir().join("config.json")
}
