//! Configuration I/O - Loading and saving configuration
//!
//! Handles reading configuration from files and environment variables.

use std::path::Path;

use humantime_serde::re::humantime;
use tracing::{debug, warn};

use super::types::Config;
use crate::error::{Error, Result};

/// Load configuration with layered precedence:
/// 1. Config file if it exists, otherwise defaults
/// 2. Environment variable overrides
pub fn load_config() -> Result<Config> {
    load_config_with(&super::paths::config_path())
}

/// Same as [`load_config`] but reads the file at `path`
pub fn load_config_with(path: &Path) -> Result<Config> {
    let mut config = if path.exists() {
        debug!("Loading config from {}", path.display());
        load_config_from_path(path)?
    } else {
        debug!("No config file at {}, using defaults", path.display());
        Config::default()
    };

    apply_env_overrides(&mut config);

    Ok(config)
}

/// Load configuration from a specific path
pub fn load_config_from_path(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
    })?;

    // Detect format by extension
    let config: Config = if path.extension().is_some_and(|ext| ext == "json") {
        json5::from_str(&content).map_err(|e| Error::Config(format!("Invalid JSON config: {}", e)))?
    } else if path.extension().is_some_and(|ext| ext == "toml") {
        toml::from_str(&content).map_err(|e| Error::Config(format!("Invalid TOML config: {}", e)))?
    } else {
        // Try JSON5 first, then TOML
        json5::from_str(&content)
            .or_else(|_| toml::from_str(&content).map_err(|e| Error::Config(e.to_string())))
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?
    };

    Ok(config)
}

/// Apply environment variable overrides to an existing config.
///
/// Env vars have the highest precedence after CLI flags. `.env` must already
/// be loaded (see [`super::load_dotenv`]).
pub fn apply_env_overrides(config: &mut Config) {
    apply_overrides(config, |key| std::env::var(key).ok());
}

fn apply_overrides(config: &mut Config, var: impl Fn(&str) -> Option<String>) {
    // Server overrides
    if let Some(bind) = var("GATEWAY_BIND") {
        config.server.bind = bind;
    }
    if let Some(port) = var("GATEWAY_PORT") {
        match port.parse() {
            Ok(port) => config.server.port = port,
            Err(_) => warn!("Ignoring invalid GATEWAY_PORT: {}", port),
        }
    }

    // Sandbox overrides
    if let Some(timeout) = var("SANDBOX_RUN_TIMEOUT") {
        match humantime::parse_duration(&timeout) {
            Ok(v) => config.sandbox.run_timeout = v,
            Err(_) => warn!("Ignoring invalid SANDBOX_RUN_TIMEOUT: {}", timeout),
        }
    }
    if let Some(memory) = var("SANDBOX_MEMORY_LIMIT") {
        config.sandbox.memory_limit = memory;
    }
    if let Some(shares) = var("SANDBOX_CPU_SHARES") {
        match shares.parse() {
            Ok(v) => config.sandbox.cpu_shares = v,
            Err(_) => warn!("Ignoring invalid SANDBOX_CPU_SHARES: {}", shares),
        }
    }
    if let Some(image) = var("SANDBOX_PYTHON_IMAGE") {
        config.sandbox.images.insert("python".to_string(), image);
    }
    if let Some(image) = var("SANDBOX_JAVASCRIPT_IMAGE") {
        config.sandbox.images.insert("javascript".to_string(), image);
    }
}
