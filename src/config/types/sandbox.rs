//! Sandbox configuration types
//!
//! Resource limits and image overrides for ephemeral execution containers.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Sandbox configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SandboxConfig {
    /// Deadline for the run phase (start to exit) of a container
    #[serde(default = "default_run_timeout", with = "humantime_serde")]
    pub run_timeout: Duration,
    /// Memory limit (e.g. "256m", "1g")
    #[serde(default = "default_memory")]
    pub memory_limit: String,
    /// Relative CPU weight given to each container
    #[serde(default = "default_cpu_shares")]
    pub cpu_shares: i64,
    /// Image overrides keyed by language name
    #[serde(default)]
    pub images: BTreeMap<String, String>,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        SandboxConfig {
            run_timeout: default_run_timeout(),
            memory_limit: default_memory(),
            cpu_shares: default_cpu_shares(),
            images: BTreeMap::new(),
        }
    }
}

fn default_run_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_memory() -> String {
    "256m".to_string()
}

fn default_cpu_shares() -> i64 {
    512
}

impl SandboxConfig {
    /// Memory limit in bytes, if the configured string parses
    pub fn memory_limit_bytes(&self) -> Option<i64> {
        parse_memory_limit(&self.memory_limit)
    }
}

/// Parse a memory limit string (e.g., "512m", "1g") to bytes
pub fn parse_memory_limit(limit: &str) -> Option<i64> {
    let limit = limit.trim().to_lowercase();
    let (num_str, unit) = if limit.ends_with('g') || limit.ends_with("gb") {
        (limit.trim_end_matches(|c| c == 'g' || c == 'b'), "g")
    } else if limit.ends_with('m') || limit.ends_with("mb") {
        (limit.trim_end_matches(|c| c == 'm' || c == 'b'), "m")
    } else if limit.ends_with('k') || limit.ends_with("kb") {
        (limit.trim_end_matches(|c| c == 'k' || c == 'b'), "k")
    } else {
        (limit.as_str(), "b")
    };

    let num: i64 = num_str.parse().ok()?;
    if num <= 0 {
        return None;
    }

    let multiplier: i64 = match unit {
        "g" => 1024 * 1024 * 1024,
        "m" => 1024 * 1024,
        "k" => 1024,
        _ => 1,
    };

    num.checked_mul(multiplier)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sandbox_config_default() {
        let config = SandboxConfig::default();
        assert_eq!(config.run_timeout, Duration::from_secs(10));
        assert_eq!(config.memory_limit_bytes(), Some(256 * 1024 * 1024));
        assert_eq!(config.cpu_shares, 512);
        assert!(config.images.is_empty());
    }

    #[test]
    fn test_parse_memory_limit() {
        assert_eq!(parse_memory_limit("512m"), Some(512 * 1024 * 1024));
        assert_eq!(parse_memory_limit("1g"), Some(1024 * 1024 * 1024));
        assert_eq!(parse_memory_limit("256MB"), Some(256 * 1024 * 1024));
        assert_eq!(parse_memory_limit("1024k"), Some(1024 * 1024));
        assert_eq!(parse_memory_limit("1024"), Some(1024));
        assert_eq!(parse_memory_limit("lots"), None);
        assert_eq!(parse_memory_limit("0m"), None);
        assert_eq!(parse_memory_limit("99999999999g"), None);
        assert_eq!(parse_memory_limit("9223372036854775807k"), None);
        assert_eq!(parse_memory_limit("8589934591g"), Some(8_589_934_591 * 1024 * 1024 * 1024));
    }

    #[test]
    fn test_humantime_timeout() {
        let config: SandboxConfig =
            serde_json::from_str(r#"{"run_timeout": "2s 500ms"}"#).unwrap();
        assert_eq!(config.run_timeout, Duration::from_millis(2500));
        assert_eq!(config.memory_limit, "256m");
    }
}
