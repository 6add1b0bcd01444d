//! Configuration validation
//!
//! Validates configuration and reports issues.

use super::types::Config;
use crate::sandbox::Language;

/// Result of configuration validation
#[derive(Debug, Clone)]
pub struct ConfigValidationResult {
    /// Whether the config is valid
    pub valid: bool,
    /// Validation errors (critical)
    pub errors: Vec<ValidationIssue>,
    /// Validation warnings (non-critical)
    pub warnings: Vec<ValidationIssue>,
}

impl ConfigValidationResult {
    /// Create a valid result
    pub fn valid() -> Self {
        ConfigValidationResult {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Add an error
    pub fn with_error(mut self, issue: ValidationIssue) -> Self {
        self.valid = false;
        self.errors.push(issue);
        self
    }

    /// Add a warning
    pub fn with_warning(mut self, issue: ValidationIssue) -> Self {
        self.warnings.push(issue);
        self
    }
}

/// A validation issue
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    /// Path to the config field
    pub path: String,
    /// Issue message
    pub message: String,
    /// Suggested fix
    pub suggestion: Option<String>,
}

impl ValidationIssue {
    /// Create a new issue
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        ValidationIssue {
            path: path.into(),
            message: message.into(),
            suggestion: None,
        }
    }

    /// Add a suggestion
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)?;
        if let Some(suggestion) = &self.suggestion {
            write!(f, " ({})", suggestion)?;
        }
        Ok(())
    }
}

/// Validate the configuration
pub fn validate_config(config: &Config) -> ConfigValidationResult {
    let mut result = ConfigValidationResult::valid();

    result = validate_server_config(config, result);
    result = validate_sandbox_config(config, result);

    result
}

fn validate_server_config(config: &Config, mut result: ConfigValidationResult) -> ConfigValidationResult {
    if config.server.bind.parse::<std::net::IpAddr>().is_err() {
        result = result.with_error(
            ValidationIssue::new(
                "server.bind",
                format!("Invalid bind address: {}", config.server.bind),
            )
            .with_suggestion("Use an IP address such as 0.0.0.0 or 127.0.0.1"),
        );
    }

    result
}

fn validate_sandbox_config(config: &Config, mut result: ConfigValidationResult) -> ConfigValidationResult {
    let sandbox = &config.sandbox;

    if sandbox.run_timeout.is_zero() {
        result = result.with_error(
            ValidationIssue::new("sandbox.run_timeout", "Run timeout must be greater than zero")
                .with_suggestion("Use a duration such as \"10s\""),
        );
    }

    if sandbox.memory_limit_bytes().is_none() {
        result = result.with_error(
            ValidationIssue::new(
                "sandbox.memory_limit",
                format!("Invalid memory limit: {}", sandbox.memory_limit),
            )
            .with_suggestion("Use a size such as \"256m\" or \"1g\""),
        );
    }

    // Docker clamps shares outside this range
    if !(2..=262_144).contains(&sandbox.cpu_shares) {
        result = result.with_warning(ValidationIssue::new(
            "sandbox.cpu_shares",
            format!("CPU shares {} outside 2..=262144", sandbox.cpu_shares),
        ));
    }

    for (name, image) in &sandbox.images {
        let path = format!("sandbox.images.{}", name);
        if name.parse::<Language>().is_err() {
            result = result.with_error(
                ValidationIssue::new(path, format!("Unknown language: {}", name))
                    .with_suggestion("Supported languages: python, javascript"),
            );
        } else if image.trim().is_empty() {
            result = result.with_error(ValidationIssue::new(path, "Image reference is empty"));
        }
    }

    result
}
