//! Request, result and language types shared by the gateway and its runtimes

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use crate::config::SandboxConfig;
use crate::error::{Error, Result};

/// Supported programming languages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    JavaScript,
}

impl Language {
    /// Every language the gateway accepts
    pub const ALL: [Language; 2] = [Language::Python, Language::JavaScript];

    /// Image used when the config does not override it
    pub fn default_image(self) -> &'static str {
        match self {
            Language::Python => "python:3.9-slim",
            Language::JavaScript => "node:18-alpine",
        }
    }

    /// Interpreter argv that evaluates `code` directly, with no file on disk
    pub fn command(self, code: &str) -> Vec<String> {
        let (interpreter, flag) = match self {
            Language::Python => ("python", "-c"),
            Language::JavaScript => ("node", "-e"),
        };
        vec![interpreter.to_string(), flag.to_string(), code.to_string()]
    }
}

impl std::str::FromStr for Language {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "python" => Ok(Language::Python),
            "javascript" => Ok(Language::JavaScript),
            _ => Err(Error::UnsupportedLanguage(s.to_string())),
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Language::Python => write!(f, "python"),
            Language::JavaScript => write!(f, "javascript"),
        }
    }
}

/// Read-only language → image mapping, fixed for the process lifetime
#[derive(Debug, Clone)]
pub struct LanguageTable {
    images: HashMap<Language, String>,
}

impl Default for LanguageTable {
    fn default() -> Self {
        LanguageTable {
            images: Language::ALL
                .iter()
                .map(|lang| (*lang, lang.default_image().to_string()))
                .collect(),
        }
    }
}

impl LanguageTable {
    /// Build the table from defaults plus configured image overrides
    pub fn from_config(config: &SandboxConfig) -> Result<Self> {
        let mut table = LanguageTable::default();
        for (name, image) in &config.images {
            let language: Language = name.parse().map_err(|_| {
                Error::Config(format!("Image override for unknown language: {}", name))
            })?;
            if image.trim().is_empty() {
                return Err(Error::Config(format!("Empty image override for {}", name)));
            }
            table.images.insert(language, image.clone());
        }
        Ok(table)
    }

    /// Image reference for a language
    pub fn image(&self, language: Language) -> &str {
        self.images
            .get(&language)
            .map(String::as_str)
            .unwrap_or_else(|| language.default_image())
    }

    /// Look up a language by its wire name
    pub fn resolve(&self, name: &str) -> Result<(Language, &str)> {
        let language: Language = name.parse()?;
        Ok((language, self.image(language)))
    }
}

/// Request to execute code, as received on the wire
///
/// Fields are optional so that missing values surface as validation errors
/// instead of deserialization failures.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutionRequest {
    /// Language identifier
    #[serde(default)]
    pub language: Option<String>,
    /// The code to execute
    #[serde(default)]
    pub code: Option<String>,
}

impl ExecutionRequest {
    /// Create a new execution request
    pub fn new(language: impl Into<String>, code: impl Into<String>) -> Self {
        ExecutionRequest {
            language: Some(language.into()),
            code: Some(code.into()),
        }
    }

    /// Return the language name and code, rejecting missing or empty fields
    pub fn fields(&self) -> Result<(&str, &str)> {
        let language = self.language.as_deref().filter(|s| !s.is_empty());
        let code = self.code.as_deref().filter(|s| !s.is_empty());
        match (language, code) {
            (Some(language), Some(code)) => Ok((language, code)),
            (None, _) => Err(Error::InvalidInput("Missing required field: language".to_string())),
            (_, None) => Err(Error::InvalidInput("Missing required field: code".to_string())),
        }
    }
}

/// Result of a completed container run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionOutput {
    /// Combined stdout/stderr, trimmed of surrounding whitespace
    pub output: String,
    /// Exit status reported by the runtime
    pub exit_code: i64,
    /// Time from container start to exit
    pub execution_time: Duration,
}

impl ExecutionOutput {
    /// Build a result from raw collected bytes
    pub fn from_raw(raw: &[u8], exit_code: i64, execution_time: Duration) -> Self {
        ExecutionOutput {
            output: String::from_utf8_lossy(raw).trim().to_string(),
            exit_code,
            execution_time,
        }
    }
}
