//! Error types for the sandbox gateway

use thiserror::Error;

/// Result type alias using the gateway's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the sandbox gateway
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid or missing request fields
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Language not present in the language table
    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    /// Docker/container error
    #[error("Container error: {0}")]
    Container(String),

    /// Run phase exceeded its deadline
    #[error("Execution timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Check if error is a client error (user's fault)
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidInput(_) | Error::UnsupportedLanguage(_)
        )
    }

    /// Check if error came from the run deadline
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout(_))
    }
}

impl From<bollard::errors::Error> for Error {
    fn from(err: bollard::errors::Error) -> Self {
        Error::Container(err.to_string())
    }
}
