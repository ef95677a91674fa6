//! Common error types for the healthcheck runner.

use std::fmt;

/// A specialized Result type for healthcheck runner operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for healthcheck runner operations.
///
/// Probe failures never show up here: they are recorded in the check result.
/// These variants describe problems with the run itself.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Logging error: {0}")]
    Logging(String),

    #[error("HTTP client error: {0}")]
    Http(String),
}

impl Error {
    /// Create a new configuration error.
    pub fn config(msg: impl fmt::Display) -> Self {
        Error::Config(msg.to_string())
    }

    /// Create a new logging error.
    pub fn logging(msg: impl fmt::Display) -> Self {
        Error::Logging(msg.to_string())
    }

    /// Create a new HTTP client error.
    pub fn http(msg: impl fmt::Display) -> Self {
        Error::Http(msg.to_string())
    }

    /// Whether this error comes from a malformed check list or settings.
    pub fn is_config(&self) -> bool {
        matches!(self, Error::Config(_))
    }
}

/// Render an error with every cause in its `source()` chain, joined by `": "`.
///
/// A cause whose text already appears in the message so far is skipped.
pub fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();

    while let Some(cause) = source {
        let text = cause.to_string();
        if !text.is_empty() && !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }

    message
}
