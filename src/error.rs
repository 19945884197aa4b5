//! Error types for fanout-pager
//!
//! This module defines the error hierarchy for the entire crate.
//! All public APIs return `Result<T, Error>` where Error is defined here.

use thiserror::Error;

/// The main error type for fanout-pager
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Status-classified upstream errors
    // ============================================================================
    #[error("401 unauthorized")]
    Unauthorized,

    #[error("403 forbidden")]
    Forbidden,

    #[error("404 not found")]
    NotFound,

    #[error("429 too many requests")]
    RateLimited,

    #[error("500 internal server error")]
    ServerError,

    #[error("400 bad request: {message}")]
    ClientError { message: String },

    #[error("{status} unknown status")]
    UnknownStatus { status: u16 },

    // ============================================================================
    // Transport Errors
    // ============================================================================
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ============================================================================
    // Terminal Errors
    // ============================================================================
    #[error("Failed to decode response: {message}")]
    Decode { message: String },

    #[error("Failed to get response after {attempts} attempts: {last}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        last: Box<Error>,
    },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Operation cancelled")]
    Cancelled,

    // ============================================================================
    // Config file / output Errors
    // ============================================================================
    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a decode error
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Create a 400 error carrying the upstream message
    pub fn client_error(message: impl Into<String>) -> Self {
        Self::ClientError {
            message: message.into(),
        }
    }

    /// Whether a fetch that failed with this error may be attempted again.
    ///
    /// Transport failures and every status-classified error qualify. Decode,
    /// configuration and cancellation errors are contract faults and do not,
    /// nor does a request reqwest refused to build.
    pub fn is_transient(&self) -> bool {
        if let Error::Http(e) = self {
            return !e.is_builder();
        }
        matches!(
            self,
            Error::Unauthorized
                | Error::Forbidden
                | Error::NotFound
                | Error::RateLimited
                | Error::ServerError
                | Error::ClientError { .. }
                | Error::UnknownStatus { .. }
        )
    }

    /// HTTP status this error was classified from, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Unauthorized => Some(401),
            Error::Forbidden => Some(403),
            Error::NotFound => Some(404),
            Error::RateLimited => Some(429),
            Error::ServerError => Some(500),
            Error::ClientError { .. } => Some(400),
            Error::UnknownStatus { status } => Some(*status),
            Error::RetriesExhausted { last, .. } => last.status(),
            _ => None,
        }
    }

    /// Check if this error came from a cancelled operation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }
}

/// Result type alias for fanout-pager
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", message.into(), inner))
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", f(), inner))
        })
    }
}
