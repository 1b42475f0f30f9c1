//! Error types for the Gutendex client
//!
//! This module defines the error hierarchy for the whole crate.
//! All public APIs return `Result<T, Error>` where Error is defined here.
//!
//! Request failures carry an [`ErrorKind`] so callers can branch on the
//! category (network, not-found, rate-limited, server) without inspecting
//! the wrapped cause. Context cancellation is deliberately kept outside that
//! taxonomy: it is reported as [`Error::Cancelled`] or
//! [`Error::DeadlineExceeded`].

use std::fmt;
use thiserror::Error;

/// Boxed cause carried by a classified request error
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Category of a failed request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// No response was received (connection, DNS, I/O)
    Network,
    /// HTTP 404
    NotFound,
    /// HTTP 429
    RateLimited,
    /// Any other non-success status, or an undecodable body
    Server,
}

impl ErrorKind {
    /// Classify a non-success HTTP status code
    pub fn from_status(status: u16) -> Self {
        match status {
            404 => Self::NotFound,
            429 => Self::RateLimited,
            _ => Self::Server,
        }
    }

    /// Short lowercase name of the kind
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::NotFound => "not-found",
            Self::RateLimited => "rate-limited",
            Self::Server => "server",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The main error type for the Gutendex client
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Request Errors
    // ============================================================================
    #[error("{}", display_request(op, source.as_deref()))]
    Request {
        op: String,
        kind: ErrorKind,
        #[source]
        source: Option<BoxError>,
    },

    #[error("request cancelled")]
    Cancelled,

    #[error("request deadline exceeded")]
    DeadlineExceeded,

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

fn display_request(op: &str, source: Option<&(dyn std::error::Error + Send + Sync)>) -> String {
    match source {
        Some(cause) => format!("{op}: {cause}"),
        None => op.to_string(),
    }
}

impl Error {
    /// Create a classified request error
    pub fn request(op: impl Into<String>, kind: ErrorKind, cause: impl Into<BoxError>) -> Self {
        Self::Request {
            op: op.into(),
            kind,
            source: Some(cause.into()),
        }
    }

    /// Create a classified request error without a cause
    pub fn bare(op: impl Into<String>, kind: ErrorKind) -> Self {
        Self::Request {
            op: op.into(),
            kind,
            source: None,
        }
    }

    /// Create an error for a non-success HTTP status
    pub fn status(op: impl Into<String>, status: u16) -> Self {
        Self::request(
            op,
            ErrorKind::from_status(status),
            format!("status {status}"),
        )
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Kind of a classified request error, `None` for everything else
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Error::Request { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// Operation label of a classified request error
    pub fn op(&self) -> Option<&str> {
        match self {
            Error::Request { op, .. } => Some(op),
            _ => None,
        }
    }

    /// Compare by kind alone, ignoring operation label and cause
    pub fn is_kind(&self, kind: ErrorKind) -> bool {
        self.kind() == Some(kind)
    }

    /// Check if this is a not-found error
    pub fn is_not_found(&self) -> bool {
        self.is_kind(ErrorKind::NotFound)
    }

    /// Check if this error came from context cancellation or an expired deadline
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Error::Cancelled | Error::DeadlineExceeded)
    }
}

/// Reports whether `err` is a not-found error
pub fn is_not_found(err: &Error) -> bool {
    err.is_not_found()
}

/// Result type alias for the Gutendex client
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
