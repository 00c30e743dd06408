// src/error.rs

//! Unified error handling for the collector.

use std::fmt;

use thiserror::Error;

/// Result type alias for collector operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Failure classes used by the orchestrator to decide how an entry ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Network or HTTP status failure
    Fetch,
    /// Markup did not have the expected structure
    Parse,
    /// Malformed archive or undecodable bytes
    Format,
    /// Expected payload missing from an archive
    NotFound,
    /// Persistence failure
    Store,
    /// Configuration, I/O and everything else
    Other,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Fetch => "fetch",
            ErrorKind::Parse => "parse",
            ErrorKind::Format => "format",
            ErrorKind::NotFound => "not-found",
            ErrorKind::Store => "store",
            ErrorKind::Other => "other",
        };
        f.write_str(name)
    }
}

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// Server answered with a non-success status
    #[error("GET {url} returned status {status}")]
    Status { url: String, status: u16 },

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Markup structure was not usable
    #[error("Parse error: {0}")]
    Parse(String),

    /// CSS selector parsing failed
    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    /// Archive or text payload was malformed
    #[error("Format error: {0}")]
    Format(String),

    /// Container could not be opened or read
    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Expected payload absent
    #[error("Not found: {0}")]
    NotFound(String),

    /// Relational operation failed
    #[error("Store error: {0}")]
    Store(#[from] sqlx::Error),

    /// Morphological analysis failed or its dictionary could not be loaded
    #[error("Segmentation error: {0}")]
    Segment(String),

    /// Too many consecutive store failures; the store is assumed unusable
    #[error("Aborting run after {failures} consecutive store failures")]
    StoreUnusable { failures: usize },

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

impl AppError {
    /// Create a status error for a URL.
    pub fn status(url: impl Into<String>, status: u16) -> Self {
        Self::Status {
            url: url.into(),
            status,
        }
    }

    /// Create a selector parsing error.
    pub fn selector(selector: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Selector {
            selector: selector.into(),
            message: message.to_string(),
        }
    }

    /// Create a markup parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    /// Create an archive format error.
    pub fn format(message: impl Into<String>) -> Self {
        Self::Format(message.into())
    }

    /// Create a not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Create a segmentation error.
    pub fn segment(message: impl fmt::Display) -> Self {
        Self::Segment(message.to_string())
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Classify the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Status { .. } | AppError::Http(_) => ErrorKind::Fetch,
            AppError::Parse(_) | AppError::Selector { .. } => ErrorKind::Parse,
            AppError::Format(_) | AppError::Zip(_) => ErrorKind::Format,
            AppError::NotFound(_) => ErrorKind::NotFound,
            AppError::Store(_) | AppError::StoreUnusable { .. } => ErrorKind::Store,
            _ => ErrorKind::Other,
        }
    }

    /// Whether repeating the same request could succeed.
    ///
    /// Transport failures and 5xx / 429 statuses are retryable; other
    /// statuses are a definitive answer from the server.
    pub fn is_retryable(&self) -> bool {
        match self {
            AppError::Status { status, .. } => *status >= 500 || *status == 429,
            AppError::Http(e) => !e.is_builder() && !e.is_decode(),
            _ => false,
        }
    }
}
