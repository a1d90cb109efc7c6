// src/error.rs

//! Unified error handling for the scanner.

use std::fmt;

use thiserror::Error;

/// Result type alias for scanner operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed before a response was received
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Upstream answered with a non-success status
    #[error("Unexpected status {status} from {url}")]
    Transport { url: String, status: u16 },

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// XML parsing failed
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// An expected pattern was absent from an upstream document
    #[error("Structure error: {0}")]
    Structure(String),

    /// Entries and images scraped from one page disagree in length
    #[error("Found {entries} entries but {images} images")]
    Consistency { entries: usize, images: usize },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Failure of a chat-platform user lookup.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    /// The platform confirmed the user does not exist
    #[error("user not found")]
    NotFound,

    /// Any other failure (network, auth, rate limit)
    #[error("user lookup failed: {0}")]
    Failed(String),
}

impl AppError {
    /// Create a transport error for a non-success response.
    pub fn transport(url: impl Into<String>, status: reqwest::StatusCode) -> Self {
        Self::Transport {
            url: url.into(),
            status: status.as_u16(),
        }
    }

    /// Create a structural parse error.
    pub fn structure(message: impl fmt::Display) -> Self {
        Self::Structure(message.to_string())
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Whether the error means the remote document was unavailable.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Transport { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_classification() {
        let err = AppError::transport("https://example.com", reqwest::StatusCode::BAD_GATEWAY);
        assert!(err.is_transport());
        assert_eq!(
            err.to_string(),
            "Unexpected status 502 from https://example.com"
        );
        assert!(!AppError::structure("no entries").is_transport());
    }
}
