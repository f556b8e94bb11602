//! Unified error type for the storefront sync core.

use thiserror::Error;

/// All errors raised by the crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid or unreadable configuration
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong
        message: String,
    },

    /// Persistent storage backend failure
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// HTTP client could not be constructed
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// The request never produced an HTTP response (DNS, refused, timeout...)
    #[error("Network error: {message}")]
    Network {
        /// Transport-level failure description
        message: String,
    },

    /// The backend answered 401 for a call that needs a session
    #[error("Authentication required")]
    AuthenticationRequired,

    /// The backend answered with a non-success status or `success: false`
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Server-supplied message, or a fallback when none was sent
        message: String,
    },

    /// A mutation was requested with an empty product identifier
    #[error("Product id must not be empty")]
    InvalidProductId,

    /// A persisted value could not be decoded
    #[error("Storage error for key `{key}`: {message}")]
    Storage {
        /// Storage key that held the bad value
        key: String,
        /// Decode failure
        message: String,
    },

    /// Checkout prerequisites are not met
    #[error("Checkout error: {message}")]
    Checkout {
        /// User-facing reason
        message: String,
    },

    /// JSON encode/decode failure
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Wraps a transport failure from `reqwest` as a network error.
    #[must_use]
    pub fn network(err: &reqwest::Error) -> Self {
        Self::Network {
            message: err.to_string(),
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
