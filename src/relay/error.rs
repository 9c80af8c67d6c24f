//! Relay error taxonomy.

use axum::http::StatusCode;
use thiserror::Error;

use crate::relay::Category;

/// Request-scoped outcomes of a relay operation. None of these are retried.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RelayError {
    /// Channel id is not registered.
    #[error("channel '{0}' not found")]
    ChannelNotFound(String),

    /// No entry for the pattern in the category's directory.
    #[error("{category} prefix '{pattern}' not found")]
    PrefixNotFound { category: Category, pattern: String },

    /// No bound route accepts the concrete path.
    #[error("no route matches '{0}'")]
    NoRoute(String),

    /// Supplied key does not equal the channel key.
    #[error("channel key mismatch")]
    Forbidden,

    /// Stored bytes do not decode as their content type claims.
    #[error("stored body at '{path}' is not valid {content_type}: {reason}")]
    MalformedBody {
        path: String,
        content_type: String,
        reason: String,
    },

    /// Listing could not be serialized.
    #[error("failed to encode listing: {0}")]
    Encode(String),
}

impl RelayError {
    /// Status code the HTTP layer reports for this outcome.
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::ChannelNotFound(_)
            | RelayError::PrefixNotFound { .. }
            | RelayError::NoRoute(_) => StatusCode::NOT_FOUND,
            RelayError::Forbidden => StatusCode::FORBIDDEN,
            RelayError::MalformedBody { .. } | RelayError::Encode(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Result alias for relay operations.
pub type RelayResult<T> = Result<T, RelayError>;
