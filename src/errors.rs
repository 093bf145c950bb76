//! Error types for hospital record operations.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Body written when the key-value store cannot be reached.
pub const STORE_UNAVAILABLE_MESSAGE: &str = "Redis connection refused";

/// Body written when a record did not land intact.
pub const INTEGRITY_MESSAGE: &str = "Something went terribly wrong";

/// Errors that can occur during key-value store operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The store could not be reached (refused, dropped, timed out).
    Unavailable(String),
    /// A hash record read back with a different field count than was written.
    Integrity {
        /// Key of the record that failed verification.
        key: String,
        /// Number of fields the schema requires.
        expected: usize,
        /// Number of fields the store reported.
        actual: usize,
    },
    /// The store replied with something unexpected.
    Internal(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable(msg) => write!(f, "Store unavailable: {}", msg),
            Self::Integrity {
                key,
                expected,
                actual,
            } => write!(
                f,
                "Integrity check failed for {}: expected {} fields, found {}",
                key, expected, actual
            ),
            Self::Internal(msg) => write!(f, "Internal store error: {}", msg),
        }
    }
}

impl From<redis::RedisError> for StoreError {
    fn from(e: redis::RedisError) -> Self {
        if e.is_io_error()
            || e.is_connection_refusal()
            || e.is_connection_dropped()
            || e.is_timeout()
        {
            StoreError::Unavailable(e.to_string())
        } else {
            StoreError::Internal(e.to_string())
        }
    }
}

impl std::error::Error for StoreError {}

/// Errors surfaced by the HTTP handlers.
///
/// Every variant maps to a fixed status code and plain-text body; existing
/// clients match on these bodies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Missing or malformed form input.
    Validation(&'static str),
    /// A referenced record does not exist.
    Reference(&'static str),
    /// The key-value store is unreachable.
    Unavailable,
    /// A written record failed verification.
    Integrity,
    /// The store replied with something unexpected.
    Internal,
}

impl ApiError {
    /// Status code and body for this error.
    pub fn parts(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Validation(msg) | Self::Reference(msg) => (StatusCode::BAD_REQUEST, msg),
            // Kept at 400 for compatibility with existing clients.
            Self::Unavailable => (StatusCode::BAD_REQUEST, STORE_UNAVAILABLE_MESSAGE),
            Self::Integrity => (StatusCode::INTERNAL_SERVER_ERROR, INTEGRITY_MESSAGE),
            Self::Internal => (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error"),
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (status, msg) = self.parts();
        write!(f, "{}: {}", status.as_u16(), msg)
    }
}

impl std::error::Error for ApiError {}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Unavailable(msg) => {
                tracing::warn!(error = %msg, "key-value store unavailable");
                ApiError::Unavailable
            }
            StoreError::Integrity {
                key,
                expected,
                actual,
            } => {
                tracing::error!(%key, expected, actual, "record failed write verification");
                ApiError::Integrity
            }
            StoreError::Internal(msg) => {
                tracing::error!(error = %msg, "unexpected store reply");
                ApiError::Internal
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.parts().into_response()
    }
}
