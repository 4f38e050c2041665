//! Error types for the Sagitta library.
//!
//! All fallible operations return [`Result`], and every failure is one of
//! the variants of [`SagittaError`]. Local validation errors
//! ([`SagittaError::UnknownField`], [`SagittaError::InvalidPredicate`],
//! [`SagittaError::InvalidRequest`]) are raised before anything is sent to
//! the engine; [`SagittaError::StoreUnavailable`] and
//! [`SagittaError::DecodeError`] surface remote failures without retrying.

use thiserror::Error;

/// The main error type for Sagitta operations.
#[derive(Error, Debug)]
pub enum SagittaError {
    /// A predicate or aggregation referenced a field that is not declared
    /// in the index mapping.
    #[error("Unknown field: {0}")]
    UnknownField(String),

    /// A predicate was structurally malformed (empty value list, unbounded
    /// range, boolean query without clauses, and so on).
    #[error("Invalid predicate: {0}")]
    InvalidPredicate(String),

    /// A search request was structurally malformed (zero page size,
    /// duplicate aggregation names, and so on).
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// An identifier lookup missed. Expected, not exceptional.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The transport or the remote engine failed. Surfaced to the caller,
    /// never retried by the core.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// A remote response did not match the expected entity or aggregation
    /// shape. Indicates a caller/engine mismatch.
    #[error("Decode error: {0}")]
    DecodeError(String),

    /// JSON serialization/deserialization errors.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for operations that may fail with [`SagittaError`].
pub type Result<T> = std::result::Result<T, SagittaError>;

impl SagittaError {
    /// Create a new unknown-field error.
    pub fn unknown_field<S: Into<String>>(name: S) -> Self {
        SagittaError::UnknownField(name.into())
    }

    /// Create a new invalid-predicate error.
    pub fn invalid_predicate<S: Into<String>>(msg: S) -> Self {
        SagittaError::InvalidPredicate(msg.into())
    }

    /// Create a new invalid-request error.
    pub fn invalid_request<S: Into<String>>(msg: S) -> Self {
        SagittaError::InvalidRequest(msg.into())
    }

    /// Create a new not-found error.
    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        SagittaError::NotFound(msg.into())
    }

    /// Create a new store-unavailable error.
    pub fn store_unavailable<S: Into<String>>(msg: S) -> Self {
        SagittaError::StoreUnavailable(msg.into())
    }

    /// Create a new decode error.
    pub fn decode<S: Into<String>>(msg: S) -> Self {
        SagittaError::DecodeError(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_construction() {
        let error = SagittaError::unknown_field("colour");
        assert_eq!(error.to_string(), "Unknown field: colour");

        let error = SagittaError::invalid_predicate("terms requires at least one value");
        assert_eq!(
            error.to_string(),
            "Invalid predicate: terms requires at least one value"
        );

        let error = SagittaError::store_unavailable("connection refused");
        assert_eq!(error.to_string(), "Store unavailable: connection refused");
    }

    #[test]
    fn test_json_error_conversion() {
        let json_error = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let error = SagittaError::from(json_error);

        match error {
            SagittaError::Json(_) => {}
            _ => panic!("Expected JSON error variant"),
        }
    }
}
