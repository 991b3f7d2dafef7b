//! Errors raised by ledger storage.
//!
//! Backends translate their own failures into [`StorageError`]; the engine
//! surfaces every variant as a storage failure of the invocation.
//!
//! | Variant | Raised when |
//! |---------|-------------|
//! | [`NotFound`](StorageError::NotFound) | a key that must exist is absent |
//! | [`Conflict`](StorageError::Conflict) | a commit's read-set was overwritten by a later commit |
//! | [`Serialization`](StorageError::Serialization) | stored or key bytes do not decode |
//! | [`Internal`](StorageError::Internal) | the backend itself failed |
//!
//! ```
//! use beatchain_storage::{StorageError, StorageResult};
//!
//! fn counter(raw: &str) -> StorageResult<u64> {
//!     raw.parse().map_err(|e| StorageError::serialization_with_source("bad counter", e))
//! }
//!
//! assert!(counter("12").is_ok());
//! assert!(counter("twelve").is_err());
//! ```

use std::sync::Arc;

use thiserror::Error;

/// Shared, cloneable source error.
pub type BoxError = Arc<dyn std::error::Error + Send + Sync>;

/// Result of a storage call.
pub type StorageResult<T> = Result<T, StorageError>;

/// A storage failure.
///
/// Sources are kept behind [`BoxError`] so the value stays `Clone` and the
/// cause is still reachable through [`std::error::Error::source`].
#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum StorageError {
    /// No value is stored under `key`.
    #[error("Key not found: {key}")]
    NotFound {
        /// Printable form of the missing key.
        key: String,
    },

    /// Optimistic concurrency failure.
    ///
    /// Another transaction committed to a key, or inside a range, that this
    /// transaction read. Storage never retries; the invoking client may
    /// resubmit.
    #[error("Transaction conflict")]
    Conflict,

    /// Bytes that do not decode, such as a malformed composite key or a
    /// non-numeric id counter.
    #[error("Serialization error: {message}")]
    Serialization {
        /// What failed to decode.
        message: String,
        /// Decoder error, when there is one.
        #[source]
        source: Option<BoxError>,
    },

    /// Backend failure unrelated to the data.
    #[error("Internal error: {message}")]
    Internal {
        /// What went wrong.
        message: String,
        /// Backend error, when there is one.
        #[source]
        source: Option<BoxError>,
    },
}

impl StorageError {
    /// [`NotFound`](Self::NotFound) for `key`.
    #[must_use]
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    /// [`Conflict`](Self::Conflict).
    #[must_use]
    pub fn conflict() -> Self {
        Self::Conflict
    }

    /// [`Serialization`](Self::Serialization) without a source.
    #[must_use]
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization { message: message.into(), source: None }
    }

    /// [`Serialization`](Self::Serialization) wrapping a decoder error.
    #[must_use]
    pub fn serialization_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Serialization { message: message.into(), source: Some(Arc::new(source)) }
    }

    /// [`Internal`](Self::Internal) without a source.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal { message: message.into(), source: None }
    }

    /// [`Internal`](Self::Internal) wrapping a backend error.
    #[must_use]
    pub fn internal_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Internal { message: message.into(), source: Some(Arc::new(source)) }
    }

    /// Whether resubmitting the same invocation could succeed.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use std::error::Error;

    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(StorageError::not_found("k").to_string(), "Key not found: k");
        assert_eq!(StorageError::conflict().to_string(), "Transaction conflict");
        assert_eq!(
            StorageError::serialization("bad counter").to_string(),
            "Serialization error: bad counter"
        );
        assert_eq!(StorageError::internal("boom").to_string(), "Internal error: boom");
    }

    #[test]
    fn test_source_chain_preserved() {
        let parse_err = "abc".parse::<u64>().expect_err("not a number");
        let err = StorageError::serialization_with_source("counter is not numeric", parse_err);

        let source = err.source().expect("source must be preserved");
        assert_eq!(source.to_string(), "invalid digit found in string");
        assert!(err.clone().source().is_some());
    }

    #[test]
    fn test_only_conflicts_are_retryable() {
        assert!(StorageError::conflict().is_conflict());
        assert!(!StorageError::internal("x").is_conflict());
        assert!(!StorageError::serialization("x").is_conflict());
        assert!(StorageError::internal("x").source().is_none());
    }
}
