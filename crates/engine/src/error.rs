//! Engine error types.
//!
//! Every failure an invocation can produce is an [`EngineError`]. Handlers
//! never retry; the invocation's transaction is dropped uncommitted and the
//! error is returned to the caller as the invocation result.
//!
//! # Error Types
//!
//! - [`EngineError::AccessDenied`] - no accepted role predicate holds for the caller
//! - [`EngineError::Authentication`] - credentials missing, malformed or lacking a claim
//! - [`EngineError::Validation`] - wrong argument count, unparsable or out-of-bounds value
//! - [`EngineError::NotFound`] - a referenced record is absent
//! - [`EngineError::InvariantViolation`] - negative balance, re-finalized contract, duplicate
//! - [`EngineError::InvalidStreamRequest`] - any failed `RequestSong` check
//! - [`EngineError::InvalidFunction`] - unknown operation name
//! - [`EngineError::Storage`] - read, write or commit failure from the store

use beatchain_authn::AuthError;
use beatchain_storage::StorageError;
use thiserror::Error;

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors returned by engine invocations.
#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum EngineError {
    /// The caller holds none of the roles the operation accepts, or does not
    /// own the record it is acting on.
    #[error("Access denied: {0}")]
    AccessDenied(String),

    /// The caller could not be authenticated.
    #[error("Authentication failed: {0}")]
    Authentication(AuthError),

    /// An argument is missing, unparsable or out of bounds.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A referenced record does not exist.
    #[error("{kind} with id '{id}' not found")]
    NotFound {
        /// Record kind, e.g. `BankAccount`.
        kind: &'static str,
        /// Identifier that resolved to nothing.
        id: String,
    },

    /// The operation would break a ledger invariant.
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// A streaming request failed one of its checks. Which check is not
    /// disclosed.
    #[error("Invalid combination of parameters or subscription no longer active/valid")]
    InvalidStreamRequest,

    /// No operation has this name.
    #[error("invalid function name: '{0}'")]
    InvalidFunction(String),

    /// The underlying store failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Coarse error category, for callers that only need to branch on the class
/// of failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Authorization failed.
    AccessDenied,
    /// Authentication failed.
    Authentication,
    /// Input rejected.
    Validation,
    /// Referenced record absent.
    NotFound,
    /// Ledger invariant would be broken.
    InvariantViolation,
    /// Store failure.
    Storage,
}

impl EngineError {
    /// Creates a [`Validation`](Self::Validation) error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Creates an [`InvariantViolation`](Self::InvariantViolation) error.
    #[must_use]
    pub fn invariant(message: impl Into<String>) -> Self {
        Self::InvariantViolation(message.into())
    }

    /// Creates a [`NotFound`](Self::NotFound) error.
    #[must_use]
    pub fn not_found(kind: &'static str, id: impl ToString) -> Self {
        Self::NotFound { kind, id: id.to_string() }
    }

    /// Returns the coarse category of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::AccessDenied(_) => ErrorKind::AccessDenied,
            Self::Authentication(_) => ErrorKind::Authentication,
            Self::Validation(_) | Self::InvalidStreamRequest | Self::InvalidFunction(_) => {
                ErrorKind::Validation
            },
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::InvariantViolation(_) => ErrorKind::InvariantViolation,
            Self::Storage(_) => ErrorKind::Storage,
        }
    }

    /// Returns `true` when the invocation lost an optimistic-concurrency race
    /// and may be resubmitted unchanged.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Storage(e) if e.is_conflict())
    }
}

impl From<AuthError> for EngineError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::AccessDenied { required, org } => {
                Self::AccessDenied(format!("requires {required}, caller organization is '{org}'"))
            },
            other => Self::Authentication(other),
        }
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        Self::Storage(StorageError::serialization_with_source("record encoding failed", err))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_access_denied_maps_to_access_denied() {
        let err: EngineError =
            AuthError::AccessDenied { required: "Admin".into(), org: "CreatorMSP".into() }.into();
        assert_eq!(err.kind(), ErrorKind::AccessDenied);
        assert_eq!(
            err.to_string(),
            "Access denied: requires Admin, caller organization is 'CreatorMSP'"
        );
    }

    #[test]
    fn test_other_auth_errors_map_to_authentication() {
        let err: EngineError = AuthError::missing_claim("id").into();
        assert!(matches!(err, EngineError::Authentication(AuthError::MissingClaim(_))));
        assert_eq!(err.kind(), ErrorKind::Authentication);
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            EngineError::not_found("Product", 4444).to_string(),
            "Product with id '4444' not found"
        );
        assert_eq!(
            EngineError::InvalidFunction("Frobnicate".into()).to_string(),
            "invalid function name: 'Frobnicate'"
        );
        assert_eq!(
            EngineError::invariant("contract already finalized").to_string(),
            "Invariant violation: contract already finalized"
        );
    }

    #[test]
    fn test_kind_groups_input_errors_as_validation() {
        assert_eq!(EngineError::InvalidStreamRequest.kind(), ErrorKind::Validation);
        assert_eq!(EngineError::InvalidFunction(String::new()).kind(), ErrorKind::Validation);
        assert_eq!(EngineError::validation("bad").kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_is_conflict() {
        assert!(EngineError::from(StorageError::conflict()).is_conflict());
        assert!(!EngineError::from(StorageError::internal("boom")).is_conflict());
        assert!(!EngineError::validation("bad").is_conflict());
    }

    #[test]
    fn test_json_errors_become_serialization_errors() {
        let json_err = serde_json::from_slice::<u64>(b"not json").expect_err("invalid");
        let err = EngineError::from(json_err);
        assert!(matches!(err, EngineError::Storage(StorageError::Serialization { .. })));
        assert_eq!(err.kind(), ErrorKind::Storage);
    }
}
