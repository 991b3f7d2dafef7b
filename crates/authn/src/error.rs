//! Authentication error types.
//!
//! This module defines errors that can occur while deriving a caller's
//! identity from host credentials and while checking role predicates.

use thiserror::Error;

/// Authentication and authorization errors.
///
/// Every variant is fatal for the invocation: the engine aborts before any
/// ledger read.
///
/// Marked `#[non_exhaustive]`; matches need a wildcard arm.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum AuthError {
    /// The host runtime supplied no caller identity.
    #[error("Missing caller credential")]
    MissingCredential,

    /// Credential material is present but unusable.
    #[error("Malformed credential: {0}")]
    MalformedCredential(String),

    /// A claim the operation depends on is absent.
    #[error("Missing claim: {0}")]
    MissingClaim(String),

    /// The caller matches none of the roles the operation accepts.
    #[error("Access denied: requires {required}, caller organization is '{org}'")]
    AccessDenied {
        /// Human-readable list of accepted roles.
        required: String,
        /// Organization of the rejected caller.
        org: String,
    },
}

impl AuthError {
    /// Creates a [`MalformedCredential`](Self::MalformedCredential) error.
    #[must_use]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedCredential(message.into())
    }

    /// Creates a [`MissingClaim`](Self::MissingClaim) error.
    #[must_use]
    pub fn missing_claim(claim: impl Into<String>) -> Self {
        Self::MissingClaim(claim.into())
    }

    /// Returns `true` for the authorization failure, as opposed to an
    /// authentication failure.
    #[must_use]
    pub fn is_access_denied(&self) -> bool {
        matches!(self, Self::AccessDenied { .. })
    }
}

/// Result type alias for authentication operations.
pub type Result<T> = std::result::Result<T, AuthError>;
