//! # Beatchain Authentication
//!
//! Caller identity and role-based access control for the settlement engine.
//!
//! This crate provides:
//! - **Caller identity**: the organization, issuer and attribute claims a host runtime delivers
//! - **Role registrations**: the `(organization, issuer)` pair for each of the four roles
//! - **Identity gate**: validation of credentials into a [`CallerContext`], with a synthetic mode
//!   for tests
//!
//! ## Example
//!
//! ```
//! use beatchain_authn::{CallerIdentity, IdentityGate, Role};
//!
//! let gate = IdentityGate::default();
//! let identity = CallerIdentity::new("CreatorMSP", "ca.creatororg.beatchain.com")
//!     .with_attribute("id", "100000003");
//!
//! let caller = gate.authenticate(Some(&identity)).unwrap();
//! assert_eq!(caller.require(&[Role::Creator]).unwrap(), Role::Creator);
//! assert!(caller.require(&[Role::Admin]).is_err());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

/// Caller context and role predicates.
pub mod context;
/// Authentication error types.
pub mod error;
/// Identity gate.
pub mod gate;
/// Raw caller identity.
pub mod identity;
#[cfg(any(test, feature = "testutil"))]
pub mod testutil;
/// Role registrations and credential validation.
pub mod validation;

pub use context::CallerContext;
pub use error::{AuthError, Result};
pub use gate::{IdentityGate, IdentityMode};
pub use identity::{CallerIdentity, ID_ATTRIBUTE};
pub use validation::{REGISTERED_ROLES, Role, validate_identity};
