//! Role registrations and credential validation.
//!
//! Each role is registered as an `(organization, issuer common name)` pair.
//! An identity holds a role only when both halves match exactly; there is no
//! partial match and no hierarchy between roles.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    context::CallerContext,
    error::{AuthError, Result},
    identity::{CallerIdentity, ID_ATTRIBUTE},
};

/// The four actor roles of the marketplace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Platform administrator.
    Admin,
    /// Application developer reselling subscriptions.
    AppDev,
    /// Content creator owning products.
    Creator,
    /// Subscriber streaming products.
    Customer,
}

/// Registered `(role, organization, issuer common name)` triples.
pub const REGISTERED_ROLES: &[(Role, &str, &str)] = &[
    (Role::Admin, "BeatchainMSP", "ca.admin.beatchain.com"),
    (Role::AppDev, "AppDevMSP", "ca.appdevorg.beatchain.com"),
    (Role::Creator, "CreatorMSP", "ca.creatororg.beatchain.com"),
    (Role::Customer, "CustomerMSP", "ca.customerorg.beatchain.com"),
];

impl Role {
    /// All roles, in registration order.
    pub const ALL: [Role; 4] = [Role::Admin, Role::AppDev, Role::Creator, Role::Customer];

    /// Returns the registered `(organization, issuer)` pair.
    pub fn registration(self) -> (&'static str, &'static str) {
        REGISTERED_ROLES
            .iter()
            .find(|(role, _, _)| *role == self)
            .map(|(_, org, issuer)| (*org, *issuer))
            .unwrap_or_default()
    }

    /// Returns `true` iff both the organization and the issuer match this
    /// role's registration.
    pub fn matches(self, org: &str, cert_issuer: &str) -> bool {
        let (registered_org, registered_issuer) = self.registration();
        org == registered_org && cert_issuer == registered_issuer
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Role::Admin => "Admin",
            Role::AppDev => "AppDev",
            Role::Creator => "Creator",
            Role::Customer => "Customer",
        })
    }
}

/// Validates host credential material and derives the caller context.
///
/// # Errors
///
/// Returns [`AuthError::MalformedCredential`] if:
/// - the organization is empty
/// - the certificate issuer is empty
/// - the `id` attribute is present but is not an unsigned integer
///
/// # Examples
///
/// ```
/// use beatchain_authn::{CallerIdentity, validation::validate_identity};
///
/// let identity = CallerIdentity::new("AppDevMSP", "ca.appdevorg.beatchain.com")
///     .with_attribute("id", "100000001");
/// let ctx = validate_identity(&identity).unwrap();
/// assert!(ctx.is_app_dev());
/// assert_eq!(ctx.numeric_id(), Some(100000001));
///
/// let blank = CallerIdentity::new("", "ca.appdevorg.beatchain.com");
/// assert!(validate_identity(&blank).is_err());
/// ```
pub fn validate_identity(identity: &CallerIdentity) -> Result<CallerContext> {
    if identity.msp_id.trim().is_empty() {
        return Err(AuthError::malformed("empty organization"));
    }
    if identity.cert_issuer.trim().is_empty() {
        return Err(AuthError::malformed("empty certificate issuer"));
    }

    let numeric_id = identity
        .attribute(ID_ATTRIBUTE)
        .map(|raw| {
            raw.parse::<u64>().map_err(|_| {
                AuthError::malformed(format!("'{ID_ATTRIBUTE}' attribute '{raw}' is not numeric"))
            })
        })
        .transpose()?;

    Ok(CallerContext::new(identity.msp_id.clone(), identity.cert_issuer.clone(), numeric_id))
}
