//! Shared test utilities for identity testing.
//!
//! Feature-gated behind `testutil`. Provides registered identities for each
//! role and a few deliberately broken ones.
//!
//! ```no_run
//! // Requires the `testutil` feature to be enabled.
//! use beatchain_authn::testutil::identity_for;
//! use beatchain_authn::Role;
//!
//! let creator = identity_for(Role::Creator, Some(100000003));
//! ```

use crate::{
    identity::{CallerIdentity, ID_ATTRIBUTE},
    validation::Role,
};

/// Registered identity for `role`, with an `id` attribute when `id` is set.
pub fn identity_for(role: Role, id: Option<u64>) -> CallerIdentity {
    let (org, issuer) = role.registration();
    let identity = CallerIdentity::new(org, issuer);
    match id {
        Some(id) => identity.with_attribute(ID_ATTRIBUTE, id.to_string()),
        None => identity,
    }
}

/// Platform administrator identity (no `id` attribute).
pub fn admin() -> CallerIdentity {
    identity_for(Role::Admin, None)
}

/// App-developer identity with the given record id.
pub fn app_dev(id: u64) -> CallerIdentity {
    identity_for(Role::AppDev, Some(id))
}

/// Creator identity with the given record id.
pub fn creator(id: u64) -> CallerIdentity {
    identity_for(Role::Creator, Some(id))
}

/// Customer identity with the given record id.
pub fn customer(id: u64) -> CallerIdentity {
    identity_for(Role::Customer, Some(id))
}

/// Identity whose organization belongs to `org_of` but whose issuer belongs
/// to `issuer_of`. Matches no role when the two differ.
pub fn cross_paired(org_of: Role, issuer_of: Role) -> CallerIdentity {
    let (org, _) = org_of.registration();
    let (_, issuer) = issuer_of.registration();
    CallerIdentity::new(org, issuer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::validate_identity;

    #[test]
    fn test_fixture_identities_validate() {
        for identity in [admin(), app_dev(1), creator(2), customer(3)] {
            assert!(validate_identity(&identity).is_ok());
        }
    }

    #[test]
    fn test_cross_paired_matches_no_role() {
        let identity = cross_paired(Role::Creator, Role::Admin);
        assert!(Role::ALL.iter().all(|r| !r.matches(&identity.msp_id, &identity.cert_issuer)));
    }
}
