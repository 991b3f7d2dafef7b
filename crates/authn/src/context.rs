//! Authenticated caller context and role predicates.

use crate::{
    error::{AuthError, Result},
    identity::ID_ATTRIBUTE,
    validation::Role,
};

/// The caller of one invocation, derived from validated credentials.
///
/// The four role predicates are evaluated independently; none is an `else`
/// branch of another, so a caller can never pass a check by failing a
/// different one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerContext {
    org: String,
    cert_issuer: String,
    numeric_id: Option<u64>,
    is_admin: bool,
}

impl CallerContext {
    /// Creates a context from already-validated credential fields.
    pub fn new(
        org: impl Into<String>,
        cert_issuer: impl Into<String>,
        numeric_id: Option<u64>,
    ) -> Self {
        let org = org.into();
        let cert_issuer = cert_issuer.into();
        let is_admin = Role::Admin.matches(&org, &cert_issuer);
        Self { org, cert_issuer, numeric_id, is_admin }
    }

    /// Organization (MSP id) of the caller.
    pub fn org(&self) -> &str {
        &self.org
    }

    /// Certificate issuer common name.
    pub fn cert_issuer(&self) -> &str {
        &self.cert_issuer
    }

    /// Numeric record id from the `id` attribute, if the caller has one.
    pub fn numeric_id(&self) -> Option<u64> {
        self.numeric_id
    }

    /// Platform administrator predicate.
    pub fn is_admin(&self) -> bool {
        self.is_admin
    }

    /// Application developer predicate.
    pub fn is_app_dev(&self) -> bool {
        Role::AppDev.matches(&self.org, &self.cert_issuer)
    }

    /// Content creator predicate.
    pub fn is_creator(&self) -> bool {
        Role::Creator.matches(&self.org, &self.cert_issuer)
    }

    /// Subscriber predicate.
    pub fn is_customer(&self) -> bool {
        Role::Customer.matches(&self.org, &self.cert_issuer)
    }

    /// Evaluates the predicate for `role`.
    pub fn has_role(&self, role: Role) -> bool {
        match role {
            Role::Admin => self.is_admin(),
            Role::AppDev => self.is_app_dev(),
            Role::Creator => self.is_creator(),
            Role::Customer => self.is_customer(),
        }
    }

    /// Denies unless at least one of `roles` holds. Returns the first
    /// matching role in the order given.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::AccessDenied`] naming the accepted roles.
    pub fn require(&self, roles: &[Role]) -> Result<Role> {
        roles.iter().copied().find(|role| self.has_role(*role)).ok_or_else(|| {
            AuthError::AccessDenied {
                required: roles.iter().map(ToString::to_string).collect::<Vec<_>>().join(" or "),
                org: self.org.clone(),
            }
        })
    }

    /// Returns the caller's numeric id.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MissingClaim`] when the credential carried no
    /// `id` attribute.
    pub fn require_id(&self) -> Result<u64> {
        self.numeric_id.ok_or_else(|| AuthError::missing_claim(ID_ATTRIBUTE))
    }
}
