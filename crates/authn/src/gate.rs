//! The identity gate: turns host credentials into a [`CallerContext`].

use serde::{Deserialize, Serialize};

use crate::{
    context::CallerContext,
    error::{AuthError, Result},
    identity::CallerIdentity,
    validation::validate_identity,
};

/// Where the gate takes the caller's identity from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityMode {
    /// Use the credentials supplied by the host runtime.
    #[default]
    Host,
    /// Ignore host credentials and authenticate every invocation as this
    /// fixed identity. Role checks still apply.
    Synthetic(CallerIdentity),
}

/// Derives the caller context for each invocation.
#[derive(Debug, Clone, Default)]
pub struct IdentityGate {
    mode: IdentityMode,
}

impl IdentityGate {
    /// Creates a gate in the given mode.
    pub fn new(mode: IdentityMode) -> Self {
        Self { mode }
    }

    /// Returns the configured mode.
    pub fn mode(&self) -> &IdentityMode {
        &self.mode
    }

    /// Authenticates one invocation.
    ///
    /// In [`IdentityMode::Host`] the host identity is required and validated.
    /// In [`IdentityMode::Synthetic`] the configured identity is validated
    /// instead and `host` is ignored.
    ///
    /// # Errors
    ///
    /// - [`AuthError::MissingCredential`] if host mode receives no identity
    /// - [`AuthError::MalformedCredential`] if the identity fails validation
    #[tracing::instrument(skip_all)]
    pub fn authenticate(&self, host: Option<&CallerIdentity>) -> Result<CallerContext> {
        let identity = match &self.mode {
            IdentityMode::Host => host.ok_or(AuthError::MissingCredential)?,
            IdentityMode::Synthetic(fixed) => fixed,
        };

        let ctx = validate_identity(identity).inspect_err(|e| {
            tracing::warn!(error = %e, "caller credential rejected");
        })?;
        tracing::debug!(org = ctx.org(), id = ?ctx.numeric_id(), "caller authenticated");
        Ok(ctx)
    }
}
