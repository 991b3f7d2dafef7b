//! The engine front door: bootstrap and invocation dispatch.

use beatchain_authn::{CallerIdentity, IdentityGate};
use beatchain_storage::StorageBackend;
use bytes::Bytes;
use chrono::{DateTime, Utc};

use crate::{
    accessor::LedgerAccessor,
    bootstrap::LedgerFixture,
    config::{ConfigError, EngineConfig},
    context::InvocationContext,
    error::Result,
    handlers,
    operation::Operation,
};

/// One request from the host runtime.
///
/// # Example
///
/// ```
/// use beatchain_authn::CallerIdentity;
/// use beatchain_engine::Invocation;
/// use chrono::Utc;
///
/// let admin = CallerIdentity::new("BeatchainMSP", "ca.admin.beatchain.com");
/// let invocation = Invocation::new("TransferFunds", Utc::now())
///     .with_identity(admin)
///     .with_args(["1", "250.00"]);
/// assert_eq!(invocation.args.len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Credentials delivered by the host, if any.
    pub identity: Option<CallerIdentity>,
    /// Transaction function name.
    pub function: String,
    /// Positional string arguments.
    pub args: Vec<String>,
    /// Host-supplied invocation time.
    pub timestamp: DateTime<Utc>,
}

impl Invocation {
    /// Creates an invocation with no identity and no arguments.
    pub fn new(function: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self { identity: None, function: function.into(), args: Vec::new(), timestamp }
    }

    /// Attaches host credentials.
    #[must_use]
    pub fn with_identity(mut self, identity: CallerIdentity) -> Self {
        self.identity = Some(identity);
        self
    }

    /// Replaces the positional arguments.
    #[must_use]
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }
}

/// Settlement engine over a storage backend.
///
/// Each [`invoke`](Self::invoke) runs in its own transaction: the handler's
/// writes are committed together when it succeeds and discarded when it
/// fails. Concurrent invocations touching the same records are serialized by
/// the backend's optimistic concurrency control; the loser sees
/// [`StorageError::Conflict`](beatchain_storage::StorageError::Conflict).
#[derive(Debug)]
pub struct Engine<B> {
    backend: B,
    config: EngineConfig,
    gate: IdentityGate,
}

impl<B: StorageBackend> Engine<B> {
    /// Creates an engine.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `config` fails validation.
    pub fn new(backend: B, config: EngineConfig) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        let gate = IdentityGate::new(config.identity_mode().clone());
        Ok(Self { backend, config, gate })
    }

    /// The underlying storage backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// The engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Seeds the ledger from positional bootstrap arguments.
    ///
    /// An empty argument list leaves the ledger untouched. See
    /// [`bootstrap`](crate::bootstrap) for the accepted layouts.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a malformed argument list, or a storage
    /// error if the seed transaction fails. Nothing is written on error.
    #[tracing::instrument(skip_all, fields(args = args.len()))]
    pub async fn initialize<S: AsRef<str>>(&self, args: &[S]) -> Result<()> {
        if args.is_empty() {
            tracing::info!("empty bootstrap, ledger left untouched");
            return Ok(());
        }

        let fixture = LedgerFixture::parse(self.config.admin_bank_account_id(), args)?;
        let mut ledger = LedgerAccessor::new(self.backend.transaction().await?);
        fixture.write(&mut ledger)?;
        ledger.commit().await?;

        tracing::info!(catalog = fixture.catalog.is_some(), "ledger bootstrapped");
        Ok(())
    }

    /// Executes one transaction function.
    ///
    /// The function name is resolved first, then the caller is authenticated
    /// and checked against the operation's roles. Only then is a transaction
    /// opened and the handler run.
    ///
    /// # Errors
    ///
    /// Any [`EngineError`](crate::EngineError); the ledger is unchanged
    /// whenever an error is returned.
    #[tracing::instrument(
        skip_all,
        fields(function = %invocation.function, org = tracing::field::Empty)
    )]
    pub async fn invoke(&self, invocation: &Invocation) -> Result<Bytes> {
        let op: Operation = invocation.function.parse()?;
        let caller = self.gate.authenticate(invocation.identity.as_ref())?;
        tracing::Span::current().record("org", caller.org());

        let role = caller.require(op.allowed_roles()).inspect_err(|e| {
            tracing::warn!(operation = %op, error = %e, "caller not permitted");
        })?;
        tracing::debug!(operation = %op, role = %role, "caller permitted");

        let ledger = LedgerAccessor::new(self.backend.transaction().await?);
        let mut ctx = InvocationContext::new(caller, invocation.timestamp, &self.config, ledger);

        let payload = handlers::dispatch(op, &mut ctx, &invocation.args).await.inspect_err(|e| {
            tracing::debug!(operation = %op, error = %e, "invocation failed");
        })?;
        ctx.commit().await?;

        Ok(Bytes::from(payload))
    }
}
