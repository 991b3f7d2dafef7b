//! Per-invocation state threaded through every handler.

use beatchain_authn::CallerContext;
use chrono::{DateTime, TimeDelta, Utc};

use crate::{
    accessor::LedgerAccessor,
    config::EngineConfig,
    error::{EngineError, Result},
    id_generator::IdGenerator,
};

/// Everything one invocation needs: who is calling, when, the ledger view
/// and the invocation-scoped id generator.
///
/// A context lives exactly as long as one invocation. Nothing in it is
/// shared between invocations.
#[derive(Debug)]
pub struct InvocationContext<'a> {
    /// Authenticated caller.
    pub caller: CallerContext,
    /// Host-supplied invocation timestamp; the handlers' notion of "now".
    pub now: DateTime<Utc>,
    /// Engine configuration.
    pub config: &'a EngineConfig,
    /// Typed view over the invocation's transaction.
    pub ledger: LedgerAccessor,
    ids: IdGenerator,
}

impl<'a> InvocationContext<'a> {
    /// Creates a context over an open ledger view.
    pub fn new(
        caller: CallerContext,
        now: DateTime<Utc>,
        config: &'a EngineConfig,
        ledger: LedgerAccessor,
    ) -> Self {
        let ids = IdGenerator::new(config.unique_id_start());
        Self { caller, now, config, ledger, ids }
    }

    /// Issues the next ledger-wide unique id.
    ///
    /// # Errors
    ///
    /// See [`IdGenerator::next_id`].
    pub async fn next_id(&mut self) -> Result<u64> {
        self.ids.next_id(&mut self.ledger).await
    }

    /// Subscription period as a date offset.
    pub fn subscription_period(&self) -> Result<TimeDelta> {
        TimeDelta::from_std(self.config.subscription_period())
            .map_err(|_| EngineError::invariant("subscription period out of range"))
    }

    /// Consumes the context and commits the ledger view.
    ///
    /// # Errors
    ///
    /// See [`LedgerAccessor::commit`].
    pub async fn commit(self) -> Result<()> {
        self.ledger.commit().await
    }
}
