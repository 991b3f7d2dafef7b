//! Ledger-wide unique identifier generator.
//!
//! The last issued id lives on the ledger under the `UniqueId` key as a
//! decimal string. Within one invocation the counter is read once; later
//! calls continue from the in-memory value, since the ledger still holds the
//! pre-invocation value until commit. Concurrent invocations both read the
//! counter key, so only the first to commit wins and the other fails with a
//! conflict.

use beatchain_storage::{CompositeKey, StorageError};

use crate::{
    accessor::LedgerAccessor,
    error::{EngineError, Result},
};

/// Record kind of the counter key.
pub const UNIQUE_ID_KIND: &str = "UniqueId";

/// Issues strictly increasing ids for one invocation.
#[derive(Debug, Clone)]
pub struct IdGenerator {
    start: u64,
    last_issued: Option<u64>,
}

impl IdGenerator {
    /// Creates a generator. `start` is the counter value assumed when the
    /// ledger holds none, so the first id ever issued is `start + 1`.
    pub fn new(start: u64) -> Self {
        Self { start, last_issued: None }
    }

    /// The last id issued in this invocation, if any.
    pub fn last_issued(&self) -> Option<u64> {
        self.last_issued
    }

    /// Key of the on-ledger counter.
    pub fn counter_key() -> CompositeKey {
        CompositeKey::new(UNIQUE_ID_KIND)
    }

    /// Issues the next id and buffers the counter update.
    ///
    /// # Errors
    ///
    /// - [`EngineError::Storage`] with a serialization error if the counter is
    ///   not a decimal integer
    /// - [`EngineError::InvariantViolation`] if the id space is exhausted
    pub async fn next_id(&mut self, ledger: &mut LedgerAccessor) -> Result<u64> {
        let key = Self::counter_key();
        let current = match self.last_issued {
            Some(last) => last,
            None => match ledger.get_raw(&key).await? {
                Some(raw) => parse_counter(&raw)?,
                None => self.start,
            },
        };

        let next = current
            .checked_add(1)
            .ok_or_else(|| EngineError::invariant("unique id space exhausted"))?;
        ledger.set_raw(&key, next.to_string().into_bytes());
        self.last_issued = Some(next);
        Ok(next)
    }
}

fn parse_counter(raw: &[u8]) -> Result<u64> {
    let text = std::str::from_utf8(raw).map_err(|e| {
        StorageError::serialization_with_source("unique id counter is not UTF-8", e)
    })?;
    text.trim().parse::<u64>().map_err(|e| {
        EngineError::from(StorageError::serialization_with_source(
            format!("unique id counter '{text}' is not numeric"),
            e,
        ))
    })
}
