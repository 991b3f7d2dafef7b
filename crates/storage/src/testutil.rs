//! Helpers for tests that inspect or tamper with committed ledger bytes.
//!
//! Feature-gated behind `testutil`:
//!
//! ```toml
//! [dev-dependencies]
//! beatchain-storage = { workspace = true, features = ["testutil"] }
//! ```

use std::ops::Bound;

use crate::{StorageBackend, error::StorageResult, keys::CompositeKey, types::KeyValue};

/// Encodes `(kind, components...)` as a composite key.
#[must_use]
pub fn record_key(kind: &str, components: &[&str]) -> Vec<u8> {
    components
        .iter()
        .fold(CompositeKey::new(kind), |key, component| key.with(*component))
        .encode()
}

/// Every committed entry, in key order.
///
/// Comparing two snapshots is the strictest way to assert that a failed
/// invocation left no trace.
///
/// # Errors
///
/// Propagates the backend's scan error.
pub async fn snapshot<B: StorageBackend>(backend: &B) -> StorageResult<Vec<KeyValue>> {
    backend.get_range((Bound::<Vec<u8>>::Unbounded, Bound::Unbounded)).await
}

/// Decoded keys of every committed entry of `kind`, in key order.
///
/// # Errors
///
/// Propagates scan errors and [`KeyValue::composite_key`] failures.
pub async fn keys_of_kind<B: StorageBackend>(
    backend: &B,
    kind: &str,
) -> StorageResult<Vec<CompositeKey>> {
    backend
        .get_range(CompositeKey::new(kind).prefix_range())
        .await?
        .iter()
        .map(KeyValue::composite_key)
        .collect()
}
