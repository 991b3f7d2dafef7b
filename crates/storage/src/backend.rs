//! Storage backend trait definition.
//!
//! This module defines the [`StorageBackend`] trait, the byte-level key-value
//! store the settlement engine runs against. It stands in for the host ledger
//! runtime: point reads and writes, ordered range scans, and transactions
//! committed with optimistic concurrency control.
//!
//! Keys and values are opaque bytes. Record layout and composite-key
//! construction live above this trait, in the engine's ledger accessor and in
//! [`CompositeKey`](crate::CompositeKey).
//!
//! See [`MemoryBackend`](crate::MemoryBackend) for the reference implementation.

use std::ops::RangeBounds;

use async_trait::async_trait;
use bytes::Bytes;

use crate::{error::StorageResult, transaction::Transaction, types::KeyValue};

/// Byte-level ledger store shared by every invocation.
///
/// Direct calls ([`get`](Self::get), [`set`](Self::set),
/// [`delete`](Self::delete), [`get_range`](Self::get_range)) act on committed
/// state immediately and are used for bootstrap and inspection. Invocations
/// go through [`transaction`](Self::transaction).
///
/// # Example
///
/// ```
/// use beatchain_storage::{CompositeKey, MemoryBackend, StorageBackend};
///
/// # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
/// let backend = MemoryBackend::new();
/// let key = CompositeKey::new("UniqueId").encode();
///
/// backend.set(key.clone(), b"100000000".to_vec()).await.unwrap();
/// assert_eq!(backend.get(&key).await.unwrap().as_deref(), Some(&b"100000000"[..]));
/// # });
/// ```
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Committed value under `key`, or `None` when absent.
    #[must_use = "storage operations may fail and errors must be handled"]
    async fn get(&self, key: &[u8]) -> StorageResult<Option<Bytes>>;

    /// Stores a key-value pair, overwriting any existing value.
    ///
    /// A direct write counts as a committed modification: open transactions
    /// that read `key` will fail to commit.
    #[must_use = "storage operations may fail and errors must be handled"]
    async fn set(&self, key: Vec<u8>, value: Vec<u8>) -> StorageResult<()>;

    /// Removes `key`. Removing an absent key succeeds and commits nothing.
    #[must_use = "storage operations may fail and errors must be handled"]
    async fn delete(&self, key: &[u8]) -> StorageResult<()>;

    /// Retrieves all key-value pairs within a range, ordered by key.
    ///
    /// The range uses [`RangeBounds`], so `start..end`, `start..=end`,
    /// `start..` and tuples of [`Bound`](std::ops::Bound) (as returned by
    /// [`CompositeKey::prefix_range`](crate::CompositeKey::prefix_range)) are
    /// all accepted. An inverted range yields no entries.
    #[must_use = "storage operations may fail and errors must be handled"]
    async fn get_range<R>(&self, range: R) -> StorageResult<Vec<KeyValue>>
    where
        R: RangeBounds<Vec<u8>> + Send;

    /// Begins a new transaction.
    ///
    /// One transaction backs one invocation. Dropping it without calling
    /// [`Transaction::commit`] discards every buffered write.
    #[must_use = "storage operations may fail and errors must be handled"]
    async fn transaction(&self) -> StorageResult<Box<dyn Transaction>>;
}
