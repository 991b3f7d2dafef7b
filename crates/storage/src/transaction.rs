//! Transaction trait for atomic storage operations.
//!
//! # Transaction Semantics
//!
//! - **Atomicity**: all buffered writes become visible together, or none do
//! - **Read-your-writes**: reads and scans within a transaction see pending writes
//! - **Read-set validation**: every key read and every range scanned is recorded; commit fails
//!   with [`Conflict`](crate::StorageError::Conflict) if another commit touched any of them after
//!   this transaction began
//!
//! # Example
//!
//! ```
//! use beatchain_storage::{MemoryBackend, StorageBackend};
//!
//! # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
//! let backend = MemoryBackend::new();
//!
//! backend.set(b"account:alice".to_vec(), b"100".to_vec()).await.unwrap();
//! backend.set(b"account:bob".to_vec(), b"50".to_vec()).await.unwrap();
//!
//! let mut txn = backend.transaction().await.unwrap();
//! let alice = txn.get(b"account:alice").await.unwrap().unwrap();
//! assert_eq!(&alice[..], b"100");
//! txn.set(b"account:alice".to_vec(), b"80".to_vec());
//! txn.set(b"account:bob".to_vec(), b"70".to_vec());
//! txn.commit().await.unwrap();
//!
//! let bob = backend.get(b"account:bob").await.unwrap().unwrap();
//! assert_eq!(&bob[..], b"70");
//! # });
//! ```

use std::ops::Bound;

use async_trait::async_trait;
use bytes::Bytes;

use crate::{error::StorageResult, types::KeyValue};

/// Transaction handle for atomic multi-operation commits.
///
/// A transaction buffers sets and deletes until [`commit`](Transaction::commit).
/// Reads take `&mut self` because they extend the read-set checked at commit.
#[async_trait]
pub trait Transaction: Send {
    /// Gets a value within the transaction.
    ///
    /// Pending writes are consulted first. The key joins the read-set whether
    /// or not it exists, so a concurrent insert of a missing key is also a
    /// conflict.
    async fn get(&mut self, key: &[u8]) -> StorageResult<Option<Bytes>>;

    /// Scans `[start, end)`-style bounds in key order.
    ///
    /// Committed entries are merged with pending writes: buffered sets appear,
    /// buffered deletes are hidden. The scanned range joins the read-set, so
    /// any key committed inside it by another transaction is a conflict.
    async fn get_range(
        &mut self,
        start: Bound<Vec<u8>>,
        end: Bound<Vec<u8>>,
    ) -> StorageResult<Vec<KeyValue>>;

    /// Buffers a set operation within the transaction.
    fn set(&mut self, key: Vec<u8>, value: Vec<u8>);

    /// Buffers a delete operation within the transaction.
    fn delete(&mut self, key: Vec<u8>);

    /// Validates the read-set and applies all buffered writes atomically.
    ///
    /// # Errors
    ///
    /// - [`StorageError::Conflict`](crate::StorageError::Conflict) if a key or range this
    ///   transaction read was modified by a commit that happened after it began
    /// - Other [`StorageError`](crate::StorageError) variants on backend failures
    ///
    /// Nothing is applied when an error is returned.
    async fn commit(self: Box<Self>) -> StorageResult<()>;
}
