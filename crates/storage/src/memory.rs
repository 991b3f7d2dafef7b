//! In-process ledger store.
//!
//! [`MemoryBackend`] keeps committed entries in a [`BTreeMap`] behind a
//! [`parking_lot::RwLock`]. Every commit that writes takes the next value of a
//! global sequence, and each key remembers the sequence that last touched it,
//! deletions included. A transaction notes the sequence it started at plus
//! every key and range it read; at commit, any of those touched by a later
//! sequence turns the commit into [`StorageError::Conflict`].
//!
//! Reads see the latest committed state, not a snapshot. Staleness is caught
//! at commit instead. Nothing is persisted.
//!
//! ```
//! use beatchain_storage::{MemoryBackend, StorageBackend};
//!
//! # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
//! let backend = MemoryBackend::new();
//! backend.set(b"counter".to_vec(), b"1".to_vec()).await.unwrap();
//!
//! let mut first = backend.transaction().await.unwrap();
//! let mut second = backend.transaction().await.unwrap();
//! first.get(b"counter").await.unwrap();
//! second.get(b"counter").await.unwrap();
//! first.set(b"counter".to_vec(), b"2".to_vec());
//! second.set(b"counter".to_vec(), b"2".to_vec());
//!
//! first.commit().await.unwrap();
//! assert!(second.commit().await.unwrap_err().is_conflict());
//! # });
//! ```

use std::{
    collections::BTreeMap,
    ops::{Bound, RangeBounds},
    sync::Arc,
};

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;

use crate::{
    backend::StorageBackend,
    error::{StorageError, StorageResult},
    transaction::Transaction,
    types::KeyValue,
};

#[derive(Debug, Default)]
struct MemoryState {
    data: BTreeMap<Vec<u8>, Bytes>,
    /// Commit sequence that last modified each key. Deleted keys keep their entry.
    versions: BTreeMap<Vec<u8>, u64>,
    sequence: u64,
}

impl MemoryState {
    /// Starts a new commit and returns its sequence number.
    fn next_sequence(&mut self) -> u64 {
        self.sequence += 1;
        self.sequence
    }

    fn apply(&mut self, key: Vec<u8>, value: Option<Bytes>, sequence: u64) {
        match value {
            Some(v) => {
                self.data.insert(key.clone(), v);
            },
            None => {
                self.data.remove(&key);
            },
        }
        self.versions.insert(key, sequence);
    }

    fn key_modified_after(&self, key: &[u8], sequence: u64) -> bool {
        self.versions.get(key).is_some_and(|v| *v > sequence)
    }

    fn range_modified_after(
        &self,
        start: &Bound<Vec<u8>>,
        end: &Bound<Vec<u8>>,
        sequence: u64,
    ) -> bool {
        let (start, end) = (as_slice_bound(start), as_slice_bound(end));
        if is_empty_range(start, end) {
            return false;
        }
        self.versions.range::<[u8], _>((start, end)).any(|(_, v)| *v > sequence)
    }

    fn scan(&self, start: Bound<&[u8]>, end: Bound<&[u8]>) -> Vec<KeyValue> {
        if is_empty_range(start, end) {
            return Vec::new();
        }
        self.data
            .range::<[u8], _>((start, end))
            .map(|(k, v)| KeyValue::new(Bytes::copy_from_slice(k), v.clone()))
            .collect()
    }
}

fn as_slice_bound(bound: &Bound<Vec<u8>>) -> Bound<&[u8]> {
    match bound {
        Bound::Included(b) => Bound::Included(b.as_slice()),
        Bound::Excluded(b) => Bound::Excluded(b.as_slice()),
        Bound::Unbounded => Bound::Unbounded,
    }
}

/// `BTreeMap::range` panics on inverted bounds; those ranges are simply empty here.
fn is_empty_range(start: Bound<&[u8]>, end: Bound<&[u8]>) -> bool {
    match (start, end) {
        (Bound::Included(s), Bound::Included(e)) => s > e,
        (Bound::Included(s) | Bound::Excluded(s), Bound::Excluded(e))
        | (Bound::Excluded(s), Bound::Included(e)) => s >= e,
        _ => false,
    }
}

/// In-memory storage backend using [`BTreeMap`].
///
/// # Cloning
///
/// `MemoryBackend` is cheaply cloneable via [`Arc`]. All clones share the
/// same underlying data store and commit sequence.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryBackend {
    /// Creates a new, empty in-memory storage backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the sequence number of the most recent commit.
    ///
    /// Starts at zero and grows by one for every direct write and every
    /// successful transaction commit.
    pub fn commit_sequence(&self) -> u64 {
        self.state.read().sequence
    }
}

impl std::fmt::Debug for MemoryBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("MemoryBackend")
            .field("keys", &state.data.len())
            .field("sequence", &state.sequence)
            .finish()
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    #[tracing::instrument(skip(self, key), fields(key = %hex::encode(key)))]
    async fn get(&self, key: &[u8]) -> StorageResult<Option<Bytes>> {
        Ok(self.state.read().data.get(key).cloned())
    }

    #[tracing::instrument(skip(self, key, value), fields(key = %hex::encode(&key), len = value.len()))]
    async fn set(&self, key: Vec<u8>, value: Vec<u8>) -> StorageResult<()> {
        let mut state = self.state.write();
        let sequence = state.next_sequence();
        state.apply(key, Some(Bytes::from(value)), sequence);
        Ok(())
    }

    #[tracing::instrument(skip(self, key), fields(key = %hex::encode(key)))]
    async fn delete(&self, key: &[u8]) -> StorageResult<()> {
        let mut state = self.state.write();
        if state.data.contains_key(key) {
            let sequence = state.next_sequence();
            state.apply(key.to_vec(), None, sequence);
        }
        Ok(())
    }

    #[tracing::instrument(skip(self, range))]
    async fn get_range<R>(&self, range: R) -> StorageResult<Vec<KeyValue>>
    where
        R: RangeBounds<Vec<u8>> + Send,
    {
        let start = range.start_bound().map(Vec::as_slice);
        let end = range.end_bound().map(Vec::as_slice);
        Ok(self.state.read().scan(start, end))
    }

    #[tracing::instrument(skip(self))]
    async fn transaction(&self) -> StorageResult<Box<dyn Transaction>> {
        Ok(Box::new(MemoryTransaction::new(self.clone())))
    }
}

/// In-memory transaction implementation.
///
/// Buffers writes and deletes until commit, providing read-your-writes
/// semantics, and records every key and range it reads.
struct MemoryTransaction {
    backend: MemoryBackend,
    /// Commit sequence observed when the transaction began.
    start_sequence: u64,
    pending_writes: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
    read_keys: Vec<Vec<u8>>,
    read_ranges: Vec<(Bound<Vec<u8>>, Bound<Vec<u8>>)>,
}

impl MemoryTransaction {
    fn new(backend: MemoryBackend) -> Self {
        let start_sequence = backend.commit_sequence();
        Self {
            backend,
            start_sequence,
            pending_writes: BTreeMap::new(),
            read_keys: Vec::new(),
            read_ranges: Vec::new(),
        }
    }

    /// Checks the read-set against commits that happened after this
    /// transaction began.
    fn validate(&self, state: &MemoryState) -> StorageResult<()> {
        if let Some(key) =
            self.read_keys.iter().find(|k| state.key_modified_after(k, self.start_sequence))
        {
            tracing::debug!(key = %hex::encode(key), "read key modified by a later commit");
            return Err(StorageError::conflict());
        }
        if self
            .read_ranges
            .iter()
            .any(|(start, end)| state.range_modified_after(start, end, self.start_sequence))
        {
            tracing::debug!("scanned range modified by a later commit");
            return Err(StorageError::conflict());
        }
        Ok(())
    }
}

#[async_trait]
impl Transaction for MemoryTransaction {
    async fn get(&mut self, key: &[u8]) -> StorageResult<Option<Bytes>> {
        if let Some(value) = self.pending_writes.get(key) {
            return Ok(value.as_ref().map(|v| Bytes::copy_from_slice(v)));
        }

        self.read_keys.push(key.to_vec());
        Ok(self.backend.state.read().data.get(key).cloned())
    }

    async fn get_range(
        &mut self,
        start: Bound<Vec<u8>>,
        end: Bound<Vec<u8>>,
    ) -> StorageResult<Vec<KeyValue>> {
        let (lo, hi) = (as_slice_bound(&start), as_slice_bound(&end));
        let mut merged: BTreeMap<Bytes, Bytes> = self
            .backend
            .state
            .read()
            .scan(lo, hi)
            .into_iter()
            .map(|kv| (kv.key, kv.value))
            .collect();

        if !is_empty_range(lo, hi) {
            for (key, value) in self.pending_writes.range::<[u8], _>((lo, hi)) {
                let key = Bytes::copy_from_slice(key);
                match value {
                    Some(v) => {
                        merged.insert(key, Bytes::copy_from_slice(v));
                    },
                    None => {
                        merged.remove(&key);
                    },
                }
            }
        }

        self.read_ranges.push((start, end));
        Ok(merged.into_iter().map(|(k, v)| KeyValue::new(k, v)).collect())
    }

    fn set(&mut self, key: Vec<u8>, value: Vec<u8>) {
        self.pending_writes.insert(key, Some(value));
    }

    fn delete(&mut self, key: Vec<u8>) {
        self.pending_writes.insert(key, None);
    }

    #[tracing::instrument(
        name = "commit",
        skip(self),
        fields(writes = self.pending_writes.len(), reads = self.read_keys.len())
    )]
    async fn commit(self: Box<Self>) -> StorageResult<()> {
        fail::fail_point!("memory-before-commit", |_| {
            Err(StorageError::internal("injected failure before commit"))
        });

        let mut state = self.backend.state.write();
        self.validate(&state)?;

        if self.pending_writes.is_empty() {
            return Ok(());
        }

        let sequence = state.next_sequence();
        for (key, value) in self.pending_writes {
            state.apply(key, value.map(Bytes::from), sequence);
        }
        tracing::debug!(sequence, "transaction committed");

        Ok(())
    }
}
