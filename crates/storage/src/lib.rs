//! Key-value storage abstraction for the Beatchain settlement engine.
//!
//! This crate stands in for the host ledger runtime. It provides the
//! [`StorageBackend`] trait, invocation-scoped [`Transaction`]s with
//! optimistic concurrency control, and the [`CompositeKey`] codec the engine
//! uses to address records.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  beatchain-engine                           │
//! │     (operation dispatch, handlers, ledger accessor)         │
//! ├─────────────────────────────────────────────────────────────┤
//! │                  beatchain-storage                          │
//! │   StorageBackend / Transaction          CompositeKey        │
//! │   (get, set, delete, get_range, commit) (kind~c1~c2)        │
//! ├─────────────────────────────────────────────────────────────┤
//! │                   MemoryBackend                             │
//! │     (BTreeMap, commit sequence, read-set validation)        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```
//! use beatchain_storage::{CompositeKey, MemoryBackend, StorageBackend};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let backend = MemoryBackend::new();
//!     let key = CompositeKey::new("BankAccount").with("1").encode();
//!
//!     let mut txn = backend.transaction().await?;
//!     assert!(txn.get(&key).await?.is_none());
//!     txn.set(key.clone(), br#"{"balance":"0.00"}"#.to_vec());
//!     txn.commit().await?;
//!
//!     assert!(backend.get(&key).await?.is_some());
//!     Ok(())
//! }
//! ```
//!
//! # Feature Flags
//!
//! - **`testutil`**: Enables the `testutil` module for inspecting committed entries in tests.
//! - **`failpoints`**: Activates the `memory-before-commit` fail point in
//!   [`MemoryBackend`] commits.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod backend;
pub mod error;
pub mod keys;
pub mod memory;
#[cfg(any(test, feature = "testutil"))]
pub mod testutil;
pub mod transaction;
pub mod types;

pub use backend::StorageBackend;
pub use error::{BoxError, StorageError, StorageResult};
pub use keys::CompositeKey;
pub use memory::MemoryBackend;
pub use transaction::Transaction;
pub use types::KeyValue;
