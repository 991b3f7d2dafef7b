//! # Beatchain Settlement Engine
//!
//! Transaction logic for a music-streaming marketplace ledger. Customers pay
//! app developers a recurring subscription, the platform keeps an admin fee,
//! and creators are paid per stream under contracts negotiated with app
//! developers.
//!
//! The engine runs against any [`StorageBackend`](beatchain_storage::StorageBackend):
//!
//! - [`Engine::initialize`] seeds the ledger from positional bootstrap arguments
//! - [`Engine::invoke`] authenticates the caller, checks the [`Operation`]'s roles and runs its
//!   handler inside one transaction
//!
//! ## Example
//!
//! ```
//! use beatchain_authn::CallerIdentity;
//! use beatchain_engine::{Engine, EngineConfig, Invocation};
//! use beatchain_storage::MemoryBackend;
//! use chrono::Utc;
//!
//! # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
//! let engine = Engine::new(MemoryBackend::new(), EngineConfig::default()).unwrap();
//! engine
//!     .initialize(&["1000", "1111", "1111", "0.1", "0", "2222", "2222", "1.00", "2020-06-01", "50"])
//!     .await
//!     .unwrap();
//!
//! let admin = CallerIdentity::new("BeatchainMSP", "ca.admin.beatchain.com");
//! let listing = engine
//!     .invoke(&Invocation::new("ListBankAccounts", Utc::now()).with_identity(admin))
//!     .await
//!     .unwrap();
//! assert!(listing.starts_with(b"Bank Account ID: 1 Balance: 1000.00"));
//! # });
//! ```
//!
//! ## Feature Flags
//!
//! - **`failpoints`**: Activates storage fail points for fault-injection tests.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod accessor;
pub mod bootstrap;
pub mod config;
pub mod context;
pub mod engine;
pub mod error;
mod handlers;
pub mod id_generator;
pub mod operation;
pub mod records;
pub mod types;

pub use accessor::LedgerAccessor;
pub use config::{ConfigError, EngineConfig};
pub use context::InvocationContext;
pub use engine::{Engine, Invocation};
pub use error::{EngineError, ErrorKind, Result};
pub use id_generator::IdGenerator;
pub use operation::Operation;
