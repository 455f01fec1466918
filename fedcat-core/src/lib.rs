//! Federation catalog core
//!
//! A persistent property graph of cloud providers and the resources they
//! expose, plus the engine that converges it to declarative provider trees.
//!
//! - `storage` - graph store (memory, SQLite behind the `sqlite` feature)
//! - `model` - typed attribute records per node kind
//! - `input` - the desired-state tree clients submit
//! - `sync` - the reconciliation engine
//! - `export` - read-back of a provider in input-tree form

pub mod error;
pub mod export;
pub mod input;
pub mod model;
pub mod storage;
pub mod sync;

pub use error::{Result, SyncError};
pub use input::ProviderInput;
pub use storage::{CatalogStore, MemoryStore, NodeId};
#[cfg(feature = "sqlite")]
pub use storage::SqliteStore;
pub use sync::{SyncOutcome, SyncStatus, Synchronizer};
