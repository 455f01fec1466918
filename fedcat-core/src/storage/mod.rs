//! Catalog storage
//!
//! A property graph of typed nodes and labelled, directed edges:
//! - `ids` - node id newtype
//! - `types` - node kinds, relations and stored wrappers
//! - `traits` - `Graph` and `CatalogStore`
//! - `implementations` - memory and (feature `sqlite`) SQLite backends

pub mod helper;
pub mod ids;
pub mod implementations;
pub mod traits;
pub mod types;

pub use ids::NodeId;
pub use implementations::memory::{MemoryGraph, MemoryStore};
#[cfg(feature = "sqlite")]
pub use implementations::sqlite::{SqliteGraph, SqliteStore};
pub use traits::{CatalogStore, Graph};
pub use types::{Edge, Node, NodeKind, Props, Relation, StoredNode};
