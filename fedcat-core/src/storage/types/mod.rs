//! Storage types for the catalog graph

pub mod node;
pub mod relation;
pub mod stored;

pub use node::{Node, NodeKind, Props, StoredNode};
pub use relation::{Edge, Relation};
pub use stored::{Editable, Stored, stored_editable};
