//! Graph storage traits

use anyhow::{Result, bail};
use serde_json::Value;

use crate::storage::ids::NodeId;
use crate::storage::types::{Edge, NodeKind, Props, Relation, StoredNode};

/// Property graph operations
///
/// Synchronous and object safe: the sync engine works against
/// `&mut dyn Graph` handed out by a [`CatalogStore`] transaction.
pub trait Graph {
    // ========================================================================
    // Nodes
    // ========================================================================

    /// Create a node and return its new id
    fn create_node(&mut self, kind: NodeKind, props: Props) -> Result<NodeId>;

    fn get_node(&self, id: &NodeId) -> Result<Option<StoredNode>>;

    /// All nodes of `kind` whose properties equal every `(name, value)` pair
    fn find_nodes(&self, kind: NodeKind, filter: &[(&str, &Value)]) -> Result<Vec<StoredNode>>;

    /// Replace a node's properties
    fn update_node(&mut self, id: &NodeId, props: Props) -> Result<()>;

    /// Delete a node together with every edge touching it
    fn delete_node(&mut self, id: &NodeId) -> Result<()>;

    // ========================================================================
    // Edges
    // ========================================================================

    /// Create an edge, or replace the metadata of an existing one
    fn connect(
        &mut self,
        from: &NodeId,
        to: &NodeId,
        relation: Relation,
        metadata: Option<Value>,
    ) -> Result<()>;

    /// Remove an edge. Returns false if it did not exist.
    fn disconnect(&mut self, from: &NodeId, to: &NodeId, relation: Relation) -> Result<bool>;

    fn edge(&self, from: &NodeId, to: &NodeId, relation: Relation) -> Result<Option<Edge>>;

    /// Targets of outgoing `relation` edges, in insertion order
    fn targets(&self, from: &NodeId, relation: Relation) -> Result<Vec<NodeId>>;

    /// Sources of incoming `relation` edges, in insertion order
    fn sources(&self, to: &NodeId, relation: Relation) -> Result<Vec<NodeId>>;
}

/// A store that hands out graph handles
///
/// `transaction` is all-or-nothing: when the closure returns `Err` none of
/// its writes are visible afterwards. Implementations serialize transactions.
pub trait CatalogStore: Send + Sync {
    fn read<T, E>(&self, f: impl FnOnce(&dyn Graph) -> Result<T, E>) -> Result<T, E>
    where
        E: From<anyhow::Error>;

    fn transaction<T, E>(&self, f: impl FnOnce(&mut dyn Graph) -> Result<T, E>) -> Result<T, E>
    where
        E: From<anyhow::Error>;
}

/// Reject an edge whose endpoints do not have the relation's kinds
pub(crate) fn check_endpoints(relation: Relation, from: Option<&StoredNode>, to: Option<&StoredNode>) -> Result<()> {
    let (Some(from), Some(to)) = (from, to) else {
        bail!("cannot connect {relation}: endpoint does not exist");
    };
    if from.kind != relation.from_kind() || to.kind != relation.to_kind() {
        bail!(
            "cannot connect {relation}: expected {} -> {}, got {} -> {}",
            relation.from_kind(),
            relation.to_kind(),
            from.kind,
            to.kind
        );
    }
    Ok(())
}
