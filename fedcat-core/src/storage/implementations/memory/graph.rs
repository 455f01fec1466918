//! In-memory graph store

use anyhow::{Result, anyhow, bail};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::storage::helper::unix_timestamp;
use crate::storage::ids::NodeId;
use crate::storage::traits::{CatalogStore, Graph, check_endpoints};
use crate::storage::types::{Edge, Node, NodeKind, Props, Relation, StoredNode, stored_editable};

/// Relation key for indexing
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
struct RelationKey {
    from_id: NodeId,
    to_id: NodeId,
    relation: Relation,
}

/// Storage entry for an edge
#[derive(Clone, Debug)]
struct EdgeEntry {
    edge: Edge,
    seq: u64,
}

/// The graph itself; cheap enough to clone per transaction
#[derive(Clone, Debug, Default)]
pub struct MemoryGraph {
    nodes: BTreeMap<NodeId, (StoredNode, u64)>,
    edges: BTreeMap<RelationKey, EdgeEntry>,
    seq: u64,
}

impl MemoryGraph {
    fn next_seq(&mut self) -> u64 {
        self.seq += 1;
        self.seq
    }

    fn sorted_edges<'a>(&'a self, keep: impl Fn(&RelationKey) -> bool) -> Vec<&'a EdgeEntry> {
        let mut entries: Vec<&EdgeEntry> = self
            .edges
            .iter()
            .filter(|(key, _)| keep(key))
            .map(|(_, entry)| entry)
            .collect();
        entries.sort_by_key(|entry| entry.seq);
        entries
    }

    /// Number of nodes of a kind
    pub fn count(&self, kind: NodeKind) -> usize {
        self.nodes.values().filter(|(node, _)| node.kind == kind).count()
    }
}

impl Graph for MemoryGraph {
    fn create_node(&mut self, kind: NodeKind, props: Props) -> Result<NodeId> {
        let id = NodeId::new();
        let now = unix_timestamp();
        let seq = self.next_seq();
        let node = stored_editable(id.clone(), Node::new(kind, props), now, now);
        self.nodes.insert(id.clone(), (node, seq));
        Ok(id)
    }

    fn get_node(&self, id: &NodeId) -> Result<Option<StoredNode>> {
        Ok(self.nodes.get(id).map(|(node, _)| node.clone()))
    }

    fn find_nodes(&self, kind: NodeKind, filter: &[(&str, &Value)]) -> Result<Vec<StoredNode>> {
        let mut found: Vec<&(StoredNode, u64)> = self
            .nodes
            .values()
            .filter(|(node, _)| node.kind == kind && node.matches(filter))
            .collect();
        found.sort_by_key(|(_, seq)| *seq);
        Ok(found.into_iter().map(|(node, _)| node.clone()).collect())
    }

    fn update_node(&mut self, id: &NodeId, props: Props) -> Result<()> {
        let (node, _) = self
            .nodes
            .get_mut(id)
            .ok_or_else(|| anyhow!("node not found: {id}"))?;
        node.content.content.props = props;
        node.content.updated_at = unix_timestamp();
        Ok(())
    }

    fn delete_node(&mut self, id: &NodeId) -> Result<()> {
        if self.nodes.remove(id).is_none() {
            bail!("node not found: {id}");
        }
        self.edges.retain(|key, _| &key.from_id != id && &key.to_id != id);
        Ok(())
    }

    fn connect(
        &mut self,
        from: &NodeId,
        to: &NodeId,
        relation: Relation,
        metadata: Option<Value>,
    ) -> Result<()> {
        check_endpoints(
            relation,
            self.nodes.get(from).map(|(n, _)| n),
            self.nodes.get(to).map(|(n, _)| n),
        )?;
        let key = RelationKey {
            from_id: from.clone(),
            to_id: to.clone(),
            relation,
        };
        if let Some(entry) = self.edges.get_mut(&key) {
            entry.edge.metadata = metadata;
            return Ok(());
        }
        let seq = self.next_seq();
        let edge = Edge {
            from_id: from.clone(),
            to_id: to.clone(),
            relation,
            metadata,
            created_at: unix_timestamp(),
        };
        self.edges.insert(key, EdgeEntry { edge, seq });
        Ok(())
    }

    fn disconnect(&mut self, from: &NodeId, to: &NodeId, relation: Relation) -> Result<bool> {
        let key = RelationKey {
            from_id: from.clone(),
            to_id: to.clone(),
            relation,
        };
        Ok(self.edges.remove(&key).is_some())
    }

    fn edge(&self, from: &NodeId, to: &NodeId, relation: Relation) -> Result<Option<Edge>> {
        let key = RelationKey {
            from_id: from.clone(),
            to_id: to.clone(),
            relation,
        };
        Ok(self.edges.get(&key).map(|entry| entry.edge.clone()))
    }

    fn targets(&self, from: &NodeId, relation: Relation) -> Result<Vec<NodeId>> {
        Ok(self
            .sorted_edges(|key| &key.from_id == from && key.relation == relation)
            .into_iter()
            .map(|entry| entry.edge.to_id.clone())
            .collect())
    }

    fn sources(&self, to: &NodeId, relation: Relation) -> Result<Vec<NodeId>> {
        Ok(self
            .sorted_edges(|key| &key.to_id == to && key.relation == relation)
            .into_iter()
            .map(|entry| entry.edge.from_id.clone())
            .collect())
    }
}

/// In-memory catalog store for tests and ephemeral use
#[derive(Debug, Default)]
pub struct MemoryStore {
    graph: Mutex<MemoryGraph>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the current graph
    pub fn snapshot(&self) -> Result<MemoryGraph> {
        let guard = self
            .graph
            .lock()
            .map_err(|_| anyhow!("memory store lock poisoned"))?;
        Ok(guard.clone())
    }
}

impl CatalogStore for MemoryStore {
    fn read<T, E>(&self, f: impl FnOnce(&dyn Graph) -> Result<T, E>) -> Result<T, E>
    where
        E: From<anyhow::Error>,
    {
        let guard = self
            .graph
            .lock()
            .map_err(|_| anyhow!("memory store lock poisoned"))?;
        f(&*guard)
    }

    fn transaction<T, E>(&self, f: impl FnOnce(&mut dyn Graph) -> Result<T, E>) -> Result<T, E>
    where
        E: From<anyhow::Error>,
    {
        let mut guard = self
            .graph
            .lock()
            .map_err(|_| anyhow!("memory store lock poisoned"))?;
        let mut working = guard.clone();
        let value = f(&mut working)?;
        *guard = working;
        Ok(value)
    }
}
