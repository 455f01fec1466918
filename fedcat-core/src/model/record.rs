//! Typed records stored as node properties

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::error::{Result, SyncError};
use crate::storage::{Graph, NodeId, NodeKind, Props, StoredNode};

/// An attribute record persisted as the properties of one node kind
pub trait NodeRecord: Serialize + DeserializeOwned {
    const KIND: NodeKind;

    /// Natural key, for log lines and error messages
    fn natural_key(&self) -> String;
}

/// Serialize a record into a property map
pub fn to_props<R: NodeRecord>(record: &R) -> Result<Props> {
    match serde_json::to_value(record)? {
        Value::Object(map) => Ok(map),
        other => Err(SyncError::inconsistent(
            R::KIND,
            record.natural_key(),
            format!("record serialized to non-object {other}"),
        )),
    }
}

/// Decode a stored node into its record
pub fn decode<R: NodeRecord>(node: &StoredNode) -> Result<R> {
    if node.kind != R::KIND {
        return Err(SyncError::inconsistent(
            R::KIND,
            node.id.as_str(),
            format!("node is a {}", node.kind),
        ));
    }
    serde_json::from_value(Value::Object(node.props.clone()))
        .map_err(|e| SyncError::inconsistent(R::KIND, node.id.as_str(), e.to_string()))
}

/// Fetch a node, which must exist and be of the record's kind
pub fn fetch(graph: &dyn Graph, kind: NodeKind, id: &NodeId) -> Result<StoredNode> {
    let node = graph
        .get_node(id)?
        .ok_or_else(|| SyncError::not_found(kind, id.as_str()))?;
    if node.kind != kind {
        return Err(SyncError::inconsistent(
            kind,
            id.as_str(),
            format!("node is a {}", node.kind),
        ));
    }
    Ok(node)
}

/// Fetch and decode a node
pub fn load<R: NodeRecord>(graph: &dyn Graph, id: &NodeId) -> Result<R> {
    decode(&fetch(graph, R::KIND, id)?)
}

/// Create a node holding the record
pub fn create<R: NodeRecord>(graph: &mut dyn Graph, record: &R) -> Result<NodeId> {
    let id = graph.create_node(R::KIND, to_props(record)?)?;
    debug!("Created {} '{}' ({})", R::KIND, record.natural_key(), id);
    Ok(id)
}

/// Bring a node's properties in line with the record, field by field.
///
/// Returns whether anything was written.
pub fn patch<R: NodeRecord>(graph: &mut dyn Graph, node: &StoredNode, record: &R) -> Result<bool> {
    let desired = to_props(record)?;
    let mut props = node.props.clone();
    let mut changed = Vec::new();

    for (name, value) in &desired {
        if props.get(name) != Some(value) {
            props.insert(name.clone(), value.clone());
            changed.push(name.clone());
        }
    }
    let stale: Vec<String> = props
        .keys()
        .filter(|name| !desired.contains_key(*name))
        .cloned()
        .collect();
    for name in stale {
        props.remove(&name);
        changed.push(name);
    }

    if changed.is_empty() {
        return Ok(false);
    }
    graph.update_node(&node.id, props)?;
    debug!(
        "Patched {} '{}': {}",
        R::KIND,
        record.natural_key(),
        changed.join(", ")
    );
    Ok(true)
}

/// Fields of the record that differ from the stored node
pub fn differing_fields<R: NodeRecord>(node: &StoredNode, record: &R) -> Result<Vec<String>> {
    let desired = to_props(record)?;
    Ok(desired
        .iter()
        .filter(|(name, value)| node.props.get(*name) != Some(*value))
        .map(|(name, _)| name.clone())
        .collect())
}
