//! Node types for the catalog graph

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::str::FromStr;

use super::stored::{Editable, Stored};
use crate::storage::ids::NodeId;

/// Node properties, one JSON object per node
pub type Props = Map<String, Value>;

// ============================================================================
// NodeKind
// ============================================================================

/// Kind of a catalog node
///
/// A closed set: every kind has a typed attribute record in `crate::model`
/// and a fixed set of relations it may take part in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Provider,
    Project,
    IdentityProvider,
    UserGroup,
    Sla,
    Region,
    Location,
    Service,
    Quota,
    Flavor,
    Image,
    Network,
    StorageClass,
}

impl NodeKind {
    pub const ALL: [NodeKind; 13] = [
        NodeKind::Provider,
        NodeKind::Project,
        NodeKind::IdentityProvider,
        NodeKind::UserGroup,
        NodeKind::Sla,
        NodeKind::Region,
        NodeKind::Location,
        NodeKind::Service,
        NodeKind::Quota,
        NodeKind::Flavor,
        NodeKind::Image,
        NodeKind::Network,
        NodeKind::StorageClass,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Provider => "provider",
            NodeKind::Project => "project",
            NodeKind::IdentityProvider => "identity_provider",
            NodeKind::UserGroup => "user_group",
            NodeKind::Sla => "sla",
            NodeKind::Region => "region",
            NodeKind::Location => "location",
            NodeKind::Service => "service",
            NodeKind::Quota => "quota",
            NodeKind::Flavor => "flavor",
            NodeKind::Image => "image",
            NodeKind::Network => "network",
            NodeKind::StorageClass => "storage_class",
        }
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NodeKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| anyhow::anyhow!("unknown node kind: {s}"))
    }
}

// ============================================================================
// Node
// ============================================================================

/// A catalog node: its kind and a JSON property bag
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub props: Props,
}

impl Node {
    pub fn new(kind: NodeKind, props: Props) -> Self {
        Self { kind, props }
    }

    /// Read a property, `None` when missing
    pub fn prop(&self, name: &str) -> Option<&Value> {
        self.props.get(name)
    }

    /// Whether every `(name, value)` pair of the filter matches this node
    pub fn matches(&self, filter: &[(&str, &Value)]) -> bool {
        filter
            .iter()
            .all(|(name, value)| self.props.get(*name) == Some(*value))
    }
}

/// A node with its id and timestamps
pub type StoredNode = Stored<NodeId, Editable<Node>>;
