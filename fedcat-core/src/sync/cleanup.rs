//! Cascade cleanup
//!
//! Removing a parent-child edge deletes the child only once nothing owns it
//! any more. Owned-by-one kinds (project, region, service, quota, storage
//! class, user group) go with their single owner. Shared kinds (location,
//! identity provider, flavor, image, network) survive while any owning edge
//! remains. Project access grants on private resources never keep a resource
//! alive.

use tracing::debug;

use crate::error::Result;
use crate::storage::{Graph, NodeId, NodeKind, Relation, StoredNode};

/// Edges whose targets are owned by a node of `kind`
fn owned_relations(kind: NodeKind) -> &'static [Relation] {
    match kind {
        NodeKind::Provider => &[
            Relation::ProviderProject,
            Relation::ProviderIdentityProvider,
            Relation::ProviderRegion,
        ],
        NodeKind::IdentityProvider => &[Relation::IdentityProviderUserGroup],
        NodeKind::UserGroup => &[Relation::UserGroupSla],
        NodeKind::Region => &[Relation::RegionLocation, Relation::RegionService],
        NodeKind::Service => &[
            Relation::ServiceQuota,
            Relation::ServiceFlavor,
            Relation::ServiceImage,
            Relation::ServiceNetwork,
            Relation::ServiceStorageClass,
        ],
        NodeKind::Project => &[Relation::ProjectQuota],
        NodeKind::Sla
        | NodeKind::Location
        | NodeKind::Quota
        | NodeKind::Flavor
        | NodeKind::Image
        | NodeKind::Network
        | NodeKind::StorageClass => &[],
    }
}

/// Edges that must all be present, as incoming (`true`) or outgoing
/// (`false`), for a node of `kind` to stay alive
fn required_links(kind: NodeKind) -> &'static [(Relation, bool)] {
    match kind {
        NodeKind::Provider => &[],
        NodeKind::Project => &[(Relation::ProviderProject, true)],
        NodeKind::IdentityProvider => &[(Relation::ProviderIdentityProvider, true)],
        NodeKind::UserGroup => &[(Relation::IdentityProviderUserGroup, true)],
        NodeKind::Sla => &[(Relation::UserGroupSla, true), (Relation::SlaProject, false)],
        NodeKind::Region => &[(Relation::ProviderRegion, true)],
        NodeKind::Location => &[(Relation::RegionLocation, true)],
        NodeKind::Service => &[(Relation::RegionService, true)],
        NodeKind::Quota => &[(Relation::ServiceQuota, true), (Relation::ProjectQuota, true)],
        NodeKind::Flavor => &[(Relation::ServiceFlavor, true)],
        NodeKind::Image => &[(Relation::ServiceImage, true)],
        NodeKind::Network => &[(Relation::ServiceNetwork, true)],
        NodeKind::StorageClass => &[(Relation::ServiceStorageClass, true)],
    }
}

/// Whether a node has lost an edge it cannot live without
pub fn is_orphaned(graph: &dyn Graph, node: &StoredNode) -> Result<bool> {
    for (relation, incoming) in required_links(node.kind) {
        let linked = if *incoming {
            graph.sources(&node.id, *relation)?
        } else {
            graph.targets(&node.id, *relation)?
        };
        if linked.is_empty() {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Delete a node, then every dependent left orphaned by its removal
pub fn delete_cascade(graph: &mut dyn Graph, id: &NodeId) -> Result<()> {
    let Some(node) = graph.get_node(id)? else {
        return Ok(());
    };

    let mut dependents = Vec::new();
    for relation in owned_relations(node.kind) {
        dependents.extend(graph.targets(id, *relation)?);
    }
    if node.kind == NodeKind::Project {
        // SLAs die with their last project
        dependents.extend(graph.sources(id, Relation::SlaProject)?);
    }

    graph.delete_node(id)?;
    debug!("Deleted {} {}", node.kind, id);

    for dependent in dependents {
        delete_if_orphaned(graph, &dependent)?;
    }
    Ok(())
}

/// Delete a node (cascading) if it is orphaned. Returns whether it was deleted.
pub fn delete_if_orphaned(graph: &mut dyn Graph, id: &NodeId) -> Result<bool> {
    let Some(node) = graph.get_node(id)? else {
        return Ok(false);
    };
    if !is_orphaned(graph, &node)? {
        return Ok(false);
    }
    delete_cascade(graph, id)?;
    Ok(true)
}

/// Detach `child` from `parent`, deleting it if that was its last owner.
///
/// Returns whether anything changed.
pub fn release(graph: &mut dyn Graph, parent: &NodeId, child: &NodeId, relation: Relation) -> Result<bool> {
    let detached = graph.disconnect(parent, child, relation)?;
    let deleted = delete_if_orphaned(graph, child)?;
    if detached && !deleted {
        debug!("Detached {} {} from {}", relation.to_kind(), child, parent);
    }
    Ok(detached || deleted)
}
