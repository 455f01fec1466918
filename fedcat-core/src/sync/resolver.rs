//! Natural-key resolution
//!
//! Pure lookups: nothing here writes to the graph. A structural question
//! whose answer is not exactly what the data model allows (two nodes with one
//! global key, a service without a region) is reported as
//! `InconsistentState` rather than guessed around.

use serde_json::{Value, json};

use crate::error::{Result, SyncError};
use crate::model::{ProviderType, provider::provider_key};
use crate::storage::{Graph, NodeId, NodeKind, Relation, StoredNode};

/// The single node of `kind` matching `filter`, if any
fn find_unique(
    graph: &dyn Graph,
    kind: NodeKind,
    filter: &[(&str, &Value)],
    key: &str,
) -> Result<Option<StoredNode>> {
    let mut found = graph.find_nodes(kind, filter)?;
    match found.len() {
        0 => Ok(None),
        1 => Ok(found.pop()),
        n => Err(SyncError::inconsistent(
            kind,
            key,
            format!("{n} nodes share a globally unique key"),
        )),
    }
}

pub fn find_provider(
    graph: &dyn Graph,
    name: &str,
    provider_type: ProviderType,
) -> Result<Option<StoredNode>> {
    find_unique(
        graph,
        NodeKind::Provider,
        &[
            ("name", &json!(name)),
            ("type", &json!(provider_type.as_str())),
        ],
        &provider_key(name, provider_type),
    )
}

pub fn find_identity_provider(graph: &dyn Graph, endpoint: &str) -> Result<Option<StoredNode>> {
    find_unique(
        graph,
        NodeKind::IdentityProvider,
        &[("endpoint", &json!(endpoint))],
        endpoint,
    )
}

pub fn find_location(graph: &dyn Graph, site: &str) -> Result<Option<StoredNode>> {
    find_unique(graph, NodeKind::Location, &[("site", &json!(site))], site)
}

pub fn find_sla(graph: &dyn Graph, doc_uuid: &str) -> Result<Option<StoredNode>> {
    find_unique(graph, NodeKind::Sla, &[("doc_uuid", &json!(doc_uuid))], doc_uuid)
}

// ============================================================================
// Structure
// ============================================================================

/// Child nodes reached through `relation`
pub fn children(graph: &dyn Graph, parent: &NodeId, relation: Relation) -> Result<Vec<StoredNode>> {
    graph
        .targets(parent, relation)?
        .iter()
        .map(|id| {
            graph.get_node(id)?.ok_or_else(|| {
                SyncError::inconsistent(relation.to_kind(), id.as_str(), "edge to a missing node")
            })
        })
        .collect()
}

/// The one node at the source end of `relation`, which the data model requires
pub fn single_source(graph: &dyn Graph, node: &NodeId, relation: Relation) -> Result<NodeId> {
    let mut sources = graph.sources(node, relation)?;
    match sources.len() {
        1 => Ok(sources.remove(0)),
        n => Err(SyncError::inconsistent(
            relation.to_kind(),
            node.as_str(),
            format!("expected exactly one {} via {relation}, found {n}", relation.from_kind()),
        )),
    }
}

/// Provider owning a region
pub fn region_provider(graph: &dyn Graph, region: &NodeId) -> Result<NodeId> {
    single_source(graph, region, Relation::ProviderRegion)
}

/// Provider owning a service, through its region
pub fn service_provider(graph: &dyn Graph, service: &NodeId) -> Result<NodeId> {
    let region = single_source(graph, service, Relation::RegionService)?;
    region_provider(graph, &region)
}

/// Relation from a service to resources of `kind`
pub fn service_relation(kind: NodeKind) -> Option<Relation> {
    match kind {
        NodeKind::Flavor => Some(Relation::ServiceFlavor),
        NodeKind::Image => Some(Relation::ServiceImage),
        NodeKind::Network => Some(Relation::ServiceNetwork),
        _ => None,
    }
}

/// Relation granting a project access to resources of `kind`
pub fn project_relation(kind: NodeKind) -> Option<Relation> {
    match kind {
        NodeKind::Flavor => Some(Relation::ProjectFlavor),
        NodeKind::Image => Some(Relation::ProjectImage),
        NodeKind::Network => Some(Relation::ProjectNetwork),
        _ => None,
    }
}

/// Distinct providers whose services expose a flavor, image or network
pub fn resource_providers(graph: &dyn Graph, kind: NodeKind, resource: &NodeId) -> Result<Vec<NodeId>> {
    let relation = service_relation(kind).ok_or_else(|| {
        SyncError::inconsistent(kind, resource.as_str(), "not a service resource")
    })?;
    let mut providers = Vec::new();
    for service in graph.sources(resource, relation)? {
        let provider = service_provider(graph, &service)?;
        if !providers.contains(&provider) {
            providers.push(provider);
        }
    }
    Ok(providers)
}

/// The flavor, image or network with `uuid` that belongs to `provider`.
///
/// The same uuid may exist under unrelated providers as distinct nodes; only
/// the one exposed by this provider's services counts as "the same" resource.
pub fn resolve_same_owner(
    graph: &dyn Graph,
    kind: NodeKind,
    uuid: &str,
    provider: &NodeId,
) -> Result<Option<StoredNode>> {
    let mut owned = Vec::new();
    for node in graph.find_nodes(kind, &[("uuid", &json!(uuid))])? {
        let providers = resource_providers(graph, kind, &node.id)?;
        if !providers.contains(provider) {
            continue;
        }
        if providers.len() > 1 {
            return Err(SyncError::inconsistent(
                kind,
                uuid,
                format!("exposed by {} providers", providers.len()),
            ));
        }
        owned.push(node);
    }
    match owned.len() {
        0 => Ok(None),
        1 => Ok(owned.pop()),
        n => Err(SyncError::inconsistent(
            kind,
            uuid,
            format!("{n} nodes share the uuid within one provider"),
        )),
    }
}

/// Project a quota applies to
pub fn quota_project(graph: &dyn Graph, quota: &NodeId) -> Result<NodeId> {
    single_source(graph, quota, Relation::ProjectQuota)
}

/// User group holding an SLA
pub fn sla_user_group(graph: &dyn Graph, sla: &NodeId) -> Result<NodeId> {
    single_source(graph, sla, Relation::UserGroupSla)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Flavor, Region, Service, ServiceType, record};
    use crate::storage::MemoryGraph;

    fn flavor(uuid: &str) -> Flavor {
        serde_json::from_value(json!({"uuid": uuid, "name": "small"})).unwrap()
    }

    /// provider -> region -> compute service, returning (provider, service)
    fn compute_chain(graph: &mut MemoryGraph) -> (NodeId, NodeId) {
        let provider = graph
            .create_node(NodeKind::Provider, Default::default())
            .unwrap();
        let region = record::create(
            graph,
            &Region {
                name: "RegionOne".into(),
                description: String::new(),
            },
        )
        .unwrap();
        let service = record::create(
            graph,
            &Service {
                service_type: ServiceType::Compute,
                endpoint: "https://nova".into(),
                name: "org.openstack.nova".into(),
                description: String::new(),
            },
        )
        .unwrap();
        graph
            .connect(&provider, &region, Relation::ProviderRegion, None)
            .unwrap();
        graph
            .connect(&region, &service, Relation::RegionService, None)
            .unwrap();
        (provider, service)
    }

    #[test]
    fn test_same_owner_ignores_other_providers() {
        let mut graph = MemoryGraph::default();
        let (provider_a, service_a) = compute_chain(&mut graph);
        let (provider_b, _) = compute_chain(&mut graph);

        let node = record::create(&mut graph, &flavor("f1")).unwrap();
        graph
            .connect(&service_a, &node, Relation::ServiceFlavor, None)
            .unwrap();

        let found = resolve_same_owner(&graph, NodeKind::Flavor, "f1", &provider_a).unwrap();
        assert_eq!(found.map(|n| n.id), Some(node));
        assert!(
            resolve_same_owner(&graph, NodeKind::Flavor, "f1", &provider_b)
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn test_service_without_region_is_inconsistent() {
        let mut graph = MemoryGraph::default();
        let service = graph
            .create_node(NodeKind::Service, Default::default())
            .unwrap();
        assert!(matches!(
            service_provider(&graph, &service).unwrap_err(),
            SyncError::InconsistentState { .. }
        ));
    }

    #[test]
    fn test_duplicate_global_key_is_inconsistent() {
        let mut graph = MemoryGraph::default();
        for _ in 0..2 {
            let mut props = crate::storage::Props::new();
            props.insert("site".into(), json!("bari"));
            graph.create_node(NodeKind::Location, props).unwrap();
        }
        assert!(find_location(&graph, "pisa").unwrap().is_none());
        assert!(matches!(
            find_location(&graph, "bari").unwrap_err(),
            SyncError::InconsistentState { .. }
        ));
    }
}
