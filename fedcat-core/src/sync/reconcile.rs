//! Generic collection reconciliation
//!
//! Every owned collection of the tree (a provider's projects, a region's
//! services, a service's quotas, ...) converges the same way: key existing
//! children by natural key, match incoming items against them, create what
//! is missing, update what matches, release what is left over.

use std::collections::{BTreeMap, BTreeSet};

use super::cleanup;
use super::context::SyncContext;
use super::resolver;
use crate::error::{Result, SyncError};
use crate::storage::{Graph, NodeId, NodeKind, Relation, StoredNode};

/// One kind of collection member, as declared in the input tree
pub trait CollectionMember {
    const KIND: NodeKind;

    /// Parent -> child relation of the collection
    const RELATION: Relation;

    /// Natural key of an incoming item, unique within the collection
    fn key(&self) -> String;

    /// Natural key of an existing child
    fn stored_key(graph: &dyn Graph, node: &StoredNode) -> Result<String>;

    /// Create the child (or adopt a reusable existing node) and attach it
    fn create(&self, ctx: &mut SyncContext<'_>, parent: &NodeId) -> Result<NodeId>;

    /// Converge an existing child. Returns whether anything changed.
    fn update(&self, ctx: &mut SyncContext<'_>, parent: &NodeId, node: &StoredNode) -> Result<bool>;

    /// Remove a child the input no longer declares
    fn release(ctx: &mut SyncContext<'_>, parent: &NodeId, node: &StoredNode) -> Result<bool> {
        cleanup::release(ctx.graph, parent, &node.id, Self::RELATION)
    }
}

/// Existing children of a collection keyed by natural key
pub fn existing<M: CollectionMember>(graph: &dyn Graph, parent: &NodeId) -> Result<BTreeMap<String, StoredNode>> {
    let mut existing = BTreeMap::new();
    for node in resolver::children(graph, parent, M::RELATION)? {
        let key = M::stored_key(graph, &node)?;
        if existing.insert(key.clone(), node).is_some() {
            return Err(SyncError::inconsistent(
                M::KIND,
                key,
                format!("natural key appears twice under one {}", M::RELATION.from_kind()),
            ));
        }
    }
    Ok(existing)
}

/// Converge the `M` children of `parent` to `incoming`.
///
/// Returns whether anything was mutated.
pub fn reconcile<M: CollectionMember>(ctx: &mut SyncContext<'_>, parent: &NodeId, incoming: &[M]) -> Result<bool> {
    let mut seen = BTreeSet::new();
    for item in incoming {
        let key = item.key();
        if !seen.insert(key.clone()) {
            return Err(SyncError::conflict(
                M::KIND,
                key,
                "declared more than once in one collection",
            ));
        }
    }

    let mut existing = existing::<M>(ctx.read(), parent)?;
    let mut changed = false;

    for item in incoming {
        match existing.remove(&item.key()) {
            Some(node) => changed |= item.update(ctx, parent, &node)?,
            None => {
                item.create(ctx, parent)?;
                changed = true;
            }
        }
    }

    for node in existing.into_values() {
        changed |= M::release(ctx, parent, &node)?;
    }

    Ok(changed)
}

/// Attach a single new member, refusing one whose key already exists
pub fn add<M: CollectionMember>(ctx: &mut SyncContext<'_>, parent: &NodeId, item: &M) -> Result<NodeId> {
    let key = item.key();
    if existing::<M>(ctx.read(), parent)?.contains_key(&key) {
        return Err(SyncError::conflict(
            M::KIND,
            key,
            format!("already exists under this {}", M::RELATION.from_kind()),
        ));
    }
    item.create(ctx, parent)
}

/// Make `sources` exactly the set of nodes linked to `target` by `relation`.
///
/// Used for link sets that do not own their endpoints, such as project access
/// to a private flavor.
pub fn sync_sources(graph: &mut dyn Graph, target: &NodeId, relation: Relation, sources: &[NodeId]) -> Result<bool> {
    let current = graph.sources(target, relation)?;
    let mut changed = false;

    for source in sources {
        if !current.contains(source) {
            graph.connect(source, target, relation, None)?;
            changed = true;
        }
    }
    for source in current.iter().filter(|id| !sources.contains(id)) {
        changed |= graph.disconnect(source, target, relation)?;
    }
    Ok(changed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Project, record};
    use crate::storage::MemoryGraph;

    fn project(uuid: &str, name: &str) -> Project {
        Project {
            uuid: uuid.into(),
            name: name.into(),
            description: String::new(),
        }
    }

    fn setup(graph: &mut MemoryGraph) -> NodeId {
        graph
            .create_node(NodeKind::Provider, Default::default())
            .unwrap()
    }

    fn uuids(graph: &MemoryGraph, provider: &NodeId) -> Vec<String> {
        let mut uuids: Vec<String> = resolver::children(graph, provider, Relation::ProviderProject)
            .unwrap()
            .iter()
            .map(|n| record::decode::<Project>(n).unwrap().uuid)
            .collect();
        uuids.sort();
        uuids
    }

    #[test]
    fn test_reconcile_creates_updates_and_releases() {
        let mut graph = MemoryGraph::default();
        let provider = setup(&mut graph);
        {
            let mut ctx = SyncContext::new(&mut graph, provider.clone()).unwrap();
            let first = [project("p1", "alpha"), project("p2", "beta")];
            assert!(reconcile(&mut ctx, &provider, &first).unwrap());
            assert!(!reconcile(&mut ctx, &provider, &first).unwrap());

            let second = [project("p2", "gamma"), project("p3", "delta")];
            assert!(reconcile(&mut ctx, &provider, &second).unwrap());
        }
        assert_eq!(uuids(&graph, &provider), vec!["p2", "p3"]);
        assert_eq!(graph.count(NodeKind::Project), 2);
    }

    #[test]
    fn test_empty_collection_removes_everything() {
        let mut graph = MemoryGraph::default();
        let provider = setup(&mut graph);
        let mut ctx = SyncContext::new(&mut graph, provider.clone()).unwrap();
        reconcile(&mut ctx, &provider, &[project("p1", "alpha")]).unwrap();
        assert!(reconcile::<Project>(&mut ctx, &provider, &[]).unwrap());
        assert!(!reconcile::<Project>(&mut ctx, &provider, &[]).unwrap());
    }

    #[test]
    fn test_duplicate_incoming_keys_conflict() {
        let mut graph = MemoryGraph::default();
        let provider = setup(&mut graph);
        let mut ctx = SyncContext::new(&mut graph, provider.clone()).unwrap();
        let err = reconcile(
            &mut ctx,
            &provider,
            &[project("p1", "alpha"), project("p1", "beta")],
        )
        .unwrap_err();
        assert!(matches!(err, SyncError::Conflict { .. }));
    }

    #[test]
    fn test_add_refuses_existing_key() {
        let mut graph = MemoryGraph::default();
        let provider = setup(&mut graph);
        let mut ctx = SyncContext::new(&mut graph, provider.clone()).unwrap();
        add(&mut ctx, &provider, &project("p1", "alpha")).unwrap();
        assert!(matches!(
            add(&mut ctx, &provider, &project("p1", "beta")).unwrap_err(),
            SyncError::Conflict { .. }
        ));
    }

    #[test]
    fn test_sync_sources() {
        let mut graph = MemoryGraph::default();
        let flavor = graph.create_node(NodeKind::Flavor, Default::default()).unwrap();
        let p1 = graph.create_node(NodeKind::Project, Default::default()).unwrap();
        let p2 = graph.create_node(NodeKind::Project, Default::default()).unwrap();

        let rel = Relation::ProjectFlavor;
        assert!(sync_sources(&mut graph, &flavor, rel, &[p1.clone()]).unwrap());
        assert!(!sync_sources(&mut graph, &flavor, rel, &[p1.clone()]).unwrap());
        assert!(sync_sources(&mut graph, &flavor, rel, &[p2.clone()]).unwrap());
        assert_eq!(graph.sources(&flavor, rel).unwrap(), vec![p2]);
    }
}
