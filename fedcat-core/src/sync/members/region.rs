//! Regions, their location and their services

use serde_json::json;

use crate::error::{Result, SyncError};
use crate::input::{RegionInput, ServiceInput};
use crate::model::{Location, NodeRecord, Region, Service, record};
use crate::storage::{Graph, NodeId, NodeKind, Relation, StoredNode};
use crate::sync::cleanup;
use crate::sync::context::SyncContext;
use crate::sync::reconcile::{CollectionMember, reconcile};
use crate::sync::resolver;

impl CollectionMember for RegionInput {
    const KIND: NodeKind = NodeKind::Region;
    const RELATION: Relation = Relation::ProviderRegion;

    fn key(&self) -> String {
        self.attrs.name.clone()
    }

    fn stored_key(_graph: &dyn Graph, node: &StoredNode) -> Result<String> {
        Ok(record::decode::<Region>(node)?.name)
    }

    fn create(&self, ctx: &mut SyncContext<'_>, provider: &NodeId) -> Result<NodeId> {
        let id = record::create(ctx.graph, &self.attrs)?;
        ctx.graph.connect(provider, &id, Self::RELATION, None)?;
        sync_location(ctx, &id, self.location.as_ref())?;
        reconcile(ctx, &id, &self.services)?;
        Ok(id)
    }

    fn update(&self, ctx: &mut SyncContext<'_>, _provider: &NodeId, node: &StoredNode) -> Result<bool> {
        let mut changed = record::patch(ctx.graph, node, &self.attrs)?;
        changed |= sync_location(ctx, &node.id, self.location.as_ref())?;
        changed |= reconcile(ctx, &node.id, &self.services)?;
        Ok(changed)
    }
}

/// Converge a region's single optional location.
///
/// Locations are shared by site: moving a region to another site releases
/// the old location (deleted once no region uses it) and attaches the
/// location with the new site, creating it if no region uses it yet.
pub fn sync_location(ctx: &mut SyncContext<'_>, region: &NodeId, incoming: Option<&Location>) -> Result<bool> {
    let mut current = resolver::children(ctx.read(), region, Relation::RegionLocation)?;
    if current.len() > 1 {
        return Err(SyncError::inconsistent(
            NodeKind::Region,
            region.as_str(),
            format!("linked to {} locations", current.len()),
        ));
    }

    match (current.pop(), incoming) {
        (None, None) => Ok(false),
        (Some(node), None) => cleanup::release(ctx.graph, region, &node.id, Relation::RegionLocation),
        (Some(node), Some(location)) if node.prop("site") == Some(&json!(location.site)) => {
            converge_location(ctx, &node, location)
        }
        (current, Some(location)) => {
            if let Some(node) = current {
                cleanup::release(ctx.graph, region, &node.id, Relation::RegionLocation)?;
            }
            let id = match resolver::find_location(ctx.read(), &location.site)? {
                Some(node) => {
                    converge_location(ctx, &node, location)?;
                    node.id
                }
                None => {
                    let id = record::create(ctx.graph, location)?;
                    ctx.declare(NodeKind::Location, &location.site, &id, record::to_props(location)?)?;
                    id
                }
            };
            ctx.graph.connect(region, &id, Relation::RegionLocation, None)?;
            Ok(true)
        }
    }
}

/// Patch an existing location, once per run.
///
/// Every region of the tree naming the site must declare the same
/// attributes. A location also used by another provider's regions is not
/// patched: differing attributes are a conflict.
fn converge_location(ctx: &mut SyncContext<'_>, node: &StoredNode, location: &Location) -> Result<bool> {
    if !ctx.declare(NodeKind::Location, &location.site, &node.id, record::to_props(location)?)? {
        return Ok(false);
    }

    let mut shared = false;
    for region in ctx.graph.sources(&node.id, Relation::RegionLocation)? {
        if &resolver::region_provider(ctx.read(), &region)? != ctx.provider() {
            shared = true;
            break;
        }
    }
    if !shared {
        return record::patch(ctx.graph, node, location);
    }

    let differing = record::differing_fields(node, location)?;
    if differing.is_empty() {
        return Ok(false);
    }
    Err(SyncError::conflict(
        NodeKind::Location,
        &location.site,
        format!(
            "shared with other providers but declared with different {}",
            differing.join(", ")
        ),
    ))
}

impl CollectionMember for ServiceInput {
    const KIND: NodeKind = NodeKind::Service;
    const RELATION: Relation = Relation::RegionService;

    fn key(&self) -> String {
        self.record().natural_key()
    }

    fn stored_key(_graph: &dyn Graph, node: &StoredNode) -> Result<String> {
        Ok(record::decode::<Service>(node)?.natural_key())
    }

    fn create(&self, ctx: &mut SyncContext<'_>, region: &NodeId) -> Result<NodeId> {
        let id = record::create(ctx.graph, &self.record())?;
        ctx.graph.connect(region, &id, Self::RELATION, None)?;
        self.sync_children(ctx, &id)?;
        Ok(id)
    }

    fn update(&self, ctx: &mut SyncContext<'_>, _region: &NodeId, node: &StoredNode) -> Result<bool> {
        let mut changed = record::patch(ctx.graph, node, &self.record())?;
        changed |= self.sync_children(ctx, &node.id)?;
        Ok(changed)
    }
}

impl ServiceInput {
    /// Reconcile the collections this kind of service owns
    fn sync_children(&self, ctx: &mut SyncContext<'_>, service: &NodeId) -> Result<bool> {
        let mut changed = reconcile(ctx, service, &self.quotas())?;
        match self {
            ServiceInput::BlockStorage(s) => {
                changed |= reconcile(ctx, service, &s.storage_classes)?;
            }
            ServiceInput::Compute(s) => {
                changed |= reconcile(ctx, service, &s.flavors)?;
                changed |= reconcile(ctx, service, &s.images)?;
            }
            ServiceInput::Network(s) => {
                changed |= reconcile(ctx, service, &s.networks)?;
            }
            ServiceInput::Identity(_) | ServiceInput::ObjectStore(_) => {}
        }
        Ok(changed)
    }
}
