//! Flavors, images and networks of a service
//!
//! A resource uuid is only unique within one provider. Creating a resource
//! first looks for the same uuid among the provider's other services and
//! reuses that node, so a flavor offered by two regions of one provider is
//! one node with two service edges, and both services must then declare it
//! identically. The same uuid under another provider is a different node.

use serde_json::json;

use crate::error::{Result, SyncError};
use crate::input::{FlavorInput, ImageInput, NetworkInput};
use crate::model::{Flavor, Image, Network, SharedResource, record};
use crate::storage::{Graph, NodeId, NodeKind, Props, Relation, StoredNode};
use crate::sync::context::SyncContext;
use crate::sync::reconcile::{CollectionMember, sync_sources};
use crate::sync::resolver;

/// Projects granted access: none for shared resources, the listed ones
/// (which must all belong to the provider) for private ones
fn access_list<R: SharedResource>(ctx: &SyncContext<'_>, attrs: &R, projects: &[String]) -> Result<Vec<NodeId>> {
    if attrs.is_shared() {
        if !projects.is_empty() {
            return Err(SyncError::conflict(
                R::KIND,
                attrs.uuid(),
                "shared resources cannot be restricted to projects",
            ));
        }
        return Ok(Vec::new());
    }
    ctx.projects(projects)
}

fn project_relation<R: SharedResource>() -> Result<Relation> {
    resolver::project_relation(R::KIND)
        .ok_or_else(|| SyncError::inconsistent(R::KIND, "", "kind has no project access relation"))
}

/// The node's attributes plus its sorted access list, as one declaration
fn declaration<R: SharedResource>(attrs: &R, projects: &[String]) -> Result<Props> {
    let mut props = record::to_props(attrs)?;
    let mut projects = projects.to_vec();
    projects.sort();
    props.insert("projects".into(), json!(projects));
    Ok(props)
}

/// Patch attributes and access list, unless another service of this tree
/// already did so for the same node.
fn converge_resource<R: SharedResource>(
    ctx: &mut SyncContext<'_>,
    node: &StoredNode,
    attrs: &R,
    projects: &[String],
    grants: &[NodeId],
) -> Result<bool> {
    if !ctx.declare(R::KIND, attrs.uuid(), &node.id, declaration(attrs, projects)?)? {
        return Ok(false);
    }
    let mut changed = record::patch(ctx.graph, node, attrs)?;
    changed |= sync_sources(ctx.graph, &node.id, project_relation::<R>()?, grants)?;
    Ok(changed)
}

fn create_resource<R: SharedResource>(
    ctx: &mut SyncContext<'_>,
    service: &NodeId,
    service_relation: Relation,
    attrs: &R,
    projects: &[String],
) -> Result<NodeId> {
    let grants = access_list(ctx, attrs, projects)?;
    let reusable = resolver::resolve_same_owner(ctx.read(), R::KIND, attrs.uuid(), ctx.provider())?;

    let id = match reusable {
        Some(node) => {
            converge_resource(ctx, &node, attrs, projects, &grants)?;
            node.id
        }
        None => {
            let id = record::create(ctx.graph, attrs)?;
            ctx.declare(R::KIND, attrs.uuid(), &id, declaration(attrs, projects)?)?;
            sync_sources(ctx.graph, &id, project_relation::<R>()?, &grants)?;
            id
        }
    };
    ctx.graph.connect(service, &id, service_relation, None)?;
    Ok(id)
}

fn update_resource<R: SharedResource>(
    ctx: &mut SyncContext<'_>,
    node: &StoredNode,
    attrs: &R,
    projects: &[String],
) -> Result<bool> {
    let grants = access_list(ctx, attrs, projects)?;
    converge_resource(ctx, node, attrs, projects, &grants)
}

macro_rules! resource_member {
    ($input:ty, $record:ty, $kind:expr, $relation:expr) => {
        impl CollectionMember for $input {
            const KIND: NodeKind = $kind;
            const RELATION: Relation = $relation;

            fn key(&self) -> String {
                self.attrs.uuid.clone()
            }

            fn stored_key(_graph: &dyn Graph, node: &StoredNode) -> Result<String> {
                Ok(record::decode::<$record>(node)?.uuid)
            }

            fn create(&self, ctx: &mut SyncContext<'_>, service: &NodeId) -> Result<NodeId> {
                create_resource(ctx, service, Self::RELATION, &self.attrs, &self.projects)
            }

            fn update(&self, ctx: &mut SyncContext<'_>, _service: &NodeId, node: &StoredNode) -> Result<bool> {
                update_resource(ctx, node, &self.attrs, &self.projects)
            }
        }
    };
}

resource_member!(FlavorInput, Flavor, NodeKind::Flavor, Relation::ServiceFlavor);
resource_member!(ImageInput, Image, NodeKind::Image, Relation::ServiceImage);
resource_member!(NetworkInput, Network, NodeKind::Network, Relation::ServiceNetwork);
