//! SLA reassignment
//!
//! A project is covered by at most one SLA. Declaring a user group's SLA for
//! a project moves the project onto that SLA, detaching it from whichever
//! SLA covered it before; an SLA left without projects is deleted.

use tracing::debug;

use super::cleanup;
use super::context::SyncContext;
use super::resolver;
use crate::error::{Result, SyncError};
use crate::input::SlaInput;
use crate::model::record;
use crate::storage::{NodeId, NodeKind, Relation};

/// Converge `group`'s SLA on the current provider to `input`.
///
/// Returns whether anything changed.
pub fn apply(ctx: &mut SyncContext<'_>, group: &NodeId, input: &SlaInput) -> Result<bool> {
    let doc_uuid = &input.attrs.doc_uuid;
    let project = ctx.project(&input.project)?;
    ctx.claim_sla(&input.project, doc_uuid)?;

    let mut changed = false;
    let sla = match resolver::find_sla(ctx.read(), doc_uuid)? {
        Some(node) => {
            let owner = resolver::sla_user_group(ctx.read(), &node.id)?;
            if &owner != group {
                return Err(SyncError::conflict(
                    NodeKind::Sla,
                    doc_uuid,
                    "already held by another user group",
                ));
            }
            changed |= record::patch(ctx.graph, &node, &input.attrs)?;
            node.id
        }
        None => {
            let id = record::create(ctx.graph, &input.attrs)?;
            ctx.graph.connect(group, &id, Relation::UserGroupSla, None)?;
            changed = true;
            id
        }
    };

    if ctx.graph.edge(&sla, &project, Relation::SlaProject)?.is_none() {
        ctx.graph.connect(&sla, &project, Relation::SlaProject, None)?;
        debug!("Linked SLA '{}' to project '{}'", doc_uuid, input.project);
        changed = true;
    }

    // The project leaves any previous SLA
    for previous in ctx.graph.sources(&project, Relation::SlaProject)? {
        if previous == sla {
            continue;
        }
        ctx.graph.disconnect(&previous, &project, Relation::SlaProject)?;
        cleanup::delete_if_orphaned(ctx.graph, &previous)?;
        debug!("Moved project '{}' off SLA {}", input.project, previous);
        changed = true;
    }

    // Within this provider the group holds only the declared link
    for other in ctx.graph.targets(group, Relation::UserGroupSla)? {
        if other != sla {
            changed |= detach_provider_projects(ctx, &other)?;
        }
    }

    Ok(changed)
}

/// Unlink an SLA from the current provider's projects, deleting it if no
/// project remains. Returns whether anything changed.
pub fn detach_provider_projects(ctx: &mut SyncContext<'_>, sla: &NodeId) -> Result<bool> {
    let mut changed = false;
    for project in ctx.graph.targets(sla, Relation::SlaProject)? {
        if ctx.owns_project(&project) {
            changed |= ctx.graph.disconnect(sla, &project, Relation::SlaProject)?;
        }
    }
    changed |= cleanup::delete_if_orphaned(ctx.graph, sla)?;
    Ok(changed)
}
