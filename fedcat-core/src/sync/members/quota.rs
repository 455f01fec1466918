//! Quotas of a service
//!
//! A quota hangs off both its service and its project. At most one quota may
//! exist per (project, service, usage mode).

use crate::error::{Result, SyncError};
use crate::input::QuotaDraft;
use crate::model::{Project, Quota, Service, UsageMode, record};
use crate::storage::{Graph, NodeId, NodeKind, Relation, StoredNode};
use crate::sync::context::SyncContext;
use crate::sync::reconcile::CollectionMember;
use crate::sync::resolver;

fn quota_key(project: &str, mode: UsageMode) -> String {
    format!("{project}/{mode}")
}

impl CollectionMember for QuotaDraft {
    const KIND: NodeKind = NodeKind::Quota;
    const RELATION: Relation = Relation::ServiceQuota;

    fn key(&self) -> String {
        quota_key(&self.project, self.quota.mode)
    }

    fn stored_key(graph: &dyn Graph, node: &StoredNode) -> Result<String> {
        let quota: Quota = record::decode(node)?;
        let project: Project = record::load(graph, &resolver::quota_project(graph, &node.id)?)?;
        Ok(quota_key(&project.uuid, quota.mode))
    }

    fn create(&self, ctx: &mut SyncContext<'_>, service: &NodeId) -> Result<NodeId> {
        let service_record: Service = record::load(ctx.read(), service)?;
        let quota_type = self.quota.limits.service_type();
        if quota_type != service_record.service_type {
            return Err(SyncError::conflict(
                NodeKind::Quota,
                self.key(),
                format!(
                    "{quota_type} quota cannot be attached to {} service",
                    service_record.service_type
                ),
            ));
        }

        let project = ctx.project(&self.project)?;
        for existing in ctx.graph.targets(&project, Relation::ProjectQuota)? {
            if ctx.graph.edge(service, &existing, Relation::ServiceQuota)?.is_none() {
                continue;
            }
            let quota: Quota = record::load(ctx.read(), &existing)?;
            if quota.mode == self.quota.mode {
                return Err(SyncError::conflict(
                    NodeKind::Quota,
                    self.key(),
                    "project already has a quota of this usage mode on the service",
                ));
            }
        }

        let id = record::create(ctx.graph, &self.quota)?;
        ctx.graph.connect(service, &id, Relation::ServiceQuota, None)?;
        ctx.graph.connect(&project, &id, Relation::ProjectQuota, None)?;
        Ok(id)
    }

    fn update(&self, ctx: &mut SyncContext<'_>, _service: &NodeId, node: &StoredNode) -> Result<bool> {
        record::patch(ctx.graph, node, &self.quota)
    }
}
