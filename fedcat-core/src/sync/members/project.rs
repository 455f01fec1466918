//! Projects of a provider

use crate::error::Result;
use crate::model::{Project, record};
use crate::storage::{Graph, NodeId, NodeKind, Relation, StoredNode};
use crate::sync::context::SyncContext;
use crate::sync::reconcile::CollectionMember;

impl CollectionMember for Project {
    const KIND: NodeKind = NodeKind::Project;
    const RELATION: Relation = Relation::ProviderProject;

    fn key(&self) -> String {
        self.uuid.clone()
    }

    fn stored_key(_graph: &dyn Graph, node: &StoredNode) -> Result<String> {
        Ok(record::decode::<Project>(node)?.uuid)
    }

    fn create(&self, ctx: &mut SyncContext<'_>, provider: &NodeId) -> Result<NodeId> {
        let id = record::create(ctx.graph, self)?;
        ctx.graph.connect(provider, &id, Self::RELATION, None)?;
        Ok(id)
    }

    fn update(&self, ctx: &mut SyncContext<'_>, _provider: &NodeId, node: &StoredNode) -> Result<bool> {
        record::patch(ctx.graph, node, self)
    }
}
