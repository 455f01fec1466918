//! Storage classes of a block storage service

use crate::error::Result;
use crate::model::{StorageClass, record};
use crate::storage::{Graph, NodeId, NodeKind, Relation, StoredNode};
use crate::sync::context::SyncContext;
use crate::sync::reconcile::CollectionMember;

impl CollectionMember for StorageClass {
    const KIND: NodeKind = NodeKind::StorageClass;
    const RELATION: Relation = Relation::ServiceStorageClass;

    fn key(&self) -> String {
        self.name.clone()
    }

    fn stored_key(_graph: &dyn Graph, node: &StoredNode) -> Result<String> {
        Ok(record::decode::<StorageClass>(node)?.name)
    }

    fn create(&self, ctx: &mut SyncContext<'_>, service: &NodeId) -> Result<NodeId> {
        let id = record::create(ctx.graph, self)?;
        ctx.graph.connect(service, &id, Self::RELATION, None)?;
        Ok(id)
    }

    fn update(&self, ctx: &mut SyncContext<'_>, _service: &NodeId, node: &StoredNode) -> Result<bool> {
        record::patch(ctx.graph, node, self)
    }
}
