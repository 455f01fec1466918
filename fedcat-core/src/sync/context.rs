//! State threaded through one provider reconciliation

use std::collections::{BTreeMap, HashMap};

use crate::error::{Result, SyncError};
use crate::model::Project;
use crate::model::record;
use crate::storage::{Graph, NodeId, NodeKind, Props, Relation};

/// Graph handle plus the provider scope of the current run.
///
/// Every handler receives the context explicitly; nothing is looked up from
/// global state.
pub struct SyncContext<'g> {
    pub graph: &'g mut dyn Graph,
    provider: NodeId,
    /// The provider's projects by uuid
    projects: BTreeMap<String, NodeId>,
    /// doc_uuid claimed for each project in this run
    sla_claims: HashMap<String, String>,
    /// What this run declared for nodes the tree can reach more than once
    declared: HashMap<NodeId, Props>,
}

impl<'g> SyncContext<'g> {
    /// Context scoped to `provider`, with its project pool loaded
    pub fn new(graph: &'g mut dyn Graph, provider: NodeId) -> Result<Self> {
        let mut ctx = Self {
            graph,
            provider,
            projects: BTreeMap::new(),
            sla_claims: HashMap::new(),
            declared: HashMap::new(),
        };
        ctx.load_projects()?;
        Ok(ctx)
    }

    pub fn provider(&self) -> &NodeId {
        &self.provider
    }

    pub fn read(&self) -> &dyn Graph {
        &*self.graph
    }

    /// Refresh the project pool from the graph
    pub fn load_projects(&mut self) -> Result<()> {
        self.projects.clear();
        for id in self.graph.targets(&self.provider, Relation::ProviderProject)? {
            let project: Project = record::load(&*self.graph, &id)?;
            if self.projects.insert(project.uuid.clone(), id).is_some() {
                return Err(SyncError::inconsistent(
                    NodeKind::Project,
                    project.uuid,
                    "uuid appears twice under one provider",
                ));
            }
        }
        Ok(())
    }

    /// Node of one of the provider's projects
    pub fn project(&self, uuid: &str) -> Result<NodeId> {
        self.projects
            .get(uuid)
            .cloned()
            .ok_or_else(|| SyncError::not_found(NodeKind::Project, uuid))
    }

    /// Nodes of several projects; any uuid outside the pool is an error
    pub fn projects(&self, uuids: &[String]) -> Result<Vec<NodeId>> {
        uuids.iter().map(|uuid| self.project(uuid)).collect()
    }

    /// Uuid of a project node, if it belongs to the provider
    pub fn project_uuid(&self, id: &NodeId) -> Option<&str> {
        self.projects
            .iter()
            .find(|(_, node)| *node == id)
            .map(|(uuid, _)| uuid.as_str())
    }

    pub fn owns_project(&self, id: &NodeId) -> bool {
        self.project_uuid(id).is_some()
    }

    /// Record that `doc_uuid` governs `project` in this run.
    ///
    /// A project can only be covered by one SLA, so a second, different claim
    /// is a conflict.
    pub fn claim_sla(&mut self, project: &str, doc_uuid: &str) -> Result<()> {
        match self.sla_claims.get(project) {
            Some(claimed) if claimed != doc_uuid => Err(SyncError::conflict(
                NodeKind::Project,
                project,
                format!("claimed by SLAs '{claimed}' and '{doc_uuid}'"),
            )),
            Some(_) => Ok(()),
            None => {
                self.sla_claims
                    .insert(project.to_string(), doc_uuid.to_string());
                Ok(())
            }
        }
    }

    /// Record what the tree declares for `id`, a node reachable from several
    /// places of one tree (a location or a resource of several services).
    ///
    /// Returns true for the first declaration in this run; the caller then
    /// converges the node. Later declarations must repeat the first exactly.
    pub fn declare(&mut self, kind: NodeKind, key: &str, id: &NodeId, declared: Props) -> Result<bool> {
        if !self.declared.contains_key(id) {
            self.declared.insert(id.clone(), declared);
            return Ok(true);
        }
        let first = &self.declared[id];

        let mut differing: Vec<&str> = first
            .iter()
            .filter(|(name, value)| declared.get(name.as_str()) != Some(*value))
            .map(|(name, _)| name.as_str())
            .collect();
        differing.extend(
            declared
                .keys()
                .filter(|name| !first.contains_key(name.as_str()))
                .map(String::as_str),
        );
        if differing.is_empty() {
            return Ok(false);
        }
        Err(SyncError::conflict(
            kind,
            key,
            format!("declared more than once with different {}", differing.join(", ")),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryGraph;

    fn provider_with_project(graph: &mut MemoryGraph) -> (NodeId, NodeId) {
        let provider = graph
            .create_node(NodeKind::Provider, Default::default())
            .unwrap();
        let project = record::create(
            graph,
            &Project {
                uuid: "p1".into(),
                name: "alpha".into(),
                description: String::new(),
            },
        )
        .unwrap();
        graph
            .connect(&provider, &project, Relation::ProviderProject, None)
            .unwrap();
        (provider, project)
    }

    #[test]
    fn test_project_pool() {
        let mut graph = MemoryGraph::default();
        let (provider, project) = provider_with_project(&mut graph);
        let ctx = SyncContext::new(&mut graph, provider).unwrap();

        assert_eq!(ctx.project("p1").unwrap(), project);
        assert_eq!(ctx.project_uuid(&project), Some("p1"));
        assert!(matches!(
            ctx.projects(&["p1".into(), "p2".into()]).unwrap_err(),
            SyncError::NotFound { .. }
        ));
    }

    #[test]
    fn test_conflicting_sla_claims() {
        let mut graph = MemoryGraph::default();
        let (provider, _) = provider_with_project(&mut graph);
        let mut ctx = SyncContext::new(&mut graph, provider).unwrap();

        ctx.claim_sla("p1", "doc-a").unwrap();
        ctx.claim_sla("p1", "doc-a").unwrap();
        assert!(matches!(
            ctx.claim_sla("p1", "doc-b").unwrap_err(),
            SyncError::Conflict { .. }
        ));
    }

    #[test]
    fn test_repeated_declarations() {
        let mut graph = MemoryGraph::default();
        let (provider, _) = provider_with_project(&mut graph);
        let mut ctx = SyncContext::new(&mut graph, provider).unwrap();
        let node = NodeId::new();
        let italy = Props::from_iter([("country".to_string(), serde_json::json!("Italy"))]);
        let spain = Props::from_iter([("country".to_string(), serde_json::json!("Spain"))]);

        assert!(ctx.declare(NodeKind::Location, "bari", &node, italy.clone()).unwrap());
        assert!(!ctx.declare(NodeKind::Location, "bari", &node, italy.clone()).unwrap());
        match ctx.declare(NodeKind::Location, "bari", &node, spain).unwrap_err() {
            SyncError::Conflict { reason, .. } => assert!(reason.contains("country")),
            other => panic!("expected a conflict, got {other:?}"),
        }
        assert!(ctx.declare(NodeKind::Location, "pisa", &NodeId::new(), italy).unwrap());
    }
}
