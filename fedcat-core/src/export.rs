//! Read a provider subtree back in input-tree form
//!
//! The exported tree is canonical (collections sorted by natural key). For a
//! converged provider it equals the submitted tree after `canonicalize`.

use std::collections::HashMap;

use crate::error::{Result, SyncError};
use crate::input::{
    BlockStorageServiceInput, ComputeServiceInput, FlavorInput, IdentityProviderInput,
    IdentityServiceInput, ImageInput, NetworkInput, NetworkServiceInput, ObjectStoreServiceInput,
    ProviderInput, QuotaInput, RegionInput, ServiceEndpoint, ServiceInput, SlaInput,
    UserGroupInput,
};
use crate::model::{
    AuthMethod, IdentityProvider, Location, Project, Provider, Quota, QuotaLimits, Region, Service,
    ServiceType, SharedResource, Sla, StorageClass, UserGroup, record,
};
use crate::storage::{Graph, NodeId, NodeKind, Relation};
use crate::sync::resolver::{self, children};

/// Uuids of the provider's projects by node id
type ProjectUuids = HashMap<NodeId, String>;

fn project_uuid(uuids: &ProjectUuids, id: &NodeId, referrer: NodeKind) -> Result<String> {
    uuids.get(id).cloned().ok_or_else(|| {
        SyncError::inconsistent(referrer, id.as_str(), "references a project of another provider")
    })
}

pub fn export_provider(graph: &dyn Graph, provider: &NodeId) -> Result<ProviderInput> {
    let attrs: Provider = record::load(graph, provider)?;

    let mut projects = Vec::new();
    let mut uuids = ProjectUuids::new();
    for node in children(graph, provider, Relation::ProviderProject)? {
        let project: Project = record::decode(&node)?;
        uuids.insert(node.id, project.uuid.clone());
        projects.push(project);
    }

    let mut identity_providers = Vec::new();
    for node in children(graph, provider, Relation::ProviderIdentityProvider)? {
        let edge = graph.edge(provider, &node.id, Relation::ProviderIdentityProvider)?;
        let relationship: AuthMethod = match edge.and_then(|edge| edge.metadata) {
            Some(metadata) => serde_json::from_value(metadata)?,
            None => {
                return Err(SyncError::inconsistent(
                    NodeKind::IdentityProvider,
                    node.id.as_str(),
                    "provider edge carries no auth method",
                ));
            }
        };
        identity_providers.push(IdentityProviderInput {
            attrs: record::decode::<IdentityProvider>(&node)?,
            relationship,
            user_groups: export_user_groups(graph, &node.id, &uuids)?,
        });
    }

    let mut regions = Vec::new();
    for node in children(graph, provider, Relation::ProviderRegion)? {
        let location = children(graph, &node.id, Relation::RegionLocation)?
            .first()
            .map(record::decode::<Location>)
            .transpose()?;
        let services = children(graph, &node.id, Relation::RegionService)?
            .iter()
            .map(|service| export_service(graph, &service.id, &uuids))
            .collect::<Result<Vec<_>>>()?;
        regions.push(RegionInput {
            attrs: record::decode::<Region>(&node)?,
            location,
            services,
        });
    }

    let mut tree = ProviderInput {
        attrs,
        projects,
        identity_providers,
        regions,
    };
    tree.canonicalize();
    Ok(tree)
}

/// User groups holding an SLA on one of the provider's projects
fn export_user_groups(graph: &dyn Graph, idp: &NodeId, uuids: &ProjectUuids) -> Result<Vec<UserGroupInput>> {
    let mut groups = Vec::new();
    for group in children(graph, idp, Relation::IdentityProviderUserGroup)? {
        let mut links = Vec::new();
        for sla in children(graph, &group.id, Relation::UserGroupSla)? {
            for project in graph.targets(&sla.id, Relation::SlaProject)? {
                if let Some(uuid) = uuids.get(&project) {
                    links.push((record::decode::<Sla>(&sla)?, uuid.clone()));
                }
            }
        }
        if links.len() > 1 {
            return Err(SyncError::inconsistent(
                NodeKind::UserGroup,
                group.id.as_str(),
                format!("holds {} SLA links within one provider", links.len()),
            ));
        }
        if let Some((sla, project)) = links.pop() {
            groups.push(UserGroupInput {
                attrs: record::decode::<UserGroup>(&group)?,
                sla: SlaInput {
                    attrs: sla,
                    project,
                },
            });
        }
    }
    Ok(groups)
}

fn export_service(graph: &dyn Graph, id: &NodeId, uuids: &ProjectUuids) -> Result<ServiceInput> {
    let service: Service = record::load(graph, id)?;
    let base = ServiceEndpoint {
        endpoint: service.endpoint,
        name: service.name,
        description: service.description,
    };

    Ok(match service.service_type {
        ServiceType::BlockStorage => ServiceInput::BlockStorage(BlockStorageServiceInput {
            base,
            quotas: export_quotas(graph, id, uuids)?,
            storage_classes: children(graph, id, Relation::ServiceStorageClass)?
                .iter()
                .map(record::decode::<StorageClass>)
                .collect::<Result<_>>()?,
        }),
        ServiceType::Compute => ServiceInput::Compute(ComputeServiceInput {
            base,
            quotas: export_quotas(graph, id, uuids)?,
            flavors: export_resources(graph, id, Relation::ServiceFlavor, Relation::ProjectFlavor, uuids)?
                .into_iter()
                .map(|(attrs, projects)| FlavorInput { attrs, projects })
                .collect(),
            images: export_resources(graph, id, Relation::ServiceImage, Relation::ProjectImage, uuids)?
                .into_iter()
                .map(|(attrs, projects)| ImageInput { attrs, projects })
                .collect(),
        }),
        ServiceType::Identity => ServiceInput::Identity(IdentityServiceInput { base }),
        ServiceType::Network => ServiceInput::Network(NetworkServiceInput {
            base,
            quotas: export_quotas(graph, id, uuids)?,
            networks: export_resources(graph, id, Relation::ServiceNetwork, Relation::ProjectNetwork, uuids)?
                .into_iter()
                .map(|(attrs, projects)| NetworkInput { attrs, projects })
                .collect(),
        }),
        ServiceType::ObjectStore => ServiceInput::ObjectStore(ObjectStoreServiceInput {
            base,
            quotas: export_quotas(graph, id, uuids)?,
        }),
    })
}

fn export_quotas<L>(graph: &dyn Graph, service: &NodeId, uuids: &ProjectUuids) -> Result<Vec<QuotaInput<L>>>
where
    L: TryFrom<QuotaLimits, Error = ServiceType>,
{
    let mut quotas = Vec::new();
    for node in children(graph, service, Relation::ServiceQuota)? {
        let quota: Quota = record::decode(&node)?;
        let project = resolver::quota_project(graph, &node.id)?;
        let limits = L::try_from(quota.limits).map_err(|actual| {
            SyncError::inconsistent(
                NodeKind::Quota,
                node.id.as_str(),
                format!("{actual} limits attached to another kind of service"),
            )
        })?;
        quotas.push(QuotaInput {
            mode: quota.mode,
            description: quota.description,
            project: project_uuid(uuids, &project, NodeKind::Quota)?,
            limits,
        });
    }
    Ok(quotas)
}

fn export_resources<R: SharedResource>(
    graph: &dyn Graph,
    service: &NodeId,
    relation: Relation,
    access: Relation,
    uuids: &ProjectUuids,
) -> Result<Vec<(R, Vec<String>)>> {
    let mut resources = Vec::new();
    for node in children(graph, service, relation)? {
        let attrs: R = record::decode(&node)?;
        let projects = graph
            .sources(&node.id, access)?
            .iter()
            .map(|project| project_uuid(uuids, project, R::KIND))
            .collect::<Result<Vec<_>>>()?;
        resources.push((attrs, projects));
    }
    Ok(resources)
}
