//! Directed relations between catalog nodes

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;

use super::node::NodeKind;
use crate::storage::ids::NodeId;

/// Label of a directed edge
///
/// Every relation has one source kind and one target kind. Edges always point
/// from the owner (or grantor) to the child.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    ProviderProject,
    ProviderRegion,
    /// Carries the auth method (`idp_name`, `protocol`) as metadata
    ProviderIdentityProvider,
    IdentityProviderUserGroup,
    UserGroupSla,
    SlaProject,
    RegionLocation,
    RegionService,
    ServiceQuota,
    ProjectQuota,
    ServiceFlavor,
    ServiceImage,
    ServiceNetwork,
    ServiceStorageClass,
    /// Access grant of a private flavor
    ProjectFlavor,
    ProjectImage,
    ProjectNetwork,
}

impl Relation {
    pub const ALL: [Relation; 17] = [
        Relation::ProviderProject,
        Relation::ProviderRegion,
        Relation::ProviderIdentityProvider,
        Relation::IdentityProviderUserGroup,
        Relation::UserGroupSla,
        Relation::SlaProject,
        Relation::RegionLocation,
        Relation::RegionService,
        Relation::ServiceQuota,
        Relation::ProjectQuota,
        Relation::ServiceFlavor,
        Relation::ServiceImage,
        Relation::ServiceNetwork,
        Relation::ServiceStorageClass,
        Relation::ProjectFlavor,
        Relation::ProjectImage,
        Relation::ProjectNetwork,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Relation::ProviderProject => "provider_project",
            Relation::ProviderRegion => "provider_region",
            Relation::ProviderIdentityProvider => "provider_identity_provider",
            Relation::IdentityProviderUserGroup => "identity_provider_user_group",
            Relation::UserGroupSla => "user_group_sla",
            Relation::SlaProject => "sla_project",
            Relation::RegionLocation => "region_location",
            Relation::RegionService => "region_service",
            Relation::ServiceQuota => "service_quota",
            Relation::ProjectQuota => "project_quota",
            Relation::ServiceFlavor => "service_flavor",
            Relation::ServiceImage => "service_image",
            Relation::ServiceNetwork => "service_network",
            Relation::ServiceStorageClass => "service_storage_class",
            Relation::ProjectFlavor => "project_flavor",
            Relation::ProjectImage => "project_image",
            Relation::ProjectNetwork => "project_network",
        }
    }

    /// Kind of the edge's source node
    pub fn from_kind(&self) -> NodeKind {
        match self {
            Relation::ProviderProject
            | Relation::ProviderRegion
            | Relation::ProviderIdentityProvider => NodeKind::Provider,
            Relation::IdentityProviderUserGroup => NodeKind::IdentityProvider,
            Relation::UserGroupSla => NodeKind::UserGroup,
            Relation::SlaProject => NodeKind::Sla,
            Relation::RegionLocation | Relation::RegionService => NodeKind::Region,
            Relation::ServiceQuota
            | Relation::ServiceFlavor
            | Relation::ServiceImage
            | Relation::ServiceNetwork
            | Relation::ServiceStorageClass => NodeKind::Service,
            Relation::ProjectQuota
            | Relation::ProjectFlavor
            | Relation::ProjectImage
            | Relation::ProjectNetwork => NodeKind::Project,
        }
    }

    /// Kind of the edge's target node
    pub fn to_kind(&self) -> NodeKind {
        match self {
            Relation::ProviderProject | Relation::SlaProject => NodeKind::Project,
            Relation::ProviderRegion => NodeKind::Region,
            Relation::ProviderIdentityProvider => NodeKind::IdentityProvider,
            Relation::IdentityProviderUserGroup => NodeKind::UserGroup,
            Relation::UserGroupSla => NodeKind::Sla,
            Relation::RegionLocation => NodeKind::Location,
            Relation::RegionService => NodeKind::Service,
            Relation::ServiceQuota | Relation::ProjectQuota => NodeKind::Quota,
            Relation::ServiceFlavor | Relation::ProjectFlavor => NodeKind::Flavor,
            Relation::ServiceImage | Relation::ProjectImage => NodeKind::Image,
            Relation::ServiceNetwork | Relation::ProjectNetwork => NodeKind::Network,
            Relation::ServiceStorageClass => NodeKind::StorageClass,
        }
    }
}

impl std::fmt::Display for Relation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Relation {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Relation::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| anyhow::anyhow!("unknown relation: {s}"))
    }
}

/// A stored edge
#[derive(Clone, Debug, PartialEq)]
pub struct Edge {
    pub from_id: NodeId,
    pub to_id: NodeId,
    pub relation: Relation,
    pub metadata: Option<Value>,
    pub created_at: i64,
}
