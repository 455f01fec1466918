//! Desired-state input tree
//!
//! A provider description as submitted by a client, already validated field
//! by field. References to other entities use natural keys: a quota, an SLA or
//! a private resource names its projects by uuid, and those uuids must belong
//! to the provider's own `projects`.

use serde::{Deserialize, Serialize};

use crate::model::{
    AuthMethod, BlockStorageLimits, ComputeLimits, Flavor, IdentityProvider, Image, Location,
    Network, NetworkLimits, ObjectStoreLimits, Project, Provider, Quota, QuotaLimits, Region, Sla,
    StorageClass, UsageMode, UserGroup,
};
use crate::model::{Service, ServiceType};

/// Root of the input tree
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProviderInput {
    #[serde(flatten)]
    pub attrs: Provider,
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub identity_providers: Vec<IdentityProviderInput>,
    #[serde(default)]
    pub regions: Vec<RegionInput>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IdentityProviderInput {
    #[serde(flatten)]
    pub attrs: IdentityProvider,
    /// Per-provider auth configuration, kept on the provider edge
    pub relationship: AuthMethod,
    #[serde(default)]
    pub user_groups: Vec<UserGroupInput>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserGroupInput {
    #[serde(flatten)]
    pub attrs: UserGroup,
    pub sla: SlaInput,
}

/// The SLA a user group holds on one of the provider's projects
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SlaInput {
    #[serde(flatten)]
    pub attrs: Sla,
    /// Project uuid
    pub project: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RegionInput {
    #[serde(flatten)]
    pub attrs: Region,
    #[serde(default)]
    pub location: Option<Location>,
    #[serde(default)]
    pub services: Vec<ServiceInput>,
}

/// Attributes common to every service variant
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ServiceEndpoint {
    pub endpoint: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// A region's service, tagged by `type`.
///
/// Each variant carries only the collections its kind of service can own.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ServiceInput {
    BlockStorage(BlockStorageServiceInput),
    Compute(ComputeServiceInput),
    Identity(IdentityServiceInput),
    Network(NetworkServiceInput),
    ObjectStore(ObjectStoreServiceInput),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BlockStorageServiceInput {
    #[serde(flatten)]
    pub base: ServiceEndpoint,
    #[serde(default)]
    pub quotas: Vec<QuotaInput<BlockStorageLimits>>,
    #[serde(default)]
    pub storage_classes: Vec<StorageClass>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ComputeServiceInput {
    #[serde(flatten)]
    pub base: ServiceEndpoint,
    #[serde(default)]
    pub quotas: Vec<QuotaInput<ComputeLimits>>,
    #[serde(default)]
    pub flavors: Vec<FlavorInput>,
    #[serde(default)]
    pub images: Vec<ImageInput>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IdentityServiceInput {
    #[serde(flatten)]
    pub base: ServiceEndpoint,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NetworkServiceInput {
    #[serde(flatten)]
    pub base: ServiceEndpoint,
    #[serde(default)]
    pub quotas: Vec<QuotaInput<NetworkLimits>>,
    #[serde(default)]
    pub networks: Vec<NetworkInput>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ObjectStoreServiceInput {
    #[serde(flatten)]
    pub base: ServiceEndpoint,
    #[serde(default)]
    pub quotas: Vec<QuotaInput<ObjectStoreLimits>>,
}

impl ServiceInput {
    pub fn service_type(&self) -> ServiceType {
        match self {
            ServiceInput::BlockStorage(_) => ServiceType::BlockStorage,
            ServiceInput::Compute(_) => ServiceType::Compute,
            ServiceInput::Identity(_) => ServiceType::Identity,
            ServiceInput::Network(_) => ServiceType::Network,
            ServiceInput::ObjectStore(_) => ServiceType::ObjectStore,
        }
    }

    pub fn base(&self) -> &ServiceEndpoint {
        match self {
            ServiceInput::BlockStorage(s) => &s.base,
            ServiceInput::Compute(s) => &s.base,
            ServiceInput::Identity(s) => &s.base,
            ServiceInput::Network(s) => &s.base,
            ServiceInput::ObjectStore(s) => &s.base,
        }
    }

    /// The stored service record
    pub fn record(&self) -> Service {
        let base = self.base();
        Service {
            service_type: self.service_type(),
            endpoint: base.endpoint.clone(),
            name: base.name.clone(),
            description: base.description.clone(),
        }
    }

    /// The service's quotas with their limits type-erased
    pub fn quotas(&self) -> Vec<QuotaDraft> {
        fn drafts<L: Clone + Into<QuotaLimits>>(quotas: &[QuotaInput<L>]) -> Vec<QuotaDraft> {
            quotas.iter().cloned().map(QuotaDraft::from).collect()
        }

        match self {
            ServiceInput::BlockStorage(s) => drafts(&s.quotas),
            ServiceInput::Compute(s) => drafts(&s.quotas),
            ServiceInput::Network(s) => drafts(&s.quotas),
            ServiceInput::ObjectStore(s) => drafts(&s.quotas),
            ServiceInput::Identity(_) => Vec::new(),
        }
    }
}

/// A quota with limits of type `L`, for the project with uuid `project`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuotaInput<L> {
    #[serde(flatten)]
    pub mode: UsageMode,
    #[serde(default)]
    pub description: String,
    pub project: String,
    #[serde(flatten)]
    pub limits: L,
}

/// A quota of any service kind, ready to reconcile
#[derive(Clone, Debug, PartialEq)]
pub struct QuotaDraft {
    pub quota: Quota,
    /// Project uuid
    pub project: String,
}

impl<L: Into<QuotaLimits>> From<QuotaInput<L>> for QuotaDraft {
    fn from(input: QuotaInput<L>) -> Self {
        QuotaDraft {
            quota: Quota {
                mode: input.mode,
                description: input.description,
                limits: input.limits.into(),
            },
            project: input.project,
        }
    }
}

/// A flavor and, when private, the projects allowed to use it
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FlavorInput {
    #[serde(flatten)]
    pub attrs: Flavor,
    #[serde(default)]
    pub projects: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImageInput {
    #[serde(flatten)]
    pub attrs: Image,
    #[serde(default)]
    pub projects: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NetworkInput {
    #[serde(flatten)]
    pub attrs: Network,
    #[serde(default)]
    pub projects: Vec<String>,
}

// ============================================================================
// Canonical ordering
// ============================================================================

impl ProviderInput {
    /// Sort every collection by natural key.
    ///
    /// Collections have set semantics; two trees describing the same state
    /// compare equal once both are canonical.
    pub fn canonicalize(&mut self) {
        self.projects.sort_by(|a, b| a.uuid.cmp(&b.uuid));
        self.identity_providers
            .sort_by(|a, b| a.attrs.endpoint.cmp(&b.attrs.endpoint));
        for idp in &mut self.identity_providers {
            idp.user_groups.sort_by(|a, b| a.attrs.name.cmp(&b.attrs.name));
        }
        self.regions.sort_by(|a, b| a.attrs.name.cmp(&b.attrs.name));
        for region in &mut self.regions {
            region.services.sort_by(|a, b| {
                (a.service_type(), &a.base().endpoint).cmp(&(b.service_type(), &b.base().endpoint))
            });
            for service in &mut region.services {
                service.canonicalize();
            }
        }
    }
}

impl ServiceInput {
    fn canonicalize(&mut self) {
        fn sort_quotas<L>(quotas: &mut [QuotaInput<L>]) {
            quotas.sort_by(|a, b| (&a.project, a.mode).cmp(&(&b.project, b.mode)));
        }

        match self {
            ServiceInput::BlockStorage(s) => {
                sort_quotas(&mut s.quotas);
                s.storage_classes.sort_by(|a, b| a.name.cmp(&b.name));
            }
            ServiceInput::Compute(s) => {
                sort_quotas(&mut s.quotas);
                s.flavors.sort_by(|a, b| a.attrs.uuid.cmp(&b.attrs.uuid));
                s.images.sort_by(|a, b| a.attrs.uuid.cmp(&b.attrs.uuid));
                for flavor in &mut s.flavors {
                    flavor.projects.sort();
                }
                for image in &mut s.images {
                    image.projects.sort();
                }
            }
            ServiceInput::Network(s) => {
                sort_quotas(&mut s.quotas);
                s.networks.sort_by(|a, b| a.attrs.uuid.cmp(&b.attrs.uuid));
                for network in &mut s.networks {
                    network.projects.sort();
                }
            }
            ServiceInput::ObjectStore(s) => sort_quotas(&mut s.quotas),
            ServiceInput::Identity(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ProviderType;
    use serde_json::json;

    fn sample() -> serde_json::Value {
        json!({
            "name": "recas",
            "type": "openstack",
            "projects": [{"uuid": "p1", "name": "alpha"}],
            "regions": [{
                "name": "RegionOne",
                "location": {"site": "bari", "country": "Italy"},
                "services": [
                    {
                        "type": "compute",
                        "endpoint": "https://nova.example.org",
                        "name": "org.openstack.nova",
                        "quotas": [{"project": "p1", "cores": 10, "per_user": true}],
                        "flavors": [{"uuid": "f1", "name": "small", "is_shared": false, "projects": ["p1"]}]
                    },
                    {
                        "type": "identity",
                        "endpoint": "https://keystone.example.org",
                        "name": "org.openstack.keystone"
                    }
                ]
            }]
        })
    }

    #[test]
    fn test_parse_nested_provider() {
        let input: ProviderInput = serde_json::from_value(sample()).unwrap();
        assert_eq!(input.attrs.provider_type, ProviderType::Openstack);
        assert_eq!(input.projects.len(), 1);

        let region = &input.regions[0];
        assert_eq!(region.location.as_ref().unwrap().site, "bari");
        assert_eq!(region.services[0].service_type(), ServiceType::Compute);
        assert_eq!(region.services[1].service_type(), ServiceType::Identity);

        let quotas = region.services[0].quotas();
        assert_eq!(quotas.len(), 1);
        assert_eq!(quotas[0].project, "p1");
        assert!(quotas[0].quota.mode.per_user);
        assert_eq!(
            quotas[0].quota.limits,
            QuotaLimits::Compute(ComputeLimits {
                cores: Some(10),
                ..Default::default()
            })
        );
    }

    #[test]
    fn test_identity_service_has_no_quotas() {
        let input: ProviderInput = serde_json::from_value(sample()).unwrap();
        assert!(input.regions[0].services[1].quotas().is_empty());
    }

    #[test]
    fn test_unknown_service_type_is_rejected() {
        let mut value = sample();
        value["regions"][0]["services"][1]["type"] = json!("dns");
        assert!(serde_json::from_value::<ProviderInput>(value).is_err());
    }

    #[test]
    fn test_parse_toml_tree() {
        let input: ProviderInput = toml::from_str(
            r#"
            name = "recas"
            type = "openstack"

            [[projects]]
            uuid = "p1"
            name = "alpha"

            [[regions]]
            name = "RegionOne"

            [[regions.services]]
            type = "block-storage"
            endpoint = "https://cinder.example.org"
            name = "org.openstack.cinder"

            [[regions.services.quotas]]
            project = "p1"
            gigabytes = 500
            "#,
        )
        .unwrap();

        let region = &input.regions[0];
        assert!(region.location.is_none());
        assert_eq!(region.services[0].service_type(), ServiceType::BlockStorage);
        let quotas = region.services[0].quotas();
        assert!(!quotas[0].quota.mode.per_user);
        assert_eq!(
            quotas[0].quota.limits,
            QuotaLimits::BlockStorage(BlockStorageLimits {
                gigabytes: Some(500),
                ..Default::default()
            })
        );
    }

    #[test]
    fn test_canonicalize_orders_collections() {
        let mut value = sample();
        value["projects"] = json!([
            {"uuid": "p2", "name": "beta"},
            {"uuid": "p1", "name": "alpha"}
        ]);
        let mut input: ProviderInput = serde_json::from_value(value).unwrap();
        input.canonicalize();
        let uuids: Vec<&str> = input.projects.iter().map(|p| p.uuid.as_str()).collect();
        assert_eq!(uuids, vec!["p1", "p2"]);
        assert_eq!(input.regions[0].services[0].service_type(), ServiceType::Compute);
    }
}
