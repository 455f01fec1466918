//! Flavors, images, networks and storage classes

use serde::{Deserialize, Serialize};

use super::record::NodeRecord;
use crate::storage::NodeKind;

/// Compute flavor. Natural key: uuid, scoped to the owning provider.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Flavor {
    pub uuid: String,
    pub name: String,
    /// Shared flavors are visible to every project of the provider;
    /// private ones only to the projects granted access.
    #[serde(default = "default_true")]
    pub is_shared: bool,
    #[serde(default)]
    pub disk: u64,
    #[serde(default)]
    pub ram: u64,
    #[serde(default)]
    pub vcpus: u32,
    #[serde(default)]
    pub swap: u64,
    #[serde(default)]
    pub ephemeral: u64,
    #[serde(default)]
    pub infiniband: bool,
    #[serde(default)]
    pub gpus: u32,
    #[serde(default)]
    pub gpu_model: Option<String>,
    #[serde(default)]
    pub gpu_vendor: Option<String>,
    #[serde(default)]
    pub local_storage: Option<String>,
    #[serde(default)]
    pub description: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub uuid: String,
    pub name: String,
    #[serde(default = "default_true")]
    pub is_shared: bool,
    #[serde(default)]
    pub os_type: Option<String>,
    #[serde(default)]
    pub os_distro: Option<String>,
    #[serde(default)]
    pub os_version: Option<String>,
    #[serde(default)]
    pub architecture: Option<String>,
    #[serde(default)]
    pub kernel_id: Option<String>,
    #[serde(default)]
    pub cuda_support: bool,
    #[serde(default)]
    pub gpu_driver: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub description: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Network {
    pub uuid: String,
    pub name: String,
    #[serde(default = "default_true")]
    pub is_shared: bool,
    #[serde(default)]
    pub is_router_external: bool,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub mtu: Option<u32>,
    #[serde(default)]
    pub proxy_host: Option<String>,
    #[serde(default)]
    pub proxy_user: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub description: String,
}

/// Volume type of a block storage service. Natural key: name, scoped to the service.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StorageClass {
    pub name: String,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub description: String,
}

fn default_true() -> bool {
    true
}

/// Resources addressed by a uuid that is only unique within one provider
pub trait SharedResource: NodeRecord {
    fn uuid(&self) -> &str;
    fn is_shared(&self) -> bool;
}

macro_rules! shared_resource {
    ($record:ty, $kind:expr) => {
        impl NodeRecord for $record {
            const KIND: NodeKind = $kind;

            fn natural_key(&self) -> String {
                self.uuid.clone()
            }
        }

        impl SharedResource for $record {
            fn uuid(&self) -> &str {
                &self.uuid
            }

            fn is_shared(&self) -> bool {
                self.is_shared
            }
        }
    };
}

shared_resource!(Flavor, NodeKind::Flavor);
shared_resource!(Image, NodeKind::Image);
shared_resource!(Network, NodeKind::Network);

impl NodeRecord for StorageClass {
    const KIND: NodeKind = NodeKind::StorageClass;

    fn natural_key(&self) -> String {
        self.name.clone()
    }
}
