//! Service records

use serde::{Deserialize, Serialize};

use super::record::NodeRecord;
use crate::storage::NodeKind;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ServiceType {
    BlockStorage,
    Compute,
    Identity,
    Network,
    ObjectStore,
}

impl ServiceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceType::BlockStorage => "block-storage",
            ServiceType::Compute => "compute",
            ServiceType::Identity => "identity",
            ServiceType::Network => "network",
            ServiceType::ObjectStore => "object-store",
        }
    }
}

impl std::fmt::Display for ServiceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A service endpoint of a region. Natural key: (endpoint, type), scoped to the region.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Service {
    #[serde(rename = "type")]
    pub service_type: ServiceType,
    pub endpoint: String,
    /// Implementation name, e.g. `org.openstack.nova`
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl NodeRecord for Service {
    const KIND: NodeKind = NodeKind::Service;

    fn natural_key(&self) -> String {
        service_key(self.service_type, &self.endpoint)
    }
}

pub fn service_key(service_type: ServiceType, endpoint: &str) -> String {
    format!("{service_type}:{endpoint}")
}
