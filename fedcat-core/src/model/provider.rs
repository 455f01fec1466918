//! Provider and project records

use serde::{Deserialize, Serialize};

use super::record::NodeRecord;
use crate::storage::NodeKind;

/// Cloud platform a provider runs
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    Openstack,
    Kubernetes,
}

impl ProviderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderType::Openstack => "openstack",
            ProviderType::Kubernetes => "kubernetes",
        }
    }
}

impl std::fmt::Display for ProviderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProviderType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openstack" => Ok(ProviderType::Openstack),
            "kubernetes" => Ok(ProviderType::Kubernetes),
            _ => Err(format!("Unknown provider type: {}", s)),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderStatus {
    #[default]
    Active,
    Maintenance,
    Limited,
    Removed,
}

/// A federated cloud provider. Natural key: (name, type).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Provider {
    pub name: String,
    #[serde(rename = "type")]
    pub provider_type: ProviderType,
    #[serde(default)]
    pub status: ProviderStatus,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub support_emails: Vec<String>,
    #[serde(default)]
    pub description: String,
}

impl NodeRecord for Provider {
    const KIND: NodeKind = NodeKind::Provider;

    fn natural_key(&self) -> String {
        provider_key(&self.name, self.provider_type)
    }
}

pub fn provider_key(name: &str, provider_type: ProviderType) -> String {
    format!("{name} ({provider_type})")
}

/// A tenant project of one provider. Natural key: uuid, scoped to the provider.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub uuid: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl NodeRecord for Project {
    const KIND: NodeKind = NodeKind::Project;

    fn natural_key(&self) -> String {
        self.uuid.clone()
    }
}
