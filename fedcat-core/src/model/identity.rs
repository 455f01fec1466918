//! Identity providers, user groups and SLAs

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::record::NodeRecord;
use crate::storage::NodeKind;

/// Identity provider, shared by every provider trusting it. Natural key: endpoint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IdentityProvider {
    pub endpoint: String,
    pub group_claim: String,
    #[serde(default)]
    pub description: String,
}

impl NodeRecord for IdentityProvider {
    const KIND: NodeKind = NodeKind::IdentityProvider;

    fn natural_key(&self) -> String {
        self.endpoint.clone()
    }
}

/// How one provider authenticates against an identity provider.
///
/// Stored as metadata of the provider -> identity provider edge.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthMethod {
    pub idp_name: String,
    pub protocol: String,
}

/// Natural key: name, scoped to the identity provider
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserGroup {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl NodeRecord for UserGroup {
    const KIND: NodeKind = NodeKind::UserGroup;

    fn natural_key(&self) -> String {
        self.name.clone()
    }
}

/// Service level agreement granting a user group access to projects.
/// Natural key: doc_uuid.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Sla {
    pub doc_uuid: String,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub description: String,
}

impl NodeRecord for Sla {
    const KIND: NodeKind = NodeKind::Sla;

    fn natural_key(&self) -> String {
        self.doc_uuid.clone()
    }
}
