//! Regions and locations

use serde::{Deserialize, Serialize};

use super::record::NodeRecord;
use crate::storage::NodeKind;

/// Natural key: name, scoped to the provider
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl NodeRecord for Region {
    const KIND: NodeKind = NodeKind::Region;

    fn natural_key(&self) -> String {
        self.name.clone()
    }
}

/// Physical site hosting regions, shared across providers. Natural key: site.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub site: String,
    pub country: String,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub description: String,
}

impl NodeRecord for Location {
    const KIND: NodeKind = NodeKind::Location;

    fn natural_key(&self) -> String {
        self.site.clone()
    }
}
