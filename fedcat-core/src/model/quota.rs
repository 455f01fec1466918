//! Quota records
//!
//! A quota limits one project's use of one service. Limits are typed per
//! service kind; the `type` tag names the service kind the quota applies to.

use serde::{Deserialize, Serialize};

use super::record::NodeRecord;
use super::service::ServiceType;
use crate::storage::NodeKind;

/// Which kind of limit a quota expresses.
///
/// A project holds at most one quota per usage mode on a service.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UsageMode {
    /// Reports current usage rather than a limit
    #[serde(default)]
    pub usage: bool,
    /// Limit applies to each user of the project
    #[serde(default)]
    pub per_user: bool,
}

impl std::fmt::Display for UsageMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.usage, self.per_user) {
            (false, false) => f.write_str("project-limit"),
            (false, true) => f.write_str("per-user-limit"),
            (true, false) => f.write_str("project-usage"),
            (true, true) => f.write_str("per-user-usage"),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockStorageLimits {
    #[serde(default)]
    pub gigabytes: Option<i64>,
    #[serde(default)]
    pub per_volume_gigabytes: Option<i64>,
    #[serde(default)]
    pub volumes: Option<i64>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputeLimits {
    #[serde(default)]
    pub cores: Option<i64>,
    #[serde(default)]
    pub instances: Option<i64>,
    #[serde(default)]
    pub ram: Option<i64>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkLimits {
    #[serde(default)]
    pub public_ips: Option<i64>,
    #[serde(default)]
    pub networks: Option<i64>,
    #[serde(default)]
    pub ports: Option<i64>,
    #[serde(default)]
    pub security_groups: Option<i64>,
    #[serde(default)]
    pub security_group_rules: Option<i64>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectStoreLimits {
    #[serde(default)]
    pub bytes: Option<i64>,
    #[serde(default)]
    pub containers: Option<i64>,
    #[serde(default)]
    pub objects: Option<i64>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum QuotaLimits {
    BlockStorage(BlockStorageLimits),
    Compute(ComputeLimits),
    Network(NetworkLimits),
    ObjectStore(ObjectStoreLimits),
}

impl QuotaLimits {
    /// Service kind this quota can be attached to
    pub fn service_type(&self) -> ServiceType {
        match self {
            QuotaLimits::BlockStorage(_) => ServiceType::BlockStorage,
            QuotaLimits::Compute(_) => ServiceType::Compute,
            QuotaLimits::Network(_) => ServiceType::Network,
            QuotaLimits::ObjectStore(_) => ServiceType::ObjectStore,
        }
    }
}

macro_rules! limits_variant {
    ($limits:ty, $variant:ident) => {
        impl From<$limits> for QuotaLimits {
            fn from(limits: $limits) -> Self {
                QuotaLimits::$variant(limits)
            }
        }

        impl TryFrom<QuotaLimits> for $limits {
            type Error = ServiceType;

            /// Fails with the service type the limits actually belong to
            fn try_from(limits: QuotaLimits) -> Result<Self, Self::Error> {
                match limits {
                    QuotaLimits::$variant(inner) => Ok(inner),
                    other => Err(other.service_type()),
                }
            }
        }
    };
}

limits_variant!(BlockStorageLimits, BlockStorage);
limits_variant!(ComputeLimits, Compute);
limits_variant!(NetworkLimits, Network);
limits_variant!(ObjectStoreLimits, ObjectStore);

/// Stored quota. Natural key: (service, project, usage mode).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Quota {
    #[serde(flatten)]
    pub mode: UsageMode,
    #[serde(default)]
    pub description: String,
    #[serde(flatten)]
    pub limits: QuotaLimits,
}

impl NodeRecord for Quota {
    const KIND: NodeKind = NodeKind::Quota;

    fn natural_key(&self) -> String {
        format!("{}/{}", self.limits.service_type(), self.mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_quota_props_are_flat() {
        let quota = Quota {
            mode: UsageMode {
                usage: false,
                per_user: true,
            },
            description: String::new(),
            limits: ComputeLimits {
                cores: Some(8),
                ..Default::default()
            }
            .into(),
        };
        let value = serde_json::to_value(&quota).unwrap();
        assert_eq!(value["type"], json!("compute"));
        assert_eq!(value["per_user"], json!(true));
        assert_eq!(value["cores"], json!(8));

        let back: Quota = serde_json::from_value(value).unwrap();
        assert_eq!(back, quota);
    }

    #[test]
    fn test_limits_conversion_reports_actual_type() {
        let limits = QuotaLimits::Network(NetworkLimits::default());
        let err = ComputeLimits::try_from(limits).unwrap_err();
        assert_eq!(err, ServiceType::Network);
    }
}
