//! Typed attribute records for every node kind

pub mod identity;
pub mod provider;
pub mod quota;
pub mod record;
pub mod region;
pub mod resource;
pub mod service;

pub use identity::{AuthMethod, IdentityProvider, Sla, UserGroup};
pub use provider::{Project, Provider, ProviderStatus, ProviderType};
pub use quota::{
    BlockStorageLimits, ComputeLimits, NetworkLimits, ObjectStoreLimits, Quota, QuotaLimits,
    UsageMode,
};
pub use record::NodeRecord;
pub use region::{Location, Region};
pub use resource::{Flavor, Image, Network, SharedResource, StorageClass};
pub use service::{Service, ServiceType};
