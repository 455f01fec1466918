//! Provider synchronization
//!
//! `Synchronizer` converges the stored graph to a submitted provider tree.
//! Each entry point runs in a single store transaction, so a rejected run
//! leaves no trace.
//!
//! Submodules:
//! - `resolver` - natural-key lookups
//! - `reconcile` - the generic collection algorithm
//! - `members` - per-kind collection handlers
//! - `sla` - SLA reassignment
//! - `cleanup` - cascade deletion of orphaned nodes

pub mod cleanup;
pub mod context;
pub mod members;
pub mod reconcile;
pub mod resolver;
pub mod sla;

use tracing::info;

use crate::error::{Result, SyncError};
use crate::export;
use crate::input::{FlavorInput, ImageInput, NetworkInput, ProviderInput, QuotaDraft};
use crate::model::{
    NodeRecord, Project, Provider, ProviderType, Service, ServiceType, StorageClass, record,
};
use crate::storage::{CatalogStore, Graph, NodeId, NodeKind, Relation, StoredNode};

pub use context::SyncContext;
pub use reconcile::{CollectionMember, reconcile};

/// Terminal state of a provider sync
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyncStatus {
    Created,
    Updated,
    Unchanged,
}

impl std::fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncStatus::Created => f.write_str("created"),
            SyncStatus::Updated => f.write_str("updated"),
            SyncStatus::Unchanged => f.write_str("unchanged"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyncOutcome {
    pub provider: NodeId,
    pub status: SyncStatus,
}

impl SyncOutcome {
    /// Whether the run mutated the graph
    pub fn changed(&self) -> bool {
        self.status != SyncStatus::Unchanged
    }
}

/// Reconciliation engine over a catalog store
pub struct Synchronizer<S> {
    store: S,
}

impl<S: CatalogStore> Synchronizer<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    // ========================================================================
    // Provider trees
    // ========================================================================

    /// Create or update the provider identified by the tree's (name, type)
    pub fn sync_provider(&self, input: &ProviderInput) -> Result<SyncOutcome> {
        self.store.transaction(|graph| {
            let existing = resolver::find_provider(graph, &input.attrs.name, input.attrs.provider_type)?;
            apply_provider(graph, existing, input)
        })
    }

    /// Converge a known provider to the tree, possibly renaming it
    pub fn update_provider(&self, provider: &NodeId, input: &ProviderInput) -> Result<SyncOutcome> {
        self.store.transaction(|graph| {
            let node = record::fetch(graph, NodeKind::Provider, provider)?;
            let holder = resolver::find_provider(graph, &input.attrs.name, input.attrs.provider_type)?;
            if holder.is_some_and(|other| other.id != node.id) {
                return Err(SyncError::conflict(
                    NodeKind::Provider,
                    input.attrs.natural_key(),
                    "another provider already uses this name and type",
                ));
            }
            apply_provider(graph, Some(node), input)
        })
    }

    /// Remove a provider and everything only it owned
    pub fn delete_provider(&self, provider: &NodeId) -> Result<()> {
        self.store.transaction(|graph| {
            let attrs: Provider = record::load(graph, provider)?;
            let mut ctx = SyncContext::new(graph, provider.clone())?;
            for idp in ctx.graph.targets(provider, Relation::ProviderIdentityProvider)? {
                members::identity::release_identity_provider(&mut ctx, provider, &idp)?;
            }
            cleanup::delete_cascade(ctx.graph, provider)?;
            info!("Deleted provider {}", attrs.natural_key());
            Ok(())
        })
    }

    pub fn find_provider(&self, name: &str, provider_type: ProviderType) -> Result<Option<NodeId>> {
        self.store.read(|graph| {
            Ok(resolver::find_provider(graph, name, provider_type)?.map(|node| node.id))
        })
    }

    /// Read a provider back in input-tree form
    pub fn export_provider(&self, provider: &NodeId) -> Result<ProviderInput> {
        self.store.read(|graph| export::export_provider(graph, provider))
    }

    // ========================================================================
    // Single leaves
    // ========================================================================

    pub fn add_project(&self, provider: &NodeId, project: &Project) -> Result<NodeId> {
        self.store.transaction(|graph| {
            record::fetch(graph, NodeKind::Provider, provider)?;
            let mut ctx = SyncContext::new(graph, provider.clone())?;
            reconcile::add(&mut ctx, provider, project)
        })
    }

    pub fn add_quota(&self, service: &NodeId, quota: &QuotaDraft) -> Result<NodeId> {
        self.add_to_service(service, None, quota)
    }

    pub fn add_flavor(&self, service: &NodeId, flavor: &FlavorInput) -> Result<NodeId> {
        self.add_to_service(service, Some(ServiceType::Compute), flavor)
    }

    pub fn add_image(&self, service: &NodeId, image: &ImageInput) -> Result<NodeId> {
        self.add_to_service(service, Some(ServiceType::Compute), image)
    }

    pub fn add_network(&self, service: &NodeId, network: &NetworkInput) -> Result<NodeId> {
        self.add_to_service(service, Some(ServiceType::Network), network)
    }

    pub fn add_storage_class(&self, service: &NodeId, class: &StorageClass) -> Result<NodeId> {
        self.add_to_service(service, Some(ServiceType::BlockStorage), class)
    }

    fn add_to_service<M: CollectionMember>(
        &self,
        service: &NodeId,
        expected: Option<ServiceType>,
        item: &M,
    ) -> Result<NodeId> {
        self.store.transaction(|graph| {
            let attrs: Service = record::load(graph, service)?;
            if expected.is_some_and(|expected| attrs.service_type != expected) {
                return Err(SyncError::conflict(
                    M::KIND,
                    item.key(),
                    format!("{} service cannot own a {}", attrs.service_type, M::KIND),
                ));
            }
            let provider = resolver::service_provider(graph, service)?;
            let mut ctx = SyncContext::new(graph, provider)?;
            reconcile::add(&mut ctx, service, item)
        })
    }
}

/// Converge one provider tree inside an open transaction
fn apply_provider(graph: &mut dyn Graph, existing: Option<StoredNode>, input: &ProviderInput) -> Result<SyncOutcome> {
    let key = input.attrs.natural_key();
    let (provider, mut changed, created) = match existing {
        Some(node) => {
            let changed = record::patch(graph, &node, &input.attrs)?;
            (node.id, changed, false)
        }
        None => (record::create(graph, &input.attrs)?, true, true),
    };

    let mut ctx = SyncContext::new(graph, provider.clone())?;
    changed |= reconcile(&mut ctx, &provider, &input.projects)?;
    ctx.load_projects()?;
    changed |= reconcile(&mut ctx, &provider, &input.identity_providers)?;
    changed |= reconcile(&mut ctx, &provider, &input.regions)?;

    let status = match (created, changed) {
        (true, _) => SyncStatus::Created,
        (false, true) => SyncStatus::Updated,
        (false, false) => SyncStatus::Unchanged,
    };
    info!("Provider {} {}", key, status);
    Ok(SyncOutcome { provider, status })
}
