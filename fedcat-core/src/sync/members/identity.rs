//! Identity providers and their user groups
//!
//! Identity providers and user groups are shared between providers. A
//! provider only ever removes what it contributed: its edge to the identity
//! provider and the SLA links of user groups to its own projects. Nodes are
//! deleted once nothing references them any more.

use tracing::debug;

use crate::error::{Result, SyncError};
use crate::input::{IdentityProviderInput, UserGroupInput};
use crate::model::{IdentityProvider, UserGroup, record};
use crate::storage::{Graph, NodeId, NodeKind, Relation, StoredNode};
use crate::sync::cleanup;
use crate::sync::context::SyncContext;
use crate::sync::reconcile::{CollectionMember, reconcile};
use crate::sync::{resolver, sla};

impl IdentityProviderInput {
    fn auth_metadata(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(&self.relationship)?)
    }

    /// Patch the identity provider's attributes, unless another provider
    /// trusts it too: then its attributes must already match.
    fn converge_attrs(&self, ctx: &mut SyncContext<'_>, provider: &NodeId, node: &StoredNode) -> Result<bool> {
        let shared = ctx
            .graph
            .sources(&node.id, Relation::ProviderIdentityProvider)?
            .iter()
            .any(|other| other != provider);
        if !shared {
            return record::patch(ctx.graph, node, &self.attrs);
        }

        let differing = record::differing_fields(node, &self.attrs)?;
        if differing.is_empty() {
            return Ok(false);
        }
        Err(SyncError::conflict(
            NodeKind::IdentityProvider,
            &self.attrs.endpoint,
            format!(
                "shared with other providers but declared with different {}",
                differing.join(", ")
            ),
        ))
    }
}

impl CollectionMember for IdentityProviderInput {
    const KIND: NodeKind = NodeKind::IdentityProvider;
    const RELATION: Relation = Relation::ProviderIdentityProvider;

    fn key(&self) -> String {
        self.attrs.endpoint.clone()
    }

    fn stored_key(_graph: &dyn Graph, node: &StoredNode) -> Result<String> {
        Ok(record::decode::<IdentityProvider>(node)?.endpoint)
    }

    fn create(&self, ctx: &mut SyncContext<'_>, provider: &NodeId) -> Result<NodeId> {
        let id = match resolver::find_identity_provider(ctx.read(), &self.attrs.endpoint)? {
            Some(node) => {
                self.converge_attrs(ctx, provider, &node)?;
                node.id
            }
            None => record::create(ctx.graph, &self.attrs)?,
        };
        ctx.graph
            .connect(provider, &id, Self::RELATION, Some(self.auth_metadata()?))?;
        reconcile(ctx, &id, &self.user_groups)?;
        Ok(id)
    }

    fn update(&self, ctx: &mut SyncContext<'_>, provider: &NodeId, node: &StoredNode) -> Result<bool> {
        let mut changed = self.converge_attrs(ctx, provider, node)?;

        let metadata = self.auth_metadata()?;
        let current = ctx
            .graph
            .edge(provider, &node.id, Self::RELATION)?
            .and_then(|edge| edge.metadata);
        if current.as_ref() != Some(&metadata) {
            ctx.graph
                .connect(provider, &node.id, Self::RELATION, Some(metadata))?;
            debug!("Replaced auth method towards {}", self.attrs.endpoint);
            changed = true;
        }

        changed |= reconcile(ctx, &node.id, &self.user_groups)?;
        Ok(changed)
    }

    fn release(ctx: &mut SyncContext<'_>, provider: &NodeId, node: &StoredNode) -> Result<bool> {
        release_identity_provider(ctx, provider, &node.id)
    }
}

/// Withdraw a provider from an identity provider: detach the SLAs of every
/// user group from the provider's projects, then drop the provider edge.
pub fn release_identity_provider(ctx: &mut SyncContext<'_>, provider: &NodeId, idp: &NodeId) -> Result<bool> {
    let mut changed = false;
    for group in ctx
        .graph
        .targets(idp, Relation::IdentityProviderUserGroup)?
    {
        changed |= release_user_group(ctx, idp, &group)?;
    }
    changed |= cleanup::release(ctx.graph, provider, idp, Relation::ProviderIdentityProvider)?;
    Ok(changed)
}

/// Detach a user group's SLAs from the current provider's projects.
///
/// SLAs left without projects are deleted, and so is the group once it holds
/// no SLA at all. Groups serving other providers are otherwise untouched.
pub fn release_user_group(ctx: &mut SyncContext<'_>, idp: &NodeId, group: &NodeId) -> Result<bool> {
    let mut changed = false;
    for sla in ctx.graph.targets(group, Relation::UserGroupSla)? {
        changed |= sla::detach_provider_projects(ctx, &sla)?;
    }
    if ctx
        .graph
        .targets(group, Relation::UserGroupSla)?
        .is_empty()
    {
        changed |= cleanup::release(ctx.graph, idp, group, Relation::IdentityProviderUserGroup)?;
    }
    Ok(changed)
}

impl CollectionMember for UserGroupInput {
    const KIND: NodeKind = NodeKind::UserGroup;
    const RELATION: Relation = Relation::IdentityProviderUserGroup;

    fn key(&self) -> String {
        self.attrs.name.clone()
    }

    fn stored_key(_graph: &dyn Graph, node: &StoredNode) -> Result<String> {
        Ok(record::decode::<UserGroup>(node)?.name)
    }

    fn create(&self, ctx: &mut SyncContext<'_>, idp: &NodeId) -> Result<NodeId> {
        let id = record::create(ctx.graph, &self.attrs)?;
        ctx.graph.connect(idp, &id, Self::RELATION, None)?;
        sla::apply(ctx, &id, &self.sla)?;
        Ok(id)
    }

    fn update(&self, ctx: &mut SyncContext<'_>, _idp: &NodeId, node: &StoredNode) -> Result<bool> {
        let mut changed = record::patch(ctx.graph, node, &self.attrs)?;
        changed |= sla::apply(ctx, &node.id, &self.sla)?;
        Ok(changed)
    }

    fn release(ctx: &mut SyncContext<'_>, idp: &NodeId, node: &StoredNode) -> Result<bool> {
        release_user_group(ctx, idp, &node.id)
    }
}
