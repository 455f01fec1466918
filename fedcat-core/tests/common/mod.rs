#![allow(dead_code)]

use fedcat_core::input::ProviderInput;
use fedcat_core::storage::{CatalogStore, NodeKind};
use fedcat_core::{SyncError, Synchronizer};
use serde_json::{Value, json};

/// Generate one test per store backend from a generic test body
macro_rules! store_tests {
    ($($name:ident),* $(,)?) => {
        mod memory {
            $(
                #[test]
                fn $name() {
                    super::$name(fedcat_core::MemoryStore::new());
                }
            )*
        }

        #[cfg(feature = "sqlite")]
        mod sqlite {
            $(
                #[test]
                fn $name() {
                    super::$name(fedcat_core::SqliteStore::in_memory().unwrap());
                }
            )*
        }
    };
}

/// A provider exercising every collection of the tree
pub fn recas() -> Value {
    json!({
        "name": "recas",
        "type": "openstack",
        "support_emails": ["help@recas.example"],
        "projects": [
            {"uuid": "p1", "name": "alpha"},
            {"uuid": "p2", "name": "beta"}
        ],
        "identity_providers": [{
            "endpoint": "https://iam.example.org",
            "group_claim": "groups",
            "relationship": {"idp_name": "iam", "protocol": "openid"},
            "user_groups": [
                {
                    "name": "astro",
                    "sla": {"doc_uuid": "sla-a", "start_date": "2024-01-01", "end_date": "2026-01-01", "project": "p1"}
                },
                {
                    "name": "bio",
                    "sla": {"doc_uuid": "sla-b", "start_date": "2024-01-01", "project": "p2"}
                }
            ]
        }],
        "regions": [{
            "name": "RegionOne",
            "location": {"site": "bari", "country": "Italy", "latitude": 41.1, "longitude": 16.87},
            "services": [
                {
                    "type": "compute",
                    "endpoint": "https://nova.recas.example",
                    "name": "org.openstack.nova",
                    "quotas": [
                        {"project": "p1", "cores": 10, "ram": 20480},
                        {"project": "p1", "per_user": true, "cores": 2}
                    ],
                    "flavors": [
                        {"uuid": "f-small", "name": "small", "vcpus": 1, "ram": 2048},
                        {"uuid": "f-gpu", "name": "gpu", "is_shared": false, "gpus": 1, "projects": ["p1"]}
                    ],
                    "images": [{"uuid": "i-ubuntu", "name": "ubuntu", "tags": ["lts"]}]
                },
                {
                    "type": "network",
                    "endpoint": "https://neutron.recas.example",
                    "name": "org.openstack.neutron",
                    "quotas": [{"project": "p2", "ports": 100}],
                    "networks": [{"uuid": "n-public", "name": "public", "is_router_external": true}]
                },
                {
                    "type": "block-storage",
                    "endpoint": "https://cinder.recas.example",
                    "name": "org.openstack.cinder",
                    "quotas": [{"project": "p1", "gigabytes": 500}],
                    "storage_classes": [{"name": "ssd", "is_default": true}]
                },
                {
                    "type": "identity",
                    "endpoint": "https://keystone.recas.example",
                    "name": "org.openstack.keystone"
                },
                {
                    "type": "object-store",
                    "endpoint": "https://swift.recas.example",
                    "name": "org.openstack.swift",
                    "quotas": [{"project": "p2", "bytes": 1000000}]
                }
            ]
        }]
    })
}

/// A minimal provider with one compute service in one region
pub fn small_provider(name: &str, site: &str) -> Value {
    json!({
        "name": name,
        "type": "openstack",
        "projects": [{"uuid": format!("{name}-p1"), "name": "main"}],
        "regions": [{
            "name": "RegionOne",
            "location": {"site": site, "country": "Italy"},
            "services": [{
                "type": "compute",
                "endpoint": format!("https://nova.{name}.example"),
                "name": "org.openstack.nova",
                "flavors": [{"uuid": "f1", "name": "small"}]
            }]
        }]
    })
}

pub fn tree(value: Value) -> ProviderInput {
    serde_json::from_value(value).unwrap()
}

pub fn count<S: CatalogStore>(sync: &Synchronizer<S>, kind: NodeKind) -> usize {
    sync.store()
        .read(|graph| Ok::<_, anyhow::Error>(graph.find_nodes(kind, &[])?.len()))
        .unwrap()
}

/// Node count of every kind, for before/after comparisons
pub fn census<S: CatalogStore>(sync: &Synchronizer<S>) -> Vec<(NodeKind, usize)> {
    NodeKind::ALL
        .into_iter()
        .map(|kind| (kind, count(sync, kind)))
        .collect()
}

pub fn canonical(value: Value) -> ProviderInput {
    let mut input = tree(value);
    input.canonicalize();
    input
}

pub fn assert_conflict<T: std::fmt::Debug>(result: Result<T, SyncError>) {
    match result {
        Err(SyncError::Conflict { .. }) => {}
        other => panic!("expected a conflict, got {other:?}"),
    }
}

pub fn assert_not_found<T: std::fmt::Debug>(result: Result<T, SyncError>) {
    match result {
        Err(SyncError::NotFound { .. }) => {}
        other => panic!("expected not found, got {other:?}"),
    }
}
