//! Convergence properties of provider sync, run against every store backend

#[macro_use]
mod common;

use common::*;
use fedcat_core::storage::{CatalogStore, NodeKind};
use fedcat_core::{SyncStatus, Synchronizer};
use serde_json::json;

fn idempotent_second_run<S: CatalogStore>(store: S) {
    let sync = Synchronizer::new(store);
    let input = tree(recas());

    let first = sync.sync_provider(&input).unwrap();
    assert_eq!(first.status, SyncStatus::Created);
    let exported = sync.export_provider(&first.provider).unwrap();
    let nodes = census(&sync);

    let second = sync.sync_provider(&input).unwrap();
    assert_eq!(second.provider, first.provider);
    assert_eq!(second.status, SyncStatus::Unchanged);
    assert!(!second.changed());
    assert_eq!(sync.export_provider(&first.provider).unwrap(), exported);
    assert_eq!(census(&sync), nodes);
}

fn export_matches_submitted_tree<S: CatalogStore>(store: S) {
    let sync = Synchronizer::new(store);
    let outcome = sync.sync_provider(&tree(recas())).unwrap();

    let exported = sync.export_provider(&outcome.provider).unwrap();
    assert_eq!(exported, canonical(recas()));
}

fn converges_from_a_different_tree<S: CatalogStore>(store: S) {
    let sync = Synchronizer::new(store);
    sync.sync_provider(&tree(recas())).unwrap();

    let mut next = recas();
    next["projects"] = json!([
        {"uuid": "p1", "name": "alpha renamed"},
        {"uuid": "p3", "name": "gamma"}
    ]);
    next["identity_providers"][0]["user_groups"] = json!([{
        "name": "astro",
        "sla": {"doc_uuid": "sla-a", "start_date": "2024-01-01", "end_date": "2026-01-01", "project": "p1"}
    }]);
    next["regions"][0]["services"] = json!([
        {
            "type": "compute",
            "endpoint": "https://nova.recas.example",
            "name": "org.openstack.nova",
            "quotas": [{"project": "p3", "cores": 4}],
            "flavors": [{"uuid": "f-gpu", "name": "gpu", "is_shared": false, "gpus": 2, "projects": ["p1", "p3"]}]
        },
        {
            "type": "block-storage",
            "endpoint": "https://cinder.recas.example",
            "name": "org.openstack.cinder",
            "storage_classes": [{"name": "hdd"}]
        }
    ]);

    let outcome = sync.sync_provider(&tree(next.clone())).unwrap();
    assert_eq!(outcome.status, SyncStatus::Updated);
    assert_eq!(
        sync.export_provider(&outcome.provider).unwrap(),
        canonical(next.clone())
    );

    // Only what the new tree declares is left
    assert_eq!(count(&sync, NodeKind::Project), 2);
    assert_eq!(count(&sync, NodeKind::Service), 2);
    assert_eq!(count(&sync, NodeKind::Quota), 1);
    assert_eq!(count(&sync, NodeKind::Flavor), 1);
    assert_eq!(count(&sync, NodeKind::Image), 0);
    assert_eq!(count(&sync, NodeKind::Network), 0);
    assert_eq!(count(&sync, NodeKind::StorageClass), 1);
    assert_eq!(count(&sync, NodeKind::UserGroup), 1);
    assert_eq!(count(&sync, NodeKind::Sla), 1);

    let again = sync.sync_provider(&tree(next)).unwrap();
    assert!(!again.changed());
}

fn empty_collections_remove_children<S: CatalogStore>(store: S) {
    let sync = Synchronizer::new(store);
    sync.sync_provider(&tree(recas())).unwrap();

    let mut bare = recas();
    bare["projects"] = json!([]);
    bare["identity_providers"] = json!([]);
    bare["regions"] = json!([]);
    let outcome = sync.sync_provider(&tree(bare)).unwrap();
    assert_eq!(outcome.status, SyncStatus::Updated);

    for (kind, nodes) in census(&sync) {
        let expected = usize::from(kind == NodeKind::Provider);
        assert_eq!(nodes, expected, "{kind} nodes left behind");
    }
}

fn omitted_private_flavor_is_deleted_or_detached<S: CatalogStore>(store: S) {
    let sync = Synchronizer::new(store);
    let flavor = json!({"uuid": "f-gpu", "name": "gpu", "is_shared": false, "projects": ["p1"]});
    let region = |name: &str, flavors: serde_json::Value| {
        json!({
            "name": name,
            "services": [{
                "type": "compute",
                "endpoint": format!("https://nova.{name}.example"),
                "name": "org.openstack.nova",
                "flavors": flavors
            }]
        })
    };
    let mut input = small_provider("recas", "bari");
    input["projects"] = json!([{"uuid": "p1", "name": "alpha"}]);
    input["regions"] = json!([
        region("one", json!([flavor.clone()])),
        region("two", json!([flavor.clone()]))
    ]);
    sync.sync_provider(&tree(input.clone())).unwrap();
    // Both services of the provider expose the same flavor node
    assert_eq!(count(&sync, NodeKind::Flavor), 1);

    input["regions"][1] = region("two", json!([]));
    assert!(sync.sync_provider(&tree(input.clone())).unwrap().changed());
    assert_eq!(count(&sync, NodeKind::Flavor), 1);

    input["regions"][0] = region("one", json!([]));
    assert!(sync.sync_provider(&tree(input)).unwrap().changed());
    assert_eq!(count(&sync, NodeKind::Flavor), 0);
}

fn same_flavor_uuid_in_two_providers_stays_separate<S: CatalogStore>(store: S) {
    let sync = Synchronizer::new(store);
    let a = sync
        .sync_provider(&tree(small_provider("alpha", "bari")))
        .unwrap();
    let b = sync
        .sync_provider(&tree(small_provider("beta", "pisa")))
        .unwrap();
    assert_ne!(a.provider, b.provider);
    assert_eq!(count(&sync, NodeKind::Flavor), 2);

    let mut renamed = small_provider("beta", "pisa");
    renamed["regions"][0]["services"][0]["flavors"][0]["name"] = json!("tiny");
    sync.sync_provider(&tree(renamed)).unwrap();

    let alpha = sync.export_provider(&a.provider).unwrap();
    assert_eq!(alpha, canonical(small_provider("alpha", "bari")));

    sync.delete_provider(&b.provider).unwrap();
    assert_eq!(count(&sync, NodeKind::Flavor), 1);
}

fn failed_run_leaves_graph_untouched<S: CatalogStore>(store: S) {
    let sync = Synchronizer::new(store);
    let outcome = sync.sync_provider(&tree(recas())).unwrap();
    let before = sync.export_provider(&outcome.provider).unwrap();
    let nodes = census(&sync);

    // Valid changes up front, an unknown project deep in the tree
    let mut broken = recas();
    broken["projects"][0]["name"] = json!("changed");
    broken["regions"][0]["services"][0]["flavors"][1]["projects"] = json!(["p1", "p9"]);
    assert_not_found(sync.sync_provider(&tree(broken)));

    assert_eq!(sync.export_provider(&outcome.provider).unwrap(), before);
    assert_eq!(census(&sync), nodes);
}

fn quota_usage_mode_is_unique<S: CatalogStore>(store: S) {
    let sync = Synchronizer::new(store);
    let mut input = recas();
    input["regions"][0]["services"][0]["quotas"] = json!([
        {"project": "p1", "cores": 10},
        {"project": "p1", "cores": 20}
    ]);
    assert_conflict(sync.sync_provider(&tree(input)));
    assert_eq!(count(&sync, NodeKind::Provider), 0);

    // Different usage modes for one project coexist
    let mut input = recas();
    input["regions"][0]["services"][0]["quotas"] = json!([
        {"project": "p1", "cores": 10},
        {"project": "p1", "cores": 20, "per_user": true},
        {"project": "p1", "cores": 5, "usage": true}
    ]);
    sync.sync_provider(&tree(input)).unwrap();
    assert_eq!(count(&sync, NodeKind::Quota), 6);
}

fn references_outside_the_provider_are_rejected<S: CatalogStore>(store: S) {
    let sync = Synchronizer::new(store);

    let mut quota = recas();
    quota["regions"][0]["services"][1]["quotas"][0]["project"] = json!("elsewhere");
    assert_not_found(sync.sync_provider(&tree(quota)));

    let mut sla = recas();
    sla["identity_providers"][0]["user_groups"][0]["sla"]["project"] = json!("elsewhere");
    assert_not_found(sync.sync_provider(&tree(sla)));

    let mut shared = recas();
    shared["regions"][0]["services"][0]["flavors"][0]["projects"] = json!(["p1"]);
    assert_conflict(sync.sync_provider(&tree(shared)));

    assert_eq!(count(&sync, NodeKind::Provider), 0);
}

fn duplicate_keys_in_one_collection_conflict<S: CatalogStore>(store: S) {
    let sync = Synchronizer::new(store);
    let mut input = recas();
    input["projects"] = json!([
        {"uuid": "p1", "name": "alpha"},
        {"uuid": "p1", "name": "again"},
        {"uuid": "p2", "name": "beta"}
    ]);
    assert_conflict(sync.sync_provider(&tree(input)));
}

fn location_moves_between_sites<S: CatalogStore>(store: S) {
    let sync = Synchronizer::new(store);
    let outcome = sync.sync_provider(&tree(recas())).unwrap();

    let mut moved = recas();
    moved["regions"][0]["location"] = json!({"site": "pisa", "country": "Italy"});
    assert!(sync.sync_provider(&tree(moved.clone())).unwrap().changed());
    assert_eq!(count(&sync, NodeKind::Location), 1);
    assert_eq!(
        sync.export_provider(&outcome.provider).unwrap(),
        canonical(moved.clone())
    );

    moved["regions"][0]["location"] = json!({"site": "pisa", "country": "Italia"});
    assert!(sync.sync_provider(&tree(moved.clone())).unwrap().changed());
    assert_eq!(count(&sync, NodeKind::Location), 1);

    moved["regions"][0]["location"] = serde_json::Value::Null;
    assert!(sync.sync_provider(&tree(moved)).unwrap().changed());
    assert_eq!(count(&sync, NodeKind::Location), 0);
}

fn update_provider_renames_in_place<S: CatalogStore>(store: S) {
    let sync = Synchronizer::new(store);
    let recas_id = sync.sync_provider(&tree(recas())).unwrap().provider;
    let other = sync
        .sync_provider(&tree(small_provider("other", "pisa")))
        .unwrap()
        .provider;

    let mut renamed = recas();
    renamed["name"] = json!("recas-bari");
    let outcome = sync.update_provider(&recas_id, &tree(renamed)).unwrap();
    assert_eq!(outcome.provider, recas_id);
    assert_eq!(outcome.status, SyncStatus::Updated);
    assert!(
        sync.find_provider("recas", fedcat_core::model::ProviderType::Openstack)
            .unwrap()
            .is_none()
    );

    let mut clash = recas();
    clash["name"] = json!("other");
    assert_conflict(sync.update_provider(&recas_id, &tree(clash)));
    assert!(sync.export_provider(&other).is_ok());
}

fn delete_provider_removes_everything_it_owned<S: CatalogStore>(store: S) {
    let sync = Synchronizer::new(store);
    let outcome = sync.sync_provider(&tree(recas())).unwrap();
    sync.delete_provider(&outcome.provider).unwrap();

    for (kind, nodes) in census(&sync) {
        assert_eq!(nodes, 0, "{kind} nodes left behind");
    }
    assert!(sync.export_provider(&outcome.provider).is_err());
}

store_tests!(
    idempotent_second_run,
    export_matches_submitted_tree,
    converges_from_a_different_tree,
    empty_collections_remove_children,
    omitted_private_flavor_is_deleted_or_detached,
    same_flavor_uuid_in_two_providers_stays_separate,
    failed_run_leaves_graph_untouched,
    quota_usage_mode_is_unique,
    references_outside_the_provider_are_rejected,
    duplicate_keys_in_one_collection_conflict,
    location_moves_between_sites,
    update_provider_renames_in_place,
    delete_provider_removes_everything_it_owned,
);
