//! Integration tests for index reconciliation against a mock panel.

mod helpers;

use std::sync::Arc;

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use helpers::mock_panel::{
    list_json, mount_panel_state, provisioner_for, server_json, user_json,
};
use talon_provisioning::ProvisionError;
use talon_store::{AssociationStore, MemoryStore};

#[tokio::test]
async fn reconcile_links_associated_user_and_servers() {
    let server = MockServer::start().await;
    mount_panel_state(
        &server,
        vec![user_json(7, "uuid-1")],
        vec![server_json(99, 7)],
    )
    .await;

    let store = Arc::new(MemoryStore::new());
    store.set("uuid-1", "ext-42").unwrap();

    let mut provisioner = provisioner_for(&server, store);
    let stats = provisioner.reconcile().await.unwrap();

    assert_eq!(provisioner.index().user_id("ext-42"), Some(7));
    assert_eq!(provisioner.index().servers_for("ext-42"), &[99]);
    assert_eq!(stats.total_users, 1);
    assert_eq!(stats.total_servers, 1);
    assert_eq!(stats.linked_users, 1);
    assert_eq!(stats.linked_servers, 1);
}

#[tokio::test]
async fn reconcile_twice_produces_identical_index() {
    let server = MockServer::start().await;
    mount_panel_state(
        &server,
        vec![user_json(7, "uuid-1"), user_json(8, "uuid-2")],
        vec![server_json(99, 7), server_json(100, 8), server_json(101, 7)],
    )
    .await;

    let store = Arc::new(MemoryStore::new());
    store.set("uuid-1", "ext-42").unwrap();
    store.set("uuid-2", "ext-43").unwrap();

    let mut provisioner = provisioner_for(&server, store);

    let first_stats = provisioner.reconcile().await.unwrap();
    let first_index = provisioner.index().clone();

    let second_stats = provisioner.reconcile().await.unwrap();

    assert_eq!(provisioner.index(), &first_index);
    assert_eq!(first_stats, second_stats);
}

#[tokio::test]
async fn duplicate_association_values_leave_identity_absent() {
    let server = MockServer::start().await;
    mount_panel_state(
        &server,
        vec![user_json(7, "uuid-1"), user_json(8, "uuid-2")],
        vec![],
    )
    .await;

    let store = Arc::new(MemoryStore::new());
    store.set("uuid-1", "ext-42").unwrap();
    store.set("uuid-2", "ext-42").unwrap();

    let mut provisioner = provisioner_for(&server, store);
    let stats = provisioner.reconcile().await.unwrap();

    assert!(!provisioner.index().is_linked("ext-42"));
    assert_eq!(stats.linked_users, 0);
    assert_eq!(stats.skipped_users, 2);
}

#[tokio::test]
async fn unassociated_rows_are_skipped_and_counted() {
    let server = MockServer::start().await;
    mount_panel_state(
        &server,
        vec![user_json(7, "uuid-1"), user_json(8, "uuid-orphan")],
        vec![server_json(99, 7), server_json(100, 8)],
    )
    .await;

    let store = Arc::new(MemoryStore::new());
    store.set("uuid-1", "ext-42").unwrap();

    let mut provisioner = provisioner_for(&server, store);
    let stats = provisioner.reconcile().await.unwrap();

    assert_eq!(provisioner.index().linked_users(), 1);
    assert_eq!(provisioner.index().servers_for("ext-42"), &[99]);
    assert_eq!(stats.skipped_users, 1);
    assert_eq!(stats.skipped_servers, 1);
}

#[tokio::test]
async fn listing_failure_leaves_previous_index_untouched() {
    let server = MockServer::start().await;
    mount_panel_state(
        &server,
        vec![user_json(7, "uuid-1")],
        vec![server_json(99, 7)],
    )
    .await;

    let store = Arc::new(MemoryStore::new());
    store.set("uuid-1", "ext-42").unwrap();

    let mut provisioner = provisioner_for(&server, store);
    provisioner.reconcile().await.unwrap();
    let before = provisioner.index().clone();

    // Replace the panel with one whose listings fail.
    server.reset().await;
    Mock::given(method("GET"))
        .and(path("/api/application/users"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/application/servers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(list_json(vec![])))
        .mount(&server)
        .await;

    let result = provisioner.reconcile().await;

    assert!(matches!(result, Err(ProvisionError::Reconcile(_))));
    assert_eq!(provisioner.index(), &before);
}
