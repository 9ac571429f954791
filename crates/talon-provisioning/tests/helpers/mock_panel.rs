//! Wiremock fixtures for the panel Application API.

#![allow(dead_code)]

use std::sync::Arc;

use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use talon_panel::{ApplicationClient, PanelConfig};
use talon_provisioning::Provisioner;
use talon_store::AssociationStore;

/// Client wired to a wiremock server.
pub fn client_for(server: &MockServer) -> ApplicationClient {
    let config = PanelConfig::new(server.uri(), "test-key-123");
    ApplicationClient::with_http_client(&config, reqwest::Client::new())
}

/// Provisioner wired to a wiremock server and the given store.
pub fn provisioner_for(server: &MockServer, store: Arc<dyn AssociationStore>) -> Provisioner {
    Provisioner::new(client_for(server), store)
}

/// A user envelope the way the panel renders one.
pub fn user_json(id: i64, uuid: &str) -> Value {
    json!({
        "object": "user",
        "attributes": {
            "id": id,
            "uuid": uuid,
            "username": format!("u{id}"),
            "email": format!("u{id}@example.com"),
            "first_name": "Managed",
            "last_name": "Account"
        }
    })
}

/// A server envelope the way the panel renders one.
pub fn server_json(id: i64, owner: i64) -> Value {
    json!({
        "object": "server",
        "attributes": {
            "id": id,
            "uuid": format!("srv-{id}"),
            "name": format!("srv-{id}"),
            "user": owner
        }
    })
}

/// An allocation envelope the way the panel renders one.
pub fn allocation_json(id: i64, port: u16, assigned: bool) -> Value {
    json!({
        "object": "allocation",
        "attributes": {"id": id, "ip": "10.0.0.1", "port": port, "assigned": assigned}
    })
}

/// A listing envelope around the given rows.
pub fn list_json(rows: Vec<Value>) -> Value {
    json!({"object": "list", "data": rows})
}

/// Mount everything `initialize` touches: the connectivity probe plus both
/// listings.
pub async fn mount_panel_state(server: &MockServer, users: Vec<Value>, servers: Vec<Value>) {
    Mock::given(method("GET"))
        .and(path("/api/application/nests"))
        .respond_with(ResponseTemplate::new(200).set_body_json(list_json(vec![])))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/application/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(list_json(users)))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/application/servers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(list_json(servers)))
        .mount(server)
        .await;
}
