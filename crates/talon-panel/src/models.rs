//! Wire models for the panel Application API.
//!
//! Every single-resource response wraps its payload in an
//! `object`/`attributes` envelope; listings wrap rows in `data` with
//! pagination under `meta`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Envelope around a single resource: `{ "object": ..., "attributes": ... }`.
#[derive(Debug, Clone, Deserialize)]
pub struct Fragment<T> {
    #[serde(default)]
    pub object: String,
    pub attributes: T,
}

/// Envelope around a listing: `{ "object": "list", "data": [...], "meta": ... }`.
#[derive(Debug, Clone, Deserialize)]
pub struct ListResponse<T> {
    pub data: Vec<Fragment<T>>,
    #[serde(default)]
    pub meta: Option<ListMeta>,
}

impl<T> ListResponse<T> {
    /// Unwrap the envelope into the bare attribute rows.
    pub fn into_attributes(self) -> Vec<T> {
        self.data.into_iter().map(|f| f.attributes).collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListMeta {
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Pagination {
    pub total: i64,
    pub count: i64,
    pub per_page: i64,
    pub current_page: i64,
    pub total_pages: i64,
}

/// A panel user record (Application API `users` resource).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PanelUser {
    pub id: i64,
    /// Stable identifier; the association store keys records by it.
    pub uuid: String,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

/// A panel server record (Application API `servers` resource).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PanelServer {
    pub id: i64,
    #[serde(default)]
    pub uuid: String,
    #[serde(default)]
    pub name: String,
    /// Owning panel user id.
    pub user: i64,
}

/// A network allocation on a node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Allocation {
    pub id: i64,
    #[serde(default)]
    pub ip: String,
    pub port: u16,
    pub assigned: bool,
    #[serde(default)]
    pub alias: Option<String>,
}

/// Body for `POST users`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

/// Body for `PATCH users/{id}`.
///
/// The panel replaces every field at once; there is no partial-update form.
#[derive(Debug, Clone, Serialize)]
pub struct UpdateUserRequest {
    pub email: String,
    pub username: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

/// Resource limits for a server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerLimits {
    pub memory: i64,
    pub swap: i64,
    pub disk: i64,
    pub io: i64,
    pub cpu: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct FeatureLimits {
    pub databases: i64,
    pub backups: i64,
    pub allocations: i64,
}

/// Default allocation assignment for a new server. `default` is `null` when
/// no free allocation was found; the panel rejects such a create.
#[derive(Debug, Clone, Serialize)]
pub struct AllocationSpec {
    pub default: Option<u16>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeploySpec {
    pub locations: Vec<i64>,
    pub dedicated_ip: bool,
    pub port_range: Vec<String>,
}

/// Body for `POST servers`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateServerRequest {
    pub name: String,
    pub user: i64,
    pub egg: i64,
    pub docker_image: String,
    pub startup: String,
    pub environment: BTreeMap<String, String>,
    pub limits: ServerLimits,
    pub feature_limits: FeatureLimits,
    pub allocation: AllocationSpec,
    pub deploy: DeploySpec,
}
