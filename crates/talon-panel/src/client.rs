//! Panel Application API HTTP client (reqwest-based).

use reqwest::{Client, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::auth::PanelKey;
use crate::config::PanelConfig;
use crate::error::{PanelError, PanelResult};
use crate::models::{
    Allocation, CreateServerRequest, CreateUserRequest, Fragment, ListResponse, PanelServer,
    PanelUser, UpdateUserRequest,
};

/// Typed client for the panel's Application API.
///
/// Wraps `reqwest::Client` with the `api/application` routing, bearer
/// authentication, and envelope decoding. One instance per panel; cheap to
/// clone.
#[derive(Debug, Clone)]
pub struct ApplicationClient {
    base_url: String,
    api_key: PanelKey,
    http_client: Client,
    list_page_size: u32,
    allocation_page_size: u32,
}

impl ApplicationClient {
    /// Build a client from panel configuration.
    pub fn new(config: &PanelConfig) -> PanelResult<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent("talon-panel/0.1")
            .build()
            .map_err(|e| PanelError::InvalidConfig(format!("failed to build HTTP client: {e}")))?;

        Ok(Self::with_http_client(config, http_client))
    }

    /// Build a client with a pre-built `reqwest::Client` (for testing).
    #[must_use]
    pub fn with_http_client(config: &PanelConfig, http_client: Client) -> Self {
        // Normalize base URL: strip trailing slash.
        let base_url = config.base_url.trim_end_matches('/').to_string();
        Self {
            base_url,
            api_key: config.api_key.clone(),
            http_client,
            list_page_size: config.list_page_size,
            allocation_page_size: config.allocation_page_size,
        }
    }

    /// Get the base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/application/{}", self.base_url, path)
    }

    // ── Connectivity ──────────────────────────────────────────────────

    /// Probe the panel with a lightweight authenticated request.
    ///
    /// `GET nests` is the cheapest endpoint that exercises both the host
    /// and the API key; the body is discarded.
    pub async fn test_connection(&self) -> PanelResult<()> {
        let url = self.url("nests");
        debug!("panel GET {url}");
        let response = self.authed(self.http_client.get(&url)).send().await?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            self.handle_error_response(response).await
        }
    }

    // ── User operations ───────────────────────────────────────────────

    /// List all panel users in a single page (`GET users?per_page=N`).
    pub async fn list_users(&self) -> PanelResult<Vec<PanelUser>> {
        let path = format!("users?per_page={}", self.list_page_size);
        let listing: ListResponse<PanelUser> = self.get(&path).await?;
        Ok(listing.into_attributes())
    }

    /// Fetch a user by panel id (`GET users/{id}`).
    pub async fn get_user(&self, id: i64) -> PanelResult<PanelUser> {
        let fragment: Fragment<PanelUser> = self.get(&format!("users/{id}")).await?;
        Ok(fragment.attributes)
    }

    /// Create a user (`POST users`).
    pub async fn create_user(&self, request: &CreateUserRequest) -> PanelResult<PanelUser> {
        let fragment: Fragment<PanelUser> = self.post("users", request).await?;
        Ok(fragment.attributes)
    }

    /// Update a user, replacing every field (`PATCH users/{id}`).
    pub async fn update_user(
        &self,
        id: i64,
        request: &UpdateUserRequest,
    ) -> PanelResult<PanelUser> {
        let fragment: Fragment<PanelUser> = self.patch(&format!("users/{id}"), request).await?;
        Ok(fragment.attributes)
    }

    /// Delete a user (`DELETE users/{id}`).
    pub async fn delete_user(&self, id: i64) -> PanelResult<()> {
        self.delete(&format!("users/{id}")).await
    }

    // ── Server operations ─────────────────────────────────────────────

    /// List all panel servers in a single page (`GET servers?per_page=N`).
    pub async fn list_servers(&self) -> PanelResult<Vec<PanelServer>> {
        let path = format!("servers?per_page={}", self.list_page_size);
        let listing: ListResponse<PanelServer> = self.get(&path).await?;
        Ok(listing.into_attributes())
    }

    /// Fetch a server by panel id (`GET servers/{id}`).
    pub async fn get_server(&self, id: i64) -> PanelResult<PanelServer> {
        let fragment: Fragment<PanelServer> = self.get(&format!("servers/{id}")).await?;
        Ok(fragment.attributes)
    }

    /// Create a server (`POST servers`).
    pub async fn create_server(&self, request: &CreateServerRequest) -> PanelResult<PanelServer> {
        let fragment: Fragment<PanelServer> = self.post("servers", request).await?;
        Ok(fragment.attributes)
    }

    /// Delete a server (`DELETE servers/{id}`).
    pub async fn delete_server(&self, id: i64) -> PanelResult<()> {
        self.delete(&format!("servers/{id}")).await
    }

    // ── Allocations ───────────────────────────────────────────────────

    /// List a node's allocations in a single page
    /// (`GET nodes/{id}/allocations?per_page=N`).
    pub async fn list_allocations(&self, node_id: i64) -> PanelResult<Vec<Allocation>> {
        let path = format!(
            "nodes/{node_id}/allocations?per_page={}",
            self.allocation_page_size
        );
        let listing: ListResponse<Allocation> = self.get(&path).await?;
        Ok(listing.into_attributes())
    }

    // ── Internal HTTP methods ─────────────────────────────────────────

    fn authed(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header("Accept", "application/json")
            .header("Authorization", format!("Bearer {}", self.api_key.expose()))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> PanelResult<T> {
        let url = self.url(path);
        debug!("panel GET {url}");
        let response = self.authed(self.http_client.get(&url)).send().await?;
        self.handle_response(response).await
    }

    async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> PanelResult<T> {
        let url = self.url(path);
        debug!("panel POST {url}");
        let response = self
            .authed(self.http_client.post(&url))
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await?;
        self.handle_response(response).await
    }

    async fn patch<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> PanelResult<T> {
        let url = self.url(path);
        debug!("panel PATCH {url}");
        let response = self
            .authed(self.http_client.patch(&url))
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await?;
        self.handle_response(response).await
    }

    async fn delete(&self, path: &str) -> PanelResult<()> {
        let url = self.url(path);
        debug!("panel DELETE {url}");
        let response = self.authed(self.http_client.delete(&url)).send().await?;

        let status = response.status();
        if status == StatusCode::NO_CONTENT || status.is_success() {
            Ok(())
        } else {
            self.handle_error_response(response).await
        }
    }

    // ── Response handling ─────────────────────────────────────────────

    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> PanelResult<T> {
        let status = response.status();

        if status.is_success() {
            let body = response.text().await?;
            serde_json::from_str(&body)
                .map_err(|e| PanelError::Parse(format!("failed to parse response: {e}")))
        } else {
            self.handle_error_response(response).await
        }
    }

    async fn handle_error_response<T>(&self, response: reqwest::Response) -> PanelResult<T> {
        let status = response.status();

        // Check for Retry-After header (rate limiting).
        let retry_after = response
            .headers()
            .get("Retry-After")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok());

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<no body>".to_string());

        match status {
            StatusCode::NOT_FOUND => Err(PanelError::NotFound(body)),
            StatusCode::UNAUTHORIZED => Err(PanelError::Auth(format!(
                "authentication failed (401): {body}"
            ))),
            StatusCode::TOO_MANY_REQUESTS => {
                warn!("panel rate limited, retry after {retry_after:?}s");
                Err(PanelError::RateLimited {
                    retry_after_secs: retry_after,
                })
            }
            _ => {
                let detail = if body.is_empty() {
                    format!("HTTP {status}")
                } else {
                    body
                };
                Err(PanelError::Api {
                    status: status.as_u16(),
                    detail,
                })
            }
        }
    }
}
