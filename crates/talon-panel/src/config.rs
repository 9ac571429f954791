//! Panel connection configuration.

use serde::{Deserialize, Serialize};

use crate::auth::PanelKey;

/// Connection settings for a panel Application API endpoint.
///
/// `base_url` is the panel root (e.g. `https://panel.example.com`); the
/// client appends `api/application/...` per request. The key must be an
/// application key with access to users, servers, and nodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PanelConfig {
    /// Panel root URL.
    pub base_url: String,

    /// Application API key, sent as a bearer token.
    pub api_key: PanelKey,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Page size for user and server listings. Sized so expected
    /// deployments fit in one page; no cross-page fetch is performed.
    #[serde(default = "default_list_page_size")]
    pub list_page_size: u32,

    /// Page size for node allocation listings.
    #[serde(default = "default_allocation_page_size")]
    pub allocation_page_size: u32,
}

impl PanelConfig {
    /// Config with default timeouts and page sizes.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<PanelKey>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            timeout_secs: default_timeout_secs(),
            list_page_size: default_list_page_size(),
            allocation_page_size: default_allocation_page_size(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_list_page_size() -> u32 {
    60_000
}

fn default_allocation_page_size() -> u32 {
    1_200
}
