//! Gateway error taxonomy.

use thiserror::Error;

/// Error from the panel Application API gateway.
///
/// Failures are surfaced exactly once and never retried here; retry policy,
/// if any, belongs to the caller.
#[derive(Debug, Error)]
pub enum PanelError {
    /// Client-side configuration problem (unbuildable HTTP client).
    #[error("invalid panel configuration: {0}")]
    InvalidConfig(String),

    /// Transport-level failure (connect, timeout, TLS).
    #[error("panel request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body did not match the expected envelope.
    #[error("failed to parse panel response: {0}")]
    Parse(String),

    /// The panel rejected the credentials (401).
    #[error("panel authentication failed: {0}")]
    Auth(String),

    /// The resource does not exist on the panel (404).
    #[error("panel resource not found: {0}")]
    NotFound(String),

    /// The panel is rate limiting this key (429).
    #[error("panel rate limited (retry after {retry_after_secs:?}s)")]
    RateLimited { retry_after_secs: Option<u64> },

    /// Any other non-success response.
    #[error("panel returned HTTP {status}: {detail}")]
    Api { status: u16, detail: String },
}

/// Result alias for gateway operations.
pub type PanelResult<T> = Result<T, PanelError>;
