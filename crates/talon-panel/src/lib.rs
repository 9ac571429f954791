//! Typed async client for the panel's Application API.
//!
//! Wraps `reqwest` with the `api/application` routing, bearer
//! authentication, and the panel's `object`/`attributes` response
//! envelopes. The client is deliberately thin: it surfaces every
//! non-success response as a typed [`PanelError`] and implements no retry
//! or backoff policy; callers decide what a failure means.

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod models;

pub use auth::PanelKey;
pub use client::ApplicationClient;
pub use config::PanelConfig;
pub use error::{PanelError, PanelResult};
