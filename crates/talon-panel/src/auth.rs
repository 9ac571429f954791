//! Application API authentication.

use serde::{Deserialize, Serialize};

/// Application API key for the panel.
///
/// The [`Debug`] impl redacts the key to prevent accidental credential
/// exposure in log output.
#[derive(Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PanelKey(String);

impl PanelKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The raw key, for building the Authorization header.
    pub(crate) fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for PanelKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("PanelKey").field(&"[REDACTED]").finish()
    }
}

impl From<String> for PanelKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl From<&str> for PanelKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_redacts_key() {
        let key = PanelKey::new("super-secret");
        let rendered = format!("{key:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("REDACTED"));
    }
}
