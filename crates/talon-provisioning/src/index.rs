//! In-memory index of external identities onto panel resources.

use std::collections::HashMap;

/// Index of external identities onto panel users and their servers.
///
/// Rebuilt wholesale by reconciliation, or patched one entry at a time by a
/// lifecycle operation immediately after a confirmed remote success. The
/// index has no persistence of its own; it is always reconstructible from
/// the panel listings and the association store.
///
/// A panel user that owns servers but has no association record never
/// enters the index; it is unreachable by external identity and effectively
/// orphaned, which is acceptable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceIndex {
    /// external identity -> panel user id. At most one user per identity.
    users: HashMap<String, i64>,
    /// panel user id -> owned server ids, insertion-ordered.
    servers: HashMap<i64, Vec<i64>>,
}

impl ResourceIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Panel user id linked to an external identity, if any.
    #[must_use]
    pub fn user_id(&self, external_id: &str) -> Option<i64> {
        self.users.get(external_id).copied()
    }

    /// Whether an external identity is linked to a panel user.
    #[must_use]
    pub fn is_linked(&self, external_id: &str) -> bool {
        self.users.contains_key(external_id)
    }

    /// Server ids owned by the identity's panel user, in insertion order.
    ///
    /// Empty when the identity is unknown or its user owns no servers.
    #[must_use]
    pub fn servers_for(&self, external_id: &str) -> &[i64] {
        self.user_id(external_id)
            .and_then(|user_id| self.servers.get(&user_id))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Number of linked identities.
    #[must_use]
    pub fn linked_users(&self) -> usize {
        self.users.len()
    }

    /// Number of indexed servers across all users.
    #[must_use]
    pub fn indexed_servers(&self) -> usize {
        self.servers.values().map(Vec::len).sum()
    }

    pub(crate) fn from_parts(
        users: HashMap<String, i64>,
        servers: HashMap<i64, Vec<i64>>,
    ) -> Self {
        Self { users, servers }
    }

    /// Link an identity to a freshly created user, with an empty server
    /// list.
    pub(crate) fn link_user(&mut self, external_id: &str, user_id: i64) {
        self.users.insert(external_id.to_string(), user_id);
        self.servers.entry(user_id).or_default();
    }

    /// Remove an identity and its user's server list.
    pub(crate) fn unlink_user(&mut self, external_id: &str) {
        if let Some(user_id) = self.users.remove(external_id) {
            self.servers.remove(&user_id);
        }
    }

    /// Append a server to its owner's list, creating the list if absent.
    pub(crate) fn append_server(&mut self, user_id: i64, server_id: i64) {
        self.servers.entry(user_id).or_default().push(server_id);
    }

    /// Remove the first occurrence of a server id from its owner's list.
    pub(crate) fn remove_server(&mut self, user_id: i64, server_id: i64) {
        if let Some(owned) = self.servers.get_mut(&user_id) {
            if let Some(position) = owned.iter().position(|&id| id == server_id) {
                owned.remove(position);
            }
        }
    }

    /// Whether the user's list contains the server id.
    pub(crate) fn owns_server(&self, user_id: i64, server_id: i64) -> bool {
        self.servers
            .get(&user_id)
            .is_some_and(|owned| owned.contains(&server_id))
    }
}
