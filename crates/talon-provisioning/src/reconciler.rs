//! Rebuilds the index from the panel listings and the association table.
//!
//! The join runs over fully materialized listings with no per-row I/O, so
//! a reconciliation either completes entirely or leaves the caller's index
//! untouched.

use std::collections::HashMap;

use talon_panel::models::{PanelServer, PanelUser};
use talon_panel::ApplicationClient;
use talon_store::{Association, AssociationStore};
use tracing::{debug, warn};

use crate::error::{ProvisionError, ProvisionResult};
use crate::index::ResourceIndex;

/// Counters from a reconciliation run.
///
/// `skipped_users` and `skipped_servers` count rows dropped by the
/// ambiguous-join policy: a remote row whose association match is anything
/// other than exactly one is omitted from the index rather than guessed at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileStats {
    pub total_users: usize,
    pub total_servers: usize,
    pub linked_users: usize,
    pub linked_servers: usize,
    pub skipped_users: usize,
    pub skipped_servers: usize,
}

/// Fetch both listings and the association table, then join.
///
/// The two listings are independent reads and are fetched concurrently;
/// the join only runs once both (and the association table) are fully in
/// memory. Any fetch failure aborts before an index is produced.
pub(crate) async fn rebuild(
    client: &ApplicationClient,
    store: &dyn AssociationStore,
) -> ProvisionResult<(ResourceIndex, ReconcileStats)> {
    let (users, servers) = tokio::try_join!(client.list_users(), client.list_servers())
        .map_err(ProvisionError::Reconcile)?;
    let records = store.all()?;

    debug!(
        users = users.len(),
        servers = servers.len(),
        records = records.len(),
        "fetched reconciliation inputs"
    );

    Ok(join(&users, &servers, &records))
}

/// Pure join over fully materialized inputs.
///
/// An identity enters the index iff exactly one association record carries
/// its value and that record's key matches exactly one listed user's uuid.
/// A server enters iff exactly one indexed user owns it. Everything else is
/// skipped and counted.
pub(crate) fn join(
    users: &[PanelUser],
    servers: &[PanelServer],
    records: &[Association],
) -> (ResourceIndex, ReconcileStats) {
    let mut stats = ReconcileStats {
        total_users: users.len(),
        total_servers: servers.len(),
        ..ReconcileStats::default()
    };

    // Duplicate external identities across records, or duplicate uuids
    // across users, make every match for that row ambiguous.
    let mut value_counts: HashMap<&str, usize> = HashMap::new();
    for record in records {
        *value_counts.entry(record.external_id.as_str()).or_insert(0) += 1;
    }
    let mut uuid_counts: HashMap<&str, usize> = HashMap::new();
    for user in users {
        *uuid_counts.entry(user.uuid.as_str()).or_insert(0) += 1;
    }

    let mut linked: HashMap<String, i64> = HashMap::new();
    for user in users {
        let matches: Vec<&Association> = records
            .iter()
            .filter(|record| record.user_uuid == user.uuid)
            .collect();

        let unambiguous = match matches.as_slice() {
            [record] => {
                value_counts.get(record.external_id.as_str()).copied() == Some(1)
                    && uuid_counts.get(user.uuid.as_str()).copied() == Some(1)
            }
            _ => false,
        };

        if unambiguous {
            linked.insert(matches[0].external_id.clone(), user.id);
            stats.linked_users += 1;
        } else {
            stats.skipped_users += 1;
        }
    }

    // An owner is unambiguous iff exactly one indexed identity resolves to
    // that panel user id.
    let mut owner_counts: HashMap<i64, usize> = HashMap::new();
    for user_id in linked.values() {
        *owner_counts.entry(*user_id).or_insert(0) += 1;
    }

    let mut owned: HashMap<i64, Vec<i64>> = HashMap::new();
    for server in servers {
        if owner_counts.get(&server.user).copied() == Some(1) {
            owned.entry(server.user).or_default().push(server.id);
            stats.linked_servers += 1;
        } else {
            stats.skipped_servers += 1;
        }
    }

    if stats.skipped_users > 0 || stats.skipped_servers > 0 {
        warn!(
            skipped_users = stats.skipped_users,
            skipped_servers = stats.skipped_servers,
            "ambiguous association matches skipped during reconciliation"
        );
    }

    (ResourceIndex::from_parts(linked, owned), stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: i64, uuid: &str) -> PanelUser {
        PanelUser {
            id,
            uuid: uuid.to_string(),
            username: format!("u{id}"),
            email: format!("u{id}@example.com"),
            first_name: String::new(),
            last_name: String::new(),
        }
    }

    fn server(id: i64, owner: i64) -> PanelServer {
        PanelServer {
            id,
            uuid: String::new(),
            name: String::new(),
            user: owner,
        }
    }

    fn record(user_uuid: &str, external_id: &str) -> Association {
        Association {
            user_uuid: user_uuid.to_string(),
            external_id: external_id.to_string(),
        }
    }

    #[test]
    fn links_user_and_server_on_exact_match() {
        let (index, stats) = join(
            &[user(7, "uuid-1")],
            &[server(99, 7)],
            &[record("uuid-1", "ext-42")],
        );

        assert_eq!(index.user_id("ext-42"), Some(7));
        assert_eq!(index.servers_for("ext-42"), &[99]);
        assert_eq!(stats.linked_users, 1);
        assert_eq!(stats.linked_servers, 1);
        assert_eq!(stats.skipped_users, 0);
        assert_eq!(stats.skipped_servers, 0);
    }

    #[test]
    fn user_without_record_is_skipped() {
        let (index, stats) = join(&[user(7, "uuid-1")], &[], &[]);

        assert_eq!(index.linked_users(), 0);
        assert_eq!(stats.skipped_users, 1);
    }

    #[test]
    fn duplicate_record_values_skip_the_identity() {
        let (index, stats) = join(
            &[user(7, "uuid-1"), user(8, "uuid-2")],
            &[],
            &[record("uuid-1", "ext-42"), record("uuid-2", "ext-42")],
        );

        assert!(!index.is_linked("ext-42"));
        assert_eq!(stats.skipped_users, 2);
    }

    #[test]
    fn server_with_unindexed_owner_is_skipped() {
        let (index, stats) = join(
            &[user(7, "uuid-1")],
            &[server(99, 7), server(100, 8)],
            &[record("uuid-1", "ext-42")],
        );

        assert_eq!(index.servers_for("ext-42"), &[99]);
        assert_eq!(stats.linked_servers, 1);
        assert_eq!(stats.skipped_servers, 1);
    }

    #[test]
    fn server_order_follows_listing_order() {
        let (index, _) = join(
            &[user(7, "uuid-1")],
            &[server(99, 7), server(12, 7), server(45, 7)],
            &[record("uuid-1", "ext-42")],
        );

        assert_eq!(index.servers_for("ext-42"), &[99, 12, 45]);
    }

    #[test]
    fn join_is_idempotent_on_identical_inputs() {
        let users = [user(7, "uuid-1"), user(8, "uuid-2")];
        let servers = [server(99, 7), server(100, 8), server(101, 7)];
        let records = [record("uuid-1", "ext-42"), record("uuid-2", "ext-43")];

        let (first, first_stats) = join(&users, &servers, &records);
        let (second, second_stats) = join(&users, &servers, &records);

        assert_eq!(first, second);
        assert_eq!(first_stats, second_stats);
    }
}
