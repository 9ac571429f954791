//! Lifecycle operations over the panel, the association store, and the
//! index.

use std::collections::BTreeMap;
use std::sync::Arc;

use talon_panel::models::{
    AllocationSpec, CreateServerRequest, CreateUserRequest, DeploySpec, FeatureLimits,
    PanelServer, PanelUser, ServerLimits, UpdateUserRequest,
};
use talon_panel::ApplicationClient;
use talon_store::{Association, AssociationStore};
use tracing::{debug, info, warn};

use crate::error::{ProvisionError, ProvisionResult};
use crate::index::ResourceIndex;
use crate::reconciler::{self, ReconcileStats};

/// Startup command baked into every provisioned server.
const SERVER_STARTUP: &str = "/start.sh";

/// Name shown until the owner renames the server from its settings.
const SERVER_NAME_PLACEHOLDER: &str = "Server -> Settings to set a name";

const PLACEHOLDER_FIRST_NAME: &str = "Managed";
const PLACEHOLDER_LAST_NAME: &str = "Account";

/// Runtime a provisioned server boots into; selects the egg and docker
/// image pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeVariant {
    Node16,
    Node18,
}

impl RuntimeVariant {
    fn egg(self) -> i64 {
        match self {
            Self::Node16 => 16,
            Self::Node18 => 15,
        }
    }

    fn docker_image(self) -> &'static str {
        match self {
            Self::Node16 => "quay.io/yajtpg/pterodactyl-images:nodejs-16",
            Self::Node18 => "quay.io/yajtpg/pterodactyl-images:nodejs-18",
        }
    }
}

/// Orchestrates the user and server lifecycle against the panel.
///
/// Owns the [`ResourceIndex`]. Every index or store mutation happens only
/// after the corresponding remote call has confirmed success, so a failed
/// operation leaves both exactly as they were.
///
/// Operations are well-defined only once [`Provisioner::initialize`] has
/// returned `Ok`; before that the index is empty. The index is plain
/// process-local state with no lock: callers run operations from a single
/// logical thread and serialize [`Provisioner::reconcile`] against
/// in-flight operations, or accept that a rebuild may not observe a
/// mutation still awaiting its remote response.
pub struct Provisioner {
    client: ApplicationClient,
    store: Arc<dyn AssociationStore>,
    index: ResourceIndex,
    ready: bool,
}

impl Provisioner {
    /// Create a provisioner. No remote traffic happens here; call
    /// [`Provisioner::initialize`] before anything else.
    #[must_use]
    pub fn new(client: ApplicationClient, store: Arc<dyn AssociationStore>) -> Self {
        Self {
            client,
            store,
            index: ResourceIndex::new(),
            ready: false,
        }
    }

    /// Validate both collaborators, run the first reconciliation, and mark
    /// the provisioner ready.
    ///
    /// Order: association store first (cheap, local), then the panel probe,
    /// then the initial index build. Any failure leaves `ready` false and
    /// is not retried.
    pub async fn initialize(&mut self) -> ProvisionResult<()> {
        self.store.all().map_err(|e| {
            ProvisionError::Initialization(format!("association store unreachable: {e}"))
        })?;

        self.client.test_connection().await.map_err(|e| {
            ProvisionError::Initialization(format!("invalid host or api key: {e}"))
        })?;

        self.reconcile().await.map_err(|e| {
            ProvisionError::Initialization(format!("initial reconciliation failed: {e}"))
        })?;

        self.ready = true;
        info!("provisioner ready");
        Ok(())
    }

    /// Whether initialization completed successfully.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Read-only view of the index.
    #[must_use]
    pub fn index(&self) -> &ResourceIndex {
        &self.index
    }

    /// Rebuild the index from the panel listings and the association
    /// table.
    ///
    /// The existing index is replaced only after every fetch and the join
    /// have completed; a failure leaves it untouched.
    pub async fn reconcile(&mut self) -> ProvisionResult<ReconcileStats> {
        let (index, stats) = reconciler::rebuild(&self.client, self.store.as_ref()).await?;
        self.index = index;

        info!(
            linked_users = stats.linked_users,
            linked_servers = stats.linked_servers,
            "reconciliation complete"
        );
        Ok(stats)
    }

    // ── User lifecycle ────────────────────────────────────────────────

    /// Create a panel user for an external identity and link it.
    ///
    /// The create call uses placeholder naming; a follow-up update sets the
    /// real password, echoing the generated attributes back. The index and
    /// association record are written between the two calls, so a failed
    /// finalize leaves a linked user with placeholder credentials and
    /// surfaces as the update's error.
    pub async fn create_user(
        &mut self,
        external_id: &str,
        email: &str,
        password: &str,
    ) -> ProvisionResult<PanelUser> {
        let request = CreateUserRequest {
            email: email.to_string(),
            username: placeholder_username(external_id),
            first_name: PLACEHOLDER_FIRST_NAME.to_string(),
            last_name: PLACEHOLDER_LAST_NAME.to_string(),
        };

        let created = self
            .client
            .create_user(&request)
            .await
            .map_err(ProvisionError::UserCreate)?;

        self.index.link_user(external_id, created.id);
        self.store.set(&created.uuid, external_id)?;

        info!(external_id, user_id = created.id, "panel user created");

        self.update_user(
            external_id,
            &created.email,
            &created.username,
            password,
            &created.first_name,
            &created.last_name,
        )
        .await?;

        Ok(created)
    }

    /// Replace every mutable field of the linked panel user.
    pub async fn update_user(
        &self,
        external_id: &str,
        email: &str,
        username: &str,
        password: &str,
        first_name: &str,
        last_name: &str,
    ) -> ProvisionResult<PanelUser> {
        let user_id = self.linked_user(external_id)?;

        let request = UpdateUserRequest {
            email: email.to_string(),
            username: username.to_string(),
            password: password.to_string(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
        };

        self.client
            .update_user(user_id, &request)
            .await
            .map_err(ProvisionError::UserUpdate)
    }

    /// Delete the linked panel user, its association record, and its index
    /// entries.
    pub async fn delete_user(&mut self, external_id: &str) -> ProvisionResult<()> {
        let user_id = self.linked_user(external_id)?;

        self.client
            .delete_user(user_id)
            .await
            .map_err(ProvisionError::UserDelete)?;

        self.clean_association(external_id)?;
        self.index.unlink_user(external_id);

        info!(external_id, user_id, "panel user deleted");
        Ok(())
    }

    /// Fetch the full panel record for the linked user.
    pub async fn fetch_user(&self, external_id: &str) -> ProvisionResult<PanelUser> {
        let user_id = self.linked_user(external_id)?;
        self.client
            .get_user(user_id)
            .await
            .map_err(ProvisionError::UserFetch)
    }

    // ── Server lifecycle ──────────────────────────────────────────────

    /// Port of the first unassigned allocation on a node.
    ///
    /// Advisory only: nothing reserves the allocation, so a concurrent
    /// creation can claim the same port first. The panel's own validation
    /// is the backstop.
    pub async fn first_free_allocation(&self, node_id: i64) -> ProvisionResult<Option<u16>> {
        let allocations = self
            .client
            .list_allocations(node_id)
            .await
            .map_err(ProvisionError::ServerCreate)?;

        Ok(allocations
            .into_iter()
            .find(|allocation| !allocation.assigned)
            .map(|allocation| allocation.port))
    }

    /// Create a server for the identity's panel user.
    ///
    /// Picks the first free allocation on the node. When none is free the
    /// create is still attempted with a null allocation and the panel's
    /// rejection is surfaced as [`ProvisionError::ServerCreate`].
    pub async fn create_server(
        &mut self,
        external_id: &str,
        limits: ServerLimits,
        node_id: i64,
        location_id: i64,
        runtime: RuntimeVariant,
    ) -> ProvisionResult<PanelServer> {
        let user_id = self.linked_user(external_id)?;

        let allocation = self.first_free_allocation(node_id).await?;
        if allocation.is_none() {
            warn!(node_id, "no free allocation on node; panel will reject the create");
        }

        let request = CreateServerRequest {
            name: SERVER_NAME_PLACEHOLDER.to_string(),
            user: user_id,
            egg: runtime.egg(),
            docker_image: runtime.docker_image().to_string(),
            startup: SERVER_STARTUP.to_string(),
            environment: server_environment(),
            limits,
            feature_limits: FeatureLimits {
                databases: 0,
                backups: 0,
                allocations: 0,
            },
            allocation: AllocationSpec {
                default: allocation,
            },
            deploy: DeploySpec {
                locations: vec![location_id],
                dedicated_ip: false,
                port_range: allocation.map(|port| port.to_string()).into_iter().collect(),
            },
        };

        let created = self
            .client
            .create_server(&request)
            .await
            .map_err(ProvisionError::ServerCreate)?;

        self.index.append_server(user_id, created.id);

        info!(
            external_id,
            user_id,
            server_id = created.id,
            "panel server created"
        );
        Ok(created)
    }

    /// Fetch a server by panel id. Passthrough; no ownership check.
    pub async fn fetch_server(&self, server_id: i64) -> ProvisionResult<PanelServer> {
        self.client
            .get_server(server_id)
            .await
            .map_err(ProvisionError::ServerFetch)
    }

    /// Delete a server owned by the identity's panel user.
    ///
    /// Removes exactly the first indexed occurrence on success.
    pub async fn delete_server(
        &mut self,
        external_id: &str,
        server_id: i64,
    ) -> ProvisionResult<()> {
        let user_id = self.linked_user(external_id)?;
        if !self.index.owns_server(user_id, server_id) {
            return Err(ProvisionError::ServerNotOwned {
                external_id: external_id.to_string(),
                server_id,
            });
        }

        self.client
            .delete_server(server_id)
            .await
            .map_err(ProvisionError::ServerDelete)?;

        self.index.remove_server(user_id, server_id);

        info!(external_id, user_id, server_id, "panel server deleted");
        Ok(())
    }

    // ── Internal helpers ──────────────────────────────────────────────

    fn linked_user(&self, external_id: &str) -> ProvisionResult<i64> {
        self.index
            .user_id(external_id)
            .ok_or_else(|| ProvisionError::UnknownIdentity(external_id.to_string()))
    }

    /// Delete the association record whose value is this external
    /// identity, if exactly one exists. Zero or multiple matches leave the
    /// store untouched.
    fn clean_association(&self, external_id: &str) -> ProvisionResult<()> {
        let records = self.store.all()?;
        let matches: Vec<&Association> = records
            .iter()
            .filter(|record| record.external_id == external_id)
            .collect();

        if let [record] = matches.as_slice() {
            self.store.delete(&record.user_uuid)?;
        } else {
            debug!(
                external_id,
                matches = matches.len(),
                "association cleanup skipped"
            );
        }
        Ok(())
    }
}

/// Deterministic placeholder username derived from the external identity.
///
/// Values are cosmetic and may be replaced by the finalize update.
/// Non-alphanumeric characters are dropped so the result is always a valid
/// panel username.
fn placeholder_username(external_id: &str) -> String {
    let sanitized: String = external_id
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .collect();
    format!("u{}", sanitized.to_lowercase())
}

fn server_environment() -> BTreeMap<String, String> {
    BTreeMap::from([
        (
            "STARTUP_CMD".to_string(),
            "npm install --save --production".to_string(),
        ),
        ("SECOND_CMD".to_string(), "node .".to_string()),
    ])
}
