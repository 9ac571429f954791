//! Provisioning error taxonomy.
//!
//! Every remote failure aborts its operation with no index or store
//! mutation; the variants below tell the caller which operation failed.
//! Unknown identities and non-owned servers get their own variants so
//! "not found locally" is distinguishable from "remote rejected".

use talon_panel::PanelError;
use talon_store::StoreError;
use thiserror::Error;

/// Error from index reconciliation or a lifecycle operation.
#[derive(Debug, Error)]
pub enum ProvisionError {
    /// Startup validation failed: bad host/credentials, unreachable store,
    /// or a failed first reconciliation. The provisioner never signals
    /// ready after this.
    #[error("initialization failed: {0}")]
    Initialization(String),

    /// No panel user is linked to this external identity.
    #[error("no panel user linked to external identity {0}")]
    UnknownIdentity(String),

    /// The server does not belong to the identity's panel user.
    #[error("server {server_id} is not owned by external identity {external_id}")]
    ServerNotOwned {
        external_id: String,
        server_id: i64,
    },

    /// Remote user creation failed.
    #[error("user create failed")]
    UserCreate(#[source] PanelError),

    /// Remote user update failed.
    #[error("user update failed")]
    UserUpdate(#[source] PanelError),

    /// Remote user deletion failed.
    #[error("user delete failed")]
    UserDelete(#[source] PanelError),

    /// Remote user fetch failed.
    #[error("user fetch failed")]
    UserFetch(#[source] PanelError),

    /// Remote server creation failed, including allocation lookup failures
    /// and the panel rejecting a create with no free allocation.
    #[error("server create failed")]
    ServerCreate(#[source] PanelError),

    /// Remote server fetch failed.
    #[error("server fetch failed")]
    ServerFetch(#[source] PanelError),

    /// Remote server deletion failed.
    #[error("server delete failed")]
    ServerDelete(#[source] PanelError),

    /// A listing fetch failed during reconciliation; the previous index is
    /// untouched.
    #[error("reconciliation failed")]
    Reconcile(#[source] PanelError),

    /// The association store failed.
    #[error("association store error")]
    Store(#[from] StoreError),
}

/// Result alias for provisioning operations.
pub type ProvisionResult<T> = Result<T, ProvisionError>;
