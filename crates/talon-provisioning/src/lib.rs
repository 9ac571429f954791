//! Reconciles an external identity space with panel-managed resources.
//!
//! The panel is the source of truth for which users and servers exist; the
//! association store is the source of truth for which external identity
//! owns which panel user. This crate joins the two into an in-memory
//! [`ResourceIndex`] and keeps that index consistent while lifecycle
//! operations run against a partially failing remote API.
//!
//! Construction is two-phase: [`Provisioner::new`] is infallible and does
//! no I/O; [`Provisioner::initialize`] validates both collaborators, builds
//! the first index, and marks the provisioner ready. The index is never
//! rebuilt on its own after that; call [`Provisioner::reconcile`]
//! explicitly, serialized against in-flight lifecycle operations (the index
//! is deliberately lock-free; see the notes on [`Provisioner`]).

pub mod error;
pub mod index;
pub mod provisioner;
pub mod reconciler;

pub use error::{ProvisionError, ProvisionResult};
pub use index::ResourceIndex;
pub use provisioner::{Provisioner, RuntimeVariant};
pub use reconciler::ReconcileStats;
