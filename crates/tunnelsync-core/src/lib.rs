//! Reconciliation logic between `tunnelsync-api` and the CLI.
//!
//! One pass reads two remote systems and pushes up to two corrections:
//!
//! - **Status readers** ([`status`]): [`read_provider_status`] takes the
//!   tunnel broker's first tunnel; [`read_router_status`] scans the router's
//!   interface view for the external address and the tunnel link-address.
//!   [`gather_status`] runs both concurrently, each under a timeout, and
//!   merges the results into a [`ReconciliationStatus`].
//!
//! - **[`Reconciler`]**: compares the external address with the broker's
//!   client endpoint and the router's tunnel source and corrects whichever
//!   differs. Failures report the corrections already applied.
//!
//! - **Remote seams** ([`remote`]): [`TunnelBroker`] and [`Router`],
//!   implemented for the api crate's clients.

pub mod error;
pub mod link_address;
pub mod model;
pub mod reconcile;
pub mod remote;
pub mod status;

// ── Primary re-exports ──────────────────────────────────────────────
pub use error::CoreError;
pub use link_address::parse_link_address;
pub use model::{InterfaceNames, ProviderStatus, ReconciliationStatus, RouterStatus, TunnelEndpoints};
pub use reconcile::{Action, Correction, ReconcileReport, Reconciler, plan};
pub use remote::{Router, TunnelBroker};
pub use status::{gather_status, read_provider_status, read_router_status};
