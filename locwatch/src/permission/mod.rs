//! Location permission tracking and interactive requests.
//!
//! [`PermissionBroker`] owns the [`PermissionState`] for the lifetime of the
//! process and drives the interactive request cycle:
//!
//! ```text
//! NotRequested ──request_grant──► Requested ──on_grant_result(true)──► Granted
//!                                     ▲   │
//!                        request_grant│   └──on_grant_result(false)──► Denied
//!                                     └──────────────────────────────────┘
//! ```
//!
//! The broker never shows UI itself. It emits a [`PermissionIntent`] to the
//! external [`PermissionRequester`] and waits for the requester to report the
//! result through [`PermissionBroker::on_grant_result`]. Once a result lands
//! the registered [`GrantListener`] (normally the flow controller) is told so
//! it can resume.

mod broker;
mod state;

pub use broker::{GrantListener, PermissionBroker, PermissionOracle, PermissionRequester};
pub use state::{
    Permission, PermissionIntent, PermissionState, RequestOutcome, LOCATION_PERMISSIONS,
};
