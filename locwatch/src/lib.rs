//! Locwatch - precondition-gated live location acquisition
//!
//! This library gates a continuously-updating location stream behind an
//! ordered set of environment preconditions (location capability, network
//! connectivity, user-granted permission). Once every precondition holds it
//! starts an acquisition session and publishes readings to subscribers.
//!
//! # Architecture
//!
//! ```text
//!                      ┌────────────────┐
//!   FlowEvent ───────► │ FlowController │ ──► NotificationSink (UI)
//!                      └───────┬────────┘
//!                              │ evaluate()
//!                              ▼
//!   ┌────────────────────────────────────────────────────┐
//!   │ PreconditionGate: capability → connectivity → perm │
//!   └──────────────────────────┬─────────────────────────┘
//!                              │ Satisfied
//!                              ▼
//!   LocationProvider ◄── AcquisitionSession ──► EventBus ──► Subscriptions
//! ```
//!
//! External collaborators (permission prompts, notification dialogs, the
//! platform location provider) are traits. The [`sim`] module ships
//! in-process implementations used by the CLI host and the test suite.

pub mod broadcast;
pub mod bus;
pub mod config;
pub mod connectivity;
pub mod error;
pub mod flow;
pub mod gate;
pub mod logging;
pub mod permission;
pub mod reading;
pub mod session;
pub mod sim;

/// Crate version, as reported by the CLI banner.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
