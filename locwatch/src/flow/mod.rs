//! Activation flow.
//!
//! The [`FlowController`] turns an activation request into a running
//! acquisition session, reacting to each precondition failure the way the
//! user expects:
//!
//! ```text
//!                 ┌──────────────────── Retry ─────────────────────┐
//!                 ▼                                                │
//! Activate ──► evaluate gate ──Unsatisfied(connectivity)──► AwaitingConnectivity
//!                 │   │                                            │ Dismiss
//!                 │   └─Unsatisfied(capability)──► CapabilityUnavailable   ▼
//!                 │                                              Abandoned
//!                 ├─Unsatisfied(permission)──► request ──► AwaitingPermission
//!                 │                                          │ granted: resume
//!                 │                                          │ denied:  PermissionDenied
//!                 │                                          │ opted out: PermissionBlocked
//!                 ▼
//!              Satisfied ──► configure + start session (once) ──► Started
//! ```
//!
//! After a grant the flow resumes according to [`ResumePolicy`]: by default
//! only the permission step is re-checked; [`ResumePolicy::FullGate`]
//! re-runs every check.
//!
//! The controller never blocks on the user. Answers arrive as [`FlowEvent`]s,
//! usually through a [`FlowHandle`] registered as the broker's grant listener
//! and given to the UI collaborator.

mod config;
mod controller;
mod event;
mod handle;

pub use config::{FlowConfig, ResumePolicy};
pub use controller::FlowController;
pub use event::{FlowEvent, FlowPhase, Notice, NotificationSink, UserIntent};
pub use handle::FlowHandle;
