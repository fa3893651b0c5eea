//! Precondition gate.
//!
//! The gate runs the environment checks that must all pass before location
//! acquisition may start. Checks run in a fixed order and evaluation stops at
//! the first failure:
//!
//! ```text
//! capability ──ok──► connectivity ──ok──► permission ──ok──► Satisfied
//!     │                   │                   │
//!     └─fail─► Unsatisfied(Capability)        └─fail─► Unsatisfied(Permission)
//!                         └─fail─► Unsatisfied(Connectivity)
//! ```
//!
//! Checks after a failure are left [`PreconditionStatus::Unchecked`]. The gate
//! never requests permission or shows UI; the flow controller reacts to the
//! reason carried in the terminal status.

mod capability;
mod evaluator;
mod status;

pub use capability::{Availability, CapabilityProbe, StaticCapability};
pub use evaluator::{PermissionCheck, PreconditionGate};
pub use status::{GateReport, Precondition, PreconditionStatus, UnsatisfiedReason};
