//! In-process collaborators.
//!
//! Simulated implementations of every external collaborator trait, used by
//! the CLI host and by the test suite:
//!
//! - [`SimulatedProvider`]: a [`LocationProvider`] that emits readings on a
//!   tokio timer, with connect-failure and suspension injection.
//! - [`SimulatedPermissions`]: a [`PermissionOracle`] and
//!   [`PermissionRequester`] whose answers follow a [`GrantPolicy`].
//! - [`RecordingSink`] and [`LoggingSink`]: [`NotificationSink`]s.
//!
//! [`LocationProvider`]: crate::session::LocationProvider
//! [`PermissionOracle`]: crate::permission::PermissionOracle
//! [`PermissionRequester`]: crate::permission::PermissionRequester
//! [`NotificationSink`]: crate::flow::NotificationSink

mod notices;
mod permissions;
mod provider;

pub use notices::{LoggingSink, RecordingSink};
pub use permissions::{GrantPolicy, SimulatedPermissions};
pub use provider::{SimConfig, SimulatedProvider};
