//! Location provider contract.
//!
//! The provider is the external collaborator that owns the actual fix source
//! (a platform API, a GNSS receiver, a simulator). The session drives it
//! through [`LocationProvider`] and the provider reports back through the
//! [`SessionListener`] it received at connect time.

use std::sync::Weak;

use thiserror::Error;

use super::acquisition::SessionCore;
use super::config::AcquisitionConfig;
use super::state::ProviderEvent;
use crate::reading::LocationReading;

/// Failure reported synchronously by a provider call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// The provider could not begin connecting.
    #[error("Provider unavailable: {0}")]
    Unavailable(String),

    /// The provider refused the update request.
    #[error("Update request rejected: {0}")]
    Rejected(String),

    /// Called in a state the provider does not support.
    #[error("Provider not connected")]
    NotConnected,
}

/// A source of location fixes.
///
/// Calls may deliver events to the listener synchronously or from another
/// thread or task. Implementations must tolerate `disconnect` being called
/// at any time, including while a connect is still in flight.
pub trait LocationProvider: Send + Sync {
    /// Begin connecting. The outcome is reported through `listener`.
    ///
    /// The session calls `connect` again only to begin a new attempt (after a
    /// failure, a stop, or an abandoned connect). The new listener replaces
    /// the previous one, and a connect still in flight may be dropped.
    fn connect(&self, listener: SessionListener) -> Result<(), ProviderError>;

    /// Register for updates at the configured interval. Called after every
    /// `Connected` event.
    fn request_updates(&self, config: &AcquisitionConfig) -> Result<(), ProviderError>;

    /// Drop the connection and any update registration.
    fn disconnect(&self);
}

/// Handle a provider uses to report events to its session.
///
/// Each handle is bound to one connection attempt. Events sent through a
/// handle from an earlier attempt, or after the session is gone, are
/// discarded.
#[derive(Clone)]
pub struct SessionListener {
    core: Weak<SessionCore>,
    attempt: u64,
}

impl SessionListener {
    pub(super) fn new(core: Weak<SessionCore>, attempt: u64) -> Self {
        Self { core, attempt }
    }

    /// Connection attempt this handle belongs to.
    pub fn attempt(&self) -> u64 {
        self.attempt
    }

    /// Whether the session still exists.
    pub fn is_attached(&self) -> bool {
        self.core.strong_count() > 0
    }

    /// Deliver a provider event.
    pub fn notify(&self, event: ProviderEvent) {
        let Some(core) = self.core.upgrade() else {
            tracing::trace!(attempt = self.attempt, "Session gone, dropping provider event");
            return;
        };
        core.handle_provider_event(self.attempt, event);
    }

    /// Shorthand for `notify(ProviderEvent::Connected)`.
    pub fn connected(&self) {
        self.notify(ProviderEvent::Connected);
    }

    /// Shorthand for `notify(ProviderEvent::ConnectionFailed(..))`.
    pub fn connection_failed(&self, reason: impl Into<String>) {
        self.notify(ProviderEvent::ConnectionFailed(reason.into()));
    }

    /// Shorthand for `notify(ProviderEvent::Suspended(..))`.
    pub fn suspended(&self, cause: impl Into<String>) {
        self.notify(ProviderEvent::Suspended(cause.into()));
    }

    /// Shorthand for `notify(ProviderEvent::Location(..))`.
    pub fn location(&self, reading: LocationReading) {
        self.notify(ProviderEvent::Location(reading));
    }
}

impl std::fmt::Debug for SessionListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionListener")
            .field("attempt", &self.attempt)
            .field("attached", &self.is_attached())
            .finish()
    }
}
