//! Session state and provider callback events.

use crate::reading::LocationReading;

/// Lifecycle state of an acquisition session.
///
/// ```text
/// Idle ──start──► Connecting ──connected──► Connected ──suspended──► Suspended
///                     │                         │                       │
///                     └─failed─► Failed         └────────stop───────────┴──► Stopped
/// ```
///
/// Suspended recovers to Connected when the provider reconnects, or to
/// Connecting when the session is restarted (keep-alive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Never started.
    #[default]
    Idle,
    /// Waiting for the provider to connect.
    Connecting,
    /// Receiving updates.
    Connected,
    /// Provider connection dropped; expected to recover.
    Suspended,
    /// The last attempt failed.
    Failed,
    /// Stopped explicitly.
    Stopped,
}

impl SessionState {
    /// Whether a provider connection is held or being established.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            SessionState::Connecting | SessionState::Connected | SessionState::Suspended
        )
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Connecting => write!(f, "Connecting"),
            Self::Connected => write!(f, "Connected"),
            Self::Suspended => write!(f, "Suspended"),
            Self::Failed => write!(f, "Failed"),
            Self::Stopped => write!(f, "Stopped"),
        }
    }
}

/// Callbacks a location provider delivers to its session.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderEvent {
    /// Connection established (initially or after a suspension).
    Connected,
    /// Connection attempt failed.
    ConnectionFailed(String),
    /// Connection dropped; the provider will try to recover.
    Suspended(String),
    /// A new fix.
    Location(LocationReading),
}

/// What [`AcquisitionSession::start`](super::AcquisitionSession::start) did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// A new connection attempt began.
    Connecting,
    /// A connection attempt is already in flight; it was left alone.
    AlreadyConnecting,
    /// Already connected; nothing to do.
    AlreadyConnected,
    /// The provider rejected the connect request; the session is Failed.
    Failed,
}
