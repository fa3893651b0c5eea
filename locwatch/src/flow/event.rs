//! Flow inputs, phases and user-facing notices.

/// A user answer to a blocking prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserIntent {
    /// Try again.
    Retry,
    /// Give up on this activation.
    Dismiss,
}

/// Input to the [`FlowController`](super::FlowController).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowEvent {
    /// The host asks for location (screen shown, app foregrounded).
    Activate,
    /// The user answered a prompt.
    UserIntent(UserIntent),
    /// An outstanding permission prompt resolved.
    PermissionResolved {
        /// Whether the user granted the permissions.
        granted: bool,
    },
}

/// Where the flow currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlowPhase {
    /// Not activated yet.
    #[default]
    Idle,
    /// Location capability missing; needs re-activation after the user
    /// fixes it.
    CapabilityUnavailable,
    /// Waiting for the user to retry after a connectivity failure.
    AwaitingConnectivity,
    /// A permission prompt is outstanding.
    AwaitingPermission,
    /// Permission denied; waiting for the user to retry or dismiss.
    PermissionDenied,
    /// Permission denied with "don't ask again".
    PermissionBlocked,
    /// The user dismissed a prompt.
    Abandoned,
    /// The session was started.
    Started,
}

impl std::fmt::Display for FlowPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FlowPhase::Idle => "idle",
            FlowPhase::CapabilityUnavailable => "capability-unavailable",
            FlowPhase::AwaitingConnectivity => "awaiting-connectivity",
            FlowPhase::AwaitingPermission => "awaiting-permission",
            FlowPhase::PermissionDenied => "permission-denied",
            FlowPhase::PermissionBlocked => "permission-blocked",
            FlowPhase::Abandoned => "abandoned",
            FlowPhase::Started => "started",
        };
        f.write_str(name)
    }
}

/// Something the UI collaborator should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    /// The location capability is missing. When `resolvable`, the platform
    /// offers the user a fix.
    CapabilityUnavailable { resolvable: bool },
    /// Blocking prompt: connect to a network, then Retry or Dismiss.
    ConnectivityRequired,
    /// The permission prompt was denied; Retry re-prompts, Dismiss gives up.
    PermissionDenied,
    /// The user opted out of permission prompts; only a settings change helps.
    PermissionBlocked,
}

impl Notice {
    /// Whether the notice expects a [`UserIntent`] answer.
    pub fn expects_answer(&self) -> bool {
        matches!(self, Notice::ConnectivityRequired | Notice::PermissionDenied)
    }
}

/// External UI collaborator that shows notices.
///
/// Answers (Retry/Dismiss) come back as [`FlowEvent::UserIntent`] through a
/// [`FlowHandle`](super::FlowHandle). `present` must not block.
pub trait NotificationSink: Send + Sync {
    /// Show `notice`.
    fn present(&self, notice: Notice);
}
