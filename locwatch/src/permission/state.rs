//! Permission vocabulary shared by the broker and its collaborators.

/// A platform permission the location flow depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    /// Precise location.
    FineLocation,
    /// Approximate location.
    CoarseLocation,
}

impl Permission {
    /// Platform identifier for the permission.
    pub fn name(&self) -> &'static str {
        match self {
            Permission::FineLocation => "android.permission.ACCESS_FINE_LOCATION",
            Permission::CoarseLocation => "android.permission.ACCESS_COARSE_LOCATION",
        }
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Permissions that must all be granted before acquisition starts.
pub const LOCATION_PERMISSIONS: [Permission; 2] =
    [Permission::FineLocation, Permission::CoarseLocation];

/// Grant state tracked by the broker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PermissionState {
    /// No prompt issued yet.
    #[default]
    NotRequested,
    /// A prompt is outstanding.
    Requested,
    /// The user granted the permissions.
    Granted,
    /// The user denied the permissions.
    Denied,
}

impl std::fmt::Display for PermissionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotRequested => write!(f, "NotRequested"),
            Self::Requested => write!(f, "Requested"),
            Self::Granted => write!(f, "Granted"),
            Self::Denied => write!(f, "Denied"),
        }
    }
}

/// What the broker asks the UI collaborator to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PermissionIntent {
    /// Explain why the permissions are needed, then prompt.
    ShowRationaleThenRequest(Vec<Permission>),
    /// Prompt directly.
    Request(Vec<Permission>),
}

impl PermissionIntent {
    /// The permissions this intent asks for.
    pub fn permissions(&self) -> &[Permission] {
        match self {
            PermissionIntent::ShowRationaleThenRequest(p) | PermissionIntent::Request(p) => p,
        }
    }

    /// Whether a rationale is shown first.
    pub fn shows_rationale(&self) -> bool {
        matches!(self, PermissionIntent::ShowRationaleThenRequest(_))
    }
}

/// Result of [`PermissionBroker::request_grant`](super::PermissionBroker::request_grant).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    /// An intent was sent to the requester.
    Dispatched {
        /// The intent included a rationale.
        rationale: bool,
    },
    /// A request was already outstanding; nothing was sent.
    AlreadyPending,
    /// Permissions are already granted; nothing was sent.
    AlreadyGranted,
    /// The user opted out of further prompts; nothing was sent.
    Suppressed,
}
