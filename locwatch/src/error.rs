//! Failure taxonomy for location acquisition.
//!
//! None of these errors are thrown at the host application. Each one ends up
//! as a state transition plus an observable event (a lifecycle event on the
//! bus, a notice for the UI, or a log line). The types exist so that every
//! component reports failures with the same vocabulary.

use thiserror::Error;

/// Failures the acquisition flow can run into.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocationError {
    /// The platform location capability is missing.
    ///
    /// Fatal for the current activation. Requires external remediation and is
    /// never retried automatically.
    #[error("Location capability unavailable (user-resolvable: {resolvable})")]
    CapabilityUnavailable {
        /// Whether the platform offers the user a way to fix it.
        resolvable: bool,
    },

    /// No network connectivity. Recoverable through a user-triggered retry.
    #[error("No network connectivity")]
    ConnectivityUnavailable,

    /// The user denied the location permission.
    ///
    /// Recoverable by re-requesting unless the platform reported that the
    /// user opted out of further prompts.
    #[error("Location permission denied (permanent: {permanent})")]
    PermissionDenied {
        /// The user chose "don't ask again".
        permanent: bool,
    },

    /// The location provider reported a connection failure.
    #[error("Failed to connect to location provider: {0}")]
    ConnectFailure(String),

    /// A subscriber failed while handling a delivered event.
    #[error("Subscriber {subscriber} failed to handle event: {reason}")]
    UpdateDeliveryFailure {
        /// Subscription identifier.
        subscriber: u64,
        /// Handler-provided failure description.
        reason: String,
    },
}

impl LocationError {
    /// Whether the flow may recover from this failure without the user
    /// fixing something outside the application.
    pub fn is_recoverable(&self) -> bool {
        match self {
            LocationError::CapabilityUnavailable { .. } => false,
            LocationError::ConnectivityUnavailable => true,
            LocationError::PermissionDenied { permanent } => !permanent,
            LocationError::ConnectFailure(_) => true,
            LocationError::UpdateDeliveryFailure { .. } => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = LocationError::ConnectFailure("timeout".to_string());
        assert!(err.to_string().contains("Failed to connect"));
        assert!(err.to_string().contains("timeout"));
    }

    #[test]
    fn test_recoverability() {
        assert!(!LocationError::CapabilityUnavailable { resolvable: true }.is_recoverable());
        assert!(LocationError::ConnectivityUnavailable.is_recoverable());
        assert!(LocationError::PermissionDenied { permanent: false }.is_recoverable());
        assert!(!LocationError::PermissionDenied { permanent: true }.is_recoverable());
    }
}
