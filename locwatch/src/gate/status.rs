//! Status types produced by the precondition gate.

use crate::error::LocationError;

/// One of the checks the gate runs, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Precondition {
    /// The platform location capability is present.
    Capability,
    /// The network is reachable.
    Connectivity,
    /// The location permission is granted.
    Permission,
}

impl Precondition {
    /// All checks in evaluation order.
    pub const ORDER: [Precondition; 3] = [
        Precondition::Capability,
        Precondition::Connectivity,
        Precondition::Permission,
    ];

    /// Position in [`Precondition::ORDER`].
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Precondition::Capability => 0,
            Precondition::Connectivity => 1,
            Precondition::Permission => 2,
        }
    }
}

impl std::fmt::Display for Precondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Capability => write!(f, "capability"),
            Self::Connectivity => write!(f, "connectivity"),
            Self::Permission => write!(f, "permission"),
        }
    }
}

/// Why a check failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnsatisfiedReason {
    /// Location capability missing.
    Capability {
        /// Whether the platform offers a user-facing fix.
        resolvable: bool,
    },
    /// Network unreachable.
    Connectivity,
    /// Permission not granted.
    Permission,
}

impl UnsatisfiedReason {
    /// The check that produced this reason.
    pub fn precondition(&self) -> Precondition {
        match self {
            UnsatisfiedReason::Capability { .. } => Precondition::Capability,
            UnsatisfiedReason::Connectivity => Precondition::Connectivity,
            UnsatisfiedReason::Permission => Precondition::Permission,
        }
    }
}

impl From<UnsatisfiedReason> for LocationError {
    fn from(reason: UnsatisfiedReason) -> Self {
        match reason {
            UnsatisfiedReason::Capability { resolvable } => {
                LocationError::CapabilityUnavailable { resolvable }
            }
            UnsatisfiedReason::Connectivity => LocationError::ConnectivityUnavailable,
            UnsatisfiedReason::Permission => LocationError::PermissionDenied { permanent: false },
        }
    }
}

/// Result of a single check within one activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PreconditionStatus {
    /// Not evaluated (an earlier check failed, or evaluation started later).
    #[default]
    Unchecked,
    /// The check passed.
    Satisfied,
    /// The check failed.
    Unsatisfied(UnsatisfiedReason),
}

impl PreconditionStatus {
    /// Whether this status is [`PreconditionStatus::Satisfied`].
    pub fn is_satisfied(&self) -> bool {
        matches!(self, PreconditionStatus::Satisfied)
    }
}

/// The statuses of one gate evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GateReport {
    statuses: [PreconditionStatus; 3],
}

impl GateReport {
    pub(super) fn record(&mut self, check: Precondition, status: PreconditionStatus) {
        self.statuses[check.index()] = status;
    }

    /// Status of a single check.
    pub fn status(&self, check: Precondition) -> PreconditionStatus {
        self.statuses[check.index()]
    }

    /// Statuses in evaluation order.
    pub fn statuses(&self) -> impl Iterator<Item = (Precondition, PreconditionStatus)> + '_ {
        Precondition::ORDER
            .iter()
            .map(move |check| (*check, self.statuses[check.index()]))
    }

    /// The first failing check's reason, if any.
    pub fn failure(&self) -> Option<UnsatisfiedReason> {
        self.statuses.iter().find_map(|status| match status {
            PreconditionStatus::Unsatisfied(reason) => Some(*reason),
            _ => None,
        })
    }

    /// Terminal status of the evaluation.
    ///
    /// `Satisfied` when nothing failed and the permission check (always the
    /// last one run) passed, otherwise `Unsatisfied` naming the first failure.
    pub fn terminal(&self) -> PreconditionStatus {
        if let Some(reason) = self.failure() {
            return PreconditionStatus::Unsatisfied(reason);
        }
        if self.status(Precondition::Permission).is_satisfied() {
            PreconditionStatus::Satisfied
        } else {
            PreconditionStatus::Unchecked
        }
    }

    /// Whether the evaluation ended in `Satisfied`.
    pub fn is_satisfied(&self) -> bool {
        self.terminal().is_satisfied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_report_is_unchecked() {
        let report = GateReport::default();
        assert_eq!(report.terminal(), PreconditionStatus::Unchecked);
        assert!(report.failure().is_none());
    }

    #[test]
    fn test_first_failure_wins() {
        let mut report = GateReport::default();
        report.record(Precondition::Capability, PreconditionStatus::Satisfied);
        report.record(
            Precondition::Connectivity,
            PreconditionStatus::Unsatisfied(UnsatisfiedReason::Connectivity),
        );

        assert_eq!(
            report.terminal(),
            PreconditionStatus::Unsatisfied(UnsatisfiedReason::Connectivity)
        );
        assert_eq!(report.status(Precondition::Permission), PreconditionStatus::Unchecked);
    }

    #[test]
    fn test_statuses_in_order() {
        let report = GateReport::default();
        let order: Vec<_> = report.statuses().map(|(check, _)| check).collect();
        assert_eq!(order, Precondition::ORDER.to_vec());
    }

    #[test]
    fn test_reason_maps_to_location_error() {
        let err: LocationError = UnsatisfiedReason::Capability { resolvable: true }.into();
        assert_eq!(err, LocationError::CapabilityUnavailable { resolvable: true });
        assert_eq!(
            UnsatisfiedReason::Permission.precondition(),
            Precondition::Permission
        );
    }
}
