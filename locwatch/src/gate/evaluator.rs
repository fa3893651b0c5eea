//! The ordered, short-circuiting precondition evaluator.

use std::sync::Arc;

use super::capability::{Availability, CapabilityProbe};
use super::status::{GateReport, Precondition, PreconditionStatus, UnsatisfiedReason};
use crate::connectivity::ConnectivityProbe;

/// Pure query of the current permission grant.
///
/// Implemented by [`PermissionBroker`](crate::permission::PermissionBroker).
/// Implementations must not prompt the user or change any state.
pub trait PermissionCheck: Send + Sync {
    /// Whether every required permission is granted right now.
    fn check_granted(&self) -> bool;
}

/// Runs capability, connectivity and permission checks in order.
///
/// The gate holds no per-activation state; every call to [`evaluate`]
/// produces a fresh [`GateReport`].
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use locwatch::connectivity::StaticConnectivity;
/// use locwatch::gate::{PermissionCheck, PreconditionGate, PreconditionStatus, StaticCapability};
///
/// struct Granted;
/// impl PermissionCheck for Granted {
///     fn check_granted(&self) -> bool { true }
/// }
///
/// let gate = PreconditionGate::new(
///     Arc::new(StaticCapability::default()),
///     Arc::new(StaticConnectivity::new(true)),
///     Arc::new(Granted),
/// );
/// assert_eq!(gate.evaluate().terminal(), PreconditionStatus::Satisfied);
/// ```
///
/// [`evaluate`]: PreconditionGate::evaluate
pub struct PreconditionGate {
    capability: Arc<dyn CapabilityProbe>,
    connectivity: Arc<dyn ConnectivityProbe>,
    permission: Arc<dyn PermissionCheck>,
}

impl std::fmt::Debug for PreconditionGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreconditionGate").finish_non_exhaustive()
    }
}

impl PreconditionGate {
    /// Create a gate over the three probes.
    pub fn new(
        capability: Arc<dyn CapabilityProbe>,
        connectivity: Arc<dyn ConnectivityProbe>,
        permission: Arc<dyn PermissionCheck>,
    ) -> Self {
        Self {
            capability,
            connectivity,
            permission,
        }
    }

    /// Whether evaluating may block the calling thread.
    pub fn may_block(&self) -> bool {
        self.connectivity.may_block()
    }

    /// Run every check from the start.
    pub fn evaluate(&self) -> GateReport {
        self.evaluate_from(Precondition::Capability)
    }

    /// Run the checks starting at `first`.
    ///
    /// Earlier checks are reported as `Unchecked`. Used to resume after a
    /// permission prompt without re-probing capability and connectivity.
    pub fn evaluate_from(&self, first: Precondition) -> GateReport {
        let mut report = GateReport::default();

        for check in Precondition::ORDER.into_iter().skip(first.index()) {
            let status = self.run_check(check);
            report.record(check, status);

            if let PreconditionStatus::Unsatisfied(reason) = status {
                tracing::debug!(check = %check, reason = ?reason, "Precondition unsatisfied");
                return report;
            }
        }

        tracing::debug!(from = %first, "All preconditions satisfied");
        report
    }

    fn run_check(&self, check: Precondition) -> PreconditionStatus {
        match check {
            Precondition::Capability => match self.capability.availability() {
                Availability::Available => PreconditionStatus::Satisfied,
                Availability::UserResolvable => {
                    PreconditionStatus::Unsatisfied(UnsatisfiedReason::Capability {
                        resolvable: true,
                    })
                }
                Availability::Unavailable => {
                    PreconditionStatus::Unsatisfied(UnsatisfiedReason::Capability {
                        resolvable: false,
                    })
                }
            },
            Precondition::Connectivity => {
                if self.connectivity.is_connected() {
                    PreconditionStatus::Satisfied
                } else {
                    PreconditionStatus::Unsatisfied(UnsatisfiedReason::Connectivity)
                }
            }
            Precondition::Permission => {
                if self.permission.check_granted() {
                    PreconditionStatus::Satisfied
                } else {
                    PreconditionStatus::Unsatisfied(UnsatisfiedReason::Permission)
                }
            }
        }
    }
}
