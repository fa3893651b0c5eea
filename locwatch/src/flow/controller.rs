//! Flow controller: gate → broker → session orchestration.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::config::{FlowConfig, ResumePolicy};
use super::event::{FlowEvent, FlowPhase, Notice, NotificationSink, UserIntent};
use crate::connectivity::ConnectivityProbe;
use crate::gate::{
    CapabilityProbe, GateReport, PermissionCheck, Precondition, PreconditionGate,
    PreconditionStatus, UnsatisfiedReason,
};
use crate::permission::{PermissionBroker, RequestOutcome};
use crate::session::AcquisitionSession;

/// Drives one location activation from preconditions to a running session.
///
/// The controller is a plain state machine: [`handle`](Self::handle) applies
/// one [`FlowEvent`] and returns the new [`FlowPhase`]. [`run`](Self::run)
/// feeds it from a channel until shutdown.
///
/// The session is started at most once over the controller's lifetime, no
/// matter how many activations or grant callbacks arrive.
pub struct FlowController {
    gate: PreconditionGate,
    broker: Arc<PermissionBroker>,
    session: AcquisitionSession,
    sink: Arc<dyn NotificationSink>,
    config: FlowConfig,
    phase: FlowPhase,
    started: bool,
    activations: u64,
}

impl FlowController {
    /// Create a controller. The broker doubles as the gate's permission check.
    pub fn new(
        capability: Arc<dyn CapabilityProbe>,
        connectivity: Arc<dyn ConnectivityProbe>,
        broker: Arc<PermissionBroker>,
        session: AcquisitionSession,
        sink: Arc<dyn NotificationSink>,
        config: FlowConfig,
    ) -> Self {
        let permission: Arc<dyn PermissionCheck> = broker.clone();
        Self {
            gate: PreconditionGate::new(capability, connectivity, permission),
            broker,
            session,
            sink,
            config,
            phase: FlowPhase::Idle,
            started: false,
            activations: 0,
        }
    }

    /// Current phase.
    pub fn phase(&self) -> FlowPhase {
        self.phase
    }

    /// Whether the session has been started.
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Number of activations processed.
    pub fn activations(&self) -> u64 {
        self.activations
    }

    /// The controlled session.
    pub fn session(&self) -> &AcquisitionSession {
        &self.session
    }

    /// The permission broker.
    pub fn broker(&self) -> &Arc<PermissionBroker> {
        &self.broker
    }

    /// Apply one event.
    pub fn handle(&mut self, event: FlowEvent) -> FlowPhase {
        debug!(?event, phase = %self.phase, "Flow event");

        match event {
            FlowEvent::Activate => self.activate(),
            FlowEvent::UserIntent(intent) => self.user_intent(intent),
            FlowEvent::PermissionResolved { granted } => self.permission_resolved(granted),
        }

        self.phase
    }

    /// Process events until `shutdown` fires or every sender is dropped, then
    /// stop the session.
    ///
    /// When the connectivity probe may block, each event is handled on
    /// tokio's blocking pool so the probe never stalls an async worker.
    pub async fn run(self, mut events: mpsc::UnboundedReceiver<FlowEvent>, shutdown: CancellationToken) {
        let session = self.session.clone();
        let offload = self.gate.may_block();
        let mut controller = self;
        info!(offload, "Flow controller starting");

        loop {
            tokio::select! {
                biased;

                _ = shutdown.cancelled() => {
                    info!("Flow controller shutting down");
                    break;
                }

                event = events.recv() => match event {
                    Some(event) if offload => {
                        let handled = tokio::task::spawn_blocking(move || {
                            controller.handle(event);
                            controller
                        })
                        .await;

                        match handled {
                            Ok(returned) => controller = returned,
                            Err(e) => {
                                error!(error = %e, "Flow event handler failed");
                                session.stop();
                                return;
                            }
                        }
                    }
                    Some(event) => {
                        controller.handle(event);
                    }
                    None => {
                        debug!("Flow event channel closed");
                        break;
                    }
                },
            }
        }

        session.stop();
        info!(phase = %controller.phase, "Flow controller stopped");
    }

    fn activate(&mut self) {
        if self.started {
            debug!("Session already started, ignoring activation");
            return;
        }

        self.activations += 1;
        info!(activation = self.activations, "Activation started");
        let report = self.gate.evaluate();
        self.apply(report);
    }

    fn user_intent(&mut self, intent: UserIntent) {
        match (self.phase, intent) {
            (FlowPhase::AwaitingConnectivity, UserIntent::Retry) => {
                info!("Retrying after connectivity prompt");
                let report = self.gate.evaluate();
                self.apply(report);
            }
            (FlowPhase::PermissionDenied, UserIntent::Retry) => {
                info!("Re-requesting permissions");
                self.request_permission();
            }
            (FlowPhase::AwaitingConnectivity | FlowPhase::PermissionDenied, UserIntent::Dismiss) => {
                info!(phase = %self.phase, "User dismissed prompt, activation abandoned");
                self.phase = FlowPhase::Abandoned;
            }
            (phase, intent) => {
                debug!(%phase, ?intent, "No prompt awaiting this answer");
            }
        }
    }

    fn permission_resolved(&mut self, granted: bool) {
        if self.phase != FlowPhase::AwaitingPermission {
            debug!(phase = %self.phase, granted, "Ignoring unexpected permission result");
            return;
        }

        if !granted {
            if self.broker.is_permanently_denied() {
                self.present(Notice::PermissionBlocked);
                self.phase = FlowPhase::PermissionBlocked;
            } else {
                self.present(Notice::PermissionDenied);
                self.phase = FlowPhase::PermissionDenied;
            }
            return;
        }

        let report = match self.config.resume_policy {
            ResumePolicy::FromPermission => self.gate.evaluate_from(Precondition::Permission),
            ResumePolicy::FullGate => self.gate.evaluate(),
        };
        info!(policy = %self.config.resume_policy, "Permission granted, resuming");
        self.apply(report);
    }

    fn apply(&mut self, report: GateReport) {
        match report.terminal() {
            PreconditionStatus::Satisfied => self.start_session(),
            PreconditionStatus::Unsatisfied(UnsatisfiedReason::Capability { resolvable }) => {
                warn!(resolvable, "Location capability unavailable");
                self.present(Notice::CapabilityUnavailable { resolvable });
                self.phase = FlowPhase::CapabilityUnavailable;
            }
            PreconditionStatus::Unsatisfied(UnsatisfiedReason::Connectivity) => {
                warn!("No network connectivity");
                self.present(Notice::ConnectivityRequired);
                self.phase = FlowPhase::AwaitingConnectivity;
            }
            PreconditionStatus::Unsatisfied(UnsatisfiedReason::Permission) => {
                self.request_permission();
            }
            PreconditionStatus::Unchecked => {
                warn!("Gate evaluation ended without a verdict");
            }
        }
    }

    fn request_permission(&mut self) {
        match self.broker.request() {
            RequestOutcome::Dispatched { .. } | RequestOutcome::AlreadyPending => {
                self.phase = FlowPhase::AwaitingPermission;
            }
            RequestOutcome::AlreadyGranted => {
                // Granted between the check and the request.
                self.start_session();
            }
            RequestOutcome::Suppressed => {
                self.present(Notice::PermissionBlocked);
                self.phase = FlowPhase::PermissionBlocked;
            }
        }
    }

    fn start_session(&mut self) {
        if self.started {
            debug!("Session already started");
            self.phase = FlowPhase::Started;
            return;
        }

        if let Err(e) = self.session.configure(self.config.acquisition) {
            error!(error = %e, "Cannot configure acquisition session");
            self.phase = FlowPhase::Abandoned;
            return;
        }

        self.started = true;
        self.phase = FlowPhase::Started;
        let outcome = self.session.start();
        info!(?outcome, "Acquisition session started");

        if let Some(keep_alive) = self.config.keep_alive {
            self.session.enable_keep_alive(keep_alive);
        }
    }

    fn present(&self, notice: Notice) {
        debug!(?notice, "Presenting notice");
        self.sink.present(notice);
    }
}
