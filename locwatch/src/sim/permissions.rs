//! Scripted permission oracle and requester.

use std::collections::VecDeque;
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;

use crate::permission::{Permission, PermissionBroker, PermissionIntent, PermissionOracle, PermissionRequester};

/// How the simulated user answers permission prompts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GrantPolicy {
    /// Grant every prompt.
    #[default]
    Grant,
    /// Deny the first prompt, grant later ones.
    DenyFirst,
    /// Deny every prompt, allowing re-prompts.
    DenyAlways,
    /// Deny and tick "don't ask again".
    DenyPermanently,
}

#[derive(Debug, Default)]
struct PermissionsState {
    granted: bool,
    rationale: bool,
    prompts: u32,
    pending: VecDeque<PermissionIntent>,
    intents: Vec<PermissionIntent>,
}

/// Simulated platform permission store and prompt UI.
///
/// Prompts are queued by [`dispatch`](PermissionRequester::dispatch) and
/// answered by [`resolve_pending`](Self::resolve_pending), or automatically
/// after `response_delay` when auto-respond is enabled and a tokio runtime is
/// available. Answers update the oracle state first and then report to the
/// attached broker.
pub struct SimulatedPermissions {
    policy: GrantPolicy,
    auto_respond: Option<Duration>,
    self_ref: Weak<SimulatedPermissions>,
    broker: Mutex<Weak<PermissionBroker>>,
    state: Mutex<PermissionsState>,
}

impl SimulatedPermissions {
    /// Create with nothing granted; prompts wait for `resolve_pending`.
    pub fn new(policy: GrantPolicy) -> Arc<Self> {
        Self::build(policy, None, false)
    }

    /// Create with prompts answered `delay` after dispatch.
    pub fn auto_responding(policy: GrantPolicy, delay: Duration) -> Arc<Self> {
        Self::build(policy, Some(delay), false)
    }

    /// Create with permissions already granted.
    pub fn pre_granted() -> Arc<Self> {
        Self::build(GrantPolicy::Grant, None, true)
    }

    fn build(policy: GrantPolicy, auto_respond: Option<Duration>, granted: bool) -> Arc<Self> {
        Arc::new_cyclic(|self_ref| Self {
            policy,
            auto_respond,
            self_ref: self_ref.clone(),
            broker: Mutex::new(Weak::new()),
            state: Mutex::new(PermissionsState {
                granted,
                ..Default::default()
            }),
        })
    }

    /// Route answers to `broker`.
    pub fn attach(&self, broker: &Arc<PermissionBroker>) {
        *self.broker.lock() = Arc::downgrade(broker);
    }

    /// Revoke or grant outside of a prompt (settings screen).
    pub fn set_granted(&self, granted: bool) {
        self.state.lock().granted = granted;
    }

    /// Intents dispatched so far.
    pub fn intents(&self) -> Vec<PermissionIntent> {
        self.state.lock().intents.clone()
    }

    /// Prompts waiting for an answer.
    pub fn pending(&self) -> usize {
        self.state.lock().pending.len()
    }

    /// Answer the oldest pending prompt according to the policy.
    ///
    /// Returns the answer, or `None` if nothing was pending.
    pub fn resolve_pending(&self) -> Option<bool> {
        let granted = {
            let mut state = self.state.lock();
            state.pending.pop_front()?;
            state.prompts += 1;

            let granted = match self.policy {
                GrantPolicy::Grant => true,
                GrantPolicy::DenyFirst => state.prompts > 1,
                GrantPolicy::DenyAlways | GrantPolicy::DenyPermanently => false,
            };
            state.granted = granted;
            state.rationale = !granted && self.policy != GrantPolicy::DenyPermanently;
            granted
        };

        tracing::info!(granted, policy = ?self.policy, "Simulated user answered permission prompt");
        let broker = self.broker.lock().upgrade();
        match broker {
            Some(broker) => {
                broker.on_grant_result(granted);
            }
            None => tracing::warn!("No broker attached to simulated permissions"),
        }
        Some(granted)
    }
}

impl PermissionOracle for SimulatedPermissions {
    fn is_granted(&self, _permission: Permission) -> bool {
        self.state.lock().granted
    }

    fn should_show_rationale(&self, _permission: Permission) -> bool {
        self.state.lock().rationale
    }
}

impl PermissionRequester for SimulatedPermissions {
    fn dispatch(&self, intent: PermissionIntent) {
        {
            let mut state = self.state.lock();
            state.intents.push(intent.clone());
            state.pending.push_back(intent);
        }

        let Some(delay) = self.auto_respond else {
            return;
        };
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!("Auto-respond needs a tokio runtime; prompt left pending");
            return;
        };
        let this = self.self_ref.clone();
        runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(permissions) = this.upgrade() {
                permissions.resolve_pending();
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permission::{PermissionState, RequestOutcome};

    fn create_test_broker(permissions: &Arc<SimulatedPermissions>) -> Arc<PermissionBroker> {
        let broker = Arc::new(PermissionBroker::new(permissions.clone(), permissions.clone()));
        permissions.attach(&broker);
        broker
    }

    #[test]
    fn test_grant_policy() {
        let permissions = SimulatedPermissions::new(GrantPolicy::Grant);
        let broker = create_test_broker(&permissions);

        assert_eq!(broker.request(), RequestOutcome::Dispatched { rationale: false });
        assert_eq!(permissions.pending(), 1);
        assert_eq!(permissions.resolve_pending(), Some(true));
        assert_eq!(broker.state(), PermissionState::Granted);
        assert!(permissions.is_granted(Permission::FineLocation));
        assert_eq!(permissions.resolve_pending(), None);
    }

    #[test]
    fn test_deny_first_then_rationale() {
        let permissions = SimulatedPermissions::new(GrantPolicy::DenyFirst);
        let broker = create_test_broker(&permissions);

        broker.request();
        assert_eq!(permissions.resolve_pending(), Some(false));
        assert_eq!(broker.state(), PermissionState::Denied);
        assert!(!broker.is_permanently_denied());

        assert_eq!(broker.request(), RequestOutcome::Dispatched { rationale: true });
        assert!(permissions.intents()[1].shows_rationale());
        assert_eq!(permissions.resolve_pending(), Some(true));
        assert_eq!(broker.state(), PermissionState::Granted);
    }

    #[test]
    fn test_deny_permanently_suppresses() {
        let permissions = SimulatedPermissions::new(GrantPolicy::DenyPermanently);
        let broker = create_test_broker(&permissions);

        broker.request();
        permissions.resolve_pending();
        assert!(broker.is_permanently_denied());
        assert_eq!(broker.request(), RequestOutcome::Suppressed);
        assert_eq!(permissions.intents().len(), 1);
    }

    #[test]
    fn test_pre_granted_needs_no_prompt() {
        let permissions = SimulatedPermissions::pre_granted();
        let broker = create_test_broker(&permissions);
        assert_eq!(broker.request(), RequestOutcome::AlreadyGranted);
    }

    #[tokio::test(start_paused = true)]
    async fn test_auto_respond() {
        let permissions =
            SimulatedPermissions::auto_responding(GrantPolicy::Grant, Duration::from_millis(200));
        let broker = create_test_broker(&permissions);

        broker.request();
        assert_eq!(broker.state(), PermissionState::Requested);

        tokio::time::sleep(Duration::from_millis(250)).await;
        assert_eq!(broker.state(), PermissionState::Granted);
    }
}
