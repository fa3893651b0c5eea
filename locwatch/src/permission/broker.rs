//! Permission broker: grant state plus the interactive request cycle.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use super::state::{Permission, PermissionIntent, PermissionState, RequestOutcome};
use super::LOCATION_PERMISSIONS;
use crate::gate::PermissionCheck;

/// Platform view of permission grants.
pub trait PermissionOracle: Send + Sync {
    /// Whether `permission` is currently granted.
    fn is_granted(&self, permission: Permission) -> bool;

    /// Whether the platform recommends explaining why `permission` is needed.
    ///
    /// True after a denial where the user did not opt out of further
    /// prompts. False before the first prompt and after "don't ask again".
    fn should_show_rationale(&self, permission: Permission) -> bool;
}

/// External UI collaborator that shows permission prompts.
///
/// Implementations report the outcome asynchronously through
/// [`PermissionBroker::on_grant_result`]; `dispatch` must not block on user
/// interaction.
pub trait PermissionRequester: Send + Sync {
    /// Present the prompt described by `intent`.
    fn dispatch(&self, intent: PermissionIntent);
}

/// Notified once a prompt resolves.
pub trait GrantListener: Send + Sync {
    /// The outstanding request resolved to `granted`.
    fn on_grant_resolved(&self, granted: bool);
}

#[derive(Debug, Default)]
struct BrokerInner {
    state: PermissionState,
    permanently_denied: bool,
    prompts_issued: u64,
}

/// Tracks permission grant state and drives re-requests.
///
/// One broker lives for the whole process, so once permissions are granted
/// later activations do not prompt again.
pub struct PermissionBroker {
    permissions: Vec<Permission>,
    oracle: Arc<dyn PermissionOracle>,
    requester: Arc<dyn PermissionRequester>,
    inner: Mutex<BrokerInner>,
    listener: RwLock<Option<Arc<dyn GrantListener>>>,
}

impl std::fmt::Debug for PermissionBroker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PermissionBroker")
            .field("permissions", &self.permissions)
            .field("inner", &self.inner)
            .finish_non_exhaustive()
    }
}

impl PermissionBroker {
    /// Create a broker for the location permissions.
    pub fn new(oracle: Arc<dyn PermissionOracle>, requester: Arc<dyn PermissionRequester>) -> Self {
        Self::with_permissions(LOCATION_PERMISSIONS.to_vec(), oracle, requester)
    }

    /// Create a broker for an explicit permission set.
    pub fn with_permissions(
        permissions: Vec<Permission>,
        oracle: Arc<dyn PermissionOracle>,
        requester: Arc<dyn PermissionRequester>,
    ) -> Self {
        Self {
            permissions,
            oracle,
            requester,
            inner: Mutex::new(BrokerInner::default()),
            listener: RwLock::new(None),
        }
    }

    /// Register the listener told about grant results. Replaces any previous one.
    pub fn set_listener(&self, listener: Arc<dyn GrantListener>) {
        *self.listener.write() = Some(listener);
    }

    /// Current grant state.
    pub fn state(&self) -> PermissionState {
        self.inner.lock().state
    }

    /// Whether the user opted out of further prompts.
    pub fn is_permanently_denied(&self) -> bool {
        self.inner.lock().permanently_denied
    }

    /// Number of prompts dispatched so far.
    pub fn prompts_issued(&self) -> u64 {
        self.inner.lock().prompts_issued
    }

    /// Whether a rationale should precede the next prompt.
    pub fn rationale_needed(&self) -> bool {
        self.permissions
            .iter()
            .any(|p| self.oracle.should_show_rationale(*p))
    }

    /// Request the permissions, choosing the rationale flag from the platform.
    pub fn request(&self) -> RequestOutcome {
        self.request_grant(self.rationale_needed())
    }

    /// Ask the requester to prompt for the permissions.
    ///
    /// Moves `NotRequested`/`Denied` to `Requested`. Calls made while a prompt
    /// is already outstanding are coalesced.
    pub fn request_grant(&self, rationale_needed: bool) -> RequestOutcome {
        let intent = {
            let mut inner = self.inner.lock();

            if inner.state == PermissionState::Requested {
                tracing::debug!("Permission request already pending, coalescing");
                return RequestOutcome::AlreadyPending;
            }
            if self.all_granted() {
                tracing::debug!("Permissions already granted, no prompt needed");
                return RequestOutcome::AlreadyGranted;
            }
            if inner.permanently_denied {
                tracing::info!("Permission prompts suppressed by platform opt-out");
                return RequestOutcome::Suppressed;
            }

            inner.state = PermissionState::Requested;
            inner.prompts_issued += 1;

            let permissions = self.permissions.clone();
            if rationale_needed {
                PermissionIntent::ShowRationaleThenRequest(permissions)
            } else {
                PermissionIntent::Request(permissions)
            }
        };

        // Dispatched without the lock: requesters may answer synchronously.
        if intent.shows_rationale() {
            tracing::info!("Displaying permission rationale before requesting");
        } else {
            tracing::info!("Requesting location permissions");
        }
        self.requester.dispatch(intent);

        RequestOutcome::Dispatched {
            rationale: rationale_needed,
        }
    }

    /// Record the outcome of an outstanding prompt and notify the listener.
    ///
    /// Returns `false` (and changes nothing) when no prompt was outstanding.
    pub fn on_grant_result(&self, granted: bool) -> bool {
        {
            let mut inner = self.inner.lock();

            if inner.state != PermissionState::Requested {
                tracing::warn!(
                    state = %inner.state,
                    granted,
                    "Ignoring permission result with no outstanding request"
                );
                return false;
            }

            if granted {
                inner.state = PermissionState::Granted;
                inner.permanently_denied = false;
                tracing::info!("Location permissions granted");
            } else {
                inner.state = PermissionState::Denied;
                // After a denial the platform recommends a rationale unless the
                // user opted out of further prompts.
                inner.permanently_denied = !self.rationale_needed();
                tracing::info!(
                    permanent = inner.permanently_denied,
                    "Location permissions denied"
                );
            }
        }

        let listener = self.listener.read().clone();
        if let Some(listener) = listener {
            listener.on_grant_resolved(granted);
        }
        true
    }

    fn all_granted(&self) -> bool {
        self.permissions.iter().all(|p| self.oracle.is_granted(*p))
    }
}

impl PermissionCheck for PermissionBroker {
    fn check_granted(&self) -> bool {
        self.all_granted()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[derive(Default)]
    struct FakeOracle {
        granted: AtomicBool,
        rationale: AtomicBool,
    }

    impl PermissionOracle for FakeOracle {
        fn is_granted(&self, _permission: Permission) -> bool {
            self.granted.load(Ordering::SeqCst)
        }

        fn should_show_rationale(&self, _permission: Permission) -> bool {
            self.rationale.load(Ordering::SeqCst)
        }
    }

    #[derive(Default)]
    struct RecordingRequester {
        intents: Mutex<Vec<PermissionIntent>>,
    }

    impl PermissionRequester for RecordingRequester {
        fn dispatch(&self, intent: PermissionIntent) {
            self.intents.lock().push(intent);
        }
    }

    #[derive(Default)]
    struct RecordingListener {
        results: Mutex<Vec<bool>>,
    }

    impl GrantListener for RecordingListener {
        fn on_grant_resolved(&self, granted: bool) {
            self.results.lock().push(granted);
        }
    }

    fn create_broker() -> (
        PermissionBroker,
        Arc<FakeOracle>,
        Arc<RecordingRequester>,
        Arc<RecordingListener>,
    ) {
        let oracle = Arc::new(FakeOracle::default());
        let requester = Arc::new(RecordingRequester::default());
        let listener = Arc::new(RecordingListener::default());
        let broker = PermissionBroker::new(
            Arc::clone(&oracle) as Arc<dyn PermissionOracle>,
            Arc::clone(&requester) as Arc<dyn PermissionRequester>,
        );
        broker.set_listener(Arc::clone(&listener) as Arc<dyn GrantListener>);
        (broker, oracle, requester, listener)
    }

    #[test]
    fn test_initial_state() {
        let (broker, _, _, _) = create_broker();
        assert_eq!(broker.state(), PermissionState::NotRequested);
        assert!(!broker.check_granted());
        assert!(!broker.is_permanently_denied());
    }

    #[test]
    fn test_check_granted_does_not_mutate() {
        let (broker, oracle, _, _) = create_broker();
        oracle.granted.store(true, Ordering::SeqCst);

        assert!(broker.check_granted());
        assert_eq!(broker.state(), PermissionState::NotRequested);
    }

    #[test]
    fn test_direct_request_without_rationale() {
        let (broker, _, requester, _) = create_broker();

        let outcome = broker.request_grant(false);
        assert_eq!(outcome, RequestOutcome::Dispatched { rationale: false });
        assert_eq!(broker.state(), PermissionState::Requested);

        let intents = requester.intents.lock();
        assert_eq!(
            intents.as_slice(),
            &[PermissionIntent::Request(LOCATION_PERMISSIONS.to_vec())]
        );
    }

    #[test]
    fn test_request_with_rationale() {
        let (broker, _, requester, _) = create_broker();

        broker.request_grant(true);
        assert!(requester.intents.lock()[0].shows_rationale());
    }

    #[test]
    fn test_duplicate_requests_are_coalesced() {
        let (broker, _, requester, _) = create_broker();

        broker.request_grant(false);
        assert_eq!(broker.request_grant(false), RequestOutcome::AlreadyPending);
        assert_eq!(broker.request_grant(true), RequestOutcome::AlreadyPending);

        assert_eq!(requester.intents.lock().len(), 1);
        assert_eq!(broker.prompts_issued(), 1);
    }

    #[test]
    fn test_grant_result_notifies_listener() {
        let (broker, _, _, listener) = create_broker();

        broker.request_grant(false);
        assert!(broker.on_grant_result(true));

        assert_eq!(broker.state(), PermissionState::Granted);
        assert_eq!(listener.results.lock().as_slice(), &[true]);
    }

    #[test]
    fn test_result_without_request_is_ignored() {
        let (broker, _, _, listener) = create_broker();

        assert!(!broker.on_grant_result(true));
        assert_eq!(broker.state(), PermissionState::NotRequested);
        assert!(listener.results.lock().is_empty());
    }

    #[test]
    fn test_denied_then_rerequest_with_rationale() {
        let (broker, oracle, requester, _) = create_broker();

        broker.request_grant(false);
        oracle.rationale.store(true, Ordering::SeqCst);
        broker.on_grant_result(false);

        assert_eq!(broker.state(), PermissionState::Denied);
        assert!(!broker.is_permanently_denied());
        assert!(broker.rationale_needed());

        assert_eq!(broker.request(), RequestOutcome::Dispatched { rationale: true });
        assert_eq!(broker.state(), PermissionState::Requested);
        assert_eq!(requester.intents.lock().len(), 2);
    }

    #[test]
    fn test_dont_ask_again_suppresses_prompts() {
        let (broker, _, requester, _) = create_broker();

        broker.request_grant(false);
        // No rationale recommended after the denial: user opted out.
        broker.on_grant_result(false);

        assert!(broker.is_permanently_denied());
        assert_eq!(broker.request(), RequestOutcome::Suppressed);
        assert_eq!(broker.state(), PermissionState::Denied);
        assert_eq!(requester.intents.lock().len(), 1);
    }

    #[test]
    fn test_already_granted_skips_prompt() {
        let (broker, oracle, requester, _) = create_broker();
        oracle.granted.store(true, Ordering::SeqCst);

        assert_eq!(broker.request_grant(false), RequestOutcome::AlreadyGranted);
        assert!(requester.intents.lock().is_empty());
    }

    #[test]
    fn test_synchronous_requester_does_not_deadlock() {
        struct InstantRequester {
            broker: Mutex<Option<Arc<PermissionBroker>>>,
        }

        impl PermissionRequester for InstantRequester {
            fn dispatch(&self, _intent: PermissionIntent) {
                if let Some(broker) = self.broker.lock().clone() {
                    broker.on_grant_result(true);
                }
            }
        }

        let requester = Arc::new(InstantRequester {
            broker: Mutex::new(None),
        });
        let broker = Arc::new(PermissionBroker::new(
            Arc::new(FakeOracle::default()),
            Arc::clone(&requester) as Arc<dyn PermissionRequester>,
        ));
        *requester.broker.lock() = Some(Arc::clone(&broker));

        broker.request_grant(false);
        assert_eq!(broker.state(), PermissionState::Granted);
    }
}
