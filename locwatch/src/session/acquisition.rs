//! The acquisition session state machine.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use thiserror::Error;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::config::{AcquisitionConfig, ConfigError};
use super::keep_alive::{KeepAliveConfig, KeepAliveTask};
use super::provider::{LocationProvider, SessionListener};
use super::state::{ProviderEvent, SessionState, StartOutcome};
use crate::bus::{EventBus, LifecycleEvent, LocationEvent};
use crate::error::LocationError;
use crate::reading::LocationReading;

/// Errors returned by session operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// The configuration violates an invariant.
    #[error("Invalid acquisition config: {0}")]
    InvalidConfig(#[from] ConfigError),

    /// Reconfiguration attempted while the session holds a connection.
    #[error("Cannot reconfigure session while {0}")]
    Active(SessionState),
}

/// Session counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Calls made to `LocationProvider::connect`.
    pub connect_attempts: u64,
    /// Readings published on the bus.
    pub readings_published: u64,
    /// Readings discarded because the session was not Connected.
    pub readings_dropped: u64,
    /// Transitions into Failed.
    pub failures: u64,
    /// Restarts triggered by keep-alive, including abandoned connects.
    pub reassertions: u64,
}

struct SessionInner {
    state: SessionState,
    config: AcquisitionConfig,
    /// Incremented on every fresh connection attempt; stale listeners carry
    /// an older value.
    attempt: u64,
    /// When the current attempt entered Connecting.
    connecting_since: Option<Instant>,
    stats: SessionStats,
}

pub(crate) struct SessionCore {
    provider: Arc<dyn LocationProvider>,
    bus: EventBus,
    self_ref: Weak<SessionCore>,
    /// Serializes configure/start/stop/keep-alive. Held across provider calls.
    lifecycle: Mutex<()>,
    /// Short critical sections only. Never held across provider calls.
    inner: Mutex<SessionInner>,
    keep_alive: Mutex<Option<KeepAliveTask>>,
    pending_timers: Arc<AtomicUsize>,
}

/// Lifecycle-managed subscription to a [`LocationProvider`].
///
/// Cheap to clone; clones control the same session. Every state transition is
/// published on the bus as a [`LifecycleEvent`], and every reading received
/// while Connected is published as a [`LocationEvent::Location`].
///
/// # Locking
///
/// Readings and lifecycle events are published while the session's state
/// lock is held, which is what guarantees nothing is published after `stop()`
/// returns. Bus filters therefore must not call back into the session.
///
/// # Example
///
/// ```ignore
/// let session = AcquisitionSession::new(provider, bus.clone());
/// session.configure(AcquisitionConfig::default())?.start();
/// // ...
/// session.stop();
/// ```
#[derive(Clone)]
pub struct AcquisitionSession {
    core: Arc<SessionCore>,
}

impl std::fmt::Debug for AcquisitionSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AcquisitionSession")
            .field("state", &self.state())
            .field("keep_alive", &self.keep_alive_active())
            .finish()
    }
}

impl AcquisitionSession {
    /// Create an Idle session with the default configuration.
    pub fn new(provider: Arc<dyn LocationProvider>, bus: EventBus) -> Self {
        let core = Arc::new_cyclic(|self_ref| SessionCore {
            provider,
            bus,
            self_ref: self_ref.clone(),
            lifecycle: Mutex::new(()),
            inner: Mutex::new(SessionInner {
                state: SessionState::Idle,
                config: AcquisitionConfig::default(),
                attempt: 0,
                connecting_since: None,
                stats: SessionStats::default(),
            }),
            keep_alive: Mutex::new(None),
            pending_timers: Arc::new(AtomicUsize::new(0)),
        });
        Self { core }
    }

    /// Current state.
    pub fn state(&self) -> SessionState {
        self.core.inner.lock().state
    }

    /// Current configuration.
    pub fn config(&self) -> AcquisitionConfig {
        self.core.inner.lock().config
    }

    /// Counters.
    pub fn stats(&self) -> SessionStats {
        self.core.inner.lock().stats
    }

    /// The bus this session publishes on.
    pub fn bus(&self) -> &EventBus {
        &self.core.bus
    }

    /// Replace the acquisition configuration.
    ///
    /// Rejected while the session is active. An invalid configuration is
    /// rejected without changing the session.
    pub fn configure(&self, config: AcquisitionConfig) -> Result<&Self, SessionError> {
        let _guard = self.core.lifecycle.lock();
        let mut inner = self.core.inner.lock();

        if let Err(e) = config.validate() {
            tracing::warn!(error = %e, state = %inner.state, "Rejected acquisition config");
            return Err(e.into());
        }
        if inner.state.is_active() {
            return Err(SessionError::Active(inner.state));
        }

        tracing::debug!(
            update_ms = config.update_interval.as_millis() as u64,
            fastest_ms = config.fastest_interval.as_millis() as u64,
            priority = %config.priority,
            "Session configured"
        );
        inner.config = config;
        Ok(self)
    }

    /// Ask the provider to connect.
    ///
    /// Connect failures are reported as a Failed transition and a lifecycle
    /// event, never as an error.
    pub fn start(&self) -> StartOutcome {
        let _guard = self.core.lifecycle.lock();
        self.core.start_locked()
    }

    /// Stop the session and release the provider.
    ///
    /// Cancels keep-alive before returning. Returns `false` if there was
    /// nothing to stop.
    pub fn stop(&self) -> bool {
        let _guard = self.core.lifecycle.lock();
        self.core.stop_locked()
    }

    /// Start the keep-alive task.
    ///
    /// Returns `false` if keep-alive is already running, the interval is zero,
    /// or no tokio runtime is available.
    pub fn enable_keep_alive(&self, config: KeepAliveConfig) -> bool {
        if config.interval.is_zero() {
            tracing::warn!("Keep-alive interval must be non-zero; not enabled");
            return false;
        }

        let _guard = self.core.lifecycle.lock();
        let mut slot = self.core.keep_alive.lock();

        if slot.as_ref().is_some_and(|task| !task.token().is_cancelled()) {
            return false;
        }

        match KeepAliveTask::spawn(
            self.core.self_ref.clone(),
            config,
            Arc::clone(&self.core.pending_timers),
        ) {
            Some(task) => {
                tracing::info!(
                    initial_delay_ms = config.initial_delay.as_millis() as u64,
                    interval_ms = config.interval.as_millis() as u64,
                    connect_timeout_ms = config.connect_timeout.as_millis() as u64,
                    "Keep-alive enabled"
                );
                *slot = Some(task);
                true
            }
            None => {
                tracing::warn!("Keep-alive requires a tokio runtime; not enabled");
                false
            }
        }
    }

    /// Cancel the keep-alive task without stopping the session.
    pub fn disable_keep_alive(&self) {
        let _guard = self.core.lifecycle.lock();
        self.core.cancel_keep_alive();
    }

    /// Whether a keep-alive task is running.
    pub fn keep_alive_active(&self) -> bool {
        self.core
            .keep_alive
            .lock()
            .as_ref()
            .is_some_and(|task| !task.token().is_cancelled())
    }

    /// Number of keep-alive timers currently waiting to fire.
    pub fn pending_keep_alive_timers(&self) -> usize {
        self.core.pending_timers.load(Ordering::SeqCst)
    }
}

impl SessionCore {
    fn listener(&self, attempt: u64) -> SessionListener {
        SessionListener::new(self.self_ref.clone(), attempt)
    }

    fn transition(&self, inner: &mut SessionInner, to: SessionState, event: LifecycleEvent) {
        let from = inner.state;
        inner.state = to;
        tracing::info!(from = %from, to = %to, attempt = inner.attempt, "Session state changed");
        self.bus.publish(LocationEvent::Lifecycle(event));
    }

    /// Caller holds `lifecycle`.
    fn start_locked(&self) -> StartOutcome {
        let attempt = {
            let mut inner = self.inner.lock();
            match inner.state {
                SessionState::Connected => return StartOutcome::AlreadyConnected,
                SessionState::Connecting => return StartOutcome::AlreadyConnecting,
                _ => {
                    inner.attempt += 1;
                    inner.stats.connect_attempts += 1;
                    inner.connecting_since = Some(Instant::now());
                    self.transition(&mut inner, SessionState::Connecting, LifecycleEvent::Connecting);
                    inner.attempt
                }
            }
        };

        match self.provider.connect(self.listener(attempt)) {
            Ok(()) => StartOutcome::Connecting,
            Err(e) => {
                self.fail(attempt, LocationError::ConnectFailure(e.to_string()));
                StartOutcome::Failed
            }
        }
    }

    /// Caller holds `lifecycle`.
    fn stop_locked(&self) -> bool {
        self.cancel_keep_alive();

        let release = {
            let mut inner = self.inner.lock();
            match inner.state {
                SessionState::Idle | SessionState::Stopped => false,
                _ => {
                    self.transition(&mut inner, SessionState::Stopped, LifecycleEvent::Stopped);
                    true
                }
            }
        };

        if release {
            self.provider.disconnect();
        }
        release
    }

    fn cancel_keep_alive(&self) {
        if let Some(task) = self.keep_alive.lock().take() {
            task.cancel();
            tracing::debug!("Keep-alive cancelled");
        }
    }

    /// Keep-alive tick. Restarts the session unless it is Connected, was
    /// stopped, or has a connect in flight younger than `connect_timeout`.
    pub(super) fn reassert(&self, token: &CancellationToken, connect_timeout: Duration) {
        let _guard = self.lifecycle.lock();
        if token.is_cancelled() {
            return;
        }

        let (state, abandoned) = {
            let mut inner = self.inner.lock();
            let abandoned = match inner.state {
                SessionState::Connected | SessionState::Stopped => return,
                SessionState::Connecting => {
                    let elapsed = inner
                        .connecting_since
                        .map(|since| since.elapsed())
                        .unwrap_or_default();
                    if elapsed < connect_timeout {
                        tracing::trace!(elapsed_ms = elapsed.as_millis() as u64, "Connect in flight");
                        return;
                    }
                    Some((inner.attempt, elapsed))
                }
                _ => None,
            };
            inner.stats.reassertions += 1;
            (inner.state, abandoned)
        };

        if let Some((attempt, elapsed)) = abandoned {
            self.fail(
                attempt,
                LocationError::ConnectFailure(format!(
                    "connect timed out after {} ms",
                    elapsed.as_millis()
                )),
            );
        }

        tracing::info!(state = %state, "Keep-alive re-asserting session");
        self.start_locked();
    }

    pub(super) fn handle_provider_event(&self, attempt: u64, event: ProviderEvent) {
        match event {
            ProviderEvent::Connected => self.on_connected(attempt),
            ProviderEvent::ConnectionFailed(reason) => {
                self.fail(attempt, LocationError::ConnectFailure(reason))
            }
            ProviderEvent::Suspended(cause) => self.on_suspended(attempt, cause),
            ProviderEvent::Location(reading) => self.on_update(attempt, reading),
        }
    }

    fn on_connected(&self, attempt: u64) {
        let config = {
            let mut inner = self.inner.lock();
            if inner.attempt != attempt {
                tracing::debug!(attempt, current = inner.attempt, "Ignoring stale connect");
                return;
            }
            match inner.state {
                SessionState::Connecting | SessionState::Suspended => {
                    self.transition(&mut inner, SessionState::Connected, LifecycleEvent::Connected);
                }
                other => {
                    tracing::debug!(state = %other, "Ignoring connect in this state");
                    return;
                }
            }
            inner.config
        };

        if let Err(e) = self.provider.request_updates(&config) {
            self.fail(
                attempt,
                LocationError::ConnectFailure(format!("update registration failed: {}", e)),
            );
        }
    }

    fn on_suspended(&self, attempt: u64, cause: String) {
        let mut inner = self.inner.lock();
        if inner.attempt != attempt || inner.state != SessionState::Connected {
            return;
        }
        tracing::warn!(cause = %cause, "Provider connection suspended");
        self.transition(
            &mut inner,
            SessionState::Suspended,
            LifecycleEvent::Suspended { cause },
        );
    }

    fn on_update(&self, attempt: u64, reading: LocationReading) {
        let mut inner = self.inner.lock();
        if inner.attempt != attempt || inner.state != SessionState::Connected {
            inner.stats.readings_dropped += 1;
            tracing::trace!(state = %inner.state, attempt, "Dropping reading");
            return;
        }

        inner.stats.readings_published += 1;
        tracing::debug!(
            latitude = reading.latitude,
            longitude = reading.longitude,
            "Location update"
        );
        self.bus.publish(LocationEvent::Location(reading));
    }

    fn fail(&self, attempt: u64, error: LocationError) {
        let mut inner = self.inner.lock();
        if inner.attempt != attempt || !inner.state.is_active() {
            return;
        }
        tracing::warn!(error = %error, "Session failed");
        inner.stats.failures += 1;
        self.transition(&mut inner, SessionState::Failed, LifecycleEvent::Failed { error });
    }
}

impl Drop for SessionCore {
    fn drop(&mut self) {
        if self.inner.get_mut().state.is_active() {
            self.provider.disconnect();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::provider::ProviderError;
    use crate::session::Priority;
    use std::sync::atomic::AtomicBool;
    use std::time::Duration;

    #[derive(Default)]
    struct ScriptedProvider {
        listener: Mutex<Option<SessionListener>>,
        connects: AtomicUsize,
        disconnects: AtomicUsize,
        update_requests: Mutex<Vec<AcquisitionConfig>>,
        fail_connect: AtomicBool,
        auto_connect: AtomicBool,
    }

    impl ScriptedProvider {
        fn auto() -> Arc<Self> {
            let provider = Self::default();
            provider.auto_connect.store(true, Ordering::SeqCst);
            Arc::new(provider)
        }

        fn listener(&self) -> SessionListener {
            self.listener.lock().clone().expect("connect was called")
        }

        fn connects(&self) -> usize {
            self.connects.load(Ordering::SeqCst)
        }
    }

    impl LocationProvider for ScriptedProvider {
        fn connect(&self, listener: SessionListener) -> Result<(), ProviderError> {
            self.connects.fetch_add(1, Ordering::SeqCst);
            if self.fail_connect.load(Ordering::SeqCst) {
                return Err(ProviderError::Unavailable("offline".to_string()));
            }
            *self.listener.lock() = Some(listener.clone());
            if self.auto_connect.load(Ordering::SeqCst) {
                listener.connected();
            }
            Ok(())
        }

        fn request_updates(&self, config: &AcquisitionConfig) -> Result<(), ProviderError> {
            self.update_requests.lock().push(*config);
            Ok(())
        }

        fn disconnect(&self) {
            self.disconnects.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn create_test_session(provider: Arc<ScriptedProvider>) -> AcquisitionSession {
        AcquisitionSession::new(provider, EventBus::new())
    }

    fn drain(sub: &mut crate::bus::Subscription) -> Vec<LocationEvent> {
        std::iter::from_fn(|| sub.try_recv()).collect()
    }

    #[test]
    fn test_configure_rejects_invalid_and_stays_idle() {
        let session = create_test_session(Arc::new(ScriptedProvider::default()));
        let bad = AcquisitionConfig {
            update_interval: Duration::from_millis(1000),
            fastest_interval: Duration::from_millis(2000),
            priority: Priority::HighAccuracy,
        };

        let err = session.configure(bad).unwrap_err();
        assert!(matches!(err, SessionError::InvalidConfig(_)));
        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(session.config(), AcquisitionConfig::default());

        // Same input, same answer.
        assert_eq!(session.configure(bad).unwrap_err(), err);
    }

    #[test]
    fn test_configure_rejected_while_active() {
        let session = create_test_session(ScriptedProvider::auto());
        session.start();

        let err = session.configure(AcquisitionConfig::default()).unwrap_err();
        assert_eq!(err, SessionError::Active(SessionState::Connected));
    }

    #[test]
    fn test_start_connects_and_requests_updates() {
        let provider = ScriptedProvider::auto();
        let session = create_test_session(Arc::clone(&provider));
        let config = AcquisitionConfig::builder()
            .intervals_ms(5000, 1000)
            .build()
            .unwrap();
        let mut sub = session.bus().subscribe(None);

        let outcome = session.configure(config).unwrap().start();

        assert_eq!(outcome, StartOutcome::Connecting);
        assert_eq!(session.state(), SessionState::Connected);
        assert_eq!(*provider.update_requests.lock(), vec![config]);
        assert_eq!(
            drain(&mut sub),
            vec![
                LocationEvent::Lifecycle(LifecycleEvent::Connecting),
                LocationEvent::Lifecycle(LifecycleEvent::Connected),
            ]
        );
    }

    #[test]
    fn test_start_when_connected_is_noop() {
        let provider = ScriptedProvider::auto();
        let session = create_test_session(Arc::clone(&provider));
        session.start();

        assert_eq!(session.start(), StartOutcome::AlreadyConnected);
        assert_eq!(provider.connects(), 1);
    }

    #[test]
    fn test_connect_failure_marks_failed() {
        let provider = Arc::new(ScriptedProvider::default());
        provider.fail_connect.store(true, Ordering::SeqCst);
        let session = create_test_session(Arc::clone(&provider));
        let mut sub = session.bus().subscribe(None);

        assert_eq!(session.start(), StartOutcome::Failed);
        assert_eq!(session.state(), SessionState::Failed);
        assert_eq!(session.stats().failures, 1);

        let events = drain(&mut sub);
        assert_eq!(events.len(), 2);
        assert!(matches!(
            &events[1],
            LocationEvent::Lifecycle(LifecycleEvent::Failed {
                error: LocationError::ConnectFailure(_)
            })
        ));
    }

    #[test]
    fn test_async_connection_failure() {
        let provider = Arc::new(ScriptedProvider::default());
        let session = create_test_session(Arc::clone(&provider));
        session.start();
        assert_eq!(session.state(), SessionState::Connecting);

        provider.listener().connection_failed("no service");
        assert_eq!(session.state(), SessionState::Failed);

        // A failed session can be restarted.
        assert_eq!(session.start(), StartOutcome::Connecting);
        assert_eq!(session.state(), SessionState::Connecting);
    }

    #[test]
    fn test_updates_only_published_while_connected() {
        let provider = Arc::new(ScriptedProvider::default());
        let session = create_test_session(Arc::clone(&provider));
        let mut sub = session.bus().subscribe(Some(crate::bus::EventFilter::locations()));
        session.start();

        let listener = provider.listener();
        listener.location(LocationReading::new(1.0, 2.0));
        assert!(sub.try_recv().is_none());

        listener.connected();
        listener.location(LocationReading::new(12.34, 56.78));

        let reading = *sub.try_recv().unwrap().reading().unwrap();
        assert_eq!(reading.position(), (12.34, 56.78));
        assert_eq!(session.stats().readings_published, 1);
        assert_eq!(session.stats().readings_dropped, 1);
    }

    #[test]
    fn test_no_publish_after_stop() {
        let provider = ScriptedProvider::auto();
        let session = create_test_session(Arc::clone(&provider));
        let mut sub = session.bus().subscribe(Some(crate::bus::EventFilter::locations()));
        session.start();
        let listener = provider.listener();

        assert!(session.stop());
        listener.location(LocationReading::new(1.0, 1.0));

        assert!(sub.try_recv().is_none());
        assert_eq!(session.state(), SessionState::Stopped);
    }

    #[test]
    fn test_stop_is_idempotent() {
        let provider = ScriptedProvider::auto();
        let session = create_test_session(Arc::clone(&provider));
        assert!(!session.stop());

        session.start();
        assert!(session.stop());
        assert!(!session.stop());
        assert_eq!(provider.disconnects.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_stale_listener_ignored_after_restart() {
        let provider = ScriptedProvider::auto();
        let session = create_test_session(Arc::clone(&provider));
        let mut sub = session.bus().subscribe(Some(crate::bus::EventFilter::locations()));

        session.start();
        let old = provider.listener();
        session.stop();
        session.start();
        let current = provider.listener();
        assert_ne!(old.attempt(), current.attempt());

        old.location(LocationReading::new(9.0, 9.0));
        current.location(LocationReading::new(1.0, 1.0));

        let delivered: Vec<_> = drain(&mut sub)
            .iter()
            .filter_map(|e| e.reading().map(|r| r.position()))
            .collect();
        assert_eq!(delivered, vec![(1.0, 1.0)]);
    }

    #[test]
    fn test_suspend_and_recover() {
        let provider = ScriptedProvider::auto();
        let session = create_test_session(Arc::clone(&provider));
        session.start();
        let listener = provider.listener();

        listener.suspended("service disconnected");
        assert_eq!(session.state(), SessionState::Suspended);
        listener.location(LocationReading::new(1.0, 1.0));
        assert_eq!(session.stats().readings_published, 0);

        listener.connected();
        assert_eq!(session.state(), SessionState::Connected);
        assert_eq!(provider.update_requests.lock().len(), 2);
    }

    #[test]
    fn test_start_while_connecting_leaves_attempt_alone() {
        let provider = Arc::new(ScriptedProvider::default());
        let session = create_test_session(Arc::clone(&provider));

        assert_eq!(session.start(), StartOutcome::Connecting);
        let first = provider.listener().attempt();
        assert_eq!(session.start(), StartOutcome::AlreadyConnecting);

        assert_eq!(provider.connects(), 1);
        assert_eq!(session.stats().connect_attempts, 1);

        // The original attempt can still complete.
        provider.listener().connected();
        assert_eq!(session.state(), SessionState::Connected);
        assert_eq!(provider.listener().attempt(), first);
    }

    #[tokio::test]
    async fn test_keep_alive_rejects_zero_interval() {
        let session = create_test_session(Arc::new(ScriptedProvider::default()));
        let config = KeepAliveConfig::default().with_interval(Duration::ZERO);

        assert!(!session.enable_keep_alive(config));
        assert!(!session.keep_alive_active());
        assert_eq!(session.pending_keep_alive_timers(), 0);
    }

    #[test]
    fn test_keep_alive_requires_runtime() {
        let session = create_test_session(Arc::new(ScriptedProvider::default()));
        assert!(!session.enable_keep_alive(KeepAliveConfig::default()));
        assert!(!session.keep_alive_active());
    }

    #[tokio::test(start_paused = true)]
    async fn test_keep_alive_restarts_failed_session() {
        let provider = Arc::new(ScriptedProvider::default());
        provider.fail_connect.store(true, Ordering::SeqCst);
        let session = create_test_session(Arc::clone(&provider));

        assert_eq!(session.start(), StartOutcome::Failed);
        assert!(session.enable_keep_alive(KeepAliveConfig::default()));

        provider.fail_connect.store(false, Ordering::SeqCst);
        provider.auto_connect.store(true, Ordering::SeqCst);

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(session.state(), SessionState::Failed);

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(session.state(), SessionState::Connected);
        assert_eq!(session.stats().reassertions, 1);

        // Connected: later ticks leave the provider alone.
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(provider.connects(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_keep_alive_single_timer_while_connecting() {
        let provider = Arc::new(ScriptedProvider::default());
        let session = create_test_session(Arc::clone(&provider));
        session.start();

        assert!(session.enable_keep_alive(KeepAliveConfig::default()));
        assert!(!session.enable_keep_alive(KeepAliveConfig::default()));

        tokio::time::sleep(Duration::from_millis(2500)).await;
        for _ in 0..5 {
            assert!(session.pending_keep_alive_timers() <= 1);
            tokio::time::sleep(Duration::from_secs(1)).await;
        }

        // Within the connect timeout the in-flight attempt is never replaced.
        assert_eq!(session.state(), SessionState::Connecting);
        assert_eq!(session.stats().reassertions, 0);
        assert_eq!(provider.connects(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_keep_alive_abandons_connect_after_timeout() {
        let provider = Arc::new(ScriptedProvider::default());
        let session = create_test_session(Arc::clone(&provider));
        let mut sub = session.bus().subscribe(Some(crate::bus::EventFilter::lifecycle()));
        session.start();
        let first = provider.listener();

        let config = KeepAliveConfig::default().with_connect_timeout(Duration::from_millis(2500));
        assert!(session.enable_keep_alive(config));

        // Tick at 2 s: still within the timeout.
        tokio::time::sleep(Duration::from_millis(2200)).await;
        assert_eq!(provider.connects(), 1);

        // Tick at 3 s: abandoned and retried as a new attempt.
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(provider.connects(), 2);
        assert_eq!(session.state(), SessionState::Connecting);
        assert_eq!(session.stats().failures, 1);
        assert_eq!(session.stats().reassertions, 1);
        assert_ne!(provider.listener().attempt(), first.attempt());

        let events = drain(&mut sub);
        assert!(matches!(
            events.as_slice(),
            [
                LocationEvent::Lifecycle(LifecycleEvent::Connecting),
                LocationEvent::Lifecycle(LifecycleEvent::Failed { .. }),
                LocationEvent::Lifecycle(LifecycleEvent::Connecting),
            ]
        ));

        // The abandoned attempt reporting late changes nothing.
        first.connected();
        assert_eq!(session.state(), SessionState::Connecting);
        session.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_disable_keep_alive_releases_timer_immediately() {
        let session = create_test_session(Arc::new(ScriptedProvider::default()));
        assert!(session.enable_keep_alive(KeepAliveConfig::default()));

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(session.pending_keep_alive_timers(), 1);

        session.disable_keep_alive();
        assert_eq!(session.pending_keep_alive_timers(), 0);

        assert!(session.enable_keep_alive(KeepAliveConfig::default()));
        tokio::task::yield_now().await;
        assert_eq!(session.pending_keep_alive_timers(), 1);

        session.disable_keep_alive();
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(session.pending_keep_alive_timers(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_cancels_keep_alive() {
        let provider = Arc::new(ScriptedProvider::default());
        let session = create_test_session(Arc::clone(&provider));
        session.start();
        session.enable_keep_alive(KeepAliveConfig::default());

        session.stop();
        assert!(!session.keep_alive_active());

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(provider.connects(), 1);
        assert_eq!(session.pending_keep_alive_timers(), 0);
        assert_eq!(session.state(), SessionState::Stopped);
    }
}
