//! Keep-alive re-assertion task.
//!
//! When enabled, a single background task wakes after `initial_delay` and then
//! every `interval`, and restarts the session if it is Failed or Suspended.
//! An attempt still Connecting is left alone until it has been in flight for
//! `connect_timeout`; it is then failed and a fresh attempt begins.
//!
//! # Cancellation
//!
//! The task owns a [`CancellationToken`]. [`AcquisitionSession::stop`] cancels
//! it while holding the session's lifecycle lock, and every re-assertion
//! re-checks the token under that same lock, so no restart can happen once
//! `stop()` has returned.
//!
//! [`AcquisitionSession::stop`]: super::AcquisitionSession::stop

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::acquisition::SessionCore;

/// Default delay before the first re-assertion.
pub const DEFAULT_KEEP_ALIVE_INITIAL_DELAY: Duration = Duration::from_secs(2);

/// Default period between re-assertions.
pub const DEFAULT_KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(1);

/// Default time a connect may stay in flight before keep-alive abandons it.
pub const DEFAULT_KEEP_ALIVE_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Keep-alive timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeepAliveConfig {
    /// Delay before the first check.
    pub initial_delay: Duration,
    /// Period between later checks. Must be non-zero.
    pub interval: Duration,
    /// How long a connect may stay in flight before it is retried.
    pub connect_timeout: Duration,
}

impl Default for KeepAliveConfig {
    fn default() -> Self {
        Self {
            initial_delay: DEFAULT_KEEP_ALIVE_INITIAL_DELAY,
            interval: DEFAULT_KEEP_ALIVE_INTERVAL,
            connect_timeout: DEFAULT_KEEP_ALIVE_CONNECT_TIMEOUT,
        }
    }
}

impl KeepAliveConfig {
    /// Set the initial delay.
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Set the period.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Set the connect timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}

/// The task's share of the session's pending-timer count.
///
/// Whichever side disarms first (the task waking, or the owner cancelling)
/// gives the count back, so a cancelled timer stops counting at once.
struct TimerSlot {
    armed: AtomicBool,
    pending: Arc<AtomicUsize>,
}

impl TimerSlot {
    fn arm(&self) {
        self.pending.fetch_add(1, Ordering::SeqCst);
        self.armed.store(true, Ordering::SeqCst);
    }

    fn disarm(&self) {
        if self.armed.swap(false, Ordering::SeqCst) {
            self.pending.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

/// Running keep-alive task, owned by the session.
pub(super) struct KeepAliveTask {
    token: CancellationToken,
    slot: Arc<TimerSlot>,
}

impl KeepAliveTask {
    /// Spawn the task on the current tokio runtime.
    ///
    /// Returns `None` outside a runtime.
    pub(super) fn spawn(
        core: Weak<SessionCore>,
        config: KeepAliveConfig,
        pending: Arc<AtomicUsize>,
    ) -> Option<Self> {
        let handle = tokio::runtime::Handle::try_current().ok()?;
        let token = CancellationToken::new();
        let slot = Arc::new(TimerSlot {
            armed: AtomicBool::new(false),
            pending,
        });
        handle.spawn(run(core, config, token.clone(), Arc::clone(&slot)));
        Some(Self { token, slot })
    }

    pub(super) fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub(super) fn cancel(&self) {
        self.token.cancel();
        self.slot.disarm();
    }
}

impl Drop for KeepAliveTask {
    fn drop(&mut self) {
        self.cancel();
    }
}

async fn run(
    core: Weak<SessionCore>,
    config: KeepAliveConfig,
    token: CancellationToken,
    slot: Arc<TimerSlot>,
) {
    let mut delay = config.initial_delay;

    while !token.is_cancelled() {
        slot.arm();
        let cancelled = tokio::select! {
            biased;
            _ = token.cancelled() => true,
            _ = tokio::time::sleep(delay) => false,
        };
        slot.disarm();

        if cancelled {
            break;
        }

        let Some(core) = core.upgrade() else {
            break;
        };
        core.reassert(&token, config.connect_timeout);
        delay = config.interval;
    }

    tracing::debug!("Keep-alive task exited");
}
