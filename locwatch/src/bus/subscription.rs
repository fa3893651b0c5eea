//! Consumer-side subscription handles.

use std::sync::Weak;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::event::LocationEvent;
use super::registry::BusInner;

/// Identifies a subscription on its bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub(super) u64);

impl SubscriptionId {
    /// Numeric value, for logging.
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// A registered consumer.
///
/// Events queue up until read with [`recv`](Subscription::recv) or
/// [`try_recv`](Subscription::try_recv). Dropping the subscription
/// unregisters it.
pub struct Subscription {
    id: SubscriptionId,
    rx: mpsc::UnboundedReceiver<LocationEvent>,
    token: CancellationToken,
    bus: Weak<BusInner>,
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}

impl Subscription {
    pub(super) fn new(
        id: SubscriptionId,
        rx: mpsc::UnboundedReceiver<LocationEvent>,
        token: CancellationToken,
        bus: Weak<BusInner>,
    ) -> Self {
        Self { id, rx, token, bus }
    }

    /// This subscription's id.
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Token cancelled when the subscription is unregistered.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Whether the subscription is still registered.
    pub fn is_active(&self) -> bool {
        !self.token.is_cancelled() && self.bus.strong_count() > 0
    }

    /// Wait for the next event.
    ///
    /// Returns `None` once the subscription is unregistered (after draining
    /// anything already queued) or the bus is torn down.
    pub async fn recv(&mut self) -> Option<LocationEvent> {
        tokio::select! {
            biased;
            event = self.rx.recv() => event,
            _ = self.token.cancelled() => self.rx.try_recv().ok(),
        }
    }

    /// Take the next queued event without waiting.
    pub fn try_recv(&mut self) -> Option<LocationEvent> {
        self.rx.try_recv().ok()
    }

    /// Unregister. Idempotent.
    pub fn unsubscribe(&self) {
        self.token.cancel();
        if let Some(bus) = self.bus.upgrade() {
            bus.unsubscribe(self.id);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

/// Handle to a callback subscriber started with
/// [`EventBus::subscribe_with`](super::EventBus::subscribe_with).
///
/// Dropping the handle leaves the callback running; call
/// [`unsubscribe`](CallbackSubscription::unsubscribe) to stop it.
pub struct CallbackSubscription {
    id: SubscriptionId,
    token: CancellationToken,
    bus: Weak<BusInner>,
    handle: JoinHandle<()>,
}

impl CallbackSubscription {
    pub(super) fn new(
        id: SubscriptionId,
        token: CancellationToken,
        bus: Weak<BusInner>,
        handle: JoinHandle<()>,
    ) -> Self {
        Self {
            id,
            token,
            bus,
            handle,
        }
    }

    /// This subscription's id.
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Whether the callback is still registered.
    pub fn is_active(&self) -> bool {
        !self.token.is_cancelled() && !self.handle.is_finished()
    }

    /// Unregister; the callback task ends after draining queued events.
    pub fn unsubscribe(&self) {
        self.token.cancel();
        if let Some(bus) = self.bus.upgrade() {
            bus.unsubscribe(self.id);
        }
    }

    /// Wait for the callback task to finish.
    pub async fn join(self) {
        if let Err(e) = self.handle.await {
            tracing::warn!(subscription = self.id.0, error = %e, "Callback task failed");
        }
    }
}
