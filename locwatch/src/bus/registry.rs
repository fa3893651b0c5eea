//! The bus itself: subscriber registry and publish path.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::event::{EventFilter, LocationEvent};
use super::subscription::{CallbackSubscription, Subscription, SubscriptionId};
use crate::error::LocationError;

/// Error returned by a callback subscriber.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

struct Subscriber {
    id: SubscriptionId,
    filter: Option<EventFilter>,
    tx: mpsc::UnboundedSender<LocationEvent>,
    token: CancellationToken,
}

impl Subscriber {
    fn is_live(&self) -> bool {
        !self.token.is_cancelled() && !self.tx.is_closed()
    }
}

/// Shared state behind every [`EventBus`] clone.
pub(super) struct BusInner {
    /// Registration order. The lock also serializes publishes.
    subscribers: Mutex<Vec<Subscriber>>,
    /// Cancellation tokens by id. Never held while user code runs, so
    /// unsubscribing works from inside filters and callbacks.
    tokens: Mutex<HashMap<SubscriptionId, CancellationToken>>,
    next_id: AtomicU64,
    published: AtomicU64,
    delivery_failures: AtomicU64,
}

impl BusInner {
    /// Unregister `id`. Idempotent.
    ///
    /// The token is cancelled first so publishes skip the subscriber at once.
    /// If the registry is busy (a publish is running on this thread or
    /// another) removal is left to the next publish.
    pub(super) fn unsubscribe(&self, id: SubscriptionId) {
        let Some(token) = self.tokens.lock().remove(&id) else {
            return;
        };
        token.cancel();

        if let Some(mut subscribers) = self.subscribers.try_lock() {
            subscribers.retain(|s| s.id != id);
        }
        tracing::debug!(subscription = id.0, "Subscriber unregistered");
    }
}

/// Publish/subscribe channel for [`LocationEvent`]s.
///
/// Cheap to clone; clones share one registry. Dropping the last clone tears
/// the bus down, which ends every subscription.
#[derive(Clone)]
pub struct EventBus {
    inner: Arc<BusInner>,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscriber_count())
            .field("published", &self.published_count())
            .finish()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    /// Create an empty bus.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(BusInner {
                subscribers: Mutex::new(Vec::new()),
                tokens: Mutex::new(HashMap::new()),
                next_id: AtomicU64::new(1),
                published: AtomicU64::new(0),
                delivery_failures: AtomicU64::new(0),
            }),
        }
    }

    /// Register a subscription, optionally filtered.
    pub fn subscribe(&self, filter: Option<EventFilter>) -> Subscription {
        let id = SubscriptionId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = mpsc::unbounded_channel();
        let token = CancellationToken::new();

        {
            // Token and entry appear together to concurrent prunes.
            let mut subscribers = self.inner.subscribers.lock();
            self.inner.tokens.lock().insert(id, token.clone());
            subscribers.push(Subscriber {
                id,
                filter,
                tx,
                token: token.clone(),
            });
        }

        tracing::debug!(subscription = id.0, "Subscriber registered");
        Subscription::new(id, rx, token, Arc::downgrade(&self.inner))
    }

    /// Register a callback subscriber that runs on its own task.
    ///
    /// Handler errors and panics are logged and counted; they never reach the
    /// publisher or other subscribers, and the subscriber keeps receiving.
    /// Must be called from within a Tokio runtime.
    pub fn subscribe_with<F>(&self, filter: Option<EventFilter>, handler: F) -> CallbackSubscription
    where
        F: FnMut(&LocationEvent) -> Result<(), HandlerError> + Send + 'static,
    {
        let mut subscription = self.subscribe(filter);
        let id = subscription.id();
        let token = subscription.token();
        let inner: Weak<BusInner> = Arc::downgrade(&self.inner);
        let mut handler = handler;

        let handle = tokio::spawn(async move {
            while let Some(event) = subscription.recv().await {
                let outcome = catch_unwind(AssertUnwindSafe(|| handler(&event)));
                let reason = match outcome {
                    Ok(Ok(())) => continue,
                    Ok(Err(e)) => e.to_string(),
                    Err(_) => "handler panicked".to_string(),
                };

                let failure = LocationError::UpdateDeliveryFailure {
                    subscriber: id.0,
                    reason,
                };
                tracing::warn!(error = %failure, "Subscriber failed to handle event");
                if let Some(inner) = inner.upgrade() {
                    inner.delivery_failures.fetch_add(1, Ordering::Relaxed);
                }
            }
            tracing::debug!(subscription = id.0, "Callback subscriber finished");
        });

        CallbackSubscription::new(id, token, Arc::downgrade(&self.inner), handle)
    }

    /// Deliver `event` to every live, matching subscriber in registration order.
    ///
    /// Returns the number of subscribers the event was queued for.
    pub fn publish(&self, event: LocationEvent) -> usize {
        let mut subscribers = self.inner.subscribers.lock();
        self.inner.published.fetch_add(1, Ordering::Relaxed);

        let mut delivered = 0;
        let mut stale = false;

        for subscriber in subscribers.iter() {
            if !subscriber.is_live() {
                stale = true;
                continue;
            }
            if let Some(filter) = &subscriber.filter {
                if !filter.matches(&event) {
                    continue;
                }
            }
            if subscriber.tx.send(event.clone()).is_ok() {
                delivered += 1;
            } else {
                stale = true;
            }
        }

        if stale {
            let removed: Vec<SubscriptionId> = subscribers
                .iter()
                .filter(|s| !s.is_live())
                .map(|s| s.id)
                .collect();
            subscribers.retain(|s| !removed.contains(&s.id));

            let mut tokens = self.inner.tokens.lock();
            for id in &removed {
                tokens.remove(id);
            }
            tracing::trace!(removed = removed.len(), "Pruned stale subscribers");
        }

        tracing::trace!(delivered, "Event published");
        delivered
    }

    /// Unregister a subscription by id. Idempotent.
    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.inner.unsubscribe(id);
    }

    /// Unregister every subscription. Receivers drain what was already queued.
    pub fn close(&self) {
        let mut subscribers = self.inner.subscribers.lock();
        self.inner.tokens.lock().clear();
        for subscriber in subscribers.drain(..) {
            subscriber.token.cancel();
        }
        tracing::debug!("Event bus closed");
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.inner
            .subscribers
            .lock()
            .iter()
            .filter(|s| s.is_live())
            .count()
    }

    /// Total events published.
    pub fn published_count(&self) -> u64 {
        self.inner.published.load(Ordering::Relaxed)
    }

    /// Total handler failures isolated by callback subscribers.
    pub fn delivery_failures(&self) -> u64 {
        self.inner.delivery_failures.load(Ordering::Relaxed)
    }
}
