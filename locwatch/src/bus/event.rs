//! Events carried by the bus.

use std::sync::Arc;

use crate::error::LocationError;
use crate::reading::LocationReading;

/// Session lifecycle transitions visible to consumers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// The session asked the provider to connect.
    Connecting,
    /// The provider connected and updates were requested.
    Connected,
    /// The provider connection dropped; the provider is expected to recover.
    Suspended {
        /// Provider-reported cause.
        cause: String,
    },
    /// Connecting (or registering for updates) failed.
    Failed {
        /// The failure.
        error: LocationError,
    },
    /// The session was stopped explicitly.
    Stopped,
}

/// Anything published on the bus.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationEvent {
    /// A new reading.
    Location(LocationReading),
    /// A lifecycle transition.
    Lifecycle(LifecycleEvent),
}

impl LocationEvent {
    /// The reading, if this is a location event.
    pub fn reading(&self) -> Option<&LocationReading> {
        match self {
            LocationEvent::Location(reading) => Some(reading),
            LocationEvent::Lifecycle(_) => None,
        }
    }

    /// Whether this is a lifecycle event.
    pub fn is_lifecycle(&self) -> bool {
        matches!(self, LocationEvent::Lifecycle(_))
    }
}

/// Predicate deciding which events a subscription receives.
#[derive(Clone)]
pub struct EventFilter(Arc<dyn Fn(&LocationEvent) -> bool + Send + Sync>);

impl EventFilter {
    /// Filter from an arbitrary predicate.
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&LocationEvent) -> bool + Send + Sync + 'static,
    {
        Self(Arc::new(predicate))
    }

    /// Only location readings.
    pub fn locations() -> Self {
        Self::new(|event| event.reading().is_some())
    }

    /// Only lifecycle events.
    pub fn lifecycle() -> Self {
        Self::new(LocationEvent::is_lifecycle)
    }

    /// Whether `event` passes the filter.
    #[inline]
    pub fn matches(&self, event: &LocationEvent) -> bool {
        (self.0)(event)
    }
}

impl std::fmt::Debug for EventFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("EventFilter(..)")
    }
}
