//! In-process publish/subscribe for location readings and session lifecycle.
//!
//! The acquisition session publishes [`LocationEvent`]s; any number of
//! consumers subscribe, optionally with an [`EventFilter`].
//!
//! # Delivery guarantees
//!
//! - Each subscription has its own unbounded queue. Publishing never waits on
//!   a consumer, so a slow subscriber cannot hold up the others.
//! - Publishes are serialized. Every subscriber sees events in publish order.
//! - A subscription registered while a publish is in progress either receives
//!   that event or it does not; never part of it.
//! - [`EventBus::unsubscribe`] is idempotent and may be called from inside a
//!   delivery callback.
//!
//! # Example
//!
//! ```
//! use locwatch::bus::{EventBus, EventFilter, LocationEvent};
//! use locwatch::reading::LocationReading;
//!
//! let bus = EventBus::new();
//! let mut sub = bus.subscribe(Some(EventFilter::locations()));
//!
//! bus.publish(LocationEvent::Location(LocationReading::new(12.34, 56.78)));
//!
//! match sub.try_recv() {
//!     Some(LocationEvent::Location(reading)) => assert_eq!(reading.latitude, 12.34),
//!     other => panic!("unexpected {:?}", other),
//! }
//! ```

mod event;
mod registry;
mod subscription;

pub use event::{EventFilter, LifecycleEvent, LocationEvent};
pub use registry::{EventBus, HandlerError};
pub use subscription::{CallbackSubscription, Subscription, SubscriptionId};
