//! Lifecycle-managed location acquisition.
//!
//! An [`AcquisitionSession`] owns one live subscription to a
//! [`LocationProvider`]: it connects, registers for updates at the configured
//! interval once connected, forwards every reading to the [`EventBus`], and
//! releases the provider on stop.
//!
//! # State machine
//!
//! ```text
//!            start                 Connected              Suspended
//!   Idle ───────────► Connecting ───────────► Connected ───────────► Suspended
//!                        │  ▲                    ▲                     │
//!      ConnectionFailed  │  │ start              └──────Connected──────┘
//!                        ▼  │ (keep-alive)
//!                      Failed
//!
//!   any active state ──stop──► Stopped ──start──► Connecting
//! ```
//!
//! Readings are forwarded only while Connected. Events from a previous
//! connection attempt are discarded.
//!
//! # Keep-alive
//!
//! [`AcquisitionSession::enable_keep_alive`] starts a single background task
//! that restarts a Failed or Suspended session (by default 2 s after
//! enabling, then every second). A connect still in flight is given
//! `connect_timeout` (30 s by default) before it is abandoned and retried.
//! `stop()` cancels the task synchronously.
//!
//! [`EventBus`]: crate::bus::EventBus

mod acquisition;
mod config;
mod keep_alive;
mod provider;
mod state;

pub use acquisition::{AcquisitionSession, SessionError, SessionStats};
pub use config::{
    AcquisitionConfig, AcquisitionConfigBuilder, ConfigError, Priority,
    DEFAULT_FASTEST_INTERVAL, DEFAULT_UPDATE_INTERVAL,
};
pub use keep_alive::{
    KeepAliveConfig, DEFAULT_KEEP_ALIVE_CONNECT_TIMEOUT, DEFAULT_KEEP_ALIVE_INITIAL_DELAY,
    DEFAULT_KEEP_ALIVE_INTERVAL,
};
pub use provider::{LocationProvider, ProviderError, SessionListener};
pub use state::{ProviderEvent, SessionState, StartOutcome};
