//! Timer-driven simulated location provider.

use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::reading::LocationReading;
use crate::session::{AcquisitionConfig, LocationProvider, ProviderError, SessionListener};

/// Simulated provider settings.
#[derive(Debug, Clone, PartialEq)]
pub struct SimConfig {
    /// Position of the first generated reading.
    pub start: (f64, f64),
    /// Per-reading (latitude, longitude) offset.
    pub step: (f64, f64),
    /// Fixed positions emitted before generated ones.
    pub waypoints: Vec<(f64, f64)>,
    /// Delay between `connect` and the connect outcome.
    pub connect_delay: Duration,
    /// Number of initial connect attempts that fail.
    pub fail_first_connects: u32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            start: (0.0, 0.0),
            step: (0.0001, 0.0001),
            waypoints: Vec::new(),
            connect_delay: Duration::from_millis(100),
            fail_first_connects: 0,
        }
    }
}

impl SimConfig {
    /// Set the start position.
    pub fn with_start(mut self, latitude: f64, longitude: f64) -> Self {
        self.start = (latitude, longitude);
        self
    }

    /// Set the per-reading offset.
    pub fn with_step(mut self, latitude: f64, longitude: f64) -> Self {
        self.step = (latitude, longitude);
        self
    }

    /// Emit these positions first.
    pub fn with_waypoints(mut self, waypoints: Vec<(f64, f64)>) -> Self {
        self.waypoints = waypoints;
        self
    }

    /// Set the connect delay.
    pub fn with_connect_delay(mut self, delay: Duration) -> Self {
        self.connect_delay = delay;
        self
    }

    /// Fail the first `count` connect attempts.
    pub fn with_failed_connects(mut self, count: u32) -> Self {
        self.fail_first_connects = count;
        self
    }
}

#[derive(Default)]
struct ProviderState {
    listener: Option<SessionListener>,
    connection: Option<CancellationToken>,
    updates: Option<CancellationToken>,
    connected: bool,
    connects: u64,
    failures_left: u32,
    emitted: u64,
}

/// A [`LocationProvider`] that generates readings on a tokio timer.
///
/// Connect outcomes arrive after `connect_delay`. Once updates are requested,
/// one reading is emitted immediately and then one per update interval:
/// first the configured waypoints, then `start + step * n`.
pub struct SimulatedProvider {
    config: SimConfig,
    self_ref: Weak<SimulatedProvider>,
    state: Mutex<ProviderState>,
}

impl SimulatedProvider {
    /// Create a provider.
    pub fn new(config: SimConfig) -> Arc<Self> {
        Arc::new_cyclic(|self_ref| Self {
            state: Mutex::new(ProviderState {
                failures_left: config.fail_first_connects,
                ..Default::default()
            }),
            config,
            self_ref: self_ref.clone(),
        })
    }

    /// Number of `connect` calls.
    pub fn connects(&self) -> u64 {
        self.state.lock().connects
    }

    /// Number of readings emitted.
    pub fn readings_emitted(&self) -> u64 {
        self.state.lock().emitted
    }

    /// Whether the provider considers itself connected.
    pub fn is_connected(&self) -> bool {
        self.state.lock().connected
    }

    /// Drop the connection as a platform service would, stopping updates.
    ///
    /// Returns `false` if not connected.
    pub fn suspend(&self, cause: &str) -> bool {
        let listener = {
            let mut state = self.state.lock();
            if !state.connected {
                return false;
            }
            state.connected = false;
            if let Some(updates) = state.updates.take() {
                updates.cancel();
            }
            state.listener.clone()
        };

        tracing::info!(cause, "Simulated provider suspended");
        if let Some(listener) = listener {
            listener.suspended(cause);
        }
        true
    }

    /// Restore a suspended connection.
    pub fn recover(&self) -> bool {
        let listener = {
            let mut state = self.state.lock();
            if state.connected || state.connection.is_none() {
                return false;
            }
            state.connected = true;
            state.listener.clone()
        };

        tracing::info!("Simulated provider recovered");
        if let Some(listener) = listener {
            listener.connected();
        }
        true
    }

    fn next_reading(&self) -> LocationReading {
        let mut state = self.state.lock();
        let n = state.emitted;
        state.emitted += 1;

        let waypoints = self.config.waypoints.len() as u64;
        let (latitude, longitude) = if n < waypoints {
            self.config.waypoints[n as usize]
        } else {
            let k = (n - waypoints) as f64;
            (
                self.config.start.0 + self.config.step.0 * k,
                self.config.start.1 + self.config.step.1 * k,
            )
        };
        LocationReading::new(latitude, longitude)
    }

    fn runtime() -> Result<Handle, ProviderError> {
        Handle::try_current()
            .map_err(|_| ProviderError::Unavailable("no tokio runtime".to_string()))
    }
}

impl LocationProvider for SimulatedProvider {
    fn connect(&self, listener: SessionListener) -> Result<(), ProviderError> {
        let runtime = Self::runtime()?;
        let token = CancellationToken::new();

        let fail = {
            let mut state = self.state.lock();
            if let Some(previous) = state.connection.replace(token.clone()) {
                previous.cancel();
            }
            state.listener = Some(listener.clone());
            state.connected = false;
            state.connects += 1;
            if state.failures_left > 0 {
                state.failures_left -= 1;
                true
            } else {
                false
            }
        };

        let delay = self.config.connect_delay;
        let this = self.self_ref.clone();
        runtime.spawn(async move {
            tokio::select! {
                biased;
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    if fail {
                        listener.connection_failed("simulated connect failure");
                    } else if let Some(provider) = this.upgrade() {
                        provider.state.lock().connected = true;
                        listener.connected();
                    }
                }
            }
        });
        Ok(())
    }

    fn request_updates(&self, config: &AcquisitionConfig) -> Result<(), ProviderError> {
        let runtime = Self::runtime()?;

        let (listener, updates) = {
            let mut state = self.state.lock();
            let (Some(listener), Some(connection)) = (state.listener.clone(), &state.connection)
            else {
                return Err(ProviderError::NotConnected);
            };
            let updates = connection.child_token();
            if let Some(previous) = state.updates.replace(updates.clone()) {
                previous.cancel();
            }
            (listener, updates)
        };

        let interval = config.update_interval;
        let this = self.self_ref.clone();
        runtime.spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    biased;
                    _ = updates.cancelled() => break,
                    _ = ticker.tick() => {
                        let Some(provider) = this.upgrade() else { break };
                        listener.location(provider.next_reading());
                    }
                }
            }
        });

        tracing::debug!(interval_ms = interval.as_millis() as u64, "Simulated updates requested");
        Ok(())
    }

    fn disconnect(&self) {
        let mut state = self.state.lock();
        if let Some(connection) = state.connection.take() {
            connection.cancel();
        }
        state.updates = None;
        state.listener = None;
        state.connected = false;
    }
}
