//! Acquisition configuration and its builder.

use std::time::Duration;

use thiserror::Error;

/// Default interval between location updates (1 second).
pub const DEFAULT_UPDATE_INTERVAL: Duration = Duration::from_millis(1000);

/// Default fastest accepted update interval (1 second).
pub const DEFAULT_FASTEST_INTERVAL: Duration = Duration::from_millis(1000);

/// Accuracy/power trade-off requested from the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Priority {
    /// Most accurate fix available.
    #[default]
    HighAccuracy,
    /// Block-level accuracy at lower power.
    BalancedPowerAccuracy,
    /// City-level accuracy.
    LowPower,
    /// Only fixes other consumers already triggered.
    NoPower,
}

impl Priority {
    /// Config-file spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::HighAccuracy => "high_accuracy",
            Priority::BalancedPowerAccuracy => "balanced",
            Priority::LowPower => "low_power",
            Priority::NoPower => "no_power",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "high_accuracy" | "high" => Ok(Priority::HighAccuracy),
            "balanced" | "balanced_power_accuracy" => Ok(Priority::BalancedPowerAccuracy),
            "low_power" | "low" => Ok(Priority::LowPower),
            "no_power" | "passive" => Ok(Priority::NoPower),
            other => Err(format!("unknown priority '{}'", other)),
        }
    }
}

/// Invalid acquisition configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The fastest interval is longer than the update interval.
    #[error("Fastest interval ({fastest_ms}ms) exceeds update interval ({update_ms}ms)")]
    FastestExceedsUpdate { fastest_ms: u128, update_ms: u128 },

    /// The update interval is zero.
    #[error("Update interval must be greater than zero")]
    ZeroUpdateInterval,
}

/// How often, and how precisely, the provider should deliver fixes.
///
/// Invariant: `fastest_interval <= update_interval`. Values built with
/// [`AcquisitionConfig::builder`] always hold it; hand-assembled values are
/// checked by [`AcquisitionConfig::validate`] when a session is configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcquisitionConfig {
    /// Desired interval between updates.
    pub update_interval: Duration,
    /// Fastest interval the consumer can handle.
    pub fastest_interval: Duration,
    /// Accuracy/power trade-off.
    pub priority: Priority,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            update_interval: DEFAULT_UPDATE_INTERVAL,
            fastest_interval: DEFAULT_FASTEST_INTERVAL,
            priority: Priority::default(),
        }
    }
}

impl AcquisitionConfig {
    /// Start building a configuration from the defaults.
    pub fn builder() -> AcquisitionConfigBuilder {
        AcquisitionConfigBuilder::default()
    }

    /// Check the interval invariant.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.update_interval.is_zero() {
            return Err(ConfigError::ZeroUpdateInterval);
        }
        if self.fastest_interval > self.update_interval {
            return Err(ConfigError::FastestExceedsUpdate {
                fastest_ms: self.fastest_interval.as_millis(),
                update_ms: self.update_interval.as_millis(),
            });
        }
        Ok(())
    }
}

/// Builder for [`AcquisitionConfig`].
///
/// ```
/// use std::time::Duration;
/// use locwatch::session::{AcquisitionConfig, Priority};
///
/// let config = AcquisitionConfig::builder()
///     .intervals(Duration::from_secs(5), Duration::from_secs(1))
///     .priority(Priority::BalancedPowerAccuracy)
///     .build()
///     .unwrap();
/// assert_eq!(config.update_interval, Duration::from_secs(5));
/// ```
#[derive(Debug, Clone, Default)]
pub struct AcquisitionConfigBuilder {
    config: AcquisitionConfig,
}

impl AcquisitionConfigBuilder {
    /// Set both intervals.
    pub fn intervals(mut self, update: Duration, fastest: Duration) -> Self {
        self.config.update_interval = update;
        self.config.fastest_interval = fastest;
        self
    }

    /// Set both intervals in milliseconds.
    pub fn intervals_ms(self, update_ms: u64, fastest_ms: u64) -> Self {
        self.intervals(
            Duration::from_millis(update_ms),
            Duration::from_millis(fastest_ms),
        )
    }

    /// Set the priority.
    pub fn priority(mut self, priority: Priority) -> Self {
        self.config.priority = priority;
        self
    }

    /// Finish, checking the interval invariant.
    pub fn build(self) -> Result<AcquisitionConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
