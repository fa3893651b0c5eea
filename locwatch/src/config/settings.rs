//! Typed configuration sections and conversions into runtime configs.

use std::path::PathBuf;
use std::time::Duration;

use super::file::{config_directory, ConfigFileError};
use crate::connectivity::{TcpConnectivityProbe, DEFAULT_PROBE_ADDRESS, DEFAULT_PROBE_TIMEOUT};
use crate::flow::{FlowConfig, ResumePolicy};
use crate::session::{
    AcquisitionConfig, KeepAliveConfig, Priority, DEFAULT_FASTEST_INTERVAL,
    DEFAULT_KEEP_ALIVE_CONNECT_TIMEOUT, DEFAULT_KEEP_ALIVE_INITIAL_DELAY,
    DEFAULT_KEEP_ALIVE_INTERVAL, DEFAULT_UPDATE_INTERVAL,
};

/// Default log file name.
pub const DEFAULT_LOG_FILE: &str = "locwatch.log";

/// The whole configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigFile {
    pub acquisition: AcquisitionSettings,
    pub keep_alive: KeepAliveSettings,
    pub connectivity: ConnectivitySettings,
    pub flow: FlowSettings,
    pub logging: LoggingSettings,
}

/// `[acquisition]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcquisitionSettings {
    pub update_interval_ms: u64,
    pub fastest_interval_ms: u64,
    pub priority: Priority,
}

impl Default for AcquisitionSettings {
    fn default() -> Self {
        Self {
            update_interval_ms: DEFAULT_UPDATE_INTERVAL.as_millis() as u64,
            fastest_interval_ms: DEFAULT_FASTEST_INTERVAL.as_millis() as u64,
            priority: Priority::default(),
        }
    }
}

/// `[keep_alive]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeepAliveSettings {
    pub enabled: bool,
    pub initial_delay_ms: u64,
    pub interval_ms: u64,
    pub connect_timeout_ms: u64,
}

impl Default for KeepAliveSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            initial_delay_ms: DEFAULT_KEEP_ALIVE_INITIAL_DELAY.as_millis() as u64,
            interval_ms: DEFAULT_KEEP_ALIVE_INTERVAL.as_millis() as u64,
            connect_timeout_ms: DEFAULT_KEEP_ALIVE_CONNECT_TIMEOUT.as_millis() as u64,
        }
    }
}

/// `[connectivity]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectivitySettings {
    pub probe_address: String,
    pub timeout_ms: u64,
}

impl Default for ConnectivitySettings {
    fn default() -> Self {
        Self {
            probe_address: DEFAULT_PROBE_ADDRESS.to_string(),
            timeout_ms: DEFAULT_PROBE_TIMEOUT.as_millis() as u64,
        }
    }
}

/// `[flow]`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlowSettings {
    pub resume_policy: ResumePolicy,
}

/// `[logging]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingSettings {
    pub directory: PathBuf,
    pub file: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            directory: config_directory().join("logs"),
            file: DEFAULT_LOG_FILE.to_string(),
        }
    }
}

impl ConfigFile {
    /// The session configuration.
    pub fn acquisition_config(&self) -> Result<AcquisitionConfig, ConfigFileError> {
        AcquisitionConfig::builder()
            .intervals_ms(
                self.acquisition.update_interval_ms,
                self.acquisition.fastest_interval_ms,
            )
            .priority(self.acquisition.priority)
            .build()
            .map_err(|e| ConfigFileError::InvalidValue {
                section: "acquisition".to_string(),
                key: "fastest_interval_ms".to_string(),
                value: self.acquisition.fastest_interval_ms.to_string(),
                reason: e.to_string(),
            })
    }

    /// Keep-alive timing, or `None` when disabled.
    pub fn keep_alive_config(&self) -> Option<KeepAliveConfig> {
        self.keep_alive.enabled.then(|| {
            KeepAliveConfig::default()
                .with_initial_delay(Duration::from_millis(self.keep_alive.initial_delay_ms))
                .with_interval(Duration::from_millis(self.keep_alive.interval_ms))
                .with_connect_timeout(Duration::from_millis(self.keep_alive.connect_timeout_ms))
        })
    }

    /// The flow configuration.
    pub fn flow_config(&self) -> Result<FlowConfig, ConfigFileError> {
        let mut config = FlowConfig::default()
            .with_acquisition(self.acquisition_config()?)
            .with_resume_policy(self.flow.resume_policy);
        config.keep_alive = self.keep_alive_config();
        Ok(config)
    }

    /// A TCP connectivity probe for the configured address.
    pub fn connectivity_probe(&self) -> TcpConnectivityProbe {
        TcpConnectivityProbe::new(
            self.connectivity.probe_address.clone(),
            Duration::from_millis(self.connectivity.timeout_ms),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_runtime_defaults() {
        let config = ConfigFile::default();
        assert_eq!(config.acquisition_config().unwrap(), AcquisitionConfig::default());
        assert!(config.keep_alive_config().is_none());
        assert_eq!(config.connectivity_probe().address(), DEFAULT_PROBE_ADDRESS);
        assert_eq!(config.flow_config().unwrap(), FlowConfig::default());
    }

    #[test]
    fn test_keep_alive_enabled() {
        let mut config = ConfigFile::default();
        config.keep_alive.enabled = true;
        config.keep_alive.interval_ms = 500;

        let keep_alive = config.keep_alive_config().unwrap();
        assert_eq!(keep_alive.initial_delay, Duration::from_secs(2));
        assert_eq!(keep_alive.interval, Duration::from_millis(500));
        assert_eq!(keep_alive.connect_timeout, Duration::from_secs(30));
        assert_eq!(config.flow_config().unwrap().keep_alive, Some(keep_alive));
    }
}
