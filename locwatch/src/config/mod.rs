//! Configuration file support.
//!
//! Settings live in `~/.locwatch/config.ini`:
//!
//! ```ini
//! [acquisition]
//! update_interval_ms = 1000
//! fastest_interval_ms = 1000
//! priority = high_accuracy
//!
//! [keep_alive]
//! enabled = false
//! initial_delay_ms = 2000
//! interval_ms = 1000
//! connect_timeout_ms = 30000
//!
//! [connectivity]
//! probe_address = 1.1.1.1:53
//! timeout_ms = 1500
//!
//! [flow]
//! resume_policy = from_permission
//!
//! [logging]
//! directory = ~/.locwatch/logs
//! file = locwatch.log
//! ```
//!
//! A missing file yields the defaults; a missing key keeps its default.
//! Invalid values are reported as [`ConfigFileError::InvalidValue`].

mod file;
mod parser;
mod settings;
mod writer;

pub use file::{config_directory, config_file_path, ConfigFileError};
pub use settings::{
    AcquisitionSettings, ConfigFile, ConnectivitySettings, FlowSettings, KeepAliveSettings,
    LoggingSettings, DEFAULT_LOG_FILE,
};
