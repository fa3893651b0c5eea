//! CLI runner for common setup.
//!
//! Loads the configuration file and initializes logging once per command.

use tracing::info;

use locwatch::config::ConfigFile;
use locwatch::logging::{init_logging, LoggingGuard};

use crate::error::CliError;

/// Owns the configuration and keeps logging alive for the command's duration.
pub struct CliRunner {
    logging_guard: LoggingGuard,
    config: ConfigFile,
}

impl CliRunner {
    /// Load `~/.locwatch/config.ini` (defaults if absent) and start logging.
    ///
    /// Logs always go to the configured file; `log_stdout` mirrors them to
    /// stdout, where they interleave with command output.
    pub fn new(log_stdout: bool) -> Result<Self, CliError> {
        let config = ConfigFile::load()?;

        let logging_guard = init_logging(
            &config.logging.directory,
            &config.logging.file,
            log_stdout,
        )
        .map_err(|e| CliError::LoggingInit(e.to_string()))?;

        Ok(Self {
            logging_guard,
            config,
        })
    }

    /// The loaded configuration.
    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    /// Log the banner for `command`.
    pub fn log_startup(&self, command: &str) {
        info!("Locwatch v{}", locwatch::VERSION);
        info!(
            log_file = %self.logging_guard.path().display(),
            "Locwatch CLI: {} command", command
        );
    }
}
