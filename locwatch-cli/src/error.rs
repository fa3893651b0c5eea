//! CLI error handling with user-friendly messages.
//!
//! Centralizes error reporting for the CLI so every command fails with the
//! same formatting and exit code.

use std::fmt;
use std::process;

use locwatch::config::ConfigFileError;

/// CLI-specific errors.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration error
    Config(String),
    /// Failed to build or drive the async runtime
    Runtime(String),
    /// Failed to write a reading to stdout
    Output(String),
}

impl CliError {
    /// Print the error (plus hints where useful) and exit with status 1.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        if let CliError::Config(_) = self {
            eprintln!();
            eprintln!("Check the configuration with: locwatch config show");
            eprintln!("Recreate a default file with: locwatch config init --force");
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Runtime(msg) => write!(f, "Runtime error: {}", msg),
            CliError::Output(msg) => write!(f, "Failed to write output: {}", msg),
        }
    }
}

impl std::error::Error for CliError {}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e.to_string())
    }
}
