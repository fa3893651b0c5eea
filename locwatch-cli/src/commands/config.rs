//! Configuration management commands.

use std::path::Path;

use clap::Subcommand;
use locwatch::config::{config_file_path, ConfigFile};

use crate::error::CliError;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Print the effective configuration as INI
    Show,

    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Show the configuration file path
    Path,
}

/// Run a config subcommand.
pub fn run(command: ConfigCommands) -> Result<(), CliError> {
    match command {
        ConfigCommands::Show => run_show(),
        ConfigCommands::Init { force } => run_init(&config_file_path(), force).map(|written| {
            if written {
                println!("Wrote {}", config_file_path().display());
            } else {
                println!(
                    "{} already exists (use --force to overwrite)",
                    config_file_path().display()
                );
            }
        }),
        ConfigCommands::Path => {
            println!("{}", config_file_path().display());
            Ok(())
        }
    }
}

fn run_show() -> Result<(), CliError> {
    let config = ConfigFile::load()?;
    print!("{}", config.to_ini_string());
    Ok(())
}

/// Write defaults to `path`. Returns `false` if the file exists and `force`
/// is not set.
fn run_init(path: &Path, force: bool) -> Result<bool, CliError> {
    if path.exists() && !force {
        return Ok(false);
    }
    ConfigFile::default().save_to(path)?;
    Ok(true)
}
