//! Locwatch CLI - command-line host for the location flow.
//!
//! `locwatch run` wires the library to simulated collaborators and prints
//! every delivered reading to stdout as a JSON `LocationBroadcast`.
//! Diagnostics go to stderr and the log file.

mod commands;
mod error;
mod runner;

use clap::{Parser, Subcommand};

use commands::common::PermissionChoice;
use commands::config::ConfigCommands;
use commands::run::RunArgs;

#[derive(Parser)]
#[command(name = "locwatch")]
#[command(version = locwatch::VERSION)]
#[command(about = "Precondition-gated live location acquisition", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the activation flow and print readings until Ctrl-C
    Run {
        /// Stop after this many readings
        #[arg(long)]
        count: Option<u64>,

        /// Latitude of the first generated reading
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        lat: f64,

        /// Longitude of the first generated reading
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        lon: f64,

        /// Latitude change per reading
        #[arg(long, default_value_t = 0.0001, allow_negative_numbers = true)]
        step_lat: f64,

        /// Longitude change per reading
        #[arg(long, default_value_t = 0.0001, allow_negative_numbers = true)]
        step_lon: f64,

        /// Update interval in milliseconds (overrides config)
        #[arg(long)]
        interval_ms: Option<u64>,

        /// Number of initial provider connects that fail
        #[arg(long, default_value_t = 0)]
        fail_connects: u32,

        /// How the simulated user answers permission prompts
        #[arg(long, value_enum, default_value = "grant")]
        permission: PermissionChoice,

        /// Enable keep-alive even if the config file disables it
        #[arg(long)]
        keep_alive: bool,

        /// Skip the network probe and assume connectivity
        #[arg(long)]
        assume_online: bool,

        /// Automatic retries for connectivity and permission prompts
        #[arg(long, default_value_t = 3)]
        retries: u32,

        /// Mirror logs to stdout
        #[arg(long)]
        log_stdout: bool,
    },

    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            count,
            lat,
            lon,
            step_lat,
            step_lon,
            interval_ms,
            fail_connects,
            permission,
            keep_alive,
            assume_online,
            retries,
            log_stdout,
        } => commands::run::run(RunArgs {
            count,
            lat,
            lon,
            step_lat,
            step_lon,
            interval_ms,
            fail_connects,
            permission,
            keep_alive,
            assume_online,
            retries,
            log_stdout,
        }),
        Commands::Config { command } => commands::config::run(command),
    };

    if let Err(e) = result {
        e.exit();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_arguments() {
        let cli = Cli::try_parse_from([
            "locwatch",
            "run",
            "--count",
            "2",
            "--lat",
            "-33.86",
            "--permission",
            "deny-first",
            "--assume-online",
        ])
        .unwrap();

        match cli.command {
            Commands::Run {
                count,
                lat,
                permission,
                assume_online,
                retries,
                ..
            } => {
                assert_eq!(count, Some(2));
                assert_eq!(lat, -33.86);
                assert_eq!(permission, PermissionChoice::DenyFirst);
                assert!(assume_online);
                assert_eq!(retries, 3);
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_parse_config_init() {
        let cli = Cli::try_parse_from(["locwatch", "config", "init", "--force"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Config {
                command: ConfigCommands::Init { force: true }
            }
        ));
    }
}
