//! CLI command implementations.
//!
//! - [`config`] - Configuration management (show, init, path)
//! - [`run`] - Run the activation flow against simulated collaborators

pub mod common;
pub mod config;
pub mod run;
