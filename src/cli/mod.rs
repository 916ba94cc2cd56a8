//! CLI module
//!
//! Provides command-line interface for:
//! - run: reconcile every candidate entity in one transaction
//! - candidates: list candidate entity ids
//! - inspect: replay one entity without writing
//! - init: create the audit table

mod args;
mod commands;
mod config;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{candidates, init, inspect, run, run_command, run_reorder, RunSummary};
pub use config::Config;
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::write_response;
