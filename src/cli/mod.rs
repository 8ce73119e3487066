//! CLI module
//!
//! Provides command-line interface for:
//! - init: create the data directory layout
//! - check: validate descriptors only
//! - reconcile: run a pass and print the model registry
//! - versions: print persisted schema versions
//! - insert: save one record through a compiled model

mod args;
mod commands;
mod config;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{check, init, insert, reconcile, run, run_command, versions};
pub use config::Config;
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{read_request, write_error, write_response};
