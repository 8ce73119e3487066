//! CLI argument definitions using clap
//!
//! Commands:
//! - modelgate init --config <path>
//! - modelgate check --config <path>
//! - modelgate reconcile --config <path>
//! - modelgate versions --config <path>
//! - modelgate insert --config <path> --table <name>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// modelgate - declarative table descriptors reconciled against a document store
#[derive(Parser, Debug)]
#[command(name = "modelgate")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create the data directory layout
    Init {
        /// Path to configuration file
        #[arg(long, default_value = "./modelgate.json")]
        config: PathBuf,
    },

    /// Validate descriptors without touching the store
    Check {
        /// Path to configuration file
        #[arg(long, default_value = "./modelgate.json")]
        config: PathBuf,
    },

    /// Run one reconciliation pass and print the model registry
    Reconcile {
        /// Path to configuration file
        #[arg(long, default_value = "./modelgate.json")]
        config: PathBuf,
    },

    /// Print persisted schema versions
    Versions {
        /// Path to configuration file
        #[arg(long, default_value = "./modelgate.json")]
        config: PathBuf,
    },

    /// Reconcile, then save one JSON record read from stdin
    Insert {
        /// Path to configuration file
        #[arg(long, default_value = "./modelgate.json")]
        config: PathBuf,

        /// Target table
        #[arg(long)]
        table: String,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
