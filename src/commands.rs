//! CLI command definitions
//!
//! Defines the clap commands for the harness.

use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Run every scenario file in a directory
    Run {
        /// Directory containing .scenario files
        scenario_dir: PathBuf,

        /// Run all scenarios even after a failure (default: abort on the
        /// first failing scenario)
        #[arg(long)]
        keep_going: bool,

        /// Print the suite summary as JSON
        #[arg(long)]
        json: bool,

        /// Follow a fully green suite with a randomized soak run
        #[arg(long)]
        soak: bool,
    },

    /// Drive the pair with random payloads to probe sustained-load stability
    Soak {
        /// Number of payloads to push through the pair
        #[arg(long)]
        iterations: Option<usize>,

        /// Length of each random payload in bytes
        #[arg(long)]
        payload_len: Option<usize>,
    },
}
