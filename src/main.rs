//! Conformance harness for streaming sender/receiver pairs
//!
//! Drives an external pair binary through scripted scenarios — including
//! receiver disconnect/reconnect mid-stream — and checks the receiver's
//! output line by line.

use std::path::PathBuf;

use clap::Parser;
use pairtest::{cli, commands::Commands, common::logging};

#[derive(Parser)]
#[command(name = "pairtest", about = "Conformance harness for streaming sender/receiver pairs")]
#[command(version, long_about = None)]
struct Cli {
    /// Path to the harness configuration file
    #[arg(long, default_value = "harness.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    logging::init();

    let cli = Cli::parse();

    if let Err(e) = cli::dispatch(&cli.config, cli.command).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
