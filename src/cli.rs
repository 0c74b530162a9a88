//! CLI command handling
//!
//! Loads the configuration and dispatches commands to the suite runner or
//! the soak loop.

use std::path::Path;

use crate::commands::Commands;
use crate::common::config::Config;
use crate::common::{Error, Result};
use crate::soak;
use crate::suite::{self, FailurePolicy};

/// Dispatch a CLI command
pub async fn dispatch(config_path: &Path, command: Commands) -> Result<()> {
    let config = Config::load(config_path)?;

    match command {
        Commands::Run {
            scenario_dir,
            keep_going,
            json,
            soak: with_soak,
        } => {
            let policy = if keep_going {
                FailurePolicy::KeepGoing
            } else {
                FailurePolicy::Abort
            };

            let report = suite::run_suite(&config, &scenario_dir, policy).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                suite::print_summary(&report);
            }

            if !report.all_passed() {
                return Err(Error::SuiteFailed {
                    failed: report.failed,
                    total: report.passed + report.failed,
                });
            }

            if with_soak {
                soak::run_soak(&config, config.soak.iterations, config.soak.payload_len).await?;
            }

            Ok(())
        }

        Commands::Soak {
            iterations,
            payload_len,
        } => {
            let iterations = iterations.unwrap_or(config.soak.iterations);
            let payload_len = payload_len.unwrap_or(config.soak.payload_len);
            soak::run_soak(&config, iterations, payload_len).await
        }
    }
}
