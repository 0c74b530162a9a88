//! Suite orchestration
//!
//! Enumerates scenario files, resets the environment before every run and
//! aggregates the per-scenario reports. Enumeration is sorted by file name
//! so two runs over the same directory always execute in the same order.

use std::path::{Path, PathBuf};

use colored::Colorize;
use serde::Serialize;

use crate::common::config::Config;
use crate::common::{Error, Result};
use crate::env;
use crate::process::Role;
use crate::scenario::{self, Scenario};

/// Recognized scenario file extension.
const SCENARIO_EXT: &str = "scenario";

/// What the suite does when a scenario fails.
///
/// [`Abort`] is the default: the reference harness stops the whole suite at
/// the first mismatch. [`KeepGoing`] runs every scenario and aggregates.
///
/// [`Abort`]: FailurePolicy::Abort
/// [`KeepGoing`]: FailurePolicy::KeepGoing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    Abort,
    KeepGoing,
}

/// Aggregated outcome of a suite run.
#[derive(Debug, Serialize)]
pub struct SuiteReport {
    pub passed: usize,
    pub failed: usize,
    pub scenarios: Vec<ScenarioSummary>,
}

#[derive(Debug, Serialize)]
pub struct ScenarioSummary {
    pub name: String,
    pub passed: bool,
    pub steps_run: usize,
    pub steps_total: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SuiteReport {
    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }
}

/// Enumerate scenario files in `dir`, sorted by file name.
pub fn scenario_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let entries = std::fs::read_dir(dir).map_err(|e| {
        Error::Config(format!(
            "cannot read scenario directory '{}': {}",
            dir.display(),
            e
        ))
    })?;

    for entry in entries {
        let path = entry.map_err(Error::Io)?.path();
        if path.extension().and_then(|e| e.to_str()) == Some(SCENARIO_EXT) {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}

/// Run every scenario file in `dir` under the given failure policy.
pub async fn run_suite(config: &Config, dir: &Path, policy: FailurePolicy) -> Result<SuiteReport> {
    let files = scenario_files(dir)?;
    if files.is_empty() {
        return Err(Error::Config(format!(
            "no .{SCENARIO_EXT} files in '{}'",
            dir.display()
        )));
    }

    // Malformed files fail the suite before any process is spawned.
    let scenarios = files
        .iter()
        .map(|f| Scenario::load(f))
        .collect::<Result<Vec<_>>>()?;

    let role_dirs = vec![
        Role::Sender.dir(&config.paths.env_root),
        Role::Receiver.dir(&config.paths.env_root),
    ];

    let mut report = SuiteReport {
        passed: 0,
        failed: 0,
        scenarios: Vec::new(),
    };

    for s in &scenarios {
        env::reset(&role_dirs)?;

        let sr = scenario::run_scenario(config, s).await?;
        if sr.passed {
            report.passed += 1;
            println!("{} {}", "✓".green().bold(), "Scenario passed".green());
        } else {
            report.failed += 1;
            println!("{} {}", "✗".red().bold(), "Scenario failed".red());
        }

        let stop = !sr.passed && policy == FailurePolicy::Abort;
        report.scenarios.push(ScenarioSummary {
            name: sr.name,
            passed: sr.passed,
            steps_run: sr.steps_run,
            steps_total: sr.steps_total,
            error: sr.error,
        });
        if stop {
            break;
        }
    }

    Ok(report)
}

/// Print the human-readable suite summary.
pub fn print_summary(report: &SuiteReport) {
    println!(
        "\n{} {} passed, {} failed",
        "Suite:".blue().bold(),
        report.passed.to_string().green(),
        if report.failed > 0 {
            report.failed.to_string().red().to_string()
        } else {
            report.failed.to_string()
        }
    );
    for s in &report.scenarios {
        if let Some(err) = &s.error {
            println!(
                "  {} {} (step {}/{}): {}",
                "✗".red(),
                s.name,
                s.steps_run,
                s.steps_total,
                err
            );
        }
    }
}
