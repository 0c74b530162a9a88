//! Scenario execution
//!
//! Drives the subject pair through one scenario: the sender is spawned once
//! at the start, the receiver comes and goes as the directives dictate, and
//! every assert step reads exactly one line from the receiver.
//!
//! The probe written to the sender is always the step's sequence number as
//! `"<n>\r\n"`; scenario payload text is never sent.

use std::path::Path;

use colored::Colorize;

use crate::assertion;
use crate::common::config::Config;
use crate::common::{Error, Result};
use crate::process::{pause, ManagedProcess, Role};
use crate::scenario::{Directive, Scenario};

/// Result of one scenario run.
#[derive(Debug)]
pub struct ScenarioReport {
    pub name: String,
    pub passed: bool,
    pub steps_run: usize,
    pub steps_total: usize,
    pub error: Option<String>,
}

/// Run a single scenario against the subject pair.
///
/// Errors scoped to the scenario (mismatch, broken pipe, closed stream,
/// read timeout) land in the report; setup errors (spawn failure,
/// environment damage) propagate as `Err` and abort the whole suite.
pub async fn run_scenario(config: &Config, scenario: &Scenario) -> Result<ScenarioReport> {
    let steps_total = scenario.directives.len();

    println!(
        "\n{} {}",
        "Running scenario:".blue().bold(),
        scenario.name.white().bold()
    );

    let binary = config.subject_binary()?;
    let env_root = &config.paths.env_root;
    let settle = config.timing.settle();

    let mut sender = ManagedProcess::spawn(
        Role::Sender,
        &Role::Sender.dir(env_root),
        &binary,
        &config.sender_args(),
    )?;
    let mut receiver: Option<ManagedProcess> = None;

    let mut steps_run = 0;
    let mut failure: Option<Error> = None;

    match sender.settle(settle).await {
        Ok(()) => {
            for (i, directive) in scenario.directives.iter().enumerate() {
                let seq = i + 1;
                match run_step(config, &binary, &mut sender, &mut receiver, seq, directive).await
                {
                    Ok(()) => {
                        steps_run = seq;
                        let label = match directive {
                            Directive::Skip => "skip (receiver down)",
                            Directive::Assert { .. } => "assert",
                        };
                        println!("  {} Step {}: {}", "✓".green(), seq, label.dimmed());
                    }
                    Err(e) if e.is_fatal() => {
                        teardown(&mut sender, &mut receiver, settle).await;
                        return Err(e);
                    }
                    Err(e) => {
                        println!("  {} Step {}: {}", "✗".red(), seq, e);
                        steps_run = seq;
                        failure = Some(e);
                        break;
                    }
                }
            }
        }
        Err(e) => failure = Some(e),
    }

    teardown(&mut sender, &mut receiver, settle).await;

    Ok(ScenarioReport {
        name: scenario.name.clone(),
        passed: failure.is_none(),
        steps_run,
        steps_total,
        error: failure.map(|e| e.to_string()),
    })
}

/// Execute one directive. The sequence number doubles as the probe payload.
async fn run_step(
    config: &Config,
    binary: &Path,
    sender: &mut ManagedProcess,
    receiver: &mut Option<ManagedProcess>,
    seq: usize,
    directive: &Directive,
) -> Result<()> {
    let settle = config.timing.settle();
    let probe = format!("{seq}\r\n");

    match directive {
        Directive::Skip => {
            // The step's message must be lost, so the receiver goes first.
            if let Some(mut r) = receiver.take() {
                r.terminate().await;
                pause(settle).await;
            }
            sender.send(probe.as_bytes()).await?;
            sender.settle(settle).await?;
            Ok(())
        }
        Directive::Assert { expected } => {
            if receiver.is_none() {
                // Reconnection after loss: the subject pair re-establishes
                // its session before the next message arrives.
                pause(settle).await;
                let mut r = ManagedProcess::spawn(
                    Role::Receiver,
                    &Role::Receiver.dir(&config.paths.env_root),
                    binary,
                    &config.receiver_args(),
                )?;
                r.settle(settle).await?;
                *receiver = Some(r);
            }

            sender.send(probe.as_bytes()).await?;
            sender.settle(settle).await?;

            if let Some(r) = receiver.as_mut() {
                let actual = r.read_line(config.timing.read_timeout()).await?;
                assertion::check_line(seq, expected, &actual)?;
            }
            Ok(())
        }
    }
}

/// Terminate whatever is still alive, then give the OS one settle interval
/// to release sockets and pipes before the next scenario resets the
/// environment.
async fn teardown(
    sender: &mut ManagedProcess,
    receiver: &mut Option<ManagedProcess>,
    settle: std::time::Duration,
) {
    if let Some(mut r) = receiver.take() {
        r.terminate().await;
    }
    sender.terminate().await;
    pause(settle).await;
}
