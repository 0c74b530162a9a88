//! Randomized soak run
//!
//! Probes stability under sustained load rather than scripted state
//! transitions: one long-lived pair, many random payloads. Unlike scenario
//! mode, which compares whole lines verbatim, soak only checks the
//! delivered payload field of each receiver line.

use rand::distributions::Alphanumeric;
use rand::Rng;

use crate::common::config::Config;
use crate::common::{Error, Result};
use crate::env;
use crate::process::{pause, ManagedProcess, Role};

/// 0-based index of the delivered payload in the receiver's `;`-line.
const PAYLOAD_FIELD: usize = 3;
const PROGRESS_EVERY: usize = 10;

/// Push `iterations` random alphanumeric payloads of `payload_len` bytes
/// through a freshly spawned pair and verify each delivery.
pub async fn run_soak(config: &Config, iterations: usize, payload_len: usize) -> Result<()> {
    let binary = config.subject_binary()?;
    let env_root = &config.paths.env_root;
    let settle = config.timing.settle();

    env::reset(&[Role::Sender.dir(env_root), Role::Receiver.dir(env_root)])?;

    tracing::info!(iterations, payload_len, "starting soak run");

    let mut sender = ManagedProcess::spawn(
        Role::Sender,
        &Role::Sender.dir(env_root),
        &binary,
        &config.sender_args(),
    )?;
    let mut receiver = ManagedProcess::spawn(
        Role::Receiver,
        &Role::Receiver.dir(env_root),
        &binary,
        &config.receiver_args(),
    )?;
    sender.settle(settle).await?;
    receiver.settle(settle).await?;

    let result = drive(config, &mut sender, &mut receiver, iterations, payload_len).await;

    receiver.terminate().await;
    sender.terminate().await;
    pause(settle).await;

    result
}

async fn drive(
    config: &Config,
    sender: &mut ManagedProcess,
    receiver: &mut ManagedProcess,
    iterations: usize,
    payload_len: usize,
) -> Result<()> {
    let deadline = config.timing.read_timeout();
    let mut rng = rand::thread_rng();

    for iter in 1..=iterations {
        let mut payload: String = (&mut rng)
            .sample_iter(&Alphanumeric)
            .take(payload_len)
            .map(char::from)
            .collect();
        payload.push('\n');

        sender.send(payload.as_bytes()).await?;
        let line = receiver.read_line(deadline).await?;
        check_field(iter, &payload, &line)?;

        if iter % PROGRESS_EVERY == 0 {
            tracing::info!(iteration = iter, "soak progress");
        }
    }

    tracing::info!(iterations, "soak run completed");
    Ok(())
}

/// Compare only the delivered payload field of the receiver line.
///
/// Payloads are alphanumeric, so the field split cannot cut through one.
fn check_field(step: usize, payload: &str, line: &[u8]) -> Result<()> {
    let field = line.split(|b| *b == b';').nth(PAYLOAD_FIELD);
    match field {
        Some(f) if f == payload.as_bytes() => Ok(()),
        _ => Err(Error::Mismatch {
            step,
            expected: payload.to_string(),
            actual: String::from_utf8_lossy(line).into_owned(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_payload_field_passes() {
        check_field(1, "abc123\n", b"7;alice;verified;abc123\n").unwrap();
    }

    #[test]
    fn extra_fields_do_not_shift_the_payload_index() {
        // Field 3 is compared even when later fields follow.
        let err = check_field(1, "abc\n", b"7;alice;verified;abc;extra\n").unwrap_err();
        assert!(matches!(err, Error::Mismatch { .. }));
        check_field(1, "abc", b"7;alice;verified;abc;extra\n").unwrap();
    }

    #[test]
    fn short_lines_are_structural_failures() {
        let err = check_field(4, "abc\n", b"7;alice;verified\n").unwrap_err();
        assert!(matches!(err, Error::Mismatch { step: 4, .. }), "got {err:?}");
    }

    #[test]
    fn wrong_payload_is_reported_with_iteration() {
        let err = check_field(9, "abc\n", b"7;alice;verified;xyz\n").unwrap_err();
        match err {
            Error::Mismatch { step, .. } => assert_eq!(step, 9),
            other => panic!("expected mismatch, got {other:?}"),
        }
    }
}
