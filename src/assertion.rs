//! Line assertion engine
//!
//! The protocol's line framing is part of what is under test, so scenario
//! comparison is byte-for-byte including the terminator. No trimming, no
//! whitespace normalization.

use crate::common::{Error, Result};

/// Compare an actual receiver line against the scenario's expected line.
///
/// On mismatch the error carries the 1-based step number and both lines so
/// a failure can be reproduced without rerunning.
pub fn check_line(step: usize, expected: &str, actual: &[u8]) -> Result<()> {
    if expected.as_bytes() == actual {
        return Ok(());
    }
    Err(Error::Mismatch {
        step,
        expected: expected.to_string(),
        actual: String::from_utf8_lossy(actual).into_owned(),
    })
}
