//! Error types for the harness
//!
//! The taxonomy splits into errors fatal to the whole run (environment,
//! spawn, configuration) and errors scoped to the current scenario
//! (mismatches, pipe failures, read timeouts). Failure messages carry
//! enough context to reproduce without rerunning.

use std::io;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the harness
#[derive(Error, Debug)]
pub enum Error {
    // === Environment errors ===
    #[error("Failed to clear environment directory '{path}': {source}")]
    Environment {
        path: String,
        #[source]
        source: io::Error,
    },

    // === Process errors ===
    #[error("Failed to spawn {role} process: {source}")]
    Spawn {
        role: String,
        #[source]
        source: io::Error,
    },

    #[error("Pipe to {role} broke: {source}")]
    Pipe {
        role: String,
        #[source]
        source: io::Error,
    },

    #[error("{role} closed its output stream unexpectedly")]
    StreamClosed { role: String },

    #[error("No response from {role} within {secs} seconds")]
    ReadTimeout { role: String, secs: u64 },

    // === Assertion errors ===
    #[error("Step {step}: expected {expected:?}, got {actual:?}")]
    Mismatch {
        step: usize,
        expected: String,
        actual: String,
    },

    // === Scenario file errors ===
    #[error("Invalid scenario file '{path}' (line {line}): {reason}")]
    ScenarioParse {
        path: String,
        line: usize,
        reason: String,
    },

    // === Suite errors ===
    #[error("{failed} of {total} scenarios failed")]
    SuiteFailed { failed: usize, total: usize },

    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Errors that abort the whole suite; everything else only fails the
    /// scenario in flight.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::Environment { .. }
                | Error::Spawn { .. }
                | Error::ScenarioParse { .. }
                | Error::Config(_)
                | Error::ConfigParse(_)
                | Error::Io(_)
                | Error::Json(_)
        )
    }
}
