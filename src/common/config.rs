//! Configuration file handling
//!
//! The whole harness is parameterized through one TOML file passed on the
//! command line; every field has a default so a missing file still yields a
//! usable configuration. Paths, addresses and timings all live here — there
//! is no global state, so independent runs only need distinct configs.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::{Error, Result};

/// Main configuration structure
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// The binary under test and how the two roles reach each other
    #[serde(default)]
    pub subject: SubjectConfig,

    /// Session parameters forwarded to the sender
    #[serde(default)]
    pub sender: SenderConfig,

    /// Settle intervals and read deadlines
    #[serde(default)]
    pub timing: TimingConfig,

    /// Filesystem layout
    #[serde(default)]
    pub paths: PathsConfig,

    /// Soak run settings
    #[serde(default)]
    pub soak: SoakConfig,
}

/// The subject pair binary and its endpoints.
#[derive(Debug, Deserialize, Clone)]
pub struct SubjectConfig {
    /// Path to the pair binary, or a bare name resolved from PATH
    #[serde(default = "default_binary")]
    pub binary: PathBuf,

    /// Shared protocol configuration file, passed through verbatim as
    /// `--config` (the subject resolves relative paths against its cwd)
    #[serde(default = "default_subject_config")]
    pub config: String,

    /// Address the sender binds to
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Address the receiver reaches the sender at
    #[serde(default = "default_connect_addr")]
    pub connect_addr: String,

    /// Identity name handed to both roles
    #[serde(default = "default_identity")]
    pub identity: String,
}

impl Default for SubjectConfig {
    fn default() -> Self {
        Self {
            binary: default_binary(),
            config: default_subject_config(),
            listen_addr: default_listen_addr(),
            connect_addr: default_connect_addr(),
            identity: default_identity(),
        }
    }
}

fn default_binary() -> PathBuf {
    PathBuf::from("pair")
}
fn default_subject_config() -> String {
    "config.toml".to_string()
}
fn default_listen_addr() -> String {
    "0.0.0.0:5555".to_string()
}
fn default_connect_addr() -> String {
    "127.0.0.1:5555".to_string()
}
fn default_identity() -> String {
    "alice".to_string()
}

/// Cryptographic/session parameters forwarded to the sender. Opaque to the
/// harness — they only shape the subject's key-rotation behavior.
#[derive(Debug, Deserialize, Clone)]
pub struct SenderConfig {
    /// Initial randomness seed
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Number of key layers
    #[serde(default = "default_layers")]
    pub layers: usize,

    /// Key rotation by lifetime; mutually exclusive with `key_charges`
    #[serde(default)]
    pub key_lifetime: Option<usize>,

    /// Key rotation by maximum use count; mutually exclusive with
    /// `key_lifetime`
    #[serde(default)]
    pub key_charges: Option<usize>,

    /// Maximum payload size accepted by the sender
    #[serde(default = "default_max_piece_size")]
    pub max_piece_size: usize,
}

impl Default for SenderConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            layers: default_layers(),
            key_lifetime: None,
            key_charges: None,
            max_piece_size: default_max_piece_size(),
        }
    }
}

fn default_seed() -> u64 {
    42
}
fn default_layers() -> usize {
    3
}
fn default_max_piece_size() -> usize {
    10 * 1024 * 1024
}

/// Settle intervals and read deadlines, in concrete units.
#[derive(Debug, Deserialize, Clone)]
pub struct TimingConfig {
    /// Fixed settle interval between harness actions
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,

    /// Deadline for one receiver line before the step fails as unresponsive
    #[serde(default = "default_read_timeout")]
    pub read_timeout_secs: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            settle_ms: default_settle_ms(),
            read_timeout_secs: default_read_timeout(),
        }
    }
}

fn default_settle_ms() -> u64 {
    1000
}
fn default_read_timeout() -> u64 {
    30
}

impl TimingConfig {
    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }
}

/// Filesystem layout.
#[derive(Debug, Deserialize, Clone)]
pub struct PathsConfig {
    /// Root under which the per-role working directories live
    #[serde(default = "default_env_root")]
    pub env_root: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            env_root: default_env_root(),
        }
    }
}

fn default_env_root() -> PathBuf {
    PathBuf::from("env")
}

/// Soak run settings.
#[derive(Debug, Deserialize, Clone)]
pub struct SoakConfig {
    #[serde(default = "default_iterations")]
    pub iterations: usize,

    /// Length of each random payload in bytes
    #[serde(default = "default_payload_len")]
    pub payload_len: usize,
}

impl Default for SoakConfig {
    fn default() -> Self {
        Self {
            iterations: default_iterations(),
            payload_len: default_payload_len(),
        }
    }
}

fn default_iterations() -> usize {
    100
}
fn default_payload_len() -> usize {
    1024
}

impl Config {
    /// Load configuration from `path`.
    ///
    /// Returns default configuration if the file doesn't exist.
    pub fn load(path: &Path) -> Result<Self> {
        let config = if path.exists() {
            let content = std::fs::read_to_string(path).map_err(|e| {
                Error::Config(format!("failed to read '{}': {}", path.display(), e))
            })?;
            toml::from_str(&content).map_err(|e| Error::ConfigParse(e.to_string()))?
        } else {
            Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.sender.key_lifetime.is_some() && self.sender.key_charges.is_some() {
            return Err(Error::Config(
                "key_lifetime and key_charges are mutually exclusive".to_string(),
            ));
        }
        Ok(())
    }

    /// Resolve the subject binary, searching PATH for bare names.
    pub fn subject_binary(&self) -> Result<PathBuf> {
        if self.subject.binary.exists() {
            return Ok(self.subject.binary.clone());
        }
        which::which(&self.subject.binary).map_err(|_| {
            Error::Config(format!(
                "subject binary '{}' not found",
                self.subject.binary.display()
            ))
        })
    }

    /// Argument list for the sender role.
    ///
    /// Neither key-rotation flag is passed when neither is configured,
    /// leaving the subject's own default in force.
    pub fn sender_args(&self) -> Vec<String> {
        let mut args = vec![
            format!("--seed={}", self.sender.seed),
            format!("--layers={}", self.sender.layers),
        ];
        if let Some(n) = self.sender.key_lifetime {
            args.push(format!("--key-lifetime={n}"));
        }
        if let Some(n) = self.sender.key_charges {
            args.push(format!("--key-charges={n}"));
        }
        args.push(format!("--max-piece-size={}", self.sender.max_piece_size));
        args.push(format!("--config={}", self.subject.config));
        args.push("sender".to_string());
        args.push(self.subject.listen_addr.clone());
        args.push(self.subject.identity.clone());
        args
    }

    /// Argument list for the receiver role.
    pub fn receiver_args(&self) -> Vec<String> {
        vec![
            format!("--config={}", self.subject.config),
            "receiver".to_string(),
            self.subject.connect_addr.clone(),
            self.subject.identity.clone(),
        ]
    }
}
