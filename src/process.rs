//! Child process control for the subject pair
//!
//! Spawns the sender and receiver with pipe-connected stdin/stdout and
//! provides the blocking primitives the scenario runner is built from.
//! The controller does not police how many children exist per role; that
//! is the scenario runner's job.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::time::{timeout, Instant};

use crate::common::{Error, Result};

/// The two roles of the subject pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Sender,
    Receiver,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Sender => "sender",
            Role::Receiver => "receiver",
        }
    }

    /// Working directory for this role under the environment root.
    pub fn dir(self, env_root: &Path) -> PathBuf {
        env_root.join(self.as_str())
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One spawned child of the subject pair.
///
/// Created by [`ManagedProcess::spawn`], destroyed by [`terminate`] or
/// implicitly on drop (`kill_on_drop`), so a failed scenario never leaks
/// children into the next run.
///
/// [`terminate`]: ManagedProcess::terminate
#[derive(Debug)]
pub struct ManagedProcess {
    role: Role,
    child: Child,
    stdin: BufWriter<ChildStdin>,
    stdout: BufReader<ChildStdout>,
    alive: bool,
}

impl ManagedProcess {
    /// Spawn a role with piped stdin/stdout, creating its working directory
    /// if absent. Standard error stays inherited so subject diagnostics
    /// reach the terminal.
    ///
    /// Returns as soon as the OS process exists; callers apply their own
    /// settle interval before interacting with it.
    pub fn spawn(role: Role, cwd: &Path, program: &Path, args: &[String]) -> Result<Self> {
        std::fs::create_dir_all(cwd).map_err(|e| Error::Environment {
            path: cwd.display().to_string(),
            source: e,
        })?;

        let mut child = Command::new(program)
            .args(args)
            .current_dir(cwd)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::Spawn {
                role: role.to_string(),
                source: e,
            })?;

        let stdin = child.stdin.take().ok_or_else(|| Error::Spawn {
            role: role.to_string(),
            source: io::Error::new(io::ErrorKind::BrokenPipe, "missing stdin pipe"),
        })?;
        let stdout = child.stdout.take().ok_or_else(|| Error::Spawn {
            role: role.to_string(),
            source: io::Error::new(io::ErrorKind::BrokenPipe, "missing stdout pipe"),
        })?;

        tracing::debug!(%role, pid = ?child.id(), cwd = %cwd.display(), "spawned");

        Ok(Self {
            role,
            child,
            stdin: BufWriter::new(stdin),
            stdout: BufReader::new(stdout),
            alive: true,
        })
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// Write raw bytes to the child's stdin and flush immediately.
    ///
    /// A closed pipe means the child already exited; that surfaces as
    /// [`Error::Pipe`] and fails the current scenario.
    pub async fn send(&mut self, bytes: &[u8]) -> Result<()> {
        let res = async {
            self.stdin.write_all(bytes).await?;
            self.stdin.flush().await
        }
        .await;

        res.map_err(|e| Error::Pipe {
            role: self.role.to_string(),
            source: e,
        })
    }

    /// Read one newline-terminated line from the child's stdout, terminator
    /// included, as raw bytes.
    ///
    /// End-of-stream (the child exited without producing further output)
    /// is [`Error::StreamClosed`]; exceeding `deadline` is
    /// [`Error::ReadTimeout`], so a hung subject fails the step instead of
    /// hanging the harness.
    pub async fn read_line(&mut self, deadline: Duration) -> Result<Vec<u8>> {
        let mut line = Vec::new();
        match timeout(deadline, self.stdout.read_until(b'\n', &mut line)).await {
            Err(_) => Err(Error::ReadTimeout {
                role: self.role.to_string(),
                secs: deadline.as_secs(),
            }),
            Ok(Err(e)) => Err(Error::Pipe {
                role: self.role.to_string(),
                source: e,
            }),
            Ok(Ok(0)) => Err(Error::StreamClosed {
                role: self.role.to_string(),
            }),
            Ok(Ok(_)) => Ok(line),
        }
    }

    /// Wait out a settle interval in short slices, checking between slices
    /// that the child has not exited. A child that dies while settling is
    /// reported here rather than as a broken pipe two steps later.
    pub async fn settle(&mut self, interval: Duration) -> Result<()> {
        let deadline = Instant::now() + interval;
        let mut step = Duration::from_millis(10);

        loop {
            if let Ok(Some(_)) = self.child.try_wait() {
                self.alive = false;
                return Err(Error::StreamClosed {
                    role: self.role.to_string(),
                });
            }
            let now = Instant::now();
            if now >= deadline {
                return Ok(());
            }
            tokio::time::sleep(step.min(deadline - now)).await;
            step = (step * 2).min(Duration::from_millis(200));
        }
    }

    /// Kill the child and reap it. Safe to call more than once.
    pub async fn terminate(&mut self) {
        if !self.alive {
            return;
        }
        // start_kill is best-effort; the child may have exited on its own
        let _ = self.child.start_kill();
        let _ = self.child.wait().await;
        self.alive = false;
        tracing::debug!(role = %self.role, "terminated");
    }
}

/// Plain settle wait for points not tied to a live child.
pub async fn pause(interval: Duration) {
    tokio::time::sleep(interval).await;
}
