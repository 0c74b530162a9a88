//! Environment directory management
//!
//! Scenario runs must never observe state (identities, key material, replay
//! caches) left behind by a previous run, so the per-role working
//! directories are removed before every run. Recreation is deferred to
//! process spawn, which creates its cwd if absent.

use std::path::PathBuf;

use crate::common::{Error, Result};

/// Remove every given directory tree.
///
/// Missing directories are fine (reset is idempotent); any removal failure
/// aborts the whole run.
pub fn reset(dirs: &[PathBuf]) -> Result<()> {
    for dir in dirs {
        if dir.exists() {
            std::fs::remove_dir_all(dir).map_err(|e| Error::Environment {
                path: dir.display().to_string(),
                source: e,
            })?;
            tracing::debug!(dir = %dir.display(), "environment directory cleared");
        }
    }
    Ok(())
}
