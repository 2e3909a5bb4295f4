//! Lockfile persistence.
//!
//! [`LockfileStore`] owns the lockfile path. Reads never fail: a missing, empty or
//! corrupt file yields an empty lockfile so first run and recovery from corruption
//! look identical to a fresh install. Writes are atomic and fail loudly.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use super::{LockEntry, LockFile};
use crate::core::McpmError;
use crate::utils::fs::{atomic_write, read_json_or_default};

/// File-backed lockfile.
#[derive(Debug, Clone)]
pub struct LockfileStore {
    path: PathBuf,
}

impl LockfileStore {
    /// Default lockfile name.
    pub const FILE_NAME: &'static str = "mcpm.lock";

    /// Store for the lockfile at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
        }
    }

    /// Lockfile location.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the lockfile, or an empty one if it is absent or unparsable.
    #[must_use]
    pub fn read(&self) -> LockFile {
        let lockfile: LockFile = read_json_or_default(&self.path);
        if lockfile.lockfile_version > LockFile::CURRENT_VERSION {
            tracing::warn!(
                "Lockfile {} has version {} (newer than supported {}); fields may be lost on write",
                self.path.display(),
                lockfile.lockfile_version,
                LockFile::CURRENT_VERSION
            );
        }
        lockfile
    }

    /// Atomically replace the lockfile with `lockfile`.
    pub fn write(&self, lockfile: &LockFile) -> Result<()> {
        let content = lockfile.to_json_string()?;
        atomic_write(&self.path, content.as_bytes())
            .with_context(|| format!("Failed to write lockfile: {}", self.path.display()))?;
        tracing::debug!("Wrote {} servers to {}", lockfile.servers.len(), self.path.display());
        Ok(())
    }

    /// Insert or replace one server and write the result.
    pub fn add_entry(&self, name: &str, entry: LockEntry) -> Result<()> {
        let mut lockfile = self.read();
        lockfile.insert(name, entry);
        self.write(&lockfile)
    }

    /// Remove one server and write the result.
    ///
    /// Removing a server that is not recorded is a no-op: nothing is written and
    /// `Ok(false)` is returned.
    pub fn remove_entry(&self, name: &str) -> Result<bool> {
        let mut lockfile = self.read();
        if !lockfile.remove(name) {
            return Ok(false);
        }
        self.write(&lockfile)?;
        Ok(true)
    }

    /// Look up one server, failing with [`McpmError::ServerNotFound`] when absent.
    pub fn get_entry(&self, name: &str) -> Result<LockEntry> {
        self.read().servers.remove(name).ok_or_else(|| {
            McpmError::ServerNotFound {
                name: name.to_string(),
            }
            .into()
        })
    }
}
