//! Atomic file write operations using temp-and-rename strategy.
//!
//! Every persistent file MCPM owns (lockfile, vault, client configs) goes through
//! [`atomic_write`], so a reader either sees the old content or the new content,
//! never a partial write. There is no atomicity across files.

use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use super::dirs::ensure_parent_dir;

/// Owner read/write only.
#[cfg(unix)]
pub const PRIVATE_FILE_MODE: u32 = 0o600;

/// Atomically writes bytes to a file using a write-then-rename strategy.
///
/// 1. Writes content to a sibling temporary file (`<name>.tmp`)
/// 2. Syncs the temporary file to disk
/// 3. Renames the temporary file over the target path
///
/// Parent directories are created when missing. Failing to create them, or failing
/// the rename, is returned as an error: both mean the environment is broken.
pub fn atomic_write(path: &Path, content: &[u8]) -> Result<()> {
    write_with_mode(path, content, None)
}

/// Atomically writes bytes and restricts the result to the owner (mode `0600`).
///
/// The mode is applied to the temporary file before content is written and again
/// after the rename, since a rename onto an existing path can leave the target
/// with default permissions on some filesystems. On non-Unix platforms this is
/// a plain [`atomic_write`].
pub fn atomic_write_private(path: &Path, content: &[u8]) -> Result<()> {
    #[cfg(unix)]
    {
        write_with_mode(path, content, Some(PRIVATE_FILE_MODE))
    }
    #[cfg(not(unix))]
    {
        write_with_mode(path, content, None)
    }
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(std::ffi::OsStr::to_os_string)
        .unwrap_or_else(|| "mcpm".into());
    name.push(".tmp");
    path.with_file_name(name)
}

fn write_with_mode(path: &Path, content: &[u8], mode: Option<u32>) -> Result<()> {
    ensure_parent_dir(path)?;

    let temp_path = temp_path_for(path);

    {
        let mut file = fs::File::create(&temp_path)
            .with_context(|| format!("Failed to create temp file: {}", temp_path.display()))?;

        if let Some(mode) = mode {
            set_mode(&temp_path, mode)?;
        }

        file.write_all(content)
            .with_context(|| format!("Failed to write to temp file: {}", temp_path.display()))?;

        file.sync_all().with_context(|| "Failed to sync file to disk")?;
    }

    fs::rename(&temp_path, path)
        .with_context(|| format!("Failed to rename temp file to: {}", path.display()))?;

    if let Some(mode) = mode {
        set_mode(path, mode)?;
    }

    tracing::trace!(target: "fs", "Wrote {} bytes to {}", content.len(), path.display());
    Ok(())
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(mode))
        .with_context(|| format!("Failed to set permissions on: {}", path.display()))
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> Result<()> {
    Ok(())
}
