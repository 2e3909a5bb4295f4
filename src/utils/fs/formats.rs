//! Reading and writing structured data files.
//!
//! JSON output is always pretty-printed with a trailing newline so files under
//! version control produce minimal diffs. All writes are atomic.

use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

use super::atomic::{atomic_write, atomic_write_private};

/// Reads a JSON file, degrading to `T::default()` when it is absent, empty or unparsable.
///
/// Corruption is logged at `warn` so a broken file is visible without making first run
/// and recovery behave differently from a fresh install.
pub fn read_json_or_default<T>(path: &Path) -> T
where
    T: DeserializeOwned + Default,
{
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return T::default(),
        Err(e) => {
            tracing::warn!("Cannot read {}: {e}; using empty defaults", path.display());
            return T::default();
        }
    };

    if content.trim().is_empty() {
        return T::default();
    }

    serde_json::from_str(&content).unwrap_or_else(|e| {
        tracing::warn!("Ignoring unparsable {}: {e}", path.display());
        T::default()
    })
}

/// Serializes `data` as pretty JSON terminated by a newline.
pub fn to_json_pretty<T>(data: &T) -> Result<String>
where
    T: Serialize + ?Sized,
{
    let mut json = serde_json::to_string_pretty(data).context("Failed to serialize JSON")?;
    json.push('\n');
    Ok(json)
}

/// Writes data as pretty JSON to a file atomically.
pub fn write_json_file<T>(path: &Path, data: &T) -> Result<()>
where
    T: Serialize + ?Sized,
{
    let json = to_json_pretty(data)?;
    atomic_write(path, json.as_bytes())
        .with_context(|| format!("Failed to write JSON file: {}", path.display()))
}

/// Writes data as pretty JSON atomically with owner-only permissions.
pub fn write_private_json_file<T>(path: &Path, data: &T) -> Result<()>
where
    T: Serialize + ?Sized,
{
    let json = to_json_pretty(data)?;
    atomic_write_private(path, json.as_bytes())
        .with_context(|| format!("Failed to write private JSON file: {}", path.display()))
}

/// Writes data as TOML to a file atomically.
pub fn write_toml_file<T>(path: &Path, data: &T) -> Result<()>
where
    T: Serialize,
{
    let content = toml::to_string_pretty(data).context("Failed to serialize TOML")?;
    atomic_write(path, content.as_bytes())
        .with_context(|| format!("Failed to write TOML file: {}", path.display()))
}
