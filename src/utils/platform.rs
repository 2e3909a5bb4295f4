//! Platform helpers: home directory lookup and `~/` expansion.

use anyhow::Result;
use std::path::{Path, PathBuf};

/// Returns true when compiled for Windows.
#[must_use]
pub const fn is_windows() -> bool {
    cfg!(windows)
}

/// Returns true when compiled for macOS.
#[must_use]
pub const fn is_macos() -> bool {
    cfg!(target_os = "macos")
}

/// Returns the current user's home directory.
pub fn get_home_dir() -> Result<PathBuf> {
    dirs::home_dir().ok_or_else(|| {
        let platform_help = if is_windows() {
            "On Windows: Check that the USERPROFILE environment variable is set"
        } else {
            "On Unix/Linux: Check that the HOME environment variable is set"
        };
        anyhow::anyhow!("Could not determine home directory.\n\n{platform_help}")
    })
}

/// Expands a leading `~/` against `home`. Other paths are returned unchanged.
#[must_use]
pub fn expand_home(path: &str, home: &Path) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(stripped) => home.join(stripped),
        None if path == "~" => home.to_path_buf(),
        None => PathBuf::from(path),
    }
}

/// Directory holding per-user application config on this platform.
///
/// `~/Library/Application Support` on macOS, `%APPDATA%` on Windows and
/// `$XDG_CONFIG_HOME` (or `~/.config`) elsewhere.
#[must_use]
pub fn app_config_dir(home: &Path) -> PathBuf {
    if is_macos() {
        home.join("Library").join("Application Support")
    } else if is_windows() {
        dirs::config_dir().unwrap_or_else(|| home.join("AppData").join("Roaming"))
    } else {
        std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .filter(|p| p.is_absolute())
            .unwrap_or_else(|| home.join(".config"))
    }
}
