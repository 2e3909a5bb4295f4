//! Global configuration for MCPM.
//!
//! The user-wide configuration file (`~/.mcpm/config.toml`) tells MCPM where its own
//! files live and where to find client configs installed in non-standard locations.
//! Every field is optional; a missing file means defaults everywhere.
//!
//! # File Format
//!
//! ```toml
//! # Lockfile to sync from (default: ./mcpm.lock)
//! lockfile = "~/work/mcpm.lock"
//!
//! # Encrypted secrets store (default: ~/.mcpm/vault.json)
//! vault = "~/.mcpm/vault.json"
//!
//! # Per-client config path overrides
//! [clients]
//! cursor = "~/custom/cursor/mcp.json"
//! zed = "/opt/zed/settings.json"
//! ```
//!
//! Paths may start with `~/`, which expands to the home directory.
//!
//! # Location
//!
//! `~/.mcpm/config.toml`, or the path in the `MCPM_CONFIG` environment variable. The
//! `--config` command-line flag sets that variable for the process.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::clients::ClientKind;
use crate::core::McpmError;
use crate::lockfile::LockfileStore;
use crate::utils::fs::write_toml_file;
use crate::utils::platform::{expand_home, get_home_dir};
use crate::vault::Vault;

/// Environment variable overriding the config file location.
pub const CONFIG_ENV: &str = "MCPM_CONFIG";

/// Name of the per-user MCPM directory under the home directory.
pub const MCPM_DIR: &str = ".mcpm";

/// User-wide MCPM settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalConfig {
    /// Lockfile location. Defaults to `mcpm.lock` in the working directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lockfile: Option<String>,

    /// Vault location. Defaults to `~/.mcpm/vault.json`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vault: Option<String>,

    /// Client identifier to config path, for clients installed in unusual places.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub clients: BTreeMap<String, String>,
}

impl GlobalConfig {
    /// Load from `MCPM_CONFIG` or the default location. A missing file gives defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined, or the file exists
    /// but cannot be read or parsed.
    pub async fn load() -> Result<Self> {
        let path = Self::config_path()?;
        Self::load_optional(&path).await
    }

    /// Load from `path`, returning defaults when it does not exist.
    pub async fn load_optional(path: &Path) -> Result<Self> {
        if fs::try_exists(path).await.unwrap_or(false) {
            Self::load_from(path).await
        } else {
            tracing::debug!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Load from a specific file, failing if it is missing or malformed.
    pub async fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        toml::from_str(&content).map_err(|e| {
            McpmError::ConfigError {
                message: format!("{}: {}", path.display(), e.message()),
            }
            .into()
        })
    }

    /// Write the config to `path` atomically, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        write_toml_file(path, self)
    }

    /// Config file location: `MCPM_CONFIG` if set, else `~/.mcpm/config.toml`.
    pub fn config_path() -> Result<PathBuf> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) if !path.is_empty() => Ok(PathBuf::from(path)),
            _ => Ok(Self::mcpm_dir(&get_home_dir()?).join("config.toml")),
        }
    }

    /// `~/.mcpm` for the given home directory.
    #[must_use]
    pub fn mcpm_dir(home: &Path) -> PathBuf {
        home.join(MCPM_DIR)
    }

    /// Resolved lockfile path.
    #[must_use]
    pub fn lockfile_path(&self, home: &Path) -> PathBuf {
        self.lockfile
            .as_deref()
            .map_or_else(|| PathBuf::from(LockfileStore::FILE_NAME), |p| expand_home(p, home))
    }

    /// Resolved vault path.
    #[must_use]
    pub fn vault_path(&self, home: &Path) -> PathBuf {
        self.vault
            .as_deref()
            .map_or_else(|| Self::mcpm_dir(home).join(Vault::FILE_NAME), |p| expand_home(p, home))
    }

    /// Client config path overrides with `~/` expanded.
    ///
    /// # Errors
    ///
    /// Fails with [`crate::core::McpmError::UnknownClient`] when a key in `[clients]`
    /// is not a known client identifier.
    pub fn client_overrides(&self, home: &Path) -> Result<BTreeMap<ClientKind, PathBuf>> {
        self.clients
            .iter()
            .map(|(name, path)| {
                let kind: ClientKind =
                    name.parse().context("Invalid [clients] entry in config")?;
                Ok::<_, anyhow::Error>((kind, expand_home(path, home)))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_file_gives_defaults() {
        let temp = TempDir::new().unwrap();
        let config = GlobalConfig::load_optional(&temp.path().join("config.toml")).await.unwrap();
        assert_eq!(config, GlobalConfig::default());
    }

    #[tokio::test]
    async fn test_parse_full_config() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
lockfile = "~/work/mcpm.lock"
vault = "/secure/vault.json"

[clients]
cursor = "~/custom/mcp.json"
"#,
        )
        .unwrap();

        let config = GlobalConfig::load_from(&path).await.unwrap();
        let home = Path::new("/home/dev");

        assert_eq!(config.lockfile_path(home), PathBuf::from("/home/dev/work/mcpm.lock"));
        assert_eq!(config.vault_path(home), PathBuf::from("/secure/vault.json"));
        assert_eq!(
            config.client_overrides(home).unwrap(),
            BTreeMap::from([(ClientKind::Cursor, PathBuf::from("/home/dev/custom/mcp.json"))])
        );
    }

    #[tokio::test]
    async fn test_malformed_file_is_an_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "lockfile = [").unwrap();

        let err = GlobalConfig::load_optional(&path).await.unwrap_err();
        assert!(matches!(err.downcast_ref::<McpmError>(), Some(McpmError::ConfigError { .. })));
    }

    #[test]
    fn test_default_paths() {
        let home = Path::new("/home/dev");
        let config = GlobalConfig::default();

        assert_eq!(config.lockfile_path(home), PathBuf::from("mcpm.lock"));
        assert_eq!(config.vault_path(home), PathBuf::from("/home/dev/.mcpm/vault.json"));
        assert!(config.client_overrides(home).unwrap().is_empty());
    }

    #[test]
    fn test_unknown_client_override() {
        let config = GlobalConfig {
            clients: BTreeMap::from([("notepad".to_string(), "/x".to_string())]),
            ..GlobalConfig::default()
        };

        let err = config.client_overrides(Path::new("/h")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<McpmError>(),
            Some(McpmError::UnknownClient { name }) if name == "notepad"
        ));
    }

    #[tokio::test]
    async fn test_save_and_reload() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("config.toml");
        let config = GlobalConfig {
            lockfile: Some("~/mcpm.lock".to_string()),
            vault: None,
            clients: BTreeMap::from([("zed".to_string(), "/z.json".to_string())]),
        };

        config.save_to(&path).unwrap();

        assert_eq!(GlobalConfig::load_from(&path).await.unwrap(), config);
        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(!raw.contains("vault"));
    }

    #[test]
    #[serial]
    fn test_config_path_env_override() {
        let temp = TempDir::new().unwrap();
        let custom = temp.path().join("custom.toml");

        // SAFETY: serialized with every other test touching MCPM_CONFIG
        unsafe { std::env::set_var(CONFIG_ENV, &custom) };
        let resolved = GlobalConfig::config_path().unwrap();
        unsafe { std::env::remove_var(CONFIG_ENV) };

        assert_eq!(resolved, custom);
    }
}
