//! Isolated home directory for library and binary tests.
//!
//! Every client config path is overridden to `<home>/clients/<client>/config.json`,
//! so a client counts as installed only after [`TestEnvironment::install_client`]
//! creates its directory. Nothing outside the temp dir is ever touched.

use anyhow::{Context, Result};
use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

use crate::cli::CommandContext;
use crate::clients::{ClientAdapter, ClientConfig, ClientKind, JsonClientAdapter};
use crate::config::{GlobalConfig, MCPM_DIR};
use crate::lockfile::{LockFile, LockfileStore};
use crate::vault::{MasterPasswordSession, PasswordPrompt, Vault};

/// Temp home directory with MCPM config, lockfile and vault locations under it.
pub struct TestEnvironment {
    pub temp_dir: TempDir,
    pub home: PathBuf,
    pub config_path: PathBuf,
    pub lockfile_path: PathBuf,
    pub vault_path: PathBuf,
    pub config: GlobalConfig,
}

impl TestEnvironment {
    /// Create the environment and write its `config.toml`.
    pub fn new() -> Result<Self> {
        super::init_test_logging(None);

        let temp_dir = TempDir::new()?;
        let home = temp_dir.path().join("home");
        let mcpm_dir = home.join(MCPM_DIR);
        fs::create_dir_all(&mcpm_dir)?;

        let config_path = mcpm_dir.join("config.toml");
        let lockfile_path = home.join("project").join(LockfileStore::FILE_NAME);
        let vault_path = mcpm_dir.join(Vault::FILE_NAME);

        let mut config = GlobalConfig {
            lockfile: Some(lockfile_path.display().to_string()),
            vault: Some(vault_path.display().to_string()),
            ..GlobalConfig::default()
        };
        for kind in ClientKind::ALL {
            let path = home.join("clients").join(kind.as_str()).join("config.json");
            config.clients.insert(kind.as_str().to_string(), path.display().to_string());
        }
        config.save_to(&config_path)?;

        Ok(Self {
            temp_dir,
            home,
            config_path,
            lockfile_path,
            vault_path,
            config,
        })
    }

    /// Config file path for `kind` inside this environment.
    pub fn client_path(&self, kind: ClientKind) -> PathBuf {
        self.home.join("clients").join(kind.as_str()).join("config.json")
    }

    /// Make `kind` look installed by creating its config directory.
    pub fn install_client(&self, kind: ClientKind) -> Result<()> {
        let path = self.client_path(kind);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(())
    }

    /// Install `kind` and write `document` as its raw config file.
    pub fn write_client_json(&self, kind: ClientKind, document: &Value) -> Result<()> {
        self.install_client(kind)?;
        let content = serde_json::to_string_pretty(document)?;
        fs::write(self.client_path(kind), content)
            .with_context(|| format!("Failed to write {kind} config"))
    }

    /// Parse `kind`'s config file as raw JSON.
    pub fn read_client_json(&self, kind: ClientKind) -> Result<Value> {
        let content = fs::read_to_string(self.client_path(kind))
            .with_context(|| format!("Failed to read {kind} config"))?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Read `kind`'s servers the way the sync engine sees them.
    pub async fn read_client_config(&self, kind: ClientKind) -> Result<ClientConfig> {
        self.adapter(kind).read_config().await
    }

    /// Adapter bound to `kind`'s config file in this environment.
    pub fn adapter(&self, kind: ClientKind) -> JsonClientAdapter {
        JsonClientAdapter::new(kind, self.client_path(kind))
    }

    /// Store for this environment's lockfile.
    pub fn lockfile_store(&self) -> LockfileStore {
        LockfileStore::new(&self.lockfile_path)
    }

    /// Write `lockfile` to the environment's lockfile path.
    pub fn write_lockfile(&self, lockfile: &LockFile) -> Result<()> {
        self.lockfile_store().write(lockfile)
    }

    /// Vault at the environment's vault path, sharing `session`.
    pub fn vault(&self, session: Arc<MasterPasswordSession>) -> Vault {
        Vault::new(&self.vault_path, session)
    }

    /// Command context rooted at this environment's home.
    pub fn context(
        &self,
        session: Arc<MasterPasswordSession>,
        prompt: Arc<dyn PasswordPrompt>,
    ) -> Result<CommandContext> {
        CommandContext::from_parts(self.home.clone(), self.config.clone(), session, prompt)
    }
}
