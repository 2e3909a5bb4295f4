//! Common utilities for CLI commands

use anyhow::Result;
use colored::Colorize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use crate::clients::{AdapterRegistry, ClientKind};
use crate::config::GlobalConfig;
use crate::core::McpmError;
use crate::lockfile::LockfileStore;
use crate::sync::{ClientConfigs, SyncAction, SyncActionKind};
use crate::utils::platform::get_home_dir;
use crate::vault::{MasterPasswordSession, PasswordPrompt, TerminalPrompt, Vault};

/// Environment variable that supplies the master password non-interactively.
pub const PASSWORD_ENV: &str = "MCPM_MASTER_PASSWORD";

/// Everything a command needs, resolved once from the global config.
pub struct CommandContext {
    /// User home directory
    pub home: PathBuf,
    /// Loaded global configuration
    pub config: GlobalConfig,
    /// Lockfile store
    pub lockfile: LockfileStore,
    /// Secrets vault
    pub vault: Vault,
    /// Source of the master password when the session has none
    pub prompt: Arc<dyn PasswordPrompt>,
    client_overrides: BTreeMap<ClientKind, PathBuf>,
}

impl CommandContext {
    /// Load the global config and resolve every path against the home directory.
    ///
    /// When `MCPM_MASTER_PASSWORD` is set, it seeds `session` so no prompt appears.
    pub async fn load(session: Arc<MasterPasswordSession>) -> Result<Self> {
        let home = get_home_dir()?;
        let config = GlobalConfig::load().await?;

        if let Some(password) = std::env::var(PASSWORD_ENV).ok().filter(|p| !p.is_empty()) {
            tracing::debug!("Using master password from {PASSWORD_ENV}");
            session.set(password);
        }

        Self::from_parts(home, config, session, Arc::new(TerminalPrompt))
    }

    /// Build a context from already-loaded parts.
    pub fn from_parts(
        home: PathBuf,
        config: GlobalConfig,
        session: Arc<MasterPasswordSession>,
        prompt: Arc<dyn PasswordPrompt>,
    ) -> Result<Self> {
        let client_overrides = config.client_overrides(&home)?;
        let lockfile = LockfileStore::new(config.lockfile_path(&home));
        let vault = Vault::new(config.vault_path(&home), session);

        tracing::debug!(
            "Lockfile: {}, vault: {}",
            lockfile.path().display(),
            vault.path().display()
        );

        Ok(Self {
            home,
            config,
            lockfile,
            vault,
            prompt,
            client_overrides,
        })
    }

    /// Adapters for the clients installed on this machine.
    #[must_use]
    pub fn detect_clients(&self) -> AdapterRegistry {
        AdapterRegistry::detect(&self.home, &self.client_overrides)
    }
}

/// Fail with [`McpmError::ClientUnavailable`] unless `kind` was read.
pub fn require_client(configs: &ClientConfigs, kind: ClientKind) -> Result<()> {
    if configs.contains_key(&kind) {
        Ok(())
    } else {
        Err(McpmError::ClientUnavailable {
            name: kind.to_string(),
        }
        .into())
    }
}

/// Render one action as a colored status line.
#[must_use]
pub fn format_action(action: &SyncAction) -> String {
    let (marker, label) = match action.action {
        SyncActionKind::Add => ("+".green().bold(), "add".green()),
        SyncActionKind::Remove => ("-".red().bold(), "remove".red()),
        SyncActionKind::Extra => ("?".yellow().bold(), "extra".yellow()),
        SyncActionKind::Ok => ("=".dimmed(), "ok".dimmed()),
    };
    format!("  {marker} {:<7} {} -> {}", label, action.server.bold(), action.client)
}
