//! Encrypted per-server secrets.
//!
//! The vault is a single JSON file mapping server name to secret key to
//! [`EncryptedEntry`]. Every value is encrypted on its own (see [`crypto`]) under a key
//! derived from the master password, which is never stored.
//!
//! ```text
//! {
//!   "version": 1,
//!   "servers": {
//!     "github": {
//!       "GITHUB_TOKEN": { "salt": "…", "iv": "…", "data": "…" }
//!     }
//!   }
//! }
//! ```
//!
//! Reads are permissive (missing or corrupt file is an empty vault). Writes are atomic
//! and the file is kept owner-only on Unix. A server whose last secret is removed
//! disappears from the file, so no empty maps are ever persisted.
//!
//! Listing never decrypts, which is what lets callers skip the password prompt
//! entirely for servers that have no secrets.

pub mod crypto;
pub mod session;

pub use crypto::{CryptoError, EncryptedEntry};
pub use session::{MasterPasswordSession, PasswordPrompt, TerminalPrompt};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use zeroize::Zeroizing;

use crate::core::McpmError;
use crate::utils::fs::{read_json_or_default, write_private_json_file};

/// Current vault format version.
pub const VAULT_VERSION: u32 = 1;

/// On-disk vault contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultData {
    /// Format version
    pub version: u32,
    /// Server name to secret key to encrypted value
    #[serde(default)]
    pub servers: BTreeMap<String, BTreeMap<String, EncryptedEntry>>,
}

impl Default for VaultData {
    fn default() -> Self {
        Self {
            version: VAULT_VERSION,
            servers: BTreeMap::new(),
        }
    }
}

/// File-backed secrets vault.
#[derive(Debug, Clone)]
pub struct Vault {
    path: PathBuf,
    session: Arc<MasterPasswordSession>,
}

impl Vault {
    /// Default vault file name inside the MCPM home directory.
    pub const FILE_NAME: &'static str = "vault.json";

    /// Vault stored at `path`, resolving passwords through `session`.
    pub fn new(path: impl Into<PathBuf>, session: Arc<MasterPasswordSession>) -> Self {
        Self {
            path: path.into(),
            session,
        }
    }

    /// Vault file location.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Password session shared with this vault.
    #[must_use]
    pub fn session(&self) -> &MasterPasswordSession {
        &self.session
    }

    fn load(&self) -> VaultData {
        read_json_or_default(&self.path)
    }

    fn save(&self, data: &VaultData) -> Result<()> {
        write_private_json_file(&self.path, data)
            .with_context(|| format!("Failed to write vault: {}", self.path.display()))
    }

    /// Encrypt and store `value` under `server`/`key`, replacing any previous value.
    pub fn set_secret(&self, server: &str, key: &str, value: &str, password: &str) -> Result<()> {
        let entry = crypto::encrypt(value, password)
            .with_context(|| format!("Failed to encrypt secret '{key}' for '{server}'"))?;

        let mut data = self.load();
        data.servers.entry(server.to_string()).or_default().insert(key.to_string(), entry);
        self.save(&data)?;

        tracing::debug!("Stored secret '{key}' for server '{server}'");
        Ok(())
    }

    /// Decrypt one secret. `Ok(None)` when it does not exist.
    ///
    /// A wrong password is an error ([`McpmError::DecryptionFailed`]), never a
    /// silently wrong value.
    pub fn get_secret(&self, server: &str, key: &str, password: &str) -> Result<Option<String>> {
        let data = self.load();
        let Some(entry) = data.servers.get(server).and_then(|keys| keys.get(key)) else {
            return Ok(None);
        };

        crypto::decrypt(entry, password)
            .map(Some)
            .map_err(|e| anyhow::Error::from(McpmError::decryption(server, key, &e)))
    }

    /// Decrypt every secret of `server`. Any decryption failure fails the whole call.
    pub fn get_secrets_for_server(
        &self,
        server: &str,
        password: &str,
    ) -> Result<BTreeMap<String, String>> {
        let data = self.load();
        let Some(entries) = data.servers.get(server) else {
            return Ok(BTreeMap::new());
        };

        entries
            .iter()
            .map(|(key, entry)| {
                crypto::decrypt(entry, password)
                    .map(|value| (key.clone(), value))
                    .map_err(|e| anyhow::Error::from(McpmError::decryption(server, key, &e)))
            })
            .collect()
    }

    /// Delete one secret, dropping the server entirely when it was the last one.
    ///
    /// Returns `false` (and writes nothing) when the secret did not exist.
    pub fn remove_secret(&self, server: &str, key: &str) -> Result<bool> {
        let mut data = self.load();
        let Some(keys) = data.servers.get_mut(server) else {
            return Ok(false);
        };
        if keys.remove(key).is_none() {
            return Ok(false);
        }
        if keys.is_empty() {
            data.servers.remove(server);
        }

        self.save(&data)?;
        tracing::debug!("Removed secret '{key}' for server '{server}'");
        Ok(true)
    }

    /// Secret key names per server, without decrypting anything.
    ///
    /// With `server` set, only that server is returned (or nothing if it has no
    /// secrets).
    #[must_use]
    pub fn list_secrets(&self, server: Option<&str>) -> BTreeMap<String, Vec<String>> {
        self.load()
            .servers
            .into_iter()
            .filter(|(name, _)| server.is_none_or(|filter| filter == name))
            .map(|(name, keys)| (name, keys.into_keys().collect()))
            .collect()
    }

    /// Check `password` against an existing entry before encrypting new values with it.
    ///
    /// An empty vault accepts any password. This keeps every secret in the vault under
    /// one master password.
    pub fn verify_password(&self, password: &str) -> Result<()> {
        let data = self.load();
        let Some((server, key, entry)) = data
            .servers
            .iter()
            .find_map(|(server, keys)| keys.iter().next().map(|(key, entry)| (server, key, entry)))
        else {
            return Ok(());
        };

        crypto::decrypt(entry, password)
            .map(|_| ())
            .map_err(|e| anyhow::Error::from(McpmError::decryption(server, key, &e)))
    }

    /// Master password to encrypt a new secret with.
    ///
    /// When the vault is empty and nothing is cached the password is being chosen, so
    /// it is read with [`PasswordPrompt::read_new_password`] and cached. Otherwise the
    /// session password (prompting if needed) must open an existing entry; a mismatch
    /// clears the session.
    pub fn password_for_write(&self, prompt: &dyn PasswordPrompt) -> Result<Zeroizing<String>> {
        if !self.session.is_set() && self.list_secrets(None).is_empty() {
            let password = Zeroizing::new(prompt.read_new_password("New master password")?);
            self.session.set(password.as_str());
            tracing::debug!("Master password chosen for new vault");
            return Ok(password);
        }

        let password = self.session.get_or_prompt(prompt)?;
        if let Err(e) = self.verify_password(&password) {
            self.session.clear();
            return Err(e);
        }
        Ok(password)
    }

    /// Whether `server` has a secret named `key`.
    #[must_use]
    pub fn has_secret(&self, server: &str, key: &str) -> bool {
        self.load().servers.get(server).is_some_and(|keys| keys.contains_key(key))
    }

    /// Whether `server` has at least one secret.
    #[must_use]
    pub fn has_secrets(&self, server: &str) -> bool {
        !self.list_secrets(Some(server)).is_empty()
    }

    /// Decrypt `server`'s secrets, prompting for the master password only if there is
    /// something to decrypt and the session has no cached password.
    ///
    /// A wrong password clears the session so the next attempt prompts again.
    pub fn secrets_for_server_prompting(
        &self,
        server: &str,
        prompt: &dyn PasswordPrompt,
    ) -> Result<BTreeMap<String, String>> {
        if !self.has_secrets(server) {
            return Ok(BTreeMap::new());
        }

        let password = self.session.get_or_prompt(prompt)?;
        let result = self.get_secrets_for_server(server, &password);
        if result.is_err() {
            self.session.clear();
        }
        result
    }

    /// Secrets to inject when launching `server`.
    ///
    /// Non-interactive consumers must not fail because of the vault: a decryption
    /// failure is logged and yields an empty map. Cancellation still propagates.
    pub fn secrets_for_launch(
        &self,
        server: &str,
        prompt: &dyn PasswordPrompt,
    ) -> Result<BTreeMap<String, String>> {
        match self.secrets_for_server_prompting(server, prompt) {
            Ok(secrets) => Ok(secrets),
            Err(e) if matches!(e.downcast_ref::<McpmError>(), Some(McpmError::Cancelled)) => Err(e),
            Err(e) => {
                tracing::warn!("Starting '{server}' without secrets: {e:#}");
                Ok(BTreeMap::new())
            }
        }
    }
}
