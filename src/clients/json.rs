//! JSON-file client adapter.
//!
//! Covers every client that keeps its MCP servers in a JSON document under a single
//! key (`mcpServers`, `servers` or `context_servers`). Top-level keys unrelated to
//! MCP are preserved on write, and so are server entries MCPM cannot represent
//! (remote servers with a `url` instead of a `command`).

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

use super::{AdapterFuture, ClientAdapter, ClientConfig, ClientKind, ServerEntry};
use crate::utils::fs::write_json_file;

/// Adapter for a JSON configuration file.
#[derive(Debug, Clone)]
pub struct JsonClientAdapter {
    kind: ClientKind,
    path: PathBuf,
    servers_key: &'static str,
    install_dir: Option<PathBuf>,
}

impl JsonClientAdapter {
    /// Adapter for `kind` reading `path`, using the client's standard servers key.
    pub fn new(kind: ClientKind, path: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            path: path.into(),
            servers_key: kind.servers_key(),
            install_dir: None,
        }
    }

    /// Treat the client as installed when `dir` exists, instead of the config file's
    /// parent directory.
    #[must_use]
    pub fn with_install_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.install_dir = Some(dir.into());
        self
    }

    async fn load_document(&self) -> Result<Map<String, Value>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Failed to read {} config: {}", self.kind, self.path.display())
                });
            }
        };

        if content.trim().is_empty() {
            return Ok(Map::new());
        }

        match serde_json::from_str::<Value>(&content).with_context(|| {
            format!("Failed to parse {} config: {}", self.kind, self.path.display())
        })? {
            Value::Object(map) => Ok(map),
            _ => Err(anyhow::anyhow!(
                "{} config is not a JSON object: {}",
                self.kind,
                self.path.display()
            )),
        }
    }

    fn save_document(&self, document: &Map<String, Value>) -> Result<()> {
        write_json_file(&self.path, document)
            .with_context(|| format!("Failed to write {} config", self.kind))
    }

    fn servers_mut<'d>(
        &self,
        document: &'d mut Map<String, Value>,
    ) -> Result<&'d mut Map<String, Value>> {
        let servers = document.entry(self.servers_key).or_insert_with(|| Value::Object(Map::new()));
        servers.as_object_mut().ok_or_else(|| {
            anyhow::anyhow!(
                "'{}' in {} is not a JSON object",
                self.servers_key,
                self.path.display()
            )
        })
    }

    fn parse_servers(&self, document: &Map<String, Value>) -> ClientConfig {
        let mut config = ClientConfig::default();
        let Some(Value::Object(servers)) = document.get(self.servers_key) else {
            return config;
        };

        for (name, raw) in servers {
            match serde_json::from_value::<ServerEntry>(raw.clone()) {
                Ok(entry) => {
                    config.servers.insert(name.clone(), entry);
                }
                Err(e) => {
                    tracing::debug!("{} server '{name}' is not command-based: {e}", self.kind);
                    config.unmanaged.insert(name.clone());
                }
            }
        }
        config
    }

    async fn load_config(&self) -> Result<ClientConfig> {
        let document = self.load_document().await?;
        Ok(self.parse_servers(&document))
    }

    async fn write_servers(&self, config: &ClientConfig) -> Result<()> {
        let mut document = self.load_document().await?;
        let servers = self.servers_mut(&mut document)?;

        // Keep entries a ClientConfig cannot express
        servers.retain(|_, raw| serde_json::from_value::<ServerEntry>(raw.clone()).is_err());
        for (name, entry) in &config.servers {
            servers.insert(name.clone(), serde_json::to_value(entry)?);
        }

        self.save_document(&document)
    }

    async fn insert_server(&self, name: &str, entry: ServerEntry) -> Result<()> {
        let mut document = self.load_document().await?;
        let value = serde_json::to_value(&entry)?;
        let servers = self.servers_mut(&mut document)?;
        let unmanaged = servers
            .get(name)
            .is_some_and(|existing| serde_json::from_value::<ServerEntry>(existing.clone()).is_err());
        if unmanaged {
            anyhow::bail!(
                "'{name}' in {} is not a command-based server; leaving it unchanged",
                self.kind
            );
        }
        servers.insert(name.to_string(), value);
        self.save_document(&document)?;
        tracing::debug!("Added '{name}' to {}", self.kind);
        Ok(())
    }

    async fn delete_server(&self, name: &str) -> Result<bool> {
        let mut document = self.load_document().await?;
        let removed = self.servers_mut(&mut document)?.remove(name).is_some();
        if removed {
            self.save_document(&document)?;
            tracing::debug!("Removed '{name}' from {}", self.kind);
        }
        Ok(removed)
    }
}

impl ClientAdapter for JsonClientAdapter {
    fn kind(&self) -> ClientKind {
        self.kind
    }

    fn is_installed(&self) -> bool {
        if self.path.exists() {
            return true;
        }
        match &self.install_dir {
            Some(dir) => dir.is_dir(),
            None => self.path.parent().is_some_and(Path::is_dir),
        }
    }

    fn config_path(&self) -> &Path {
        &self.path
    }

    fn read_config(&self) -> AdapterFuture<'_, ClientConfig> {
        Box::pin(self.load_config())
    }

    fn write_config<'a>(&'a self, config: &'a ClientConfig) -> AdapterFuture<'a, ()> {
        Box::pin(self.write_servers(config))
    }

    fn add_server<'a>(&'a self, name: &'a str, entry: ServerEntry) -> AdapterFuture<'a, ()> {
        Box::pin(self.insert_server(name, entry))
    }

    fn remove_server<'a>(&'a self, name: &'a str) -> AdapterFuture<'a, bool> {
        Box::pin(self.delete_server(name))
    }
}
