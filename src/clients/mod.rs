//! AI client configuration adapters.
//!
//! Every AI client (Claude Desktop, Cursor, VS Code, ...) keeps its own list of MCP
//! servers in its own file. The reconciliation engine never looks at those files
//! directly: it talks to a [`ClientAdapter`], which exposes one client's server list
//! as a [`ClientConfig`]. Concrete per-client formats live behind that trait
//! ([`JsonClientAdapter`] covers every client MCPM ships with).
//!
//! Adapters are collected in an [`AdapterRegistry`] keyed by [`ClientKind`].

mod json;

pub use json::JsonClientAdapter;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::str::FromStr;

use crate::core::McpmError;
use crate::utils::platform::app_config_dir;

/// The closed set of AI clients MCPM can manage.
///
/// Ordering follows declaration order and is what every deterministic iteration
/// over clients (diff output, registries) uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClientKind {
    /// Claude Desktop app
    ClaudeDesktop,
    /// Claude Code CLI
    ClaudeCode,
    /// Cursor editor
    Cursor,
    /// Visual Studio Code
    Vscode,
    /// Windsurf editor
    Windsurf,
    /// Zed editor
    Zed,
}

impl ClientKind {
    /// All client kinds in canonical order.
    pub const ALL: [Self; 6] = [
        Self::ClaudeDesktop,
        Self::ClaudeCode,
        Self::Cursor,
        Self::Vscode,
        Self::Windsurf,
        Self::Zed,
    ];

    /// Stable identifier used in the lockfile and on the command line.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ClaudeDesktop => "claude-desktop",
            Self::ClaudeCode => "claude-code",
            Self::Cursor => "cursor",
            Self::Vscode => "vscode",
            Self::Windsurf => "windsurf",
            Self::Zed => "zed",
        }
    }

    /// JSON key under which this client stores its server map.
    #[must_use]
    pub const fn servers_key(self) -> &'static str {
        match self {
            Self::Vscode => "servers",
            Self::Zed => "context_servers",
            _ => "mcpServers",
        }
    }

    /// Default configuration file location for this client.
    #[must_use]
    pub fn default_config_path(self, home: &Path) -> PathBuf {
        match self {
            Self::ClaudeDesktop => {
                app_config_dir(home).join("Claude").join("claude_desktop_config.json")
            }
            Self::ClaudeCode => home.join(".claude.json"),
            Self::Cursor => home.join(".cursor").join("mcp.json"),
            Self::Vscode => app_config_dir(home).join("Code").join("User").join("mcp.json"),
            Self::Windsurf => home.join(".codeium").join("windsurf").join("mcp_config.json"),
            Self::Zed => home.join(".config").join("zed").join("settings.json"),
        }
    }

    /// Directory whose presence means the client is installed, when that is not the
    /// directory holding [`Self::default_config_path`].
    ///
    /// Claude Code keeps its config directly in the home directory, which always exists.
    #[must_use]
    pub fn install_dir(self, home: &Path) -> Option<PathBuf> {
        match self {
            Self::ClaudeCode => Some(home.join(".claude")),
            _ => None,
        }
    }
}

impl fmt::Display for ClientKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClientKind {
    type Err = McpmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|kind| kind.as_str() == normalized).ok_or_else(|| {
            McpmError::UnknownClient {
                name: s.to_string(),
            }
        })
    }
}

/// One server as a client sees it.
///
/// `args` and `env` stay optional: some clients treat an absent field
/// differently from an empty one, so absence is preserved through round trips.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerEntry {
    /// Executable used to launch the server
    pub command: String,

    /// Launch arguments
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<Vec<String>>,

    /// Environment variables passed to the server
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env: Option<BTreeMap<String, String>>,
}

impl ServerEntry {
    /// Entry with only a command.
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            args: None,
            env: None,
        }
    }

    /// Set the argument list.
    #[must_use]
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = Some(args.into_iter().map(Into::into).collect());
        self
    }

    /// Set one environment variable.
    #[must_use]
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.get_or_insert_with(BTreeMap::new).insert(key.into(), value.into());
        self
    }

    /// Arguments, treating an absent list as empty.
    #[must_use]
    pub fn args_or_empty(&self) -> &[String] {
        self.args.as_deref().unwrap_or(&[])
    }
}

/// A client's full server list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Server name to entry
    pub servers: BTreeMap<String, ServerEntry>,

    /// Servers the client lists in a shape MCPM cannot represent, such as remote
    /// servers with a `url` instead of a `command`. They count as present but are
    /// never rewritten.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub unmanaged: BTreeSet<String>,
}

impl ClientConfig {
    /// Whether the client lists `name`, in any shape.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.servers.contains_key(name) || self.unmanaged.contains(name)
    }

    /// Whether the client lists `name` in a shape MCPM cannot represent.
    #[must_use]
    pub fn is_unmanaged(&self, name: &str) -> bool {
        self.unmanaged.contains(name)
    }

    /// Every server name the client lists, sorted.
    #[must_use]
    pub fn names(&self) -> BTreeSet<&str> {
        self.servers.keys().chain(&self.unmanaged).map(String::as_str).collect()
    }
}

/// Boxed future returned by adapter I/O methods so adapters stay object safe.
pub type AdapterFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// Capability interface for one client's configuration store.
///
/// The diff engine and the sync executor depend on this trait only. Reads may fail
/// (the file is malformed, permissions are wrong); callers tolerate that and skip
/// the client.
pub trait ClientAdapter: Send + Sync {
    /// Which client this adapter manages.
    fn kind(&self) -> ClientKind;

    /// Whether the client appears to be installed on this machine.
    fn is_installed(&self) -> bool;

    /// Path of the configuration file this adapter reads and writes.
    fn config_path(&self) -> &Path;

    /// Read the client's server list.
    fn read_config(&self) -> AdapterFuture<'_, ClientConfig>;

    /// Replace the client's server list.
    fn write_config<'a>(&'a self, config: &'a ClientConfig) -> AdapterFuture<'a, ()>;

    /// Add or replace one server.
    fn add_server<'a>(&'a self, name: &'a str, entry: ServerEntry) -> AdapterFuture<'a, ()>;

    /// Remove one server. Resolves to `false` when it was not present.
    fn remove_server<'a>(&'a self, name: &'a str) -> AdapterFuture<'a, bool>;
}

/// Adapters keyed by client kind.
#[derive(Default)]
pub struct AdapterRegistry {
    adapters: BTreeMap<ClientKind, Box<dyn ClientAdapter>>,
}

impl AdapterRegistry {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with a [`JsonClientAdapter`] for every known client, installed or not.
    ///
    /// `overrides` replaces the default config path for specific clients.
    #[must_use]
    pub fn all_known(home: &Path, overrides: &BTreeMap<ClientKind, PathBuf>) -> Self {
        let mut registry = Self::new();
        for kind in ClientKind::ALL {
            let adapter = match overrides.get(&kind) {
                Some(path) => JsonClientAdapter::new(kind, path.clone()),
                None => {
                    let adapter = JsonClientAdapter::new(kind, kind.default_config_path(home));
                    match kind.install_dir(home) {
                        Some(dir) => adapter.with_install_dir(dir),
                        None => adapter,
                    }
                }
            };
            registry.insert(Box::new(adapter));
        }
        registry
    }

    /// Like [`Self::all_known`] but keeps only clients that appear to be installed.
    #[must_use]
    pub fn detect(home: &Path, overrides: &BTreeMap<ClientKind, PathBuf>) -> Self {
        let mut registry = Self::all_known(home, overrides);
        registry.adapters.retain(|kind, adapter| {
            let installed = adapter.is_installed();
            tracing::debug!("Client {kind} installed: {installed}");
            installed
        });
        registry
    }

    /// Register an adapter, replacing any existing one for the same kind.
    pub fn insert(&mut self, adapter: Box<dyn ClientAdapter>) {
        self.adapters.insert(adapter.kind(), adapter);
    }

    /// Adapter for `kind`, if registered.
    #[must_use]
    pub fn get(&self, kind: ClientKind) -> Option<&dyn ClientAdapter> {
        self.adapters.get(&kind).map(AsRef::as_ref)
    }

    /// Registered kinds in canonical order.
    pub fn kinds(&self) -> impl Iterator<Item = ClientKind> + '_ {
        self.adapters.keys().copied()
    }

    /// Registered adapters in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = &dyn ClientAdapter> + '_ {
        self.adapters.values().map(AsRef::as_ref)
    }

    /// Number of registered adapters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    /// Whether no adapters are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}
