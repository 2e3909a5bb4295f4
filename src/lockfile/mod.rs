//! Lockfile: the version-controllable record of installed MCP servers.
//!
//! The lockfile (`mcpm.lock`) is the single source of truth for which servers are
//! installed and which clients each one should be registered with. It is JSON,
//! pretty-printed with a trailing newline, and its `servers` map is always
//! serialized in lexicographic key order so that writing the same logical content
//! twice produces byte-identical files.
//!
//! ```json
//! {
//!   "lockfileVersion": 1,
//!   "servers": {
//!     "filesystem": {
//!       "version": "0.6.2",
//!       "source": "npm",
//!       "resolved": "https://registry.npmjs.org/@modelcontextprotocol/server-filesystem/-/server-filesystem-0.6.2.tgz",
//!       "integrity": "sha256:4f2a...",
//!       "runtime": "node",
//!       "command": "npx",
//!       "args": ["-y", "@modelcontextprotocol/server-filesystem"],
//!       "envVars": [],
//!       "installedAt": "2026-01-01T00:00:00+00:00",
//!       "clients": ["claude-desktop", "cursor"]
//!     }
//!   }
//! }
//! ```
//!
//! `clients` records intent, not observation: a server listed for Cursor that is
//! missing from Cursor's config is exactly what `mcpm sync` repairs.
//!
//! Reading is permissive (missing or corrupt ⇒ empty lockfile); writing is atomic.
//! See [`LockfileStore`]. Entries are parsed one at a time: an entry this version
//! cannot understand (an unknown source or runtime, say) is carried through verbatim
//! instead of taking the rest of the file down with it, and unknown client ids are
//! dropped from `clients` with a warning.

mod checksum;
mod io;

pub use checksum::compute_integrity;
pub use io::LockfileStore;

use anyhow::Result;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

use crate::clients::ClientKind;
use crate::utils::fs::to_json_pretty;

/// Version sentinel for servers whose version could not be determined.
pub const VERSION_UNKNOWN: &str = "unknown";

/// Version sentinel for servers installed from a local directory.
pub const VERSION_LOCAL: &str = "local";

/// Where a server was installed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Public package registry (npm)
    Npm,
    /// Alternate package registry (PyPI)
    Pypi,
    /// Source repository (GitHub)
    Github,
    /// Local directory
    Local,
}

impl SourceKind {
    /// Lowercase identifier as stored in the lockfile.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Npm => "npm",
            Self::Pypi => "pypi",
            Self::Github => "github",
            Self::Local => "local",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Runtime used to launch a server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeKind {
    /// Node.js
    Node,
    /// Python
    Python,
    /// Native executable
    Binary,
    /// Container image
    Docker,
}

impl fmt::Display for RuntimeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Node => "node",
            Self::Python => "python",
            Self::Binary => "binary",
            Self::Docker => "docker",
        })
    }
}

/// One installed server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockEntry {
    /// Semantic version, or [`VERSION_UNKNOWN`] / [`VERSION_LOCAL`]
    pub version: String,

    /// Installation source
    pub source: SourceKind,

    /// Resolved locator (tarball URL, repository URL, directory path)
    pub resolved: String,

    /// Integrity digest of the resolved artifact
    #[serde(default)]
    pub integrity: String,

    /// Runtime used to launch the server
    pub runtime: RuntimeKind,

    /// Launch command
    pub command: String,

    /// Launch arguments, in order
    #[serde(default)]
    pub args: Vec<String>,

    /// Names of environment variables the server needs. Never values.
    #[serde(default)]
    pub env_vars: Vec<String>,

    /// RFC 3339 install timestamp
    pub installed_at: String,

    /// Clients this server should be registered with
    #[serde(default, deserialize_with = "deserialize_clients")]
    pub clients: Vec<ClientKind>,
}

impl LockEntry {
    /// Entry for a server launched with `command`, installed now.
    ///
    /// Defaults to an npm/node server with unknown version and no clients.
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            version: VERSION_UNKNOWN.to_string(),
            source: SourceKind::Npm,
            resolved: String::new(),
            integrity: String::new(),
            runtime: RuntimeKind::Node,
            command: command.into(),
            args: Vec::new(),
            env_vars: Vec::new(),
            installed_at: chrono::Utc::now().to_rfc3339(),
            clients: Vec::new(),
        }
    }

    /// Set the launch arguments.
    #[must_use]
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Set the required environment variable names.
    #[must_use]
    pub fn with_env_vars<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.env_vars = names.into_iter().map(Into::into).collect();
        self
    }

    /// Set the target clients.
    #[must_use]
    pub fn with_clients(mut self, clients: impl IntoIterator<Item = ClientKind>) -> Self {
        self.clients = Vec::new();
        for client in clients {
            self.register_client(client);
        }
        self
    }

    /// Add `client` to the target set. Returns false if it was already there.
    pub fn register_client(&mut self, client: ClientKind) -> bool {
        if self.clients.contains(&client) {
            return false;
        }
        self.clients.push(client);
        true
    }

    /// Whether this server targets `client`.
    #[must_use]
    pub fn targets(&self, client: ClientKind) -> bool {
        self.clients.contains(&client)
    }

    /// Whether the version is a real version rather than a sentinel.
    #[must_use]
    pub fn is_managed(&self) -> bool {
        self.version != VERSION_UNKNOWN && self.version != VERSION_LOCAL
    }
}

fn deserialize_clients<'de, D>(deserializer: D) -> Result<Vec<ClientKind>, D::Error>
where
    D: Deserializer<'de>,
{
    let ids = Vec::<String>::deserialize(deserializer)?;
    Ok(ids
        .into_iter()
        .filter_map(|id| match id.parse::<ClientKind>() {
            Ok(kind) => Some(kind),
            Err(_) => {
                tracing::warn!("Ignoring unknown client '{id}' in lockfile");
                None
            }
        })
        .collect())
}

/// The whole lockfile.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "RawLockFile")]
pub struct LockFile {
    /// Format version
    pub lockfile_version: u32,

    /// Server name to entry, sorted by name
    pub servers: BTreeMap<String, LockEntry>,

    /// Entries that did not parse, kept as read and written back unchanged
    pub unrecognized: BTreeMap<String, Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawLockFile {
    lockfile_version: u32,
    #[serde(default)]
    servers: BTreeMap<String, Value>,
}

impl From<RawLockFile> for LockFile {
    fn from(raw: RawLockFile) -> Self {
        let mut lockfile = Self {
            lockfile_version: raw.lockfile_version,
            servers: BTreeMap::new(),
            unrecognized: BTreeMap::new(),
        };
        for (name, value) in raw.servers {
            match LockEntry::deserialize(&value) {
                Ok(entry) => {
                    lockfile.servers.insert(name, entry);
                }
                Err(e) => {
                    tracing::warn!("Keeping lockfile entry '{name}' as-is: {e}");
                    lockfile.unrecognized.insert(name, value);
                }
            }
        }
        lockfile
    }
}

impl Serialize for LockFile {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        #[serde(untagged)]
        enum ServerRef<'a> {
            Parsed(&'a LockEntry),
            Raw(&'a Value),
        }

        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Repr<'a> {
            lockfile_version: u32,
            servers: BTreeMap<&'a str, ServerRef<'a>>,
        }

        let servers = self
            .servers
            .iter()
            .map(|(name, entry)| (name.as_str(), ServerRef::Parsed(entry)))
            .chain(
                self.unrecognized.iter().map(|(name, value)| (name.as_str(), ServerRef::Raw(value))),
            )
            .collect();
        Repr {
            lockfile_version: self.lockfile_version,
            servers,
        }
        .serialize(serializer)
    }
}

impl Default for LockFile {
    fn default() -> Self {
        Self::new()
    }
}

impl LockFile {
    /// Current lockfile format version.
    pub const CURRENT_VERSION: u32 = 1;

    /// Empty lockfile at the current format version.
    #[must_use]
    pub fn new() -> Self {
        Self {
            lockfile_version: Self::CURRENT_VERSION,
            servers: BTreeMap::new(),
            unrecognized: BTreeMap::new(),
        }
    }

    /// Look up a server.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&LockEntry> {
        self.servers.get(name)
    }

    /// Whether a server is recorded, parsed or not.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.servers.contains_key(name) || self.unrecognized.contains_key(name)
    }

    /// Insert or replace a server.
    pub fn insert(&mut self, name: impl Into<String>, entry: LockEntry) {
        let name = name.into();
        self.unrecognized.remove(&name);
        self.servers.insert(name, entry);
    }

    /// Remove a server, parsed or not. Returns false if it was not recorded.
    pub fn remove(&mut self, name: &str) -> bool {
        let parsed = self.servers.remove(name).is_some();
        let raw = self.unrecognized.remove(name).is_some();
        parsed || raw
    }

    /// Servers that target `client`, in name order.
    pub fn servers_for_client(
        &self,
        client: ClientKind,
    ) -> impl Iterator<Item = (&String, &LockEntry)> + '_ {
        self.servers.iter().filter(move |(_, entry)| entry.targets(client))
    }

    /// Canonical serialized form: pretty JSON, sorted keys, trailing newline.
    pub fn to_json_string(&self) -> Result<String> {
        to_json_pretty(self)
    }
}
