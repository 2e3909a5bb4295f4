//! Sample lockfiles and a scripted password prompt.

use anyhow::Result;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::clients::ClientKind;
use crate::core::McpmError;
use crate::lockfile::{LockEntry, LockFile, SourceKind, compute_integrity};
use crate::vault::PasswordPrompt;

/// Builders for lockfiles used across tests.
pub struct LockfileFixture;

impl LockfileFixture {
    /// A fixed-timestamp entry launched with `npx -y <package>`.
    pub fn npx_entry(package: &str, clients: impl IntoIterator<Item = ClientKind>) -> LockEntry {
        let mut entry = LockEntry::new("npx").with_args(["-y", package]).with_clients(clients);
        entry.version = "1.0.0".to_string();
        entry.resolved = format!("https://registry.npmjs.org/{package}/-/{package}-1.0.0.tgz");
        entry.integrity = compute_integrity(entry.resolved.as_bytes());
        entry.installed_at = "2025-01-01T00:00:00+00:00".to_string();
        entry
    }

    /// Two servers: `filesystem` for Cursor, `github` for Cursor and Claude Desktop
    /// with a required token.
    pub fn basic() -> LockFile {
        let mut lockfile = LockFile::new();
        lockfile.insert(
            "filesystem",
            Self::npx_entry("@modelcontextprotocol/server-filesystem", [ClientKind::Cursor]),
        );
        lockfile.insert(
            "github",
            Self::npx_entry(
                "@modelcontextprotocol/server-github",
                [ClientKind::Cursor, ClientKind::ClaudeDesktop],
            )
            .with_env_vars(["GITHUB_TOKEN"]),
        );
        lockfile
    }

    /// A locally built server with no target clients.
    pub fn local_only() -> LockFile {
        let mut entry = LockEntry::new("node").with_args(["./build/index.js"]);
        entry.version = crate::lockfile::VERSION_LOCAL.to_string();
        entry.source = SourceKind::Local;

        let mut lockfile = LockFile::new();
        lockfile.insert("scratch", entry);
        lockfile
    }
}

/// Prompt that answers with a fixed password and counts how often it was asked.
///
/// With no password it behaves like a user pressing Ctrl-C.
pub struct CountingPrompt {
    password: Option<String>,
    calls: AtomicUsize,
    new_password_calls: AtomicUsize,
}

impl CountingPrompt {
    /// Prompt answering `password`.
    pub fn new(password: impl Into<String>) -> Self {
        Self {
            password: Some(password.into()),
            calls: AtomicUsize::new(0),
            new_password_calls: AtomicUsize::new(0),
        }
    }

    /// Prompt that always cancels.
    pub fn cancelling() -> Self {
        Self {
            password: None,
            calls: AtomicUsize::new(0),
            new_password_calls: AtomicUsize::new(0),
        }
    }

    /// Number of times the prompt was shown.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// How many of those prompts asked for a new, confirmed password.
    pub fn new_password_calls(&self) -> usize {
        self.new_password_calls.load(Ordering::SeqCst)
    }
}

impl PasswordPrompt for CountingPrompt {
    fn read_password(&self, _message: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.password.clone().ok_or_else(|| McpmError::Cancelled.into())
    }

    fn read_new_password(&self, message: &str) -> Result<String> {
        self.new_password_calls.fetch_add(1, Ordering::SeqCst);
        self.read_password(message)
    }
}
