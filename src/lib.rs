//! MCPM - MCP server manager
//!
//! Keeps the Model Context Protocol servers registered in AI clients (Claude Desktop,
//! Claude Code, Cursor, VS Code, Windsurf, Zed) consistent with a lockfile, and keeps
//! server secrets in an encrypted vault.
//!
//! # Architecture Overview
//!
//! - `mcpm.lock` records every installed server and the clients it should be
//!   registered with
//! - Each client's own config file is read and written through a [`clients::ClientAdapter`]
//! - The [`sync`] engine compares the two and produces a flat list of actions; the
//!   executor applies them one at a time so one broken client never blocks the rest
//! - Secrets live in `~/.mcpm/vault.json`, each value encrypted on its own with a key
//!   derived from a master password that is asked for at most once per process
//!
//! # Core Modules
//!
//! - [`cli`] - Command-line interface
//! - [`clients`] - Client identifiers, server entries and config adapters
//! - [`config`] - Global configuration (`~/.mcpm/config.toml`)
//! - [`core`] - Error types and user-facing error rendering
//! - [`lockfile`] - Lockfile model and persistence
//! - [`sync`] - Diff engine and sync executor
//! - [`utils`] - File system and platform helpers
//! - [`vault`] - Encrypted secrets store and master password session
//!
//! # Example
//!
//! ```rust,no_run
//! use mcpm_cli::clients::AdapterRegistry;
//! use mcpm_cli::lockfile::LockfileStore;
//! use mcpm_cli::sync::{compute_diff, executor};
//! use std::collections::BTreeMap;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let home = mcpm_cli::utils::get_home_dir()?;
//! let registry = AdapterRegistry::detect(&home, &BTreeMap::new());
//! let configs = executor::get_client_configs(&registry).await;
//!
//! let lockfile = LockfileStore::new("mcpm.lock").read();
//! let actions = compute_diff(&lockfile, &configs);
//! let report = executor::apply_sync_actions(&actions, &registry).await;
//! println!("{}", report.summary());
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod clients;
pub mod config;
pub mod core;
pub mod lockfile;
pub mod sync;
pub mod utils;
pub mod vault;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
