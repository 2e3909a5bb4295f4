//! Command-line interface for MCPM (MCP server manager).
//!
//! Each command lives in its own module with its argument struct and an `execute`
//! method taking a shared [`CommandContext`].
//!
//! # Available Commands
//!
//! ## Inspection
//! - `list` - Servers recorded in the lockfile
//! - `status` - How detected clients differ from the lockfile
//! - `diff` - Field-level comparison of two clients
//!
//! ## Reconciliation
//! - `sync` - Add missing servers to clients, optionally removing extras
//!
//! ## Secrets
//! - `secrets set|get|list|remove` - Encrypted per-server values
//!
//! # Global Options
//!
//! - `--verbose` / `-v`: debug logging
//! - `--quiet` / `-q`: errors only
//! - `--config` / `-c`: alternate global config file
//!
//! # Examples
//!
//! ```bash
//! mcpm status
//! mcpm sync --dry-run
//! mcpm sync --from claude-desktop --remove
//! mcpm diff cursor vscode
//! mcpm secrets set github GITHUB_TOKEN
//! ```

pub mod common;
mod diff;
mod list;
mod secrets;
mod status;
mod sync;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::sync::Arc;

use crate::config::CONFIG_ENV;
use crate::vault::MasterPasswordSession;

pub use common::CommandContext;
pub use list::OutputFormat;

/// Process-level settings derived from global flags.
///
/// Kept separate from [`Cli`] so tests can build one directly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliConfig {
    /// Log filter for the tracing subscriber. `None` defers to `RUST_LOG`.
    pub log_level: Option<String>,

    /// Custom path to the global configuration file.
    ///
    /// When set, exported as `MCPM_CONFIG` so every config lookup in the process
    /// sees it.
    pub config_path: Option<String>,
}

impl CliConfig {
    /// Empty configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Export settings that other modules read from the environment.
    ///
    /// Must run before any other thread is spawned.
    pub fn apply_to_env(&self) {
        if let Some(ref path) = self.config_path {
            // SAFETY: called once from main before the runtime spawns tasks
            unsafe { std::env::set_var(CONFIG_ENV, path) };
        }
    }
}

/// Keep MCP server registrations in sync across AI clients.
#[derive(Debug, Parser)]
#[command(
    name = "mcpm",
    about = "MCP server manager - keep AI client configurations in sync",
    version,
    long_about = "MCPM reconciles the MCP servers registered in AI clients (Claude, Cursor, \
                  VS Code, Windsurf, Zed) against a lockfile, and stores server secrets \
                  in an encrypted vault."
)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to the global configuration file (default: ~/.mcpm/config.toml)
    #[arg(short, long, global = true)]
    config: Option<String>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List servers recorded in the lockfile
    List(list::ListCommand),

    /// Show how detected clients differ from the lockfile
    Status(status::StatusCommand),

    /// Add missing servers to detected clients
    Sync(sync::SyncCommand),

    /// Compare the servers of two clients
    Diff(diff::DiffCommand),

    /// Manage encrypted server secrets
    Secrets(secrets::SecretsCommand),
}

impl Cli {
    /// Translate global flags into a [`CliConfig`].
    ///
    /// - `--verbose`: `debug`
    /// - `--quiet`: `error`
    /// - otherwise: `None`, so `RUST_LOG` (or the `warn` default) applies
    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            Some("debug".to_string())
        } else if self.quiet {
            Some("error".to_string())
        } else {
            None
        };

        CliConfig {
            log_level,
            config_path: self.config.clone(),
        }
    }

    /// Run the selected command.
    ///
    /// `session` holds the master password for the lifetime of the process; the
    /// caller is responsible for clearing it afterwards.
    pub async fn execute(self, session: Arc<MasterPasswordSession>) -> Result<()> {
        let ctx = CommandContext::load(session).await?;
        self.execute_with_context(&ctx).await
    }

    /// Run the selected command against an explicit context.
    pub async fn execute_with_context(self, ctx: &CommandContext) -> Result<()> {
        match self.command {
            Commands::List(cmd) => cmd.execute(ctx),
            Commands::Status(cmd) => cmd.execute(ctx).await,
            Commands::Sync(cmd) => cmd.execute(ctx).await,
            Commands::Diff(cmd) => cmd.execute(ctx).await,
            Commands::Secrets(cmd) => cmd.execute(ctx),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_build_config_log_levels() {
        let cli = Cli::parse_from(["mcpm", "--verbose", "status"]);
        assert_eq!(cli.build_config().log_level.as_deref(), Some("debug"));

        let cli = Cli::parse_from(["mcpm", "-q", "list"]);
        assert_eq!(cli.build_config().log_level.as_deref(), Some("error"));

        let cli = Cli::parse_from(["mcpm", "list"]);
        assert_eq!(cli.build_config(), CliConfig::new());
    }

    #[test]
    fn test_verbose_and_quiet_conflict() {
        assert!(Cli::try_parse_from(["mcpm", "-v", "-q", "list"]).is_err());
    }

    #[test]
    fn test_config_flag_is_global() {
        let cli = Cli::parse_from(["mcpm", "sync", "--dry-run", "--config", "/tmp/c.toml"]);
        assert_eq!(cli.build_config().config_path.as_deref(), Some("/tmp/c.toml"));
    }

    #[test]
    fn test_sync_from_rejects_unknown_client() {
        assert!(Cli::try_parse_from(["mcpm", "sync", "--from", "notepad"]).is_err());
        assert!(Cli::try_parse_from(["mcpm", "sync", "--from", "cursor", "--remove"]).is_ok());
    }

    #[test]
    fn test_secrets_set_value_optional() {
        assert!(Cli::try_parse_from(["mcpm", "secrets", "set", "github", "TOKEN"]).is_ok());
        assert!(Cli::try_parse_from(["mcpm", "secrets", "set", "github"]).is_err());
    }
}
