//! Manage encrypted per-server secrets.

use anyhow::Result;
use clap::{Args, Subcommand};
use colored::Colorize;

use super::common::CommandContext;
use crate::core::McpmError;

/// Store, read, list and delete secrets in the vault.
#[derive(Debug, Args)]
pub struct SecretsCommand {
    #[command(subcommand)]
    subcommand: SecretsSubcommand,
}

#[derive(Debug, Subcommand)]
enum SecretsSubcommand {
    /// Encrypt and store a secret
    Set {
        /// Server the secret belongs to
        server: String,
        /// Secret name, usually the environment variable the server reads
        key: String,
        /// Secret value; prompted for when omitted
        value: Option<String>,
    },

    /// Decrypt and print a secret
    Get {
        /// Server the secret belongs to
        server: String,
        /// Secret name
        key: String,
    },

    /// List secret names without decrypting anything
    List {
        /// Only show this server
        server: Option<String>,
    },

    /// Delete a secret
    Remove {
        /// Server the secret belongs to
        server: String,
        /// Secret name
        key: String,
    },
}

impl SecretsCommand {
    /// Execute the secrets command.
    pub fn execute(self, ctx: &CommandContext) -> Result<()> {
        match self.subcommand {
            SecretsSubcommand::Set {
                server,
                key,
                value,
            } => set(ctx, &server, &key, value),
            SecretsSubcommand::Get {
                server,
                key,
            } => get(ctx, &server, &key),
            SecretsSubcommand::List {
                server,
            } => {
                list(ctx, server.as_deref());
                Ok(())
            }
            SecretsSubcommand::Remove {
                server,
                key,
            } => remove(ctx, &server, &key),
        }
    }
}

fn set(ctx: &CommandContext, server: &str, key: &str, value: Option<String>) -> Result<()> {
    let value = match value {
        Some(value) => value,
        None => ctx.prompt.read_password(&format!("Value for {key}"))?,
    };

    let password = ctx.vault.password_for_write(ctx.prompt.as_ref())?;
    ctx.vault.set_secret(server, key, &value, &password)?;
    println!("{} Stored {} for {}", "✓".green().bold(), key.bold(), server);
    Ok(())
}

fn get(ctx: &CommandContext, server: &str, key: &str) -> Result<()> {
    if !ctx.vault.has_secret(server, key) {
        return Err(not_found(server, key));
    }

    let password = ctx.vault.session().get_or_prompt(ctx.prompt.as_ref())?;
    match ctx.vault.get_secret(server, key, &password) {
        Ok(Some(value)) => {
            println!("{value}");
            Ok(())
        }
        Ok(None) => Err(not_found(server, key)),
        Err(e) => {
            ctx.vault.session().clear();
            Err(e)
        }
    }
}

fn list(ctx: &CommandContext, server: Option<&str>) {
    let secrets = ctx.vault.list_secrets(server);
    if secrets.is_empty() {
        match server {
            Some(server) => println!("No secrets stored for {server}."),
            None => println!("No secrets stored."),
        }
        return;
    }

    for (name, keys) in &secrets {
        println!("{}", name.cyan().bold());
        for key in keys {
            println!("  {key}");
        }
    }
}

fn remove(ctx: &CommandContext, server: &str, key: &str) -> Result<()> {
    if !ctx.vault.remove_secret(server, key)? {
        return Err(not_found(server, key));
    }
    println!("{} Removed {} from {}", "✓".green().bold(), key.bold(), server);
    Ok(())
}

fn not_found(server: &str, key: &str) -> anyhow::Error {
    McpmError::SecretNotFound {
        server: server.to_string(),
        key: key.to_string(),
    }
    .into()
}
