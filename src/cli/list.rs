//! List servers recorded in the lockfile.

use anyhow::Result;
use clap::{Args, ValueEnum};
use colored::Colorize;

use super::common::CommandContext;
use crate::lockfile::LockFile;

/// Output format shared by the inspection commands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable, colored
    #[default]
    Table,
    /// Machine-readable JSON
    Json,
}

/// Show every server in `mcpm.lock` with its version, source and target clients.
#[derive(Debug, Args)]
pub struct ListCommand {
    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    /// Also show command lines and declared environment variables
    #[arg(short, long)]
    detailed: bool,
}

impl ListCommand {
    /// Execute the list command.
    pub fn execute(self, ctx: &CommandContext) -> Result<()> {
        let lockfile = ctx.lockfile.read();

        match self.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&lockfile.servers)?);
            }
            OutputFormat::Table => {
                for line in self.render(&lockfile) {
                    println!("{line}");
                }
            }
        }
        Ok(())
    }

    fn render(&self, lockfile: &LockFile) -> Vec<String> {
        if lockfile.servers.is_empty() {
            return vec!["No servers installed.".to_string()];
        }

        let mut lines = vec![
            format!(
                "{:<24} {:<12} {:<8} {}",
                "Name".cyan().bold(),
                "Version".cyan().bold(),
                "Source".cyan().bold(),
                "Clients".cyan().bold()
            ),
        ];

        for (name, entry) in &lockfile.servers {
            let clients = if entry.clients.is_empty() {
                "-".dimmed().to_string()
            } else {
                entry.clients.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
            };
            lines.push(format!(
                "{name:<24} {:<12} {:<8} {clients}",
                entry.version,
                entry.source.as_str()
            ));

            if self.detailed {
                let mut command = entry.command.clone();
                for arg in &entry.args {
                    command.push(' ');
                    command.push_str(arg);
                }
                lines.push(format!("    {} {command} ({})", "command:".dimmed(), entry.runtime));
                if !entry.env_vars.is_empty() {
                    lines.push(format!("    {} {}", "env:".dimmed(), entry.env_vars.join(", ")));
                }
            }
        }

        lines.push(String::new());
        lines.push(format!("{}: {} servers", "Total".green().bold(), lockfile.servers.len()));
        lines
    }
}
