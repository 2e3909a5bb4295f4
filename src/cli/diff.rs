//! Compare two clients' server lists field by field.

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use super::common::{CommandContext, require_client};
use super::list::OutputFormat;
use crate::clients::ClientKind;
use crate::sync::executor::get_client_configs;
use crate::sync::{ConfigDiff, diff_client_configs};

/// Show which servers differ between two clients.
#[derive(Debug, Args)]
pub struct DiffCommand {
    /// Client to compare from
    #[arg(value_name = "CLIENT_A")]
    a: ClientKind,

    /// Client to compare to
    #[arg(value_name = "CLIENT_B")]
    b: ClientKind,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,
}

impl DiffCommand {
    /// Execute the diff command.
    pub async fn execute(self, ctx: &CommandContext) -> Result<()> {
        let configs = get_client_configs(&ctx.detect_clients()).await;
        require_client(&configs, self.a)?;
        require_client(&configs, self.b)?;

        let diff = diff_client_configs(&configs[&self.a], &configs[&self.b]);

        match self.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&diff)?),
            OutputFormat::Table => {
                for line in render(self.a, self.b, &diff) {
                    println!("{line}");
                }
            }
        }
        Ok(())
    }
}

fn render(a: ClientKind, b: ClientKind, diff: &ConfigDiff) -> Vec<String> {
    if diff.is_empty() {
        return vec![format!("{a} and {b} have the same servers.")];
    }

    let mut lines = Vec::new();
    for name in &diff.removed {
        lines.push(format!("  {} {name} (only in {a})", "-".red().bold()));
    }
    for name in &diff.added {
        lines.push(format!("  {} {name} (only in {b})", "+".green().bold()));
    }
    for changed in &diff.changed {
        lines.push(format!(
            "  {} {}: {}",
            "~".yellow().bold(),
            changed.name,
            changed.changes.join(", ")
        ));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::ChangedServer;
    use serial_test::serial;

    #[test]
    fn test_render_identical() {
        let lines = render(ClientKind::Cursor, ClientKind::Zed, &ConfigDiff::default());
        assert_eq!(lines, vec!["cursor and zed have the same servers."]);
    }

    #[test]
    #[serial]
    fn test_render_changes() {
        colored::control::set_override(false);
        let diff = ConfigDiff {
            removed: vec!["old".to_string()],
            added: vec!["new".to_string()],
            changed: vec![ChangedServer {
                name: "git".to_string(),
                changes: vec!["command changed".to_string(), "args changed".to_string()],
            }],
        };

        let lines = render(ClientKind::Cursor, ClientKind::Zed, &diff);
        colored::control::unset_override();

        assert_eq!(
            lines,
            vec![
                "  - old (only in cursor)",
                "  + new (only in zed)",
                "  ~ git: command changed, args changed",
            ]
        );
    }
}
