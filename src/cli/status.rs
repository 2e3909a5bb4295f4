//! Show how detected clients differ from the lockfile.

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use super::common::{CommandContext, format_action};
use super::list::OutputFormat;
use crate::sync::executor::get_client_configs;
use crate::sync::{SyncAction, SyncActionKind, compute_diff, count_actions, sort_for_display};

/// Compare every detected client against `mcpm.lock` without changing anything.
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,
}

impl StatusCommand {
    /// Execute the status command.
    pub async fn execute(self, ctx: &CommandContext) -> Result<()> {
        let registry = ctx.detect_clients();
        if registry.is_empty() {
            println!("{}", "No supported clients detected.".yellow());
            return Ok(());
        }

        let lockfile = ctx.lockfile.read();
        let configs = get_client_configs(&registry).await;
        let mut actions = compute_diff(&lockfile, &configs);
        sort_for_display(&mut actions);

        match self.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&actions)?),
            OutputFormat::Table => print_actions(&actions),
        }
        Ok(())
    }
}

/// Print actions followed by a one-line tally.
pub(super) fn print_actions(actions: &[SyncAction]) {
    if actions.is_empty() {
        println!("Nothing to sync.");
        return;
    }

    for action in actions {
        println!("{}", format_action(action));
    }
    println!();
    println!("{}", summarize(actions));
}

fn summarize(actions: &[SyncAction]) -> String {
    let add = count_actions(actions, SyncActionKind::Add);
    let remove = count_actions(actions, SyncActionKind::Remove);
    let extra = count_actions(actions, SyncActionKind::Extra);
    let ok = count_actions(actions, SyncActionKind::Ok);

    let mut parts = vec![format!("{add} to add")];
    if remove > 0 {
        parts.push(format!("{remove} to remove"));
    }
    parts.push(format!("{extra} extra"));
    parts.push(format!("{ok} in sync"));
    parts.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::{ClientKind, ServerEntry};

    #[test]
    fn test_summarize() {
        let actions = vec![
            SyncAction::add("a", ClientKind::Cursor, ServerEntry::new("x")),
            SyncAction::extra("b", ClientKind::Cursor),
            SyncAction::ok("c", ClientKind::Zed),
            SyncAction::ok("d", ClientKind::Zed),
        ];
        assert_eq!(summarize(&actions), "1 to add, 1 extra, 2 in sync");
    }

    #[test]
    fn test_summarize_mentions_removals() {
        let mut action = SyncAction::extra("b", ClientKind::Cursor);
        action.action = SyncActionKind::Remove;
        assert_eq!(summarize(&[action]), "0 to add, 1 to remove, 0 extra, 0 in sync");
    }
}
