//! Bring client configurations in line with the lockfile or with another client.

use anyhow::{Result, bail};
use clap::Args;
use colored::Colorize;

use super::common::{CommandContext, require_client};
use super::status::print_actions;
use crate::clients::ClientKind;
use crate::sync::executor::{
    SyncReport, apply_remove_actions, apply_sync_actions, get_client_configs,
};
use crate::sync::{
    SyncActionKind, apply_removal_flag, compute_diff, compute_diff_from_client, count_actions,
    sort_for_display,
};

/// Add missing servers to every detected client.
///
/// By default the lockfile is the source of truth. With `--from`, one client's server
/// list is copied to all the others instead. Servers a client has that the source
/// lacks are left alone unless `--remove` is given.
#[derive(Debug, Args)]
pub struct SyncCommand {
    /// Use this client's config as the source instead of the lockfile
    #[arg(long, value_name = "CLIENT")]
    from: Option<ClientKind>,

    /// Also remove servers that are not in the source
    #[arg(long)]
    remove: bool,

    /// Show what would change without writing anything
    #[arg(long)]
    dry_run: bool,
}

impl SyncCommand {
    /// Execute the sync command.
    pub async fn execute(self, ctx: &CommandContext) -> Result<()> {
        let registry = ctx.detect_clients();
        if registry.is_empty() {
            println!("{}", "No supported clients detected.".yellow());
            return Ok(());
        }

        let configs = get_client_configs(&registry).await;
        let actions = match self.from {
            Some(source) => {
                require_client(&configs, source)?;
                compute_diff_from_client(source, &configs)
            }
            None => compute_diff(&ctx.lockfile.read(), &configs),
        };
        let mut actions = apply_removal_flag(actions, self.remove);
        sort_for_display(&mut actions);

        print_actions(&actions);

        let pending = count_actions(&actions, SyncActionKind::Add)
            + count_actions(&actions, SyncActionKind::Remove);
        if self.dry_run {
            if pending > 0 {
                println!("{}", "Dry run: no changes written.".dimmed());
            }
            return Ok(());
        }
        if pending == 0 {
            return Ok(());
        }

        let mut report = apply_sync_actions(&actions, &registry).await;
        if self.remove {
            report.merge(apply_remove_actions(&actions, &registry).await);
        }

        print_report(&report);
        if !report.is_success() {
            bail!("{} of {} sync actions failed", report.failed, report.applied + report.failed);
        }
        Ok(())
    }
}

fn print_report(report: &SyncReport) {
    println!();
    if report.is_success() {
        println!("{} {}", "✓".green().bold(), report.summary());
        return;
    }

    println!("{} {}", "✗".red().bold(), report.summary());
    for failure in &report.failures {
        println!("  {} {failure}", "-".red());
    }
}
