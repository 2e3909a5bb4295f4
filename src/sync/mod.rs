//! Configuration reconciliation.
//!
//! This module computes the minimal set of actions that brings client configurations
//! into agreement with a source of truth. Everything here is pure: it takes already-read
//! configs and returns [`SyncAction`]s. Applying them is the job of [`executor`].
//!
//! Two sources of truth are supported:
//!
//! - **Lockfile as source** ([`compute_diff`]): each server goes to the clients listed in
//!   its lockfile entry.
//! - **Client as source** ([`compute_diff_from_client`]): one client's server list is
//!   copied to every other detected client.
//!
//! Neither path ever emits [`SyncActionKind::Remove`] by itself. Servers found in a
//! client but not in the source are reported as [`SyncActionKind::Extra`]; turning them
//! into removals is an explicit opt-in ([`apply_removal_flag`]).
//!
//! [`diff_client_configs`] is a separate field-level comparator for showing how two
//! clients differ.

pub mod executor;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::clients::{ClientConfig, ClientKind, ServerEntry};
use crate::lockfile::{LockEntry, LockFile};

/// Configs of every detected client whose file could be read.
pub type ClientConfigs = BTreeMap<ClientKind, ClientConfig>;

/// Relationship between a server's presence in the source and in a target client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncActionKind {
    /// Missing from the target; should be added
    Add,
    /// Not in the source; the caller opted in to removing it
    Remove,
    /// Not in the source; left alone
    Extra,
    /// Present in both
    Ok,
}

impl SyncActionKind {
    /// Lowercase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Remove => "remove",
            Self::Extra => "extra",
            Self::Ok => "ok",
        }
    }

    const fn display_rank(self) -> u8 {
        match self {
            Self::Remove | Self::Extra => 0,
            Self::Add => 1,
            Self::Ok => 2,
        }
    }
}

impl fmt::Display for SyncActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One reconciliation step for a (server, client) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncAction {
    /// Server name
    pub server: String,
    /// Target client
    pub client: ClientKind,
    /// What to do
    pub action: SyncActionKind,
    /// Entry to write for `add` actions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry: Option<ServerEntry>,
}

impl SyncAction {
    /// `add` action carrying the entry to write.
    pub fn add(server: impl Into<String>, client: ClientKind, entry: ServerEntry) -> Self {
        Self {
            server: server.into(),
            client,
            action: SyncActionKind::Add,
            entry: Some(entry),
        }
    }

    /// `ok` action.
    pub fn ok(server: impl Into<String>, client: ClientKind) -> Self {
        Self::bare(server, client, SyncActionKind::Ok)
    }

    /// `extra` action.
    pub fn extra(server: impl Into<String>, client: ClientKind) -> Self {
        Self::bare(server, client, SyncActionKind::Extra)
    }

    fn bare(server: impl Into<String>, client: ClientKind, action: SyncActionKind) -> Self {
        Self {
            server: server.into(),
            client,
            action,
            entry: None,
        }
    }
}

/// Map a lockfile entry to the shape a client stores.
///
/// `args` is omitted when the lockfile has none, and `env` is omitted when the server
/// declares no environment variables. Declared variables map to empty strings: real
/// secret values are injected only when the server is launched and are never written
/// into a client's configuration file.
#[must_use]
pub fn reconstruct_server_entry(entry: &LockEntry) -> ServerEntry {
    let args = (!entry.args.is_empty()).then(|| entry.args.clone());
    let env = (!entry.env_vars.is_empty()).then(|| {
        entry.env_vars.iter().map(|name| (name.clone(), String::new())).collect::<BTreeMap<_, _>>()
    });

    ServerEntry {
        command: entry.command.clone(),
        args,
        env,
    }
}

/// Reconcile clients against the lockfile.
///
/// For every lockfile server and every client it targets, emits `ok` when the client
/// already lists it and `add` (with a reconstructed entry) when it does not. Clients
/// missing from `configs` (not detected or unreadable) get no actions at all. Then, for
/// every server a client lists that the lockfile does not know, emits `extra`.
///
/// Output order is deterministic: lockfile servers by name, their clients in
/// [`ClientKind`] order, followed by extras grouped by client.
#[must_use]
pub fn compute_diff(lockfile: &LockFile, configs: &ClientConfigs) -> Vec<SyncAction> {
    let mut actions = Vec::new();

    for (name, entry) in &lockfile.servers {
        let mut targets = entry.clients.clone();
        targets.sort();
        targets.dedup();

        for client in targets {
            let Some(config) = configs.get(&client) else {
                continue;
            };

            if config.contains(name) {
                actions.push(SyncAction::ok(name, client));
            } else {
                actions.push(SyncAction::add(name, client, reconstruct_server_entry(entry)));
            }
        }
    }

    for (&client, config) in configs {
        for name in config.names() {
            if !lockfile.contains(name) {
                actions.push(SyncAction::extra(name, client));
            }
        }
    }

    actions
}

/// Reconcile every other client against `source`'s server list.
///
/// Returns nothing when `source` was not read. For each other client: servers only in
/// the source are `add` (carrying the source entry verbatim), servers only in the
/// target are `extra`, servers in both are `ok`. Source servers MCPM cannot represent
/// are `ok` where the target already lists them and are otherwise not copied.
#[must_use]
pub fn compute_diff_from_client(source: ClientKind, configs: &ClientConfigs) -> Vec<SyncAction> {
    let Some(source_config) = configs.get(&source) else {
        return Vec::new();
    };

    let mut actions = Vec::new();
    for (&target, target_config) in configs {
        if target == source {
            continue;
        }

        for (name, entry) in &source_config.servers {
            if target_config.contains(name) {
                actions.push(SyncAction::ok(name, target));
            } else {
                actions.push(SyncAction::add(name, target, entry.clone()));
            }
        }

        for name in &source_config.unmanaged {
            if target_config.contains(name) {
                actions.push(SyncAction::ok(name, target));
            }
        }

        for name in target_config.names() {
            if !source_config.contains(name) {
                actions.push(SyncAction::extra(name, target));
            }
        }
    }

    actions
}

/// Turn `extra` actions into `remove` actions when `remove` is set.
///
/// Without the flag the actions are returned untouched: removal is never the default.
#[must_use]
pub fn apply_removal_flag(mut actions: Vec<SyncAction>, remove: bool) -> Vec<SyncAction> {
    if remove {
        for action in &mut actions {
            if action.action == SyncActionKind::Extra {
                action.action = SyncActionKind::Remove;
            }
        }
    }
    actions
}

/// Order actions for display: remove/extra, then add, then ok.
///
/// The sort is stable, so each group keeps the engine's deterministic order.
pub fn sort_for_display(actions: &mut [SyncAction]) {
    actions.sort_by_key(|action| action.action.display_rank());
}

/// Number of actions of `kind`.
#[must_use]
pub fn count_actions(actions: &[SyncAction], kind: SyncActionKind) -> usize {
    actions.iter().filter(|action| action.action == kind).count()
}

/// A server present in both configs with differing fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangedServer {
    /// Server name
    pub name: String,
    /// Human-readable change descriptions
    pub changes: Vec<String>,
}

/// Field-level comparison of two client configs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConfigDiff {
    /// Only in the first config
    pub removed: Vec<String>,
    /// Only in the second config
    pub added: Vec<String>,
    /// In both, with different fields
    pub changed: Vec<ChangedServer>,
}

impl ConfigDiff {
    /// Whether the configs are equivalent.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty() && self.added.is_empty() && self.changed.is_empty()
    }
}

/// Compare two client configs going from `a` to `b`.
///
/// A missing `args` list is the same as an empty one, and likewise for `env`, so
/// clients that omit empty fields do not show up as changed. A server that is
/// command-based on one side and unmanaged on the other reports `"transport changed"`.
#[must_use]
pub fn diff_client_configs(a: &ClientConfig, b: &ClientConfig) -> ConfigDiff {
    let mut diff = ConfigDiff::default();

    for name in a.names() {
        if !b.contains(name) {
            diff.removed.push(name.to_string());
        }
    }

    for name in b.names() {
        if !a.contains(name) {
            diff.added.push(name.to_string());
            continue;
        }

        let changes = match (a.servers.get(name), b.servers.get(name)) {
            (Some(old), Some(new)) => entry_changes(old, new),
            (None, None) => Vec::new(),
            _ => vec!["transport changed".to_string()],
        };
        if !changes.is_empty() {
            diff.changed.push(ChangedServer {
                name: name.to_string(),
                changes,
            });
        }
    }

    diff
}

fn entry_changes(old: &ServerEntry, new: &ServerEntry) -> Vec<String> {
    let mut changes = Vec::new();

    if old.command != new.command {
        changes.push("command changed".to_string());
    }
    if old.args_or_empty() != new.args_or_empty() {
        changes.push("args changed".to_string());
    }

    let empty = BTreeMap::new();
    if old.env.as_ref().unwrap_or(&empty) != new.env.as_ref().unwrap_or(&empty) {
        changes.push("env changed".to_string());
    }

    changes
}

#[cfg(test)]
mod tests;
