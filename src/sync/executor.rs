//! Applying sync actions to clients.
//!
//! Actions are applied one at a time in the order given. A failing action is recorded
//! in the [`SyncReport`] and the batch continues, so one broken client config never
//! blocks the rest. Reading configs is the only concurrent step.

use futures::future::join_all;
use std::fmt;

use super::{ClientConfigs, SyncAction, SyncActionKind};
use crate::clients::{AdapterRegistry, ClientKind};

const NO_HANDLER: &str = "no handler available";
const MISSING_ENTRY: &str = "missing server entry";

/// One action that could not be applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncFailure {
    /// Server name
    pub server: String,
    /// Target client
    pub client: ClientKind,
    /// Error description
    pub error: String,
}

impl fmt::Display for SyncFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}: {}", self.server, self.client, self.error)
    }
}

/// Outcome of applying a batch of actions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Actions that succeeded
    pub applied: usize,
    /// Actions that failed
    pub failed: usize,
    /// One record per failed action, in application order
    pub failures: Vec<SyncFailure>,
}

impl SyncReport {
    /// Whether every action succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    /// One-line summary such as `3 applied, 1 failed`.
    #[must_use]
    pub fn summary(&self) -> String {
        format!("{} applied, {} failed", self.applied, self.failed)
    }

    /// Fold another report into this one.
    pub fn merge(&mut self, other: Self) {
        self.applied += other.applied;
        self.failed += other.failed;
        self.failures.extend(other.failures);
    }

    fn record_success(&mut self) {
        self.applied += 1;
    }

    fn record_failure(&mut self, action: &SyncAction, error: impl Into<String>) {
        let error = error.into();
        tracing::warn!("Failed to sync '{}' to {}: {error}", action.server, action.client);
        self.failed += 1;
        self.failures.push(SyncFailure {
            server: action.server.clone(),
            client: action.client,
            error,
        });
    }
}

/// Apply every `add` action, ignoring all other kinds.
///
/// Each action looks up the adapter for its client and writes the carried entry.
/// A client with no registered adapter fails with `no handler available`; an `add`
/// without an entry fails with `missing server entry`. Neither stops the batch.
pub async fn apply_sync_actions(actions: &[SyncAction], registry: &AdapterRegistry) -> SyncReport {
    let mut report = SyncReport::default();

    for action in actions.iter().filter(|a| a.action == SyncActionKind::Add) {
        let Some(adapter) = registry.get(action.client) else {
            report.record_failure(action, NO_HANDLER);
            continue;
        };
        let Some(entry) = action.entry.clone() else {
            report.record_failure(action, MISSING_ENTRY);
            continue;
        };

        match adapter.add_server(&action.server, entry).await {
            Ok(()) => {
                tracing::info!("Added '{}' to {}", action.server, action.client);
                report.record_success();
            }
            Err(e) => report.record_failure(action, format!("{e:#}")),
        }
    }

    report
}

/// Apply every `remove` action, ignoring all other kinds.
///
/// `remove` actions only exist when the caller opted in with
/// [`super::apply_removal_flag`]. A server that is already gone counts as applied.
pub async fn apply_remove_actions(
    actions: &[SyncAction],
    registry: &AdapterRegistry,
) -> SyncReport {
    let mut report = SyncReport::default();

    for action in actions.iter().filter(|a| a.action == SyncActionKind::Remove) {
        let Some(adapter) = registry.get(action.client) else {
            report.record_failure(action, NO_HANDLER);
            continue;
        };

        match adapter.remove_server(&action.server).await {
            Ok(removed) => {
                if removed {
                    tracing::info!("Removed '{}' from {}", action.server, action.client);
                } else {
                    tracing::debug!("'{}' already absent from {}", action.server, action.client);
                }
                report.record_success();
            }
            Err(e) => report.record_failure(action, format!("{e:#}")),
        }
    }

    report
}

/// Read every registered client's config concurrently.
///
/// A client whose config cannot be read is logged and left out of the result, which
/// makes the diff engine skip it.
pub async fn get_client_configs(registry: &AdapterRegistry) -> ClientConfigs {
    let reads = registry.iter().map(|adapter| async move {
        let result = adapter.read_config().await;
        (adapter.kind(), adapter.config_path().display().to_string(), result)
    });

    let mut configs = ClientConfigs::new();
    for (kind, path, result) in join_all(reads).await {
        match result {
            Ok(config) => {
                tracing::debug!("Read {} servers from {kind} ({path})", config.servers.len());
                configs.insert(kind, config);
            }
            Err(e) => {
                tracing::warn!("Skipping {kind}: could not read {path}: {e:#}");
            }
        }
    }
    configs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::{AdapterFuture, ClientAdapter, ClientConfig, ServerEntry};
    use std::collections::BTreeSet;
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;

    /// In-memory adapter that fails for selected server names.
    struct MockAdapter {
        kind: ClientKind,
        path: PathBuf,
        fail_on: BTreeSet<String>,
        fail_read: bool,
        config: Mutex<ClientConfig>,
    }

    impl MockAdapter {
        fn new(kind: ClientKind) -> Self {
            Self {
                kind,
                path: PathBuf::from(format!("/mock/{kind}.json")),
                fail_on: BTreeSet::new(),
                fail_read: false,
                config: Mutex::new(ClientConfig::default()),
            }
        }

        fn failing_on(mut self, name: &str) -> Self {
            self.fail_on.insert(name.to_string());
            self
        }

        fn unreadable(mut self) -> Self {
            self.fail_read = true;
            self
        }

        fn with_server(self, name: &str) -> Self {
            self.config.lock().unwrap().servers.insert(name.to_string(), ServerEntry::new("x"));
            self
        }
    }

    impl ClientAdapter for MockAdapter {
        fn kind(&self) -> ClientKind {
            self.kind
        }

        fn is_installed(&self) -> bool {
            true
        }

        fn config_path(&self) -> &Path {
            &self.path
        }

        fn read_config(&self) -> AdapterFuture<'_, ClientConfig> {
            Box::pin(async move {
                if self.fail_read {
                    anyhow::bail!("malformed config");
                }
                Ok(self.config.lock().unwrap().clone())
            })
        }

        fn write_config<'a>(&'a self, config: &'a ClientConfig) -> AdapterFuture<'a, ()> {
            Box::pin(async move {
                *self.config.lock().unwrap() = config.clone();
                Ok(())
            })
        }

        fn add_server<'a>(&'a self, name: &'a str, entry: ServerEntry) -> AdapterFuture<'a, ()> {
            Box::pin(async move {
                if self.fail_on.contains(name) {
                    anyhow::bail!("disk full");
                }
                self.config.lock().unwrap().servers.insert(name.to_string(), entry);
                Ok(())
            })
        }

        fn remove_server<'a>(&'a self, name: &'a str) -> AdapterFuture<'a, bool> {
            Box::pin(async move {
                if self.fail_on.contains(name) {
                    anyhow::bail!("read-only");
                }
                Ok(self.config.lock().unwrap().servers.remove(name).is_some())
            })
        }
    }

    fn add(server: &str, client: ClientKind) -> SyncAction {
        SyncAction::add(server, client, ServerEntry::new("npx"))
    }

    #[tokio::test]
    async fn test_failures_do_not_stop_the_batch() {
        let mut registry = AdapterRegistry::new();
        registry.insert(Box::new(MockAdapter::new(ClientKind::Cursor).failing_on("bad")));

        let actions = vec![
            add("one", ClientKind::Cursor),
            add("bad", ClientKind::Cursor),
            add("two", ClientKind::Cursor),
        ];
        let report = apply_sync_actions(&actions, &registry).await;

        assert_eq!(report.applied, 2);
        assert_eq!(report.failed, 1);
        assert!(!report.is_success());
        assert_eq!(report.failures[0].server, "bad");
        assert!(report.failures[0].error.contains("disk full"));

        let config = registry.get(ClientKind::Cursor).unwrap().read_config().await.unwrap();
        assert!(config.contains("one"));
        assert!(config.contains("two"));
    }

    #[tokio::test]
    async fn test_missing_adapter_and_entry() {
        let mut registry = AdapterRegistry::new();
        registry.insert(Box::new(MockAdapter::new(ClientKind::Cursor)));

        let mut no_entry = add("x", ClientKind::Cursor);
        no_entry.entry = None;
        let actions = vec![add("x", ClientKind::Zed), no_entry];

        let report = apply_sync_actions(&actions, &registry).await;

        assert_eq!(report.applied, 0);
        assert_eq!(
            report.failures,
            vec![
                SyncFailure {
                    server: "x".to_string(),
                    client: ClientKind::Zed,
                    error: NO_HANDLER.to_string(),
                },
                SyncFailure {
                    server: "x".to_string(),
                    client: ClientKind::Cursor,
                    error: MISSING_ENTRY.to_string(),
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_sync_ignores_non_add_actions() {
        let mut registry = AdapterRegistry::new();
        registry.insert(Box::new(MockAdapter::new(ClientKind::Cursor).with_server("keep")));

        let actions = vec![
            SyncAction::ok("keep", ClientKind::Cursor),
            SyncAction::extra("keep", ClientKind::Cursor),
        ];
        let report = apply_sync_actions(&actions, &registry).await;

        assert_eq!(report, SyncReport::default());
        let config = registry.get(ClientKind::Cursor).unwrap().read_config().await.unwrap();
        assert!(config.contains("keep"));
    }

    #[tokio::test]
    async fn test_apply_remove_actions() {
        let mut registry = AdapterRegistry::new();
        registry.insert(Box::new(
            MockAdapter::new(ClientKind::Cursor)
                .with_server("old")
                .with_server("locked")
                .failing_on("locked"),
        ));

        let mut actions = vec![
            SyncAction::extra("old", ClientKind::Cursor),
            SyncAction::extra("locked", ClientKind::Cursor),
        ];
        // Without the flag nothing is removed
        assert_eq!(apply_remove_actions(&actions, &registry).await.applied, 0);

        actions = super::super::apply_removal_flag(actions, true);
        let report = apply_remove_actions(&actions, &registry).await;

        assert_eq!(report.applied, 1);
        assert_eq!(report.failed, 1);
        let config = registry.get(ClientKind::Cursor).unwrap().read_config().await.unwrap();
        assert!(!config.contains("old"));
        assert!(config.contains("locked"));
    }

    #[tokio::test]
    async fn test_get_client_configs_skips_unreadable() {
        let mut registry = AdapterRegistry::new();
        registry.insert(Box::new(MockAdapter::new(ClientKind::Cursor).with_server("a")));
        registry.insert(Box::new(MockAdapter::new(ClientKind::Zed).unreadable()));

        let configs = get_client_configs(&registry).await;

        assert_eq!(configs.keys().copied().collect::<Vec<_>>(), vec![ClientKind::Cursor]);
        assert!(configs[&ClientKind::Cursor].contains("a"));
    }

    #[test]
    fn test_report_summary_and_merge() {
        let mut report = SyncReport {
            applied: 2,
            ..SyncReport::default()
        };
        report.merge(SyncReport {
            applied: 1,
            failed: 1,
            failures: vec![SyncFailure {
                server: "s".to_string(),
                client: ClientKind::Cursor,
                error: "boom".to_string(),
            }],
        });

        assert_eq!(report.summary(), "3 applied, 1 failed");
        assert_eq!(report.failures[0].to_string(), "s -> cursor: boom");
    }
}
