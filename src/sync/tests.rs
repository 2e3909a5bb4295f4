use super::*;
use crate::clients::{ClientConfig, ClientKind, ServerEntry};
use crate::lockfile::{LockEntry, LockFile};

const A: ClientKind = ClientKind::ClaudeDesktop;
const B: ClientKind = ClientKind::Cursor;
const C: ClientKind = ClientKind::Vscode;

fn config_with(names: &[&str]) -> ClientConfig {
    let mut config = ClientConfig::default();
    for name in names {
        config.servers.insert((*name).to_string(), ServerEntry::new(format!("{name}-cmd")));
    }
    config
}

fn lockfile_with(entries: &[(&str, &[ClientKind])]) -> LockFile {
    let mut lockfile = LockFile::new();
    for (name, clients) in entries {
        lockfile.insert(*name, LockEntry::new("npx").with_clients(clients.iter().copied()));
    }
    lockfile
}

fn summary(actions: &[SyncAction]) -> Vec<(String, ClientKind, SyncActionKind)> {
    actions.iter().map(|a| (a.server.clone(), a.client, a.action)).collect()
}

#[test]
fn test_reconstruct_omits_empty_args_and_env() {
    let entry = reconstruct_server_entry(&LockEntry::new("uvx"));
    assert_eq!(entry, ServerEntry::new("uvx"));

    let json = serde_json::to_value(&entry).unwrap();
    assert!(json.get("args").is_none());
    assert!(json.get("env").is_none());
}

#[test]
fn test_reconstruct_env_values_are_placeholders() {
    let lock_entry = LockEntry::new("npx")
        .with_args(["-y", "server-github"])
        .with_env_vars(["GITHUB_TOKEN", "GITHUB_HOST"]);

    let entry = reconstruct_server_entry(&lock_entry);

    assert_eq!(entry.args, Some(vec!["-y".to_string(), "server-github".to_string()]));
    let env = entry.env.unwrap();
    assert_eq!(env.len(), 2);
    assert!(env.values().all(String::is_empty));
    assert!(env.contains_key("GITHUB_TOKEN"));
}

#[test]
fn test_compute_diff_single_missing_server() {
    let lockfile = lockfile_with(&[("X", &[A])]);
    let configs = ClientConfigs::from([(A, ClientConfig::default())]);

    let actions = compute_diff(&lockfile, &configs);

    assert_eq!(summary(&actions), vec![("X".to_string(), A, SyncActionKind::Add)]);
    assert_eq!(actions[0].entry.as_ref().unwrap().command, "npx");
}

#[test]
fn test_compute_diff_add_and_ok() {
    let lockfile = lockfile_with(&[("S", &[A, B])]);
    let configs = ClientConfigs::from([(A, config_with(&["S"])), (B, config_with(&[]))]);

    let actions = compute_diff(&lockfile, &configs);

    assert_eq!(
        summary(&actions),
        vec![
            ("S".to_string(), A, SyncActionKind::Ok),
            ("S".to_string(), B, SyncActionKind::Add),
        ]
    );
}

#[test]
fn test_compute_diff_skips_undetected_clients() {
    let lockfile = lockfile_with(&[("S", &[A, B])]);
    let configs = ClientConfigs::from([(A, config_with(&[]))]);

    let actions = compute_diff(&lockfile, &configs);

    assert_eq!(summary(&actions), vec![("S".to_string(), A, SyncActionKind::Add)]);
}

#[test]
fn test_compute_diff_unknown_server_is_extra() {
    let lockfile = lockfile_with(&[("S", &[A])]);
    let configs = ClientConfigs::from([(A, config_with(&["S", "manual"])), (C, config_with(&["manual"]))]);

    let actions = compute_diff(&lockfile, &configs);

    assert_eq!(
        summary(&actions),
        vec![
            ("S".to_string(), A, SyncActionKind::Ok),
            ("manual".to_string(), A, SyncActionKind::Extra),
            ("manual".to_string(), C, SyncActionKind::Extra),
        ]
    );
    assert!(actions.iter().all(|a| a.action != SyncActionKind::Remove));
}

#[test]
fn test_compute_diff_untargeted_client_gets_no_add() {
    // S is installed but only meant for A; B not listing it is fine
    let lockfile = lockfile_with(&[("S", &[A])]);
    let configs = ClientConfigs::from([(A, config_with(&["S"])), (B, config_with(&[]))]);

    let actions = compute_diff(&lockfile, &configs);

    assert_eq!(summary(&actions), vec![("S".to_string(), A, SyncActionKind::Ok)]);
}

#[test]
fn test_compute_diff_is_deterministic() {
    let lockfile = lockfile_with(&[("b", &[B, A]), ("a", &[A])]);
    let configs = ClientConfigs::from([(B, config_with(&["z"])), (A, config_with(&[]))]);

    let first = compute_diff(&lockfile, &configs);
    let second = compute_diff(&lockfile, &configs);

    assert_eq!(first, second);
    assert_eq!(
        summary(&first),
        vec![
            ("a".to_string(), A, SyncActionKind::Add),
            ("b".to_string(), A, SyncActionKind::Add),
            ("b".to_string(), B, SyncActionKind::Add),
            ("z".to_string(), B, SyncActionKind::Extra),
        ]
    );
}

#[test]
fn test_compute_diff_from_client_missing_source() {
    let configs = ClientConfigs::from([(B, config_with(&["x"]))]);
    assert!(compute_diff_from_client(A, &configs).is_empty());
}

#[test]
fn test_compute_diff_from_client() {
    let mut source = config_with(&["shared", "only-source"]);
    source
        .servers
        .insert("only-source".to_string(), ServerEntry::new("node").with_args(["srv.js"]));
    let configs = ClientConfigs::from([
        (A, source.clone()),
        (B, config_with(&["shared", "only-target"])),
        (C, config_with(&[])),
    ]);

    let actions = compute_diff_from_client(A, &configs);

    assert_eq!(
        summary(&actions),
        vec![
            ("only-source".to_string(), B, SyncActionKind::Add),
            ("shared".to_string(), B, SyncActionKind::Ok),
            ("only-target".to_string(), B, SyncActionKind::Extra),
            ("only-source".to_string(), C, SyncActionKind::Add),
            ("shared".to_string(), C, SyncActionKind::Add),
        ]
    );
    // Source entry is carried verbatim
    assert_eq!(actions[0].entry.as_ref(), source.servers.get("only-source"));
    assert!(actions.iter().all(|a| a.client != A));
}

#[test]
fn test_apply_removal_flag_is_opt_in() {
    let actions = vec![SyncAction::extra("x", A), SyncAction::ok("y", A)];

    let untouched = apply_removal_flag(actions.clone(), false);
    assert_eq!(untouched, actions);

    let removed = apply_removal_flag(actions, true);
    assert_eq!(removed[0].action, SyncActionKind::Remove);
    assert_eq!(removed[1].action, SyncActionKind::Ok);
}

#[test]
fn test_sort_for_display_groups() {
    let mut actions = vec![
        SyncAction::ok("o1", A),
        SyncAction::add("a1", A, ServerEntry::new("x")),
        SyncAction::extra("e1", A),
        SyncAction::ok("o2", B),
        SyncAction::add("a2", B, ServerEntry::new("x")),
    ];

    sort_for_display(&mut actions);

    let names: Vec<_> = actions.iter().map(|a| a.server.as_str()).collect();
    assert_eq!(names, vec!["e1", "a1", "a2", "o1", "o2"]);
}

#[test]
fn test_diff_client_configs_added_removed_changed() {
    let mut a = config_with(&["gone", "same", "cmd", "args", "env"]);
    let mut b = config_with(&["new", "same", "cmd", "args", "env"]);
    b.servers.get_mut("cmd").unwrap().command = "other".to_string();
    b.servers.get_mut("args").unwrap().args = Some(vec!["--flag".to_string()]);
    a.servers.insert("env".to_string(), ServerEntry::new("env-cmd").with_env("K", "1"));
    b.servers.insert("env".to_string(), ServerEntry::new("env-cmd").with_env("K", "2"));

    let diff = diff_client_configs(&a, &b);

    assert_eq!(diff.removed, vec!["gone"]);
    assert_eq!(diff.added, vec!["new"]);
    assert_eq!(
        diff.changed,
        vec![
            ChangedServer {
                name: "args".to_string(),
                changes: vec!["args changed".to_string()],
            },
            ChangedServer {
                name: "cmd".to_string(),
                changes: vec!["command changed".to_string()],
            },
            ChangedServer {
                name: "env".to_string(),
                changes: vec!["env changed".to_string()],
            },
        ]
    );
}

#[test]
fn test_diff_client_configs_missing_args_equals_empty() {
    let a = ClientConfig {
        servers: [("s".to_string(), ServerEntry::new("x"))].into(),
        ..ClientConfig::default()
    };
    let b = ClientConfig {
        servers: [("s".to_string(), ServerEntry::new("x").with_args(Vec::<String>::new()))].into(),
        ..ClientConfig::default()
    };

    assert!(diff_client_configs(&a, &b).is_empty());
}

#[test]
fn test_diff_client_configs_reports_multiple_changes() {
    let a = ClientConfig {
        servers: [("s".to_string(), ServerEntry::new("x").with_args(["1"]))].into(),
        ..ClientConfig::default()
    };
    let b = ClientConfig {
        servers: [("s".to_string(), ServerEntry::new("y").with_args(["2"]))].into(),
        ..ClientConfig::default()
    };

    let diff = diff_client_configs(&a, &b);
    assert_eq!(diff.changed[0].changes, vec!["command changed", "args changed"]);
}

fn with_remote(mut config: ClientConfig, name: &str) -> ClientConfig {
    config.unmanaged.insert(name.to_string());
    config
}

#[test]
fn test_remote_server_not_in_lockfile_is_extra() {
    let lockfile = lockfile_with(&[("x", &[B])]);
    let configs = ClientConfigs::from([(B, with_remote(config_with(&["x"]), "remote"))]);

    assert_eq!(
        summary(&compute_diff(&lockfile, &configs)),
        vec![
            ("x".to_string(), B, SyncActionKind::Ok),
            ("remote".to_string(), B, SyncActionKind::Extra),
        ]
    );
}

#[test]
fn test_remote_server_sharing_lockfile_name_is_ok() {
    let lockfile = lockfile_with(&[("github", &[B])]);
    let configs = ClientConfigs::from([(B, with_remote(ClientConfig::default(), "github"))]);

    let actions = compute_diff(&lockfile, &configs);
    assert_eq!(actions, vec![SyncAction::ok("github", B)]);
}

#[test]
fn test_from_client_with_remote_servers() {
    let source = with_remote(with_remote(config_with(&["a"]), "shared"), "only-source");
    let target = with_remote(with_remote(ClientConfig::default(), "shared"), "only-target");
    let configs = ClientConfigs::from([(A, source), (B, target)]);

    assert_eq!(
        summary(&compute_diff_from_client(A, &configs)),
        vec![
            ("a".to_string(), B, SyncActionKind::Add),
            ("shared".to_string(), B, SyncActionKind::Ok),
            ("only-target".to_string(), B, SyncActionKind::Extra),
        ]
    );
}

#[test]
fn test_diff_client_configs_with_remote_servers() {
    let a = with_remote(with_remote(config_with(&["swap"]), "gone"), "same");
    let mut b = with_remote(with_remote(ClientConfig::default(), "same"), "swap");
    b.unmanaged.insert("fresh".to_string());

    let diff = diff_client_configs(&a, &b);
    assert_eq!(diff.removed, vec!["gone"]);
    assert_eq!(diff.added, vec!["fresh"]);
    assert_eq!(
        diff.changed,
        vec![ChangedServer {
            name: "swap".to_string(),
            changes: vec!["transport changed".to_string()],
        }]
    );
}

#[test]
fn test_sync_action_json_shape() {
    let action = SyncAction::ok("x", ClientKind::ClaudeCode);
    let json = serde_json::to_value(&action).unwrap();
    assert_eq!(json, serde_json::json!({"server": "x", "client": "claude-code", "action": "ok"}));
}
