use assert_cmd::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

struct Workspace {
    dir: tempfile::TempDir,
}

impl Workspace {
    fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = format!(
            "log_level: warn\nbreadcrumb_store: {}\n",
            dir.path().join("crumbs.log").display()
        );
        fs::write(dir.path().join("webstate.yaml"), config).expect("write config");
        Self { dir }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn config(&self) -> PathBuf {
        self.path().join("webstate.yaml")
    }

    fn with_policy(self, yaml: &str) -> Self {
        let policy = self.path().join("policy.yaml");
        fs::write(&policy, yaml).expect("write policy");
        let mut config = fs::read_to_string(self.config()).expect("read config");
        config.push_str(&format!("policy_path: {}\n", policy.display()));
        fs::write(self.config(), config).expect("rewrite config");
        self
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("webstate").expect("binary");
        cmd.env_remove("WEBSTATE_BREADCRUMB_STORE")
            .env_remove("WEBSTATE_POLICY_PATH")
            .env_remove("WEBSTATE_LOG_LEVEL")
            .env_remove("WEBSTATE_POLICY_OVERRIDE_JSON")
            .env_remove("RUST_LOG")
            .arg("--config")
            .arg(self.config());
        cmd
    }

    fn stdout(&self, args: &[&str]) -> String {
        let assert = self.cmd().args(args).assert().success();
        String::from_utf8(assert.get_output().stdout.clone()).expect("utf8 output")
    }
}

fn extract_json(output: &str) -> Value {
    let start = output.find('{').expect("json start");
    let end = output.rfind('}').expect("json end");
    serde_json::from_str(&output[start..=end]).expect("valid json")
}

#[test]
fn added_breadcrumbs_survive_between_runs() {
    let ws = Workspace::new();
    ws.cmd().args(["breadcrumbs", "add", "hello"]).assert().success();
    ws.cmd().args(["breadcrumbs", "add", "world"]).assert().success();

    let stdout = ws.stdout(&["breadcrumbs", "show"]);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].ends_with(" hello"));
    assert!(lines[1].ends_with(" world"));

    let limited = ws.stdout(&["breadcrumbs", "show", "--limit", "1"]);
    assert_eq!(limited.lines().count(), 1);
    assert!(limited.trim_end().ends_with(" world"));
}

#[test]
fn multi_line_breadcrumb_is_rejected() {
    let ws = Workspace::new();
    ws.cmd()
        .args(["breadcrumbs", "add", "first\nsecond"])
        .assert()
        .failure();
    assert!(!ws.path().join("crumbs.log").exists());
}

#[test]
fn crash_report_respects_byte_budget() {
    let ws = Workspace::new();
    for text in ["alpha", "beta", "gamma"] {
        ws.cmd().args(["breadcrumbs", "add", text]).assert().success();
    }

    let full = ws.stdout(&["breadcrumbs", "crash-report"]);
    assert_eq!(full.trim_end().lines().count(), 3);

    // "0:00:00 gamma" is 13 bytes; the next event does not fit as well
    let tight = ws.stdout(&["breadcrumbs", "crash-report", "--max-bytes", "20"]);
    assert_eq!(tight.trim_end(), "0:00:00 gamma");
}

#[test]
fn navigation_commits_and_leaves_breadcrumbs() {
    let ws = Workspace::new();
    let stdout = ws.stdout(&["navigate", "https://example.com/?q=1", "--transition", "typed"]);
    let value = extract_json(&stdout);
    assert_eq!(value["outcome"]["phase"].as_str(), Some("committed"));
    assert_eq!(value["outcome"]["action_policy"].as_str(), Some("allow"));
    assert_eq!(value["breadcrumbs_recorded"].as_u64(), Some(3));
    assert!(value["redirect"].is_null());

    let crumbs = ws.stdout(&["breadcrumbs", "show"]);
    let lines: Vec<&str> = crumbs.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].contains("StartNav1 typed"));
    assert!(lines[1].ends_with("FinishNav1 200"));
    assert!(lines[2].ends_with("Destroyed"));
}

#[test]
fn blocklisted_host_is_cancelled_at_request() {
    let ws = Workspace::new().with_policy("blocklist:\n  hosts:\n    - blocked.example\n");
    let stdout = ws.stdout(&["navigate", "https://www.blocked.example/page"]);
    let value = extract_json(&stdout);
    assert_eq!(value["outcome"]["phase"].as_str(), Some("cancelled"));
    assert_eq!(value["outcome"]["cancelled_by"].as_str(), Some("url_blocklist"));

    let crumbs = ws.stdout(&["breadcrumbs", "show"]);
    assert!(crumbs.contains("CancelNav1 by url_blocklist at request"));
    assert!(!crumbs.contains("StartNav1"));
}

#[test]
fn unsupported_change_password_redirects_to_origin() {
    let ws = Workspace::new();
    let stdout = ws.stdout(&[
        "navigate",
        "https://site.example/.well-known/change-password",
        "--probe-status",
        "200",
    ]);
    let value = extract_json(&stdout);
    assert_eq!(value["outcome"]["phase"].as_str(), Some("cancelled"));
    assert_eq!(
        value["outcome"]["cancelled_by"].as_str(),
        Some("well_known_change_password")
    );
    assert_eq!(value["redirect"].as_str(), Some("https://site.example/"));
}

#[test]
fn supported_change_password_commits() {
    let ws = Workspace::new();
    let stdout = ws.stdout(&[
        "navigate",
        "https://site.example/.well-known/change-password",
        "--probe-status",
        "404",
    ]);
    let value = extract_json(&stdout);
    assert_eq!(value["outcome"]["phase"].as_str(), Some("committed"));
    assert!(value["redirect"].is_null());
}

#[test]
fn subframe_transition_skips_change_password_check() {
    let ws = Workspace::new();
    let stdout = ws.stdout(&[
        "navigate",
        "https://site.example/.well-known/change-password",
        "--transition",
        "auto_subframe",
        "--probe-status",
        "200",
    ]);
    let value = extract_json(&stdout);
    assert_eq!(value["outcome"]["phase"].as_str(), Some("committed"));
    assert!(value["redirect"].is_null());
}
