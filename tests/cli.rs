//! End-to-end tests of the `pfd` binary.
//!
//! Each test builds a scratch config and database under a TempDir and runs
//! the real binary. No provider credential is configured, so sync exercises
//! the resilient empty-discovery path rather than the network.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn pfd_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("pfd");
    path
}

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let config_content = format!(
        r#"[db]
path = "{}/data/proofdeck.sqlite"

[provider]
root_folder_id = "root-folder"
root_name = "Gallery"

[sync]
max_parallel_requests = 4

[server]
bind = "127.0.0.1:7431"
"#,
        root.display()
    );

    let config_path = config_dir.join("proofdeck.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_pfd(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = pfd_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .env_remove("PROOFDECK_DRIVE_API_KEY")
        .output()
        .unwrap_or_else(|e| panic!("Failed to run pfd binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

#[test]
fn test_init_creates_database() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_pfd(&config_path, &["init"]);
    assert!(success, "init failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("initialized"));
}

#[test]
fn test_init_idempotent() {
    let (_tmp, config_path) = setup_test_env();

    let (_, _, success1) = run_pfd(&config_path, &["init"]);
    assert!(success1, "First init failed");

    let (_, _, success2) = run_pfd(&config_path, &["init"]);
    assert!(success2, "Second init failed (not idempotent)");
}

#[test]
fn test_sync_without_credential_is_empty_but_succeeds() {
    let (_tmp, config_path) = setup_test_env();

    run_pfd(&config_path, &["init"]);
    let (stdout, stderr, success) = run_pfd(&config_path, &["sync", "alice"]);
    assert!(success, "sync failed: stdout={}, stderr={}", stdout, stderr);
    // No API key: the walk yields an empty tree instead of failing
    assert!(stdout.contains("synced: 0"));
    assert!(stdout.contains("errors: 0"));
    assert!(stdout.contains("ok"));
    assert!(stderr.contains("API key not configured"));
}

#[test]
fn test_sync_dry_run_reports_counts_only() {
    let (_tmp, config_path) = setup_test_env();

    run_pfd(&config_path, &["init"]);
    let (stdout, _, success) = run_pfd(&config_path, &["sync", "alice", "--dry-run"]);
    assert!(success);
    assert!(stdout.contains("(dry-run)"));
    assert!(stdout.contains("groups found: 0"));
    assert!(stdout.contains("assets found: 0"));
}

#[test]
fn test_sync_without_any_root_fails() {
    let (_tmp, config_path) = setup_test_env();

    // Rewrite the config without a default root folder
    let content = fs::read_to_string(&config_path).unwrap();
    let content = content.replace("root_folder_id = \"root-folder\"\n", "");
    fs::write(&config_path, content).unwrap();

    run_pfd(&config_path, &["init"]);
    let (_, stderr, success) = run_pfd(&config_path, &["sync", "alice"]);
    assert!(!success);
    assert!(stderr.contains("no root folder configured"));
}

#[test]
fn test_profile_set_show_and_merge() {
    let (_tmp, config_path) = setup_test_env();

    run_pfd(&config_path, &["init"]);
    let (stdout, _, success) = run_pfd(
        &config_path,
        &["profile", "alice", "--limit", "25", "--root-folder", "folder9"],
    );
    assert!(success);
    assert!(stdout.contains("selection_limit: 25"));
    assert!(stdout.contains("root_folder_id: folder9"));

    // Updating only the limit keeps the root folder
    let (stdout, _, success) = run_pfd(&config_path, &["profile", "alice", "--limit", "30"]);
    assert!(success);
    assert!(stdout.contains("selection_limit: 30"));
    assert!(stdout.contains("root_folder_id: folder9"));
}

#[test]
fn test_profile_show_unknown_owner() {
    let (_tmp, config_path) = setup_test_env();

    run_pfd(&config_path, &["init"]);
    let (stdout, _, success) = run_pfd(&config_path, &["profile", "bob"]);
    assert!(success);
    assert!(stdout.contains("no profile for bob"));
}

#[test]
fn test_resume_save_and_show() {
    let (_tmp, config_path) = setup_test_env();

    run_pfd(&config_path, &["init"]);
    let (stdout, _, success) = run_pfd(
        &config_path,
        &["resume", "alice", "--index", "7", "--asset", "asset42"],
    );
    assert!(success);
    assert!(stdout.contains("ok"));

    let (stdout, _, success) = run_pfd(&config_path, &["resume", "alice"]);
    assert!(success);
    assert!(stdout.contains("index: 7"));
    assert!(stdout.contains("asset: asset42"));

    let (stdout, _, success) = run_pfd(&config_path, &["resume", "bob"]);
    assert!(success);
    assert!(stdout.contains("no saved position for bob"));
}

#[test]
fn test_classify_unknown_asset_fails() {
    let (_tmp, config_path) = setup_test_env();

    run_pfd(&config_path, &["init"]);
    let (_, stderr, success) = run_pfd(&config_path, &["classify", "alice", "ghost", "selected"]);
    assert!(!success);
    assert!(stderr.contains("no catalog record"));
}

#[test]
fn test_classify_rejects_unknown_category() {
    let (_tmp, config_path) = setup_test_env();

    run_pfd(&config_path, &["init"]);
    let (_, stderr, success) = run_pfd(&config_path, &["classify", "alice", "a1", "rejected"]);
    assert!(!success);
    assert!(stderr.contains("unknown category"));
}

#[test]
fn test_export_empty_bucket_prints_header() {
    let (_tmp, config_path) = setup_test_env();

    run_pfd(&config_path, &["init"]);
    let (stdout, _, success) = run_pfd(&config_path, &["export", "alice", "selected"]);
    assert!(success);
    assert!(stdout.contains("asset_id,path,display_url,category,discovered_at"));
}

#[test]
fn test_catalog_empty_listing() {
    let (_tmp, config_path) = setup_test_env();

    run_pfd(&config_path, &["init"]);
    let (stdout, _, success) = run_pfd(&config_path, &["catalog", "alice"]);
    assert!(success);
    assert!(stdout.contains("0 assets, 0 selected (limit 150)"));
}
