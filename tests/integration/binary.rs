//! Runs the compiled binary for commands that need no model backend.

use std::process::Command;
use tempfile::TempDir;

fn sitesmith(dir: &TempDir) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_sitesmith"));
    cmd.env("XDG_CONFIG_HOME", dir.path().join("xdg"))
        .env("HOME", dir.path().join("home"))
        .env_remove("SITESMITH_LOG")
        .arg("--workspace")
        .arg(dir.path());
    cmd
}

#[test]
fn test_fallback_block_prints_json_on_stdout() {
    let dir = TempDir::new().unwrap();
    let output = sitesmith(&dir)
        .args(["fallback-block", "--type", "pricing", "--id", "plans"])
        .output()
        .unwrap();

    assert!(
        output.status.success(),
        "stderr={:?}",
        String::from_utf8_lossy(&output.stderr)
    );
    let block: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(block["type"], "Pricing");
    assert_eq!(block["props"]["anchor"], "plans");
}

#[test]
fn test_generate_without_prompt_fails() {
    let dir = TempDir::new().unwrap();
    let output = sitesmith(&dir)
        .args(["generate", "--no-checkpoint"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("--prompt"));
}
