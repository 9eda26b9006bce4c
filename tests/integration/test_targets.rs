//! Integration tests for `cargo fanout targets` and `build --dry-run`

use crate::helpers::{TestWorkspace, run_fanout, run_fanout_ok, stdout_json};
use anyhow::Result;

#[test]
fn test_targets_json_uses_package_binary() -> Result<()> {
  let ws = TestWorkspace::with_package("demo-app")?;

  let output = run_fanout_ok(&ws.path, &["targets", "--json"])?;
  let rows = stdout_json(&output)?;
  let rows = rows.as_array().expect("targets --json prints an array");

  let artifacts: Vec<_> = rows.iter().map(|r| r["artifact"].as_str().unwrap_or_default()).collect();
  assert_eq!(artifacts, vec!["demo-app-linux", "demo-app-windows.exe", "demo-app-macos"]);

  let keys: Vec<_> = rows.iter().map(|r| r["key"].as_str().unwrap_or_default()).collect();
  assert_eq!(keys, vec!["demo-app-linux", "demo-app-windows", "demo-app-macos"]);

  assert_eq!(rows[0]["precondition"]["name"], "native-deps");
  assert!(rows[1].get("precondition").is_none());

  Ok(())
}

#[test]
fn test_config_program_overrides_package() -> Result<()> {
  let ws = TestWorkspace::with_package("demo-app")?;
  ws.write_config("program = \"kill-zen-all\"\n")?;

  let output = run_fanout_ok(&ws.path, &["targets"])?;
  let stdout = String::from_utf8_lossy(&output.stdout);
  assert!(stdout.contains("kill-zen-all-windows.exe"), "got: {}", stdout);
  assert!(!stdout.contains("demo-app"));

  Ok(())
}

#[test]
fn test_targets_without_package_fails() -> Result<()> {
  let ws = TestWorkspace::empty()?;

  let output = run_fanout(&ws.path, &["targets"])?;
  assert_eq!(output.status.code(), Some(1));
  let stderr = String::from_utf8_lossy(&output.stderr);
  assert!(stderr.contains("program"), "got: {}", stderr);

  Ok(())
}

#[test]
fn test_invalid_config_is_reported() -> Result<()> {
  let ws = TestWorkspace::with_package("demo-app")?;
  ws.write_config("[build]\nunknown_key = 1\n")?;

  let output = run_fanout(&ws.path, &["targets"])?;
  assert_eq!(output.status.code(), Some(1));

  Ok(())
}

#[test]
fn test_release_dir_at_workspace_root_is_rejected() -> Result<()> {
  let ws = TestWorkspace::with_package("demo-app")?;
  ws.write_config("[release]\nrelease_dir = \".\"\n")?;

  let output = run_fanout(&ws.path, &["run", "--tag", "v1.2.0"])?;
  assert_eq!(output.status.code(), Some(1));
  assert!(String::from_utf8_lossy(&output.stderr).contains("release_dir"));
  assert!(ws.path.join("src/main.rs").is_file());
  assert!(ws.path.join("fanout.toml").is_file());

  Ok(())
}

#[test]
fn test_build_dry_run_linux_installs_native_deps_first() -> Result<()> {
  let ws = TestWorkspace::with_package("demo-app")?;

  let output = run_fanout_ok(&ws.path, &["build", "--target", "linux", "--dry-run", "--json"])?;
  let plan = stdout_json(&output)?;

  assert_eq!(plan["triple"], "x86_64-unknown-linux-gnu");
  assert_eq!(plan["artifact"], "demo-app-linux");

  let steps: Vec<_> = plan["steps"]
    .as_array()
    .expect("steps")
    .iter()
    .map(|s| s.as_str().unwrap_or_default().to_string())
    .collect();
  assert!(steps[0].starts_with("sudo apt-get update"));
  assert!(steps[1].contains("libxcb-xfixes0-dev"));
  assert!(steps[2].starts_with("cargo fetch --target x86_64-unknown-linux-gnu"));
  assert!(steps[3].starts_with("cargo build --release --target x86_64-unknown-linux-gnu"));
  assert!(steps[5].ends_with("demo-app-linux"));

  // Nothing was built
  assert!(!ws.path.join("target/fanout/store").exists());

  Ok(())
}

#[test]
fn test_build_unknown_target() -> Result<()> {
  let ws = TestWorkspace::with_package("demo-app")?;

  // Rejected by argument parsing, which lists the valid platforms
  let output = run_fanout(&ws.path, &["build", "--target", "solaris", "--dry-run"])?;
  assert_eq!(output.status.code(), Some(2));
  let stderr = String::from_utf8_lossy(&output.stderr);
  assert!(stderr.contains("solaris"), "got: {}", stderr);
  assert!(stderr.contains("linux, windows, macos"), "got: {}", stderr);

  Ok(())
}
