//! Integration tests for `cargo fanout gate`, `ci` and `hooks install`

use crate::helpers::{TestWorkspace, run_fanout, run_fanout_ok};
use anyhow::Result;

#[test]
fn test_pre_push_stops_at_format_check() -> Result<()> {
  // No Cargo.toml, so `cargo fmt --check` cannot succeed
  let ws = TestWorkspace::empty()?;

  let output = run_fanout(&ws.path, &["gate", "pre-push"])?;
  assert_eq!(output.status.code(), Some(3));

  let stdout = String::from_utf8_lossy(&output.stdout);
  let stderr = String::from_utf8_lossy(&output.stderr);
  assert!(stdout.contains("format-check"), "got: {}", stdout);
  assert!(!stdout.contains("clippy"), "lint must not run: {}", stdout);
  assert!(!stdout.contains("cargo test"), "test must not run: {}", stdout);
  assert!(stderr.contains("stage 'format-check'"), "got: {}", stderr);

  Ok(())
}

#[test]
fn test_ci_skips_feature_branch() -> Result<()> {
  let ws = TestWorkspace::empty()?;

  let output = run_fanout_ok(&ws.path, &["ci", "--ref", "refs/heads/feature/x", "--event", "push"])?;
  let stdout = String::from_utf8_lossy(&output.stdout);
  assert!(stdout.contains("does not trigger CI"), "got: {}", stdout);

  Ok(())
}

#[test]
fn test_ci_pull_request_needs_base() -> Result<()> {
  let ws = TestWorkspace::empty()?;

  let output = run_fanout(&ws.path, &["ci", "--ref", "refs/pull/3/merge", "--event", "pull_request"])?;
  assert!(!output.status.success());
  let stderr = String::from_utf8_lossy(&output.stderr);
  assert!(stderr.contains("--base"), "got: {}", stderr);

  Ok(())
}

#[test]
fn test_hooks_install() -> Result<()> {
  let ws = TestWorkspace::with_package("program")?;

  run_fanout_ok(&ws.path, &["hooks", "install"])?;

  let pre_commit = ws.read_file(".git/hooks/pre-commit")?;
  let pre_push = ws.read_file(".git/hooks/pre-push")?;
  assert!(pre_commit.contains("exec cargo fanout gate pre-commit"));
  assert!(pre_push.contains("exec cargo fanout gate pre-push"));
  assert!(pre_push.contains("# managed by cargo-fanout"));

  // Installing again over our own hooks is fine
  run_fanout_ok(&ws.path, &["hooks", "install"])?;

  Ok(())
}

#[test]
fn test_hooks_install_refuses_foreign_hook() -> Result<()> {
  let ws = TestWorkspace::with_package("program")?;
  let hooks = ws.path.join(".git/hooks");
  std::fs::create_dir_all(&hooks)?;
  std::fs::write(hooks.join("pre-commit"), "#!/bin/sh\nnpm run lint\n")?;

  let output = run_fanout(&ws.path, &["hooks", "install"])?;
  assert_eq!(output.status.code(), Some(1));
  assert_eq!(ws.read_file(".git/hooks/pre-commit")?, "#!/bin/sh\nnpm run lint\n");

  run_fanout_ok(&ws.path, &["hooks", "install", "--force"])?;
  assert!(ws.read_file(".git/hooks/pre-commit")?.contains("cargo fanout gate pre-commit"));

  Ok(())
}
