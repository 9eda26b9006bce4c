//! Integration tests for `cargo fanout run` and `publish`

use crate::helpers::{TestWorkspace, git, run_fanout, run_fanout_ok, stdout_json};
use anyhow::Result;

#[test]
fn test_run_dry_run_for_release_tag() -> Result<()> {
  let ws = TestWorkspace::with_package("program")?;

  let output = run_fanout_ok(&ws.path, &["run", "--tag", "v1.2.0", "--dry-run", "--json"])?;
  let plan = stdout_json(&output)?;

  assert_eq!(plan["triggered"], true);
  assert_eq!(plan["tag"], "v1.2.0");
  assert_eq!(plan["builds"].as_array().map(Vec::len), Some(3));

  let release = &plan["release"];
  assert_eq!(release["draft"], true);
  assert_eq!(release["prerelease"], false);

  let files: Vec<_> = release["files"]
    .as_array()
    .expect("files")
    .iter()
    .map(|f| f.as_str().unwrap_or_default().replace('\\', "/"))
    .collect();
  assert_eq!(files.len(), 3);
  assert!(files[0].ends_with("program-linux/program-linux"));
  assert!(files[1].ends_with("program-windows/program-windows.exe"));
  assert!(files[2].ends_with("program-macos/program-macos"));

  let command = plan["release_command"].as_str().unwrap_or_default();
  assert!(command.starts_with("gh release create v1.2.0"));
  assert!(command.contains("--draft"));
  assert!(command.contains("--generate-notes"));

  Ok(())
}

#[test]
fn test_run_branch_push_does_not_release() -> Result<()> {
  let ws = TestWorkspace::with_package("program")?;

  let output = run_fanout_ok(&ws.path, &["run", "--ref", "refs/heads/main", "--event", "push"])?;
  let stdout = String::from_utf8_lossy(&output.stdout);
  assert!(stdout.contains("does not trigger a release"), "got: {}", stdout);
  assert!(!ws.path.join("target/fanout").exists());

  Ok(())
}

#[test]
fn test_run_non_matching_tag_does_not_release() -> Result<()> {
  let ws = TestWorkspace::with_package("program")?;

  let output = run_fanout_ok(&ws.path, &["run", "--tag", "nightly", "--dry-run", "--json"])?;
  let plan = stdout_json(&output)?;
  assert_eq!(plan["triggered"], false);
  assert!(plan.get("release").is_none());

  Ok(())
}

#[test]
fn test_run_trigger_from_checkout_tag() -> Result<()> {
  let ws = TestWorkspace::with_package("program")?;
  git(&ws.path, &["tag", "v0.3.0"])?;

  let output = run_fanout_ok(&ws.path, &["run", "--dry-run", "--json"])?;
  let plan = stdout_json(&output)?;
  assert_eq!(plan["tag"], "v0.3.0");

  Ok(())
}

#[test]
fn test_custom_tag_pattern() -> Result<()> {
  let ws = TestWorkspace::with_package("program")?;
  ws.write_config("[release]\ntag_pattern = \"release-*\"\n")?;

  let v_tag = stdout_json(&run_fanout_ok(&ws.path, &["run", "--tag", "v1.0.0", "--dry-run", "--json"])?)?;
  assert_eq!(v_tag["triggered"], false);

  let release_tag = stdout_json(&run_fanout_ok(
    &ws.path,
    &["run", "--tag", "release-1.0.0", "--dry-run", "--json"],
  )?)?;
  assert_eq!(release_tag["triggered"], true);

  Ok(())
}

#[test]
fn test_publish_with_empty_store_fails() -> Result<()> {
  let ws = TestWorkspace::with_package("program")?;

  let output = run_fanout(&ws.path, &["publish", "--tag", "v1.2.0"])?;
  assert_eq!(output.status.code(), Some(3));

  let stderr = String::from_utf8_lossy(&output.stderr);
  assert!(stderr.contains("program-linux"), "got: {}", stderr);
  assert!(stderr.contains("program-windows"));
  assert!(stderr.contains("program-macos"));

  Ok(())
}

#[test]
fn test_publish_with_partial_store_fails() -> Result<()> {
  let ws = TestWorkspace::with_package("program")?;
  let store = ws.path.join("shared-store");
  for (key, file) in [("program-windows", "program-windows.exe"), ("program-macos", "program-macos")] {
    std::fs::create_dir_all(store.join(key))?;
    std::fs::write(store.join(key).join(file), b"binary")?;
  }

  let store_arg = store.to_string_lossy().to_string();
  let output = run_fanout(&ws.path, &["publish", "--tag", "v1.2.0", "--store", &store_arg])?;
  assert_eq!(output.status.code(), Some(3));

  let stderr = String::from_utf8_lossy(&output.stderr);
  assert!(stderr.contains("program-linux"), "got: {}", stderr);
  assert!(!stderr.contains("program-windows"), "only the missing key is listed: {}", stderr);

  Ok(())
}

#[test]
fn test_publish_skips_non_tag_events() -> Result<()> {
  let ws = TestWorkspace::with_package("program")?;

  let output = run_fanout_ok(&ws.path, &["publish", "--ref", "refs/heads/main", "--json"])?;
  let skipped = stdout_json(&output)?;
  assert_eq!(skipped["published"], false);

  Ok(())
}
