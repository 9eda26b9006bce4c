//! Test helpers for integration tests

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// CI variables that would otherwise leak the host's trigger into a test
const CI_VARS: &[&str] = &["GITHUB_REF", "GITHUB_EVENT_NAME", "GITHUB_BASE_REF"];

/// A scratch directory, optionally a git repository with a binary package
pub struct TestWorkspace {
  _root: TempDir,
  pub path: PathBuf,
}

impl TestWorkspace {
  /// Empty directory: no git, no Cargo.toml
  pub fn empty() -> Result<Self> {
    let root = TempDir::new()?;
    let path = root.path().to_path_buf();
    Ok(Self { _root: root, path })
  }

  /// Git repository holding a single binary package named `name`
  pub fn with_package(name: &str) -> Result<Self> {
    let ws = Self::empty()?;
    let path = &ws.path;

    git(path, &["init", "--initial-branch=main"])?;
    git(path, &["config", "user.name", "Test User"])?;
    git(path, &["config", "user.email", "test@example.com"])?;

    std::fs::write(
      path.join("Cargo.toml"),
      format!(
        r#"[package]
name = "{}"
version = "0.1.0"
edition = "2021"

[dependencies]
"#,
        name
      ),
    )?;
    std::fs::create_dir_all(path.join("src"))?;
    std::fs::write(path.join("src/main.rs"), "fn main() {\n    println!(\"hello\");\n}\n")?;

    git(path, &["add", "."])?;
    git(path, &["commit", "-m", "Initial commit"])?;

    Ok(ws)
  }

  /// Write fanout.toml
  pub fn write_config(&self, content: &str) -> Result<()> {
    std::fs::write(self.path.join("fanout.toml"), content)?;
    Ok(())
  }

  pub fn read_file(&self, path: &str) -> Result<String> {
    Ok(std::fs::read_to_string(self.path.join(path))?)
  }
}

/// Run git command in a directory
pub fn git(cwd: &Path, args: &[&str]) -> Result<Output> {
  let output = Command::new("git")
    .current_dir(cwd)
    .args(args)
    .output()
    .context("Failed to run git command")?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    anyhow::bail!("Git command failed: git {}\n{}", args.join(" "), stderr);
  }

  Ok(output)
}

/// Run `cargo fanout <args>` and return its output, whatever the exit status
pub fn run_fanout(cwd: &Path, args: &[&str]) -> Result<Output> {
  let bin = env!("CARGO_BIN_EXE_cargo-fanout");

  let mut cmd = Command::new(bin);
  cmd.current_dir(cwd).arg("fanout").args(args);
  for var in CI_VARS {
    cmd.env_remove(var);
  }

  cmd.output().context("Failed to run cargo-fanout")
}

/// Run `cargo fanout <args>` and fail unless it exits successfully
pub fn run_fanout_ok(cwd: &Path, args: &[&str]) -> Result<Output> {
  let output = run_fanout(cwd, args)?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    anyhow::bail!(
      "cargo-fanout command failed: cargo fanout {}\nstdout: {}\nstderr: {}",
      args.join(" "),
      stdout,
      stderr
    );
  }

  Ok(output)
}

/// Parse stdout as JSON
pub fn stdout_json(output: &Output) -> Result<serde_json::Value> {
  serde_json::from_slice(&output.stdout).context("stdout is not valid JSON")
}
