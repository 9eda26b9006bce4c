//! System git backend
//!
//! Only the handful of read operations the pipeline needs: resolving the
//! triggering ref, walking commits since the previous tag for release notes,
//! and locating the hooks directory.

use crate::core::error::{FanoutError, FanoutResult, GitError, ResultExt};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Git backend using system git
pub struct SystemGit {
  /// Working tree root
  pub(crate) repo_path: PathBuf,
}

impl SystemGit {
  /// Open a git repository
  pub fn open(path: &Path) -> FanoutResult<Self> {
    let output = Command::new("git")
      .arg("-C")
      .arg(path)
      .args(["rev-parse", "--show-toplevel"])
      .output()
      .context("Failed to execute git rev-parse")?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      if stderr.contains("not a git repository") {
        return Err(FanoutError::Git(GitError::RepoNotFound {
          path: path.to_path_buf(),
        }));
      }
      return Err(FanoutError::message(format!("Failed to open git repository: {}", stderr)));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    Ok(Self {
      repo_path: PathBuf::from(stdout.trim()),
    })
  }

  /// Get current branch name
  pub fn current_branch(&self) -> FanoutResult<String> {
    match self.run(&["rev-parse", "--abbrev-ref", "HEAD"]) {
      Ok(branch) => Ok(branch),
      Err(_) => Ok("HEAD".to_string()), // Detached HEAD
    }
  }

  /// Tag pointing exactly at HEAD, if any
  pub fn tag_at_head(&self) -> FanoutResult<Option<String>> {
    Ok(self.run(&["describe", "--tags", "--exact-match", "HEAD"]).ok())
  }

  /// Most recent tag reachable from the parent of `tag`
  pub fn previous_tag(&self, tag: &str) -> FanoutResult<Option<String>> {
    let parent = format!("{}^", tag);
    Ok(self.run(&["describe", "--tags", "--abbrev=0", &parent]).ok())
  }

  /// Commit subjects in `range` (`a..b` or a single ref), newest first
  pub fn commit_subjects(&self, range: &str) -> FanoutResult<Vec<String>> {
    let output = self.run(&["log", "--no-merges", "--format=%s", range])?;
    Ok(output.lines().filter(|l| !l.is_empty()).map(String::from).collect())
  }

  /// Directory git runs hooks from (honours core.hooksPath)
  pub fn hooks_dir(&self) -> FanoutResult<PathBuf> {
    let path = PathBuf::from(self.run(&["rev-parse", "--git-path", "hooks"])?);
    if path.is_absolute() {
      Ok(path)
    } else {
      Ok(self.repo_path.join(path))
    }
  }

  /// Run git and return trimmed stdout
  fn run(&self, args: &[&str]) -> FanoutResult<String> {
    let output = self
      .git_cmd()
      .args(args)
      .output()
      .with_context(|| format!("Failed to execute git {}", args.join(" ")))?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      return Err(FanoutError::Git(GitError::CommandFailed {
        command: format!("git {}", args.join(" ")),
        stderr: stderr.trim().to_string(),
      }));
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
  }

  /// Create a safe git command with isolated environment
  ///
  /// - Sets working directory to repo path
  /// - Clears environment variables
  /// - Whitelists only PATH and HOME
  /// - Adds safe configuration overrides
  pub(crate) fn git_cmd(&self) -> Command {
    let mut cmd = Command::new("git");

    // Set working directory
    cmd.arg("-C").arg(&self.repo_path);

    // Isolated environment (don't trust global config)
    cmd.env_clear();
    if let Ok(path) = std::env::var("PATH") {
      cmd.env("PATH", path);
    }
    if let Ok(home) = std::env::var("HOME") {
      cmd.env("HOME", home);
    }

    cmd.arg("-c").arg("advice.detachedHead=false");
    cmd.arg("-c").arg("core.quotePath=false"); // Don't escape non-ASCII

    cmd
  }
}
