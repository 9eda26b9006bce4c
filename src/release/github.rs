//! GitHub release creation via gh CLI

use crate::core::error::PublishError;
use crate::core::exec::{CommandRunner, CommandSpec};
use crate::release::bundle::ReleaseBundle;
use crate::release::notes::ReleaseNotes;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// A release the API accepted
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishedRelease {
  pub tag: String,
  pub url: Option<String>,
  pub files: Vec<String>,
  pub draft: bool,
}

/// Release API seam
pub trait ReleaseApi: Sync {
  /// Create one release for `bundle`. Called at most once per run.
  fn create_release(&self, bundle: &ReleaseBundle) -> Result<PublishedRelease, PublishError>;

  /// What `create_release` would do, for dry runs
  fn describe(&self, bundle: &ReleaseBundle) -> String {
    format!("create draft release {} with {} files", bundle.tag, bundle.files.len())
  }
}

/// Creates releases with `gh release create`
pub struct GhCliApi<'a> {
  runner: &'a dyn CommandRunner,
  cwd: PathBuf,
  repo: Option<String>,
}

impl<'a> GhCliApi<'a> {
  pub fn new(runner: &'a dyn CommandRunner, cwd: &Path, repo: Option<String>) -> Self {
    Self {
      runner,
      cwd: cwd.to_path_buf(),
      repo,
    }
  }

  /// `gh release create <tag> <files..> --verify-tag --draft --title <tag> ...`
  pub fn command(&self, bundle: &ReleaseBundle) -> CommandSpec {
    let mut cmd = CommandSpec::new("gh", &self.cwd)
      .args(["release", "create", bundle.tag.as_str()])
      .args(bundle.files.iter().map(|f| f.to_string_lossy().to_string()))
      // Never let gh create a missing tag from the default branch
      .arg("--verify-tag")
      .args(["--title", bundle.tag.as_str()]);

    if bundle.draft {
      cmd = cmd.arg("--draft");
    }
    if bundle.prerelease {
      cmd = cmd.arg("--prerelease");
    }

    cmd = match &bundle.notes {
      ReleaseNotes::Generated => cmd.arg("--generate-notes"),
      ReleaseNotes::Text(text) => cmd.arg("--notes").arg(text.as_str()),
    };

    if let Some(ref repo) = self.repo {
      cmd = cmd.args(["--repo", repo.as_str()]);
    }

    cmd
  }
}

impl ReleaseApi for GhCliApi<'_> {
  fn create_release(&self, bundle: &ReleaseBundle) -> Result<PublishedRelease, PublishError> {
    let cmd = self.command(bundle);
    log::debug!("{}", cmd);

    let output = self.runner.run(&cmd).map_err(|e| PublishError::Rejected {
      code: None,
      stderr: e.to_string(),
    })?;

    if !output.success() {
      return Err(classify_failure(&bundle.tag, output.code, &output.stderr));
    }

    // gh prints the release URL as the last line of stdout
    let url = output
      .stdout
      .lines()
      .rev()
      .map(str::trim)
      .find(|l| l.starts_with("https://"))
      .map(String::from);

    Ok(PublishedRelease {
      tag: bundle.tag.clone(),
      url,
      files: bundle.file_names(),
      draft: bundle.draft,
    })
  }

  fn describe(&self, bundle: &ReleaseBundle) -> String {
    self.command(bundle).to_string()
  }
}

/// Map gh's stderr onto the publish error taxonomy
pub fn classify_failure(tag: &str, code: Option<i32>, stderr: &str) -> PublishError {
  let lower = stderr.to_lowercase();

  if lower.contains("gh auth login")
    || lower.contains("authentication")
    || lower.contains("http 401")
    || lower.contains("bad credentials")
  {
    return PublishError::Auth {
      stderr: stderr.to_string(),
    };
  }

  if lower.contains("already exists") {
    return PublishError::DuplicateTag { tag: tag.to_string() };
  }

  if lower.contains("no such file") || (lower.contains("does not exist") && !lower.contains("tag")) {
    let path = stderr
      .split_whitespace()
      .find(|w| w.contains('/') || w.contains('\\'))
      .map(|w| PathBuf::from(w.trim_matches(|c| c == '"' || c == '\'' || c == ':')))
      .unwrap_or_default();
    return PublishError::MissingFile { path };
  }

  PublishError::Rejected {
    code,
    stderr: stderr.to_string(),
  }
}
