//! Release bundle: the single request sent to the release API
//!
//! The file list is derived from the platform table, never from what happens
//! to be on disk, so a naming regression on the builder side shows up here
//! as a missing file instead of a silently smaller release.

use crate::core::error::PublishError;
use crate::platform::TARGETS;
use crate::release::notes::ReleaseNotes;
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// A draft release with one binary per platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReleaseBundle {
  pub tag: String,
  pub files: Vec<PathBuf>,
  pub draft: bool,
  pub prerelease: bool,
  pub notes: ReleaseNotes,
}

/// `<dir>/<program>-<os_id>/<program><suffix><ext>` for every platform, in table order
pub fn expected_release_files(program: &str, dir: &Path) -> Vec<PathBuf> {
  TARGETS
    .iter()
    .map(|t| dir.join(t.artifact_key(program).as_str()).join(t.artifact_file_name(program)))
    .collect()
}

impl ReleaseBundle {
  /// Bundle for the files a publish would attach, without touching disk
  pub fn planned(tag: &str, program: &str, dir: &Path, notes: ReleaseNotes) -> Self {
    Self {
      tag: tag.to_string(),
      files: expected_release_files(program, dir),
      draft: true,
      prerelease: false,
      notes,
    }
  }

  /// Bundle whose files all exist, are non-empty and distinct
  pub fn assemble(tag: &str, program: &str, dir: &Path, notes: ReleaseNotes) -> Result<Self, PublishError> {
    let bundle = Self::planned(tag, program, dir, notes);

    for file in &bundle.files {
      let len = file
        .metadata()
        .map_err(|_| PublishError::MissingFile { path: file.clone() })?
        .len();
      if len == 0 {
        return Err(PublishError::Rejected {
          code: None,
          stderr: format!("{} is empty", file.display()),
        });
      }
    }

    let distinct: HashSet<_> = bundle.files.iter().collect();
    if distinct.len() != TARGETS.len() {
      return Err(PublishError::Rejected {
        code: None,
        stderr: format!(
          "expected {} distinct release files, found {}",
          TARGETS.len(),
          distinct.len()
        ),
      });
    }

    Ok(bundle)
  }

  /// Release file names, in attach order
  pub fn file_names(&self) -> Vec<String> {
    self
      .files
      .iter()
      .filter_map(|f| f.file_name().map(|n| n.to_string_lossy().to_string()))
      .collect()
  }
}
