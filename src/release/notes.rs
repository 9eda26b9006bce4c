//! Release notes
//!
//! By default GitHub generates the notes from the commits since the previous
//! tag. With `generate_notes = false` the same summary is rendered locally
//! from `git log` and sent as the release body.

use crate::core::error::FanoutResult;
use crate::core::vcs::SystemGit;
use serde::Serialize;

/// Where the release body comes from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "source", content = "text", rename_all = "lowercase")]
pub enum ReleaseNotes {
  /// Let the release API generate notes
  Generated,
  /// Explicit markdown body
  Text(String),
}

/// Render markdown notes for `tag` from commit subjects
pub fn render_notes(tag: &str, previous: Option<&str>, subjects: &[String]) -> String {
  let mut notes = String::from("## What's Changed\n\n");

  if subjects.is_empty() {
    notes.push_str("No changes since the previous release.\n");
  } else {
    for subject in subjects {
      notes.push_str(&format!("* {}\n", subject));
    }
  }

  match previous {
    Some(prev) => notes.push_str(&format!("\n**Full Changelog**: {}...{}\n", prev, tag)),
    None => notes.push_str(&format!("\n**Full Changelog**: commits up to {}\n", tag)),
  }

  notes
}

/// Render notes for `tag` from the repository history
pub fn notes_from_history(git: &SystemGit, tag: &str) -> FanoutResult<String> {
  let previous = git.previous_tag(tag)?;
  let range = match previous {
    Some(ref prev) => format!("{}..{}", prev, tag),
    None => tag.to_string(),
  };
  let subjects = git.commit_subjects(&range)?;
  Ok(render_notes(tag, previous.as_deref(), &subjects))
}
