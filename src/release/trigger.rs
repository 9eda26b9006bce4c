//! Pipeline triggers
//!
//! A release only ever starts from a tag push whose tag matches the
//! configured pattern (`v*` by default). Branch pushes and pull requests
//! against the main branch start CI instead.

use crate::core::error::{FanoutError, FanoutResult, PublishError};
use crate::core::vcs::SystemGit;
use serde::Serialize;
use std::fmt;

/// The VCS event a pipeline run reacts to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum TriggerEvent {
  TagPush { tag: String },
  BranchPush { branch: String },
  PullRequest { base: String },
}

impl TriggerEvent {
  /// Parse a fully qualified git ref
  ///
  /// `event` is the hosting CI's event name (`push`, `pull_request`), and
  /// `base` the pull request's target branch when known.
  pub fn from_ref(git_ref: &str, event: Option<&str>, base: Option<&str>) -> FanoutResult<Self> {
    let is_pr = matches!(event, Some("pull_request") | Some("pull_request_target")) || git_ref.starts_with("refs/pull/");
    if is_pr {
      let base = base
        .filter(|b| !b.is_empty())
        .ok_or_else(|| FanoutError::with_help("Pull request base branch is unknown", "Pass --base <branch>."))?;
      return Ok(TriggerEvent::PullRequest {
        base: base.trim_start_matches("refs/heads/").to_string(),
      });
    }

    if let Some(tag) = git_ref.strip_prefix("refs/tags/") {
      return Ok(TriggerEvent::TagPush { tag: tag.to_string() });
    }
    if let Some(branch) = git_ref.strip_prefix("refs/heads/") {
      return Ok(TriggerEvent::BranchPush {
        branch: branch.to_string(),
      });
    }

    Err(FanoutError::with_help(
      format!("Unrecognized git ref '{}'", git_ref),
      "Use a fully qualified ref such as refs/tags/v1.2.0 or refs/heads/main, or pass --tag.",
    ))
  }

  /// Read the trigger from CI environment variables
  ///
  /// `GITHUB_REF`, `GITHUB_EVENT_NAME` and `GITHUB_BASE_REF` follow the
  /// GitHub Actions conventions.
  pub fn from_env<F>(var: F) -> FanoutResult<Option<Self>>
  where
    F: Fn(&str) -> Option<String>,
  {
    let Some(git_ref) = var("GITHUB_REF").filter(|r| !r.is_empty()) else {
      return Ok(None);
    };
    let event = var("GITHUB_EVENT_NAME");
    let base = var("GITHUB_BASE_REF");
    Self::from_ref(&git_ref, event.as_deref(), base.as_deref()).map(Some)
  }

  /// Infer from the local checkout: a tag at HEAD wins over the branch
  pub fn from_checkout(git: &SystemGit) -> FanoutResult<Self> {
    if let Some(tag) = git.tag_at_head()? {
      return Ok(TriggerEvent::TagPush { tag });
    }
    Ok(TriggerEvent::BranchPush {
      branch: git.current_branch()?,
    })
  }

  /// Tag name for tag pushes
  pub fn tag(&self) -> Option<&str> {
    match self {
      TriggerEvent::TagPush { tag } => Some(tag),
      _ => None,
    }
  }

  /// Push to main or pull request against main
  pub fn triggers_ci(&self, main_branch: &str) -> bool {
    match self {
      TriggerEvent::BranchPush { branch } => branch == main_branch,
      TriggerEvent::PullRequest { base } => base == main_branch,
      TriggerEvent::TagPush { .. } => false,
    }
  }
}

impl fmt::Display for TriggerEvent {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      TriggerEvent::TagPush { tag } => write!(f, "tag push {}", tag),
      TriggerEvent::BranchPush { branch } => write!(f, "push to {}", branch),
      TriggerEvent::PullRequest { base } => write!(f, "pull request against {}", base),
    }
  }
}

/// Glob a tag must match to start a release
#[derive(Debug, Clone)]
pub struct TagPattern {
  pattern: glob::Pattern,
}

impl TagPattern {
  pub fn new(pattern: &str) -> FanoutResult<Self> {
    Ok(Self {
      pattern: glob::Pattern::new(pattern)?,
    })
  }

  pub fn matches(&self, tag: &str) -> bool {
    self.pattern.matches(tag)
  }

  /// Tag push whose tag matches
  pub fn is_release_trigger(&self, event: &TriggerEvent) -> bool {
    event.tag().is_some_and(|tag| self.matches(tag))
  }

  pub fn as_str(&self) -> &str {
    self.pattern.as_str()
  }
}

/// Release guard: the tag to release, or why this event does not release
pub fn release_tag<'a>(event: &'a TriggerEvent, pattern: &TagPattern) -> Result<&'a str, PublishError> {
  let Some(tag) = event.tag() else {
    return Err(PublishError::NotTriggered {
      reason: format!("{} is not a tag push", event),
    });
  };

  if !pattern.matches(tag) {
    return Err(PublishError::NotTriggered {
      reason: format!("tag '{}' does not match '{}'", tag, pattern.as_str()),
    });
  }

  if semver::Version::parse(tag.trim_start_matches('v')).is_err() {
    log::warn!("tag '{}' is not a semantic version; releasing anyway", tag);
  }

  Ok(tag)
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::HashMap;

  #[test]
  fn test_parse_refs() {
    assert_eq!(
      TriggerEvent::from_ref("refs/tags/v1.2.0", None, None).unwrap(),
      TriggerEvent::TagPush {
        tag: "v1.2.0".to_string()
      }
    );
    assert_eq!(
      TriggerEvent::from_ref("refs/heads/main", Some("push"), None).unwrap(),
      TriggerEvent::BranchPush {
        branch: "main".to_string()
      }
    );
    assert_eq!(
      TriggerEvent::from_ref("refs/pull/42/merge", Some("pull_request"), Some("main")).unwrap(),
      TriggerEvent::PullRequest {
        base: "main".to_string()
      }
    );
    assert!(TriggerEvent::from_ref("v1.2.0", None, None).is_err());
    assert!(TriggerEvent::from_ref("refs/pull/42/merge", None, None).is_err());
  }

  #[test]
  fn test_from_env() {
    let vars: HashMap<&str, &str> = [("GITHUB_REF", "refs/tags/v2.0.0"), ("GITHUB_EVENT_NAME", "push")].into();
    let event = TriggerEvent::from_env(|k| vars.get(k).map(|v| v.to_string())).unwrap();
    assert_eq!(event.and_then(|e| e.tag().map(String::from)).as_deref(), Some("v2.0.0"));

    let none = TriggerEvent::from_env(|_| None).unwrap();
    assert!(none.is_none());
  }

  #[test]
  fn test_release_guard() {
    let pattern = TagPattern::new("v*").unwrap();

    let tag = TriggerEvent::TagPush {
      tag: "v1.2.0".to_string(),
    };
    assert_eq!(release_tag(&tag, &pattern).unwrap(), "v1.2.0");

    let other_tag = TriggerEvent::TagPush {
      tag: "nightly".to_string(),
    };
    assert!(matches!(
      release_tag(&other_tag, &pattern),
      Err(PublishError::NotTriggered { .. })
    ));

    let push = TriggerEvent::BranchPush {
      branch: "main".to_string(),
    };
    assert!(release_tag(&push, &pattern).is_err());

    let pr = TriggerEvent::PullRequest {
      base: "main".to_string(),
    };
    assert!(release_tag(&pr, &pattern).is_err());

    assert!(pattern.is_release_trigger(&tag));
    assert!(!pattern.is_release_trigger(&other_tag));
    assert!(!pattern.is_release_trigger(&push));
  }

  #[test]
  fn test_ci_trigger() {
    let main = "main";
    assert!(TriggerEvent::BranchPush { branch: "main".into() }.triggers_ci(main));
    assert!(!TriggerEvent::BranchPush { branch: "feature".into() }.triggers_ci(main));
    assert!(TriggerEvent::PullRequest { base: "main".into() }.triggers_ci(main));
    assert!(!TriggerEvent::PullRequest { base: "develop".into() }.triggers_ci(main));
    assert!(!TriggerEvent::TagPush { tag: "v1.0.0".into() }.triggers_ci(main));
  }
}
