//! CLI commands for cargo-fanout
//!
//! ## Release pipeline
//! - **targets**: Show the platform table and artifact names
//! - **build**: Run one platform builder into the shared store
//! - **publish**: Join the store and create the draft release
//! - **run**: Whole pipeline (fan out, join, publish) in one process
//!
//! ## Quality gates
//! - **gate**: Run the pre-commit, pre-push or ci gate
//! - **ci**: Run the ci gate when the trigger asks for it
//! - **hooks**: Install the git hooks that call `gate`
//!
//! All commands accept `&PipelineContext` to avoid redundant loads.

pub mod build;
pub mod gate;
pub mod publish;
pub mod run;
pub mod targets;

pub use build::run_build;
pub use gate::{run_ci, run_gate, run_hooks_install};
pub use publish::run_publish;
pub use run::run_pipeline;
pub use targets::run_targets;

use crate::core::context::PipelineContext;
use crate::core::error::{FanoutError, FanoutResult};
use crate::core::vcs::SystemGit;
use crate::release::notes::{ReleaseNotes, notes_from_history};
use crate::release::trigger::TriggerEvent;
use clap::Args;
use serde::Serialize;

/// Where the pipeline's trigger comes from
///
/// Explicit flags win, then the CI environment (`GITHUB_REF`,
/// `GITHUB_EVENT_NAME`, `GITHUB_BASE_REF`), then the local checkout.
#[derive(Debug, Clone, Default, Args)]
pub struct TriggerArgs {
  /// Tag to release (shorthand for --ref refs/tags/<TAG>)
  #[arg(long, conflicts_with = "git_ref")]
  pub tag: Option<String>,
  /// Fully qualified git ref, e.g. refs/tags/v1.2.0 or refs/heads/main
  #[arg(long = "ref", value_name = "REF")]
  pub git_ref: Option<String>,
  /// CI event name, e.g. push or pull_request
  #[arg(long)]
  pub event: Option<String>,
  /// Pull request base branch
  #[arg(long)]
  pub base: Option<String>,
}

impl TriggerArgs {
  pub fn resolve(&self, ctx: &PipelineContext) -> FanoutResult<TriggerEvent> {
    self.resolve_with(ctx, |key| std::env::var(key).ok())
  }

  fn resolve_with<F>(&self, ctx: &PipelineContext, var: F) -> FanoutResult<TriggerEvent>
  where
    F: Fn(&str) -> Option<String>,
  {
    if let Some(ref tag) = self.tag {
      return Ok(TriggerEvent::TagPush { tag: tag.clone() });
    }

    if let Some(ref git_ref) = self.git_ref {
      let event = self.event.clone().or_else(|| var("GITHUB_EVENT_NAME"));
      let base = self.base.clone().or_else(|| var("GITHUB_BASE_REF"));
      return TriggerEvent::from_ref(git_ref, event.as_deref(), base.as_deref());
    }

    if let Some(event) = TriggerEvent::from_env(&var)? {
      log::debug!("trigger from environment: {}", event);
      return Ok(event);
    }

    let git = SystemGit::open(ctx.workspace_root()).map_err(|e| {
      FanoutError::with_help(
        format!("Cannot determine the trigger: {}", e),
        "Pass --tag <TAG> or --ref <REF>, or set GITHUB_REF.",
      )
    })?;
    let event = TriggerEvent::from_checkout(&git)?;
    log::debug!("trigger from checkout: {}", event);
    Ok(event)
  }
}

/// Release notes for `tag` as configured
pub fn release_notes(ctx: &PipelineContext, tag: Option<&str>) -> FanoutResult<ReleaseNotes> {
  match tag {
    Some(tag) if !ctx.config.release.generate_notes => {
      let git = SystemGit::open(ctx.workspace_root())?;
      Ok(ReleaseNotes::Text(notes_from_history(&git, tag)?))
    }
    _ => Ok(ReleaseNotes::Generated),
  }
}

/// Print `value` as pretty JSON
pub fn print_json<T: Serialize>(value: &T) -> FanoutResult<()> {
  println!(
    "{}",
    serde_json::to_string_pretty(value).map_err(|e| FanoutError::message(format!("Serialization error: {}", e)))?
  );
  Ok(())
}
