//! `cargo fanout publish` - Join the store and create the draft release
//!
//! Reads the store the `build` jobs wrote. Nothing is sent to the release
//! API unless the trigger is a matching tag push and every platform key is
//! present. The store is removed after the release is created.

use crate::commands::{TriggerArgs, print_json, release_notes};
use crate::core::context::PipelineContext;
use crate::core::error::{FanoutError, FanoutResult, PublishError};
use crate::core::exec::SystemRunner;
use crate::release::github::{GhCliApi, ReleaseApi};
use crate::release::publisher::Publisher;
use crate::release::trigger::{TagPattern, release_tag};
use crate::store::ArtifactStore;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Serialize)]
struct Skipped {
  published: bool,
  reason: String,
}

/// Run the publish command
pub fn run_publish(
  ctx: &PipelineContext,
  trigger: TriggerArgs,
  store_dir: Option<PathBuf>,
  dry_run: bool,
  json: bool,
) -> FanoutResult<()> {
  let event = trigger.resolve(ctx)?;
  let pattern = TagPattern::new(&ctx.config.release.tag_pattern)?;

  let tag = match release_tag(&event, &pattern) {
    Ok(tag) => tag,
    Err(PublishError::NotTriggered { reason }) => {
      if json {
        return print_json(&Skipped {
          published: false,
          reason,
        });
      }
      println!("⏭️  Nothing to publish: {}", reason);
      return Ok(());
    }
    Err(e) => return Err(FanoutError::Publish(e)),
  };

  let runner = SystemRunner;
  let api = GhCliApi::new(&runner, ctx.workspace_root(), ctx.config.release.repo.clone());
  let notes = release_notes(ctx, Some(tag))?;
  let publisher = Publisher::new(&api, ctx.program()?, pattern, &ctx.release_dir(), notes);

  if dry_run {
    let bundle = publisher.planned_bundle(tag);
    if json {
      return print_json(&bundle);
    }
    println!("DRY RUN: Would publish {}:", tag);
    for file in &bundle.files {
      println!("  📦 {}", file.display());
    }
    println!("  {}", api.describe(&bundle));
    return Ok(());
  }

  let store = ArtifactStore::open(&store_dir.unwrap_or_else(|| ctx.store_dir()));
  let release = publisher.publish(&event, store)?;

  if json {
    return print_json(&release);
  }
  println!("✅ Draft release {} created with {} files", release.tag, release.files.len());
  if let Some(url) = release.url {
    println!("   {}", url);
  }
  Ok(())
}
