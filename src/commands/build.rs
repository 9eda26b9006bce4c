//! `cargo fanout build` - Run one platform builder
//!
//! This is the unit a CI matrix job runs: one platform, one artifact, put
//! into the store directory that the publishing job later reads.

use crate::build::builder::PlatformBuilder;
use crate::commands::print_json;
use crate::core::context::PipelineContext;
use crate::core::error::FanoutResult;
use crate::core::exec::SystemRunner;
use crate::platform::{OsId, find_target};
use crate::store::ArtifactStore;
use crate::ui::progress::MultiProgress;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Serialize)]
struct BuildSummary {
  os_id: OsId,
  key: String,
  artifact: PathBuf,
  size: u64,
}

/// Run the build command
pub fn run_build(
  ctx: &PipelineContext,
  os_id: OsId,
  store_dir: Option<PathBuf>,
  dry_run: bool,
  json: bool,
) -> FanoutResult<()> {
  let target = find_target(os_id);
  let runner = SystemRunner;
  let builder = PlatformBuilder::new(&runner, ctx)?;
  let plan = builder.plan(target);

  if dry_run {
    if json {
      return print_json(&plan.view(builder.program()));
    }
    println!("DRY RUN: Would execute for {} ({}):", os_id, target.triple);
    for (idx, step) in plan.describe().iter().enumerate() {
      println!("  {}. {}", idx + 1, step);
    }
    return Ok(());
  }

  let store_dir = store_dir.unwrap_or_else(|| ctx.store_dir());
  let store = ArtifactStore::create(&store_dir)?;

  if !json {
    println!("🔨 Building {} for {}", builder.program(), target.triple);
  }
  let progress = if json { None } else { Some(MultiProgress::new()) };
  let bar = progress
    .as_ref()
    .and_then(|p| p.add_target(plan.step_count(), format!("{} ({})", os_id, target.triple)));

  let result = builder.build(target, &store, bar.as_ref())?;

  if json {
    return print_json(&BuildSummary {
      os_id,
      key: result.stored.key.to_string(),
      artifact: result.stored.path,
      size: result.stored.size,
    });
  }

  println!(
    "✅ Stored {} as {} ({} bytes)",
    result.binary_path.display(),
    result.stored.key,
    result.stored.size
  );
  println!("   Store: {}", store.root().display());
  Ok(())
}
