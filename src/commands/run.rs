//! `cargo fanout run` - The whole Release pipeline in one process
//!
//! Fans out one builder per platform in parallel, joins on the run's
//! artifact store and publishes a single draft release.

use crate::commands::{TriggerArgs, print_json, release_notes};
use crate::core::context::PipelineContext;
use crate::core::error::FanoutResult;
use crate::core::exec::SystemRunner;
use crate::pipeline::{Pipeline, PipelinePlan, PipelineReport};
use crate::release::github::GhCliApi;
use crate::ui::progress::MultiProgress;

/// Run the pipeline command
pub fn run_pipeline(ctx: &PipelineContext, trigger: TriggerArgs, dry_run: bool, json: bool) -> FanoutResult<()> {
  let event = trigger.resolve(ctx)?;
  let runner = SystemRunner;
  let api = GhCliApi::new(&runner, ctx.workspace_root(), ctx.config.release.repo.clone());
  let notes = release_notes(ctx, event.tag())?;

  if dry_run {
    let plan = Pipeline::new(ctx, &runner, &api, notes).plan(&event)?;
    if json {
      return print_json(&plan);
    }
    print_plan(&plan);
    return Ok(());
  }

  let mut pipeline = Pipeline::new(ctx, &runner, &api, notes);
  if !json {
    println!("🎯 Release pipeline: {}", event);
    pipeline = pipeline.with_progress(MultiProgress::new());
  }

  let outcome = pipeline.run(&event)?;
  if json {
    print_json(&outcome.report)?;
  } else {
    print_report(&outcome.report);
  }
  outcome.into_result().map(|_| ())
}

fn print_plan(plan: &PipelinePlan) {
  if !plan.triggered {
    println!("⏭️  {} does not trigger a release", plan.trigger);
    return;
  }

  println!("DRY RUN: Release pipeline for {}", plan.trigger);
  println!("════════════════════════════════════════");
  for build in &plan.builds {
    println!("\n🔨 {} ({}) -> {}", build.os_id, build.triple, build.artifact);
    for (idx, step) in build.steps.iter().enumerate() {
      println!("  {}. {}", idx + 1, step);
    }
  }
  if let Some(ref bundle) = plan.release {
    println!("\n🚀 Draft release {}", bundle.tag);
    for file in &bundle.files {
      println!("  📦 {}", file.display());
    }
  }
  if let Some(ref command) = plan.release_command {
    println!("  {}", command);
  }
}

fn print_report(report: &PipelineReport) {
  if !report.state.is_terminal() {
    println!("⏭️  {} does not trigger a release", report.trigger);
    return;
  }

  println!();
  for target in &report.targets {
    if target.succeeded {
      println!("  ✅ {:<8} {}", target.os_id, target.artifact.as_deref().unwrap_or(&target.key));
    } else {
      println!("  ❌ {:<8} {}", target.os_id, target.error_kind.unwrap_or("failed"));
    }
  }

  let path: Vec<&str> = report.states.iter().map(|s| s.as_str()).collect();
  println!("\n  States: {}", path.join(" -> "));
  if let Some(ref release) = report.release {
    println!("\n✅ Draft release {} created with {} files", release.tag, release.files.len());
    if let Some(ref url) = release.url {
      println!("   {}", url);
    }
  }
}
