//! The Release pipeline: fan out one builder per platform, join, publish
//!
//! Builders run in parallel on rayon workers and write into a store scoped
//! to this run (`<store_dir>/runs/<run_id>`). Every builder result is
//! collected before anything else happens; the publisher only starts when
//! all of them succeeded and the store yields every key. A single failed
//! platform fails the whole run and the other artifacts are discarded
//! with the store.

pub mod state;

pub use state::{PipelineState, StateMachine};

use crate::build::builder::{BuildPlanView, BuildResult, PlatformBuilder};
use crate::core::context::PipelineContext;
use crate::core::error::{BuildError, FanoutError, FanoutResult};
use crate::core::exec::CommandRunner;
use crate::platform::{PlatformTarget, TARGETS};
use crate::release::bundle::ReleaseBundle;
use crate::release::github::{PublishedRelease, ReleaseApi};
use crate::release::notes::ReleaseNotes;
use crate::release::publisher::Publisher;
use crate::release::trigger::{TagPattern, TriggerEvent};
use crate::store::ArtifactStore;
use crate::ui::progress::MultiProgress;
use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::Serialize;
use sha2::{Digest, Sha256};

/// Short id for one run: sha256 over the tag and start time
pub fn run_id(tag: &str, started_at: &DateTime<Utc>) -> String {
  let mut hasher = Sha256::new();
  hasher.update(tag.as_bytes());
  hasher.update(b"\0");
  hasher.update(started_at.to_rfc3339().as_bytes());
  let digest = format!("{:x}", hasher.finalize());
  digest[..12].to_string()
}

/// Per-platform result in the report
#[derive(Debug, Clone, Serialize)]
pub struct TargetOutcome {
  pub os_id: String,
  pub triple: &'static str,
  pub key: String,
  pub succeeded: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub artifact: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub size: Option<u64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub error_kind: Option<&'static str>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub error: Option<String>,
}

impl TargetOutcome {
  fn from_result(target: &PlatformTarget, program: &str, result: &Result<BuildResult, BuildError>) -> Self {
    let mut outcome = Self {
      os_id: target.os_id.to_string(),
      triple: target.triple,
      key: target.artifact_key(program).to_string(),
      succeeded: result.is_ok(),
      artifact: None,
      size: None,
      error_kind: None,
      error: None,
    };
    match result {
      Ok(built) => {
        outcome.artifact = built.stored.file_name().map(String::from);
        outcome.size = Some(built.stored.size);
      }
      Err(e) => {
        outcome.error_kind = Some(e.kind());
        outcome.error = Some(e.to_string());
      }
    }
    outcome
  }
}

/// What happened in one pipeline run
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub run_id: Option<String>,
  pub trigger: TriggerEvent,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub tag: Option<String>,
  pub state: PipelineState,
  pub states: Vec<PipelineState>,
  pub started_at: DateTime<Utc>,
  pub finished_at: DateTime<Utc>,
  pub targets: Vec<TargetOutcome>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub release: Option<PublishedRelease>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub error: Option<String>,
}

/// Report plus the error that ended a failed run
#[derive(Debug)]
pub struct PipelineOutcome {
  pub report: PipelineReport,
  pub failure: Option<FanoutError>,
}

impl PipelineOutcome {
  pub fn into_result(self) -> FanoutResult<PipelineReport> {
    match self.failure {
      Some(e) => Err(e),
      None => Ok(self.report),
    }
  }
}

/// Dry-run view of a pipeline run
#[derive(Debug, Serialize)]
pub struct PipelinePlan {
  pub trigger: TriggerEvent,
  pub triggered: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub tag: Option<String>,
  pub builds: Vec<BuildPlanView>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub release: Option<ReleaseBundle>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub release_command: Option<String>,
}

pub struct Pipeline<'a> {
  ctx: &'a PipelineContext,
  runner: &'a dyn CommandRunner,
  api: &'a dyn ReleaseApi,
  notes: ReleaseNotes,
  progress: Option<MultiProgress>,
}

impl<'a> Pipeline<'a> {
  pub fn new(
    ctx: &'a PipelineContext,
    runner: &'a dyn CommandRunner,
    api: &'a dyn ReleaseApi,
    notes: ReleaseNotes,
  ) -> Self {
    Self {
      ctx,
      runner,
      api,
      notes,
      progress: None,
    }
  }

  /// Draw one progress bar per platform while building
  pub fn with_progress(mut self, progress: MultiProgress) -> Self {
    self.progress = Some(progress);
    self
  }

  fn pattern(&self) -> FanoutResult<TagPattern> {
    TagPattern::new(&self.ctx.config.release.tag_pattern)
  }

  fn publisher(&self, program: &str, pattern: TagPattern) -> Publisher<'a> {
    Publisher::new(
      self.api,
      program,
      pattern,
      &self.ctx.release_dir(),
      self.notes.clone(),
    )
  }

  /// Run the pipeline for `event`
  ///
  /// Errors before the first transition (bad config, unknown program) are
  /// returned directly. Everything after that lands in the outcome with the
  /// run in `Failed`.
  pub fn run(&self, event: &TriggerEvent) -> FanoutResult<PipelineOutcome> {
    let pattern = self.pattern()?;
    let started_at = Utc::now();
    let mut machine = StateMachine::new();

    let Some(tag) = event.tag().filter(|_| pattern.is_release_trigger(event)) else {
      log::info!("{} does not trigger a release (pattern '{}')", event, pattern.as_str());
      return Ok(PipelineOutcome {
        report: self.report(event, None, None, &machine, started_at, Vec::new(), None, None),
        failure: None,
      });
    };

    let program = self.ctx.program()?.to_string();
    let builder = PlatformBuilder::new(self.runner, self.ctx)?;
    let id = run_id(tag, &started_at);
    let store = ArtifactStore::create(&self.ctx.store_dir().join("runs").join(&id))?;
    log::info!("run {} for {} ({})", id, tag, program);

    machine.advance(PipelineState::Building)?;
    let results = self.build_all(&builder, &store);
    let targets: Vec<TargetOutcome> = results
      .iter()
      .map(|(target, result)| TargetOutcome::from_result(target, &program, result))
      .collect();

    let mut release = None;
    let failure = match self.join_and_publish(tag, &program, pattern, results, &store, &mut machine) {
      Ok(published) => {
        release = Some(published);
        None
      }
      Err(e) => {
        machine.advance(PipelineState::Failed)?;
        Some(e)
      }
    };

    // The store lives exactly as long as the run
    if let Err(e) = store.discard() {
      log::warn!("failed to discard run store: {}", e);
    }

    let error = failure.as_ref().map(|e| e.to_string());
    Ok(PipelineOutcome {
      report: self.report(event, Some(id), Some(tag), &machine, started_at, targets, release, error),
      failure,
    })
  }

  /// Fan out: one builder per platform, every result collected
  fn build_all(
    &self,
    builder: &PlatformBuilder<'_>,
    store: &ArtifactStore,
  ) -> Vec<(&'static PlatformTarget, Result<BuildResult, BuildError>)> {
    let jobs: Vec<_> = TARGETS
      .iter()
      .map(|target| {
        let bar = self.progress.as_ref().and_then(|p| {
          let steps = builder.plan(target).step_count();
          p.add_target(steps, format!("{} ({})", target.os_id, target.triple))
        });
        (target, bar)
      })
      .collect();

    jobs
      .into_par_iter()
      .map(|(target, bar)| (target, builder.build(target, store, bar.as_ref())))
      .collect()
  }

  /// Join barrier plus publish; any error here fails the run
  fn join_and_publish(
    &self,
    tag: &str,
    program: &str,
    pattern: TagPattern,
    results: Vec<(&'static PlatformTarget, Result<BuildResult, BuildError>)>,
    store: &ArtifactStore,
    machine: &mut StateMachine,
  ) -> FanoutResult<PublishedRelease> {
    let mut failures: Vec<BuildError> = results.into_iter().filter_map(|(_, r)| r.err()).collect();
    if !failures.is_empty() {
      for failure in &failures {
        eprintln!("❌ [{}] {} failed", failure.os_id(), failure.kind());
      }
      // Platforms fail independently; report the first in table order
      return Err(FanoutError::Build(failures.remove(0)));
    }

    machine.advance(PipelineState::Joining)?;
    let publisher = self.publisher(program, pattern);
    let artifacts = publisher.collect(store)?;

    machine.advance(PipelineState::Publishing)?;
    let release = publisher.release(tag, &artifacts)?;

    machine.advance(PipelineState::Done)?;
    Ok(release)
  }

  #[allow(clippy::too_many_arguments)]
  fn report(
    &self,
    event: &TriggerEvent,
    run_id: Option<String>,
    tag: Option<&str>,
    machine: &StateMachine,
    started_at: DateTime<Utc>,
    targets: Vec<TargetOutcome>,
    release: Option<PublishedRelease>,
    error: Option<String>,
  ) -> PipelineReport {
    PipelineReport {
      run_id,
      trigger: event.clone(),
      tag: tag.map(String::from),
      state: machine.current(),
      states: machine.history().to_vec(),
      started_at,
      finished_at: Utc::now(),
      targets,
      release,
      error,
    }
  }

  /// What `run` would do for `event`, without running anything
  pub fn plan(&self, event: &TriggerEvent) -> FanoutResult<PipelinePlan> {
    let pattern = self.pattern()?;
    let triggered = pattern.is_release_trigger(event);

    let Some(tag) = event.tag().filter(|_| triggered) else {
      return Ok(PipelinePlan {
        trigger: event.clone(),
        triggered,
        tag: None,
        builds: Vec::new(),
        release: None,
        release_command: None,
      });
    };

    let program = self.ctx.program()?.to_string();
    let builder = PlatformBuilder::new(self.runner, self.ctx)?;
    let builds = TARGETS.iter().map(|t| builder.plan(t).view(&program)).collect();
    let bundle = self.publisher(&program, pattern).planned_bundle(tag);
    let release_command = self.api.describe(&bundle);

    Ok(PipelinePlan {
      trigger: event.clone(),
      triggered,
      tag: Some(tag.to_string()),
      builds,
      release: Some(bundle),
      release_command: Some(release_command),
    })
  }
}
