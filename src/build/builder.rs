//! Platform Builder
//!
//! Turns one [`PlatformTarget`] into one stored artifact:
//!
//! 1. precondition commands (Linux only: native UI libraries)
//! 2. `cargo fetch --target <triple>`
//! 3. `cargo build --release --target <triple> --target-dir <dir>/<os_id>`
//! 4. rename `<program><ext>` to `<program><suffix><ext>`
//! 5. put the renamed file under `<program>-<os_id>`
//!
//! Each platform builds into its own cargo target directory, so builders
//! running side by side never touch each other's files.

use crate::core::context::PipelineContext;
use crate::core::error::{BuildError, FanoutResult};
use crate::core::exec::{CommandOutput, CommandRunner, CommandSpec};
use crate::platform::PlatformTarget;
use crate::store::{ArtifactKey, ArtifactStore, StoredArtifact};
use crate::ui::progress::TargetProgress;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Lines of captured stderr shown when a step fails
const STDERR_TAIL_LINES: usize = 20;

/// One external command of a platform build
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildStep {
  Precondition { name: &'static str, command: CommandSpec },
  Fetch { command: CommandSpec },
  Compile { command: CommandSpec },
}

impl BuildStep {
  pub fn command(&self) -> &CommandSpec {
    match self {
      BuildStep::Precondition { command, .. } | BuildStep::Fetch { command } | BuildStep::Compile { command } => command,
    }
  }
}

/// Everything `build` will do for one platform, in order
#[derive(Debug, Clone)]
pub struct BuildPlan {
  pub target: &'static PlatformTarget,
  pub commands: Vec<BuildStep>,
  /// Binary as cargo leaves it
  pub output: PathBuf,
  /// Binary after the rename
  pub artifact: PathBuf,
  pub key: ArtifactKey,
}

/// JSON view of a plan
#[derive(Debug, Serialize)]
pub struct BuildPlanView {
  pub os_id: String,
  pub triple: &'static str,
  pub artifact: String,
  pub key: String,
  pub steps: Vec<String>,
}

impl BuildPlan {
  /// Commands plus the rename and the store put
  pub fn step_count(&self) -> usize {
    self.commands.len() + 2
  }

  /// Human-readable steps
  pub fn describe(&self) -> Vec<String> {
    let mut steps: Vec<String> = self.commands.iter().map(|s| s.command().to_string()).collect();
    steps.push(format!("rename {} -> {}", self.output.display(), self.artifact.display()));
    steps.push(format!("store as {}", self.key));
    steps
  }

  pub fn view(&self, program: &str) -> BuildPlanView {
    BuildPlanView {
      os_id: self.target.os_id.to_string(),
      triple: self.target.triple,
      artifact: self.target.artifact_file_name(program),
      key: self.key.to_string(),
      steps: self.describe(),
    }
  }
}

/// Output of a successful builder run
#[derive(Debug, Clone)]
pub struct BuildResult {
  /// Renamed binary in the platform's target directory
  pub binary_path: PathBuf,
  /// The copy now owned by the artifact store
  pub stored: StoredArtifact,
}

/// Builds release binaries for one platform at a time
pub struct PlatformBuilder<'a> {
  runner: &'a dyn CommandRunner,
  program: String,
  workspace_root: PathBuf,
  target_root: PathBuf,
  cargo: String,
}

impl<'a> PlatformBuilder<'a> {
  pub fn new(runner: &'a dyn CommandRunner, ctx: &PipelineContext) -> FanoutResult<Self> {
    Ok(Self {
      runner,
      program: ctx.program()?.to_string(),
      workspace_root: ctx.workspace_root().to_path_buf(),
      target_root: ctx.target_root(),
      cargo: ctx.config.build.cargo.clone(),
    })
  }

  pub fn program(&self) -> &str {
    &self.program
  }

  /// Cargo target directory private to this platform
  pub fn target_dir(&self, target: &PlatformTarget) -> PathBuf {
    self.target_root.join(target.os_id.as_str())
  }

  /// Where cargo leaves the binary
  pub fn output_path(&self, target: &PlatformTarget) -> PathBuf {
    self.release_dir(target).join(target.build_output_name(&self.program))
  }

  /// Where the renamed artifact lives before it is stored
  pub fn artifact_path(&self, target: &PlatformTarget) -> PathBuf {
    self.release_dir(target).join(target.artifact_file_name(&self.program))
  }

  fn release_dir(&self, target: &PlatformTarget) -> PathBuf {
    self.target_dir(target).join(target.triple).join("release")
  }

  /// Steps `build` will execute for `target`, in order
  pub fn plan(&self, target: &'static PlatformTarget) -> BuildPlan {
    let mut commands = Vec::new();

    if let Some(precondition) = target.precondition {
      for command in precondition.commands(&self.workspace_root) {
        commands.push(BuildStep::Precondition {
          name: precondition.name,
          command,
        });
      }
    }

    commands.push(BuildStep::Fetch {
      command: CommandSpec::new(&self.cargo, &self.workspace_root).args(["fetch", "--target", target.triple]),
    });

    let target_dir = self.target_dir(target);
    commands.push(BuildStep::Compile {
      command: CommandSpec::new(&self.cargo, &self.workspace_root)
        .args(["build", "--release", "--target", target.triple, "--target-dir"])
        .arg(target_dir.to_string_lossy()),
    });

    BuildPlan {
      target,
      commands,
      output: self.output_path(target),
      artifact: self.artifact_path(target),
      key: target.artifact_key(&self.program),
    }
  }

  /// Run every step for `target` and put the artifact into `store`
  ///
  /// The first failing step ends this platform's build; nothing is retried.
  pub fn build(
    &self,
    target: &'static PlatformTarget,
    store: &ArtifactStore,
    progress: Option<&TargetProgress>,
  ) -> Result<BuildResult, BuildError> {
    let os_id = target.os_id.to_string();
    let plan = self.plan(target);
    let advance = || {
      if let Some(p) = progress {
        p.step();
      }
    };

    log::info!("[{}] building {} for {}", os_id, self.program, target.triple);

    for step in &plan.commands {
      let result = self.exec(&os_id, step.command());
      match step {
        BuildStep::Precondition { name, .. } => result.map_err(|code| BuildError::DependencyFetch {
          os_id: os_id.clone(),
          step: name.to_string(),
          code,
        })?,
        BuildStep::Fetch { .. } => result.map_err(|code| BuildError::DependencyFetch {
          os_id: os_id.clone(),
          step: "fetch".to_string(),
          code,
        })?,
        BuildStep::Compile { .. } => result.map_err(|code| BuildError::Compile {
          os_id: os_id.clone(),
          code,
        })?,
      }
      advance();
    }

    rename_artifact(&plan.output, &plan.artifact).map_err(|reason| BuildError::Rename {
      os_id: os_id.clone(),
      from: plan.output.clone(),
      to: plan.artifact.clone(),
      reason,
    })?;
    advance();

    let stored = store.put(&plan.key, &plan.artifact).map_err(|source| BuildError::Store {
      os_id: os_id.clone(),
      source,
    })?;
    advance();

    log::info!("[{}] stored {} ({} bytes)", os_id, stored.key, stored.size);
    Ok(BuildResult {
      binary_path: plan.artifact,
      stored,
    })
  }

  /// Run a command, mapping any non-success to its exit code
  fn exec(&self, os_id: &str, command: &CommandSpec) -> Result<(), Option<i32>> {
    log::debug!("[{}] {}", os_id, command);
    match self.runner.run(command) {
      Ok(output) if output.success() => Ok(()),
      Ok(output) => {
        report_failure(os_id, command, &output);
        Err(output.code)
      }
      Err(e) => {
        eprintln!("❌ [{}] {}: {}", os_id, command, e);
        Err(None)
      }
    }
  }
}

fn report_failure(os_id: &str, command: &CommandSpec, output: &CommandOutput) {
  eprintln!("❌ [{}] {}", os_id, command);
  let lines: Vec<_> = output.stderr.lines().collect();
  let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
  for line in &lines[start..] {
    eprintln!("   [{}] {}", os_id, line);
  }
}

/// Rename the cargo output to its artifact name
fn rename_artifact(from: &Path, to: &Path) -> Result<(), String> {
  if !from.is_file() {
    return Err("build output not found".to_string());
  }
  // A previous run of the same target may have left the renamed file behind
  if to.exists() {
    fs::remove_file(to).map_err(|e| e.to_string())?;
  }
  fs::rename(from, to).map_err(|e| e.to_string())
}
