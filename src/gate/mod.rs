//! Local quality gates
//!
//! Each gate is a fixed, ordered list of cargo invocations. Stages run one
//! after another with their output streamed to the terminal, and the first
//! failing stage ends the gate; later stages are never started.
//!
//! | gate       | stages                          |
//! |------------|---------------------------------|
//! | pre-commit | format                          |
//! | pre-push   | format-check, lint, test        |
//! | ci         | test, lint, format-check        |

pub mod hooks;

use crate::core::error::{FanoutResult, GateError};
use crate::core::exec::{CommandRunner, CommandSpec};
use clap::ValueEnum;
use serde::Serialize;
use std::fmt;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum GateKind {
  PreCommit,
  PrePush,
  Ci,
}

impl GateKind {
  pub fn as_str(self) -> &'static str {
    match self {
      GateKind::PreCommit => "pre-commit",
      GateKind::PrePush => "pre-push",
      GateKind::Ci => "ci",
    }
  }

  /// Git hook that runs this gate
  pub fn hook_name(self) -> Option<&'static str> {
    match self {
      GateKind::PreCommit => Some("pre-commit"),
      GateKind::PrePush => Some("pre-push"),
      GateKind::Ci => None,
    }
  }

  /// Stages in execution order
  pub fn stages(self) -> &'static [Stage] {
    match self {
      GateKind::PreCommit => &[FORMAT],
      GateKind::PrePush => &[FORMAT_CHECK, LINT, TEST],
      GateKind::Ci => &[TEST, LINT, FORMAT_CHECK],
    }
  }
}

impl fmt::Display for GateKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// One cargo invocation of a gate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stage {
  pub name: &'static str,
  pub args: &'static [&'static str],
}

impl Stage {
  pub fn command(&self, cargo: &str, root: &Path) -> CommandSpec {
    CommandSpec::new(cargo, root)
      .args(self.args.iter().copied())
      .inherit_output()
  }
}

/// Format and fix in place
pub const FORMAT: Stage = Stage {
  name: "format",
  args: &["fmt", "--all"],
};

pub const FORMAT_CHECK: Stage = Stage {
  name: "format-check",
  args: &["fmt", "--all", "--", "--check"],
};

/// Clippy with warnings as errors
pub const LINT: Stage = Stage {
  name: "lint",
  args: &["clippy", "--all-targets", "--all-features", "--", "-D", "warnings"],
};

pub const TEST: Stage = Stage {
  name: "test",
  args: &["test", "--all-features"],
};

/// Stages that passed before the gate returned
#[derive(Debug, Clone, Serialize)]
pub struct GateReport {
  pub gate: GateKind,
  pub passed: Vec<&'static str>,
}

/// Run every stage of `kind` in order, stopping at the first failure
pub fn run_gate(kind: GateKind, runner: &dyn CommandRunner, root: &Path, cargo: &str) -> FanoutResult<GateReport> {
  let stages = kind.stages();
  let mut passed = Vec::with_capacity(stages.len());

  for (idx, stage) in stages.iter().enumerate() {
    let command = stage.command(cargo, root);
    println!("▶ [{}/{}] {}: {}", idx + 1, stages.len(), stage.name, command);

    let output = runner.run(&command)?;
    if !output.success() {
      return Err(
        GateError::StageFailed {
          gate: kind.to_string(),
          stage: stage.name.to_string(),
          command: command.to_string(),
          code: output.code,
        }
        .into(),
      );
    }
    passed.push(stage.name);
  }

  println!("✅ {} gate passed ({} stages)", kind, passed.len());
  Ok(GateReport { gate: kind, passed })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::core::error::FanoutError;
  use crate::core::exec::OutputMode;
  use crate::testing::ScriptedRunner;

  #[test]
  fn test_pre_push_short_circuits_on_format() {
    let runner = ScriptedRunner::new().fail_when("fmt --all -- --check", 1);
    let err = run_gate(GateKind::PrePush, &runner, Path::new("."), "cargo").unwrap_err();

    assert!(matches!(
      err,
      FanoutError::Gate(GateError::StageFailed { ref stage, code: Some(1), .. }) if stage == "format-check"
    ));
    assert_eq!(runner.commands(), vec!["cargo fmt --all -- --check"]);
  }

  #[test]
  fn test_pre_push_lint_failure_skips_tests() {
    let runner = ScriptedRunner::new().fail_when("clippy", 101);
    let err = run_gate(GateKind::PrePush, &runner, Path::new("."), "cargo").unwrap_err();

    assert!(matches!(err, FanoutError::Gate(GateError::StageFailed { ref stage, .. }) if stage == "lint"));
    assert_eq!(runner.commands().len(), 2);
    assert!(!runner.commands().iter().any(|c| c.starts_with("cargo test")));
  }

  #[test]
  fn test_ci_runs_test_lint_format_check_in_order() {
    let runner = ScriptedRunner::new();
    let report = run_gate(GateKind::Ci, &runner, Path::new("."), "cargo").unwrap();

    assert_eq!(report.passed, vec!["test", "lint", "format-check"]);
    assert_eq!(
      runner.commands(),
      vec![
        "cargo test --all-features",
        "cargo clippy --all-targets --all-features -- -D warnings",
        "cargo fmt --all -- --check",
      ]
    );
  }

  #[test]
  fn test_pre_commit_formats_in_place() {
    let runner = ScriptedRunner::new();
    let report = run_gate(GateKind::PreCommit, &runner, Path::new("."), "cargo").unwrap();
    assert_eq!(report.passed, vec!["format"]);
    assert_eq!(runner.commands(), vec!["cargo fmt --all"]);
  }

  #[test]
  fn test_stage_output_is_streamed() {
    let cmd = LINT.command("cargo", Path::new("."));
    assert_eq!(cmd.mode, OutputMode::Inherit);
  }
}
