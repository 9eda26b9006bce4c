//! Subprocess execution seam
//!
//! Every external tool the pipeline drives (cargo, apt-get, gh) is described
//! as a [`CommandSpec`] and executed through a [`CommandRunner`]. Builders and
//! gates only ever look at the exit status and, for gh, the captured output.

use crate::core::error::{FanoutError, FanoutResult};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// How a command's stdout/stderr are handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
  /// Stream to the terminal (gates, where the user needs the tool output)
  Inherit,
  /// Capture for inspection (parallel builds, gh)
  Capture,
}

/// A fully described external command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
  pub program: String,
  pub args: Vec<String>,
  pub cwd: PathBuf,
  pub mode: OutputMode,
}

impl CommandSpec {
  pub fn new(program: impl Into<String>, cwd: &Path) -> Self {
    Self {
      program: program.into(),
      args: Vec::new(),
      cwd: cwd.to_path_buf(),
      mode: OutputMode::Capture,
    }
  }

  pub fn arg(mut self, arg: impl Into<String>) -> Self {
    self.args.push(arg.into());
    self
  }

  pub fn args<I, S>(mut self, args: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.args.extend(args.into_iter().map(Into::into));
    self
  }

  pub fn inherit_output(mut self) -> Self {
    self.mode = OutputMode::Inherit;
    self
  }

  /// Value following `flag` in the argument list, if any
  pub fn flag_value(&self, flag: &str) -> Option<&str> {
    self
      .args
      .iter()
      .position(|a| a == flag)
      .and_then(|i| self.args.get(i + 1))
      .map(String::as_str)
  }
}

impl fmt::Display for CommandSpec {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.program)?;
    for arg in &self.args {
      if arg.contains(' ') {
        write!(f, " \"{}\"", arg)?;
      } else {
        write!(f, " {}", arg)?;
      }
    }
    Ok(())
  }
}

/// Result of running a command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
  /// Exit code, `None` when terminated by a signal
  pub code: Option<i32>,
  pub stdout: String,
  pub stderr: String,
}

impl CommandOutput {
  pub fn success(&self) -> bool {
    self.code == Some(0)
  }

  /// Successful output with captured stdout
  #[cfg(test)]
  pub fn ok(stdout: impl Into<String>) -> Self {
    Self {
      code: Some(0),
      stdout: stdout.into(),
      stderr: String::new(),
    }
  }

  /// Failed output with the given code and stderr
  #[cfg(test)]
  pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
    Self {
      code: Some(code),
      stdout: String::new(),
      stderr: stderr.into(),
    }
  }
}

/// Executes command specs
///
/// `Sync` because builders share one runner across rayon workers.
pub trait CommandRunner: Sync {
  /// Run the command to completion. A non-zero exit is NOT an error here;
  /// only a failure to spawn is.
  fn run(&self, spec: &CommandSpec) -> FanoutResult<CommandOutput>;
}

/// Runner backed by `std::process::Command`
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
  fn run(&self, spec: &CommandSpec) -> FanoutResult<CommandOutput> {
    log::debug!("exec [{}]: {}", spec.cwd.display(), spec);

    let mut cmd = Command::new(&spec.program);
    cmd.current_dir(&spec.cwd).args(&spec.args);

    match spec.mode {
      OutputMode::Inherit => {
        let status = cmd
          .stdin(Stdio::null())
          .status()
          .map_err(|e| FanoutError::message(format!("Failed to execute {}: {}", spec.program, e)))?;
        Ok(CommandOutput {
          code: status.code(),
          ..Default::default()
        })
      }
      OutputMode::Capture => {
        let output = cmd
          .stdin(Stdio::null())
          .output()
          .map_err(|e| FanoutError::message(format!("Failed to execute {}: {}", spec.program, e)))?;
        let result = CommandOutput {
          code: output.status.code(),
          stdout: String::from_utf8_lossy(&output.stdout).to_string(),
          stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        };
        if !result.success() {
          log::debug!("{} exited with {:?}: {}", spec.program, result.code, result.stderr.trim());
        }
        Ok(result)
      }
    }
  }
}
