//! Test doubles for the subprocess and release API seams

use crate::core::error::{FanoutResult, PublishError};
use crate::core::exec::{CommandOutput, CommandRunner, CommandSpec};
use crate::release::bundle::ReleaseBundle;
use crate::release::github::{PublishedRelease, ReleaseApi};
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

/// Records every command and answers from a script
///
/// Unscripted commands succeed. `cargo build` additionally leaves a
/// non-empty binary where cargo would, so the rename step has something
/// to work with.
pub struct ScriptedRunner {
  program: String,
  responses: Vec<(String, CommandOutput)>,
  create_outputs: bool,
  log: Mutex<Vec<String>>,
}

impl ScriptedRunner {
  pub fn new() -> Self {
    Self {
      program: "program".to_string(),
      responses: Vec::new(),
      create_outputs: true,
      log: Mutex::new(Vec::new()),
    }
  }

  /// Exit with `code` for commands containing `needle`
  pub fn fail_when(self, needle: &str, code: i32) -> Self {
    self.respond(needle, CommandOutput::failed(code, format!("{} failed", needle)))
  }

  /// Answer commands containing `needle` with `output`
  pub fn respond(mut self, needle: &str, output: CommandOutput) -> Self {
    self.responses.push((needle.to_string(), output));
    self
  }

  /// Successful `cargo build` that produces no binary
  pub fn without_outputs(mut self) -> Self {
    self.create_outputs = false;
    self
  }

  pub fn commands(&self) -> Vec<String> {
    self.log.lock().map(|l| l.clone()).unwrap_or_default()
  }

  fn fake_build_output(&self, spec: &CommandSpec) {
    let (Some(target_dir), Some(triple)) = (spec.flag_value("--target-dir"), spec.flag_value("--target")) else {
      return;
    };
    let ext = if triple.contains("windows") { ".exe" } else { "" };
    let release = PathBuf::from(target_dir).join(triple).join("release");
    fs::create_dir_all(&release).unwrap();
    fs::write(release.join(format!("{}{}", self.program, ext)), b"\x7fELF fake binary").unwrap();
  }
}

impl CommandRunner for ScriptedRunner {
  fn run(&self, spec: &CommandSpec) -> FanoutResult<CommandOutput> {
    let line = spec.to_string();
    self.log.lock().unwrap().push(line.clone());

    if let Some((_, output)) = self.responses.iter().find(|(needle, _)| line.contains(needle.as_str())) {
      return Ok(output.clone());
    }

    if self.create_outputs && spec.args.first().map(String::as_str) == Some("build") {
      self.fake_build_output(spec);
    }
    Ok(CommandOutput::ok(""))
  }
}

type FailureFn = Box<dyn Fn() -> PublishError + Send + Sync>;

/// Release API that records bundles instead of calling out
pub struct RecordingApi {
  bundles: Mutex<Vec<ReleaseBundle>>,
  attempts: Mutex<usize>,
  failure: Option<FailureFn>,
}

impl RecordingApi {
  pub fn new() -> Self {
    Self {
      bundles: Mutex::new(Vec::new()),
      attempts: Mutex::new(0),
      failure: None,
    }
  }

  /// Every call fails with the error `failure` builds
  pub fn failing<F>(failure: F) -> Self
  where
    F: Fn() -> PublishError + Send + Sync + 'static,
  {
    Self {
      failure: Some(Box::new(failure)),
      ..Self::new()
    }
  }

  /// Bundles of successful calls
  pub fn bundles(&self) -> Vec<ReleaseBundle> {
    self.bundles.lock().unwrap().clone()
  }

  pub fn attempts(&self) -> usize {
    *self.attempts.lock().unwrap()
  }
}

impl ReleaseApi for RecordingApi {
  fn create_release(&self, bundle: &ReleaseBundle) -> Result<PublishedRelease, PublishError> {
    *self.attempts.lock().unwrap() += 1;
    if let Some(ref failure) = self.failure {
      return Err(failure());
    }

    self.bundles.lock().unwrap().push(bundle.clone());
    Ok(PublishedRelease {
      tag: bundle.tag.clone(),
      url: Some(format!("https://github.com/owner/program/releases/tag/{}", bundle.tag)),
      files: bundle.file_names(),
      draft: bundle.draft,
    })
  }
}
