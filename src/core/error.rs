//! Error types for cargo-fanout with contextual messages and exit codes
//!
//! Every pipeline stage has its own error family so a failed run can say
//! exactly which platform and which step broke. All of them fold into
//! [`FanoutError`], which carries the exit code and an optional help line.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Exit codes for cargo-fanout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
  /// User error (config, invalid args, missing files)
  User = 1,
  /// System error (build tool, gh, git, I/O)
  System = 2,
  /// Validation failure (quality gate, store invariant)
  Validation = 3,
}

impl ExitCode {
  /// Convert to i32 for process exit
  pub fn as_i32(self) -> i32 {
    self as i32
  }
}

/// Main error type for cargo-fanout
#[derive(Debug)]
pub enum FanoutError {
  /// Configuration errors
  Config(ConfigError),

  /// A platform builder failed
  Build(BuildError),

  /// Artifact store invariant violated
  Store(StoreError),

  /// Release API rejected the request
  Publish(PublishError),

  /// A quality gate stage failed
  Gate(GateError),

  /// Git operation errors
  Git(GitError),

  /// I/O errors
  Io(io::Error),

  /// Generic error with message and optional context
  Message {
    message: String,
    context: Option<String>,
    help: Option<String>,
  },
}

impl FanoutError {
  /// Create a simple error message
  pub fn message(msg: impl Into<String>) -> Self {
    FanoutError::Message {
      message: msg.into(),
      context: None,
      help: None,
    }
  }

  /// Create an error with help text
  pub fn with_help(msg: impl Into<String>, help: impl Into<String>) -> Self {
    FanoutError::Message {
      message: msg.into(),
      context: None,
      help: Some(help.into()),
    }
  }

  /// Add context to an existing error
  pub fn context(self, ctx: impl Into<String>) -> Self {
    let ctx_str = ctx.into();
    match self {
      FanoutError::Message { message, context, help } => FanoutError::Message {
        message,
        context: Some(context.map(|c| format!("{}\n{}", ctx_str, c)).unwrap_or(ctx_str)),
        help,
      },
      FanoutError::Io(e) => FanoutError::Message {
        message: format!("I/O error: {}", e),
        context: Some(ctx_str),
        help: None,
      },
      _ => self,
    }
  }

  /// Get the appropriate exit code for this error
  pub fn exit_code(&self) -> ExitCode {
    match self {
      FanoutError::Config(_) => ExitCode::User,
      FanoutError::Build(_) | FanoutError::Publish(_) | FanoutError::Git(_) | FanoutError::Io(_) => ExitCode::System,
      FanoutError::Store(_) | FanoutError::Gate(_) => ExitCode::Validation,
      FanoutError::Message { .. } => ExitCode::User,
    }
  }

  /// Get contextual help message for this error
  pub fn help_message(&self) -> Option<String> {
    match self {
      FanoutError::Config(e) => e.help_message(),
      FanoutError::Build(e) => e.help_message(),
      FanoutError::Store(e) => e.help_message(),
      FanoutError::Publish(e) => e.help_message(),
      FanoutError::Gate(e) => e.help_message(),
      FanoutError::Git(e) => e.help_message(),
      FanoutError::Message { help, .. } => help.clone(),
      FanoutError::Io(_) => None,
    }
  }
}

impl fmt::Display for FanoutError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      FanoutError::Config(e) => write!(f, "{}", e),
      FanoutError::Build(e) => write!(f, "{}", e),
      FanoutError::Store(e) => write!(f, "{}", e),
      FanoutError::Publish(e) => write!(f, "{}", e),
      FanoutError::Gate(e) => write!(f, "{}", e),
      FanoutError::Git(e) => write!(f, "{}", e),
      FanoutError::Io(e) => write!(f, "I/O error: {}", e),
      FanoutError::Message { message, context, .. } => {
        write!(f, "{}", message)?;
        if let Some(ctx) = context {
          write!(f, "\n{}", ctx)?;
        }
        Ok(())
      }
    }
  }
}

impl std::error::Error for FanoutError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      FanoutError::Io(e) => Some(e),
      _ => None,
    }
  }
}

impl From<io::Error> for FanoutError {
  fn from(err: io::Error) -> Self {
    FanoutError::Io(err)
  }
}

impl From<String> for FanoutError {
  fn from(msg: String) -> Self {
    FanoutError::message(msg)
  }
}

impl From<&str> for FanoutError {
  fn from(msg: &str) -> Self {
    FanoutError::message(msg)
  }
}

impl From<BuildError> for FanoutError {
  fn from(err: BuildError) -> Self {
    FanoutError::Build(err)
  }
}

impl From<StoreError> for FanoutError {
  fn from(err: StoreError) -> Self {
    FanoutError::Store(err)
  }
}

impl From<PublishError> for FanoutError {
  fn from(err: PublishError) -> Self {
    FanoutError::Publish(err)
  }
}

impl From<GateError> for FanoutError {
  fn from(err: GateError) -> Self {
    FanoutError::Gate(err)
  }
}

impl From<cargo_metadata::Error> for FanoutError {
  fn from(err: cargo_metadata::Error) -> Self {
    FanoutError::message(format!("Cargo metadata error: {}", err))
  }
}

impl From<toml_edit::de::Error> for FanoutError {
  fn from(err: toml_edit::de::Error) -> Self {
    FanoutError::message(format!("TOML deserialization error: {}", err))
  }
}

impl From<serde_json::Error> for FanoutError {
  fn from(err: serde_json::Error) -> Self {
    FanoutError::message(format!("JSON error: {}", err))
  }
}

impl From<glob::PatternError> for FanoutError {
  fn from(err: glob::PatternError) -> Self {
    FanoutError::message(format!("Invalid glob pattern: {}", err))
  }
}

/// Configuration-related errors
#[derive(Debug)]
pub enum ConfigError {
  /// fanout.toml could not be parsed or is inconsistent
  Invalid { path: PathBuf, reason: String },

  /// Program name could not be determined
  ProgramUnknown { workspace_root: PathBuf },

  /// Unknown platform identifier
  UnknownTarget { os_id: String },
}

impl ConfigError {
  fn help_message(&self) -> Option<String> {
    match self {
      ConfigError::Invalid { .. } => Some("Fix fanout.toml; see `cargo fanout --help` for the supported keys.".to_string()),
      ConfigError::ProgramUnknown { .. } => {
        Some("Set `program = \"<binary-name>\"` in fanout.toml or run inside a Cargo package.".to_string())
      }
      ConfigError::UnknownTarget { .. } => Some("Run `cargo fanout targets` to list the supported platforms.".to_string()),
    }
  }
}

impl fmt::Display for ConfigError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ConfigError::Invalid { path, reason } => {
        write!(f, "Invalid configuration in {}: {}", path.display(), reason)
      }
      ConfigError::ProgramUnknown { workspace_root } => {
        write!(
          f,
          "Could not determine the program name for {}",
          workspace_root.display()
        )
      }
      ConfigError::UnknownTarget { os_id } => {
        write!(f, "Unknown platform '{}'", os_id)
      }
    }
  }
}

/// Platform builder failures, always scoped to one platform
#[derive(Debug)]
pub enum BuildError {
  /// Native dependency install or `cargo fetch` exited non-zero
  DependencyFetch {
    os_id: String,
    step: String,
    code: Option<i32>,
  },

  /// `cargo build --release` exited non-zero
  Compile { os_id: String, code: Option<i32> },

  /// The compiled binary could not be renamed to its artifact name
  Rename {
    os_id: String,
    from: PathBuf,
    to: PathBuf,
    reason: String,
  },

  /// The renamed binary could not be put into the artifact store
  Store { os_id: String, source: StoreError },
}

impl BuildError {
  /// Platform the failure belongs to
  pub fn os_id(&self) -> &str {
    match self {
      BuildError::DependencyFetch { os_id, .. }
      | BuildError::Compile { os_id, .. }
      | BuildError::Rename { os_id, .. }
      | BuildError::Store { os_id, .. } => os_id,
    }
  }

  /// Short failure category, stable for JSON reports
  pub fn kind(&self) -> &'static str {
    match self {
      BuildError::DependencyFetch { .. } => "dependency-fetch",
      BuildError::Compile { .. } => "compile",
      BuildError::Rename { .. } => "rename",
      BuildError::Store { .. } => "store",
    }
  }

  fn help_message(&self) -> Option<String> {
    match self {
      BuildError::DependencyFetch { step, .. } if step == "native-deps" => {
        Some("The native UI libraries could not be installed; check apt access on this runner.".to_string())
      }
      BuildError::Rename { .. } => Some(
        "The build did not leave a binary at the expected path. Check the program name in fanout.toml.".to_string(),
      ),
      BuildError::Store { source, .. } => source.help_message(),
      _ => None,
    }
  }
}

fn format_code(code: &Option<i32>) -> String {
  code.map(|c| c.to_string()).unwrap_or_else(|| "signal".to_string())
}

impl fmt::Display for BuildError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      BuildError::DependencyFetch { os_id, step, code } => {
        write!(
          f,
          "[{}] dependency step '{}' failed (exit code: {})",
          os_id,
          step,
          format_code(code)
        )
      }
      BuildError::Compile { os_id, code } => {
        write!(f, "[{}] release build failed (exit code: {})", os_id, format_code(code))
      }
      BuildError::Rename { os_id, from, to, reason } => {
        write!(
          f,
          "[{}] could not rename {} to {}: {}",
          os_id,
          from.display(),
          to.display(),
          reason
        )
      }
      BuildError::Store { os_id, source } => write!(f, "[{}] {}", os_id, source),
    }
  }
}

/// Artifact store errors
#[derive(Debug)]
pub enum StoreError {
  /// A key was written twice into the same store
  KeyExists { key: String },

  /// `get_all` was asked for keys that were never written
  Missing { keys: Vec<String> },

  /// The stored file is empty
  EmptyArtifact { key: String },

  /// Underlying filesystem failure
  Io { key: String, source: io::Error },
}

impl StoreError {
  fn help_message(&self) -> Option<String> {
    match self {
      StoreError::KeyExists { .. } => Some(
        "The store still holds an unpublished build. Publish it, or remove the store directory to start over."
          .to_string(),
      ),
      StoreError::Missing { .. } => {
        Some("A platform build did not complete; nothing is published without every platform.".to_string())
      }
      _ => None,
    }
  }
}

impl fmt::Display for StoreError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      StoreError::KeyExists { key } => write!(f, "Artifact '{}' is already in the store", key),
      StoreError::Missing { keys } => write!(f, "Missing artifacts: {}", keys.join(", ")),
      StoreError::EmptyArtifact { key } => write!(f, "Artifact '{}' is empty", key),
      StoreError::Io { key, source } => write!(f, "Artifact '{}': {}", key, source),
    }
  }
}

/// Release API rejections
#[derive(Debug)]
pub enum PublishError {
  /// The trigger was not a matching tag push
  NotTriggered { reason: String },

  /// Authentication with the release API failed
  Auth { stderr: String },

  /// A release for the tag already exists
  DuplicateTag { tag: String },

  /// An attached file does not exist
  MissingFile { path: PathBuf },

  /// Any other rejection
  Rejected { code: Option<i32>, stderr: String },
}

impl PublishError {
  fn help_message(&self) -> Option<String> {
    match self {
      PublishError::Auth { .. } => Some("Run `gh auth login` or export GH_TOKEN for the publishing job.".to_string()),
      PublishError::DuplicateTag { tag } => Some(format!(
        "Delete the existing release and tag '{}', then push the tag again to re-run the pipeline.",
        tag
      )),
      PublishError::MissingFile { .. } => Some(
        "The artifact naming convention and the release file list disagree; run `cargo fanout targets`.".to_string(),
      ),
      _ => None,
    }
  }
}

impl fmt::Display for PublishError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      PublishError::NotTriggered { reason } => write!(f, "Release not triggered: {}", reason),
      PublishError::Auth { stderr } => write!(f, "Release API authentication failed\n{}", stderr.trim()),
      PublishError::DuplicateTag { tag } => write!(f, "A release for tag '{}' already exists", tag),
      PublishError::MissingFile { path } => write!(f, "Release file not found: {}", path.display()),
      PublishError::Rejected { code, stderr } => {
        write!(
          f,
          "Release API rejected the request (exit code: {})\n{}",
          format_code(code),
          stderr.trim()
        )
      }
    }
  }
}

/// Quality gate failure
#[derive(Debug)]
pub enum GateError {
  /// A stage exited non-zero; later stages were not run
  StageFailed {
    gate: String,
    stage: String,
    command: String,
    code: Option<i32>,
  },
}

impl GateError {
  fn help_message(&self) -> Option<String> {
    match self {
      GateError::StageFailed { stage, .. } => match stage.as_str() {
        "format-check" => Some("Run `cargo fmt --all` and commit the result.".to_string()),
        "lint" => Some("Fix the clippy warnings above; warnings are errors in this gate.".to_string()),
        _ => None,
      },
    }
  }
}

impl fmt::Display for GateError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      GateError::StageFailed {
        gate,
        stage,
        command,
        code,
      } => write!(
        f,
        "{} gate failed at stage '{}' (exit code: {})\n  {}",
        gate,
        stage,
        format_code(code),
        command
      ),
    }
  }
}

/// Git operation errors
#[derive(Debug)]
pub enum GitError {
  /// Git command failed
  CommandFailed { command: String, stderr: String },

  /// Repository not found
  RepoNotFound { path: PathBuf },
}

impl GitError {
  fn help_message(&self) -> Option<String> {
    match self {
      GitError::RepoNotFound { path } => Some(format!(
        "Run this command inside a git repository (looked at {}).",
        path.display()
      )),
      _ => None,
    }
  }
}

impl fmt::Display for GitError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      GitError::CommandFailed { command, stderr } => {
        write!(f, "Git command failed: {}\n{}", command, stderr)
      }
      GitError::RepoNotFound { path } => {
        write!(f, "Git repository not found at: {}", path.display())
      }
    }
  }
}

/// Result type alias for cargo-fanout
pub type FanoutResult<T> = Result<T, FanoutError>;

/// Helper trait to add context to Results
pub trait ResultExt<T> {
  /// Add context to an error result
  fn context(self, ctx: impl Into<String>) -> FanoutResult<T>;

  /// Add context using a closure (lazy evaluation)
  fn with_context<F>(self, f: F) -> FanoutResult<T>
  where
    F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
  E: Into<FanoutError>,
{
  fn context(self, ctx: impl Into<String>) -> FanoutResult<T> {
    self.map_err(|e| e.into().context(ctx))
  }

  fn with_context<F>(self, f: F) -> FanoutResult<T>
  where
    F: FnOnce() -> String,
  {
    self.map_err(|e| e.into().context(f()))
  }
}

/// Pretty-print an error to stderr with help text
pub fn print_error(error: &FanoutError) {
  eprintln!("\n❌ {}\n", error);

  if let Some(help) = error.help_message() {
    eprintln!("💡 Help: {}\n", help);
  }
}

impl From<anyhow::Error> for FanoutError {
  fn from(err: anyhow::Error) -> Self {
    FanoutError::message(err.to_string())
  }
}
