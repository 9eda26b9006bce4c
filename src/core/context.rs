//! Unified pipeline context - build once, pass everywhere
//!
//! Resolves the workspace root, the configuration and the program name a
//! single time in main.rs, then hands every command a `&PipelineContext`.
//! Paths in the config are resolved against the workspace root here so
//! nothing downstream has to care about the current directory.

use crate::cargo::metadata::WorkspaceMetadata;
use crate::core::config::{self, FanoutConfig};
use crate::core::error::{ConfigError, FanoutError, FanoutResult};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Shared, read-only state for one invocation
#[derive(Clone)]
pub struct PipelineContext {
  /// Workspace root directory (absolute path)
  pub root: PathBuf,

  /// fanout.toml (or defaults)
  pub config: Arc<FanoutConfig>,

  /// Program name resolved lazily from config or cargo metadata
  program: Option<String>,
}

impl PipelineContext {
  /// Build the context from a root directory.
  ///
  /// Cargo metadata is only loaded when the config does not name the
  /// program; failing to resolve it is deferred to [`Self::program`] so that
  /// commands like `gate` work in any directory.
  pub fn build(workspace_root: &Path) -> FanoutResult<Self> {
    let root = workspace_root.to_path_buf();
    let config = FanoutConfig::load_or_default(&root)?;

    let release_dir = config::normalize(&config::resolve(&root, &config.release.release_dir));
    if config::normalize(&root).starts_with(&release_dir) {
      return Err(FanoutError::Config(ConfigError::Invalid {
        path: FanoutConfig::find_config_path(&root).unwrap_or_else(|| root.join("fanout.toml")),
        reason: format!(
          "release_dir '{}' contains the workspace root",
          config.release.release_dir.display()
        ),
      }));
    }

    let program = match config.program.clone() {
      Some(program) => Some(program),
      None => match WorkspaceMetadata::load(&root).and_then(|m| m.program_name()) {
        Ok(name) => Some(name),
        Err(e) => {
          log::debug!("program name unavailable from cargo metadata: {}", e);
          None
        }
      },
    };

    Ok(Self {
      root,
      config: Arc::new(config),
      program,
    })
  }

  /// Context with explicit values (tests, embedding)
  pub fn with_program(root: &Path, config: FanoutConfig, program: impl Into<String>) -> Self {
    Self {
      root: root.to_path_buf(),
      config: Arc::new(config),
      program: Some(program.into()),
    }
  }

  /// Program to build and publish
  pub fn program(&self) -> FanoutResult<&str> {
    self.program.as_deref().ok_or_else(|| {
      FanoutError::Config(ConfigError::ProgramUnknown {
        workspace_root: self.root.clone(),
      })
    })
  }

  /// Get workspace root as Path reference (convenience)
  pub fn workspace_root(&self) -> &Path {
    &self.root
  }

  /// Parent of the per-platform cargo target directories
  pub fn target_root(&self) -> PathBuf {
    config::resolve(&self.root, &self.config.build.target_dir)
  }

  /// Shared artifact store directory
  pub fn store_dir(&self) -> PathBuf {
    config::resolve(&self.root, &self.config.build.store_dir)
  }

  /// Directory the publisher retrieves artifacts into
  pub fn release_dir(&self) -> PathBuf {
    config::resolve(&self.root, &self.config.release.release_dir)
  }
}
