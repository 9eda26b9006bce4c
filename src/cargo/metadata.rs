use crate::core::error::{ConfigError, FanoutError, FanoutResult};
use cargo_metadata::{MetadataCommand, Package, TargetKind};
use std::path::Path;

/// Workspace introspection using cargo_metadata
#[derive(Clone)]
pub struct WorkspaceMetadata {
  metadata: cargo_metadata::Metadata,
}

impl WorkspaceMetadata {
  pub fn load(workspace_root: &Path) -> FanoutResult<Self> {
    let metadata = MetadataCommand::new()
      .manifest_path(workspace_root.join("Cargo.toml"))
      .no_deps()
      .exec()?;
    Ok(Self { metadata })
  }

  /// Root package, if the manifest is not a virtual workspace
  pub fn root_package(&self) -> Option<&Package> {
    self.metadata.root_package()
  }

  /// Name of the binary to release
  ///
  /// The first `bin` target of the root package wins; a package without bin
  /// targets falls back to the package name.
  pub fn program_name(&self) -> FanoutResult<String> {
    let package = self.root_package().ok_or_else(|| {
      FanoutError::Config(ConfigError::ProgramUnknown {
        workspace_root: self.workspace_root().to_path_buf(),
      })
    })?;

    let bin = package
      .targets
      .iter()
      .find(|t| t.kind.iter().any(|k| *k == TargetKind::Bin))
      .map(|t| t.name.clone());

    Ok(bin.unwrap_or_else(|| package.name.to_string()))
  }

  pub fn workspace_root(&self) -> &Path {
    self.metadata.workspace_root.as_std_path()
  }
}
