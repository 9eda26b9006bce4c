use crate::core::error::{ConfigError, FanoutError, FanoutResult, ResultExt};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Configuration for cargo-fanout
/// Searched in order: fanout.toml, .fanout.toml, .cargo/fanout.toml, .config/fanout.toml
///
/// Every field is optional; a workspace without a config file builds the
/// root package's binary with the defaults below.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FanoutConfig {
  /// Binary name to build and publish (default: root package name)
  #[serde(default)]
  pub program: Option<String>,
  #[serde(default)]
  pub build: BuildConfig,
  #[serde(default)]
  pub release: ReleaseConfig,
}

/// Platform builder settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuildConfig {
  /// Parent of the per-platform cargo target directories
  #[serde(default = "default_target_dir")]
  pub target_dir: PathBuf,

  /// Artifact store directory shared by `build` and `publish`
  #[serde(default = "default_store_dir")]
  pub store_dir: PathBuf,

  /// Cargo executable
  #[serde(default = "default_cargo")]
  pub cargo: String,
}

fn default_target_dir() -> PathBuf {
  PathBuf::from("target").join("fanout")
}

fn default_store_dir() -> PathBuf {
  default_target_dir().join("store")
}

fn default_cargo() -> String {
  "cargo".to_string()
}

impl Default for BuildConfig {
  fn default() -> Self {
    Self {
      target_dir: default_target_dir(),
      store_dir: default_store_dir(),
      cargo: default_cargo(),
    }
  }
}

/// Release publisher settings
///
/// # Example
///
/// ```toml
/// [release]
/// tag_pattern = "v*"
/// repo = "owner/kill-zen-all"
/// generate_notes = true
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReleaseConfig {
  /// Glob a pushed tag must match to trigger a release
  #[serde(default = "default_tag_pattern")]
  pub tag_pattern: String,

  /// Branch whose pushes and pull requests trigger CI
  #[serde(default = "default_main_branch")]
  pub main_branch: String,

  /// Repository passed to `gh --repo` (default: gh infers from the remote)
  #[serde(default)]
  pub repo: Option<String>,

  /// Let GitHub generate notes; when false notes are rendered from git log
  #[serde(default = "default_true")]
  pub generate_notes: bool,

  /// Where the publisher retrieves artifacts into
  #[serde(default = "default_release_dir")]
  pub release_dir: PathBuf,
}

fn default_tag_pattern() -> String {
  "v*".to_string()
}

fn default_main_branch() -> String {
  "main".to_string()
}

fn default_true() -> bool {
  true
}

fn default_release_dir() -> PathBuf {
  default_target_dir().join("release")
}

impl Default for ReleaseConfig {
  fn default() -> Self {
    Self {
      tag_pattern: default_tag_pattern(),
      main_branch: default_main_branch(),
      repo: None,
      generate_notes: true,
      release_dir: default_release_dir(),
    }
  }
}

impl FanoutConfig {
  /// Find config file in search order: fanout.toml, .fanout.toml, .cargo/fanout.toml, .config/fanout.toml
  pub fn find_config_path(path: &Path) -> Option<PathBuf> {
    let candidates = vec![
      path.join("fanout.toml"),
      path.join(".fanout.toml"),
      path.join(".cargo").join("fanout.toml"),
      path.join(".config").join("fanout.toml"),
    ];

    candidates.into_iter().find(|p| p.exists())
  }

  /// Load config if present, defaults otherwise
  pub fn load_or_default(path: &Path) -> FanoutResult<Self> {
    match Self::find_config_path(path) {
      Some(config_path) => Self::load_from(&config_path),
      None => Ok(Self::default()),
    }
  }

  /// Load and validate a specific config file
  pub fn load_from(config_path: &Path) -> FanoutResult<Self> {
    let content = fs::read_to_string(config_path)
      .with_context(|| format!("Failed to read config from {}", config_path.display()))?;
    let config: FanoutConfig = toml_edit::de::from_str(&content).map_err(|e| {
      FanoutError::Config(ConfigError::Invalid {
        path: config_path.to_path_buf(),
        reason: e.to_string(),
      })
    })?;

    config.validate().map_err(|reason| {
      FanoutError::Config(ConfigError::Invalid {
        path: config_path.to_path_buf(),
        reason,
      })
    })?;

    log::debug!("loaded config from {}", config_path.display());
    Ok(config)
  }

  /// Validate field values
  pub fn validate(&self) -> Result<(), String> {
    if let Some(ref program) = self.program {
      validate_program_name(program)?;
    }

    if let Err(e) = glob::Pattern::new(&self.release.tag_pattern) {
      return Err(format!("tag_pattern '{}' is not a valid glob: {}", self.release.tag_pattern, e));
    }

    if self.release.main_branch.trim().is_empty() {
      return Err("main_branch must not be empty".to_string());
    }

    if let Some(ref repo) = self.release.repo
      && repo.split('/').filter(|s| !s.is_empty()).count() != 2
    {
      return Err(format!("repo '{}' must have the form 'owner/name'", repo));
    }

    if self.build.cargo.trim().is_empty() {
      return Err("build.cargo must not be empty".to_string());
    }

    self.validate_release_dir()
  }

  /// The publisher clears directories below release_dir, so it must not be
  /// the workspace itself or hold the build outputs it copies from
  fn validate_release_dir(&self) -> Result<(), String> {
    let configured = &self.release.release_dir;
    let release_dir = normalize(configured);

    if !release_dir.components().any(|c| matches!(c, Component::Normal(_))) {
      return Err(format!(
        "release_dir '{}' must name a directory below the workspace root",
        configured.display()
      ));
    }
    if release_dir.components().any(|c| matches!(c, Component::ParentDir)) {
      return Err(format!("release_dir '{}' must not contain '..'", configured.display()));
    }

    for (name, dir) in [("store_dir", &self.build.store_dir), ("target_dir", &self.build.target_dir)] {
      if normalize(dir).starts_with(&release_dir) {
        return Err(format!(
          "release_dir '{}' must not contain build.{} '{}'",
          configured.display(),
          name,
          dir.display()
        ));
      }
    }
    Ok(())
  }
}

/// A program name ends up in file names and store keys
pub fn validate_program_name(program: &str) -> Result<(), String> {
  if program.is_empty() {
    return Err("program must not be empty".to_string());
  }
  if program.contains(['/', '\\']) || program == "." || program == ".." {
    return Err(format!("program '{}' must be a plain file name", program));
  }
  Ok(())
}

/// Drop `.` components so paths compare lexically
pub fn normalize(path: &Path) -> PathBuf {
  path.components().filter(|c| !matches!(c, Component::CurDir)).collect()
}

/// Resolve a configured path against the workspace root
pub fn resolve(root: &Path, path: &Path) -> PathBuf {
  if path.is_absolute() {
    path.to_path_buf()
  } else {
    root.join(path)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  #[test]
  fn test_defaults() {
    let config = FanoutConfig::default();
    assert_eq!(config.release.tag_pattern, "v*");
    assert_eq!(config.release.main_branch, "main");
    assert!(config.release.generate_notes);
    assert_eq!(config.build.store_dir, PathBuf::from("target/fanout/store"));
    assert!(config.validate().is_ok());
  }

  #[test]
  fn test_load_partial_config() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(
      tmp.path().join("fanout.toml"),
      r#"
program = "kill-zen-all"

[release]
repo = "owner/kill-zen-all"
generate_notes = false
"#,
    )
    .unwrap();

    let config = FanoutConfig::load_or_default(tmp.path()).unwrap();
    assert_eq!(config.program.as_deref(), Some("kill-zen-all"));
    assert_eq!(config.release.repo.as_deref(), Some("owner/kill-zen-all"));
    assert!(!config.release.generate_notes);
    assert_eq!(config.release.tag_pattern, "v*");
    assert_eq!(config.build.cargo, "cargo");
  }

  #[test]
  fn test_search_order() {
    let tmp = TempDir::new().unwrap();
    std::fs::create_dir_all(tmp.path().join(".config")).unwrap();
    std::fs::write(tmp.path().join(".config/fanout.toml"), "").unwrap();
    assert_eq!(
      FanoutConfig::find_config_path(tmp.path()),
      Some(tmp.path().join(".config").join("fanout.toml"))
    );

    std::fs::write(tmp.path().join("fanout.toml"), "").unwrap();
    assert_eq!(
      FanoutConfig::find_config_path(tmp.path()),
      Some(tmp.path().join("fanout.toml"))
    );
  }

  #[test]
  fn test_missing_config_uses_defaults() {
    let tmp = TempDir::new().unwrap();
    let config = FanoutConfig::load_or_default(tmp.path()).unwrap();
    assert!(config.program.is_none());
  }

  #[test]
  fn test_unknown_keys_rejected() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(tmp.path().join("fanout.toml"), "[release]\ndraft = false\n").unwrap();
    let err = FanoutConfig::load_or_default(tmp.path()).unwrap_err();
    assert!(matches!(err, FanoutError::Config(ConfigError::Invalid { .. })));
  }

  #[test]
  fn test_invalid_values() {
    let mut config = FanoutConfig {
      program: Some("bin/tool".to_string()),
      ..Default::default()
    };
    assert!(config.validate().is_err());

    config.program = Some("tool".to_string());
    config.release.tag_pattern = "v[".to_string();
    assert!(config.validate().is_err());

    config.release.tag_pattern = "v*".to_string();
    config.release.repo = Some("just-a-name".to_string());
    assert!(config.validate().is_err());
  }

  #[test]
  fn test_release_dir_must_not_cover_workspace_or_builds() {
    for release_dir in ["", ".", "./", "/", "../elsewhere", "target", "target/fanout"] {
      let mut config = FanoutConfig::default();
      config.release.release_dir = PathBuf::from(release_dir);
      assert!(config.validate().is_err(), "release_dir '{}' accepted", release_dir);
    }

    let mut config = FanoutConfig::default();
    config.release.release_dir = PathBuf::from("dist");
    config.build.store_dir = PathBuf::from("./dist/store");
    assert!(config.validate().is_err());

    config.build.store_dir = PathBuf::from("target/fanout/store");
    assert!(config.validate().is_ok());
  }

  #[test]
  fn test_release_dir_dot_rejected_on_load() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(tmp.path().join("fanout.toml"), "[release]\nrelease_dir = \".\"\n").unwrap();
    let err = FanoutConfig::load_or_default(tmp.path()).unwrap_err();
    assert!(matches!(err, FanoutError::Config(ConfigError::Invalid { ref reason, .. }) if reason.contains("release_dir")));
  }

  #[test]
  fn test_resolve() {
    let root = Path::new("/work");
    assert_eq!(resolve(root, Path::new("target/x")), PathBuf::from("/work/target/x"));
    assert_eq!(resolve(root, Path::new("/abs")), PathBuf::from("/abs"));
  }
}
