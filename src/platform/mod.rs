//! Platform table and the artifact naming contract
//!
//! The three release platforms are enumerated statically. Everything the
//! builder writes and everything the publisher expects is derived from this
//! table by pure functions, so the two sides cannot drift apart:
//!
//! | os_id   | triple                     | suffix     | extension |
//! |---------|----------------------------|------------|-----------|
//! | linux   | x86_64-unknown-linux-gnu   | `-linux`   |           |
//! | windows | x86_64-pc-windows-msvc     | `-windows` | `.exe`    |
//! | macos   | x86_64-apple-darwin        | `-macos`   |           |

use crate::core::error::{ConfigError, FanoutError};
use crate::core::exec::CommandSpec;
use crate::store::ArtifactKey;
use clap::ValueEnum;
use serde::Serialize;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Platform identifier, also the last segment of the artifact key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OsId {
  Linux,
  Windows,
  Macos,
}

impl OsId {
  pub fn as_str(self) -> &'static str {
    match self {
      OsId::Linux => "linux",
      OsId::Windows => "windows",
      OsId::Macos => "macos",
    }
  }
}

impl fmt::Display for OsId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for OsId {
  type Err = FanoutError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "linux" => Ok(OsId::Linux),
      "windows" => Ok(OsId::Windows),
      "macos" => Ok(OsId::Macos),
      other => Err(FanoutError::Config(ConfigError::UnknownTarget {
        os_id: other.to_string(),
      })),
    }
  }
}

/// A setup step a platform needs before its dependencies can be fetched
#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct Precondition {
  pub name: &'static str,
  pub packages: &'static [&'static str],
}

impl Precondition {
  /// Commands that satisfy this precondition, in order
  pub fn commands(&self, cwd: &Path) -> Vec<CommandSpec> {
    vec![
      CommandSpec::new("sudo", cwd).args(["apt-get", "update"]),
      CommandSpec::new("sudo", cwd)
        .args(["apt-get", "install", "-y"])
        .args(self.packages.iter().copied()),
    ]
  }
}

/// X11 clipboard libraries the application links against on Linux
pub static NATIVE_UI_DEPS: Precondition = Precondition {
  name: "native-deps",
  packages: &[
    "libxcb1-dev",
    "libxcb-render0-dev",
    "libxcb-shape0-dev",
    "libxcb-xfixes0-dev",
  ],
};

/// One release platform
#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct PlatformTarget {
  pub os_id: OsId,
  pub triple: &'static str,
  pub binary_extension: &'static str,
  pub artifact_suffix: &'static str,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub precondition: Option<&'static Precondition>,
}

/// All release platforms, in release file order
pub static TARGETS: [PlatformTarget; 3] = [
  PlatformTarget {
    os_id: OsId::Linux,
    triple: "x86_64-unknown-linux-gnu",
    binary_extension: "",
    artifact_suffix: "-linux",
    precondition: Some(&NATIVE_UI_DEPS),
  },
  PlatformTarget {
    os_id: OsId::Windows,
    triple: "x86_64-pc-windows-msvc",
    binary_extension: ".exe",
    artifact_suffix: "-windows",
    precondition: None,
  },
  PlatformTarget {
    os_id: OsId::Macos,
    triple: "x86_64-apple-darwin",
    binary_extension: "",
    artifact_suffix: "-macos",
    precondition: None,
  },
];

impl PlatformTarget {
  /// File name cargo leaves in `<target-dir>/<triple>/release/`
  pub fn build_output_name(&self, program: &str) -> String {
    format!("{}{}", program, self.binary_extension)
  }

  /// Published file name: `<program><suffix><extension>`
  pub fn artifact_file_name(&self, program: &str) -> String {
    format!("{}{}{}", program, self.artifact_suffix, self.binary_extension)
  }

  /// Store key: `<program>-<os_id>`
  pub fn artifact_key(&self, program: &str) -> ArtifactKey {
    ArtifactKey::new(format!("{}-{}", program, self.os_id))
  }
}

/// Look up a platform by id
pub fn find_target(os_id: OsId) -> &'static PlatformTarget {
  match os_id {
    OsId::Linux => &TARGETS[0],
    OsId::Windows => &TARGETS[1],
    OsId::Macos => &TARGETS[2],
  }
}

/// Keys for every platform, in table order
pub fn all_keys(program: &str) -> Vec<ArtifactKey> {
  TARGETS.iter().map(|t| t.artifact_key(program)).collect()
}
