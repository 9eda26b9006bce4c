//! Git hook installation
//!
//! Hooks are tiny shell scripts that hand over to `cargo fanout gate`.
//! A marker line identifies scripts we own; anything else in the hooks
//! directory is left alone unless `--force` is given.

use crate::core::error::{FanoutError, FanoutResult, ResultExt};
use crate::gate::GateKind;
use std::fs;
use std::path::{Path, PathBuf};

/// Marker line in every script this tool writes
pub const HOOK_MARKER: &str = "# managed by cargo-fanout";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookStatus {
  Created,
  Updated,
  /// A foreign hook was overwritten with `--force`
  Replaced,
}

#[derive(Debug, Clone)]
pub struct InstalledHook {
  pub name: &'static str,
  pub path: PathBuf,
  pub status: HookStatus,
}

/// Script body for the hook running `gate`
pub fn hook_script(gate: GateKind) -> String {
  format!(
    "#!/bin/sh\n{}\n# Reinstall with `cargo fanout hooks install --force`.\nexec cargo fanout gate {}\n",
    HOOK_MARKER, gate
  )
}

/// Install the pre-commit and pre-push hooks into `hooks_dir`
///
/// Existing hooks without the marker are refused as a whole before anything
/// is written, unless `force` is set.
pub fn install_hooks(hooks_dir: &Path, force: bool) -> FanoutResult<Vec<InstalledHook>> {
  let gates: Vec<(GateKind, &'static str)> = [GateKind::PreCommit, GateKind::PrePush]
    .into_iter()
    .filter_map(|g| g.hook_name().map(|name| (g, name)))
    .collect();

  if !force {
    let foreign: Vec<String> = gates
      .iter()
      .map(|(_, name)| hooks_dir.join(name))
      .filter(|path| is_foreign(path))
      .map(|path| path.display().to_string())
      .collect();
    if !foreign.is_empty() {
      return Err(FanoutError::with_help(
        format!("Refusing to overwrite existing hooks: {}", foreign.join(", ")),
        "Re-run with --force to replace them, or call `cargo fanout gate <hook>` from your own hooks.",
      ));
    }
  }

  fs::create_dir_all(hooks_dir).with_context(|| format!("Failed to create {}", hooks_dir.display()))?;

  let mut installed = Vec::with_capacity(gates.len());
  for (gate, name) in gates {
    let path = hooks_dir.join(name);
    let status = if !path.exists() {
      HookStatus::Created
    } else if is_foreign(&path) {
      HookStatus::Replaced
    } else {
      HookStatus::Updated
    };

    fs::write(&path, hook_script(gate)).with_context(|| format!("Failed to write {}", path.display()))?;
    make_executable(&path)?;
    log::debug!("installed {} hook at {}", name, path.display());

    installed.push(InstalledHook { name, path, status });
  }

  Ok(installed)
}

fn is_foreign(path: &Path) -> bool {
  match fs::read_to_string(path) {
    Ok(content) => !content.contains(HOOK_MARKER),
    // Unreadable or non-UTF-8 files are someone else's
    Err(_) => path.exists(),
  }
}

#[cfg(unix)]
fn make_executable(path: &Path) -> FanoutResult<()> {
  use std::os::unix::fs::PermissionsExt;
  fs::set_permissions(path, fs::Permissions::from_mode(0o755))
    .with_context(|| format!("Failed to make {} executable", path.display()))
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> FanoutResult<()> {
  Ok(())
}
