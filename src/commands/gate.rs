//! `cargo fanout gate`, `ci` and `hooks install`

use crate::commands::TriggerArgs;
use crate::core::context::PipelineContext;
use crate::core::error::FanoutResult;
use crate::core::exec::SystemRunner;
use crate::core::vcs::SystemGit;
use crate::gate::hooks::{HookStatus, install_hooks};
use crate::gate::{self, GateKind};

/// Run one quality gate
pub fn run_gate(ctx: &PipelineContext, kind: GateKind) -> FanoutResult<()> {
  println!("🎯 Running {} gate", kind);
  gate::run_gate(kind, &SystemRunner, ctx.workspace_root(), &ctx.config.build.cargo)?;
  Ok(())
}

/// Run the CI pipeline if the trigger is a push to, or pull request against, the main branch
pub fn run_ci(ctx: &PipelineContext, trigger: TriggerArgs) -> FanoutResult<()> {
  let event = trigger.resolve(ctx)?;
  let main_branch = &ctx.config.release.main_branch;

  if !event.triggers_ci(main_branch) {
    println!("⏭️  {} does not trigger CI (main branch: {})", event, main_branch);
    return Ok(());
  }

  println!("🎯 CI pipeline: {}", event);
  gate::run_gate(GateKind::Ci, &SystemRunner, ctx.workspace_root(), &ctx.config.build.cargo)?;
  Ok(())
}

/// Install the pre-commit and pre-push hooks
pub fn run_hooks_install(ctx: &PipelineContext, force: bool) -> FanoutResult<()> {
  let git = SystemGit::open(ctx.workspace_root())?;
  let hooks_dir = git.hooks_dir()?;

  for hook in install_hooks(&hooks_dir, force)? {
    let verb = match hook.status {
      HookStatus::Created => "Installed",
      HookStatus::Updated => "Updated",
      HookStatus::Replaced => "Replaced",
    };
    println!("✅ {} {} hook: {}", verb, hook.name, hook.path.display());
  }
  Ok(())
}
