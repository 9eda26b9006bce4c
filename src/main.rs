mod build;
mod cargo;
mod commands;
mod core;
mod gate;
mod pipeline;
mod platform;
mod release;
mod store;
mod ui;

#[cfg(test)]
mod testing;

use clap::{Parser, Subcommand};
use commands::TriggerArgs;
use core::error::{FanoutError, print_error};
use gate::GateKind;
use platform::OsId;
use std::path::PathBuf;

/// Build one release binary per platform in parallel and publish them together
#[derive(Parser)]
#[command(name = "cargo")]
#[command(bin_name = "cargo")]
#[command(styles = get_styles())]
enum CargoCli {
  Fanout(FanoutCli),
}

#[derive(Parser)]
#[command(name = "fanout")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(styles = get_styles())]
struct FanoutCli {
  /// Show debug logging (same as RUST_LOG=cargo_fanout=debug)
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  // ============================================================================
  // Release Pipeline
  // ============================================================================
  /// Show release platforms, artifact names and store keys
  Targets {
    /// Output in JSON format
    #[arg(long)]
    json: bool,
  },

  /// Build the release binary for one platform and put it into the store
  Build {
    /// Platform to build
    #[arg(long, value_enum)]
    target: OsId,
    /// Artifact store directory (default: build.store_dir)
    #[arg(long)]
    store: Option<PathBuf>,
    /// Show the build steps without running them
    #[arg(long)]
    dry_run: bool,
    /// Output in JSON format
    #[arg(long)]
    json: bool,
  },

  /// Create the draft release from a fully populated store
  Publish {
    #[command(flatten)]
    trigger: TriggerArgs,
    /// Artifact store directory (default: build.store_dir)
    #[arg(long)]
    store: Option<PathBuf>,
    /// Show the release request without sending it
    #[arg(long)]
    dry_run: bool,
    /// Output in JSON format
    #[arg(long)]
    json: bool,
  },

  /// Run the whole release pipeline: build every platform, join, publish
  Run {
    #[command(flatten)]
    trigger: TriggerArgs,
    /// Show the pipeline plan without running it
    #[arg(long)]
    dry_run: bool,
    /// Output the run report in JSON format
    #[arg(long)]
    json: bool,
  },

  // ============================================================================
  // Quality Gates
  // ============================================================================
  /// Run a quality gate (stops at the first failing stage)
  Gate {
    /// Gate to run
    #[arg(value_enum)]
    kind: GateKind,
  },

  /// Run the ci gate if the trigger is a push to or pull request against main
  Ci {
    #[command(flatten)]
    trigger: TriggerArgs,
  },

  /// Manage git hooks
  #[command(subcommand)]
  Hooks(HooksCommands),
}

#[derive(Subcommand)]
enum HooksCommands {
  /// Install pre-commit and pre-push hooks that run the gates
  Install {
    /// Overwrite hooks not written by cargo-fanout
    #[arg(long)]
    force: bool,
  },
}

fn get_styles() -> clap::builder::Styles {
  let yellow = anstyle::Color::Ansi(anstyle::AnsiColor::Yellow);
  let green = anstyle::Color::Ansi(anstyle::AnsiColor::Green);
  let red = anstyle::Color::Ansi(anstyle::AnsiColor::Red);

  clap::builder::Styles::styled()
    .usage(anstyle::Style::new().bold().underline().fg_color(Some(yellow)))
    .header(anstyle::Style::new().bold().underline().fg_color(Some(yellow)))
    .literal(anstyle::Style::new().fg_color(Some(green)))
    .invalid(anstyle::Style::new().bold().fg_color(Some(red)))
    .error(anstyle::Style::new().bold().fg_color(Some(red)))
    .valid(anstyle::Style::new().bold().underline().fg_color(Some(green)))
    .placeholder(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::White))))
}

fn init_logging(verbose: bool) {
  let default_filter = if verbose { "cargo_fanout=debug" } else { "warn" };
  env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
    .format_timestamp(None)
    .init();
}

fn main() {
  let CargoCli::Fanout(cli) = CargoCli::parse();
  init_logging(cli.verbose);

  // Build the context once; the program name is resolved lazily so gates
  // and hooks work outside a cargo package
  let workspace_root = match std::env::current_dir() {
    Ok(dir) => dir,
    Err(e) => {
      eprintln!("Error: Failed to get current directory: {}", e);
      std::process::exit(1);
    }
  };

  let ctx = match core::context::PipelineContext::build(&workspace_root) {
    Ok(ctx) => ctx,
    Err(e) => handle_error(e),
  };

  let result = match cli.command {
    // Release Pipeline
    Commands::Targets { json } => commands::run_targets(&ctx, json),
    Commands::Build {
      target,
      store,
      dry_run,
      json,
    } => commands::run_build(&ctx, target, store, dry_run, json),
    Commands::Publish {
      trigger,
      store,
      dry_run,
      json,
    } => commands::run_publish(&ctx, trigger, store, dry_run, json),
    Commands::Run { trigger, dry_run, json } => commands::run_pipeline(&ctx, trigger, dry_run, json),

    // Quality Gates
    Commands::Gate { kind } => commands::run_gate(&ctx, kind),
    Commands::Ci { trigger } => commands::run_ci(&ctx, trigger),
    Commands::Hooks(HooksCommands::Install { force }) => commands::run_hooks_install(&ctx, force),
  };

  if let Err(err) = result {
    handle_error(err);
  }
}

fn handle_error(err: FanoutError) -> ! {
  print_error(&err);
  std::process::exit(err.exit_code().as_i32());
}
