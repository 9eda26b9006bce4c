//! `cargo fanout targets` - Show the platform table

use crate::commands::print_json;
use crate::core::context::PipelineContext;
use crate::core::error::FanoutResult;
use crate::platform::{OsId, Precondition, TARGETS};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct TargetRow {
  os_id: OsId,
  triple: &'static str,
  artifact: String,
  key: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  precondition: Option<&'static Precondition>,
}

/// Run the targets command
pub fn run_targets(ctx: &PipelineContext, json: bool) -> FanoutResult<()> {
  let program = ctx.program()?;

  let rows: Vec<TargetRow> = TARGETS
    .iter()
    .map(|t| TargetRow {
      os_id: t.os_id,
      triple: t.triple,
      artifact: t.artifact_file_name(program),
      key: t.artifact_key(program).to_string(),
      precondition: t.precondition,
    })
    .collect();

  if json {
    return print_json(&rows);
  }

  println!("🎯 Release targets for '{}'", program);
  println!("════════════════════════════════════════");
  for row in &rows {
    println!("  {:<8} {:<26} {}", row.os_id, row.triple, row.artifact);
    if let Some(pre) = row.precondition {
      println!("           needs {}: {}", pre.name, pre.packages.join(" "));
    }
  }
  Ok(())
}
