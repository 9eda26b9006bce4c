//! Release pipeline state machine
//!
//! ```text
//! Idle -> Building -> Joining -> Publishing -> Done
//!            |           |            |
//!            +-----------+------------+-----> Failed
//! ```
//!
//! `Done` and `Failed` are terminal. There is no edge from `Failed` back
//! into the pipeline; a failed run is re-triggered from scratch.

use crate::core::error::{FanoutError, FanoutResult};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineState {
  Idle,
  Building,
  Joining,
  Publishing,
  Done,
  Failed,
}

impl PipelineState {
  pub fn as_str(self) -> &'static str {
    match self {
      PipelineState::Idle => "idle",
      PipelineState::Building => "building",
      PipelineState::Joining => "joining",
      PipelineState::Publishing => "publishing",
      PipelineState::Done => "done",
      PipelineState::Failed => "failed",
    }
  }

  pub fn is_terminal(self) -> bool {
    matches!(self, PipelineState::Done | PipelineState::Failed)
  }

  pub fn can_advance_to(self, next: PipelineState) -> bool {
    use PipelineState::*;
    matches!(
      (self, next),
      (Idle, Building)
        | (Building, Joining)
        | (Joining, Publishing)
        | (Publishing, Done)
        | (Building, Failed)
        | (Joining, Failed)
        | (Publishing, Failed)
    )
  }
}

impl fmt::Display for PipelineState {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Current state plus every state visited, starting at `Idle`
#[derive(Debug, Clone)]
pub struct StateMachine {
  history: Vec<PipelineState>,
}

impl StateMachine {
  pub fn new() -> Self {
    Self {
      history: vec![PipelineState::Idle],
    }
  }

  pub fn current(&self) -> PipelineState {
    self.history.last().copied().unwrap_or(PipelineState::Idle)
  }

  pub fn history(&self) -> &[PipelineState] {
    &self.history
  }

  /// Move to `next`, rejecting edges the diagram does not have
  pub fn advance(&mut self, next: PipelineState) -> FanoutResult<()> {
    let current = self.current();
    if !current.can_advance_to(next) {
      return Err(FanoutError::message(format!(
        "Invalid pipeline transition: {} -> {}",
        current, next
      )));
    }
    log::debug!("pipeline: {} -> {}", current, next);
    self.history.push(next);
    Ok(())
  }
}

impl Default for StateMachine {
  fn default() -> Self {
    Self::new()
  }
}
