//! Progress indicators for parallel platform builds
//!
//! Uses `linya` for allocation-free, concurrency-optimized progress bars.
//! One bar per platform; builders on different rayon workers advance their
//! own bar through a shared, mutex-guarded `Progress`.

use linya::{Bar, Progress};
use std::sync::{Arc, Mutex};

/// Multi-bar progress for parallel operations
/// Thread-safe wrapper for concurrent progress tracking
#[derive(Clone)]
pub struct MultiProgress {
  progress: Arc<Mutex<Progress>>,
}

impl MultiProgress {
  /// Create a new multi-progress container
  pub fn new() -> Self {
    Self {
      progress: Arc::new(Mutex::new(Progress::new())),
    }
  }

  /// Add a bar for one build, `steps` long
  pub fn add_target(&self, steps: usize, label: impl Into<String>) -> Option<TargetProgress> {
    let mut progress = self.progress.lock().ok()?;
    let bar = progress.bar(steps.max(1), label.into());
    Some(TargetProgress {
      progress: self.progress.clone(),
      bar,
    })
  }
}

impl Default for MultiProgress {
  fn default() -> Self {
    Self::new()
  }
}

/// Handle a single builder uses to advance its own bar
pub struct TargetProgress {
  progress: Arc<Mutex<Progress>>,
  bar: Bar,
}

impl TargetProgress {
  /// Mark one build step as done
  pub fn step(&self) {
    // A poisoned lock only means another bar panicked mid-draw; skip drawing
    if let Ok(mut progress) = self.progress.lock() {
      progress.inc_and_draw(&self.bar, 1);
    }
  }
}
