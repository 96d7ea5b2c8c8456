//! PathfindingConfig - scheduling knobs for the background solver.

use std::time::Duration;

use crate::error::NavError;
use crate::metrics::DEFAULT_TIMING_WINDOW;

#[derive(Clone, Debug)]
pub struct PathfindingConfig {
  /// Seconds between request rotations while the current one is unfinished.
  pub restart_interval: f32,

  /// How long the worker waits for a start signal before re-checking flags.
  pub idle_sleep: Duration,

  /// Number of solve durations kept for the average.
  pub timing_window: usize,

  /// Seed for picking request start positions among leaf occupants.
  /// `None` seeds from the OS.
  pub seed: Option<u64>,

  /// Name of the worker thread.
  pub thread_name: String,
}

impl PathfindingConfig {
  pub fn validate(&self) -> Result<(), NavError> {
    if !(self.restart_interval >= 0.0) {
      return Err(NavError::InvalidConfig {
        field: "restart_interval",
        reason: "must be non-negative",
      });
    }
    if self.idle_sleep.is_zero() {
      return Err(NavError::InvalidConfig {
        field: "idle_sleep",
        reason: "must be greater than zero",
      });
    }
    if self.timing_window == 0 {
      return Err(NavError::InvalidConfig {
        field: "timing_window",
        reason: "must hold at least one sample",
      });
    }
    Ok(())
  }
}

impl Default for PathfindingConfig {
  fn default() -> Self {
    Self {
      restart_interval: 0.05,
      idle_sleep: Duration::from_millis(10),
      timing_window: DEFAULT_TIMING_WINDOW,
      seed: None,
      thread_name: "path-solver".to_string(),
    }
  }
}
