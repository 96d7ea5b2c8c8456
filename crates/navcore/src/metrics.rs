//! Engine-agnostic statistics for pathfinding diagnostics.
//!
//! The worker pushes one timing sample per solve into a [`SolveTimings`];
//! snapshots ([`PathfindingStats`], [`LevelStats`]) are plain values an
//! external debug overlay can render.
//!
//! # Usage
//!
//! ```ignore
//! let stats = level.stats();
//! println!(
//!     "paths {}/{} | solve {:.2} ms (avg {:.2} ms)",
//!     stats.pathfinding.active_requests,
//!     stats.pathfinding.total_requests,
//!     stats.pathfinding.latest_solve_ms,
//!     stats.pathfinding.average_solve_ms,
//! );
//! ```

use std::collections::VecDeque;
use std::time::Duration;

/// Fixed-size history of `u64` samples; the oldest sample falls out first.
#[derive(Debug, Clone)]
pub struct RollingWindow {
    samples: VecDeque<u64>,
    limit: usize,
}

impl RollingWindow {
    /// Window holding up to `limit` samples (never fewer than one).
    pub fn new(limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            samples: VecDeque::with_capacity(limit),
            limit,
        }
    }

    pub fn push(&mut self, sample: u64) {
        if self.samples.len() == self.limit {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Samples from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = u64> + '_ {
        self.samples.iter().copied()
    }

    pub fn last(&self) -> Option<u64> {
        self.samples.back().copied()
    }

    /// Arithmetic mean, 0 while empty.
    pub fn average(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let total: u64 = self.samples.iter().sum();
        total as f64 / self.samples.len() as f64
    }
}

// =============================================================================
// SolveTimings
// =============================================================================

/// Default number of solve samples kept.
pub const DEFAULT_TIMING_WINDOW: usize = 100;

/// History of solve durations, stored in microseconds.
#[derive(Debug, Clone)]
pub struct SolveTimings {
    window: RollingWindow,
    total_solves: u64,
}

impl SolveTimings {
    pub fn new(capacity: usize) -> Self {
        Self {
            window: RollingWindow::new(capacity),
            total_solves: 0,
        }
    }

    pub fn record(&mut self, elapsed: Duration) {
        let micros = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);
        self.window.push(micros);
        self.total_solves += 1;
    }

    /// Duration of the most recent solve, 0 before the first one.
    pub fn latest_ms(&self) -> f64 {
        self.window.last().map_or(0.0, |us| us as f64 / 1000.0)
    }

    /// Mean over the window, 0 before the first solve.
    pub fn average_ms(&self) -> f64 {
        self.window.average() / 1000.0
    }

    /// Window contents oldest to newest, in milliseconds.
    pub fn samples_ms(&self) -> Vec<f64> {
        self.window.iter().map(|us| us as f64 / 1000.0).collect()
    }

    pub fn sample_count(&self) -> usize {
        self.window.len()
    }

    /// Solves recorded since creation, including evicted samples.
    pub fn total_solves(&self) -> u64 {
        self.total_solves
    }
}

impl Default for SolveTimings {
    fn default() -> Self {
        Self::new(DEFAULT_TIMING_WINDOW)
    }
}

// =============================================================================
// Snapshots
// =============================================================================

/// Pathfinding manager snapshot for debug overlays.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PathfindingStats {
    pub latest_solve_ms: f64,
    pub average_solve_ms: f64,
    pub solve_samples: usize,
    pub total_solves: u64,
    /// Pending requests plus the current one.
    pub total_requests: usize,
    /// Requests not running on a borrowed path.
    pub active_requests: usize,
    pub populated_leaves: usize,
    pub total_leaves: usize,
}

/// Whole-level snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LevelStats {
    pub pathfinding: PathfindingStats,
    pub agents: usize,
    pub agents_with_path: usize,
    pub nav_nodes: usize,
    pub perimeter_edges: usize,
}
