//! Construction-time errors.
//!
//! Runtime query failures are not errors: a missing path is
//! [`PathResult::NotFound`](crate::solver::PathResult), an unresolved point is
//! `None`, and a request without nodes simply completes.

use thiserror::Error;

/// Errors raised while building navigation data or starting the worker.
#[derive(Debug, Error)]
pub enum NavError {
  #[error("invalid config `{field}`: {reason}")]
  InvalidConfig {
    field: &'static str,
    reason: &'static str,
  },

  #[error("index buffer length {0} is not a multiple of 3")]
  IndexCountNotTriangles(usize),

  #[error("index {index} out of range for {vertex_count} vertices")]
  IndexOutOfRange { index: u32, vertex_count: usize },

  #[error("{normals} normals supplied for {positions} positions")]
  NormalCountMismatch { positions: usize, normals: usize },

  #[error("failed to spawn pathfinding worker")]
  WorkerSpawn(#[source] std::io::Error),
}

/// Result alias for fallible navcore operations.
pub type Result<T> = std::result::Result<T, NavError>;
