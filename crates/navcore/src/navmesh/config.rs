//! NavMeshConfig - build and query tolerances.

use crate::error::NavError;

/// Tolerances used while building and querying a [`NavMesh`](super::NavMesh).
#[derive(Clone, Debug)]
pub struct NavMeshConfig {
  /// Two vertices closer than this on every axis are the same vertex.
  pub vertex_weld_epsilon: f32,

  /// Height above a query point where the vertical ray starts.
  pub ray_above: f32,

  /// Depth below a query point where the vertical ray ends.
  pub ray_below: f32,

  /// Max angle (radians) between two perimeter segments that still merge.
  pub edge_merge_tolerance: f32,
}

impl NavMeshConfig {
  pub fn validate(&self) -> Result<(), NavError> {
    if !(self.vertex_weld_epsilon >= 0.0) {
      return Err(NavError::InvalidConfig {
        field: "vertex_weld_epsilon",
        reason: "must be non-negative",
      });
    }
    if !(self.ray_above >= 0.0 && self.ray_below >= 0.0) {
      return Err(NavError::InvalidConfig {
        field: "ray_above/ray_below",
        reason: "must be non-negative",
      });
    }
    if self.ray_above + self.ray_below <= 0.0 {
      return Err(NavError::InvalidConfig {
        field: "ray_above/ray_below",
        reason: "ray must have non-zero length",
      });
    }
    if !(0.0..std::f32::consts::FRAC_PI_2).contains(&self.edge_merge_tolerance) {
      return Err(NavError::InvalidConfig {
        field: "edge_merge_tolerance",
        reason: "must be in [0, pi/2)",
      });
    }
    Ok(())
  }
}

impl Default for NavMeshConfig {
  fn default() -> Self {
    Self {
      vertex_weld_epsilon: 1e-4,
      ray_above: 1.0,
      ray_below: 10.0,
      edge_merge_tolerance: 0.1,
    }
  }
}
