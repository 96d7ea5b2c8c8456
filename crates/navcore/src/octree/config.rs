//! OctreeConfig - subdivision limits.

use crate::error::NavError;

/// Configuration for building the spatial octree over a nav mesh.
#[derive(Clone, Debug)]
pub struct OctreeConfig {
  /// Number of levels including the root. A node at depth `d` subdivides
  /// only while `d + 1 < depth_limit`, so leaves sit at `depth_limit - 1`.
  pub depth_limit: u32,

  /// Half-size of the box around each nav-mesh node center used to decide
  /// whether a child cube is worth creating.
  pub prune_margin: f32,
}

impl OctreeConfig {
  pub fn validate(&self) -> Result<(), NavError> {
    if self.depth_limit == 0 {
      return Err(NavError::InvalidConfig {
        field: "depth_limit",
        reason: "must be at least 1",
      });
    }
    if self.depth_limit > 16 {
      return Err(NavError::InvalidConfig {
        field: "depth_limit",
        reason: "must not exceed 16",
      });
    }
    if !(self.prune_margin >= 0.0) {
      return Err(NavError::InvalidConfig {
        field: "prune_margin",
        reason: "must be non-negative",
      });
    }
    Ok(())
  }

  /// Depth of the deepest possible leaf.
  #[inline]
  pub fn leaf_depth(&self) -> u32 {
    self.depth_limit.saturating_sub(1)
  }
}

impl Default for OctreeConfig {
  fn default() -> Self {
    Self {
      depth_limit: 6,
      prune_margin: 1.0,
    }
  }
}
