//! Agent - the crate's concrete mobile object.

use std::sync::Arc;

use glam::Vec3;

use crate::geometry::Sphere;
use crate::octree::{ObjectId, OctreeObject};
use crate::pathfinding::Path;

/// Mobile object that follows the path of the leaf it stands in.
#[derive(Clone, Debug)]
pub struct Agent {
  id: ObjectId,
  position: Vec3,
  radius: f32,
  path: Option<Arc<Path>>,
}

impl Agent {
  pub fn new(id: ObjectId, position: Vec3, radius: f32) -> Self {
    Self {
      id,
      position,
      radius,
      path: None,
    }
  }

  #[inline]
  pub fn radius(&self) -> f32 {
    self.radius
  }

  pub fn set_position(&mut self, position: Vec3) {
    self.position = position;
  }

  /// Path handed out on the last level tick.
  pub fn path(&self) -> Option<&Arc<Path>> {
    self.path.as_ref()
  }

  pub fn set_path(&mut self, path: Option<Arc<Path>>) {
    self.path = path;
  }
}

impl OctreeObject for Agent {
  fn id(&self) -> ObjectId {
    self.id
  }

  fn position(&self) -> Vec3 {
    self.position
  }

  fn bounding_sphere(&self) -> Sphere {
    Sphere::new(self.position, self.radius)
  }
}
