//! Mobile objects tracked by the octree.

use glam::Vec3;
use smallvec::SmallVec;

use super::node::NodeId;
use crate::geometry::Sphere;

/// Stable identifier of a mobile object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub u64);

/// Anything that moves through the level and wants broad-phase queries.
pub trait OctreeObject {
  fn id(&self) -> ObjectId;

  fn position(&self) -> Vec3;

  /// Sphere used to find the neighbour leaves the object overlaps.
  fn bounding_sphere(&self) -> Sphere;
}

/// What the octree remembers about a registered object.
#[derive(Clone, Debug)]
pub struct ObjectTracking {
  /// Leaf currently holding the object.
  pub leaf: NodeId,
  /// Position at the last insert/update.
  pub position: Vec3,
  pub bounding_sphere: Sphere,
  /// Neighbour leaves of `leaf` whose box intersects `bounding_sphere`.
  pub neighbour_leaves: SmallVec<[NodeId; 8]>,
}
