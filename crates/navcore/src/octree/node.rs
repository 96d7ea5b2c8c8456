//! OctreeNode - arena entry for one cube of the spatial octree.

use glam::Vec3;
use smallvec::SmallVec;

use super::object::ObjectId;
use crate::geometry::Aabb;

/// Index of a node inside the octree arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
  #[inline]
  pub fn index(self) -> usize {
    self.0 as usize
  }
}

/// Unit direction from a parent center towards the given child octant.
///
/// Octant: 0-7 where bits represent +X, +Y, +Z offsets:
/// - bit 0: X offset (-1 or +1)
/// - bit 1: Y offset (-1 or +1)
/// - bit 2: Z offset (-1 or +1)
#[inline]
pub fn octant_direction(octant: u8) -> Vec3 {
  let axis = |bit: u8| if (octant >> bit) & 1 == 1 { 1.0 } else { -1.0 };
  Vec3::new(axis(0), axis(1), axis(2))
}

/// One cube of the tree.
///
/// Only leaves (no children) hold objects. The object list is kept sorted
/// by id.
#[derive(Clone, Debug)]
pub struct OctreeNode {
  pub id: NodeId,
  pub bounds: Aabb,
  pub parent: Option<NodeId>,
  /// Octant within the parent, `None` for the root.
  pub octant: Option<u8>,
  pub depth: u32,
  pub children: SmallVec<[NodeId; 8]>,
  /// Leaves whose boxes intersect this leaf's box. Empty for inner nodes.
  pub neighbours: Vec<NodeId>,
  objects: Vec<ObjectId>,
}

impl OctreeNode {
  pub(super) fn new(id: NodeId, bounds: Aabb, parent: Option<NodeId>, octant: Option<u8>, depth: u32) -> Self {
    Self {
      id,
      bounds,
      parent,
      octant,
      depth,
      children: SmallVec::new(),
      neighbours: Vec::new(),
      objects: Vec::new(),
    }
  }

  #[inline]
  pub fn center(&self) -> Vec3 {
    self.bounds.center()
  }

  #[inline]
  pub fn is_leaf(&self) -> bool {
    self.children.is_empty()
  }

  /// Registered objects, ascending by id.
  #[inline]
  pub fn objects(&self) -> &[ObjectId] {
    &self.objects
  }

  #[inline]
  pub fn has_objects(&self) -> bool {
    !self.objects.is_empty()
  }

  #[inline]
  pub fn contains_object(&self, id: ObjectId) -> bool {
    self.objects.binary_search(&id).is_ok()
  }

  /// Insert keeping the list sorted. Returns false if already present.
  pub(super) fn add_object(&mut self, id: ObjectId) -> bool {
    match self.objects.binary_search(&id) {
      Ok(_) => false,
      Err(at) => {
        self.objects.insert(at, id);
        true
      }
    }
  }

  pub(super) fn remove_object(&mut self, id: ObjectId) -> bool {
    match self.objects.binary_search(&id) {
      Ok(at) => {
        self.objects.remove(at);
        true
      }
      Err(_) => false,
    }
  }
}
