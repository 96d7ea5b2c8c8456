//! Spatial octree for broad-phase queries over mobile objects.
//!
//! The tree is built once per level from the nav mesh: the root is the cube
//! around every walkable vertex, and a child cube is only created where some
//! nav-mesh node lies close by. Leaves are the cells objects live in and the
//! unit the pathfinding manager issues requests for.
//!
//! # Module Structure
//!
//! - [`node`]: `OctreeNode` arena entries addressed by `NodeId`
//! - [`config`]: `OctreeConfig` depth limit and pruning margin
//! - [`object`]: `OctreeObject` trait and per-object tracking
//!
//! Nodes live in a flat arena; parent/child/neighbour links are ids, and
//! leaves store `ObjectId`s rather than references to the objects.

pub mod config;
pub mod node;
pub mod object;

pub use config::OctreeConfig;
pub use node::{octant_direction, NodeId, OctreeNode};
pub use object::{ObjectId, ObjectTracking, OctreeObject};

use std::collections::HashMap;

use glam::Vec3;
use rayon::prelude::*;
use smallvec::SmallVec;
use tracing::info;

use crate::error::NavError;
use crate::geometry::{Aabb, Segment, Sphere};
use crate::navmesh::NavMesh;

/// Arena octree plus the objects registered in its leaves.
#[derive(Clone, Debug)]
pub struct Octree {
  config: OctreeConfig,
  nodes: Vec<OctreeNode>,
  leaves: Vec<NodeId>,
  tracking: HashMap<ObjectId, ObjectTracking>,
}

impl Octree {
  /// The root always occupies the first arena slot.
  pub const ROOT: NodeId = NodeId(0);

  /// Build the tree over the nav mesh and link neighbouring leaves.
  ///
  /// An empty nav mesh yields a root-only tree.
  pub fn new(nav_mesh: &NavMesh, config: OctreeConfig) -> Result<Self, NavError> {
    config.validate()?;

    let root_bounds = nav_mesh
      .bounds()
      .map(|bounds| bounds.bounding_cube())
      .unwrap_or_else(|| Aabb::new(Vec3::ZERO, Vec3::ZERO));

    let mut octree = Self {
      nodes: vec![OctreeNode::new(Self::ROOT, root_bounds, None, None, 0)],
      leaves: Vec::new(),
      tracking: HashMap::new(),
      config,
    };

    let margin = Vec3::splat(octree.config.prune_margin);
    let boxes: Vec<Aabb> = nav_mesh
      .nodes()
      .iter()
      .map(|node| Aabb::from_center_half_extents(node.center, margin))
      .collect();
    if !boxes.is_empty() {
      octree.subdivide(Self::ROOT, &boxes);
    }

    octree.leaves = octree
      .nodes
      .iter()
      .filter(|node| node.is_leaf())
      .map(|node| node.id)
      .collect();
    octree.link_leaf_neighbours();

    info!(
      nodes = octree.nodes.len(),
      leaves = octree.leaves.len(),
      depth_limit = octree.config.depth_limit,
      "octree built"
    );

    Ok(octree)
  }

  /// Create the children of `parent` that overlap at least one walkable box.
  ///
  /// Only boxes touching the parent are handed down, so each level scans a
  /// shrinking list.
  fn subdivide(&mut self, parent: NodeId, boxes: &[Aabb]) {
    let (bounds, depth) = {
      let node = &self.nodes[parent.index()];
      (node.bounds, node.depth)
    };
    if depth + 1 >= self.config.depth_limit {
      return;
    }

    let quarter = bounds.size() * 0.25;
    for octant in 0..8u8 {
      let center = bounds.center() + octant_direction(octant) * quarter;
      let child_bounds = Aabb::from_center_half_extents(center, quarter);

      let child_boxes: Vec<Aabb> = boxes
        .iter()
        .filter(|walkable| walkable.overlaps(&child_bounds))
        .copied()
        .collect();
      if child_boxes.is_empty() {
        continue;
      }

      let id = NodeId(self.nodes.len() as u32);
      self
        .nodes
        .push(OctreeNode::new(id, child_bounds, Some(parent), Some(octant), depth + 1));
      self.nodes[parent.index()].children.push(id);
      self.subdivide(id, &child_boxes);
    }
  }

  /// Every pair of leaves whose boxes intersect (touching included) becomes
  /// mutual neighbours.
  fn link_leaf_neighbours(&mut self) {
    let nodes = &self.nodes;
    let leaves = &self.leaves;
    let linked: Vec<Vec<NodeId>> = leaves
      .par_iter()
      .map(|&leaf| {
        let bounds = nodes[leaf.index()].bounds;
        leaves
          .iter()
          .copied()
          .filter(|&other| other != leaf && nodes[other.index()].bounds.overlaps(&bounds))
          .collect()
      })
      .collect();

    for (leaf, neighbours) in self.leaves.iter().zip(linked) {
      self.nodes[leaf.index()].neighbours = neighbours;
    }
  }

  // ===========================================================================
  // Object registration
  // ===========================================================================

  /// Register (or move) an object, descending from the root.
  pub fn insert<O: OctreeObject + ?Sized>(&mut self, object: &O) -> Option<NodeId> {
    self.insert_from(object, Self::ROOT)
  }

  /// Register (or move) an object, descending from `start`.
  ///
  /// Returns `None` without touching existing tracking if the position is
  /// outside `start` or falls into a pruned region.
  pub fn insert_from<O: OctreeObject + ?Sized>(&mut self, object: &O, start: NodeId) -> Option<NodeId> {
    let position = object.position();
    let leaf = self.descend(start, position)?;
    let id = object.id();

    if let Some(previous) = self.tracking.get(&id).map(|t| t.leaf) {
      if previous != leaf {
        self.nodes[previous.index()].remove_object(id);
      }
    }
    self.nodes[leaf.index()].add_object(id);

    let bounding_sphere = object.bounding_sphere();
    let neighbour_leaves = self.overlapping_neighbours(leaf, &bounding_sphere);
    self.tracking.insert(
      id,
      ObjectTracking {
        leaf,
        position,
        bounding_sphere,
        neighbour_leaves,
      },
    );

    Some(leaf)
  }

  /// Refresh an object after it moved.
  ///
  /// Stays in its leaf while the leaf still contains the position, otherwise
  /// it is reinserted from the root. The cached neighbour leaves are always
  /// recomputed. An object that left the tree is removed and `None` returned.
  pub fn update_object<O: OctreeObject + ?Sized>(&mut self, object: &O) -> Option<NodeId> {
    let id = object.id();
    let Some(leaf) = self.tracking.get(&id).map(|t| t.leaf) else {
      return self.insert(object);
    };

    let position = object.position();
    if self.nodes[leaf.index()].bounds.contains_point(position) {
      let bounding_sphere = object.bounding_sphere();
      let neighbour_leaves = self.overlapping_neighbours(leaf, &bounding_sphere);
      if let Some(tracking) = self.tracking.get_mut(&id) {
        tracking.position = position;
        tracking.bounding_sphere = bounding_sphere;
        tracking.neighbour_leaves = neighbour_leaves;
      }
      return Some(leaf);
    }

    let moved = self.insert(object);
    if moved.is_none() {
      self.remove_object(id);
    }
    moved
  }

  /// Forget an object. Returns false if it was not registered.
  pub fn remove_object(&mut self, id: ObjectId) -> bool {
    match self.tracking.remove(&id) {
      Some(tracking) => self.nodes[tracking.leaf.index()].remove_object(id),
      None => false,
    }
  }

  fn descend(&self, start: NodeId, position: Vec3) -> Option<NodeId> {
    let mut current = self.nodes.get(start.index())?;
    if !current.bounds.contains_point(position) {
      return None;
    }
    while !current.is_leaf() {
      let next = current
        .children
        .iter()
        .find(|child| self.nodes[child.index()].bounds.contains_point(position))?;
      current = &self.nodes[next.index()];
    }
    Some(current.id)
  }

  fn overlapping_neighbours(&self, leaf: NodeId, sphere: &Sphere) -> SmallVec<[NodeId; 8]> {
    self.nodes[leaf.index()]
      .neighbours
      .iter()
      .copied()
      .filter(|n| self.nodes[n.index()].bounds.intersects_sphere(sphere))
      .collect()
  }

  // ===========================================================================
  // Queries
  // ===========================================================================

  /// Leaves currently holding at least one object, in arena order.
  pub fn leaves_with_objects(&self) -> Vec<NodeId> {
    self
      .leaves
      .iter()
      .copied()
      .filter(|leaf| self.nodes[leaf.index()].has_objects())
      .collect()
  }

  /// Leaf whose box contains `point`, if any.
  pub fn leaf_at(&self, point: Vec3) -> Option<NodeId> {
    self.descend(Self::ROOT, point)
  }

  /// Objects sharing the leaf of `id` or one of its cached neighbour leaves,
  /// excluding `id` itself.
  pub fn nearby_objects(&self, id: ObjectId) -> Vec<ObjectId> {
    let Some(tracking) = self.tracking.get(&id) else {
      return Vec::new();
    };
    std::iter::once(tracking.leaf)
      .chain(tracking.neighbour_leaves.iter().copied())
      .flat_map(|leaf| self.nodes[leaf.index()].objects().iter().copied())
      .filter(|&other| other != id)
      .collect()
  }

  /// Objects in every leaf crossed by `segment`.
  pub fn objects_along(&self, segment: &Segment) -> Vec<ObjectId> {
    let mut found = Vec::new();
    let mut stack = vec![Self::ROOT];
    while let Some(id) = stack.pop() {
      let node = &self.nodes[id.index()];
      if !segment.intersects_aabb(&node.bounds) {
        continue;
      }
      if node.is_leaf() {
        found.extend_from_slice(node.objects());
      } else {
        stack.extend(node.children.iter().copied());
      }
    }
    found
  }

  // ===========================================================================
  // Accessors
  // ===========================================================================

  #[inline]
  pub fn root(&self) -> &OctreeNode {
    &self.nodes[Self::ROOT.index()]
  }

  #[inline]
  pub fn node(&self, id: NodeId) -> Option<&OctreeNode> {
    self.nodes.get(id.index())
  }

  #[inline]
  pub fn nodes(&self) -> &[OctreeNode] {
    &self.nodes
  }

  #[inline]
  pub fn leaves(&self) -> &[NodeId] {
    &self.leaves
  }

  #[inline]
  pub fn tracking(&self, id: ObjectId) -> Option<&ObjectTracking> {
    self.tracking.get(&id)
  }

  #[inline]
  pub fn object_position(&self, id: ObjectId) -> Option<Vec3> {
    self.tracking.get(&id).map(|t| t.position)
  }

  #[inline]
  pub fn object_count(&self) -> usize {
    self.tracking.len()
  }

  #[inline]
  pub fn config(&self) -> &OctreeConfig {
    &self.config
  }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod mod_test;
