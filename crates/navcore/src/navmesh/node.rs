//! NavMeshNode - one walkable triangle and its adjacency.

use glam::Vec3;
use smallvec::SmallVec;

use super::MAX_NEIGHBOURS;
use crate::geometry::Triangle;

/// Stable index of a nav-mesh node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NavNodeId(pub u32);

impl NavNodeId {
  #[inline]
  pub fn index(self) -> usize {
    self.0 as usize
  }
}

/// Raw level triangle: three positions plus three vertex normals.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GeometryTriangle {
  pub positions: [Vec3; 3],
  pub normals: [Vec3; 3],
}

impl GeometryTriangle {
  pub fn new(positions: [Vec3; 3], normals: [Vec3; 3]) -> Self {
    Self { positions, normals }
  }

  /// Triangle whose vertex normals all equal the face normal.
  pub fn flat(positions: [Vec3; 3]) -> Self {
    let normal = Triangle { vertices: positions }.face_normal().normalize_or_zero();
    Self {
      positions,
      normals: [normal; 3],
    }
  }
}

/// Walkable triangle in the navigation graph.
///
/// Neighbours are nodes sharing exactly one edge (two vertices). The relation
/// is symmetric and never exceeds [`MAX_NEIGHBOURS`].
#[derive(Clone, Debug)]
pub struct NavMeshNode {
  pub id: NavNodeId,
  pub triangle: Triangle,
  /// Centroid of the triangle.
  pub center: Vec3,
  /// Average of the vertex normals.
  pub normal: Vec3,
  neighbours: SmallVec<[NavNodeId; MAX_NEIGHBOURS]>,
}

impl NavMeshNode {
  pub fn new(id: NavNodeId, source: &GeometryTriangle) -> Self {
    let triangle = Triangle {
      vertices: source.positions,
    };
    let normal = (source.normals[0] + source.normals[1] + source.normals[2]) / 3.0;
    Self {
      id,
      triangle,
      center: triangle.centroid(),
      normal,
      neighbours: SmallVec::new(),
    }
  }

  #[inline]
  pub fn neighbours(&self) -> &[NavNodeId] {
    &self.neighbours
  }

  #[inline]
  pub fn neighbour_count(&self) -> usize {
    self.neighbours.len()
  }

  #[inline]
  pub fn is_full(&self) -> bool {
    self.neighbours.len() >= MAX_NEIGHBOURS
  }

  #[inline]
  pub fn is_neighbour(&self, other: NavNodeId) -> bool {
    self.neighbours.contains(&other)
  }

  /// Number of this triangle's vertices also present in `other`.
  pub fn shared_vertex_count(&self, other: &NavMeshNode, epsilon: f32) -> usize {
    self
      .triangle
      .vertices
      .iter()
      .filter(|v| other.triangle.has_vertex(**v, epsilon))
      .count()
  }

  pub(super) fn link(&mut self, other: NavNodeId) {
    debug_assert!(!self.is_full(), "nav node {:?} already has 3 neighbours", self.id);
    self.neighbours.push(other);
  }
}
