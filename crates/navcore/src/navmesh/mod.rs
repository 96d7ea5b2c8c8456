//! Navigation mesh built from raw level triangles.
//!
//! Every walkable triangle becomes a [`NavMeshNode`]. Nodes sharing an edge
//! are neighbours (at most three each), and the unshared edges of the border
//! nodes form the perimeter used for visibility tests.
//!
//! # Module Structure
//!
//! - [`node`]: `NavMeshNode`, `NavNodeId` and the `GeometryTriangle` input
//! - [`config`]: `NavMeshConfig` build and query tolerances
//! - `perimeter`: border extraction and collinear merging
//! - [`grid`]: flat grid floors for tests and demos
//!
//! The mesh is immutable after [`NavMesh::build`] and is shared read-only
//! with the pathfinding worker through an `Arc`.

pub mod config;
pub mod grid;
pub mod node;
mod perimeter;

pub use config::NavMeshConfig;
pub use node::{GeometryTriangle, NavMeshNode, NavNodeId};

use glam::Vec3;
use tracing::{info, warn};

use crate::error::NavError;
use crate::geometry::{Aabb, Segment};

/// Hard cap on neighbours per node: a triangle has three edges.
pub const MAX_NEIGHBOURS: usize = 3;

/// Triangle adjacency graph plus its merged perimeter.
#[derive(Clone, Debug, Default)]
pub struct NavMesh {
  config: NavMeshConfig,
  nodes: Vec<NavMeshNode>,
  edges: Vec<Segment>,
  bounds: Option<Aabb>,
}

impl NavMesh {
  /// Mesh without any walkable area. Every query fails closed.
  pub fn empty() -> Self {
    Self::default()
  }

  /// Build the graph and perimeter from triangle soup.
  ///
  /// Zero-area triangles are skipped; the remaining nodes are numbered in
  /// input order.
  pub fn build(triangles: &[GeometryTriangle], config: NavMeshConfig) -> Result<Self, NavError> {
    config.validate()?;

    let mut nodes = Vec::with_capacity(triangles.len());
    let mut degenerate = 0usize;
    for source in triangles {
      let node = NavMeshNode::new(NavNodeId(nodes.len() as u32), source);
      if node.triangle.area() <= f32::EPSILON {
        degenerate += 1;
        continue;
      }
      nodes.push(node);
    }
    if degenerate > 0 {
      warn!(degenerate, "skipped zero-area triangles");
    }

    link_neighbours(&mut nodes, config.vertex_weld_epsilon);

    let raw_edges = perimeter::extract_edges(&nodes, config.vertex_weld_epsilon);
    let raw_count = raw_edges.len();
    let edges = perimeter::merge_collinear(raw_edges, config.edge_merge_tolerance, config.vertex_weld_epsilon);

    let bounds = Aabb::from_points(nodes.iter().flat_map(|n| n.triangle.vertices));

    info!(
      nodes = nodes.len(),
      raw_edges = raw_count,
      edges = edges.len(),
      "nav mesh built"
    );

    Ok(Self {
      config,
      nodes,
      edges,
      bounds,
    })
  }

  /// Build from an indexed mesh where every three indices form a triangle.
  pub fn from_indexed(
    positions: &[Vec3],
    normals: &[Vec3],
    indices: &[u32],
    config: NavMeshConfig,
  ) -> Result<Self, NavError> {
    if positions.len() != normals.len() {
      return Err(NavError::NormalCountMismatch {
        positions: positions.len(),
        normals: normals.len(),
      });
    }
    if indices.len() % 3 != 0 {
      return Err(NavError::IndexCountNotTriangles(indices.len()));
    }
    if let Some(&index) = indices.iter().find(|&&i| i as usize >= positions.len()) {
      return Err(NavError::IndexOutOfRange {
        index,
        vertex_count: positions.len(),
      });
    }

    let triangles: Vec<GeometryTriangle> = indices
      .chunks_exact(3)
      .map(|tri| {
        let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        GeometryTriangle::new(
          [positions[a], positions[b], positions[c]],
          [normals[a], normals[b], normals[c]],
        )
      })
      .collect();

    Self::build(&triangles, config)
  }

  // ===========================================================================
  // Queries
  // ===========================================================================

  /// Node under (or slightly above) `point`.
  ///
  /// Casts a vertical segment from `ray_above` over the point down to
  /// `ray_below` under it and returns the first triangle hit, in node order.
  pub fn find_node(&self, point: Vec3) -> Option<NavNodeId> {
    let ray = Segment::new(
      point + Vec3::Y * self.config.ray_above,
      point - Vec3::Y * self.config.ray_below,
    );
    self
      .nodes
      .iter()
      .find(|node| ray.intersects_triangle(&node.triangle))
      .map(|node| node.id)
  }

  /// True when the ground-plane projection of `from -> to` crosses no
  /// perimeter edge. Endpoints standing on the perimeter do not block.
  pub fn has_line_of_sight(&self, from: Vec3, to: Vec3) -> bool {
    let sight = Segment::new(from, to);
    !self.edges.iter().any(|edge| sight.crosses_xz(edge))
  }

  // ===========================================================================
  // Accessors
  // ===========================================================================

  #[inline]
  pub fn nodes(&self) -> &[NavMeshNode] {
    &self.nodes
  }

  #[inline]
  pub fn node(&self, id: NavNodeId) -> Option<&NavMeshNode> {
    self.nodes.get(id.index())
  }

  #[inline]
  pub fn contains(&self, id: NavNodeId) -> bool {
    id.index() < self.nodes.len()
  }

  #[inline]
  pub fn len(&self) -> usize {
    self.nodes.len()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.nodes.is_empty()
  }

  /// Merged perimeter segments.
  #[inline]
  pub fn edges(&self) -> &[Segment] {
    &self.edges
  }

  /// Box around every walkable vertex, `None` for an empty mesh.
  #[inline]
  pub fn bounds(&self) -> Option<Aabb> {
    self.bounds
  }

  #[inline]
  pub fn config(&self) -> &NavMeshConfig {
    &self.config
  }
}

/// Link every pair of nodes sharing exactly two vertices.
///
/// A node stops searching once it holds [`MAX_NEIGHBOURS`], and a full node
/// is never linked again, so the cap holds on both sides.
fn link_neighbours(nodes: &mut [NavMeshNode], epsilon: f32) {
  for i in 0..nodes.len() {
    for j in (i + 1)..nodes.len() {
      if nodes[i].is_full() {
        break;
      }
      if nodes[j].is_full() {
        continue;
      }
      if nodes[i].shared_vertex_count(&nodes[j], epsilon) == 2 {
        let (a, b) = (nodes[i].id, nodes[j].id);
        nodes[i].link(b);
        nodes[j].link(a);
      }
    }
  }
}
