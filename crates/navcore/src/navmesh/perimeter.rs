//! Perimeter extraction and collinear merging.
//!
//! A triangle edge is on the perimeter when no neighbouring triangle shares
//! it. Only nodes with one or two neighbours contribute: three neighbours
//! means an interior triangle, zero means an isolated one.

use rayon::prelude::*;

use super::node::NavMeshNode;
use crate::geometry::{approx_eq, Segment};

/// Collect every unshared edge of every border node.
pub(super) fn extract_edges(nodes: &[NavMeshNode], epsilon: f32) -> Vec<Segment> {
  nodes
    .par_iter()
    .filter(|node| matches!(node.neighbour_count(), 1 | 2))
    .flat_map_iter(move |node| {
      node.triangle.edges().into_iter().filter(move |edge| {
        !node.neighbours().iter().any(|id| {
          let other = &nodes[id.index()].triangle;
          other.has_vertex(edge.start, epsilon) && other.has_vertex(edge.end, epsilon)
        })
      })
    })
    .collect()
}

/// Greedily join segments that share an endpoint and point the same way.
///
/// Each merge grows the current segment; it is retried against the remaining
/// ones until nothing else attaches.
pub(super) fn merge_collinear(mut pending: Vec<Segment>, tolerance: f32, epsilon: f32) -> Vec<Segment> {
  let min_cos = tolerance.cos();
  let mut merged = Vec::with_capacity(pending.len());

  while let Some(mut current) = pending.pop() {
    while let Some((index, joined)) = pending
      .iter()
      .enumerate()
      .find_map(|(i, other)| try_join(&current, other, min_cos, epsilon).map(|s| (i, s)))
    {
      pending.swap_remove(index);
      current = joined;
    }
    merged.push(current);
  }

  merged
}

/// Join `a` and `b` through a shared endpoint if they continue in the same
/// direction.
fn try_join(a: &Segment, b: &Segment, min_cos: f32, epsilon: f32) -> Option<Segment> {
  // (outer end of a, shared point, outer end of b)
  let (from, shared, to) = if approx_eq(a.end, b.start, epsilon) {
    (a.start, a.end, b.end)
  } else if approx_eq(a.end, b.end, epsilon) {
    (a.start, a.end, b.start)
  } else if approx_eq(a.start, b.end, epsilon) {
    (a.end, a.start, b.start)
  } else if approx_eq(a.start, b.start, epsilon) {
    (a.end, a.start, b.end)
  } else {
    return None;
  };

  let first = (shared - from).try_normalize()?;
  let second = (to - shared).try_normalize()?;
  (first.dot(second) >= min_cos).then(|| Segment::new(from, to))
}
