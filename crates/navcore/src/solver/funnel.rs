//! Funnel (string-pulling) pass over a node chain.
//!
//! Candidates are the node centers, with the first and last replaced by the
//! exact start and goal. From each anchor the farthest visible candidate is
//! taken; visibility is the ground-plane test against the perimeter edges.

use glam::Vec3;

use crate::navmesh::{NavMesh, NavNodeId};

/// Reduce a chain of adjacent nodes to waypoints.
///
/// The result starts with `start` and ends with `goal`. If no later
/// candidate is visible from an anchor, the next one is taken anyway so the
/// pass always terminates.
pub fn funnel_path(nav_mesh: &NavMesh, nodes: &[NavNodeId], start: Vec3, goal: Vec3) -> Vec<Vec3> {
  let mut candidates: Vec<Vec3> = nodes
    .iter()
    .filter_map(|id| nav_mesh.node(*id).map(|node| node.center))
    .collect();
  if candidates.len() < 2 {
    return vec![start, goal];
  }

  let last = candidates.len() - 1;
  candidates[0] = start;
  candidates[last] = goal;

  let mut waypoints = vec![start];
  let mut anchor = 0;
  while anchor < last {
    anchor = farthest_visible(nav_mesh, &candidates, anchor);
    waypoints.push(candidates[anchor]);
  }
  waypoints
}

/// Index of the farthest candidate after `anchor` with a clear line.
///
/// The final candidate is tried first; otherwise the range is narrowed like a
/// binary search, widening after a visible candidate and shrinking after a
/// blocked one.
fn farthest_visible(nav_mesh: &NavMesh, candidates: &[Vec3], anchor: usize) -> usize {
  let last = candidates.len() - 1;
  let from = candidates[anchor];
  if anchor + 1 >= last || nav_mesh.has_line_of_sight(from, candidates[last]) {
    return last;
  }

  let mut best = anchor + 1;
  let (mut low, mut high) = (anchor + 1, last - 1);
  while low <= high {
    let mid = low + (high - low) / 2;
    if nav_mesh.has_line_of_sight(from, candidates[mid]) {
      best = mid;
      low = mid + 1;
    } else {
      high = mid - 1;
    }
  }
  best
}

#[cfg(test)]
#[path = "funnel_test.rs"]
mod funnel_test;
