//! Path solvers over the nav-mesh graph.
//!
//! A [`Solver`] exposes single search steps; the provided
//! [`Solver::find_path`] drives them to completion, walks the parent chain
//! back from the goal, resets the search state and funnels the node chain
//! into waypoints.
//!
//! ```text
//! not started -> searching -> resolved -> funneled -> cleared
//!                    |                                  ^
//!                    +------ exhausted / stopping ------+
//! ```
//!
//! Search state is owned by the solver, never by the shared mesh, so a
//! solver can run on the worker thread against an `Arc<NavMesh>` the
//! simulation thread keeps reading.

pub mod astar;
pub mod funnel;

pub use astar::{AStarSolver, SearchState};
pub use funnel::funnel_path;

use std::sync::atomic::{AtomicBool, Ordering};

use glam::Vec3;

use crate::navmesh::{NavMesh, NavNodeId};

/// Endpoints of one solve.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PathQuery {
  pub start_node: NavNodeId,
  pub goal_node: NavNodeId,
  /// Exact start position; replaces the start node center in the result.
  pub start: Vec3,
  /// Exact goal position; replaces the goal node center in the result.
  pub goal: Vec3,
}

impl PathQuery {
  /// Resolve both positions onto the mesh. `None` if either misses.
  pub fn resolve(nav_mesh: &NavMesh, start: Vec3, goal: Vec3) -> Option<Self> {
    Some(Self {
      start_node: nav_mesh.find_node(start)?,
      goal_node: nav_mesh.find_node(goal)?,
      start,
      goal,
    })
  }
}

/// Outcome of [`Solver::find_path`].
#[derive(Clone, Debug, PartialEq)]
pub enum PathResult {
  /// Waypoints from the requested start to the requested goal.
  Found(Vec<Vec3>),
  NotFound,
}

impl PathResult {
  pub fn is_found(&self) -> bool {
    matches!(self, PathResult::Found(_))
  }

  pub fn into_waypoints(self) -> Option<Vec<Vec3>> {
    match self {
      PathResult::Found(waypoints) => Some(waypoints),
      PathResult::NotFound => None,
    }
  }
}

/// Result of a single search step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SearchStep {
  /// More steps needed.
  Searching,
  /// The goal was popped from the open list.
  Reached,
  /// The open list ran dry without reaching the goal.
  Exhausted,
}

/// Stepwise graph search.
///
/// Implementors only provide the search primitives; path extraction,
/// cancellation, cleanup and funneling are shared.
pub trait Solver: Send {
  /// Reset scratch for `nav_mesh` and seed the search at `start`.
  fn begin(&mut self, nav_mesh: &NavMesh, start: NavNodeId, goal: NavNodeId);

  /// Advance the search by one node expansion.
  fn search(&mut self, nav_mesh: &NavMesh) -> SearchStep;

  /// Parent recorded for `node` by the last search.
  fn parent(&self, node: NavNodeId) -> Option<NavNodeId>;

  /// Drop all per-query state.
  fn clear(&mut self);

  /// True when no per-query state survives.
  fn is_clear(&self) -> bool;

  /// Run a full query, checking `stopping` before every search and
  /// extraction step. Search state is cleared on every exit.
  fn find_path(&mut self, nav_mesh: &NavMesh, query: &PathQuery, stopping: &AtomicBool) -> PathResult {
    if !nav_mesh.contains(query.start_node) || !nav_mesh.contains(query.goal_node) {
      return PathResult::NotFound;
    }
    if query.start_node == query.goal_node {
      return PathResult::Found(vec![query.start, query.goal]);
    }

    self.begin(nav_mesh, query.start_node, query.goal_node);
    let reached = loop {
      if stopping.load(Ordering::Relaxed) {
        break false;
      }
      match self.search(nav_mesh) {
        SearchStep::Searching => {}
        SearchStep::Reached => break true,
        SearchStep::Exhausted => break false,
      }
    };

    let chain = if reached {
      extract_chain(&*self, nav_mesh, query.start_node, query.goal_node, stopping)
    } else {
      None
    };
    self.clear();

    match chain {
      Some(nodes) => PathResult::Found(funnel_path(nav_mesh, &nodes, query.start, query.goal)),
      None => PathResult::NotFound,
    }
  }
}

/// Walk parents from `goal` back to `start`, returned in start-to-goal order.
fn extract_chain<S: Solver + ?Sized>(
  solver: &S,
  nav_mesh: &NavMesh,
  start: NavNodeId,
  goal: NavNodeId,
  stopping: &AtomicBool,
) -> Option<Vec<NavNodeId>> {
  let mut chain = vec![goal];
  let mut current = goal;
  while current != start {
    if stopping.load(Ordering::Relaxed) || chain.len() > nav_mesh.len() {
      return None;
    }
    current = solver.parent(current)?;
    chain.push(current);
  }
  chain.reverse();
  Some(chain)
}
