//! A* over nav-mesh node centers.
//!
//! Both the step cost (G) and the heuristic (H) are squared Euclidean
//! distances between node centers. The open list is a `Vec` kept sorted by
//! ascending F, so popping the best candidate is a front removal and
//! insertion is a binary search.

use super::{SearchStep, Solver};
use crate::navmesh::{NavMesh, NavNodeId};

/// Per-node search bookkeeping.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SearchState {
  pub visited: bool,
  pub closed: bool,
  pub parent: Option<NavNodeId>,
  pub g: f32,
  pub h: f32,
  pub f: f32,
}

/// A* solver with its own scratch, sized to the mesh it searches.
#[derive(Clone, Debug, Default)]
pub struct AStarSolver {
  scratch: Vec<SearchState>,
  /// Nodes whose scratch entry was written this query.
  touched: Vec<NavNodeId>,
  /// Sorted by ascending F.
  open: Vec<NavNodeId>,
  current: Option<NavNodeId>,
  goal: Option<NavNodeId>,
}

impl AStarSolver {
  pub fn new(nav_mesh: &NavMesh) -> Self {
    Self {
      scratch: vec![SearchState::default(); nav_mesh.len()],
      ..Default::default()
    }
  }

  /// Bookkeeping for `node`, for inspection between steps.
  pub fn search_state(&self, node: NavNodeId) -> Option<&SearchState> {
    self.scratch.get(node.index())
  }

  /// Nodes waiting in the open list, best first.
  pub fn open_list(&self) -> &[NavNodeId] {
    &self.open
  }

  fn touch(&mut self, node: NavNodeId) -> &mut SearchState {
    let state = &mut self.scratch[node.index()];
    if !state.visited && !state.closed {
      self.touched.push(node);
    }
    state
  }

  /// Lower-bound insertion: ties go in front of equal F values.
  fn push_open(&mut self, node: NavNodeId) {
    let f = self.scratch[node.index()].f;
    let scratch = &self.scratch;
    let at = self.open.partition_point(|n| scratch[n.index()].f < f);
    self.open.insert(at, node);
  }

  fn expand(&mut self, nav_mesh: &NavMesh, current: NavNodeId, goal_center: glam::Vec3) {
    let Some(node) = nav_mesh.node(current) else {
      return;
    };
    let current_g = self.scratch[current.index()].g;

    for &neighbour in node.neighbours() {
      let Some(next) = nav_mesh.node(neighbour) else {
        continue;
      };
      if self.scratch[neighbour.index()].closed {
        continue;
      }

      let g = current_g + node.center.distance_squared(next.center);
      let h = next.center.distance_squared(goal_center);
      let f = g + h;

      let state = self.touch(neighbour);
      if state.visited {
        if f >= state.f {
          continue;
        }
        *state = SearchState {
          parent: Some(current),
          g,
          h,
          f,
          ..*state
        };
        if let Some(at) = self.open.iter().position(|&n| n == neighbour) {
          self.open.remove(at);
        }
      } else {
        *state = SearchState {
          visited: true,
          closed: false,
          parent: Some(current),
          g,
          h,
          f,
        };
      }
      self.push_open(neighbour);
    }
  }
}

impl Solver for AStarSolver {
  fn begin(&mut self, nav_mesh: &NavMesh, start: NavNodeId, goal: NavNodeId) {
    self.clear();
    if self.scratch.len() != nav_mesh.len() {
      self.scratch = vec![SearchState::default(); nav_mesh.len()];
    }

    let state = self.touch(start);
    state.visited = true;
    state.closed = true;
    self.current = Some(start);
    self.goal = Some(goal);
  }

  fn search(&mut self, nav_mesh: &NavMesh) -> SearchStep {
    let (Some(current), Some(goal)) = (self.current, self.goal) else {
      return SearchStep::Exhausted;
    };
    if current == goal {
      return SearchStep::Reached;
    }
    let Some(goal_center) = nav_mesh.node(goal).map(|n| n.center) else {
      return SearchStep::Exhausted;
    };

    self.expand(nav_mesh, current, goal_center);

    if self.open.is_empty() {
      self.current = None;
      return SearchStep::Exhausted;
    }
    let next = self.open.remove(0);
    self.scratch[next.index()].closed = true;
    self.current = Some(next);
    SearchStep::Searching
  }

  fn parent(&self, node: NavNodeId) -> Option<NavNodeId> {
    self.scratch.get(node.index())?.parent
  }

  fn clear(&mut self) {
    for node in self.touched.drain(..) {
      self.scratch[node.index()] = SearchState::default();
    }
    self.open.clear();
    self.current = None;
    self.goal = None;
  }

  fn is_clear(&self) -> bool {
    self.touched.is_empty()
      && self.open.is_empty()
      && self.current.is_none()
      && self.scratch.iter().all(|state| *state == SearchState::default())
  }
}

#[cfg(test)]
#[path = "astar_test.rs"]
mod astar_test;
