use glam::Vec3;

use super::*;
use crate::navmesh::grid::grid_floor;
use crate::navmesh::NavMeshConfig;

fn strip(columns: usize) -> NavMesh {
  NavMesh::build(&grid_floor(columns, 1, 1.0, Vec3::ZERO), NavMeshConfig::default()).unwrap()
}

fn run_to_end(solver: &mut AStarSolver, mesh: &NavMesh) -> SearchStep {
  loop {
    match solver.search(mesh) {
      SearchStep::Searching => continue,
      done => return done,
    }
  }
}

// =========================================================================
// Batch 1: Stepping
// =========================================================================

/// Begin marks the start closed and visited with no parent.
#[test]
fn test_begin_seeds_start() {
  let mesh = strip(3);
  let mut solver = AStarSolver::new(&mesh);
  solver.begin(&mesh, NavNodeId(0), NavNodeId(5));

  let start = solver.search_state(NavNodeId(0)).unwrap();
  assert!(start.visited && start.closed);
  assert_eq!(start.parent, None);
  assert!(solver.open_list().is_empty());
}

/// One step expands the start and keeps the open list sorted by F.
#[test]
fn test_open_list_sorted_by_f() {
  let mesh = NavMesh::build(&grid_floor(3, 3, 1.0, Vec3::ZERO), NavMeshConfig::default()).unwrap();
  let mut solver = AStarSolver::new(&mesh);
  // Node 1 is the upper triangle of the corner cell: three neighbours
  solver.begin(&mesh, NavNodeId(1), NavNodeId(17));

  assert_eq!(solver.search(&mesh), SearchStep::Searching);
  // Keep going a few steps so reinsertion happens as well
  for _ in 0..3 {
    solver.search(&mesh);
  }

  let f: Vec<f32> = solver
    .open_list()
    .iter()
    .map(|n| solver.search_state(*n).unwrap().f)
    .collect();
  assert!(f.windows(2).all(|w| w[0] <= w[1]), "open list not sorted: {f:?}");
  for n in solver.open_list() {
    let state = solver.search_state(*n).unwrap();
    assert!(state.visited && !state.closed);
    assert_eq!(state.f, state.g + state.h);
  }
}

/// G and H are squared center distances.
#[test]
fn test_costs_are_squared_distances() {
  let mesh = strip(2);
  let mut solver = AStarSolver::new(&mesh);
  solver.begin(&mesh, NavNodeId(0), NavNodeId(3));
  solver.search(&mesh);

  let center = |i: u32| mesh.node(NavNodeId(i)).unwrap().center;
  let state = solver.search_state(NavNodeId(1)).unwrap();
  assert_eq!(state.parent, Some(NavNodeId(0)));
  assert!((state.g - center(0).distance_squared(center(1))).abs() < 1e-6);
  assert!((state.h - center(1).distance_squared(center(3))).abs() < 1e-6);
}

/// Reaching the goal leaves a parent chain of real neighbours back to start.
#[test]
fn test_parent_chain_follows_adjacency() {
  let mesh = strip(5);
  let mut solver = AStarSolver::new(&mesh);
  let (start, goal) = (NavNodeId(0), NavNodeId(9));
  solver.begin(&mesh, start, goal);

  assert_eq!(run_to_end(&mut solver, &mesh), SearchStep::Reached);

  let mut node = goal;
  let mut hops = 0;
  while node != start {
    let parent = solver.parent(node).expect("chain must reach start");
    assert!(mesh.node(parent).unwrap().is_neighbour(node));
    node = parent;
    hops += 1;
  }
  // A 1-wide strip forces every triangle onto the route
  assert_eq!(hops, 9);

  solver.clear();
  assert!(solver.is_clear());
}

/// Without a route the search exhausts the open list.
#[test]
fn test_exhausted_without_route() {
  let mut triangles = grid_floor(1, 1, 1.0, Vec3::ZERO);
  triangles.extend(grid_floor(1, 1, 1.0, Vec3::new(3.0, 0.0, 0.0)));
  let mesh = NavMesh::build(&triangles, NavMeshConfig::default()).unwrap();
  let mut solver = AStarSolver::new(&mesh);
  solver.begin(&mesh, NavNodeId(0), NavNodeId(3));

  assert_eq!(run_to_end(&mut solver, &mesh), SearchStep::Exhausted);
  // Stays exhausted
  assert_eq!(solver.search(&mesh), SearchStep::Exhausted);
}

/// Clear only resets what the query touched but leaves everything default.
#[test]
fn test_clear_resets_scratch() {
  let mesh = strip(4);
  let mut solver = AStarSolver::new(&mesh);
  assert!(solver.is_clear());

  solver.begin(&mesh, NavNodeId(0), NavNodeId(7));
  solver.search(&mesh);
  assert!(!solver.is_clear());

  solver.clear();
  assert!(solver.is_clear());
  for node in mesh.nodes() {
    assert_eq!(solver.search_state(node.id), Some(&SearchState::default()));
  }
}
