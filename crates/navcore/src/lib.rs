//! navcore - Engine independent navigation for crowds of agents
//!
//! This crate turns level triangles into a walkable nav mesh, buckets agents
//! into an octree, and keeps one shared path per occupied octree leaf fresh
//! on a background thread.
//!
//! # Features
//!
//! - **NavMesh**: Triangle adjacency graph with perimeter edges for
//!   line-of-sight checks
//! - **Octree**: Cubic spatial subdivision restricted to walkable space, with
//!   per-object leaf tracking
//! - **A\* + Funnel**: Incremental cancellable search over nav mesh nodes,
//!   followed by line-of-sight string pulling
//! - **PathfindingManager**: One request per occupied leaf, solved by a single
//!   worker thread; leaves on another request's path borrow it
//!
//! # Example
//!
//! ```ignore
//! use navcore::{grid_floor, Level, LevelConfig};
//! use glam::Vec3;
//!
//! let floor = grid_floor(16, 16, 1.0, Vec3::ZERO);
//! let mut level = Level::load(&floor, LevelConfig::default())?;
//! let agent = level.spawn_agent(Vec3::new(0.5, 0.0, 0.5), 0.3).unwrap();
//!
//! loop {
//!     level.tick(1.0 / 60.0, Vec3::new(15.5, 0.0, 15.5));
//!     if let Some(path) = level.path_for_agent(agent) {
//!         println!("{} waypoints", path.len());
//!     }
//! }
//! ```

pub mod agent;
pub mod error;
pub mod geometry;
pub mod level;
pub mod metrics;
pub mod navmesh;
pub mod octree;
pub mod pathfinding;
pub mod solver;

// Re-export commonly used items
pub use agent::Agent;
pub use error::NavError;
pub use geometry::{Aabb, Segment, Sphere, Triangle};
pub use level::{Level, LevelConfig, LevelId};
pub use metrics::{LevelStats, PathfindingStats, RollingWindow};
pub use navmesh::grid::{grid_floor, grid_floor_with};
pub use navmesh::{GeometryTriangle, NavMesh, NavMeshConfig, NavMeshNode, NavNodeId};
pub use octree::{NodeId, ObjectId, Octree, OctreeConfig, OctreeNode, OctreeObject};
pub use pathfinding::{BorrowedPath, Path, PathRequest, PathfindingConfig, PathfindingManager};
pub use solver::{funnel_path, AStarSolver, PathQuery, PathResult, Solver};
