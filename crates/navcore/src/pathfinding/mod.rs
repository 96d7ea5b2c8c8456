//! Background pathfinding for groups of agents.
//!
//! Agents are grouped by the octree leaf they stand in; each occupied leaf
//! gets one [`PathRequest`]. A single worker thread solves one request at a
//! time while the simulation thread keeps ticking, and requests whose leaf
//! lies on another request's path borrow that path instead of queueing their
//! own solve.
//!
//! # Module Structure
//!
//! - [`manager`]: `PathfindingManager` request bookkeeping (simulation thread)
//! - [`request`]: `PathRequest` and the shared `Path`
//! - [`config`]: `PathfindingConfig` scheduling knobs
//! - `worker`: the solver thread and the mutex-guarded slot it shares

pub mod config;
pub mod manager;
pub mod request;
mod worker;

pub use config::PathfindingConfig;
pub use manager::PathfindingManager;
pub use request::{BorrowedPath, Path, PathRequest};
