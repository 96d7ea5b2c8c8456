//! PathfindingManager - per-leaf requests solved one at a time in the
//! background.
//!
//! Each simulation tick ([`PathfindingManager::update`]):
//! 1. **Refresh**: drop requests for emptied leaves (cancelling the solve of
//!    an emptied current one), forget borrows whose lender no longer owns the
//!    lent path, add requests for newly occupied leaves, re-pick starts and
//!    goals.
//! 2. **Share**: a finished path lends itself to every other request whose
//!    leaf it passes through.
//! 3. **Rotate**: once the current request completed (or the restart
//!    interval ran out with nothing in flight) it goes back to the queue and
//!    the next request that is not borrowing is handed to the worker.

use std::collections::VecDeque;
use std::sync::atomic::Ordering;
use std::sync::{Arc, MutexGuard};
use std::thread::JoinHandle;

use crossbeam_channel::Sender;
use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, trace, warn};

use super::config::PathfindingConfig;
use super::request::{BorrowedPath, Path, PathRequest};
use super::worker::{self, WorkerShared, WorkerSlot};
use crate::error::NavError;
use crate::metrics::PathfindingStats;
use crate::navmesh::NavMesh;
use crate::octree::{NodeId, ObjectId, Octree};
use crate::solver::{AStarSolver, Solver};

/// Owns the request queue and the worker thread.
pub struct PathfindingManager {
  nav_mesh: Arc<NavMesh>,
  config: PathfindingConfig,
  goal: Vec3,
  pending: VecDeque<PathRequest>,
  shared: Arc<WorkerShared>,
  wake: Sender<()>,
  worker: Option<JoinHandle<()>>,
  restart_timer: f32,
  next_ticket: u64,
  rng: StdRng,
}

impl PathfindingManager {
  /// Start a manager with an [`AStarSolver`] sized to `nav_mesh`.
  pub fn new(nav_mesh: Arc<NavMesh>, config: PathfindingConfig) -> Result<Self, NavError> {
    let solver = AStarSolver::new(&nav_mesh);
    Self::with_solver(nav_mesh, solver, config)
  }

  /// Start a manager driving `solver` on the worker thread.
  pub fn with_solver<S: Solver + 'static>(
    nav_mesh: Arc<NavMesh>,
    solver: S,
    config: PathfindingConfig,
  ) -> Result<Self, NavError> {
    config.validate()?;

    let shared = Arc::new(WorkerShared::new(config.timing_window));
    let (wake, signal) = crossbeam_channel::bounded(1);
    let worker = worker::spawn(
      Arc::clone(&shared),
      Arc::clone(&nav_mesh),
      Box::new(solver),
      signal,
      config.idle_sleep,
      config.thread_name.clone(),
    )
    .map_err(NavError::WorkerSpawn)?;

    let rng = match config.seed {
      Some(seed) => StdRng::seed_from_u64(seed),
      None => StdRng::from_os_rng(),
    };

    Ok(Self {
      nav_mesh,
      config,
      goal: Vec3::ZERO,
      pending: VecDeque::new(),
      shared,
      wake,
      worker: Some(worker),
      restart_timer: 0.0,
      next_ticket: 1,
      rng,
    })
  }

  /// Target every request steers towards, applied on the next update.
  pub fn set_goal(&mut self, goal: Vec3) {
    self.goal = goal;
  }

  pub fn goal(&self) -> Vec3 {
    self.goal
  }

  /// Advance bookkeeping by one simulation tick.
  pub fn update(&mut self, octree: &Octree, delta_time: f32) {
    self.refresh_requests(octree);
    self.share_paths(octree);
    self.rotate(octree, delta_time);
  }

  // ===========================================================================
  // Tick stages
  // ===========================================================================

  fn refresh_requests(&mut self, octree: &Octree) {
    let before = self.pending.len();
    self.pending.retain(|request| leaf_occupied(octree, request.leaf));
    let dropped = before - self.pending.len();
    if dropped > 0 {
      debug!(dropped, "dropped requests for emptied leaves");
    }

    let goal = self.goal;
    let (current_leaf, current_owner) = {
      let mut slot = self.shared.lock();
      self.drop_stale_current(&mut slot, octree);
      match slot.current.as_mut() {
        Some(current) => {
          current.goal = goal;
          if let Some(start) = random_occupant(&mut self.rng, octree, current.leaf) {
            current.start = start;
          }
          let owner = match (&current.path, current.is_borrowing()) {
            (Some(path), false) if leaf_occupied(octree, current.leaf) => Some((current.leaf, Arc::clone(path))),
            _ => None,
          };
          (Some(current.leaf), owner)
        }
        None => (None, None),
      }
    };

    // Only requests that are not borrowing themselves can keep a loan alive
    let owners: Vec<(NodeId, Arc<Path>)> = self
      .pending
      .iter()
      .filter(|request| !request.is_borrowing())
      .filter_map(|request| Some((request.leaf, Arc::clone(request.path.as_ref()?))))
      .chain(current_owner)
      .collect();

    for request in self.pending.iter_mut() {
      if request.revalidate_borrow(&owners) {
        trace!(leaf = request.leaf.0, "borrow released");
      }
      request.goal = goal;
      if let Some(start) = random_occupant(&mut self.rng, octree, request.leaf) {
        request.start = start;
      }
    }

    for leaf in octree.leaves_with_objects() {
      if Some(leaf) == current_leaf || self.pending.iter().any(|r| r.leaf == leaf) {
        continue;
      }
      let Some(start) = random_occupant(&mut self.rng, octree, leaf) else {
        continue;
      };
      trace!(leaf = leaf.0, "new path request");
      self.pending.push_back(PathRequest::new(leaf, start, goal));
    }
  }

  /// Retire the current request once its leaf emptied. A solve in flight is
  /// cancelled and the request dropped when it rotates out; otherwise it is
  /// dropped right away.
  fn drop_stale_current(&self, slot: &mut WorkerSlot, octree: &Octree) {
    let Some(current) = slot.current.as_ref() else {
      return;
    };
    if leaf_occupied(octree, current.leaf) {
      return;
    }
    if slot.in_flight {
      debug!(leaf = current.leaf.0, "cancelling solve for emptied leaf");
      self.shared.stopping.store(true, Ordering::SeqCst);
    } else {
      debug!(leaf = current.leaf.0, "dropping current request for emptied leaf");
      slot.current = None;
      slot.start_requested = false;
    }
  }

  /// Lend every owned path to the other requests whose leaf it crosses.
  fn share_paths(&mut self, octree: &Octree) {
    for source in 0..self.pending.len() {
      if self.pending[source].is_borrowing() {
        continue;
      }
      let lender = self.pending[source].leaf;
      let Some(path) = self.pending[source].path.clone() else {
        continue;
      };
      if path.len() < 2 {
        continue;
      }

      for target in 0..self.pending.len() {
        if target == source {
          continue;
        }
        let request = &mut self.pending[target];
        if request.borrowed.as_ref().is_some_and(|borrow| borrow.is_of(&path)) {
          continue;
        }
        let Some(bounds) = octree.node(request.leaf).map(|node| node.bounds) else {
          continue;
        };
        if path.segments().any(|segment| segment.intersects_aabb(&bounds)) {
          trace!(from = source, to = target, "sharing path");
          request.borrowed = Some(BorrowedPath::new(lender, &path));
        }
      }
    }
  }

  fn rotate(&mut self, octree: &Octree, delta_time: f32) {
    self.restart_timer += delta_time;

    let shared = Arc::clone(&self.shared);
    let mut slot = shared.lock();
    // A flagged request the worker has not picked up yet may still be replaced
    let finished = !slot.in_flight && slot.current.as_ref().map_or(true, |c| c.completed);
    let expired = !slot.in_flight && self.restart_timer > self.config.restart_interval;
    if !(finished || expired) {
      return;
    }
    self.restart_timer = 0.0;

    if let Some(mut previous) = slot.current.take() {
      if leaf_occupied(octree, previous.leaf) {
        previous.completed = false;
        self.pending.push_back(previous);
      } else {
        debug!(leaf = previous.leaf.0, "dropping rotated request for emptied leaf");
      }
    }

    let Some(mut request) = self.next_eligible(octree) else {
      return;
    };

    request.goal = self.goal;
    if let Some(start) = random_occupant(&mut self.rng, octree, request.leaf) {
      request.start = start;
    }
    request.start_node = self.nav_mesh.find_node(request.start);
    request.goal_node = self.nav_mesh.find_node(request.goal);
    request.completed = false;
    request.ticket = self.next_ticket;
    self.next_ticket += 1;

    debug!(
      leaf = request.leaf.0,
      ticket = request.ticket,
      resolved = request.start_node.is_some() && request.goal_node.is_some(),
      "promoting path request"
    );

    self.submit(slot, request);
  }

  /// Pop the first request that is neither stale nor riding a live borrow.
  /// Borrowing requests rotate to the back; stale ones are dropped.
  fn next_eligible(&mut self, octree: &Octree) -> Option<PathRequest> {
    for _ in 0..self.pending.len() {
      let request = self.pending.pop_front()?;
      if !leaf_occupied(octree, request.leaf) {
        continue;
      }
      if request.is_borrowing() {
        self.pending.push_back(request);
        continue;
      }
      return Some(request);
    }
    None
  }

  fn submit(&self, mut slot: MutexGuard<'_, WorkerSlot>, request: PathRequest) {
    slot.current = Some(request);
    slot.start_requested = true;
    drop(slot);
    // A full channel already holds a wake-up.
    let _ = self.wake.try_send(());
  }

  // ===========================================================================
  // Readers
  // ===========================================================================

  /// Path agents in `leaf` should follow.
  pub fn path_for_leaf(&self, leaf: NodeId) -> Option<Arc<Path>> {
    if let Some(request) = self.pending.iter().find(|r| r.leaf == leaf) {
      return request.resolved_path();
    }
    let slot = self.shared.lock();
    slot
      .current
      .as_ref()
      .filter(|current| current.leaf == leaf)
      .and_then(PathRequest::resolved_path)
  }

  /// Path for the leaf currently holding `object`.
  pub fn path_for_object(&self, octree: &Octree, object: ObjectId) -> Option<Arc<Path>> {
    let leaf = octree.tracking(object)?.leaf;
    self.path_for_leaf(leaf)
  }

  /// Read the in-progress request under the lock.
  pub fn with_current<R>(&self, f: impl FnOnce(Option<&PathRequest>) -> R) -> R {
    let slot = self.shared.lock();
    f(slot.current.as_ref())
  }

  /// Requests waiting for their turn, front first.
  pub fn pending_requests(&self) -> impl Iterator<Item = &PathRequest> {
    self.pending.iter()
  }

  /// Pending requests plus the current one.
  pub fn request_count(&self) -> usize {
    self.pending.len() + usize::from(self.shared.lock().current.is_some())
  }

  /// Requests that need their own solve (not borrowing a live path).
  pub fn active_request_count(&self) -> usize {
    let pending = self.pending.iter().filter(|r| !r.is_borrowing()).count();
    let current = self
      .shared
      .lock()
      .current
      .as_ref()
      .is_some_and(|c| !c.is_borrowing());
    pending + usize::from(current)
  }

  pub fn latest_solve_ms(&self) -> f64 {
    self.shared.lock().timings.latest_ms()
  }

  pub fn average_solve_ms(&self) -> f64 {
    self.shared.lock().timings.average_ms()
  }

  /// Timing window contents, oldest first.
  pub fn solve_times_ms(&self) -> Vec<f64> {
    self.shared.lock().timings.samples_ms()
  }

  pub fn stats(&self, octree: &Octree) -> PathfindingStats {
    let (latest_solve_ms, average_solve_ms, solve_samples, total_solves) = {
      let slot = self.shared.lock();
      (
        slot.timings.latest_ms(),
        slot.timings.average_ms(),
        slot.timings.sample_count(),
        slot.timings.total_solves(),
      )
    };
    PathfindingStats {
      latest_solve_ms,
      average_solve_ms,
      solve_samples,
      total_solves,
      total_requests: self.request_count(),
      active_requests: self.active_request_count(),
      populated_leaves: octree.leaves_with_objects().len(),
      total_leaves: octree.leaves().len(),
    }
  }

  pub fn nav_mesh(&self) -> &Arc<NavMesh> {
    &self.nav_mesh
  }

  pub fn config(&self) -> &PathfindingConfig {
    &self.config
  }

  /// Stop the worker, cancelling any solve in flight, and wait for it.
  pub fn shutdown(&mut self) {
    let Some(worker) = self.worker.take() else {
      return;
    };
    self.shared.running.store(false, Ordering::SeqCst);
    self.shared.stopping.store(true, Ordering::SeqCst);
    let _ = self.wake.try_send(());
    if worker.join().is_err() {
      warn!("path solver thread panicked");
    }
  }
}

impl Drop for PathfindingManager {
  fn drop(&mut self) {
    self.shutdown();
  }
}

fn leaf_occupied(octree: &Octree, leaf: NodeId) -> bool {
  octree.node(leaf).is_some_and(|node| node.has_objects())
}

/// Position of a quasi-random occupant of `leaf`.
fn random_occupant(rng: &mut StdRng, octree: &Octree, leaf: NodeId) -> Option<Vec3> {
  let objects = octree.node(leaf)?.objects();
  if objects.is_empty() {
    return None;
  }
  let pick = objects[rng.random_range(0..objects.len())];
  octree.object_position(pick)
}

#[cfg(test)]
#[path = "manager_test.rs"]
mod manager_test;
