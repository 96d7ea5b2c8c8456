//! Background solver thread and the state it shares with the manager.
//!
//! All cross-thread state sits in one [`WorkerSlot`] behind one mutex. The
//! worker holds the lock only to snapshot a job and to publish a result; the
//! search itself runs unlocked against the immutable nav mesh with the
//! solver's own scratch.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError};
use tracing::{debug, info, trace};
use web_time::Instant;

use super::request::{Path, PathRequest};
use crate::metrics::SolveTimings;
use crate::navmesh::NavMesh;
use crate::solver::{PathQuery, PathResult, Solver};

/// Everything guarded by the manager/worker mutex.
#[derive(Debug)]
pub(crate) struct WorkerSlot {
  /// Request being solved (or waiting to be picked up).
  pub current: Option<PathRequest>,
  /// Set by the manager when `current` should be solved.
  pub start_requested: bool,
  /// True between job snapshot and result publication.
  pub in_flight: bool,
  pub timings: SolveTimings,
}

/// State shared between the manager and its worker thread.
#[derive(Debug)]
pub(crate) struct WorkerShared {
  slot: Mutex<WorkerSlot>,
  pub running: AtomicBool,
  pub stopping: AtomicBool,
}

/// Snapshot of the current request taken under the lock.
struct Job {
  ticket: u64,
  query: PathQuery,
}

impl WorkerShared {
  pub fn new(timing_window: usize) -> Self {
    Self {
      slot: Mutex::new(WorkerSlot {
        current: None,
        start_requested: false,
        in_flight: false,
        timings: SolveTimings::new(timing_window),
      }),
      running: AtomicBool::new(true),
      stopping: AtomicBool::new(false),
    }
  }

  /// Lock the slot. A panic on the other side does not invalidate the plain
  /// data inside, so poisoning is ignored.
  pub fn lock(&self) -> MutexGuard<'_, WorkerSlot> {
    self.slot.lock().unwrap_or_else(PoisonError::into_inner)
  }

  /// Take the flagged request as a job, completing it on the spot when
  /// there is nothing to search.
  fn take_job(&self) -> Option<Job> {
    let mut slot = self.lock();
    if !slot.start_requested {
      return None;
    }
    slot.start_requested = false;
    // Re-arm cancellation for this job, but never over a shutdown request
    if !self.running.load(Ordering::SeqCst) {
      return None;
    }
    self.stopping.store(false, Ordering::SeqCst);
    if !self.running.load(Ordering::SeqCst) {
      self.stopping.store(true, Ordering::SeqCst);
      return None;
    }

    let current = slot.current.as_mut()?;
    match (current.start_node, current.goal_node) {
      (Some(start_node), Some(goal_node)) if start_node != goal_node => {
        let job = Job {
          ticket: current.ticket,
          query: PathQuery {
            start_node,
            goal_node,
            start: current.start,
            goal: current.goal,
          },
        };
        slot.in_flight = true;
        Some(job)
      }
      (Some(_), Some(_)) => {
        // Already at the goal node
        current.path = Some(Arc::new(Path::default()));
        current.completed = true;
        None
      }
      _ => {
        trace!(leaf = current.leaf.0, "request without nav nodes, completing");
        current.completed = true;
        None
      }
    }
  }

  /// Store the result if the request it belongs to is still current.
  fn publish(&self, ticket: u64, result: PathResult, elapsed: Duration) {
    let mut slot = self.lock();
    slot.in_flight = false;
    slot.timings.record(elapsed);

    let Some(current) = slot.current.as_mut().filter(|c| c.ticket == ticket) else {
      debug!(ticket, "discarding result for a rotated request");
      return;
    };
    if let PathResult::Found(waypoints) = result {
      current.path = Some(Arc::new(Path::new(waypoints)));
    }
    current.completed = true;
  }
}

/// Spawn the named worker thread.
pub(crate) fn spawn(
  shared: Arc<WorkerShared>,
  nav_mesh: Arc<NavMesh>,
  solver: Box<dyn Solver>,
  wake: Receiver<()>,
  idle_sleep: Duration,
  name: String,
) -> std::io::Result<JoinHandle<()>> {
  std::thread::Builder::new()
    .name(name)
    .spawn(move || run(&shared, &nav_mesh, solver, &wake, idle_sleep))
}

fn run(
  shared: &WorkerShared,
  nav_mesh: &NavMesh,
  mut solver: Box<dyn Solver>,
  wake: &Receiver<()>,
  idle_sleep: Duration,
) {
  info!("path solver started");

  while shared.running.load(Ordering::Acquire) {
    match wake.recv_timeout(idle_sleep) {
      Ok(()) | Err(RecvTimeoutError::Timeout) => {}
      Err(RecvTimeoutError::Disconnected) => break,
    }

    let Some(job) = shared.take_job() else {
      continue;
    };

    let timer = Instant::now();
    let result = solver.find_path(nav_mesh, &job.query, &shared.stopping);
    let elapsed = timer.elapsed();

    trace!(
      ticket = job.ticket,
      found = result.is_found(),
      elapsed_us = elapsed.as_micros() as u64,
      "path solved"
    );
    shared.publish(job.ticket, result, elapsed);
  }

  info!("path solver stopped");
}
