//! Path and PathRequest - what the worker produces and what agents read.

use std::sync::{Arc, Weak};

use glam::Vec3;

use crate::geometry::Segment;
use crate::navmesh::NavNodeId;
use crate::octree::NodeId;

/// Solved route, shared between requests as `Arc<Path>`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Path {
  waypoints: Vec<Vec3>,
}

impl Path {
  pub fn new(waypoints: Vec<Vec3>) -> Self {
    Self { waypoints }
  }

  #[inline]
  pub fn waypoints(&self) -> &[Vec3] {
    &self.waypoints
  }

  #[inline]
  pub fn len(&self) -> usize {
    self.waypoints.len()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.waypoints.is_empty()
  }

  /// Consecutive waypoint pairs.
  pub fn segments(&self) -> impl Iterator<Item = Segment> + '_ {
    self.waypoints.windows(2).map(|pair| Segment::new(pair[0], pair[1]))
  }

  /// Total length along the waypoints.
  pub fn length(&self) -> f32 {
    self.segments().map(|segment| segment.length()).sum()
  }
}

/// Path lent by the request of another leaf.
#[derive(Clone, Debug)]
pub struct BorrowedPath {
  /// Leaf of the lending request.
  pub lender: NodeId,
  pub path: Weak<Path>,
}

impl BorrowedPath {
  pub fn new(lender: NodeId, path: &Arc<Path>) -> Self {
    Self {
      lender,
      path: Arc::downgrade(path),
    }
  }

  /// True when `path` is the exact allocation this borrow points at.
  pub fn is_of(&self, path: &Arc<Path>) -> bool {
    std::ptr::eq(self.path.as_ptr(), Arc::as_ptr(path))
  }
}

/// Path request for one occupied octree leaf.
///
/// A request either owns a path produced by the worker or borrows one from
/// another request whose path crosses its leaf. A borrow stays valid only
/// while the lending request still owns that exact path; agents holding the
/// `Arc` do not extend it.
#[derive(Clone, Debug)]
pub struct PathRequest {
  /// Leaf the request was issued for.
  pub leaf: NodeId,
  /// Set when the worker finished with this request.
  pub completed: bool,
  /// Path produced for this request.
  pub path: Option<Arc<Path>>,
  /// Path lent by another request.
  pub borrowed: Option<BorrowedPath>,
  pub start: Vec3,
  pub goal: Vec3,
  pub start_node: Option<NavNodeId>,
  pub goal_node: Option<NavNodeId>,
  /// Identifies the solve this request was last submitted for.
  pub(crate) ticket: u64,
}

impl PathRequest {
  pub fn new(leaf: NodeId, start: Vec3, goal: Vec3) -> Self {
    Self {
      leaf,
      completed: false,
      path: None,
      borrowed: None,
      start,
      goal,
      start_node: None,
      goal_node: None,
      ticket: 0,
    }
  }

  /// Borrowed path if it is still allocated.
  pub fn borrowed_path(&self) -> Option<Arc<Path>> {
    self.borrowed.as_ref().and_then(|borrow| borrow.path.upgrade())
  }

  /// True while the request rides on another request's path.
  pub fn is_borrowing(&self) -> bool {
    self
      .borrowed
      .as_ref()
      .is_some_and(|borrow| borrow.path.strong_count() > 0)
  }

  /// Path agents in this leaf should follow: a live borrow wins over the
  /// owned path.
  pub fn resolved_path(&self) -> Option<Arc<Path>> {
    self.borrowed_path().or_else(|| self.path.clone())
  }

  /// Drop the borrow unless `owners` (leaf and owned path of every lending
  /// candidate) still lists its lender with the lent path. Returns true if
  /// the borrow was dropped.
  pub fn revalidate_borrow(&mut self, owners: &[(NodeId, Arc<Path>)]) -> bool {
    let Some(borrow) = &self.borrowed else {
      return false;
    };
    let owned = owners
      .iter()
      .any(|(leaf, path)| *leaf == borrow.lender && borrow.is_of(path));
    if owned {
      return false;
    }
    self.borrowed = None;
    true
  }
}
