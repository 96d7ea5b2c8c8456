use super::*;
use crate::navmesh::grid::grid_floor;
use crate::navmesh::NavMeshConfig;

/// Minimal mobile object for placement tests.
struct Marker {
  id: ObjectId,
  position: Vec3,
  radius: f32,
}

impl Marker {
  fn new(id: u64, position: Vec3) -> Self {
    Self {
      id: ObjectId(id),
      position,
      radius: 0.1,
    }
  }
}

impl OctreeObject for Marker {
  fn id(&self) -> ObjectId {
    self.id
  }

  fn position(&self) -> Vec3 {
    self.position
  }

  fn bounding_sphere(&self) -> Sphere {
    Sphere::new(self.position, self.radius)
  }
}

fn floor_mesh() -> NavMesh {
  NavMesh::build(&grid_floor(8, 8, 1.0, Vec3::ZERO), NavMeshConfig::default()).unwrap()
}

/// 8x8 floor, depth 3: root 8, children 4, leaves 2 units wide.
fn floor_tree() -> Octree {
  let config = OctreeConfig {
    depth_limit: 3,
    ..Default::default()
  };
  Octree::new(&floor_mesh(), config).unwrap()
}

fn leaf_of(tree: &Octree, id: u64) -> NodeId {
  tree.tracking(ObjectId(id)).expect("object should be tracked").leaf
}

// =========================================================================
// Batch 1: Build
// =========================================================================

/// Root is the cube around the walkable vertices.
#[test]
fn test_root_is_bounding_cube() {
  let tree = floor_tree();
  let root = tree.root();

  assert_eq!(root.center(), Vec3::new(4.0, 0.0, 4.0));
  assert_eq!(root.bounds.size(), Vec3::splat(8.0));
  assert_eq!(root.depth, 0);
  assert!(root.parent.is_none());
}

/// Every leaf sits at the last allowed depth with the expected size.
#[test]
fn test_leaves_at_depth_limit() {
  let tree = floor_tree();

  assert!(!tree.leaves().is_empty());
  for &leaf in tree.leaves() {
    let node = tree.node(leaf).unwrap();
    assert_eq!(node.depth, 2, "leaf {leaf:?} at wrong depth");
    assert_eq!(node.bounds.size(), Vec3::splat(2.0));
  }
  // 4x4 columns, two layers straddling the floor
  assert_eq!(tree.leaves().len(), 32);
}

/// Children are offset a quarter of the parent size towards their octant.
#[test]
fn test_child_placement() {
  let tree = floor_tree();
  let root = tree.root();

  for &child in &root.children {
    let node = tree.node(child).unwrap();
    let octant = node.octant.unwrap();
    let expected = root.center() + octant_direction(octant) * 2.0;
    assert_eq!(node.center(), expected, "octant {octant}");
    assert_eq!(node.parent, Some(Octree::ROOT));
  }
}

/// Regions far from any nav-mesh node are never materialized.
#[test]
fn test_pruned_regions_reject_inserts() {
  let mut triangles = grid_floor(1, 1, 1.0, Vec3::ZERO);
  triangles.extend(grid_floor(1, 1, 1.0, Vec3::new(7.0, 0.0, 0.0)));
  let mesh = NavMesh::build(&triangles, NavMeshConfig::default()).unwrap();
  let config = OctreeConfig {
    depth_limit: 3,
    ..Default::default()
  };
  let mut tree = Octree::new(&mesh, config).unwrap();

  assert_eq!(tree.leaf_at(Vec3::new(4.0, 0.5, 0.5)), None);
  assert_eq!(tree.insert(&Marker::new(1, Vec3::new(4.0, 0.5, 0.5))), None);
  assert!(tree.insert(&Marker::new(2, Vec3::new(0.5, 0.5, 0.5))).is_some());
}

/// Depth limit 1 keeps the root as the only (leaf) node.
#[test]
fn test_depth_limit_one_is_root_only() {
  let config = OctreeConfig {
    depth_limit: 1,
    ..Default::default()
  };
  let tree = Octree::new(&floor_mesh(), config).unwrap();

  assert_eq!(tree.nodes().len(), 1);
  assert_eq!(tree.leaves(), &[Octree::ROOT]);
}

/// An empty nav mesh yields a root-only tree.
#[test]
fn test_empty_mesh_root_only() {
  let tree = Octree::new(&NavMesh::empty(), OctreeConfig::default()).unwrap();

  assert_eq!(tree.nodes().len(), 1);
  assert!(tree.root().is_leaf());
}

/// Zero depth is rejected.
#[test]
fn test_invalid_depth_limit() {
  let config = OctreeConfig {
    depth_limit: 0,
    ..Default::default()
  };
  assert!(matches!(
    Octree::new(&floor_mesh(), config),
    Err(NavError::InvalidConfig { field: "depth_limit", .. })
  ));
}

/// Leaf neighbours are symmetric and exactly the touching leaves.
#[test]
fn test_leaf_neighbours_symmetric() {
  let tree = floor_tree();

  for &leaf in tree.leaves() {
    let node = tree.node(leaf).unwrap();
    for &other in tree.leaves() {
      if other == leaf {
        continue;
      }
      let touching = node.bounds.overlaps(&tree.node(other).unwrap().bounds);
      assert_eq!(node.neighbours.contains(&other), touching, "{leaf:?} vs {other:?}");
    }
  }

  // Corner column leaf: 3 columns around it, 2 layers, minus itself
  let corner = tree.leaf_at(Vec3::new(0.5, 0.5, 0.5)).unwrap();
  assert_eq!(tree.node(corner).unwrap().neighbours.len(), 7);
}

// =========================================================================
// Batch 2: Insert / update / remove
// =========================================================================

/// Insert lands in the leaf containing the position.
#[test]
fn test_insert_places_in_containing_leaf() {
  let mut tree = floor_tree();
  let leaf = tree.insert(&Marker::new(1, Vec3::new(1.5, 0.5, 1.5))).unwrap();

  let node = tree.node(leaf).unwrap();
  assert!(node.is_leaf());
  assert!(node.bounds.contains_point(Vec3::new(1.5, 0.5, 1.5)));
  assert!(node.contains_object(ObjectId(1)));
  assert_eq!(tree.object_position(ObjectId(1)), Some(Vec3::new(1.5, 0.5, 1.5)));
  assert_eq!(tree.object_count(), 1);
}

/// Positions outside the root are not inserted.
#[test]
fn test_insert_outside_root() {
  let mut tree = floor_tree();

  assert_eq!(tree.insert(&Marker::new(1, Vec3::new(-3.0, 0.5, 1.0))), None);
  assert!(tree.tracking(ObjectId(1)).is_none());
}

/// Objects sharing a leaf are kept ordered by id.
#[test]
fn test_leaf_objects_sorted() {
  let mut tree = floor_tree();
  for id in [7, 2, 5] {
    tree.insert(&Marker::new(id, Vec3::new(0.5 + id as f32 * 0.1, 0.5, 0.5)));
  }

  let leaf = leaf_of(&tree, 7);
  assert_eq!(
    tree.node(leaf).unwrap().objects(),
    &[ObjectId(2), ObjectId(5), ObjectId(7)]
  );
}

/// Moving inside the same leaf keeps the leaf.
#[test]
fn test_update_within_leaf() {
  let mut tree = floor_tree();
  let mut marker = Marker::new(1, Vec3::new(0.5, 0.5, 0.5));
  let leaf = tree.insert(&marker).unwrap();

  marker.position = Vec3::new(1.5, 0.5, 1.5);
  assert_eq!(tree.update_object(&marker), Some(leaf));
  assert_eq!(tree.object_position(ObjectId(1)), Some(marker.position));
}

/// Crossing a leaf boundary moves the object to the new leaf only.
#[test]
fn test_update_crosses_leaf() {
  let mut tree = floor_tree();
  let mut marker = Marker::new(1, Vec3::new(0.5, 0.5, 0.5));
  let old_leaf = tree.insert(&marker).unwrap();

  marker.position = Vec3::new(5.5, 0.5, 3.5);
  let new_leaf = tree.update_object(&marker).unwrap();

  assert_ne!(old_leaf, new_leaf);
  assert!(!tree.node(old_leaf).unwrap().contains_object(ObjectId(1)));
  assert!(tree.node(new_leaf).unwrap().contains_object(ObjectId(1)));
  assert!(tree.node(new_leaf).unwrap().bounds.contains_point(marker.position));
}

/// Neighbour cache holds exactly the neighbour leaves the sphere touches.
#[test]
fn test_update_refreshes_neighbour_cache() {
  let mut tree = floor_tree();
  let mut marker = Marker::new(1, Vec3::new(3.0, 0.5, 3.0));
  tree.insert(&marker).unwrap();
  assert!(
    tree.tracking(ObjectId(1)).unwrap().neighbour_leaves.is_empty(),
    "small sphere in the middle of a leaf touches no neighbour"
  );

  marker.radius = 1.2;
  tree.update_object(&marker).unwrap();

  let tracking = tree.tracking(ObjectId(1)).unwrap();
  let leaf = tree.node(tracking.leaf).unwrap();
  let sphere = marker.bounding_sphere();
  let expected: Vec<NodeId> = leaf
    .neighbours
    .iter()
    .copied()
    .filter(|n| tree.node(*n).unwrap().bounds.intersects_sphere(&sphere))
    .collect();
  assert!(!expected.is_empty());
  assert_eq!(tracking.neighbour_leaves.as_slice(), expected.as_slice());
}

/// Leaving the tree removes the object.
#[test]
fn test_update_out_of_tree_removes() {
  let mut tree = floor_tree();
  let mut marker = Marker::new(1, Vec3::new(0.5, 0.5, 0.5));
  let leaf = tree.insert(&marker).unwrap();

  marker.position = Vec3::new(50.0, 0.5, 0.5);
  assert_eq!(tree.update_object(&marker), None);
  assert!(tree.tracking(ObjectId(1)).is_none());
  assert!(!tree.node(leaf).unwrap().has_objects());
}

/// Updating an unknown object inserts it.
#[test]
fn test_update_untracked_inserts() {
  let mut tree = floor_tree();
  let leaf = tree.update_object(&Marker::new(3, Vec3::new(6.5, 0.5, 6.5)));

  assert!(leaf.is_some());
  assert_eq!(tree.object_count(), 1);
}

/// Remove clears both tracking and the leaf list.
#[test]
fn test_remove_object() {
  let mut tree = floor_tree();
  let leaf = tree.insert(&Marker::new(1, Vec3::new(0.5, 0.5, 0.5))).unwrap();

  assert!(tree.remove_object(ObjectId(1)));
  assert!(!tree.remove_object(ObjectId(1)));
  assert!(!tree.node(leaf).unwrap().has_objects());
}

// =========================================================================
// Batch 3: Queries
// =========================================================================

/// Only occupied leaves are reported.
#[test]
fn test_leaves_with_objects() {
  let mut tree = floor_tree();
  assert!(tree.leaves_with_objects().is_empty());

  tree.insert(&Marker::new(1, Vec3::new(0.5, 0.5, 0.5)));
  tree.insert(&Marker::new(2, Vec3::new(0.7, 0.5, 0.5)));
  tree.insert(&Marker::new(3, Vec3::new(6.5, 0.5, 6.5)));

  let occupied = tree.leaves_with_objects();
  assert_eq!(occupied.len(), 2);
  assert!(occupied.contains(&leaf_of(&tree, 1)));
  assert!(occupied.contains(&leaf_of(&tree, 3)));
}

/// Broad phase returns same-leaf and overlapped-neighbour occupants.
#[test]
fn test_nearby_objects() {
  let mut tree = floor_tree();
  let mut hero = Marker::new(1, Vec3::new(1.9, 0.5, 1.0));
  hero.radius = 0.5;
  tree.insert(&hero);
  tree.insert(&Marker::new(2, Vec3::new(1.0, 0.5, 1.0)));
  // Next leaf over on +x, within the hero's sphere reach
  tree.insert(&Marker::new(3, Vec3::new(2.5, 0.5, 1.0)));
  // Far away
  tree.insert(&Marker::new(4, Vec3::new(7.5, 0.5, 7.5)));

  let mut nearby = tree.nearby_objects(ObjectId(1));
  nearby.sort();
  assert_eq!(nearby, vec![ObjectId(2), ObjectId(3)]);
  assert!(tree.nearby_objects(ObjectId(99)).is_empty());
}

/// Segment broad phase collects occupants of crossed leaves.
#[test]
fn test_objects_along_segment() {
  let mut tree = floor_tree();
  tree.insert(&Marker::new(1, Vec3::new(0.5, 0.5, 0.5)));
  tree.insert(&Marker::new(2, Vec3::new(6.5, 0.5, 0.5)));
  tree.insert(&Marker::new(3, Vec3::new(6.5, 0.5, 6.5)));

  let mut hits = tree.objects_along(&Segment::new(Vec3::new(0.1, 0.5, 0.5), Vec3::new(7.9, 0.5, 0.5)));
  hits.sort();
  assert_eq!(hits, vec![ObjectId(1), ObjectId(2)]);
}
