use std::time::Duration;

use super::*;
use crate::navmesh::grid::{cell_center, grid_floor, grid_floor_with};

fn seeded_config() -> LevelConfig {
    LevelConfig {
        pathfinding: PathfindingConfig {
            seed: Some(11),
            ..Default::default()
        },
        ..Default::default()
    }
}

fn floor_level() -> Level {
    Level::load(&grid_floor(8, 8, 1.0, Vec3::ZERO), seeded_config()).unwrap()
}

// =========================================================================
// Batch 1: Loading
// =========================================================================

/// Loading builds every service over the same triangles.
#[test]
fn test_load_builds_services() {
    let level = floor_level();

    assert_eq!(level.nav_mesh().len(), 128, "8x8 cells, two triangles each");
    assert!(!level.octree().leaves().is_empty());
    assert!(Arc::ptr_eq(level.nav_mesh(), level.pathfinding().nav_mesh()));
    assert!(level.agents().is_empty());
}

/// Each load gets a fresh id.
#[test]
fn test_level_ids_unique() {
    let a = floor_level();
    let b = floor_level();
    assert_ne!(a.id, b.id);
    assert!(b.id.raw() > a.id.raw());
}

/// A bad octree setting fails the whole load.
#[test]
fn test_invalid_config_fails_load() {
    let config = LevelConfig {
        octree: OctreeConfig {
            depth_limit: 0,
            ..Default::default()
        },
        ..Default::default()
    };
    let result = Level::load(&grid_floor(2, 2, 1.0, Vec3::ZERO), config);
    assert!(matches!(
        result,
        Err(NavError::InvalidConfig {
            field: "depth_limit",
            ..
        })
    ));
}

// =========================================================================
// Batch 2: Agents
// =========================================================================

/// Agents spawn only on walkable ground.
#[test]
fn test_spawn_requires_nav_mesh() {
    let blocked = |column: usize, row: usize| column == 3 && row == 3;
    let mut level = Level::load(
        &grid_floor_with(8, 8, 1.0, Vec3::ZERO, blocked),
        seeded_config(),
    )
    .unwrap();

    let on_floor = level.spawn_agent(cell_center(1, 1, 1.0, Vec3::ZERO), 0.3);
    let in_hole = level.spawn_agent(cell_center(3, 3, 1.0, Vec3::ZERO), 0.3);

    assert!(on_floor.is_some());
    assert!(in_hole.is_none(), "no agent inside a blocked cell");
    assert_eq!(level.agents().len(), 1);
    assert_eq!(level.octree().object_count(), 1);
}

/// Spawned ids are distinct and resolve back to their agent.
#[test]
fn test_spawned_agents_addressable() {
    let mut level = floor_level();
    let a = level.spawn_agent(Vec3::new(0.5, 0.0, 0.5), 0.3).unwrap();
    let b = level.spawn_agent(Vec3::new(6.5, 0.0, 6.5), 0.3).unwrap();

    assert_ne!(a, b);
    assert_eq!(level.agent(b).unwrap().position(), Vec3::new(6.5, 0.0, 6.5));
    assert!(level.octree().tracking(a).is_some());
}

/// Moving updates octree tracking; leaving the octree despawns.
#[test]
fn test_move_agent() {
    let mut level = floor_level();
    let id = level.spawn_agent(Vec3::new(0.5, 0.0, 0.5), 0.3).unwrap();
    let target = Vec3::new(7.5, 0.0, 7.5);

    assert!(level.move_agent(id, target));
    assert_eq!(level.octree().object_position(id), Some(target));
    assert_eq!(
        level.octree().tracking(id).map(|t| t.leaf),
        level.octree().leaf_at(target)
    );

    assert!(!level.move_agent(id, Vec3::new(500.0, 0.0, 500.0)));
    assert!(level.agent(id).is_none(), "agent outside the octree is gone");
    assert_eq!(level.octree().object_count(), 0);
}

#[test]
fn test_despawn_agent() {
    let mut level = floor_level();
    let id = level.spawn_agent(Vec3::new(0.5, 0.0, 0.5), 0.3).unwrap();

    assert!(level.despawn_agent(id));
    assert!(!level.despawn_agent(id), "second despawn is a no-op");
    assert!(level.octree().tracking(id).is_none());
}

// =========================================================================
// Batch 3: Ticking
// =========================================================================

/// Ticking eventually hands every agent a path to the goal.
#[test]
fn test_tick_assigns_paths() {
    let mut level = floor_level();
    let start = Vec3::new(0.5, 0.0, 0.5);
    let goal = Vec3::new(7.5, 0.0, 7.5);
    let id = level.spawn_agent(start, 0.3).unwrap();

    let mut found = None;
    for _ in 0..2000 {
        level.tick(0.016, goal);
        if let Some(path) = level.path_for_agent(id) {
            found = Some(path);
            break;
        }
        std::thread::sleep(Duration::from_millis(2));
    }

    let path = found.expect("worker should solve within the time limit");
    assert_eq!(path.waypoints().first(), Some(&start));
    assert_eq!(path.waypoints().last(), Some(&goal));
    assert_eq!(level.agent(id).and_then(|a| a.path()), Some(&path));
}

/// Stats mirror the level contents.
#[test]
fn test_stats_snapshot() {
    let mut level = floor_level();
    level.spawn_agent(Vec3::new(0.5, 0.0, 0.5), 0.3).unwrap();
    level.spawn_agent(Vec3::new(6.5, 0.0, 6.5), 0.3).unwrap();
    level.tick(0.016, Vec3::new(4.5, 0.0, 4.5));

    let stats = level.stats();
    assert_eq!(stats.agents, 2);
    assert!(stats.agents_with_path <= stats.agents);
    assert_eq!(stats.nav_nodes, 128);
    assert!(stats.perimeter_edges > 0);
    assert_eq!(stats.pathfinding.populated_leaves, 2);
    assert_eq!(stats.pathfinding.total_requests, 2);
}

/// Tick until `done` holds, sleeping briefly for the worker.
fn tick_until(level: &mut Level, goal: Vec3, mut done: impl FnMut(&Level) -> bool) -> bool {
    for _ in 0..2000 {
        level.tick(0.016, goal);
        if done(level) {
            return true;
        }
        std::thread::sleep(Duration::from_millis(2));
    }
    false
}

/// An agent riding on another agent's path gets its own path again once
/// that agent is gone, even though it still holds the borrowed one.
#[test]
fn test_borrower_recovers_after_lender_despawns() {
    let config = LevelConfig {
        octree: OctreeConfig {
            depth_limit: 4,
            ..Default::default()
        },
        ..seeded_config()
    };
    let mut level = Level::load(&grid_floor(16, 1, 1.0, Vec3::ZERO), config).unwrap();
    let a_position = Vec3::new(0.5, 0.0, 0.3);
    let b_position = Vec3::new(8.5, 0.0, 0.3);
    let a = level.spawn_agent(a_position, 0.2).unwrap();
    let b = level.spawn_agent(b_position, 0.2).unwrap();

    let goal = Vec3::new(15.5, 0.0, 0.3);
    let borrowed = tick_until(&mut level, goal, |level| {
        level
            .path_for_agent(b)
            .is_some_and(|path| path.waypoints().first() == Some(&a_position))
    });
    assert!(borrowed, "b should ride on a's path first");

    assert!(level.despawn_agent(a));
    let new_goal = Vec3::new(0.5, 0.0, 0.5);
    let recovered = tick_until(&mut level, new_goal, |level| {
        level
            .path_for_agent(b)
            .is_some_and(|path| path.waypoints().last() == Some(&new_goal))
    });
    assert!(recovered, "b should solve towards the moved goal");
    let path = level.path_for_agent(b).unwrap();
    assert_eq!(path.waypoints().first(), Some(&b_position));
}
