//! Level - per-level navigation state container.
//!
//! A level owns its nav mesh, octree, pathfinding manager and agents.
//! Loading a new level builds a fresh `Level`; dropping it stops the worker
//! and releases everything.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use glam::Vec3;
use tracing::info;

use crate::agent::Agent;
use crate::error::NavError;
use crate::metrics::LevelStats;
use crate::navmesh::{GeometryTriangle, NavMesh, NavMeshConfig};
use crate::octree::{ObjectId, Octree, OctreeConfig, OctreeObject};
use crate::pathfinding::{Path, PathfindingConfig, PathfindingManager};

/// Process-unique handle of a loaded level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LevelId(u64);

impl LevelId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

// =============================================================================
// Level
// =============================================================================

/// Settings for every service a level owns.
#[derive(Clone, Debug, Default)]
pub struct LevelConfig {
    pub nav_mesh: NavMeshConfig,
    pub octree: OctreeConfig,
    pub pathfinding: PathfindingConfig,
}

/// Navigation services and agents of one loaded level.
pub struct Level {
    /// Unique level identifier.
    pub id: LevelId,
    nav_mesh: Arc<NavMesh>,
    octree: Octree,
    pathfinding: PathfindingManager,
    agents: Vec<Agent>,
    next_agent_id: u64,
}

impl Level {
    /// Build nav mesh and octree from level triangles and start the
    /// pathfinding worker.
    pub fn load(triangles: &[GeometryTriangle], config: LevelConfig) -> Result<Self, NavError> {
        let nav_mesh = Arc::new(NavMesh::build(triangles, config.nav_mesh)?);
        let octree = Octree::new(&nav_mesh, config.octree)?;
        let pathfinding = PathfindingManager::new(Arc::clone(&nav_mesh), config.pathfinding)?;

        let id = LevelId::next();
        info!(
            level = id.raw(),
            nav_nodes = nav_mesh.len(),
            leaves = octree.leaves().len(),
            "level loaded"
        );

        Ok(Self {
            id,
            nav_mesh,
            octree,
            pathfinding,
            agents: Vec::new(),
            next_agent_id: 1,
        })
    }

    /// Place a new agent. Fails (`None`) off the nav mesh or outside the
    /// octree.
    pub fn spawn_agent(&mut self, position: Vec3, radius: f32) -> Option<ObjectId> {
        self.nav_mesh.find_node(position)?;

        let agent = Agent::new(ObjectId(self.next_agent_id), position, radius);
        self.octree.insert(&agent)?;
        self.next_agent_id += 1;

        let id = agent.id();
        self.agents.push(agent);
        Some(id)
    }

    /// Move an agent and refresh its octree placement. An agent that leaves
    /// the octree is despawned and `false` returned.
    pub fn move_agent(&mut self, id: ObjectId, position: Vec3) -> bool {
        let Some(agent) = self.agents.iter_mut().find(|a| a.id() == id) else {
            return false;
        };
        agent.set_position(position);
        if self.octree.update_object(&*agent).is_some() {
            return true;
        }
        self.agents.retain(|a| a.id() != id);
        false
    }

    pub fn despawn_agent(&mut self, id: ObjectId) -> bool {
        let before = self.agents.len();
        self.agents.retain(|a| a.id() != id);
        self.octree.remove_object(id);
        self.agents.len() != before
    }

    /// Advance pathfinding towards `goal` and hand every agent the path of
    /// its leaf.
    pub fn tick(&mut self, delta_time: f32, goal: Vec3) {
        self.pathfinding.set_goal(goal);
        self.pathfinding.update(&self.octree, delta_time);

        for agent in &mut self.agents {
            let path = self.pathfinding.path_for_object(&self.octree, agent.id());
            agent.set_path(path);
        }
    }

    pub fn path_for_agent(&self, id: ObjectId) -> Option<Arc<Path>> {
        self.agent(id)?.path().cloned()
    }

    pub fn agent(&self, id: ObjectId) -> Option<&Agent> {
        self.agents.iter().find(|a| a.id() == id)
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn nav_mesh(&self) -> &Arc<NavMesh> {
        &self.nav_mesh
    }

    pub fn octree(&self) -> &Octree {
        &self.octree
    }

    pub fn pathfinding(&self) -> &PathfindingManager {
        &self.pathfinding
    }

    pub fn stats(&self) -> LevelStats {
        LevelStats {
            pathfinding: self.pathfinding.stats(&self.octree),
            agents: self.agents.len(),
            agents_with_path: self.agents.iter().filter(|a| a.path().is_some()).count(),
            nav_nodes: self.nav_mesh.len(),
            perimeter_edges: self.nav_mesh.edges().len(),
        }
    }
}

#[cfg(test)]
#[path = "level_test.rs"]
mod level_test;
