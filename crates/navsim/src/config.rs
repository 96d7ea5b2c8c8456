//! Scenario configuration for the crowd simulation.
//!
//! Every field has a default, so an empty file (or no file at all) runs the
//! stock scenario.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use navcore::{LevelConfig, NavMeshConfig, OctreeConfig, PathfindingConfig};

/// Root configuration for a simulation run.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Scenario {
	/// Seed for obstacle layout, spawn points and request sampling.
	pub seed: u64,
	/// Number of simulation ticks to run.
	pub ticks: u32,
	/// Simulated seconds per tick.
	pub tick_seconds: f32,
	/// Wall-clock pause after each tick, giving the worker time to solve.
	pub tick_sleep_ms: u64,
	/// Log a stats line every this many ticks (0 disables).
	pub stats_interval: u32,
	pub floor: FloorConfig,
	pub agents: AgentConfig,
	pub navigation: NavigationConfig,
}

/// Grid floor the level is built from.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct FloorConfig {
	pub columns: usize,
	pub rows: usize,
	pub cell_size: f32,
	/// Fraction of cells removed as obstacles, 0.0-1.0.
	pub blocked_ratio: f64,
}

/// Crowd settings.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
	pub count: usize,
	pub radius: f32,
	/// Units per simulated second.
	pub speed: f32,
	/// Goal as `[x, y, z]`; defaults to the center of the far corner cell.
	pub goal: Option<[f32; 3]>,
}

/// Tuning handed to the navigation services.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct NavigationConfig {
	pub depth_limit: u32,
	pub prune_margin: f32,
	pub restart_interval: f32,
	pub idle_sleep_ms: u64,
	pub timing_window: usize,
}

impl Default for Scenario {
	fn default() -> Self {
		Self {
			seed: 1,
			ticks: 600,
			tick_seconds: 1.0 / 60.0,
			tick_sleep_ms: 2,
			stats_interval: 60,
			floor: FloorConfig::default(),
			agents: AgentConfig::default(),
			navigation: NavigationConfig::default(),
		}
	}
}

impl Default for FloorConfig {
	fn default() -> Self {
		Self {
			columns: 32,
			rows: 32,
			cell_size: 1.0,
			blocked_ratio: 0.15,
		}
	}
}

impl Default for AgentConfig {
	fn default() -> Self {
		Self {
			count: 64,
			radius: 0.3,
			speed: 3.0,
			goal: None,
		}
	}
}

impl Default for NavigationConfig {
	fn default() -> Self {
		let octree = OctreeConfig::default();
		let pathfinding = PathfindingConfig::default();
		Self {
			depth_limit: octree.depth_limit,
			prune_margin: octree.prune_margin,
			restart_interval: pathfinding.restart_interval,
			idle_sleep_ms: pathfinding.idle_sleep.as_millis() as u64,
			timing_window: pathfinding.timing_window,
		}
	}
}

impl Scenario {
	/// Load a scenario from a TOML file.
	pub fn load(path: &Path) -> Result<Self> {
		let content = std::fs::read_to_string(path)
			.with_context(|| format!("Failed to read scenario file: {}", path.display()))?;
		let scenario: Scenario =
			toml::from_str(&content).with_context(|| "Failed to parse scenario TOML")?;
		scenario.validate()?;
		Ok(scenario)
	}

	/// Reject values the simulation cannot run with. Navigation settings are
	/// checked by navcore when the level loads.
	pub fn validate(&self) -> Result<()> {
		if self.floor.columns == 0 || self.floor.rows == 0 {
			anyhow::bail!(
				"floor must have at least one cell, got {}x{}",
				self.floor.columns,
				self.floor.rows
			);
		}
		if !(self.floor.cell_size > 0.0) {
			anyhow::bail!("cell_size must be positive, got {}", self.floor.cell_size);
		}
		if !(0.0..1.0).contains(&self.floor.blocked_ratio) {
			anyhow::bail!(
				"blocked_ratio must be in [0, 1), got {}",
				self.floor.blocked_ratio
			);
		}
		if !(self.tick_seconds > 0.0) {
			anyhow::bail!("tick_seconds must be positive, got {}", self.tick_seconds);
		}
		if self.agents.speed < 0.0 || self.agents.radius < 0.0 {
			anyhow::bail!("agent speed and radius must not be negative");
		}
		Ok(())
	}

	/// Settings for `navcore::Level::load`.
	pub fn level_config(&self) -> LevelConfig {
		LevelConfig {
			nav_mesh: NavMeshConfig::default(),
			octree: OctreeConfig {
				depth_limit: self.navigation.depth_limit,
				prune_margin: self.navigation.prune_margin,
			},
			pathfinding: PathfindingConfig {
				restart_interval: self.navigation.restart_interval,
				idle_sleep: Duration::from_millis(self.navigation.idle_sleep_ms),
				timing_window: self.navigation.timing_window,
				seed: Some(self.seed),
				..Default::default()
			},
		}
	}
}
