//! Headless crowd simulation.
//!
//! Builds a grid level with random obstacles, spawns a crowd on it and
//! ticks the navigation services until the agents reach the goal or the
//! tick budget runs out. Agents steer towards the farthest waypoint of their
//! leaf's path they can see.

mod config;

use anyhow::{Context, Result};
use clap::Parser;
use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

use config::Scenario;
use navcore::navmesh::grid::cell_center;
use navcore::{grid_floor_with, Level, NavMesh, ObjectId, OctreeObject};

/// Crowd simulation over the navcore pathfinding services.
#[derive(Parser, Debug)]
#[command(name = "navsim")]
#[command(about = "Runs a headless crowd towards a goal and reports pathfinding stats")]
struct Args {
	/// Path to scenario TOML file (default: built-in scenario).
	#[arg(short, long)]
	config: Option<PathBuf>,

	/// Override the number of ticks to run.
	#[arg(short, long)]
	ticks: Option<u32>,

	/// Override the number of agents.
	#[arg(short, long)]
	agents: Option<usize>,

	/// Override the random seed.
	#[arg(short, long)]
	seed: Option<u64>,
}

fn main() -> Result<()> {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
	let args = Args::parse();

	let mut scenario = match &args.config {
		Some(path) => Scenario::load(path)?,
		None => Scenario::default(),
	};
	if let Some(ticks) = args.ticks {
		scenario.ticks = ticks;
	}
	if let Some(count) = args.agents {
		scenario.agents.count = count;
	}
	if let Some(seed) = args.seed {
		scenario.seed = seed;
	}
	scenario.validate()?;

	let mut rng = StdRng::seed_from_u64(scenario.seed);
	let blocked = obstacle_layout(&scenario, &mut rng);
	let floor = &scenario.floor;
	let triangles = grid_floor_with(floor.columns, floor.rows, floor.cell_size, Vec3::ZERO, |c, r| {
		blocked[r * floor.columns + c]
	});

	let mut level = Level::load(&triangles, scenario.level_config()).context("Failed to load level")?;

	let goal = scenario.agents.goal.map(Vec3::from_array).unwrap_or_else(|| {
		cell_center(floor.columns - 1, floor.rows - 1, floor.cell_size, Vec3::ZERO)
	});
	if level.nav_mesh().find_node(goal).is_none() {
		anyhow::bail!("goal {goal} is not on the nav mesh");
	}

	let spawned = spawn_crowd(&mut level, &scenario, &blocked, &mut rng);
	info!(
		agents = spawned,
		nav_nodes = level.nav_mesh().len(),
		perimeter_edges = level.nav_mesh().edges().len(),
		"simulation start"
	);

	let arrive_distance = (scenario.agents.radius * 2.0).max(0.1);
	let mut arrived = 0usize;
	for tick in 0..scenario.ticks {
		level.tick(scenario.tick_seconds, goal);

		let step = scenario.agents.speed * scenario.tick_seconds;
		let moves: Vec<(ObjectId, Vec3)> = level
			.agents()
			.iter()
			.filter_map(|agent| {
				let path = agent.path()?;
				let target = steering_target(level.nav_mesh(), agent.position(), path.waypoints())?;
				Some((agent.id(), move_towards(agent.position(), target, step)))
			})
			.collect();

		for (id, position) in moves {
			if position.distance(goal) <= arrive_distance {
				level.despawn_agent(id);
				arrived += 1;
			} else if !level.move_agent(id, position) {
				warn!(agent = id.0, "agent left the level");
			}
		}

		if scenario.stats_interval > 0 && (tick + 1) % scenario.stats_interval == 0 {
			log_stats(&level, tick + 1, arrived);
		}
		if level.agents().is_empty() {
			info!(tick = tick + 1, "every agent arrived");
			break;
		}
		if scenario.tick_sleep_ms > 0 {
			std::thread::sleep(Duration::from_millis(scenario.tick_sleep_ms));
		}
	}

	log_stats(&level, scenario.ticks, arrived);
	println!(
		"{} of {} agents reached the goal, {} still walking",
		arrived,
		spawned,
		level.agents().len()
	);

	Ok(())
}

/// Row-major blocked flags. The corner cells stay open so the default goal
/// and at least one spawn cell exist.
fn obstacle_layout(scenario: &Scenario, rng: &mut StdRng) -> Vec<bool> {
	let floor = &scenario.floor;
	let last = floor.columns * floor.rows - 1;
	(0..floor.columns * floor.rows)
		.map(|index| index != 0 && index != last && rng.random_bool(floor.blocked_ratio))
		.collect()
}

/// Spawn agents at random open cells; returns how many landed.
fn spawn_crowd(level: &mut Level, scenario: &Scenario, blocked: &[bool], rng: &mut StdRng) -> usize {
	let floor = &scenario.floor;
	let open: Vec<usize> = (0..blocked.len()).filter(|&i| !blocked[i]).collect();
	if open.is_empty() {
		return 0;
	}

	let half = floor.cell_size * 0.5 - scenario.agents.radius;
	let mut spawned = 0;
	for _ in 0..scenario.agents.count {
		let cell = open[rng.random_range(0..open.len())];
		let center = cell_center(cell % floor.columns, cell / floor.columns, floor.cell_size, Vec3::ZERO);
		let jitter = if half > 0.0 {
			Vec3::new(rng.random_range(-half..half), 0.0, rng.random_range(-half..half))
		} else {
			Vec3::ZERO
		};
		if level.spawn_agent(center + jitter, scenario.agents.radius).is_some() {
			spawned += 1;
		}
	}
	spawned
}

/// Farthest waypoint visible from `position`, or the nearest one when
/// nothing is in sight.
fn steering_target(nav_mesh: &NavMesh, position: Vec3, waypoints: &[Vec3]) -> Option<Vec3> {
	waypoints
		.iter()
		.rev()
		.find(|&&waypoint| nav_mesh.has_line_of_sight(position, waypoint))
		.or_else(|| {
			waypoints
				.iter()
				.min_by(|a, b| a.distance_squared(position).total_cmp(&b.distance_squared(position)))
		})
		.copied()
}

fn move_towards(position: Vec3, target: Vec3, step: f32) -> Vec3 {
	let offset = target - position;
	let distance = offset.length();
	if distance <= step {
		target
	} else {
		position + offset / distance * step
	}
}

fn log_stats(level: &Level, tick: u32, arrived: usize) {
	let stats = level.stats();
	info!(
		tick,
		agents = stats.agents,
		with_path = stats.agents_with_path,
		arrived,
		requests = stats.pathfinding.total_requests,
		active = stats.pathfinding.active_requests,
		leaves = stats.pathfinding.populated_leaves,
		solves = stats.pathfinding.total_solves,
		latest_ms = stats.pathfinding.latest_solve_ms,
		average_ms = stats.pathfinding.average_solve_ms,
		"stats"
	);
}
