//! Headless arena demo: hunters chase a wandering target around walls
//!
//! Pass a `.toml` or `.ron` engine configuration as the first argument to
//! override the defaults. Set `RUST_LOG=debug` to see every path search.

use arena_core::foundation::logging;
use arena_core::foundation::math::utils;
use arena_core::physics::TeamId;
use arena_core::prelude::*;
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::error::Error;

// Arena layout
const ARENA_HALF_SIZE: f32 = 20.0;
const WALL_THICKNESS: f32 = 1.0;

// Simulation
const TICKS: u32 = 1800;            // 30 seconds at 60 Hz
const DELTA_TIME: f32 = 1.0 / 60.0;
const STATUS_INTERVAL: f32 = 5.0;   // Seconds between status lines
const SEED: u64 = 7;

// Actors
const HUNTER_TEAM: TeamId = 1;
const HUNTER_RADIUS: f32 = 0.4;
const HUNTER_SPEED: f32 = 3.0;
const TARGET_RADIUS: f32 = 0.5;
const TARGET_SPEED: f32 = 4.0;
const TARGET_TURN_CHANCE: f64 = 0.02;   // Per tick
const RESPAWN_ATTEMPTS: usize = 64;
const RESPAWN_CLEARANCE: f32 = 6.0;     // Minimum distance from any hunter
const RESPAWN_GRACE: f32 = 1.5;         // Seconds before a respawned target can be caught

struct Agent {
    id: ObjectId,
    hunter: Hunter,
    probe: SweptShape,
    position: Vec2,
}

struct Target {
    id: ObjectId,
    probe: SweptShape,
    position: Vec2,
    heading: Vec2,
    grace: Cooldown,
    vulnerable: bool,
}

/// Owns the collision world and every actor in it
pub struct ArenaDemo {
    world: CollisionWorld,
    hunters: Vec<Agent>,
    target: Target,
    rng: StdRng,
    catches: u32,
    blocked_moves: u32,
}

impl ArenaDemo {
    fn new(config: &EngineConfig) -> Result<Self, Box<dyn Error>> {
        log::info!(
            "Cell size {}, search step {}, node budget {}",
            config.grid.cell_size,
            config.navigation.step_size,
            config.navigation.max_expanded_nodes
        );

        let mut world = CollisionWorld::from_config(&config.grid)?;
        build_walls(&mut world)?;

        let search = PathSearch::from_config(&config.navigation)?;
        let body = CollisionShape::circle(HUNTER_RADIUS)?;
        let mut hunters = Vec::new();
        for corner in hunter_spawns() {
            let id = world.spawn(
                ObjectDesc::new(body.clone())
                    .at(corner)
                    .layers(CollisionLayers::ENEMY)
                    .team(HUNTER_TEAM),
            )?;
            hunters.push(Agent {
                id,
                hunter: Hunter::new(body.clone(), search.clone(), config.hunt.clone()),
                probe: SweptShape::new(body.clone()),
                position: corner,
            });
        }

        let mut rng = StdRng::seed_from_u64(SEED);
        let target_body = CollisionShape::circle(TARGET_RADIUS)?;
        let target = Target {
            id: world.spawn(
                ObjectDesc::new(target_body.clone()).layers(target_layers(true)),
            )?,
            probe: SweptShape::new(target_body),
            position: Vec2::zeros(),
            heading: random_heading(&mut rng),
            grace: Cooldown::new(RESPAWN_GRACE),
            vulnerable: true,
        };

        log::info!("Arena ready: {} objects, {} hunters", world.len(), hunters.len());
        Ok(Self {
            world,
            hunters,
            target,
            rng,
            catches: 0,
            blocked_moves: 0,
        })
    }

    fn run(&mut self) -> Result<(), Box<dyn Error>> {
        let stopwatch = Stopwatch::start_new();
        let mut status = Cooldown::started(STATUS_INTERVAL);

        for tick in 0..TICKS {
            self.step_target()?;
            self.step_hunters()?;
            self.resolve_catches()?;

            status.tick(DELTA_TIME);
            if status.is_ready() {
                status.reset();
                log::info!(
                    "Tick {}: target at ({:.1}, {:.1}), {} catches so far",
                    tick + 1,
                    self.target.position.x,
                    self.target.position.y,
                    self.catches
                );
            }
        }

        let searches: u64 = self.hunters.iter().map(|agent| agent.hunter.searches()).sum();
        log::info!(
            "Simulated {} ticks in {:.1} ms: {} catches, {} path searches, {} blocked moves",
            TICKS,
            stopwatch.elapsed_millis(),
            self.catches,
            searches,
            self.blocked_moves
        );
        Ok(())
    }

    /// Wanders in a straight line, turning at random and off walls
    fn step_target(&mut self) -> Result<(), WorldError> {
        self.target.grace.tick(DELTA_TIME);
        if !self.target.vulnerable && self.target.grace.is_ready() {
            self.world.set_layers(self.target.id, target_layers(true))?;
            self.target.vulnerable = true;
        }

        if self.rng.gen_bool(TARGET_TURN_CHANCE) {
            self.target.heading = random_heading(&mut self.rng);
        }

        let from = self.target.position;
        let to = from + self.target.heading * TARGET_SPEED * DELTA_TIME;
        if is_clear(&self.world, &mut self.target.probe, from, to) {
            self.world.set_transform(self.target.id, to, 0.0)?;
            self.target.position = to;
        } else {
            self.target.heading = random_heading(&mut self.rng);
        }
        Ok(())
    }

    fn step_hunters(&mut self) -> Result<(), WorldError> {
        let target = self.target.position;
        for agent in &mut self.hunters {
            let steering = agent.hunter.update(&self.world, agent.position, target, DELTA_TIME);
            let Some(direction) = steering.move_direction else {
                continue;
            };

            let to = agent.position + direction * HUNTER_SPEED * DELTA_TIME;
            if is_clear(&self.world, &mut agent.probe, agent.position, to) {
                let rotation = steering
                    .face_direction
                    .and_then(utils::angle_of)
                    .unwrap_or_default();
                self.world.set_transform(agent.id, to, rotation)?;
                agent.position = to;
            } else {
                // Path went stale under us; search again once allowed
                self.blocked_moves += 1;
                agent.hunter.clear_path();
            }
        }
        Ok(())
    }

    fn resolve_catches(&mut self) -> Result<(), Box<dyn Error>> {
        let filter = QueryFilter::attackable_enemies_of(HUNTER_TEAM);
        let mut caught = None;
        for agent in &self.hunters {
            if let Some((_, contact)) = self.world.contacts(agent.id, &filter)?.first() {
                caught = Some((agent.id, contact.overlap));
                break;
            }
        }

        let Some((hunter_id, overlap)) = caught else {
            return Ok(());
        };
        self.catches += 1;
        log::info!(
            "Hunter {:?} caught the target at ({:.1}, {:.1}), overlap {:.2}",
            hunter_id,
            self.target.position.x,
            self.target.position.y,
            overlap
        );
        self.respawn_target()
    }

    /// Moves the target to a random free spot away from every hunter
    fn respawn_target(&mut self) -> Result<(), Box<dyn Error>> {
        let inner = ARENA_HALF_SIZE - TARGET_RADIUS;
        for _ in 0..RESPAWN_ATTEMPTS {
            let candidate = Vec2::new(
                self.rng.gen_range(-inner..inner),
                self.rng.gen_range(-inner..inner),
            );
            if !is_clear(&self.world, &mut self.target.probe, candidate, candidate) {
                continue;
            }
            let surroundings = Shape::circle(candidate, RESPAWN_CLEARANCE)?;
            let nearby = self
                .world
                .shape_query(&surroundings, &QueryFilter::on_layers(CollisionLayers::ENEMY));
            if nearby.is_empty() {
                self.world.set_transform(self.target.id, candidate, 0.0)?;
                self.target.position = candidate;
                self.target.heading = random_heading(&mut self.rng);
                // Hunters cannot catch it again until the grace period runs out
                self.world.set_layers(self.target.id, target_layers(false))?;
                self.target.grace.reset();
                self.target.vulnerable = false;
                return Ok(());
            }
        }
        log::warn!("No free respawn point after {RESPAWN_ATTEMPTS} attempts; target stays put");
        Ok(())
    }
}

/// Boundary walls plus a few pieces of interior cover
fn build_walls(world: &mut CollisionWorld) -> Result<(), Box<dyn Error>> {
    let span = 2.0 * ARENA_HALF_SIZE + 2.0 * WALL_THICKNESS;
    let edge = ARENA_HALF_SIZE + 0.5 * WALL_THICKNESS;
    let boundary = [
        (Vec2::new(0.0, edge), span, WALL_THICKNESS),
        (Vec2::new(0.0, -edge), span, WALL_THICKNESS),
        (Vec2::new(edge, 0.0), WALL_THICKNESS, span),
        (Vec2::new(-edge, 0.0), WALL_THICKNESS, span),
    ];
    for (center, width, height) in boundary {
        world.spawn(
            ObjectDesc::new(CollisionShape::rectangle(width, height)?)
                .at(center)
                .layers(CollisionLayers::WALL),
        )?;
    }

    world.spawn(
        ObjectDesc::new(CollisionShape::rectangle(12.0, 1.0)?)
            .at(Vec2::new(0.0, 5.0))
            .layers(CollisionLayers::WALL),
    )?;
    world.spawn(
        ObjectDesc::new(CollisionShape::rectangle(8.0, 1.0)?)
            .at(Vec2::new(-8.0, -6.0))
            .rotated(0.6)
            .layers(CollisionLayers::WALL),
    )?;
    let wedge = CollisionShape::polygon(vec![
        Vec2::new(-2.0, -1.5),
        Vec2::new(2.0, -1.5),
        Vec2::new(0.0, 2.0),
    ])?;
    world.spawn(
        ObjectDesc::new(wedge)
            .at(Vec2::new(8.0, -6.0))
            .layers(CollisionLayers::WALL),
    )?;
    Ok(())
}

fn hunter_spawns() -> [Vec2; 4] {
    let corner = ARENA_HALF_SIZE - 5.0;
    [
        Vec2::new(-corner, -corner),
        Vec2::new(corner, -corner),
        Vec2::new(corner, corner),
        Vec2::new(-corner, corner),
    ]
}

fn target_layers(vulnerable: bool) -> CollisionLayers {
    if vulnerable {
        CollisionLayers::PLAYER | CollisionLayers::ATTACKABLE
    } else {
        CollisionLayers::PLAYER
    }
}

fn random_heading(rng: &mut StdRng) -> Vec2 {
    utils::direction_from_angle(rng.gen_range(0.0..std::f32::consts::TAU))
}

/// True when `probe` can move from `from` to `to` without touching an obstacle
fn is_clear(world: &CollisionWorld, probe: &mut SweptShape, from: Vec2, to: Vec2) -> bool {
    probe.sweep_between(from, to, 0.0);
    !world.restriction_query(&*probe)
}

fn main() -> Result<(), Box<dyn Error>> {
    logging::init_with_default("info");

    log::info!("Starting arena demo");

    let config = match std::env::args().nth(1) {
        Some(path) => EngineConfig::load_from_file(&path)?,
        None => EngineConfig::default(),
    };

    let mut demo = ArenaDemo::new(&config)?;
    let result = demo.run();

    match result {
        Ok(()) => {
            log::info!("Arena demo completed successfully");
            Ok(())
        }
        Err(e) => {
            log::error!("Arena demo failed: {:?}", e);
            Err(e)
        }
    }
}
