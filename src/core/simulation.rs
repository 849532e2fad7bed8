//! Fixed-step simulation driver
//!
//! Owns the world, the grid and every system, and runs them in a fixed
//! order each step:
//!
//! 1. swap the event queue
//! 2. re-aim the flow field if it tracks an entity
//! 3. vision
//! 4. AI (mode side-effects, behaviour trees)
//! 5. navigation (path requests, movement)
//!
//! AI has to run before navigation: it writes the target/follow/dirty state
//! that navigation consumes in the same step.

use std::time::Instant;

use glam::{IVec2, Vec3};
use hecs::Entity;

use crate::ai::{
    AStarSource, AiComponent, AiMode, AiSystem, FlowField, FlowFieldSource, Grid, NavAgentSystem,
    VisionSystem,
};
use crate::core::config::{PathSourceKind, SimulationConfig};
use crate::core::events::EventQueue;
use crate::core::stats::NavStats;
use crate::ecs::{Name, Transform, World};
use crate::error::Result;

/// A grid world with enemies and a player, advanced in fixed steps
#[derive(Debug)]
pub struct Simulation {
    config: SimulationConfig,
    world: World,
    grid: Grid,
    /// Empty (no goal) until a flow goal is set
    flow_field: FlowField,
    /// Entity the flow field goal follows
    flow_target: Option<Entity>,
    ai: AiSystem,
    nav: NavAgentSystem,
    vision: VisionSystem,
    events: EventQueue,
    stats: NavStats,
    elapsed: f32,
}

impl Simulation {
    /// Create a simulation over `grid`. Fails if the configuration is invalid.
    pub fn new(config: SimulationConfig, grid: Grid) -> Result<Self> {
        config.validate()?;
        log::info!(
            "Simulation: {}x{} grid, dt {:.4}s, {:?} paths",
            grid.width,
            grid.height,
            config.fixed_dt,
            config.path_source
        );
        Ok(Self {
            ai: AiSystem::new(config.agent.clone()),
            config,
            world: World::new(),
            grid,
            flow_field: FlowField::new(),
            flow_target: None,
            nav: NavAgentSystem::new(),
            vision: VisionSystem::new(),
            events: EventQueue::new(),
            stats: NavStats::new(),
            elapsed: 0.0,
        })
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    #[must_use]
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    #[must_use]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// The flow field, once a goal has been set
    #[must_use]
    pub fn flow_field(&self) -> Option<&FlowField> {
        self.flow_field.goal().map(|_| &self.flow_field)
    }

    /// Events pushed during the previous step.
    ///
    /// Events from the step that just ran become readable on the next
    /// [`Simulation::step`], or straight away after [`Simulation::flush_events`].
    #[must_use]
    pub fn events(&self) -> &EventQueue {
        &self.events
    }

    #[must_use]
    pub fn stats(&self) -> &NavStats {
        &self.stats
    }

    /// Simulated seconds so far
    #[must_use]
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    // ========================================================================
    // Setup
    // ========================================================================

    /// Replace the grid. A flow field with a goal is recomputed against it.
    pub fn set_grid(&mut self, grid: Grid) {
        self.grid = grid;
        if let Some(goal) = self.flow_field.goal() {
            self.flow_field.compute(&self.grid, goal);
        }
    }

    /// Recompute the flow field toward the cell containing `position`
    pub fn set_flow_goal(&mut self, position: Vec3) {
        let goal = self.grid.world_to_cell(position);
        self.compute_flow(goal);
    }

    /// Keep the flow field goal on `entity`, recomputing whenever it changes cell
    pub fn set_flow_target(&mut self, entity: Option<Entity>) {
        self.flow_target = entity;
        self.refresh_flow_target();
    }

    /// Spawn the entity enemies look up as their player
    pub fn spawn_player(&mut self, position: Vec3) -> Entity {
        let name = Name::new(self.config.ai.player_name.clone());
        self.world.spawn((name, Transform::from_position(position)))
    }

    /// Spawn an enemy with AI and a nav agent built from the configured defaults
    pub fn spawn_enemy(&mut self, position: Vec3, patrol_points: Vec<Vec3>) -> Entity {
        let entity = self.world.spawn((Transform::from_position(position),));
        self.ai
            .init_enemy(&mut self.world, entity, patrol_points, &self.config.ai);
        entity
    }

    /// Request a mode change; applied on the next step
    pub fn set_mode(&mut self, entity: Entity, mode: AiMode) -> bool {
        match self.world.get_mut::<AiComponent>(entity) {
            Ok(mut ai) => {
                ai.set_mode(mode);
                true
            }
            Err(_) => false,
        }
    }

    // ========================================================================
    // Stepping
    // ========================================================================

    /// Advance one fixed step
    pub fn step(&mut self) {
        let started = Instant::now();
        let dt = self.config.fixed_dt;

        self.events.swap();
        self.refresh_flow_target();

        let player = self.world.find_by_name(&self.config.ai.player_name);
        self.vision.update(&mut self.world, &self.grid, player, dt);

        self.ai.update(&mut self.world, dt, &mut self.events);

        let y_level = self.config.y_level;
        match self.config.path_source {
            PathSourceKind::AStar => {
                let source = AStarSource::new(&self.grid, y_level);
                self.nav.update(
                    &mut self.world,
                    dt,
                    &source,
                    &mut self.events,
                    &mut self.stats,
                );
            }
            PathSourceKind::FlowField => {
                let source = FlowFieldSource::new(&self.grid, &self.flow_field, y_level);
                self.nav.update(
                    &mut self.world,
                    dt,
                    &source,
                    &mut self.events,
                    &mut self.stats,
                );
            }
        }

        self.elapsed += dt;
        self.stats.record_tick(started.elapsed());
    }

    /// Make events from the last step readable through [`Simulation::events`]
    /// without advancing the simulation. Call once after the final step.
    pub fn flush_events(&mut self) {
        self.events.swap();
    }

    /// Advance `ticks` fixed steps
    pub fn run(&mut self, ticks: u32) {
        for _ in 0..ticks {
            self.step();
        }
        log::debug!("{}", self.stats.format_stats());
    }

    fn refresh_flow_target(&mut self) {
        let Some(target) = self.flow_target else {
            return;
        };
        let Some(position) = self.world.position_of(target) else {
            return;
        };
        let cell = self.grid.world_to_cell(position);
        if self.flow_field.goal() != Some(cell) {
            self.compute_flow(cell);
        }
    }

    fn compute_flow(&mut self, goal: IVec2) {
        self.flow_field.compute(&self.grid, goal);
        log::debug!("Flow field aimed at {goal}");
    }
}
