//! Movement and repathing for [`NavAgent`]s
//!
//! Each tick the system keeps followed targets fresh (throttled by the
//! repath cooldown), turns the dirty flag into a single path request, and
//! walks the agent along its waypoints.

use glam::{IVec2, Vec3};
use hecs::Entity;

use super::components::NavAgent;
use super::flow_field::FlowField;
use super::grid::Grid;
use super::pathfinding::{GridPath, find_path_world};
use crate::core::{EventQueue, NavEvent, NavStats};
use crate::ecs::{Transform, World};

/// Something that can plan a route between two world positions
pub trait PathSource {
    /// Plan from `start` to `goal`; `ok = false` when there is no route
    fn find_path(&self, start: Vec3, goal: Vec3) -> GridPath;
}

/// Make the final waypoint the exact goal instead of its cell centre
fn end_at_goal(mut path: GridPath, goal: Vec3) -> GridPath {
    if path.ok {
        if let Some(last) = path.waypoints.last_mut() {
            *last = goal;
        }
    }
    path
}

/// Per-request A* search
#[derive(Debug, Clone, Copy)]
pub struct AStarSource<'a> {
    pub grid: &'a Grid,
    /// Height of emitted waypoints
    pub y_level: f32,
}

impl<'a> AStarSource<'a> {
    #[must_use]
    pub fn new(grid: &'a Grid, y_level: f32) -> Self {
        Self { grid, y_level }
    }
}

impl PathSource for AStarSource<'_> {
    fn find_path(&self, start: Vec3, goal: Vec3) -> GridPath {
        end_at_goal(find_path_world(self.grid, start, goal, self.y_level), goal)
    }
}

/// Descends a precomputed [`FlowField`].
///
/// Only goals inside the field's goal cell can be served; anything else fails.
#[derive(Debug, Clone, Copy)]
pub struct FlowFieldSource<'a> {
    pub grid: &'a Grid,
    pub field: &'a FlowField,
    /// Height of emitted waypoints
    pub y_level: f32,
}

impl<'a> FlowFieldSource<'a> {
    #[must_use]
    pub fn new(grid: &'a Grid, field: &'a FlowField, y_level: f32) -> Self {
        Self {
            grid,
            field,
            y_level,
        }
    }
}

impl PathSource for FlowFieldSource<'_> {
    fn find_path(&self, start: Vec3, goal: Vec3) -> GridPath {
        let goal_cell: IVec2 = self.grid.world_to_cell(goal);
        if self.field.goal() != Some(goal_cell) {
            return GridPath::failed();
        }
        let Some(cells) = self.field.trace(self.grid, self.grid.world_to_cell(start)) else {
            return GridPath::failed();
        };
        let waypoints = cells
            .iter()
            .map(|&cell| self.grid.cell_to_world(cell, self.y_level))
            .collect();
        end_at_goal(
            GridPath {
                ok: true,
                cells,
                waypoints,
            },
            goal,
        )
    }
}

/// Drives every active [`NavAgent`] that has a [`Transform`]
#[derive(Debug, Default)]
pub struct NavAgentSystem;

impl NavAgentSystem {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Advance all agents by `dt` seconds
    pub fn update(
        &mut self,
        world: &mut World,
        dt: f32,
        source: &dyn PathSource,
        events: &mut EventQueue,
        stats: &mut NavStats,
    ) {
        for entity in world.entities_with::<NavAgent>() {
            self.update_agent(world, entity, dt, source, events, stats);
        }
    }

    fn update_agent(
        &mut self,
        world: &mut World,
        entity: Entity,
        dt: f32,
        source: &dyn PathSource,
        events: &mut EventQueue,
        stats: &mut NavStats,
    ) {
        let follow = match world.get::<NavAgent>(entity) {
            Ok(agent) if agent.active => agent.follow,
            _ => return,
        };
        let follow_pos = follow.and_then(|e| world.position_of(e));

        let Ok((transform, agent)) = world
            .inner
            .query_one_mut::<(&mut Transform, &mut NavAgent)>(entity)
        else {
            return;
        };

        if follow.is_some() && follow_pos.is_none() {
            log::debug!("{entity:?} lost its follow target");
            agent.follow = None;
        }

        if let Some(desired) = follow_pos {
            agent.repath_timer -= dt;
            let drift_sq = desired.distance_squared(agent.target);
            if agent.repath_timer <= 0.0
                && drift_sq > agent.retarget_distance * agent.retarget_distance
            {
                agent.target = desired;
                agent.dirty = true;
                agent.repath_timer = agent.repath_cooldown;
            }
        }

        if agent.dirty {
            let goal = follow_pos.unwrap_or(agent.target);
            agent.target = goal;
            let path = source.find_path(transform.position, goal);
            stats.record_request(path.ok);
            if path.ok {
                log::debug!(
                    "{entity:?} planned {} waypoints to {goal}",
                    path.waypoints.len()
                );
                events.push(NavEvent::PathFound {
                    entity,
                    waypoints: path.waypoints.len(),
                });
            } else {
                log::debug!("{entity:?} has no path to {goal}");
                events.push(NavEvent::PathFailed { entity, goal });
            }
            agent.path = path.waypoints;
            agent.waypoint = 0;
            agent.dirty = false;
        }

        let Some(waypoint) = agent.current_waypoint() else {
            agent.velocity = Vec3::ZERO;
            return;
        };

        let to = waypoint - transform.position;
        let distance = to.length();
        if distance <= agent.arrive_radius {
            agent.velocity = Vec3::ZERO;
            let reached = agent.waypoint;
            agent.waypoint += 1;
            stats.record_waypoint();
            if agent.waypoint >= agent.path.len() {
                agent.clear_path();
                events.push(NavEvent::DestinationReached { entity });
            } else {
                events.push(NavEvent::WaypointReached {
                    entity,
                    index: reached,
                });
            }
            return;
        }

        let direction = to / distance;
        agent.velocity = direction * agent.speed;
        // Never step past the waypoint
        let step = (agent.speed * dt).min(distance);
        transform.translate(direction * step);
        transform.face_xz(direction);
        log::trace!("{entity:?} -> {}", transform.position);
    }
}
