//! Sight-based perception
//!
//! A [`Vision`] cone sees a target when it is in range, inside the field of
//! view on the X/Z plane, and the grid line between the two cells is clear.
//! Must run before the AI step: the chase leaves of agents that carry a
//! [`Vision`] read `has_los`, `last_seen_pos` and [`Vision::is_lost`].

use glam::{Vec2, Vec3};
use hecs::Entity;
use serde::{Deserialize, Serialize};

use super::grid::Grid;
use super::visibility::has_grid_los;
use crate::ecs::{Transform, World};

/// Whether `target` lies inside the cone of `fov_deg` degrees around `forward`,
/// measured on the X/Z plane.
///
/// A target on top of `pos`, or a `forward` with no X/Z extent, counts as visible.
#[must_use]
pub fn in_fov_xz(pos: Vec3, forward: Vec3, target: Vec3, fov_deg: f32) -> bool {
    let to = Vec2::new(target.x - pos.x, target.z - pos.z);
    let facing = Vec2::new(forward.x, forward.z);
    let (Some(to), Some(facing)) = (to.try_normalize(), facing.try_normalize()) else {
        return true;
    };
    to.dot(facing) >= (fov_deg * 0.5).to_radians().cos()
}

/// Perception state of one agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vision {
    /// Maximum sight distance
    pub radius: f32,
    /// Full cone angle in degrees
    pub fov_deg: f32,
    /// Seconds without sight before the target counts as lost
    pub lose_after: f32,
    /// Target visible on the last update
    pub has_los: bool,
    /// Seconds since the target was last seen
    pub last_seen_timer: f32,
    /// Where the target was last seen
    pub last_seen_pos: Vec3,
}

impl Default for Vision {
    fn default() -> Self {
        Self {
            radius: 12.0,
            fov_deg: 90.0,
            lose_after: 1.0,
            has_los: false,
            last_seen_timer: 0.0,
            last_seen_pos: Vec3::ZERO,
        }
    }
}

impl Vision {
    #[must_use]
    pub fn new(radius: f32, fov_deg: f32) -> Self {
        Self {
            radius,
            fov_deg,
            ..Default::default()
        }
    }

    /// Target has been out of sight for at least `lose_after` seconds
    #[must_use]
    pub fn is_lost(&self) -> bool {
        !self.has_los && self.last_seen_timer >= self.lose_after
    }

    /// Range, cone and grid line-of-sight test from `eye` looking along `forward`
    #[must_use]
    pub fn can_see(&self, grid: &Grid, eye: Vec3, forward: Vec3, target: Vec3) -> bool {
        eye.distance_squared(target) <= self.radius * self.radius
            && in_fov_xz(eye, forward, target, self.fov_deg)
            && has_grid_los(grid, eye, target)
    }
}

/// Updates every [`Vision`] against one target entity
#[derive(Debug, Default)]
pub struct VisionSystem;

impl VisionSystem {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Refresh sight of `target`; a missing or dead target is simply unseen
    pub fn update(&mut self, world: &mut World, grid: &Grid, target: Option<Entity>, dt: f32) {
        let target_pos = target.and_then(|e| world.position_of(e));

        for (entity, (transform, vision)) in world.query_mut::<(&Transform, &mut Vision)>() {
            if Some(entity) == target {
                continue;
            }
            let seen = target_pos.is_some_and(|pos| {
                vision.can_see(grid, transform.position, transform.forward(), pos)
            });

            if seen != vision.has_los {
                let verb = if seen { "spotted" } else { "lost sight of" };
                log::debug!("{entity:?} {verb} its target");
            }
            vision.has_los = seen;
            match target_pos {
                Some(pos) if seen => {
                    vision.last_seen_pos = pos;
                    vision.last_seen_timer = 0.0;
                }
                _ => vision.last_seen_timer += dt,
            }
        }
    }
}
