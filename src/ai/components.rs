//! Per-agent AI and navigation components
//!
//! Every field is public: tooling edits these in place (mode pickers, patrol
//! point lists, target pickers) and leaves side-effects to the systems.

use glam::Vec3;
use hecs::Entity;
use serde::{Deserialize, Serialize};

use super::behavior_tree::BoxedNode;
use crate::core::{AgentConfig, AiConfig};

/// High-level behaviour selected for an agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AiMode {
    /// Behaviour tree decides between chasing and patrolling
    #[default]
    Auto,
    /// Stand still, no navigation
    Idle,
    /// Walk the patrol loop
    Patrol,
    /// Chase the player
    Seek,
}

/// AI state of one agent
#[derive(Debug)]
pub struct AiComponent {
    /// Requested mode; written by gameplay or tooling
    pub mode: AiMode,
    /// Mode whose side-effects were last applied, `None` before the first tick
    pub last_mode: Option<AiMode>,
    /// Behaviour tree for the current mode, rebuilt on every mode change
    pub tree: Option<BoxedNode>,
    /// Patrol loop in world space
    pub patrol_points: Vec<Vec3>,
    /// Patrol point currently being walked to
    pub patrol_index: usize,
    /// Distance at which the player is noticed
    pub detect_radius: f32,
    /// Distance at which an ongoing chase is abandoned
    pub lose_radius: f32,
    /// Seconds to wait at each patrol point
    pub idle_wait: f32,
    /// Remaining wait at the current patrol point
    pub idle_timer: f32,
    /// Cached player reference, resolved lazily from `player_name`
    pub player: Option<Entity>,
    /// Name used to resolve `player`
    pub player_name: String,
}

impl AiComponent {
    /// Build from configuration with the given patrol loop
    #[must_use]
    pub fn from_config(config: &AiConfig, patrol_points: Vec<Vec3>) -> Self {
        Self {
            mode: config.mode,
            last_mode: None,
            tree: None,
            patrol_points,
            patrol_index: 0,
            detect_radius: config.detect_radius,
            lose_radius: config.lose_radius,
            idle_wait: config.idle_wait,
            idle_timer: 0.0,
            player: None,
            player_name: config.player_name.clone(),
        }
    }

    /// Request a new mode; side-effects are applied on the next AI tick
    pub fn set_mode(&mut self, mode: AiMode) {
        self.mode = mode;
    }

    /// Patrol point currently targeted
    #[must_use]
    pub fn current_patrol_point(&self) -> Option<Vec3> {
        self.patrol_points.get(self.patrol_index).copied()
    }
}

impl Default for AiComponent {
    fn default() -> Self {
        Self::from_config(&AiConfig::default(), Vec::new())
    }
}

/// Movement state of one agent
#[derive(Debug, Clone, PartialEq)]
pub struct NavAgent {
    /// Agent moves only while active
    pub active: bool,
    /// Destination in world space
    pub target: Vec3,
    /// Entity whose position overrides `target`; never owned
    pub follow: Option<Entity>,
    /// Waypoints of the current plan
    pub path: Vec<Vec3>,
    /// Index of the waypoint being walked to
    pub waypoint: usize,
    /// Units per second
    pub speed: f32,
    /// A waypoint counts as reached inside this distance
    pub arrive_radius: f32,
    /// A new path must be planned before moving
    pub dirty: bool,
    /// Minimum seconds between follow-driven replans
    pub repath_cooldown: f32,
    /// Seconds until the next follow-driven replan is allowed
    pub repath_timer: f32,
    /// Followed entity must drift this far from `target` to trigger a replan
    pub retarget_distance: f32,
    /// Velocity applied on the last tick
    pub velocity: Vec3,
}

impl NavAgent {
    /// Build from configuration
    #[must_use]
    pub fn from_config(config: &AgentConfig) -> Self {
        Self {
            active: true,
            target: Vec3::ZERO,
            follow: None,
            path: Vec::new(),
            waypoint: 0,
            speed: config.speed,
            arrive_radius: config.arrive_radius,
            dirty: false,
            repath_cooldown: config.repath_cooldown,
            repath_timer: 0.0,
            retarget_distance: config.retarget_distance,
            velocity: Vec3::ZERO,
        }
    }

    /// Go to a fixed point. Clears `follow` and marks dirty only if the goal changed.
    ///
    /// Returns whether anything changed.
    pub fn set_target(&mut self, goal: Vec3) -> bool {
        if self.target == goal {
            return false;
        }
        self.follow = None;
        self.target = goal;
        self.dirty = true;
        true
    }

    /// Follow an entity, replanning straight away. No-op if already following it.
    pub fn set_follow(&mut self, entity: Entity) -> bool {
        if self.follow == Some(entity) && self.active {
            return false;
        }
        self.follow = Some(entity);
        self.active = true;
        self.dirty = true;
        self.repath_timer = 0.0;
        true
    }

    /// Drop the current plan
    pub fn clear_path(&mut self) {
        self.path.clear();
        self.waypoint = 0;
    }

    /// Whether there are waypoints left to walk
    #[must_use]
    pub fn has_path(&self) -> bool {
        self.waypoint < self.path.len()
    }

    /// Waypoint currently being walked to
    #[must_use]
    pub fn current_waypoint(&self) -> Option<Vec3> {
        self.path.get(self.waypoint).copied()
    }
}

impl Default for NavAgent {
    fn default() -> Self {
        Self::from_config(&AgentConfig::default())
    }
}
