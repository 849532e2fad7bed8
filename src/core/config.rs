//! Simulation configuration
//!
//! Everything is `#[serde(default)]`, so a config file only needs the values
//! it changes:
//!
//! ```ignore
//! let config = SimulationConfig::from_ron_str("(fixed_dt: 0.05, ai: (detect_radius: 6.0))")?;
//! ```

use serde::{Deserialize, Serialize};

use crate::ai::AiMode;
use crate::error::{NavError, Result};

/// Which planner backs agent path requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PathSourceKind {
    /// A* search per request
    #[default]
    AStar,
    /// Descend a precomputed flow field; only serves the field's goal
    FlowField,
}

/// Defaults for newly created [`NavAgent`](crate::ai::NavAgent)s
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Units per second
    pub speed: f32,
    /// Waypoint arrival distance
    pub arrive_radius: f32,
    /// Minimum seconds between follow-driven replans
    pub repath_cooldown: f32,
    /// Followed target drift that triggers a replan
    pub retarget_distance: f32,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            speed: 2.5,
            arrive_radius: 0.15,
            repath_cooldown: 0.25,
            retarget_distance: 0.5,
        }
    }
}

impl AgentConfig {
    /// Set movement speed
    #[must_use]
    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }

    /// Set waypoint arrival distance
    #[must_use]
    pub fn with_arrive_radius(mut self, radius: f32) -> Self {
        self.arrive_radius = radius;
        self
    }

    /// Set the follow replan throttle
    #[must_use]
    pub fn with_repath_cooldown(mut self, seconds: f32) -> Self {
        self.repath_cooldown = seconds;
        self
    }
}

/// Defaults for enemies set up through [`AiSystem::init_enemy`](crate::ai::AiSystem::init_enemy)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    /// Player is noticed inside this distance
    pub detect_radius: f32,
    /// Chase is dropped beyond this distance
    pub lose_radius: f32,
    /// Seconds to wait at each patrol point
    pub idle_wait: f32,
    /// Name the player entity is looked up by
    pub player_name: String,
    /// Initial mode
    pub mode: AiMode,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            detect_radius: 8.0,
            lose_radius: 12.0,
            idle_wait: 1.0,
            player_name: String::from("Player"),
            mode: AiMode::Auto,
        }
    }
}

impl AiConfig {
    /// Set detection and lose radii
    #[must_use]
    pub fn with_radii(mut self, detect: f32, lose: f32) -> Self {
        self.detect_radius = detect;
        self.lose_radius = lose;
        self
    }

    /// Set patrol wait
    #[must_use]
    pub fn with_idle_wait(mut self, seconds: f32) -> Self {
        self.idle_wait = seconds;
        self
    }

    /// Set the player lookup name
    #[must_use]
    pub fn with_player_name(mut self, name: impl Into<String>) -> Self {
        self.player_name = name.into();
        self
    }

    /// Set the initial mode
    #[must_use]
    pub fn with_mode(mut self, mode: AiMode) -> Self {
        self.mode = mode;
        self
    }
}

/// Top-level configuration for a [`Simulation`](super::Simulation)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Seconds per simulation step
    pub fixed_dt: f32,
    /// World-space height of emitted waypoints
    pub y_level: f32,
    /// Planner used for path requests
    pub path_source: PathSourceKind,
    /// Agent defaults
    pub agent: AgentConfig,
    /// Enemy AI defaults
    pub ai: AiConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            fixed_dt: 1.0 / 60.0,
            y_level: 0.0,
            path_source: PathSourceKind::AStar,
            agent: AgentConfig::default(),
            ai: AiConfig::default(),
        }
    }
}

impl SimulationConfig {
    /// Parse from RON text
    pub fn from_ron_str(text: &str) -> Result<Self> {
        Ok(ron::from_str(text)?)
    }

    /// Parse from JSON text
    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Set the step length
    #[must_use]
    pub fn with_fixed_dt(mut self, dt: f32) -> Self {
        self.fixed_dt = dt;
        self
    }

    /// Set waypoint height
    #[must_use]
    pub fn with_y_level(mut self, y: f32) -> Self {
        self.y_level = y;
        self
    }

    /// Pick the planner
    #[must_use]
    pub fn with_path_source(mut self, kind: PathSourceKind) -> Self {
        self.path_source = kind;
        self
    }

    /// Replace agent defaults
    #[must_use]
    pub fn with_agent(mut self, agent: AgentConfig) -> Self {
        self.agent = agent;
        self
    }

    /// Replace AI defaults
    #[must_use]
    pub fn with_ai(mut self, ai: AiConfig) -> Self {
        self.ai = ai;
        self
    }

    /// Reject values the systems cannot run with
    pub fn validate(&self) -> Result<()> {
        positive("fixed_dt", self.fixed_dt)?;
        non_negative("agent.speed", self.agent.speed)?;
        positive("agent.arrive_radius", self.agent.arrive_radius)?;
        non_negative("agent.repath_cooldown", self.agent.repath_cooldown)?;
        non_negative("agent.retarget_distance", self.agent.retarget_distance)?;
        non_negative("ai.detect_radius", self.ai.detect_radius)?;
        non_negative("ai.lose_radius", self.ai.lose_radius)?;
        non_negative("ai.idle_wait", self.ai.idle_wait)?;

        if self.ai.lose_radius < self.ai.detect_radius {
            log::warn!(
                "lose radius {} is smaller than detect radius {}; chases will drop immediately",
                self.ai.lose_radius,
                self.ai.detect_radius
            );
        }
        Ok(())
    }
}

fn positive(field: &'static str, value: f32) -> Result<()> {
    // NaN fails both comparisons
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(NavError::InvalidConfig {
            field,
            reason: format!("must be positive, got {value}"),
        })
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<()> {
    if value >= 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(NavError::InvalidConfig {
            field,
            reason: format!("must be zero or positive, got {value}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SimulationConfig::default();
        assert!((config.fixed_dt - 1.0 / 60.0).abs() < 1e-6);
        assert_eq!(config.path_source, PathSourceKind::AStar);
        assert!((config.agent.speed - 2.5).abs() < 1e-6);
        assert!((config.agent.arrive_radius - 0.15).abs() < 1e-6);
        assert!((config.ai.detect_radius - 8.0).abs() < 1e-6);
        assert!((config.ai.lose_radius - 12.0).abs() < 1e-6);
        assert_eq!(config.ai.player_name, "Player");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_ron() {
        let config = SimulationConfig::from_ron_str(
            "(fixed_dt: 0.05, path_source: FlowField, ai: (detect_radius: 6.0, mode: Patrol))",
        )
        .unwrap();
        assert!((config.fixed_dt - 0.05).abs() < 1e-6);
        assert_eq!(config.path_source, PathSourceKind::FlowField);
        assert!((config.ai.detect_radius - 6.0).abs() < 1e-6);
        assert_eq!(config.ai.mode, AiMode::Patrol);
        // Untouched values keep their defaults
        assert!((config.ai.lose_radius - 12.0).abs() < 1e-6);
        assert!((config.agent.speed - 2.5).abs() < 1e-6);
    }

    #[test]
    fn test_json() {
        let config =
            SimulationConfig::from_json_str(r#"{"agent": {"speed": 4.0}, "y_level": 1.5}"#)
                .unwrap();
        assert!((config.agent.speed - 4.0).abs() < 1e-6);
        assert!((config.y_level - 1.5).abs() < 1e-6);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            SimulationConfig::from_ron_str("(fixed_dt: )"),
            Err(NavError::Ron(_))
        ));
        assert!(matches!(
            SimulationConfig::from_json_str("{"),
            Err(NavError::Json(_))
        ));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let bad_dt = SimulationConfig::default().with_fixed_dt(0.0);
        assert!(matches!(
            bad_dt.validate(),
            Err(NavError::InvalidConfig { field: "fixed_dt", .. })
        ));

        let bad_speed =
            SimulationConfig::default().with_agent(AgentConfig::default().with_speed(-1.0));
        assert!(matches!(
            bad_speed.validate(),
            Err(NavError::InvalidConfig { field: "agent.speed", .. })
        ));

        let bad_arrive = SimulationConfig::default()
            .with_agent(AgentConfig::default().with_arrive_radius(0.0));
        assert!(bad_arrive.validate().is_err());

        let bad_radius =
            SimulationConfig::default().with_ai(AiConfig::default().with_radii(-1.0, 12.0));
        assert!(bad_radius.validate().is_err());

        let nan = SimulationConfig::default().with_fixed_dt(f32::NAN);
        assert!(nan.validate().is_err());
    }

    #[test]
    fn test_lose_below_detect_is_only_a_warning() {
        let config =
            SimulationConfig::default().with_ai(AiConfig::default().with_radii(10.0, 5.0));
        assert!(config.validate().is_ok());
    }
}
