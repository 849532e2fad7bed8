//! Grid navigation and enemy AI for hecs worlds
//!
//! This crate provides:
//! - Uniform occupancy grids with A* and flow field pathfinding
//! - Bresenham line of sight and field-of-view perception
//! - A resumable behaviour tree engine with patrol/chase leaves
//! - AI and navigation systems over a `hecs` world, driven by a fixed-step
//!   [`Simulation`](core::Simulation)

pub mod ai;
pub mod core;
pub mod ecs;
pub mod error;

// Re-exports for convenience
pub use glam;
pub use hecs;

/// Prelude module for common imports
pub mod prelude {
    pub use crate::ai::{
        AiComponent, AiMode, AiSystem, BtNode, BtStatus, FlowField, Grid, GridPath, NavAgent,
        NavAgentSystem, PathSource, Vision, find_path,
    };
    pub use crate::core::{
        AgentConfig, AiConfig, EventQueue, NavEvent, NavStats, PathSourceKind, Simulation,
        SimulationConfig,
    };
    pub use crate::ecs::{Entity, Name, Transform, World};
    pub use crate::error::{NavError, Result};
    pub use glam::{IVec2, Quat, Vec2, Vec3};
}
