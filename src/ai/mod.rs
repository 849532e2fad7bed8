//! AI and navigation module
//!
//! Grid pathfinding (A*, flow fields), grid visibility, a small behaviour
//! tree engine, and the systems that turn enemy behaviour into agent
//! movement.

mod actions;
mod ai_system;
mod behavior_tree;
mod components;
mod flow_field;
mod grid;
mod nav_agent;
mod pathfinding;
mod visibility;
mod vision;

pub use actions::{
    IdleAction, PatrolAction, SeePlayerCond, SeekPlayerAction, StillChasingCond,
    build_patrol_seek_tree, build_tree_for_mode, chase_branch, patrol_branch, resolve_player,
};
pub use ai_system::{AiSystem, apply_mode_side_effects};
pub use behavior_tree::{
    BoxedNode, BtNode, BtStatus, Cooldown, Selector, Sequence, cooldown, selector, sequence,
};
pub use components::{AiComponent, AiMode, NavAgent};
pub use flow_field::FlowField;
pub use grid::{BLOCKED_COST, Grid};
pub use nav_agent::{AStarSource, FlowFieldSource, NavAgentSystem, PathSource};
pub use pathfinding::{GridPath, find_path, find_path_world, octile_distance};
pub use visibility::{BresenhamLine, Neighbors, gather_neighbors, has_grid_los, line_of_sight_clear};
pub use vision::{Vision, VisionSystem, in_fov_xz};
