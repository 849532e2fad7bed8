//! Simulation driver, configuration, events and statistics

mod config;
mod events;
mod simulation;
mod stats;

pub use config::{AgentConfig, AiConfig, PathSourceKind, SimulationConfig};
pub use events::{EventQueue, NavEvent};
pub use simulation::Simulation;
pub use stats::NavStats;
