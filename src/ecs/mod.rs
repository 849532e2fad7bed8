//! Entity Component System module
//!
//! Built on top of the hecs ECS library

mod components;
mod world;

pub use components::{Name, Transform};
pub use hecs::Entity;
pub use world::World;
