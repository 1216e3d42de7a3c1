//! Component definitions for the ECS simulation.
//!
//! Components are pure data structs attached to dog entities.
//! They have no behavior - that lives in systems.

mod dog;
mod loot;

pub use dog::*;
pub use loot::*;
