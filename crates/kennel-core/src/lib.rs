//! Kennel Core - multiplayer dog-walking simulation engine
//!
//! Dogs run along axis-aligned roads, pick up randomly spawned loot and
//! deliver it to offices for score. Idle dogs are retired to a leaderboard.
//!
//! # Architecture
//!
//! Each live map instance (a [`session::Session`]) keeps its dogs in its own
//! `hecs` world:
//! - **Entities**: dogs
//! - **Components**: position, velocity, facing, speed, bag, score, idle time
//! - **Systems**: loot spawn, movement, gathering, idle accumulation
//!
//! [`game::Game`] owns maps and sessions and runs the systems every tick.
//! [`app::Application`] adds players, tokens, the leaderboard and snapshot
//! persistence, and [`handle::WorldHandle`] shares it between threads.
//!
//! # Example
//!
//! ```rust,no_run
//! use kennel_core::prelude::*;
//! use std::time::Duration;
//!
//! let game = load_game("data/config.json").expect("config");
//! let app = Application::new(game, AppSettings::default(), Box::new(MemoryRecordStore::new()));
//! let world = WorldHandle::new(app);
//!
//! let joined = world.join("map1", "Rex").expect("join");
//! world.apply_move(joined.auth_token.as_str(), "R").expect("move");
//! world.tick(Duration::from_millis(50));
//! ```

pub mod app;
pub mod components;
pub mod config;
pub mod error;
pub mod game;
pub mod handle;
pub mod ids;
pub mod map;
pub mod persistence;
pub mod players;
pub mod records;
pub mod session;
pub mod systems;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::app::{AppSettings, Application};
    pub use crate::components::*;
    pub use crate::config::{load_game, parse_game};
    pub use crate::error::*;
    pub use crate::game::{Game, TickReport};
    pub use crate::handle::WorldHandle;
    pub use crate::ids::*;
    pub use crate::map::{Map, MapId};
    pub use crate::records::{MemoryRecordStore, RecordStore, RetiredPlayer};
}
