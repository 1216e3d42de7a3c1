//! Systems - per-tick logic that operates on a session's components

mod gather;
mod idle;
mod movement;
mod spawn;

pub use gather::*;
pub use idle::*;
pub use movement::*;
pub use spawn::*;
