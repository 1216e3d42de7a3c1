//! Idle system - accumulates standing-still time

use std::time::Duration;

use hecs::World;

use crate::components::{IdleTime, Velocity};
use crate::ids::DogId;

/// Add `dt` to every stationary dog's idle clock.
///
/// Returns the dogs whose idle time has reached `retirement_time`, ordered by
/// id. Idle time is reset only by a player action, never here.
pub fn idle_system(world: &mut World, dt: Duration, retirement_time: Duration) -> Vec<DogId> {
    let mut idle = Vec::new();
    for (_, (id, vel, time)) in world.query_mut::<(&DogId, &Velocity, &mut IdleTime)>() {
        if vel.0.is_zero() {
            time.0 += dt;
        }
        if time.0 >= retirement_time {
            idle.push(*id);
        }
    }
    idle.sort();
    idle
}
