//! Movement system - moves dogs along the road network

use std::time::Duration;

use hecs::World;
use kennel_logic::collision::Gatherer;
use kennel_logic::geometry::{Road, Vec2, HALF_DOG_WIDTH};
use kennel_logic::movement::{resolve_move, MoveResult};

use crate::components::{Facing, Position, Velocity};
use crate::ids::DogId;

/// Advance every dog by `dt`, clamping to road edges.
///
/// Returns each dog's swept path for gather detection, ordered by dog id.
pub fn movement_system(world: &mut World, roads: &[Road], dt: Duration) -> Vec<Gatherer> {
    let mut gatherers = Vec::new();

    for (_, (id, pos, vel, facing)) in
        world.query_mut::<(&DogId, &mut Position, &mut Velocity, &Facing)>()
    {
        let start = pos.0;
        let result = resolve_move(roads, start, vel.0, facing.0, dt);
        if let MoveResult::Stranded { position } = result {
            log::warn!("dog {id} at ({}, {}) is off the road network", position.x, position.y);
        }

        pos.0 = result.position();
        if result.stops() {
            vel.0 = Vec2::ZERO;
        }
        gatherers.push(Gatherer {
            id: id.0,
            start,
            end: pos.0,
            radius: HALF_DOG_WIDTH,
        });
    }

    gatherers.sort_by_key(|g| g.id);
    gatherers
}
