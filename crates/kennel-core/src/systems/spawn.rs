//! Loot spawn system - drops new loot onto a map's roads

use std::time::Duration;

use rand::Rng;

use crate::components::{Loot, LootType};
use crate::ids::IdAllocator;
use crate::map::Map;

/// Ask the map's generator how much loot to add and scatter it over random
/// road points. Returns the number of items spawned.
pub fn loot_spawn_system<R: Rng>(
    map: &mut Map,
    loot_types: &[LootType],
    looter_count: usize,
    dt: Duration,
    ids: &mut IdAllocator,
    rng: &mut R,
) -> usize {
    let loot_count = map.loot_count();
    let count = map.loot_generator_mut().generate(dt, loot_count, looter_count);
    if count == 0 || loot_types.is_empty() {
        return 0;
    }

    let mut spawned = 0;
    for _ in 0..count {
        let Some(position) = map.random_point_on_road(rng) else {
            break;
        };
        let kind = rng.gen_range(0..loot_types.len());
        map.add_loot(Loot {
            id: ids.loot(),
            kind,
            position,
            value: loot_types[kind].value,
        });
        spawned += 1;
    }
    log::debug!("spawned {spawned} loot on map {}", map.id());
    spawned
}
