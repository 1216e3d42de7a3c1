//! Gather system - loot pickup and office delivery
//!
//! Events come from swept-segment detection over the tick's dog paths and
//! are applied in time order. A loot position, once cleared, ignores any
//! later event within the same tick, so the same item is never picked up
//! twice.

use std::collections::HashSet;

use hecs::World;
use kennel_logic::collision::{find_gather_events, Gatherer, GatheringEvent, Item};
use kennel_logic::geometry::{HALF_OFFICE_WIDTH, LOOT_WIDTH};

use crate::components::{Bag, Score};
use crate::error::GatherError;
use crate::ids::{DogId, LootId};
use crate::map::Map;
use crate::session::Session;

/// What applying one gather event did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatherOutcome {
    PickedUp(LootId),
    /// The bag was full; the loot stays on the ground.
    BagFull(LootId),
    /// Another dog got to this position earlier in the tick.
    AlreadyTaken,
    /// Bag emptied at an office, adding `value` to the score.
    Delivered { dog: DogId, value: u64 },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GatherReport {
    pub picked_up: usize,
    pub delivered: usize,
    pub bag_full: usize,
    pub skipped: usize,
}

/// Detector items for a map: every loot item followed by every office.
pub fn gather_items(map: &Map) -> Vec<Item> {
    let loot = map.loot().iter().map(|l| Item {
        id: l.id.0,
        position: l.position,
        radius: LOOT_WIDTH,
        is_office: false,
    });
    let offices = map.offices().iter().enumerate().map(|(i, o)| Item {
        id: i as u64,
        position: o.position.to_vec2(),
        radius: HALF_OFFICE_WIDTH,
        is_office: true,
    });
    loot.chain(offices).collect()
}

/// Detect and apply every gather event for one session's tick.
pub fn gather_system(session: &mut Session, map: &mut Map, gatherers: &[Gatherer]) -> GatherReport {
    let items = gather_items(map);
    let events = find_gather_events(&items, gatherers);
    let mut cleared: HashSet<(u64, u64)> = HashSet::new();
    let mut report = GatherReport::default();

    for event in &events {
        match apply_event(session, map, &items, gatherers, event, &mut cleared) {
            Ok(GatherOutcome::PickedUp(_)) => report.picked_up += 1,
            Ok(GatherOutcome::Delivered { .. }) => report.delivered += 1,
            Ok(GatherOutcome::BagFull(_)) => report.bag_full += 1,
            Ok(GatherOutcome::AlreadyTaken) => {}
            Err(e) => {
                log::warn!("skipping gather event on map {}: {e}", map.id());
                report.skipped += 1;
            }
        }
    }
    report
}

fn apply_event(
    session: &mut Session,
    map: &mut Map,
    items: &[Item],
    gatherers: &[Gatherer],
    event: &GatheringEvent,
    cleared: &mut HashSet<(u64, u64)>,
) -> Result<GatherOutcome, GatherError> {
    let item = &items[event.item];
    let dog = DogId(gatherers[event.gatherer].id);
    let entity = session.entity(dog).ok_or(GatherError::MissingDog(dog))?;
    let world: &mut World = session.world_mut();

    if item.is_office {
        let (bag, score) = world
            .query_one_mut::<(&mut Bag, &mut Score)>(entity)
            .map_err(|_| GatherError::MissingDog(dog))?;
        let value = bag.drain_value();
        score.0 += value;
        return Ok(GatherOutcome::Delivered { dog, value });
    }

    let key = item.position.to_bits();
    if cleared.contains(&key) {
        return Ok(GatherOutcome::AlreadyTaken);
    }

    let loot_id = LootId(item.id);
    let bag = world
        .query_one_mut::<&mut Bag>(entity)
        .map_err(|_| GatherError::MissingDog(dog))?;
    if !bag.has_room(map.bag_capacity()) {
        return Ok(GatherOutcome::BagFull(loot_id));
    }
    let loot = map.remove_loot(loot_id).ok_or(GatherError::MissingLoot(loot_id))?;
    bag.items.push(loot);
    cleared.insert(key);
    Ok(GatherOutcome::PickedUp(loot_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Dog, Loot};
    use crate::map::MapId;
    use crate::systems::movement_system;
    use kennel_logic::geometry::{Offset, Office, Point, Road, Vec2};
    use kennel_logic::loot_gen::LootGenerator;
    use kennel_logic::movement::{velocity_for, Direction};
    use crate::ids::SessionId;
    use std::time::Duration;

    // ── Fixtures ──

    fn street(capacity: usize) -> Map {
        let mut map = Map::new(
            MapId::from("street"),
            "Street",
            1.0,
            capacity,
            LootGenerator::new(Duration::from_secs(5), 0.5),
        );
        map.add_road(Road::horizontal(Point::new(0, 0), 40));
        map
    }

    fn loot(id: u64, x: f64, value: u64) -> Loot {
        Loot {
            id: LootId(id),
            kind: 0,
            position: Vec2::new(x, 0.0),
            value,
        }
    }

    fn runner(session: &mut Session, id: u64, x: f64, speed: f64) {
        let mut dog = Dog::new(DogId(id), Vec2::new(x, 0.0), speed);
        dog.facing = Direction::Right;
        dog.velocity = velocity_for(Direction::Right, speed);
        session.add_dog(dog);
    }

    fn tick(session: &mut Session, map: &mut Map, secs: u64) -> GatherReport {
        let paths = movement_system(session.world_mut(), map.roads(), Duration::from_secs(secs));
        gather_system(session, map, &paths)
    }

    // ── Pickup ──

    #[test]
    fn picks_up_loot_on_the_path() {
        let mut map = street(3);
        map.add_loot(loot(0, 2.0, 10));
        map.add_loot(loot(1, 8.0, 10));
        let mut session = Session::new(SessionId(0), map.id().clone());
        runner(&mut session, 0, 0.0, 5.0);

        let report = tick(&mut session, &mut map, 1);
        assert_eq!(report.picked_up, 1);
        assert_eq!(map.loot().len(), 1);
        assert_eq!(session.dog(DogId(0)).map(|d| d.bag.len()), Some(1));
    }

    #[test]
    fn full_bag_leaves_loot_on_the_ground() {
        let mut map = street(1);
        map.add_loot(loot(0, 1.0, 10));
        map.add_loot(loot(1, 2.0, 10));
        let mut session = Session::new(SessionId(0), map.id().clone());
        runner(&mut session, 0, 0.0, 5.0);

        let report = tick(&mut session, &mut map, 1);
        assert_eq!(report.picked_up, 1);
        assert_eq!(report.bag_full, 1);
        assert_eq!(map.loot().iter().map(|l| l.id).collect::<Vec<_>>(), vec![LootId(1)]);
    }

    #[test]
    fn loot_is_taken_once_when_two_dogs_cross_it() {
        let mut map = street(3);
        map.add_loot(loot(0, 5.0, 10));
        let mut session = Session::new(SessionId(0), map.id().clone());
        runner(&mut session, 0, 0.0, 10.0);
        runner(&mut session, 1, 1.0, 10.0);

        let report = tick(&mut session, &mut map, 1);
        assert_eq!(report.picked_up, 1);
        assert_eq!(report.skipped, 0);
        assert!(map.loot().is_empty());
        // dog 1 started closer, so it reaches the loot first
        assert_eq!(session.dog(DogId(1)).map(|d| d.bag.len()), Some(1));
        assert_eq!(session.dog(DogId(0)).map(|d| d.bag.len()), Some(0));
    }

    // ── Delivery ──

    #[test]
    fn office_delivery_scores_bag_value() {
        let mut map = street(3);
        map.add_office(Office {
            id: "o".into(),
            position: Point::new(10, 0),
            offset: Offset { dx: 0, dy: 0 },
        })
        .expect("office");
        map.add_loot(loot(0, 2.0, 10));
        map.add_loot(loot(1, 4.0, 20));
        let mut session = Session::new(SessionId(0), map.id().clone());
        runner(&mut session, 0, 0.0, 12.0);

        let report = tick(&mut session, &mut map, 1);
        assert_eq!(report.picked_up, 2);
        assert_eq!(report.delivered, 1);
        let dog = session.dog(DogId(0)).expect("dog");
        assert!(dog.bag.is_empty());
        assert_eq!(dog.score, 30);
    }

    #[test]
    fn full_bag_ignores_loot_up_to_the_office() {
        let mut map = street(3);
        map.add_office(Office {
            id: "o".into(),
            position: Point::new(10, 0),
            offset: Offset { dx: 0, dy: 0 },
        })
        .expect("office");
        map.add_loot(loot(10, 8.0, 100));
        map.add_loot(loot(11, 10.0, 100));
        let mut session = Session::new(SessionId(0), map.id().clone());
        let mut dog = Dog::new(DogId(0), Vec2::ZERO, 12.0);
        dog.facing = Direction::Right;
        dog.velocity = velocity_for(Direction::Right, 12.0);
        dog.bag = vec![loot(0, 0.0, 1), loot(1, 0.0, 2), loot(2, 0.0, 3)];
        session.add_dog(dog);

        let report = tick(&mut session, &mut map, 1);
        assert_eq!(report.bag_full, 2);
        assert_eq!(report.picked_up, 0);
        assert_eq!(report.delivered, 1);
        assert_eq!(
            map.loot().iter().map(|l| l.id).collect::<Vec<_>>(),
            vec![LootId(10), LootId(11)]
        );
        let dog = session.dog(DogId(0)).expect("dog");
        assert!(dog.bag.is_empty());
        assert_eq!(dog.score, 6);
    }

    #[test]
    fn missing_dog_is_skipped() {
        let mut map = street(3);
        map.add_loot(loot(0, 1.0, 10));
        let mut session = Session::new(SessionId(0), map.id().clone());
        let ghost = Gatherer {
            id: 42,
            start: Vec2::ZERO,
            end: Vec2::new(3.0, 0.0),
            radius: 0.3,
        };
        let report = gather_system(&mut session, &mut map, &[ghost]);
        assert_eq!(report.skipped, 1);
        assert_eq!(map.loot_count(), 1);
    }
}
