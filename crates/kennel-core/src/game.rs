//! Game root - maps, live sessions, and the per-tick pipeline

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::components::{Dog, LootType};
use crate::error::{ConfigError, GameError};
use crate::ids::{DogId, IdAllocator, SessionId};
use crate::map::{Map, MapId};
use crate::session::Session;
use crate::systems::*;

/// Totals for one game tick across all sessions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    pub spawned: usize,
    pub picked_up: usize,
    pub delivered: usize,
    pub skipped: usize,
    /// Dogs whose idle time reached the retirement threshold, by map
    pub idle: Vec<(MapId, DogId)>,
}

/// Owns every map and every live session. At most one session exists per
/// map; it is created by the first join and removed once empty.
pub struct Game {
    maps: Vec<Map>,
    map_index: HashMap<MapId, usize>,
    loot_types: HashMap<MapId, Vec<LootType>>,
    sessions: BTreeMap<MapId, Session>,
    retirement_time: Duration,
    ids: IdAllocator,
    rng: StdRng,
}

impl Game {
    pub fn new(retirement_time: Duration) -> Self {
        Self {
            maps: Vec::new(),
            map_index: HashMap::new(),
            loot_types: HashMap::new(),
            sessions: BTreeMap::new(),
            retirement_time,
            ids: IdAllocator::new(),
            rng: StdRng::from_entropy(),
        }
    }

    /// Make loot placement and random spawn points reproducible.
    pub fn seed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    pub fn add_map(&mut self, map: Map, loot_types: Vec<LootType>) -> Result<(), ConfigError> {
        if self.map_index.contains_key(map.id()) {
            return Err(ConfigError::DuplicateMapId(map.id().clone()));
        }
        self.map_index.insert(map.id().clone(), self.maps.len());
        self.loot_types.insert(map.id().clone(), loot_types);
        self.maps.push(map);
        Ok(())
    }

    pub fn maps(&self) -> &[Map] {
        &self.maps
    }

    pub fn find_map(&self, id: &MapId) -> Option<&Map> {
        self.map_index.get(id).map(|&i| &self.maps[i])
    }

    pub fn find_map_mut(&mut self, id: &MapId) -> Option<&mut Map> {
        self.map_index.get(id).map(|&i| &mut self.maps[i])
    }

    pub fn loot_types(&self, id: &MapId) -> &[LootType] {
        self.loot_types.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn retirement_time(&self) -> Duration {
        self.retirement_time
    }

    pub fn ids(&self) -> &IdAllocator {
        &self.ids
    }

    pub fn ids_mut(&mut self) -> &mut IdAllocator {
        &mut self.ids
    }

    pub fn sessions(&self) -> impl Iterator<Item = &Session> {
        self.sessions.values()
    }

    pub fn session(&self, map_id: &MapId) -> Option<&Session> {
        self.sessions.get(map_id)
    }

    pub fn session_mut(&mut self, map_id: &MapId) -> Option<&mut Session> {
        self.sessions.get_mut(map_id)
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Put a fully built session in place, replacing any existing one for
    /// the same map.
    pub fn insert_session(&mut self, session: Session) {
        self.sessions.insert(session.map_id().clone(), session);
    }

    /// Spawn a new dog on `map_id`, creating the map's session if needed.
    ///
    /// The dog starts at the first road's start point, or at a random road
    /// point when `randomize` is set, facing up and standing still.
    pub fn spawn_dog(&mut self, map_id: &MapId, randomize: bool) -> Result<(SessionId, DogId), GameError> {
        let &index = self
            .map_index
            .get(map_id)
            .ok_or_else(|| GameError::MapNotFound(map_id.clone()))?;
        let map = &self.maps[index];
        let spawn = if randomize {
            map.random_point_on_road(&mut self.rng)
        } else {
            map.start_point()
        };
        let position = spawn.ok_or_else(|| GameError::MapNotFound(map_id.clone()))?;
        let speed = map.dog_speed();

        let dog_id = self.ids.dog();
        let ids = &mut self.ids;
        let session = self.sessions.entry(map_id.clone()).or_insert_with(|| {
            let session = Session::new(ids.session(), map_id.clone());
            log::info!("opened session {} on map {map_id}", session.id());
            session
        });
        session.add_dog(Dog::new(dog_id, position, speed));
        Ok((session.id(), dog_id))
    }

    /// Remove a dog from its session, returning its final state.
    pub fn remove_dog(&mut self, map_id: &MapId, dog_id: DogId) -> Option<Dog> {
        self.sessions.get_mut(map_id)?.remove_dog(dog_id)
    }

    /// Drop every session with no dogs left. Returns how many were removed.
    pub fn remove_empty_sessions(&mut self) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|map_id, session| {
            let keep = !session.is_empty();
            if !keep {
                log::info!("closed session {} on map {map_id}", session.id());
            }
            keep
        });
        before - self.sessions.len()
    }

    /// Advance every session by `dt`: spawn loot, move dogs, resolve
    /// gathering, then accumulate idle time.
    pub fn tick(&mut self, dt: Duration) -> TickReport {
        let mut report = TickReport::default();

        for (map_id, session) in self.sessions.iter_mut() {
            let Some(&index) = self.map_index.get(map_id) else {
                log::warn!("session {} refers to unknown map {map_id}", session.id());
                continue;
            };
            let map = &mut self.maps[index];
            let loot_types = self.loot_types.get(map_id).map(Vec::as_slice).unwrap_or(&[]);

            report.spawned += loot_spawn_system(
                map,
                loot_types,
                session.dog_count(),
                dt,
                &mut self.ids,
                &mut self.rng,
            );

            let paths = movement_system(session.world_mut(), map.roads(), dt);
            let gathered = gather_system(session, map, &paths);
            report.picked_up += gathered.picked_up;
            report.delivered += gathered.delivered;
            report.skipped += gathered.skipped;

            for dog in idle_system(session.world_mut(), dt, self.retirement_time) {
                report.idle.push((map_id.clone(), dog));
            }
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::Loot;
    use crate::ids::LootId;
    use kennel_logic::geometry::{Offset, Office, Point, Road, Vec2};
    use kennel_logic::loot_gen::LootGenerator;
    use kennel_logic::movement::{Action, Direction};

    fn game() -> Game {
        let mut game = Game::new(Duration::from_secs(10));
        game.seed(3);
        let mut map = Map::new(
            MapId::from("town"),
            "Town",
            4.0,
            3,
            LootGenerator::new(Duration::from_secs(5), 0.0),
        );
        map.add_road(Road::horizontal(Point::new(0, 0), 20));
        map.add_office(Office {
            id: "o1".into(),
            position: Point::new(6, 0),
            offset: Offset { dx: 0, dy: 0 },
        })
        .expect("office");
        game.add_map(map, Vec::new()).expect("map");
        game
    }

    fn town() -> MapId {
        MapId::from("town")
    }

    #[test]
    fn duplicate_map_rejected() {
        let mut g = game();
        let dup = Map::new(town(), "Again", 1.0, 3, LootGenerator::new(Duration::ZERO, 0.0));
        assert!(matches!(g.add_map(dup, Vec::new()), Err(ConfigError::DuplicateMapId(_))));
    }

    #[test]
    fn one_session_per_map() {
        let mut g = game();
        let (s1, d1) = g.spawn_dog(&town(), false).expect("join");
        let (s2, d2) = g.spawn_dog(&town(), false).expect("join");
        assert_eq!(s1, s2);
        assert_ne!(d1, d2);
        assert_eq!(g.session_count(), 1);

        let dog = g.session(&town()).and_then(|s| s.dog(d1)).expect("dog");
        assert_eq!(dog.position, Vec2::ZERO);
        assert_eq!(dog.facing, Direction::Up);
        assert_eq!(dog.speed, 4.0);
    }

    #[test]
    fn unknown_map_rejected() {
        let mut g = game();
        assert!(matches!(
            g.spawn_dog(&MapId::from("nowhere"), false),
            Err(GameError::MapNotFound(_))
        ));
        assert_eq!(g.session_count(), 0);
    }

    #[test]
    fn empty_sessions_are_removed() {
        let mut g = game();
        let (_, dog) = g.spawn_dog(&town(), false).expect("join");
        assert!(g.remove_dog(&town(), dog).is_some());
        assert_eq!(g.remove_empty_sessions(), 1);
        assert!(g.session(&town()).is_none());

        // a later join opens a fresh session
        let (session, _) = g.spawn_dog(&town(), false).expect("join");
        assert_eq!(session, SessionId(1));
    }

    #[test]
    fn full_bag_delivers_and_then_picks_up_in_the_same_tick() {
        let mut g = game();
        let (_, dog) = g.spawn_dog(&town(), false).expect("join");
        {
            let map = g.find_map_mut(&town()).expect("map");
            for (i, x) in [1.0, 2.0, 3.0, 8.0].into_iter().enumerate() {
                map.add_loot(Loot {
                    id: LootId(i as u64),
                    kind: 0,
                    position: Vec2::new(x, 0.0),
                    value: 5,
                });
            }
        }
        let session = g.session_mut(&town()).expect("session");
        session.apply_action(dog, Action::Move(Direction::Right));

        // 0 -> 4 at speed 4: fills the bag
        g.tick(Duration::from_secs(1));
        // 4 -> 8: office at 6 empties the bag, loot at 8 goes in
        let report = g.tick(Duration::from_secs(1));
        assert_eq!(report.delivered, 1);
        assert_eq!(report.picked_up, 1);

        let dog = g.session(&town()).and_then(|s| s.dog(dog)).expect("dog");
        assert_eq!(dog.score, 15);
        assert_eq!(dog.bag.len(), 1);
        assert!(g.find_map(&town()).map(|m| m.loot().is_empty()).unwrap_or(false));
    }

    #[test]
    fn idle_dogs_reported_once_threshold_reached() {
        let mut g = game();
        let (_, still) = g.spawn_dog(&town(), false).expect("join");
        let (_, busy) = g.spawn_dog(&town(), false).expect("join");
        g.session_mut(&town())
            .expect("session")
            .apply_action(busy, Action::Move(Direction::Right));

        let report = g.tick(Duration::from_secs(4));
        assert!(report.idle.is_empty());
        let report = g.tick(Duration::from_secs(6));
        assert_eq!(report.idle, vec![(town(), still)]);
    }
}
