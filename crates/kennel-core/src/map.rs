//! Maps: road network, buildings, offices, and the loot lying on the ground.
//!
//! Everything except the live loot list and the loot generator's clock is
//! fixed once the map is loaded.

use std::collections::HashMap;

use kennel_logic::geometry::{roads_containing, Building, Office, Road, Vec2};
use kennel_logic::loot_gen::LootGenerator;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::components::Loot;
use crate::error::ConfigError;
use crate::ids::LootId;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MapId(pub String);

impl MapId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MapId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MapId {
    fn from(s: &str) -> Self {
        MapId(s.to_string())
    }
}

#[derive(Debug)]
pub struct Map {
    id: MapId,
    name: String,
    roads: Vec<Road>,
    buildings: Vec<Building>,
    offices: Vec<Office>,
    office_index: HashMap<String, usize>,
    dog_speed: f64,
    bag_capacity: usize,
    loot_generator: LootGenerator,
    /// Loot on the ground, in spawn order
    loot: Vec<Loot>,
}

impl Map {
    pub fn new(
        id: MapId,
        name: impl Into<String>,
        dog_speed: f64,
        bag_capacity: usize,
        loot_generator: LootGenerator,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            roads: Vec::new(),
            buildings: Vec::new(),
            offices: Vec::new(),
            office_index: HashMap::new(),
            dog_speed,
            bag_capacity,
            loot_generator,
            loot: Vec::new(),
        }
    }

    pub fn add_road(&mut self, road: Road) {
        self.roads.push(road);
    }

    pub fn add_building(&mut self, building: Building) {
        self.buildings.push(building);
    }

    pub fn add_office(&mut self, office: Office) -> Result<(), ConfigError> {
        if self.office_index.contains_key(&office.id) {
            return Err(ConfigError::DuplicateOfficeId {
                map: self.id.clone(),
                office: office.id,
            });
        }
        self.office_index.insert(office.id.clone(), self.offices.len());
        self.offices.push(office);
        Ok(())
    }

    pub fn id(&self) -> &MapId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn roads(&self) -> &[Road] {
        &self.roads
    }

    pub fn buildings(&self) -> &[Building] {
        &self.buildings
    }

    pub fn offices(&self) -> &[Office] {
        &self.offices
    }

    pub fn office(&self, id: &str) -> Option<&Office> {
        self.office_index.get(id).map(|&i| &self.offices[i])
    }

    pub fn dog_speed(&self) -> f64 {
        self.dog_speed
    }

    pub fn bag_capacity(&self) -> usize {
        self.bag_capacity
    }

    /// Every road whose occupancy rectangle contains `pos`.
    pub fn roads_containing(&self, pos: Vec2) -> Vec<&Road> {
        roads_containing(&self.roads, pos)
    }

    /// Default spawn point: the start of the first road.
    pub fn start_point(&self) -> Option<Vec2> {
        self.roads.first().map(|r| r.start().to_vec2())
    }

    /// Uniform point inside a uniformly chosen road's occupancy rectangle.
    pub fn random_point_on_road<R: Rng>(&self, rng: &mut R) -> Option<Vec2> {
        if self.roads.is_empty() {
            return None;
        }
        let road = &self.roads[rng.gen_range(0..self.roads.len())];
        let edges = road.edge_bounds();
        Some(Vec2::new(
            rng.gen_range(edges.x.min..=edges.x.max),
            rng.gen_range(edges.y.min..=edges.y.max),
        ))
    }

    pub fn loot_generator_mut(&mut self) -> &mut LootGenerator {
        &mut self.loot_generator
    }

    pub fn loot(&self) -> &[Loot] {
        &self.loot
    }

    pub fn loot_count(&self) -> usize {
        self.loot.len()
    }

    pub fn add_loot(&mut self, loot: Loot) {
        self.loot.push(loot);
    }

    /// Remove a loot item, keeping the order of the rest. Linear in the
    /// amount of loot on the map.
    pub fn remove_loot(&mut self, id: LootId) -> Option<Loot> {
        let index = self.loot.iter().position(|l| l.id == id)?;
        Some(self.loot.remove(index))
    }

    pub fn clear_loot(&mut self) {
        self.loot.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kennel_logic::geometry::{Offset, Point};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::time::Duration;

    fn town() -> Map {
        let mut map = Map::new(
            MapId::from("town"),
            "Town",
            1.0,
            3,
            LootGenerator::new(Duration::from_secs(5), 0.5),
        );
        map.add_road(Road::horizontal(Point::new(0, 0), 10));
        map.add_road(Road::vertical(Point::new(10, 0), -10));
        map
    }

    fn office(id: &str) -> Office {
        Office {
            id: id.to_string(),
            position: Point::new(5, 0),
            offset: Offset { dx: 1, dy: 1 },
        }
    }

    #[test]
    fn duplicate_office_rejected() {
        let mut map = town();
        map.add_office(office("o1")).expect("first office");
        let err = map.add_office(office("o1")).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateOfficeId { .. }));
        assert_eq!(map.offices().len(), 1);
        assert!(map.office("o1").is_some());
    }

    #[test]
    fn random_points_land_on_roads() {
        let map = town();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..500 {
            let p = map.random_point_on_road(&mut rng).expect("map has roads");
            assert!(!map.roads_containing(p).is_empty(), "{p:?}");
        }
    }

    #[test]
    fn start_point_is_first_road_start() {
        assert_eq!(town().start_point(), Some(Vec2::new(0.0, 0.0)));
    }

    #[test]
    fn loot_removal_keeps_order() {
        let mut map = town();
        for i in 0..4 {
            map.add_loot(Loot {
                id: LootId(i),
                kind: 0,
                position: Vec2::new(i as f64, 0.0),
                value: 1,
            });
        }
        assert_eq!(map.remove_loot(LootId(1)).map(|l| l.id), Some(LootId(1)));
        assert!(map.remove_loot(LootId(1)).is_none());
        let ids: Vec<u64> = map.loot().iter().map(|l| l.id.0).collect();
        assert_eq!(ids, vec![0, 2, 3]);
    }
}
