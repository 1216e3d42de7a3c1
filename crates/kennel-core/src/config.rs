//! World configuration - JSON loading and validation.
//!
//! The JSON is parsed into plain serde structures first, then validated into
//! [`Map`]s on a fresh [`Game`]. Any problem is a [`ConfigError`] and aborts
//! startup.

use std::path::Path;
use std::time::Duration;

use kennel_logic::geometry::{Building, Office, Offset, Point, Rectangle, Road, Size};
use kennel_logic::loot_gen::LootGenerator;
use serde::Deserialize;

use crate::components::LootType;
use crate::error::ConfigError;
use crate::game::Game;
use crate::map::{Map, MapId};

fn default_dog_speed() -> f64 {
    1.0
}

fn default_bag_capacity() -> usize {
    3
}

fn default_retirement_time() -> f64 {
    60.0
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GameConfig {
    #[serde(default = "default_dog_speed")]
    default_dog_speed: f64,
    #[serde(default = "default_bag_capacity")]
    default_bag_capacity: usize,
    /// Seconds
    #[serde(default = "default_retirement_time")]
    dog_retirement_time: f64,
    loot_generator_config: LootGeneratorConfig,
    maps: Vec<MapConfig>,
}

#[derive(Debug, Deserialize)]
struct LootGeneratorConfig {
    /// Seconds
    period: f64,
    probability: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MapConfig {
    id: String,
    name: String,
    dog_speed: Option<f64>,
    bag_capacity: Option<usize>,
    roads: Vec<RoadConfig>,
    #[serde(default)]
    buildings: Vec<BuildingConfig>,
    #[serde(default)]
    offices: Vec<OfficeConfig>,
    #[serde(default)]
    loot_types: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct RoadConfig {
    x0: i32,
    y0: i32,
    x1: Option<i32>,
    y1: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct BuildingConfig {
    x: i32,
    y: i32,
    w: i32,
    h: i32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OfficeConfig {
    id: String,
    x: i32,
    y: i32,
    offset_x: i32,
    offset_y: i32,
}

/// Negative, NaN or overflowing values become zero.
fn seconds(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or(Duration::ZERO)
}

pub fn load_game(path: impl AsRef<Path>) -> Result<Game, ConfigError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_game(&text)
}

pub fn parse_game(json: &str) -> Result<Game, ConfigError> {
    let config: GameConfig = serde_json::from_str(json)?;
    let mut game = Game::new(seconds(config.dog_retirement_time));
    let period = seconds(config.loot_generator_config.period);
    let probability = config.loot_generator_config.probability;

    for raw in config.maps {
        let map_id = MapId(raw.id);
        let mut map = Map::new(
            map_id.clone(),
            raw.name,
            raw.dog_speed.unwrap_or(config.default_dog_speed),
            raw.bag_capacity.unwrap_or(config.default_bag_capacity),
            LootGenerator::new(period, probability),
        );

        if raw.roads.is_empty() {
            return Err(ConfigError::NoRoads(map_id));
        }
        for (index, road) in raw.roads.into_iter().enumerate() {
            let start = Point::new(road.x0, road.y0);
            let road = match (road.x1, road.y1) {
                (Some(x1), _) => Road::horizontal(start, x1),
                (None, Some(y1)) => Road::vertical(start, y1),
                (None, None) => {
                    return Err(ConfigError::InvalidRoad {
                        map: map_id,
                        index,
                    })
                }
            };
            map.add_road(road);
        }

        for b in raw.buildings {
            map.add_building(Building {
                bounds: Rectangle {
                    position: Point::new(b.x, b.y),
                    size: Size {
                        width: b.w,
                        height: b.h,
                    },
                },
            });
        }

        for o in raw.offices {
            map.add_office(Office {
                id: o.id,
                position: Point::new(o.x, o.y),
                offset: Offset {
                    dx: o.offset_x,
                    dy: o.offset_y,
                },
            })?;
        }

        let loot_types = raw
            .loot_types
            .into_iter()
            .map(|raw| LootType {
                value: raw.get("value").and_then(serde_json::Value::as_u64).unwrap_or(0),
                raw,
            })
            .collect();

        game.add_map(map, loot_types)?;
    }

    log::info!("loaded {} maps", game.maps().len());
    Ok(game)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"{
        "defaultDogSpeed": 3.0,
        "dogRetirementTime": 15.5,
        "lootGeneratorConfig": { "period": 5.0, "probability": 0.5 },
        "maps": [
            {
                "id": "map1",
                "name": "Map 1",
                "bagCapacity": 2,
                "roads": [ { "x0": 0, "y0": 0, "x1": 40 }, { "x0": 40, "y0": 0, "y1": 30 } ],
                "buildings": [ { "x": 5, "y": 5, "w": 30, "h": 20 } ],
                "offices": [ { "id": "o0", "x": 40, "y": 30, "offsetX": 5, "offsetY": 0 } ],
                "lootTypes": [
                    { "name": "key", "file": "assets/key.obj", "value": 10 },
                    { "name": "wallet", "file": "assets/wallet.obj" }
                ]
            },
            {
                "id": "town",
                "name": "Town",
                "dogSpeed": 1.5,
                "roads": [ { "x0": 0, "y0": 0, "y1": 10 } ]
            }
        ]
    }"#;

    #[test]
    fn parses_maps_with_defaults() {
        let game = parse_game(CONFIG).expect("config");
        assert_eq!(game.maps().len(), 2);
        assert_eq!(game.retirement_time(), Duration::from_millis(15500));

        let map1 = game.find_map(&MapId::from("map1")).expect("map1");
        assert_eq!(map1.dog_speed(), 3.0);
        assert_eq!(map1.bag_capacity(), 2);
        assert!(map1.roads()[0].is_horizontal());
        assert!(map1.roads()[1].is_vertical());
        assert_eq!(map1.buildings().len(), 1);
        assert_eq!(map1.office("o0").map(|o| o.offset.dx), Some(5));

        let types = game.loot_types(&MapId::from("map1"));
        assert_eq!(types.iter().map(|t| t.value).collect::<Vec<_>>(), vec![10, 0]);
        assert_eq!(types[0].raw["name"], "key");

        let town = game.find_map(&MapId::from("town")).expect("town");
        assert_eq!(town.dog_speed(), 1.5);
        assert_eq!(town.bag_capacity(), 3);
        assert!(game.loot_types(&MapId::from("town")).is_empty());
    }

    #[test]
    fn duplicate_map_id_is_fatal() {
        let json = r#"{
            "lootGeneratorConfig": { "period": 1, "probability": 1 },
            "maps": [
                { "id": "a", "name": "A", "roads": [ { "x0": 0, "y0": 0, "x1": 1 } ] },
                { "id": "a", "name": "B", "roads": [ { "x0": 0, "y0": 0, "x1": 1 } ] }
            ]
        }"#;
        assert!(matches!(parse_game(json), Err(ConfigError::DuplicateMapId(id)) if id.as_str() == "a"));
    }

    #[test]
    fn duplicate_office_id_is_fatal() {
        let json = r#"{
            "lootGeneratorConfig": { "period": 1, "probability": 1 },
            "maps": [ { "id": "a", "name": "A",
                "roads": [ { "x0": 0, "y0": 0, "x1": 1 } ],
                "offices": [
                    { "id": "o", "x": 0, "y": 0, "offsetX": 0, "offsetY": 0 },
                    { "id": "o", "x": 1, "y": 0, "offsetX": 0, "offsetY": 0 }
                ] } ]
        }"#;
        assert!(matches!(parse_game(json), Err(ConfigError::DuplicateOfficeId { .. })));
    }

    #[test]
    fn malformed_roads_rejected() {
        let json = r#"{
            "lootGeneratorConfig": { "period": 1, "probability": 1 },
            "maps": [ { "id": "a", "name": "A", "roads": [ { "x0": 0, "y0": 0 } ] } ]
        }"#;
        assert!(matches!(parse_game(json), Err(ConfigError::InvalidRoad { index: 0, .. })));

        let json = r#"{
            "lootGeneratorConfig": { "period": 1, "probability": 1 },
            "maps": [ { "id": "a", "name": "A", "roads": [] } ]
        }"#;
        assert!(matches!(parse_game(json), Err(ConfigError::NoRoads(_))));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = load_game("/definitely/not/here.json").unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.json"));
    }

    #[test]
    fn sample_config_loads() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../../data/config.json");
        let game = load_game(path).expect("sample config");
        assert!(!game.maps().is_empty());
    }
}
