//! Loot items, on the ground or carried in a bag.

use kennel_logic::geometry::Vec2;
use serde::{Deserialize, Serialize};

use crate::ids::LootId;

/// A collectible item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Loot {
    pub id: LootId,
    /// Index into the map's loot types
    pub kind: usize,
    pub position: Vec2,
    /// Score awarded when delivered to an office
    pub value: u64,
}

/// Static description of a loot type, as authored in the world config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LootType {
    pub value: u64,
    /// The authored JSON object, handed back untouched to clients
    pub raw: serde_json::Value,
}
