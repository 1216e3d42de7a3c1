//! Dog components.

use std::time::Duration;

use kennel_logic::geometry::Vec2;
use kennel_logic::movement::{velocity_for, Direction};
use serde::{Deserialize, Serialize};

use super::Loot;
use crate::ids::DogId;

/// Live position on the map plane
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position(pub Vec2);

/// Current velocity; always axis-aligned
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Velocity(pub Vec2);

/// Last commanded direction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Facing(pub Direction);

/// Speed a dog moves at once it is given a direction
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Speed(pub f64);

/// Carried loot, in pickup order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Bag {
    pub items: Vec<Loot>,
}

impl Bag {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn has_room(&self, capacity: usize) -> bool {
        self.items.len() < capacity
    }

    /// Empty the bag, returning the summed value of its contents.
    pub fn drain_value(&mut self) -> u64 {
        self.items.drain(..).map(|l| l.value).sum()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score(pub u64);

/// Time spent standing still since the last player action
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdleTime(pub Duration);

/// Component bundle a dog entity is spawned with.
pub type DogBundle = (DogId, Position, Velocity, Facing, Speed, Bag, Score, IdleTime);

/// Full state of one dog, gathered from its components.
///
/// This is what joins spawn, what state queries report, and what snapshots
/// store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dog {
    pub id: DogId,
    pub facing: Direction,
    pub position: Vec2,
    pub velocity: Vec2,
    pub speed: f64,
    pub bag: Vec<Loot>,
    pub score: u64,
    pub idle: Duration,
}

impl Dog {
    /// A freshly joined dog: facing up, standing still.
    pub fn new(id: DogId, position: Vec2, speed: f64) -> Self {
        Self {
            id,
            facing: Direction::Up,
            position,
            velocity: Vec2::ZERO,
            speed,
            bag: Vec::new(),
            score: 0,
            idle: Duration::ZERO,
        }
    }

    pub fn into_bundle(self) -> DogBundle {
        (
            self.id,
            Position(self.position),
            Velocity(self.velocity),
            Facing(self.facing),
            Speed(self.speed),
            Bag { items: self.bag },
            Score(self.score),
            IdleTime(self.idle),
        )
    }
}

/// Point the dog in `direction` and set it moving at its own speed.
pub fn command_direction(facing: &mut Facing, velocity: &mut Velocity, speed: Speed, direction: Direction) {
    facing.0 = direction;
    velocity.0 = velocity_for(direction, speed.0);
}

/// Stop without changing facing.
pub fn command_stop(velocity: &mut Velocity) {
    velocity.0 = Vec2::ZERO;
}
