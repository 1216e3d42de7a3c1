//! A live instance of one map: the dogs currently playing on it.
//!
//! Dogs are entities in a per-session `hecs` world. The session keeps an
//! index from [`DogId`] to entity so ids survive snapshots while entity
//! handles do not.

use std::collections::BTreeMap;

use hecs::{Entity, World};
use kennel_logic::movement::Action;

use crate::components::*;
use crate::ids::{DogId, SessionId};
use crate::map::MapId;

pub struct Session {
    id: SessionId,
    map_id: MapId,
    world: World,
    dogs: BTreeMap<DogId, Entity>,
}

impl Session {
    pub fn new(id: SessionId, map_id: MapId) -> Self {
        Self {
            id,
            map_id,
            world: World::new(),
            dogs: BTreeMap::new(),
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn map_id(&self) -> &MapId {
        &self.map_id
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn entity(&self, id: DogId) -> Option<Entity> {
        self.dogs.get(&id).copied()
    }

    pub fn contains(&self, id: DogId) -> bool {
        self.dogs.contains_key(&id)
    }

    pub fn dog_count(&self) -> usize {
        self.dogs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dogs.is_empty()
    }

    /// Dog ids in ascending order.
    pub fn dog_ids(&self) -> impl Iterator<Item = DogId> + '_ {
        self.dogs.keys().copied()
    }

    /// Spawn a dog. A dog already present under the same id is replaced.
    pub fn add_dog(&mut self, dog: Dog) -> Entity {
        let id = dog.id;
        let entity = self.world.spawn(dog.into_bundle());
        if let Some(old) = self.dogs.insert(id, entity) {
            let _ = self.world.despawn(old);
        }
        entity
    }

    pub fn remove_dog(&mut self, id: DogId) -> Option<Dog> {
        let entity = self.dogs.remove(&id)?;
        let dog = read_dog(&self.world, entity);
        let _ = self.world.despawn(entity);
        dog
    }

    pub fn dog(&self, id: DogId) -> Option<Dog> {
        read_dog(&self.world, self.entity(id)?)
    }

    /// Every dog in ascending id order.
    pub fn dogs(&self) -> Vec<Dog> {
        self.dogs
            .values()
            .filter_map(|&e| read_dog(&self.world, e))
            .collect()
    }

    /// Apply a player's command. Any command counts as activity and clears
    /// the idle clock. Returns `false` if the dog is not in this session.
    pub fn apply_action(&mut self, id: DogId, action: Action) -> bool {
        let Some(entity) = self.entity(id) else {
            return false;
        };
        let Ok((facing, velocity, speed, idle)) = self
            .world
            .query_one_mut::<(&mut Facing, &mut Velocity, &Speed, &mut IdleTime)>(entity)
        else {
            return false;
        };

        idle.0 = std::time::Duration::ZERO;
        match action {
            Action::Move(direction) => command_direction(facing, velocity, *speed, direction),
            Action::Stop => command_stop(velocity),
        }
        true
    }
}

/// Assemble a [`Dog`] from its components.
fn read_dog(world: &World, entity: Entity) -> Option<Dog> {
    let e = world.entity(entity).ok()?;
    let id = *e.get::<&DogId>()?;
    let position = e.get::<&Position>()?.0;
    let velocity = e.get::<&Velocity>()?.0;
    let facing = e.get::<&Facing>()?.0;
    let speed = e.get::<&Speed>()?.0;
    let bag = e.get::<&Bag>()?.items.clone();
    let score = e.get::<&Score>()?.0;
    let idle = e.get::<&IdleTime>()?.0;
    Some(Dog {
        id,
        facing,
        position,
        velocity,
        speed,
        bag,
        score,
        idle,
    })
}
