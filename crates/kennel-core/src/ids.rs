//! Entity identities.
//!
//! Every entity kind has its own monotonically increasing counter, owned by
//! the [`IdAllocator`] on the game root. The counter value ("generation") is
//! persisted with snapshots so restored worlds keep handing out fresh ids.

use serde::{Deserialize, Serialize};

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub u64);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_type!(
    /// Identity of a loot item, on the ground or in a bag.
    LootId
);
id_type!(
    /// Identity of a dog. Stable across snapshots.
    DogId
);
id_type!(SessionId);
id_type!(PlayerId);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Counter {
    next: u64,
}

impl Counter {
    fn take(&mut self) -> u64 {
        let id = self.next;
        self.next += 1;
        id
    }

    /// Make sure `id` will never be handed out again.
    fn observe(&mut self, id: u64) {
        self.next = self.next.max(id.saturating_add(1));
    }
}

/// Counter values at a point in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Generations {
    pub loot: u64,
    pub dogs: u64,
    pub sessions: u64,
    pub players: u64,
}

/// Hands out ids for every entity kind.
#[derive(Debug, Clone, Default)]
pub struct IdAllocator {
    loot: Counter,
    dogs: Counter,
    sessions: Counter,
    players: Counter,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn loot(&mut self) -> LootId {
        LootId(self.loot.take())
    }

    pub fn dog(&mut self) -> DogId {
        DogId(self.dogs.take())
    }

    pub fn session(&mut self) -> SessionId {
        SessionId(self.sessions.take())
    }

    pub fn player(&mut self) -> PlayerId {
        PlayerId(self.players.take())
    }

    pub fn generations(&self) -> Generations {
        Generations {
            loot: self.loot.next,
            dogs: self.dogs.next,
            sessions: self.sessions.next,
            players: self.players.next,
        }
    }

    pub fn observe_loot(&mut self, id: LootId) {
        self.loot.observe(id.0);
    }

    pub fn observe_dog(&mut self, id: DogId) {
        self.dogs.observe(id.0);
    }

    pub fn observe_player(&mut self, id: PlayerId) {
        self.players.observe(id.0);
    }

    /// Advance every counter to at least the given generations.
    pub fn observe_generations(&mut self, g: Generations) {
        self.loot.next = self.loot.next.max(g.loot);
        self.dogs.next = self.dogs.next.max(g.dogs);
        self.sessions.next = self.sessions.next.max(g.sessions);
        self.players.next = self.players.next.max(g.players);
    }
}
