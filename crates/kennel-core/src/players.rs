//! Players and their auth tokens.
//!
//! A player is the account side of a dog: name, token, and accumulated play
//! time. The registry indexes players by token and by dog id.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::GameError;
use crate::ids::{DogId, PlayerId, SessionId};
use crate::map::MapId;

/// Opaque bearer token: 32 hex characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Token(String);

impl Token {
    pub const LEN: usize = 32;

    /// Validate the token's shape. Says nothing about whether it is known.
    pub fn parse(s: &str) -> Result<Self, GameError> {
        if s.len() == Self::LEN && s.bytes().all(|b| b.is_ascii_hexdigit()) {
            Ok(Token(s.to_string()))
        } else {
            Err(GameError::MalformedToken)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Produces tokens from two independent 64-bit random draws.
pub struct TokenGenerator {
    rng1: StdRng,
    rng2: StdRng,
}

impl TokenGenerator {
    pub fn new() -> Self {
        Self {
            rng1: StdRng::from_entropy(),
            rng2: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng1: StdRng::seed_from_u64(seed),
            rng2: StdRng::seed_from_u64(seed.wrapping_add(1)),
        }
    }

    pub fn generate(&mut self) -> Token {
        let hi: u64 = self.rng1.gen();
        let lo: u64 = self.rng2.gen();
        Token(format!("{hi:016x}{lo:016x}"))
    }
}

impl Default for TokenGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub dog: DogId,
    pub map: MapId,
    pub session: SessionId,
    pub token: Token,
    pub play_time: Duration,
}

#[derive(Debug, Default)]
pub struct Players {
    players: BTreeMap<PlayerId, Player>,
    by_token: HashMap<Token, PlayerId>,
    by_dog: HashMap<DogId, PlayerId>,
}

impl Players {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a player. A player with the same id is replaced.
    pub fn add(&mut self, player: Player) {
        if let Some(old) = self.players.remove(&player.id) {
            self.by_token.remove(&old.token);
            self.by_dog.remove(&old.dog);
        }
        self.by_token.insert(player.token.clone(), player.id);
        self.by_dog.insert(player.dog, player.id);
        self.players.insert(player.id, player);
    }

    pub fn get(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(&id)
    }

    pub fn by_token(&self, token: &Token) -> Option<&Player> {
        self.by_token.get(token).and_then(|id| self.players.get(id))
    }

    pub fn by_dog(&self, dog: DogId) -> Option<&Player> {
        self.by_dog.get(&dog).and_then(|id| self.players.get(id))
    }

    pub fn remove(&mut self, id: PlayerId) -> Option<Player> {
        let player = self.players.remove(&id)?;
        self.by_token.remove(&player.token);
        self.by_dog.remove(&player.dog);
        Some(player)
    }

    /// Players on `map`, ordered by dog id.
    pub fn in_session(&self, map: &MapId) -> Vec<&Player> {
        let mut players: Vec<&Player> = self.players.values().filter(|p| &p.map == map).collect();
        players.sort_by_key(|p| p.dog);
        players
    }

    pub fn iter(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn add_play_time(&mut self, dt: Duration) {
        for player in self.players.values_mut() {
            player.play_time += dt;
        }
    }

    pub fn clear(&mut self) {
        self.players.clear();
        self.by_token.clear();
        self.by_dog.clear();
    }
}
