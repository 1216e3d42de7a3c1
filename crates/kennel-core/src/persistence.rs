//! Save/load world state.
//!
//! A snapshot file holds three bincode sections back to back: loot by map,
//! dogs by map and dog id, players by map and bound dog id. Records carry
//! object ids plus the allocator generation at save time.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use kennel_logic::geometry::Vec2;
use kennel_logic::movement::Direction;
use serde::{Deserialize, Serialize};

use crate::components::{Dog, Loot};
use crate::error::SnapshotError;
use crate::game::Game;
use crate::ids::{DogId, Generations, LootId, PlayerId};
use crate::map::MapId;
use crate::players::{Player, Players, Token};
use crate::session::Session;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LootRecord {
    pub generation: u64,
    pub id: LootId,
    pub kind: usize,
    pub position: Vec2,
    pub value: u64,
}

impl LootRecord {
    fn from_loot(loot: &Loot, generation: u64) -> Self {
        Self {
            generation,
            id: loot.id,
            kind: loot.kind,
            position: loot.position,
            value: loot.value,
        }
    }

    fn into_loot(self) -> Loot {
        Loot {
            id: self.id,
            kind: self.kind,
            position: self.position,
            value: self.value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DogRecord {
    pub generation: u64,
    pub id: DogId,
    pub facing: Direction,
    pub position: Vec2,
    pub velocity: Vec2,
    pub speed: f64,
    pub bag: Vec<LootRecord>,
    pub score: u64,
    pub idle: Duration,
}

impl DogRecord {
    fn from_dog(dog: &Dog, generations: &Generations) -> Self {
        Self {
            generation: generations.dogs,
            id: dog.id,
            facing: dog.facing,
            position: dog.position,
            velocity: dog.velocity,
            speed: dog.speed,
            bag: dog
                .bag
                .iter()
                .map(|l| LootRecord::from_loot(l, generations.loot))
                .collect(),
            score: dog.score,
            idle: dog.idle,
        }
    }

    fn into_dog(self) -> Dog {
        Dog {
            id: self.id,
            facing: self.facing,
            position: self.position,
            velocity: self.velocity,
            speed: self.speed,
            bag: self.bag.into_iter().map(LootRecord::into_loot).collect(),
            score: self.score,
            idle: self.idle,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub generation: u64,
    pub id: PlayerId,
    pub dog: DogId,
    pub name: String,
    pub token: String,
    pub play_time: Duration,
}

pub type LootSection = BTreeMap<MapId, Vec<LootRecord>>;
pub type DogSection = BTreeMap<MapId, BTreeMap<DogId, DogRecord>>;
pub type PlayerSection = BTreeMap<MapId, BTreeMap<DogId, PlayerRecord>>;

/// Everything needed to rebuild the live world.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub loot: LootSection,
    pub dogs: DogSection,
    pub players: PlayerSection,
}

impl Snapshot {
    fn check_sections(&self) -> Result<(), SnapshotError> {
        if self.loot.is_empty() || self.dogs.is_empty() || self.players.is_empty() {
            return Err(SnapshotError::Corrupt("empty section".into()));
        }
        Ok(())
    }
}

/// Capture every live session with its loot and players.
pub fn capture(game: &Game, players: &Players) -> Snapshot {
    let generations = game.ids().generations();
    let mut snapshot = Snapshot::default();

    for session in game.sessions() {
        let map_id = session.map_id();
        let loot = game
            .find_map(map_id)
            .map(|m| {
                m.loot()
                    .iter()
                    .map(|l| LootRecord::from_loot(l, generations.loot))
                    .collect()
            })
            .unwrap_or_default();
        snapshot.loot.insert(map_id.clone(), loot);

        let dogs = session
            .dogs()
            .iter()
            .map(|d| (d.id, DogRecord::from_dog(d, &generations)))
            .collect();
        snapshot.dogs.insert(map_id.clone(), dogs);

        let records = players
            .in_session(map_id)
            .into_iter()
            .map(|p| {
                let record = PlayerRecord {
                    generation: generations.players,
                    id: p.id,
                    dog: p.dog,
                    name: p.name.clone(),
                    token: p.token.as_str().to_string(),
                    play_time: p.play_time,
                };
                (p.dog, record)
            })
            .collect();
        snapshot.players.insert(map_id.clone(), records);
    }
    snapshot
}

/// Rebuild sessions and players from a snapshot.
///
/// Only an empty world can be restored into. The snapshot is fully
/// validated before anything is changed, so a failed restore leaves `game`
/// and `players` untouched.
pub fn restore(game: &mut Game, players: &mut Players, snapshot: Snapshot) -> Result<(), SnapshotError> {
    if game.session_count() > 0 || !players.is_empty() {
        return Err(SnapshotError::WorldNotEmpty {
            sessions: game.session_count(),
            players: players.len(),
        });
    }
    snapshot.check_sections()?;

    for (map_id, dogs) in &snapshot.dogs {
        if game.find_map(map_id).is_none() {
            return Err(SnapshotError::Corrupt(format!("unknown map {map_id}")));
        }
        let session_players = snapshot.players.get(map_id);
        for (id, dog) in dogs {
            let Some(record) = session_players.and_then(|p| p.get(id)) else {
                return Err(SnapshotError::Corrupt(format!("dog {id} has no player")));
            };
            if Token::parse(&record.token).is_err() {
                return Err(SnapshotError::Corrupt(format!("player {} has a malformed token", record.id)));
            }
            let exhausted = id.0 == u64::MAX
                || record.id.0 == u64::MAX
                || dog.bag.iter().any(|l| l.id.0 == u64::MAX);
            if exhausted {
                return Err(SnapshotError::Corrupt(format!("dog {id} carries an out of range id")));
            }
        }
    }
    if snapshot.loot.values().flatten().any(|l| l.id.0 == u64::MAX) {
        return Err(SnapshotError::Corrupt("loot id out of range".into()));
    }

    let Snapshot {
        mut loot,
        dogs,
        players: mut player_records,
    } = snapshot;
    let mut generations = Generations::default();

    for (map_id, dogs) in dogs {
        let session_id = game.ids_mut().session();
        let mut session = Session::new(session_id, map_id.clone());

        if let Some(map) = game.find_map_mut(&map_id) {
            map.clear_loot();
            for record in loot.remove(&map_id).unwrap_or_default() {
                generations.loot = generations.loot.max(record.generation);
                map.add_loot(record.into_loot());
            }
        }

        let mut session_players = player_records.remove(&map_id).unwrap_or_default();
        for (dog_id, record) in dogs {
            generations.dogs = generations.dogs.max(record.generation);
            for item in &record.bag {
                generations.loot = generations.loot.max(item.generation);
            }
            let dog = record.into_dog();
            for item in &dog.bag {
                game.ids_mut().observe_loot(item.id);
            }
            game.ids_mut().observe_dog(dog_id);
            session.add_dog(dog);

            if let Some(p) = session_players.remove(&dog_id) {
                generations.players = generations.players.max(p.generation);
                game.ids_mut().observe_player(p.id);
                let token = Token::parse(&p.token)
                    .map_err(|_| SnapshotError::Corrupt(format!("player {} has a malformed token", p.id)))?;
                players.add(Player {
                    id: p.id,
                    name: p.name,
                    dog: dog_id,
                    map: map_id.clone(),
                    session: session_id,
                    token,
                    play_time: p.play_time,
                });
            }
        }
        game.insert_session(session);
    }

    let on_ground: Vec<LootId> = game
        .maps()
        .iter()
        .flat_map(|m| m.loot().iter().map(|l| l.id))
        .collect();
    for id in on_ground {
        game.ids_mut().observe_loot(id);
    }
    game.ids_mut().observe_generations(generations);
    log::info!("restored {} sessions, {} players", game.session_count(), players.len());
    Ok(())
}

pub fn write_snapshot<W: Write>(mut writer: W, snapshot: &Snapshot) -> Result<(), SnapshotError> {
    bincode::serialize_into(&mut writer, &snapshot.loot)?;
    bincode::serialize_into(&mut writer, &snapshot.dogs)?;
    bincode::serialize_into(&mut writer, &snapshot.players)?;
    writer.flush()?;
    Ok(())
}

pub fn read_snapshot<R: Read>(mut reader: R) -> Result<Snapshot, SnapshotError> {
    let loot = bincode::deserialize_from(&mut reader)?;
    let dogs = bincode::deserialize_from(&mut reader)?;
    let players = bincode::deserialize_from(&mut reader)?;
    Ok(Snapshot { loot, dogs, players })
}

/// Result of looking for a snapshot at startup.
#[derive(Debug)]
pub enum LoadOutcome {
    Missing,
    /// The file was unreadable or incomplete and has been deleted.
    Discarded(String),
    Loaded(Snapshot),
}

/// Snapshot file with optional periodic autosave.
#[derive(Debug, Clone)]
pub struct SnapshotFile {
    path: PathBuf,
    temp_path: PathBuf,
    save_period: Option<Duration>,
    since_save: Duration,
}

impl SnapshotFile {
    pub fn new(path: impl Into<PathBuf>, save_period: Option<Duration>) -> Self {
        let path = path.into();
        let mut temp = path.clone().into_os_string();
        temp.push(".tmp");
        Self {
            path,
            temp_path: PathBuf::from(temp),
            save_period,
            since_save: Duration::ZERO,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn save_period(&self) -> Option<Duration> {
        self.save_period
    }

    /// Write `snapshot`. An existing file is replaced by renaming a fully
    /// written temp file over it; a fresh file is written in place.
    pub fn save(&mut self, snapshot: &Snapshot) -> Result<(), SnapshotError> {
        let replace = self.path.exists();
        let target = if replace { &self.temp_path } else { &self.path };

        let file = File::create(target)?;
        write_snapshot(BufWriter::new(file), snapshot)?;
        if replace {
            fs::rename(&self.temp_path, &self.path)?;
        }

        self.since_save = Duration::ZERO;
        log::info!("saved snapshot to {}", self.path.display());
        Ok(())
    }

    /// Read the snapshot, if any. A corrupt file is deleted.
    pub fn load(&self) -> Result<LoadOutcome, SnapshotError> {
        if !self.path.exists() {
            return Ok(LoadOutcome::Missing);
        }
        let decoded = File::open(&self.path)
            .map_err(SnapshotError::from)
            .and_then(|f| read_snapshot(BufReader::new(f)))
            .and_then(|s| s.check_sections().map(|_| s));

        match decoded {
            Ok(snapshot) => Ok(LoadOutcome::Loaded(snapshot)),
            Err(e) => {
                log::warn!("discarding snapshot {}: {e}", self.path.display());
                self.discard()?;
                Ok(LoadOutcome::Discarded(e.to_string()))
            }
        }
    }

    /// Delete the snapshot file. Called once its contents have been loaded.
    pub fn discard(&self) -> Result<(), SnapshotError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Count `dt` towards the autosave period, saving once it is reached.
    /// Returns whether a save happened.
    pub fn on_tick(
        &mut self,
        dt: Duration,
        capture: impl FnOnce() -> Snapshot,
    ) -> Result<bool, SnapshotError> {
        let Some(period) = self.save_period else {
            return Ok(false);
        };
        self.since_save += dt;
        if self.since_save < period {
            return Ok(false);
        }
        self.save(&capture())?;
        Ok(true)
    }
}
