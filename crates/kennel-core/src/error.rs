//! Error types for the engine.

use thiserror::Error;

use crate::ids::{DogId, LootId};
use crate::map::MapId;

/// Load-time configuration errors. These abort startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("map with id {0} already exists")]
    DuplicateMapId(MapId),
    #[error("map {map} has duplicate office {office}")]
    DuplicateOfficeId { map: MapId, office: String },
    #[error("map {map}: road #{index} has neither x1 nor y1")]
    InvalidRoad { map: MapId, index: usize },
    #[error("map {0} has no roads")]
    NoRoads(MapId),
}

/// Why a join request was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinRejection {
    EmptyName,
    EmptyMapId,
}

impl std::fmt::Display for JoinRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JoinRejection::EmptyName => write!(f, "invalid name"),
            JoinRejection::EmptyMapId => write!(f, "invalid map id"),
        }
    }
}

/// Errors reported back to the request layer. None of them are fatal.
#[derive(Debug, Error)]
pub enum GameError {
    #[error("map {0} not found")]
    MapNotFound(MapId),
    #[error("invalid join request: {0}")]
    InvalidJoinRequest(JoinRejection),
    #[error("authorization header is missing or malformed")]
    MalformedToken,
    #[error("player token has not been found")]
    UnknownToken,
    #[error("invalid move: {0:?}")]
    InvalidAction(String),
    #[error("requested {requested} records, at most {max} allowed")]
    RecordsLimitExceeded { requested: usize, max: usize },
    #[error(transparent)]
    Records(#[from] RecordError),
}

/// Failures of the leaderboard collaborator.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("record store unavailable: {0}")]
    Unavailable(String),
}

/// Snapshot save/load errors.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("snapshot encoding error: {0}")]
    Encode(#[from] bincode::Error),
    #[error("corrupt snapshot: {0}")]
    Corrupt(String),
    #[error("cannot restore into a world with {sessions} sessions and {players} players")]
    WorldNotEmpty { sessions: usize, players: usize },
}

/// A gather event that could not be applied. Logged and skipped.
#[derive(Debug, Error, PartialEq)]
pub enum GatherError {
    #[error("dog {0} is not in the session")]
    MissingDog(DogId),
    #[error("loot {0} is not on the map")]
    MissingLoot(LootId),
}
