//! Retired-player leaderboard.
//!
//! Storage is behind [`RecordStore`] so a database can stand in for the
//! in-memory store.

use std::cmp::Ordering;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::RecordError;

/// Largest page a records query may ask for.
pub const MAX_RECORDS_PAGE: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetiredPlayer {
    pub name: String,
    pub score: u64,
    pub play_time: Duration,
}

/// Leaderboard order: score descending, then play time ascending, then
/// name ascending.
pub fn leaderboard_order(a: &RetiredPlayer, b: &RetiredPlayer) -> Ordering {
    b.score
        .cmp(&a.score)
        .then(a.play_time.cmp(&b.play_time))
        .then_with(|| a.name.cmp(&b.name))
}

pub trait RecordStore: Send + Sync {
    fn record_retired(&mut self, players: &[RetiredPlayer]) -> Result<(), RecordError>;

    /// A page of the leaderboard in [`leaderboard_order`].
    fn query_retired(&self, offset: usize, limit: usize) -> Result<Vec<RetiredPlayer>, RecordError>;
}

#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    records: Vec<RetiredPlayer>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl RecordStore for MemoryRecordStore {
    fn record_retired(&mut self, players: &[RetiredPlayer]) -> Result<(), RecordError> {
        for player in players {
            let at = self
                .records
                .partition_point(|r| leaderboard_order(r, player) != Ordering::Greater);
            self.records.insert(at, player.clone());
        }
        Ok(())
    }

    fn query_retired(&self, offset: usize, limit: usize) -> Result<Vec<RetiredPlayer>, RecordError> {
        Ok(self.records.iter().skip(offset).take(limit).cloned().collect())
    }
}
