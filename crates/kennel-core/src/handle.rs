//! Shared, serialized access to one [`Application`].
//!
//! Mutations (tick, join, action, save, restore) take the write lock, so
//! they run one at a time and no reader ever sees a half-applied tick.
//! State queries take the read lock and may overlap with each other.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use kennel_logic::movement::Action;

use crate::app::{Application, JoinInfo, MapDetail, MapSummary, PlayerEntry, SessionState};
use crate::error::{GameError, SnapshotError};
use crate::game::TickReport;
use crate::records::RetiredPlayer;

#[derive(Clone)]
pub struct WorldHandle {
    app: Arc<RwLock<Application>>,
}

impl WorldHandle {
    pub fn new(app: Application) -> Self {
        Self {
            app: Arc::new(RwLock::new(app)),
        }
    }

    /// Poisoning is ignored; the state is taken over as is.
    fn read(&self) -> RwLockReadGuard<'_, Application> {
        self.app.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Application> {
        self.app.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` with exclusive access.
    pub fn with_mut<T>(&self, f: impl FnOnce(&mut Application) -> T) -> T {
        f(&mut self.write())
    }

    /// Run `f` with shared access.
    pub fn with<T>(&self, f: impl FnOnce(&Application) -> T) -> T {
        f(&self.read())
    }

    pub fn tick(&self, dt: Duration) -> TickReport {
        self.write().tick(dt)
    }

    pub fn join(&self, map_id: &str, name: &str) -> Result<JoinInfo, GameError> {
        self.write().join(map_id, name)
    }

    pub fn apply_action(&self, token: &str, action: Action) -> Result<(), GameError> {
        self.write().apply_action(token, action)
    }

    pub fn apply_move(&self, token: &str, mv: &str) -> Result<(), GameError> {
        self.write().apply_move(token, mv)
    }

    pub fn save(&self) -> Result<(), SnapshotError> {
        self.write().save()
    }

    pub fn restore(&self) -> Result<bool, SnapshotError> {
        self.write().restore()
    }

    pub fn state(&self, token: &str) -> Result<SessionState, GameError> {
        self.read().state(token)
    }

    pub fn session_players(&self, token: &str) -> Result<Vec<PlayerEntry>, GameError> {
        self.read().session_players(token)
    }

    pub fn maps(&self) -> Vec<MapSummary> {
        self.read().maps()
    }

    pub fn map(&self, id: &str) -> Result<MapDetail, GameError> {
        self.read().map(id)
    }

    pub fn retired_players(&self, offset: usize, limit: usize) -> Result<Vec<RetiredPlayer>, GameError> {
        self.read().retired_players(offset, limit)
    }
}
