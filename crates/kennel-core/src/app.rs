//! Application facade - what a request layer calls into.
//!
//! Wraps the [`Game`] with the player registry, token issuing, the
//! leaderboard store, and snapshot autosave. Every method here is either a
//! mutation or a read-only query; [`crate::handle::WorldHandle`] serializes
//! the mutations.

use std::path::PathBuf;
use std::time::Duration;

use kennel_logic::geometry::{Building, Office, Road, Vec2};
use kennel_logic::movement::Action;
use serde::Serialize;

use crate::components::LootType;
use crate::error::{GameError, JoinRejection, SnapshotError};
use crate::game::{Game, TickReport};
use crate::ids::{DogId, LootId};
use crate::map::{Map, MapId};
use crate::persistence::{capture, restore, LoadOutcome, SnapshotFile};
use crate::players::{Player, Players, Token, TokenGenerator};
use crate::records::{RecordStore, RetiredPlayer, MAX_RECORDS_PAGE};

/// Runtime settings that are not part of the world config.
#[derive(Debug, Clone, Default)]
pub struct AppSettings {
    pub randomize_spawn_points: bool,
    pub state_file: Option<PathBuf>,
    pub save_period: Option<Duration>,
    /// Seed for loot placement, spawn points and tokens
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinInfo {
    pub auth_token: Token,
    pub player_id: DogId,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapSummary {
    pub id: MapId,
    pub name: String,
}

/// Full description of one map.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapDetail {
    pub id: MapId,
    pub name: String,
    pub roads: Vec<Road>,
    pub buildings: Vec<Building>,
    pub offices: Vec<Office>,
    pub loot_types: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BagEntry {
    pub id: LootId,
    #[serde(rename = "type")]
    pub kind: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DogState {
    pub id: DogId,
    #[serde(rename = "pos")]
    pub position: Vec2,
    #[serde(rename = "speed")]
    pub velocity: Vec2,
    #[serde(rename = "dir")]
    pub facing: char,
    pub bag: Vec<BagEntry>,
    pub score: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LootState {
    pub id: LootId,
    #[serde(rename = "type")]
    pub kind: usize,
    #[serde(rename = "pos")]
    pub position: Vec2,
}

/// What a player sees of their session.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub players: Vec<DogState>,
    pub lost_objects: Vec<LootState>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerEntry {
    pub id: DogId,
    pub name: String,
}

pub struct Application {
    game: Game,
    players: Players,
    tokens: TokenGenerator,
    records: Box<dyn RecordStore>,
    settings: AppSettings,
    snapshot: Option<SnapshotFile>,
}

impl Application {
    pub fn new(mut game: Game, settings: AppSettings, records: Box<dyn RecordStore>) -> Self {
        let tokens = match settings.seed {
            Some(seed) => {
                game.seed(seed);
                TokenGenerator::seeded(seed)
            }
            None => TokenGenerator::new(),
        };
        let snapshot = settings
            .state_file
            .as_ref()
            .map(|path| SnapshotFile::new(path, settings.save_period));
        Self {
            game,
            players: Players::new(),
            tokens,
            records,
            settings,
            snapshot,
        }
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn players(&self) -> &Players {
        &self.players
    }

    pub fn settings(&self) -> &AppSettings {
        &self.settings
    }

    pub fn maps(&self) -> Vec<MapSummary> {
        self.game
            .maps()
            .iter()
            .map(|m| MapSummary {
                id: m.id().clone(),
                name: m.name().to_string(),
            })
            .collect()
    }

    pub fn map(&self, id: &str) -> Result<MapDetail, GameError> {
        let map_id = MapId::from(id);
        let map = self
            .game
            .find_map(&map_id)
            .ok_or_else(|| GameError::MapNotFound(map_id.clone()))?;
        Ok(map_detail(map, self.game.loot_types(&map_id)))
    }

    /// Spawn a dog for a new player on `map_id`.
    pub fn join(&mut self, map_id: &str, name: &str) -> Result<JoinInfo, GameError> {
        if name.is_empty() {
            return Err(GameError::InvalidJoinRequest(JoinRejection::EmptyName));
        }
        if map_id.is_empty() {
            return Err(GameError::InvalidJoinRequest(JoinRejection::EmptyMapId));
        }
        let map_id = MapId::from(map_id);
        let (session, dog) = self
            .game
            .spawn_dog(&map_id, self.settings.randomize_spawn_points)?;

        let token = self.tokens.generate();
        let id = self.game.ids_mut().player();
        self.players.add(Player {
            id,
            name: name.to_string(),
            dog,
            map: map_id.clone(),
            session,
            token: token.clone(),
            play_time: Duration::ZERO,
        });
        log::info!("player {name:?} joined map {map_id} as dog {dog}");
        Ok(JoinInfo {
            auth_token: token,
            player_id: dog,
        })
    }

    /// Look up the player a raw token belongs to.
    pub fn authorize(&self, token: &str) -> Result<&Player, GameError> {
        let token = Token::parse(token)?;
        self.players.by_token(&token).ok_or(GameError::UnknownToken)
    }

    pub fn apply_action(&mut self, token: &str, action: Action) -> Result<(), GameError> {
        let player = self.authorize(token)?;
        let (map, dog) = (player.map.clone(), player.dog);
        let applied = self
            .game
            .session_mut(&map)
            .map(|s| s.apply_action(dog, action))
            .unwrap_or(false);
        if applied {
            Ok(())
        } else {
            Err(GameError::UnknownToken)
        }
    }

    /// Parse a wire move (`"U"`, `"D"`, `"L"`, `"R"` or `""`) and apply it.
    pub fn apply_move(&mut self, token: &str, mv: &str) -> Result<(), GameError> {
        let action = Action::parse(mv).ok_or_else(|| GameError::InvalidAction(mv.to_string()))?;
        self.apply_action(token, action)
    }

    pub fn state(&self, token: &str) -> Result<SessionState, GameError> {
        let player = self.authorize(token)?;
        let session = self
            .game
            .session(&player.map)
            .ok_or(GameError::UnknownToken)?;

        let players = session
            .dogs()
            .into_iter()
            .map(|d| DogState {
                id: d.id,
                position: d.position,
                velocity: d.velocity,
                facing: d.facing.as_char(),
                bag: d
                    .bag
                    .iter()
                    .map(|l| BagEntry { id: l.id, kind: l.kind })
                    .collect(),
                score: d.score,
            })
            .collect();
        let lost_objects = self
            .game
            .find_map(&player.map)
            .map(|m| {
                m.loot()
                    .iter()
                    .map(|l| LootState {
                        id: l.id,
                        kind: l.kind,
                        position: l.position,
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(SessionState { players, lost_objects })
    }

    /// Everyone playing in the caller's session.
    pub fn session_players(&self, token: &str) -> Result<Vec<PlayerEntry>, GameError> {
        let player = self.authorize(token)?;
        Ok(self
            .players
            .in_session(&player.map)
            .into_iter()
            .map(|p| PlayerEntry {
                id: p.dog,
                name: p.name.clone(),
            })
            .collect())
    }

    pub fn retired_players(&self, offset: usize, limit: usize) -> Result<Vec<RetiredPlayer>, GameError> {
        if limit > MAX_RECORDS_PAGE {
            return Err(GameError::RecordsLimitExceeded {
                requested: limit,
                max: MAX_RECORDS_PAGE,
            });
        }
        Ok(self.records.query_retired(offset, limit)?)
    }

    /// Advance the world by `dt`: play time, game tick, idle retirement,
    /// then autosave.
    pub fn tick(&mut self, dt: Duration) -> TickReport {
        self.players.add_play_time(dt);
        let report = self.game.tick(dt);
        self.retire(&report.idle);

        if let Some(file) = self.snapshot.as_mut() {
            let (game, players) = (&self.game, &self.players);
            if let Err(e) = file.on_tick(dt, || capture(game, players)) {
                log::warn!("autosave failed: {e}");
            }
        }
        report
    }

    fn retire(&mut self, idle: &[(MapId, DogId)]) {
        if idle.is_empty() {
            return;
        }
        let mut retired = Vec::with_capacity(idle.len());
        for (map_id, dog_id) in idle {
            let dog = self.game.remove_dog(map_id, *dog_id);
            let player = self
                .players
                .by_dog(*dog_id)
                .map(|p| p.id)
                .and_then(|id| self.players.remove(id));
            match (dog, player) {
                (Some(dog), Some(player)) => {
                    log::info!("retired {:?} with score {}", player.name, dog.score);
                    retired.push(RetiredPlayer {
                        name: player.name,
                        score: dog.score,
                        play_time: player.play_time,
                    });
                }
                _ => log::warn!("dog {dog_id} on map {map_id} retired without a player"),
            }
        }
        if let Err(e) = self.records.record_retired(&retired) {
            log::warn!("could not record {} retired players: {e}", retired.len());
        }
        self.game.remove_empty_sessions();
    }

    /// Save now, if a state file is configured.
    pub fn save(&mut self) -> Result<(), SnapshotError> {
        let snapshot = capture(&self.game, &self.players);
        match self.snapshot.as_mut() {
            Some(file) => file.save(&snapshot),
            None => Ok(()),
        }
    }

    /// Load and consume the configured snapshot. Returns whether a world
    /// was restored. A corrupt snapshot is discarded and the world stays
    /// empty. Restoring after anyone has joined fails with
    /// [`SnapshotError::WorldNotEmpty`] and keeps the file.
    pub fn restore(&mut self) -> Result<bool, SnapshotError> {
        let Some(file) = self.snapshot.as_ref() else {
            return Ok(false);
        };
        let snapshot = match file.load()? {
            LoadOutcome::Missing => return Ok(false),
            LoadOutcome::Discarded(_) => return Ok(false),
            LoadOutcome::Loaded(snapshot) => snapshot,
        };
        match restore(&mut self.game, &mut self.players, snapshot) {
            Ok(()) => {
                file.discard()?;
                Ok(true)
            }
            Err(SnapshotError::Corrupt(reason)) => {
                log::warn!("discarding snapshot {}: {reason}", file.path().display());
                file.discard()?;
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }
}

fn map_detail(map: &Map, loot_types: &[LootType]) -> MapDetail {
    MapDetail {
        id: map.id().clone(),
        name: map.name().to_string(),
        roads: map.roads().to_vec(),
        buildings: map.buildings().to_vec(),
        offices: map.offices().to_vec(),
        loot_types: loot_types.iter().map(|t| t.raw.clone()).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RecordError;
    use crate::records::MemoryRecordStore;
    use kennel_logic::geometry::Point;
    use kennel_logic::loot_gen::LootGenerator;
    use kennel_logic::movement::Direction;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn game() -> Game {
        let mut game = Game::new(Duration::from_secs(5));
        let mut map = Map::new(
            MapId::from("map1"),
            "Map 1",
            2.0,
            3,
            LootGenerator::new(Duration::from_secs(5), 0.0),
        );
        map.add_road(Road::horizontal(Point::new(0, 0), 10));
        game.add_map(map, Vec::new()).expect("map");
        game
    }

    fn app() -> Application {
        let settings = AppSettings {
            seed: Some(11),
            ..AppSettings::default()
        };
        Application::new(game(), settings, Box::new(MemoryRecordStore::new()))
    }

    /// Counts how often the store is actually queried.
    struct CountingStore(Arc<AtomicUsize>);

    impl RecordStore for CountingStore {
        fn record_retired(&mut self, _: &[RetiredPlayer]) -> Result<(), RecordError> {
            Ok(())
        }

        fn query_retired(&self, _: usize, _: usize) -> Result<Vec<RetiredPlayer>, RecordError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(Vec::new())
        }
    }

    // ── Join ──

    #[test]
    fn join_validation_order() {
        let mut app = app();
        assert!(matches!(
            app.join("", ""),
            Err(GameError::InvalidJoinRequest(JoinRejection::EmptyName))
        ));
        assert!(matches!(
            app.join("", "rex"),
            Err(GameError::InvalidJoinRequest(JoinRejection::EmptyMapId))
        ));
        assert!(matches!(app.join("map2", "rex"), Err(GameError::MapNotFound(_))));
        assert!(app.players().is_empty());
    }

    #[test]
    fn join_then_query_state() {
        let mut app = app();
        let info = app.join("map1", "rex").expect("join");
        let state = app.state(info.auth_token.as_str()).expect("state");
        assert_eq!(state.players.len(), 1);
        assert_eq!(state.players[0].facing, 'U');
        assert_eq!(state.players[0].position, Vec2::ZERO);

        let names = app.session_players(info.auth_token.as_str()).expect("players");
        assert_eq!(names, vec![PlayerEntry { id: info.player_id, name: "rex".into() }]);
    }

    // ── Tokens ──

    #[test]
    fn malformed_and_unknown_tokens_differ() {
        let mut app = app();
        app.join("map1", "rex").expect("join");
        assert!(matches!(app.state("nope"), Err(GameError::MalformedToken)));
        assert!(matches!(
            app.state("0123456789abcdef0123456789abcdef"),
            Err(GameError::UnknownToken)
        ));
    }

    // ── Actions ──

    #[test]
    fn moves_parse_and_apply() {
        let mut app = app();
        let info = app.join("map1", "rex").expect("join");
        let token = info.auth_token.as_str().to_string();

        app.apply_move(&token, "R").expect("move");
        let dog = &app.state(&token).expect("state").players[0];
        assert_eq!(dog.velocity, Vec2::new(2.0, 0.0));
        assert_eq!(dog.facing, Direction::Right.as_char());

        assert!(matches!(app.apply_move(&token, "Q"), Err(GameError::InvalidAction(_))));
        app.apply_move(&token, "").expect("stop");
        assert!(app.state(&token).expect("state").players[0].velocity.is_zero());
    }

    // ── Retirement ──

    #[test]
    fn idle_players_retire_to_the_leaderboard() {
        let mut app = app();
        let idle = app.join("map1", "sleepy").expect("join");
        let busy = app.join("map1", "busy").expect("join");

        app.tick(Duration::from_secs(3));
        app.apply_move(busy.auth_token.as_str(), "").expect("keep busy");
        app.tick(Duration::from_secs(3));

        assert!(matches!(app.state(idle.auth_token.as_str()), Err(GameError::UnknownToken)));
        assert!(app.state(busy.auth_token.as_str()).is_ok());
        let records = app.retired_players(0, 100).expect("records");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "sleepy");
        assert_eq!(records[0].play_time, Duration::from_secs(6));
        assert_eq!(app.game().session_count(), 1);
    }

    #[test]
    fn last_retirement_removes_the_session() {
        let mut app = app();
        app.join("map1", "sleepy").expect("join");
        app.tick(Duration::from_secs(5));
        assert_eq!(app.game().session_count(), 0);
        assert!(app.players().is_empty());
    }

    #[test]
    fn oversized_records_page_never_reaches_store() {
        let calls = Arc::new(AtomicUsize::new(0));
        let app = Application::new(
            game(),
            AppSettings::default(),
            Box::new(CountingStore(calls.clone())),
        );
        assert!(matches!(
            app.retired_players(0, 150),
            Err(GameError::RecordsLimitExceeded { requested: 150, max: 100 })
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        app.retired_players(0, 100).expect("query");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    // ── Persistence ──

    #[test]
    fn save_and_restore_through_state_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("state.bin");
        let settings = AppSettings {
            state_file: Some(path.clone()),
            seed: Some(4),
            ..AppSettings::default()
        };

        let mut first = Application::new(game(), settings.clone(), Box::new(MemoryRecordStore::new()));
        let info = first.join("map1", "rex").expect("join");
        first.apply_move(info.auth_token.as_str(), "R").expect("move");
        first.tick(Duration::from_millis(1500));
        first.save().expect("save");

        let mut second = Application::new(game(), settings, Box::new(MemoryRecordStore::new()));
        assert!(second.restore().expect("restore"));
        assert!(!path.exists());
        assert_eq!(
            second.state(info.auth_token.as_str()).expect("state"),
            first.state(info.auth_token.as_str()).expect("state")
        );

        // the file was consumed
        assert!(!second.restore().expect("restore"));
    }

    #[test]
    fn restore_after_joins_is_refused() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("state.bin");
        let settings = AppSettings {
            state_file: Some(path.clone()),
            seed: Some(4),
            ..AppSettings::default()
        };

        let mut saved = Application::new(game(), settings.clone(), Box::new(MemoryRecordStore::new()));
        saved.join("map1", "rex").expect("join");
        saved.save().expect("save");

        let mut live = Application::new(game(), settings, Box::new(MemoryRecordStore::new()));
        let a = live.join("map1", "a").expect("join");
        let b = live.join("map1", "b").expect("join");
        assert!(matches!(
            live.restore(),
            Err(SnapshotError::WorldNotEmpty { sessions: 1, players: 2 })
        ));
        assert!(path.exists());

        // every live player still drives a dog in its session
        for joined in [&a, &b] {
            let token = joined.auth_token.as_str();
            live.apply_move(token, "R").expect("move");
            assert_eq!(live.state(token).expect("state").players.len(), 2);
            assert_eq!(live.session_players(token).expect("players").len(), 2);
        }
        assert_eq!(live.players().by_dog(a.player_id).map(|p| p.name.as_str()), Some("a"));
    }

    #[test]
    fn map_detail_lists_everything() {
        let app = app();
        let detail = app.map("map1").expect("map");
        assert_eq!(detail.roads.len(), 1);
        assert_eq!(app.maps(), vec![MapSummary { id: MapId::from("map1"), name: "Map 1".into() }]);
        assert!(matches!(app.map("none"), Err(GameError::MapNotFound(_))));
    }
}
