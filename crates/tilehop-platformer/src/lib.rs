pub mod character;
pub mod config;
pub mod geometry;
pub mod kinematics;
pub mod level;
pub mod physics;
pub mod probe;

#[cfg(any(test, feature = "test-helpers"))]
pub mod arcade;

use std::collections::HashMap;

use tilehop_core::events::GameEvent;
use tilehop_core::session::{GameMode, LevelId, SessionContext, SessionError};
use tilehop_core::timer::SessionSummary;

use character::{CharacterProfile, CharacterType};
use config::PlatformerConfig;
use geometry::LevelGeometry;
use kinematics::{InputSnapshot, PlayerState, Surroundings};
use level::{HitboxTable, Level, LevelError};
use physics::{PhysicsEngine, PhysicsWorld};

/// Errors from starting a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformerError {
    Session(SessionError),
    Level(LevelError),
}

impl std::fmt::Display for PlatformerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Session(e) => write!(f, "session error: {e}"),
            Self::Level(e) => write!(f, "level error: {e}"),
        }
    }
}

impl std::error::Error for PlatformerError {}

impl From<SessionError> for PlatformerError {
    fn from(e: SessionError) -> Self {
        Self::Session(e)
    }
}

impl From<LevelError> for PlatformerError {
    fn from(e: LevelError) -> Self {
        Self::Level(e)
    }
}

/// One play-through: the active level, the player in it, and the session
/// clock deciding when it is over.
pub struct Platformer<E: PhysicsEngine> {
    config: PlatformerConfig,
    levels: HashMap<LevelId, Level>,
    hitboxes: HitboxTable,
    session: SessionContext,
    geometry: LevelGeometry,
    player: PlayerState,
    engine: E,
    /// Events raised outside `update`, delivered with the next frame.
    pending: Vec<GameEvent>,
}

impl<E: PhysicsEngine> Platformer<E> {
    /// Start a session and enter its first level.
    ///
    /// `levels` must hold every id in the configured catalog. `character`
    /// falls back to the configured one.
    pub fn start(
        config: PlatformerConfig,
        levels: HashMap<LevelId, Level>,
        hitboxes: HitboxTable,
        mode: GameMode,
        character: Option<CharacterType>,
        engine: E,
    ) -> Result<Self, PlatformerError> {
        let catalog = config.session.catalog();
        if let Some(missing) = catalog.iter().find(|id| !levels.contains_key(*id)) {
            return Err(LevelError::UnknownLevel(missing.clone()).into());
        }
        let mut session = SessionContext::start(mode, catalog, &config.session)?;
        let first = session.next_level().ok_or(SessionError::EmptyCatalog)?;
        let level = levels
            .get(&first)
            .ok_or_else(|| LevelError::UnknownLevel(first.clone()))?;
        let geometry = LevelGeometry::build(level, &hitboxes)?;

        let character = character.unwrap_or(config.character.character);
        let profile = CharacterProfile::new(character, &config.character);
        let spawn = profile.spawn_center(geometry.spawn_point, level.tile_height());
        let player = PlayerState::new(profile, &config, spawn);
        tracing::info!(level = %first, ?character, "Entered first level");

        Ok(Self {
            config,
            levels,
            hitboxes,
            session,
            geometry,
            player,
            engine,
            pending: vec![GameEvent::LevelStarted { level: first }],
        })
    }

    /// Advance one frame: clock, physics step, player control, then exit
    /// handling. `now` is the host's monotonic clock in seconds.
    ///
    /// A level that fails to build on transition is reported as an error;
    /// the finished level stays loaded and the player stays in it.
    pub fn update(
        &mut self,
        now: f64,
        dt: f32,
        input: &InputSnapshot,
    ) -> Result<Vec<GameEvent>, LevelError> {
        let mut events = std::mem::take(&mut self.pending);
        if self.session.is_over() {
            return Ok(events);
        }
        if let Some(ended) = self.session.tick(now) {
            events.push(ended);
            return Ok(events);
        }

        let current = &self.geometry.level;
        let level = self
            .levels
            .get(current)
            .ok_or_else(|| LevelError::UnknownLevel(current.clone()))?;
        let world = PhysicsWorld {
            collision: &level.collision,
            solids: &self.geometry.solids,
        };
        let triggers = self.engine.step(&mut self.player.body, &world, dt);
        events.extend(
            self.player
                .update(input, &Surroundings::new(level, &self.geometry)),
        );

        if !triggers.is_empty() {
            self.advance_level(&mut events)?;
        }
        Ok(events)
    }

    /// End the session at the player's request.
    pub fn quit(&mut self) -> Option<GameEvent> {
        self.session.finish()
    }

    /// Count the current level and swap in the next one. The next level is
    /// built before anything is recorded, so a failed build leaves the count
    /// and the countdown untouched. The swap happens entirely within this
    /// call, so no frame sees the old geometry with the new spawn.
    fn advance_level(&mut self, events: &mut Vec<GameEvent>) -> Result<(), LevelError> {
        let finished = self.geometry.level.clone();
        let Some(next) = self.session.next_level() else {
            self.record_completion(finished, events);
            events.extend(self.session.finish());
            return Ok(());
        };
        let level = self
            .levels
            .get(&next)
            .ok_or_else(|| LevelError::UnknownLevel(next.clone()))?;
        let geometry = LevelGeometry::build(level, &self.hitboxes)?;
        let spawn = self
            .player
            .profile
            .spawn_center(geometry.spawn_point, level.tile_height());

        self.record_completion(finished, events);
        self.geometry = geometry;
        self.player.place_at_spawn(spawn);
        events.push(GameEvent::LevelStarted { level: next });
        Ok(())
    }

    fn record_completion(&mut self, level: LevelId, events: &mut Vec<GameEvent>) {
        let levels_completed = self.session.complete_level();
        tracing::info!(level = %level, levels_completed, "Level completed");
        events.push(GameEvent::LevelCompleted {
            level,
            levels_completed,
        });
    }

    pub fn current_level(&self) -> &LevelId {
        &self.geometry.level
    }

    pub fn level(&self) -> Option<&Level> {
        self.levels.get(&self.geometry.level)
    }

    pub fn geometry(&self) -> &LevelGeometry {
        &self.geometry
    }

    pub fn player(&self) -> &PlayerState {
        &self.player
    }

    pub fn player_mut(&mut self) -> &mut PlayerState {
        &mut self.player
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub fn config(&self) -> &PlatformerConfig {
        &self.config
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Countdown left in normal mode; `None` in speedrun mode.
    pub fn remaining_secs(&self) -> Option<f64> {
        self.session.remaining_secs()
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.session.elapsed_secs()
    }

    pub fn is_over(&self) -> bool {
        self.session.is_over()
    }

    pub fn summary(&self) -> SessionSummary {
        self.session.summary()
    }
}

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers {
    use std::collections::HashMap;

    use tilehop_core::math::Vec2;
    use tilehop_core::session::LevelId;

    use crate::level::{HitboxTable, Level, TileLayer};

    pub const CORRIDOR_WIDTH: u32 = 8;
    pub const CORRIDOR_HEIGHT: u32 = 4;
    pub const FLOOR_TILE: u32 = 1;

    /// 8x4 level with a floor on row 3, the start door at (1, 2) and the
    /// exit door at (6, 2). Holding right walks from one to the other.
    pub fn corridor_level(id: &LevelId, hitboxes: &HitboxTable) -> Level {
        let (w, h) = (CORRIDOR_WIDTH, CORRIDOR_HEIGHT);
        let size = Vec2::new(70.0, 70.0);
        let layer = |name: &str, cells: &[(u32, u32, u32)]| {
            let mut gids = vec![0; (w * h) as usize];
            for &(c, r, gid) in cells {
                gids[(r * w + c) as usize] = gid;
            }
            TileLayer::from_gids(name, w, h, size, &gids).unwrap()
        };
        let floor: Vec<(u32, u32, u32)> = (0..w).map(|c| (c, 3, FLOOR_TILE)).collect();
        Level::new(
            id.clone(),
            layer("Colliders", &floor),
            Vec::new(),
            layer("StartDoor", &[(1, 2, 20)]),
            layer("ExitDoor", &[(6, 2, 21)]),
            hitboxes,
        )
        .unwrap()
    }

    /// A corridor for every id.
    pub fn corridor_levels(ids: &[LevelId]) -> HashMap<LevelId, Level> {
        let hitboxes = HitboxTable::new();
        ids.iter()
            .map(|id| (id.clone(), corridor_level(id, &hitboxes)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arcade::ArcadeEngine;
    use crate::geometry::{SolidGroup, SolidId};
    use crate::physics::{Contacts, PlayerBody};
    use crate::test_helpers::corridor_levels;
    use tilehop_core::session::LevelRange;
    use tilehop_core::test_helpers::{level_ids, seeded_config, session_end_count};

    const DT: f32 = 1.0 / 60.0;

    fn config_with_levels(n: u32, seed: u64) -> PlatformerConfig {
        let mut session = seeded_config(seed);
        session.normal_levels = LevelRange { start: 1, end: n };
        PlatformerConfig {
            session,
            ..Default::default()
        }
    }

    fn start(mode: GameMode, n: u32) -> Platformer<ArcadeEngine> {
        Platformer::start(
            config_with_levels(n, 7),
            corridor_levels(&level_ids(n as usize)),
            HitboxTable::new(),
            mode,
            Some(CharacterType::Rabbit),
            ArcadeEngine,
        )
        .unwrap()
    }

    /// Grounded every frame and always touching the exit door.
    struct StandingOnExit;

    impl PhysicsEngine for StandingOnExit {
        fn step(
            &mut self,
            body: &mut PlayerBody,
            world: &PhysicsWorld<'_>,
            _dt: f32,
        ) -> Vec<SolidId> {
            body.contacts = Contacts {
                on_floor: true,
                ..Default::default()
            };
            world
                .solids
                .in_group(SolidGroup::ExitDoor)
                .map(|(id, _)| id)
                .collect()
        }
    }

    fn hold_right() -> InputSnapshot {
        InputSnapshot {
            right: true,
            ..Default::default()
        }
    }

    /// Run frames from `*frame` holding right until `stop` matches an event.
    fn run_until(
        game: &mut Platformer<ArcadeEngine>,
        frame: &mut u32,
        stop: impl Fn(&GameEvent) -> bool,
    ) -> Vec<GameEvent> {
        let mut seen = Vec::new();
        for _ in 0..2000 {
            *frame += 1;
            let events = game
                .update(*frame as f64 * DT as f64, DT, &hold_right())
                .unwrap();
            let done = events.iter().any(&stop);
            seen.extend(events);
            if done {
                break;
            }
        }
        seen
    }

    #[test]
    fn start_enters_a_catalog_level() {
        let game = start(GameMode::Normal, 3);
        assert!(level_ids(3).contains(game.current_level()));
        assert!(game.level().is_some());
        assert!((game.player().hitbox().bottom() - 210.0).abs() < 1e-3);
        assert_eq!(game.remaining_secs(), Some(60.0));
    }

    #[test]
    fn first_update_reports_level_started() {
        let mut game = start(GameMode::Normal, 3);
        let first = game.current_level().clone();
        let events = game.update(0.0, DT, &InputSnapshot::default()).unwrap();
        assert_eq!(events[0], GameEvent::LevelStarted { level: first });
    }

    #[test]
    fn empty_catalog_is_rejected() {
        let mut config = config_with_levels(1, 1);
        config.session.normal_levels = LevelRange { start: 2, end: 1 };
        let err = Platformer::start(
            config,
            HashMap::new(),
            HitboxTable::new(),
            GameMode::Normal,
            Some(CharacterType::Pig),
            ArcadeEngine,
        )
        .err()
        .unwrap();
        assert_eq!(err, PlatformerError::Session(SessionError::EmptyCatalog));
    }

    #[test]
    fn missing_level_data_is_rejected() {
        let err = Platformer::start(
            config_with_levels(2, 1),
            HashMap::new(),
            HitboxTable::new(),
            GameMode::Normal,
            Some(CharacterType::Pig),
            ArcadeEngine,
        )
        .err()
        .unwrap();
        assert!(matches!(err, PlatformerError::Level(LevelError::UnknownLevel(_))));
    }

    #[test]
    fn reaching_the_exit_moves_to_a_different_level() {
        let mut game = start(GameMode::Normal, 3);
        let first = game.current_level().clone();
        let mut frame = 0;
        let events = run_until(&mut game, &mut frame, |e| {
            matches!(e, GameEvent::LevelStarted { level } if *level != first)
        });

        assert!(events.contains(&GameEvent::LevelCompleted {
            level: first.clone(),
            levels_completed: 1,
        }));
        assert_ne!(game.current_level(), &first);
        assert_eq!(game.session().levels_completed(), 1);
        // Back at the new level's start door, standing still.
        assert_eq!(game.player().velocity().x, 0.0);
        assert!(game.player().hitbox().left() < 140.0);
    }

    #[test]
    fn completing_a_level_extends_the_countdown() {
        let mut game = start(GameMode::Normal, 3);
        let mut frame = 0;
        run_until(&mut game, &mut frame, |e| matches!(e, GameEvent::LevelCompleted { .. }));
        let basis = game.session().timer().basis_secs().unwrap();
        assert_eq!(basis, 70.0);
        let remaining = game.remaining_secs().unwrap();
        assert!((remaining - (70.0 - game.elapsed_secs())).abs() < 1e-9);
    }

    #[test]
    fn countdown_expiry_ends_session_once() {
        let mut game = start(GameMode::Normal, 2);
        let mut events = game.update(0.0, DT, &InputSnapshot::default()).unwrap();
        events.extend(game.update(61.0, DT, &InputSnapshot::default()).unwrap());
        events.extend(game.update(62.0, DT, &InputSnapshot::default()).unwrap());
        assert_eq!(session_end_count(&events), 1);
        assert!(game.is_over());
        assert_eq!(game.remaining_secs(), Some(0.0));
        assert!(game.quit().is_none(), "Session already ended");
    }

    #[test]
    fn frames_after_the_end_do_nothing() {
        let mut game = start(GameMode::Speedrun, 2);
        game.update(0.0, DT, &InputSnapshot::default()).unwrap();
        assert!(game.quit().is_some());
        let before = game.player().hitbox();
        let events = game.update(1.0, DT, &hold_right()).unwrap();
        assert!(events.is_empty());
        assert_eq!(game.player().hitbox(), before);
    }

    #[test]
    fn speedrun_ends_when_catalog_is_used_up() {
        let mut game = start(GameMode::Speedrun, 2);
        let mut frame = 0;
        let events = run_until(&mut game, &mut frame, |e| {
            matches!(e, GameEvent::SessionEnded { .. })
        });
        let completed: Vec<&LevelId> = events
            .iter()
            .filter_map(|e| match e {
                GameEvent::LevelCompleted { level, .. } => Some(level),
                _ => None,
            })
            .collect();
        assert_eq!(completed.len(), 2);
        assert_ne!(completed[0], completed[1]);
        assert_eq!(session_end_count(&events), 1);
        assert!(game.is_over());
        assert_eq!(game.remaining_secs(), None);
        let summary = game.summary();
        assert_eq!(summary.levels_completed, 2);
        assert!(summary.average_secs_per_level().unwrap() > 0.0);
    }

    #[test]
    fn manual_respawn_returns_to_start_door() {
        let mut game = start(GameMode::Normal, 1);
        let spawn = game.player().spawn();
        let mut frame = 0;
        for _ in 0..30 {
            frame += 1;
            game.update(frame as f64 * DT as f64, DT, &hold_right()).unwrap();
        }
        assert!(game.player().position().x > spawn.x + 10.0);

        let press = InputSnapshot {
            respawn: true,
            just_respawn: true,
            ..Default::default()
        };
        let events = game.update(1.0, DT, &press).unwrap();
        assert!(events.contains(&GameEvent::Respawned));
        assert_eq!(game.player().velocity(), tilehop_core::math::Vec2::ZERO);
    }

    #[test]
    fn partial_level_map_is_rejected() {
        let err = Platformer::start(
            config_with_levels(3, 1),
            corridor_levels(&level_ids(1)),
            HitboxTable::new(),
            GameMode::Normal,
            None,
            ArcadeEngine,
        )
        .err()
        .unwrap();
        assert_eq!(
            err,
            PlatformerError::Level(LevelError::UnknownLevel(LevelId::new("level2")))
        );
    }

    #[test]
    fn failed_transition_records_nothing() {
        let mut game = Platformer::start(
            config_with_levels(3, 7),
            corridor_levels(&level_ids(3)),
            HitboxTable::new(),
            GameMode::Normal,
            None,
            StandingOnExit,
        )
        .unwrap();
        let first = game.current_level().clone();
        game.levels.retain(|id, _| *id == first);

        // The two other levels are drawn one after the other and both fail.
        for frame in 0..2 {
            let err = game
                .update(frame as f64, DT, &InputSnapshot::default())
                .unwrap_err();
            assert!(matches!(err, LevelError::UnknownLevel(ref id) if *id != first));
            assert_eq!(game.session().levels_completed(), 0);
            assert_eq!(game.session().timer().basis_secs(), Some(60.0));
            assert_eq!(game.current_level(), &first);
        }
    }

    #[test]
    fn configured_character_is_used_when_none_is_picked() {
        let mut config = config_with_levels(1, 3);
        config.character.character = CharacterType::Elephant;
        let game = Platformer::start(
            config,
            corridor_levels(&level_ids(1)),
            HitboxTable::new(),
            GameMode::Normal,
            None,
            ArcadeEngine,
        )
        .unwrap();
        assert_eq!(game.player().profile.kind, CharacterType::Elephant);

        let picked = start(GameMode::Normal, 1);
        assert_eq!(picked.player().profile.kind, CharacterType::Rabbit);
    }
}
