use serde::{Deserialize, Serialize};

use crate::events::GameEvent;
use crate::sequencer::{LevelSequencer, RefillPolicy};
use crate::timer::{SessionSummary, SessionTimer};

/// Identifier of a playable level (e.g. `"level3"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LevelId(pub String);

impl LevelId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for LevelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Timer mode, fixed for the lifetime of a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    #[default]
    Normal,
    Speedrun,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Normal,
    Hard,
}

/// Errors raised while setting up a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The active difficulty has no levels to play.
    EmptyCatalog,
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyCatalog => write!(f, "level catalog is empty"),
        }
    }
}

impl std::error::Error for SessionError {}

/// Inclusive range of level numbers for one difficulty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelRange {
    pub start: u32,
    pub end: u32,
}

/// Session settings, loadable from the `[session]` table of the game config.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Countdown budget at the start of a normal-mode session.
    pub normal_start_secs: f64,
    /// Seconds added to the countdown per completed level.
    pub level_complete_bonus_secs: f64,
    pub difficulty: Difficulty,
    pub normal_levels: LevelRange,
    pub hard_levels: LevelRange,
    /// Fixed seed for level selection; random when unset.
    pub seed: Option<u64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            normal_start_secs: 60.0,
            level_complete_bonus_secs: 10.0,
            difficulty: Difficulty::Normal,
            normal_levels: LevelRange { start: 1, end: 10 },
            hard_levels: LevelRange { start: 1, end: 2 },
            seed: None,
        }
    }
}

impl SessionConfig {
    /// Level ids for the configured difficulty, `level{n}` for each n in range.
    pub fn catalog(&self) -> Vec<LevelId> {
        let range = match self.difficulty {
            Difficulty::Normal => self.normal_levels,
            Difficulty::Hard => self.hard_levels,
        };
        (range.start..=range.end)
            .map(|n| LevelId::new(format!("level{n}")))
            .collect()
    }
}

/// State for one play-through, from the first level to game over.
///
/// Passed by reference into the components that need it; dropped when the
/// session ends.
#[derive(Debug, Clone)]
pub struct SessionContext {
    difficulty: Difficulty,
    sequencer: LevelSequencer,
    timer: SessionTimer,
    current_level: Option<LevelId>,
}

impl SessionContext {
    pub fn start(
        mode: GameMode,
        catalog: Vec<LevelId>,
        config: &SessionConfig,
    ) -> Result<Self, SessionError> {
        let policy = match mode {
            GameMode::Normal => RefillPolicy::Loop,
            GameMode::Speedrun => RefillPolicy::Once,
        };
        let seed = config.seed.unwrap_or_else(rand::random);
        let sequencer = LevelSequencer::new(catalog, policy, seed)?;
        tracing::info!(
            ?mode,
            difficulty = ?config.difficulty,
            levels = sequencer.catalog().len(),
            "Session started"
        );
        Ok(Self {
            difficulty: config.difficulty,
            sequencer,
            timer: SessionTimer::new(
                mode,
                config.normal_start_secs,
                config.level_complete_bonus_secs,
            ),
            current_level: None,
        })
    }

    /// Choose the level to play next. `None` means the catalog is used up
    /// (speedrun) and the session should end.
    pub fn next_level(&mut self) -> Option<LevelId> {
        let next = self.sequencer.pick_next(true);
        if let Some(id) = &next {
            tracing::debug!(level = %id, "Next level selected");
        }
        self.current_level = next.clone();
        next
    }

    /// Record that the current level was finished. Returns the new total.
    pub fn complete_level(&mut self) -> u32 {
        self.timer.record_level_complete();
        self.timer.levels_completed()
    }

    /// Advance the clock; yields `SessionEnded` when the countdown runs out.
    pub fn tick(&mut self, now: f64) -> Option<GameEvent> {
        self.timer.update(now).map(ended_event)
    }

    /// End the session on request (player quit, or no levels left).
    pub fn finish(&mut self) -> Option<GameEvent> {
        self.timer.end().map(ended_event)
    }

    pub fn mode(&self) -> GameMode {
        self.timer.mode()
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn current_level(&self) -> Option<&LevelId> {
        self.current_level.as_ref()
    }

    pub fn levels_completed(&self) -> u32 {
        self.timer.levels_completed()
    }

    pub fn remaining_secs(&self) -> Option<f64> {
        self.timer.remaining_secs()
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.timer.elapsed_secs()
    }

    pub fn is_over(&self) -> bool {
        self.timer.is_ended()
    }

    pub fn summary(&self) -> SessionSummary {
        self.timer.summary()
    }

    pub fn timer(&self) -> &SessionTimer {
        &self.timer
    }

    pub fn sequencer(&self) -> &LevelSequencer {
        &self.sequencer
    }
}

fn ended_event(summary: SessionSummary) -> GameEvent {
    GameEvent::SessionEnded {
        total_elapsed_secs: summary.total_elapsed_secs,
        levels_completed: summary.levels_completed,
    }
}
