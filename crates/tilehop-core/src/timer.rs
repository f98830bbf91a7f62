use serde::{Deserialize, Serialize};

use crate::session::GameMode;

/// Final numbers handed to the results screen when a session ends.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub total_elapsed_secs: f64,
    pub levels_completed: u32,
}

impl SessionSummary {
    /// Average seconds per completed level, `None` if nothing was completed.
    pub fn average_secs_per_level(&self) -> Option<f64> {
        (self.levels_completed > 0).then(|| self.total_elapsed_secs / self.levels_completed as f64)
    }
}

/// Game clock for one session.
///
/// Normal mode counts down from a start budget that grows by a bonus per
/// completed level; speedrun mode is a stopwatch. The clock starts on the
/// first `update` of gameplay, and elapsed time never decreases.
#[derive(Debug, Clone)]
pub struct SessionTimer {
    mode: GameMode,
    start_secs: f64,
    bonus_secs: f64,
    started_at: Option<f64>,
    elapsed: f64,
    levels_completed: u32,
    ended: bool,
}

impl SessionTimer {
    pub fn new(mode: GameMode, start_secs: f64, bonus_secs: f64) -> Self {
        Self {
            mode,
            start_secs,
            bonus_secs,
            started_at: None,
            elapsed: 0.0,
            levels_completed: 0,
            ended: false,
        }
    }

    /// Advance the clock to `now` (seconds on the host's monotonic clock).
    ///
    /// Returns the summary exactly once, on the frame a normal-mode countdown
    /// runs out.
    pub fn update(&mut self, now: f64) -> Option<SessionSummary> {
        if self.ended {
            return None;
        }
        let started_at = *self.started_at.get_or_insert(now);
        self.elapsed = self.elapsed.max(now - started_at);

        match self.remaining_secs() {
            Some(remaining) if remaining <= 0.0 => self.end(),
            _ => None,
        }
    }

    /// Count a completed level. In normal mode this extends the countdown.
    pub fn record_level_complete(&mut self) {
        if !self.ended {
            self.levels_completed += 1;
        }
    }

    /// End the session (quit, or catalog exhausted). Returns the summary the
    /// first time only.
    pub fn end(&mut self) -> Option<SessionSummary> {
        if self.ended {
            return None;
        }
        self.ended = true;
        tracing::info!(
            elapsed = self.elapsed,
            levels = self.levels_completed,
            "Session ended"
        );
        Some(self.summary())
    }

    /// Countdown budget before elapsed time is subtracted.
    pub fn basis_secs(&self) -> Option<f64> {
        match self.mode {
            GameMode::Normal => {
                Some(self.start_secs + self.bonus_secs * self.levels_completed as f64)
            },
            GameMode::Speedrun => None,
        }
    }

    pub fn remaining_secs(&self) -> Option<f64> {
        self.basis_secs()
            .map(|basis| (basis - self.elapsed).max(0.0))
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed
    }

    pub fn levels_completed(&self) -> u32 {
        self.levels_completed
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    pub fn is_started(&self) -> bool {
        self.started_at.is_some()
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            total_elapsed_secs: self.elapsed,
            levels_completed: self.levels_completed,
        }
    }
}
