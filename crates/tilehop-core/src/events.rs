use serde::{Deserialize, Serialize};

use crate::session::LevelId;

/// Which side of the player a wall was found on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WallSide {
    Left,
    Right,
}

impl WallSide {
    /// Horizontal direction pointing away from the wall (+1 right, -1 left).
    pub fn away(self) -> f32 {
        match self {
            WallSide::Left => 1.0,
            WallSide::Right => -1.0,
        }
    }
}

/// Severity tiers for a hard landing, ordered from softest to hardest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImpactTier {
    Small,
    Medium,
    Large,
    ExtraLarge,
}

/// Events emitted by the simulation during an update, consumed by the
/// presentation collaborators (particles, sound, HUD, results screen).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// Landed after falling faster than the hard-landing threshold.
    HardLanding {
        tier: ImpactTier,
        tile_index: Option<u32>,
    },
    /// Moving fast along the floor this frame.
    FloorSlideTick { tile_index: Option<u32> },
    /// Sliding down a wall this frame.
    WallSlide { side: WallSide },
    Jumped,
    WallJump {
        side: WallSide,
        tile_index: u32,
    },
    Respawned,
    LevelStarted { level: LevelId },
    LevelCompleted {
        level: LevelId,
        levels_completed: u32,
    },
    SessionEnded {
        total_elapsed_secs: f64,
        levels_completed: u32,
    },
}
