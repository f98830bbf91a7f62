use serde::{Deserialize, Serialize};

use tilehop_core::math::Vec2;
use tilehop_core::session::SessionConfig;

use crate::character::CharacterType;

/// Horizontal acceleration while a direction is held (px/s^2).
pub const ACCELERATION: f32 = 1000.0;
/// Upward velocity applied when jumping off the floor (px/s).
pub const JUMP_VELOCITY: f32 = 560.0;
/// Velocity applied away from and up off a wall when wall jumping (px/s).
pub const WALL_JUMP_VELOCITY: Vec2 = Vec2::new(800.0, 560.0);
/// Per-frame scale applied to downward velocity while pressed against a wall.
pub const WALL_SLIDE_MULTIPLIER: f32 = 0.9;
/// Per-axis speed cap (px/s).
pub const MAX_VELOCITY: Vec2 = Vec2::new(1000.0, 900.0);
/// Speed-proportional friction coefficient while a direction is held.
pub const FRICTION: f32 = 4.0;
/// Deceleration applied by the physics engine when no direction is held.
pub const DRAG: Vec2 = Vec2::new(800.0, 0.0);
/// Downward gravity carried on the player body for the engine (px/s^2).
pub const GRAVITY: f32 = 1000.0;

/// Movement tuning shared by every character type.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementConfig {
    pub acceleration: f32,
    pub jump_velocity: f32,
    pub wall_jump_velocity: Vec2,
    pub wall_slide_multiplier: f32,
    pub max_velocity: Vec2,
    pub friction: f32,
    pub drag: Vec2,
    pub bounce: f32,
    pub gravity: f32,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            acceleration: ACCELERATION,
            jump_velocity: JUMP_VELOCITY,
            wall_jump_velocity: WALL_JUMP_VELOCITY,
            wall_slide_multiplier: WALL_SLIDE_MULTIPLIER,
            max_velocity: MAX_VELOCITY,
            friction: FRICTION,
            drag: DRAG,
            bounce: 0.0,
            gravity: GRAVITY,
        }
    }
}

impl MovementConfig {
    /// Top speed reached when holding a direction on flat ground, where the
    /// speed-proportional friction cancels the acceleration.
    pub fn terminal_run_speed(&self) -> f32 {
        self.acceleration / self.friction
    }
}

/// Thresholds for the cosmetic feedback events.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedbackConfig {
    /// Fraction of terminal run speed above which floor friction particles start.
    pub friction_particle_threshold: f32,
    /// Downward speed on the previous frame needed to count a landing as hard.
    pub hard_landing_min: f32,
    /// Upper bounds (exclusive) for the small, medium and large impact tiers.
    pub impact_tiers: [f32; 3],
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            friction_particle_threshold: 0.8,
            hard_landing_min: 500.0,
            impact_tiers: [520.0, 640.0, 740.0],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TileConfig {
    /// How far outside the hitbox the side probe looks for a wall tile.
    pub probe_reach: f32,
    /// Gap left between the hitbox and the level edge after a world clamp.
    pub world_clamp_margin: f32,
}

impl Default for TileConfig {
    fn default() -> Self {
        Self {
            probe_reach: 1.0,
            world_clamp_margin: 3.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CharacterConfig {
    pub character: CharacterType,
    /// Render scale applied to the character art and hitbox.
    pub scale: f32,
    /// Side length of the square hitbox in unscaled art pixels.
    pub square_size: f32,
}

impl Default for CharacterConfig {
    fn default() -> Self {
        Self {
            character: CharacterType::Rabbit,
            scale: 0.25,
            square_size: 256.0,
        }
    }
}

/// Top-level game configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformerConfig {
    pub movement: MovementConfig,
    pub feedback: FeedbackConfig,
    pub tiles: TileConfig,
    pub character: CharacterConfig,
    pub session: SessionConfig,
}

impl PlatformerConfig {
    /// Load config from the TOML file named by `TILEHOP_CONFIG`, else
    /// `config/tilehop.toml`. Falls back to defaults if the file is missing
    /// or unparseable.
    pub fn load() -> Self {
        let path =
            std::env::var("TILEHOP_CONFIG").unwrap_or_else(|_| "config/tilehop.toml".to_string());
        match std::fs::read_to_string(&path) {
            Ok(content) => Self::from_toml(&content).unwrap_or_else(|e| {
                tracing::warn!("Failed to parse {path}: {e}, using defaults");
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}
