//! Per-frame player control on top of the physics engine's contact results.

use serde::{Deserialize, Serialize};

use tilehop_core::events::{GameEvent, ImpactTier};
use tilehop_core::math::{Rect, Vec2};

use crate::character::CharacterProfile;
use crate::config::{FeedbackConfig, MovementConfig, PlatformerConfig, TileConfig};
use crate::geometry::{LevelGeometry, SolidSet};
use crate::level::{Level, TileLayer};
use crate::physics::PlayerBody;
use crate::probe::{bottom_probe, side_probe};

/// Input sampled once per frame. `just_*` fields are rising edges.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputSnapshot {
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub just_up: bool,
    pub respawn: bool,
    pub just_respawn: bool,
}

/// Level data the player reacts to during a frame.
#[derive(Debug, Clone, Copy)]
pub struct Surroundings<'a> {
    pub collision: &'a TileLayer,
    pub solids: &'a SolidSet,
    pub width_px: f32,
    pub height_px: f32,
}

impl<'a> Surroundings<'a> {
    pub fn new(level: &'a Level, geometry: &'a LevelGeometry) -> Self {
        Self {
            collision: &level.collision,
            solids: &geometry.solids,
            width_px: geometry.width_px,
            height_px: geometry.height_px,
        }
    }
}

/// Severity of a landing at downward speed `speed`, given the exclusive
/// upper bounds of the small, medium and large tiers.
pub fn impact_tier(speed: f32, bounds: [f32; 3]) -> ImpactTier {
    if speed < bounds[0] {
        ImpactTier::Small
    } else if speed < bounds[1] {
        ImpactTier::Medium
    } else if speed < bounds[2] {
        ImpactTier::Large
    } else {
        ImpactTier::ExtraLarge
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerState {
    pub body: PlayerBody,
    pub profile: CharacterProfile,
    movement: MovementConfig,
    feedback: FeedbackConfig,
    tiles: TileConfig,
    /// Sprite centre the player returns to on respawn.
    spawn: Vec2,
    /// Vertical velocity at the end of the previous update.
    last_velocity_y: f32,
}

impl PlayerState {
    /// Create a player standing still with its sprite centred at `spawn`.
    pub fn new(profile: CharacterProfile, config: &PlatformerConfig, spawn: Vec2) -> Self {
        Self {
            body: PlayerBody::new(profile.hitbox(spawn), &config.movement),
            profile,
            movement: config.movement.clone(),
            feedback: config.feedback.clone(),
            tiles: config.tiles.clone(),
            spawn,
            last_velocity_y: 0.0,
        }
    }

    /// Sprite centre in world pixels.
    pub fn position(&self) -> Vec2 {
        self.profile.sprite_center_for(self.body.hitbox.center())
    }

    pub fn set_position(&mut self, sprite_center: Vec2) {
        self.body.hitbox = self.profile.hitbox(sprite_center);
    }

    pub fn hitbox(&self) -> Rect {
        self.body.hitbox
    }

    pub fn velocity(&self) -> Vec2 {
        self.body.velocity
    }

    pub fn spawn(&self) -> Vec2 {
        self.spawn
    }

    pub fn last_velocity_y(&self) -> f32 {
        self.last_velocity_y
    }

    /// Move to a new level's spawn point with no motion carried over.
    pub fn place_at_spawn(&mut self, spawn: Vec2) {
        self.spawn = spawn;
        self.body.reset_at(self.profile.hitbox(spawn));
        self.last_velocity_y = 0.0;
    }

    /// Return to the spawn point. The last step's movement is subtracted so
    /// the next engine step lands the sprite exactly on the spawn point.
    pub fn respawn(&mut self) {
        let target = self.spawn - self.body.delta;
        self.body.hitbox = self.profile.hitbox(target);
        self.body.velocity = Vec2::ZERO;
        self.body.acceleration = Vec2::ZERO;
        self.last_velocity_y = 0.0;
        tracing::debug!(x = target.x, y = target.y, "Player respawned");
    }

    /// Run one frame of player control. Must be called after the engine has
    /// stepped the body; writes take effect on the engine's next step.
    pub fn update(&mut self, input: &InputSnapshot, world: &Surroundings<'_>) -> Vec<GameEvent> {
        let mut events = Vec::new();
        let contacts = self.body.contacts;
        let hitbox = self.body.hitbox;
        let m = &self.movement;

        // Floor friction feedback
        let slide_speed = self.feedback.friction_particle_threshold * m.terminal_run_speed();
        if contacts.on_floor && self.body.velocity.x.abs() > slide_speed {
            events.push(GameEvent::FloorSlideTick {
                tile_index: bottom_probe(hitbox, world.collision).map(|hit| hit.tile.index),
            });
        }

        // Hard landing
        if contacts.on_floor && self.last_velocity_y > self.feedback.hard_landing_min {
            let tier = impact_tier(self.last_velocity_y, self.feedback.impact_tiers);
            events.push(GameEvent::HardLanding {
                tier,
                tile_index: bottom_probe(hitbox, world.collision).map(|hit| hit.tile.index),
            });
        }

        // Wall slide
        if contacts.on_wall && self.body.velocity.y > 0.0 {
            self.body.velocity.y *= m.wall_slide_multiplier;
            if let Some(side) = contacts.wall_side() {
                events.push(GameEvent::WallSlide { side });
            }
        }

        // Horizontal control. Friction opposes the current speed.
        let push = if input.left {
            -m.acceleration
        } else if input.right {
            m.acceleration
        } else {
            0.0
        };
        self.body.acceleration.x = if push != 0.0 {
            push - self.body.velocity.x * m.friction
        } else {
            0.0
        };

        if input.up && contacts.on_floor {
            self.body.velocity.y = -m.jump_velocity;
            events.push(GameEvent::Jumped);
        }

        if input.just_up && !contacts.on_floor {
            let probe = side_probe(
                hitbox,
                world.collision,
                Some(world.solids),
                self.tiles.probe_reach,
            );
            if let Some(hit) = probe {
                self.body.velocity.x = hit.side.away() * m.wall_jump_velocity.x;
                self.body.velocity.y = -m.wall_jump_velocity.y;
                tracing::trace!(side = ?hit.side, tile = hit.tile.index, "Wall jump");
                events.push(GameEvent::WallJump {
                    side: hit.side,
                    tile_index: hit.tile.index,
                });
            }
        }

        self.clamp_to_world(world.width_px);

        if input.just_respawn || self.body.hitbox.top() > world.height_px {
            self.respawn();
            events.push(GameEvent::Respawned);
        }

        let max = self.movement.max_velocity;
        self.body.velocity = Vec2::new(
            self.body.velocity.x.clamp(-max.x.abs(), max.x.abs()),
            self.body.velocity.y.clamp(-max.y.abs(), max.y.abs()),
        );
        self.last_velocity_y = self.body.velocity.y;
        events
    }

    /// Pull the player back when it has left the level sideways.
    ///
    /// The sprite bounds trimmed by the body offsets are exactly the hitbox,
    /// so the hitbox edges are tested rather than the art, which overhangs
    /// unevenly per character.
    fn clamp_to_world(&mut self, width_px: f32) {
        let margin = self.tiles.world_clamp_margin;
        let hb = &mut self.body.hitbox;
        if hb.right() < 0.0 {
            hb.x = margin;
        } else if hb.left() > width_px {
            hb.x = width_px - margin - hb.width;
        } else {
            return;
        }
        self.body.velocity.x = 0.0;
    }
}
