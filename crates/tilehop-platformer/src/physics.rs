//! Boundary between the simulation and the rigid-body engine that moves the
//! player. The engine integrates velocity, applies gravity and drag, resolves
//! blocking collisions and reports contacts; kinematics only reads those
//! results and writes commands back for the next step.

use serde::{Deserialize, Serialize};

use tilehop_core::events::WallSide;
use tilehop_core::math::{Rect, Vec2};

use crate::config::MovementConfig;
use crate::geometry::{SolidId, SolidSet};
use crate::level::TileLayer;

/// Contact flags computed by the engine during the last step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contacts {
    pub on_floor: bool,
    pub on_wall: bool,
    pub blocked_left: bool,
    pub blocked_right: bool,
}

impl Contacts {
    /// Side of the wall the body is pressed against. Left wins if both.
    pub fn wall_side(&self) -> Option<WallSide> {
        if self.blocked_left {
            Some(WallSide::Left)
        } else if self.blocked_right {
            Some(WallSide::Right)
        } else {
            None
        }
    }
}

/// The player's rigid body. `hitbox` is the collision square in world pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlayerBody {
    pub hitbox: Rect,
    pub velocity: Vec2,
    /// Written by kinematics, applied by the engine.
    pub acceleration: Vec2,
    /// Deceleration applied on an axis with no acceleration.
    pub drag: Vec2,
    pub max_velocity: Vec2,
    /// Downward acceleration the engine adds every step (px/s^2).
    pub gravity: f32,
    pub bounce: f32,
    /// Position change produced by the last step.
    pub delta: Vec2,
    pub contacts: Contacts,
}

impl PlayerBody {
    pub fn new(hitbox: Rect, movement: &MovementConfig) -> Self {
        Self {
            hitbox,
            velocity: Vec2::ZERO,
            acceleration: Vec2::ZERO,
            drag: movement.drag,
            max_velocity: movement.max_velocity,
            gravity: movement.gravity,
            bounce: movement.bounce,
            delta: Vec2::ZERO,
            contacts: Contacts::default(),
        }
    }

    /// Teleport without carrying any motion over.
    pub fn reset_at(&mut self, hitbox: Rect) {
        self.hitbox = hitbox;
        self.velocity = Vec2::ZERO;
        self.acceleration = Vec2::ZERO;
        self.delta = Vec2::ZERO;
        self.contacts = Contacts::default();
    }
}

/// Static collision data of the active level as seen by the engine.
#[derive(Debug, Clone, Copy)]
pub struct PhysicsWorld<'a> {
    /// Cells without custom hitboxes collide as full squares.
    pub collision: &'a TileLayer,
    pub solids: &'a SolidSet,
}

pub trait PhysicsEngine {
    /// Advance `body` by `dt` seconds. Returns the overlap-only solids (exit
    /// doors) the body touches after moving.
    fn step(&mut self, body: &mut PlayerBody, world: &PhysicsWorld<'_>, dt: f32) -> Vec<SolidId>;
}
