//! Small arcade-style [`PhysicsEngine`] for driving the simulation without a
//! real engine: gravity, acceleration, drag, a velocity cap and
//! axis-separated push-out against tiles and wall solids.

use tilehop_core::math::{Rect, Vec2};

use crate::geometry::{SolidGroup, SolidId};
use crate::level::TileKind;
use crate::physics::{Contacts, PhysicsEngine, PhysicsWorld, PlayerBody};

/// Stateless; gravity and the other tuning come from the body.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArcadeEngine;

impl PhysicsEngine for ArcadeEngine {
    fn step(&mut self, body: &mut PlayerBody, world: &PhysicsWorld<'_>, dt: f32) -> Vec<SolidId> {
        if !dt.is_finite() || dt <= 0.0 {
            return world.solids.overlap_rect(body.hitbox, SolidGroup::ExitDoor);
        }

        let max = body.max_velocity;
        let vx = integrate(body.velocity.x, body.acceleration.x, body.drag.x, dt);
        let vy = integrate(
            body.velocity.y,
            body.acceleration.y + body.gravity,
            body.drag.y,
            dt,
        );
        body.velocity = Vec2::new(
            sanitize(vx).clamp(-max.x.abs(), max.x.abs()),
            sanitize(vy).clamp(-max.y.abs(), max.y.abs()),
        );

        let start = Vec2::new(body.hitbox.x, body.hitbox.y);
        let mut contacts = Contacts::default();

        // Move and resolve one axis at a time.
        body.hitbox.x += body.velocity.x * dt;
        resolve_x(body, world, &mut contacts);
        body.hitbox.y += body.velocity.y * dt;
        resolve_y(body, world, &mut contacts);

        contacts.on_wall = contacts.blocked_left || contacts.blocked_right;
        body.contacts = contacts;
        body.delta = Vec2::new(body.hitbox.x, body.hitbox.y) - start;

        world.solids.overlap_rect(body.hitbox, SolidGroup::ExitDoor)
    }
}

/// Apply acceleration, or drag toward rest when there is none.
fn integrate(v: f32, accel: f32, drag: f32, dt: f32) -> f32 {
    if accel != 0.0 {
        v + accel * dt
    } else if drag != 0.0 {
        let slow = drag.abs() * dt;
        if v.abs() <= slow { 0.0 } else { v - slow * v.signum() }
    } else {
        v
    }
}

fn sanitize(v: f32) -> f32 {
    if v.is_finite() { v } else { 0.0 }
}

/// Blocking rectangles overlapping `rect`: full squares for default tiles,
/// derived rectangles for custom ones.
fn blockers(world: &PhysicsWorld<'_>, rect: Rect) -> Vec<Rect> {
    let layer = world.collision;
    let min_c = (rect.left() / layer.tile_width).floor() as i32;
    let max_c = (rect.right() / layer.tile_width).ceil() as i32;
    let min_r = (rect.top() / layer.tile_height).floor() as i32;
    let max_r = (rect.bottom() / layer.tile_height).ceil() as i32;

    let mut out = Vec::new();
    for row in min_r..max_r {
        for column in min_c..max_c {
            let Some(tile) = layer.tile_at(column, row) else {
                continue;
            };
            if tile.kind != TileKind::Default {
                continue;
            }
            let cell = layer.tile_rect(tile.pos);
            if cell.intersects(&rect) {
                out.push(cell);
            }
        }
    }
    out.extend(
        world
            .solids
            .in_group(SolidGroup::Wall)
            .map(|(_, s)| s.rect)
            .filter(|r| r.intersects(&rect)),
    );
    out
}

fn resolve_x(body: &mut PlayerBody, world: &PhysicsWorld<'_>, contacts: &mut Contacts) {
    let hits = blockers(world, body.hitbox);
    if hits.is_empty() || body.velocity.x == 0.0 {
        return;
    }
    if body.velocity.x > 0.0 {
        let wall = hits.iter().map(|r| r.left()).fold(f32::INFINITY, f32::min);
        body.hitbox.x = wall - body.hitbox.width;
        contacts.blocked_right = true;
    } else {
        let wall = hits.iter().map(|r| r.right()).fold(f32::NEG_INFINITY, f32::max);
        body.hitbox.x = wall;
        contacts.blocked_left = true;
    }
    body.velocity.x = -body.velocity.x * body.bounce;
}

fn resolve_y(body: &mut PlayerBody, world: &PhysicsWorld<'_>, contacts: &mut Contacts) {
    let hits = blockers(world, body.hitbox);
    if hits.is_empty() || body.velocity.y == 0.0 {
        return;
    }
    if body.velocity.y > 0.0 {
        let floor = hits.iter().map(|r| r.top()).fold(f32::INFINITY, f32::min);
        body.hitbox.y = floor - body.hitbox.height;
        contacts.on_floor = true;
    } else {
        let ceiling = hits.iter().map(|r| r.bottom()).fold(f32::NEG_INFINITY, f32::max);
        body.hitbox.y = ceiling;
    }
    body.velocity.y = -body.velocity.y * body.bounce;
}
