//! Turns per-tile custom hitboxes into world-space solid rectangles.
//!
//! Tiles without custom hitboxes keep the physics engine's full-square
//! collision; only the exceptions become [`SolidBody`] entries here.

use serde::{Deserialize, Serialize};

use tilehop_core::math::{Rect, Vec2};
use tilehop_core::session::LevelId;

use crate::level::{
    CustomHitbox, HitboxTable, Level, LevelError, Tile, TileLayer, TilePos, TileRotation,
};

/// Handle to a solid inside a [`SolidSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SolidId(pub usize);

/// Logical group a solid belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolidGroup {
    /// Blocking level geometry.
    Wall,
    /// Overlap-only trigger that completes the level.
    ExitDoor,
}

/// World-space rectangle derived from one tile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolidBody {
    pub rect: Rect,
    pub group: SolidGroup,
    pub source: TilePos,
    pub tile_index: u32,
}

/// World rectangle for `hitbox` placed on `tile`.
///
/// A half-turned tile mirrors the hitbox vertically inside the tile; the
/// horizontal offset and the size are unchanged.
pub fn hitbox_rect(tile: &Tile, hitbox: &CustomHitbox, tile_size: Vec2) -> Rect {
    let origin = Vec2::new(
        tile.pos.column as f32 * tile_size.x,
        tile.pos.row as f32 * tile_size.y,
    );
    let local_y = match tile.rotation {
        TileRotation::None => hitbox.y,
        TileRotation::Half => tile_size.y - (hitbox.y + hitbox.height),
    };
    Rect::new(hitbox.x, local_y, hitbox.width, hitbox.height).translated(origin)
}

/// One solid per registered hitbox of every tile in `layer` whose type has
/// custom hitboxes.
pub fn extract(layer: &TileLayer, hitboxes: &HitboxTable, group: SolidGroup) -> Vec<SolidBody> {
    let tile_size = Vec2::new(layer.tile_width, layer.tile_height);
    layer
        .tiles()
        .flat_map(|tile| {
            hitboxes.get(tile.index).iter().map(move |hb| SolidBody {
                rect: hitbox_rect(tile, hb, tile_size),
                group,
                source: tile.pos,
                tile_index: tile.index,
            })
        })
        .collect()
}

/// The solids of the active level.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SolidSet {
    bodies: Vec<SolidBody>,
}

impl SolidSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend(&mut self, solids: impl IntoIterator<Item = SolidBody>) {
        self.bodies.extend(solids);
    }

    pub fn get(&self, id: SolidId) -> Option<&SolidBody> {
        self.bodies.get(id.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (SolidId, &SolidBody)> {
        self.bodies.iter().enumerate().map(|(i, b)| (SolidId(i), b))
    }

    pub fn in_group(&self, group: SolidGroup) -> impl Iterator<Item = (SolidId, &SolidBody)> {
        self.iter().filter(move |(_, b)| b.group == group)
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// Solids of `group` whose rectangle strictly overlaps `rect`.
    pub fn overlap_rect(&self, rect: Rect, group: SolidGroup) -> Vec<SolidId> {
        self.in_group(group)
            .filter(|(_, b)| b.rect.intersects(&rect))
            .map(|(id, _)| id)
            .collect()
    }
}

/// Everything derived from a level that the simulation needs each frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelGeometry {
    pub level: LevelId,
    pub solids: SolidSet,
    /// Centre of the start-door tile.
    pub spawn_point: Vec2,
    pub width_px: f32,
    pub height_px: f32,
}

impl LevelGeometry {
    pub fn build(level: &Level, hitboxes: &HitboxTable) -> Result<Self, LevelError> {
        let start = level
            .start_door()
            .ok_or_else(|| LevelError::MissingStartDoor(level.id.clone()))?;
        if level.exit_doors.tiles().next().is_none() {
            return Err(LevelError::MissingExitDoor(level.id.clone()));
        }

        let mut solids = SolidSet::new();
        solids.extend(extract(&level.collision, hitboxes, SolidGroup::Wall));

        let doors = &level.exit_doors;
        let door_size = Vec2::new(doors.tile_width, doors.tile_height);
        solids.extend(doors.tiles().flat_map(|tile| {
            let custom = hitboxes.get(tile.index);
            let rects: Vec<Rect> = if custom.is_empty() {
                vec![doors.tile_rect(tile.pos)]
            } else {
                custom
                    .iter()
                    .map(|hb| hitbox_rect(tile, hb, door_size))
                    .collect()
            };
            rects.into_iter().map(move |rect| SolidBody {
                rect,
                group: SolidGroup::ExitDoor,
                source: tile.pos,
                tile_index: tile.index,
            })
        }));

        let spawn_point = level.start_doors.tile_rect(start.pos).center();
        tracing::debug!(
            level = %level.id,
            walls = solids.in_group(SolidGroup::Wall).count(),
            doors = solids.in_group(SolidGroup::ExitDoor).count(),
            "Built level geometry"
        );

        Ok(Self {
            level: level.id.clone(),
            solids,
            spawn_point,
            width_px: level.width_in_pixels(),
            height_px: level.height_in_pixels(),
        })
    }
}
