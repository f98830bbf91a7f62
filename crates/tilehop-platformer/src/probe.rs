//! Tile adjacency queries around the player hitbox.
//!
//! The side probe decides wall-jump legality, the bottom probe only feeds
//! cosmetic floor feedback. A miss is `None`, never an error.

use tilehop_core::events::WallSide;
use tilehop_core::math::Rect;

use crate::geometry::{SolidGroup, SolidSet};
use crate::level::{Tile, TileKind, TileLayer};

/// A tile found beside or below the body, and which edge of the body found it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeHit {
    pub tile: Tile,
    pub side: WallSide,
}

/// Find a wall tile just outside the left or right edge of `body`.
///
/// Corners are tried left-top, left-bottom, right-top, right-bottom, each
/// `reach` pixels outside the body. A `CustomSolid` tile only counts when one
/// of its own solids in `custom` overlaps the body's side band, so an empty
/// corner of a partial tile is not a wall. Without a solid set the grid
/// lookup alone decides.
pub fn side_probe(
    body: Rect,
    layer: &TileLayer,
    custom: Option<&SolidSet>,
    reach: f32,
) -> Option<ProbeHit> {
    // Inset the bottom corners by one pixel so they stay in the body's rows.
    let corners = [
        (body.left() - reach, body.top(), WallSide::Left),
        (body.left() - reach, body.bottom() - 1.0, WallSide::Left),
        (body.right() + reach, body.top(), WallSide::Right),
        (body.right() + reach, body.bottom() - 1.0, WallSide::Right),
    ];

    corners.into_iter().find_map(|(x, y, side)| {
        let tile = *layer.tile_at_world(x, y)?;
        if tile.kind == TileKind::CustomSolid {
            if let Some(solids) = custom {
                if !touches_own_solid(body, &tile, solids, reach) {
                    return None;
                }
            }
        }
        Some(ProbeHit { tile, side })
    })
}

/// Find the tile directly under the body's left or right edge, one pixel
/// below its bottom.
pub fn bottom_probe(body: Rect, layer: &TileLayer) -> Option<ProbeHit> {
    let y = body.bottom() + 1.0;
    [(body.left(), WallSide::Left), (body.right(), WallSide::Right)]
        .into_iter()
        .find_map(|(x, side)| {
            layer
                .tile_at_world(x, y)
                .map(|tile| ProbeHit { tile: *tile, side })
        })
}

/// The band is widened sideways by `reach` and trimmed one pixel at the
/// bottom, so solids of the floor row beneath the body never qualify.
fn touches_own_solid(body: Rect, tile: &Tile, solids: &SolidSet, reach: f32) -> bool {
    let band = Rect::new(
        body.left() - reach,
        body.top(),
        body.width + 2.0 * reach,
        body.height - 1.0,
    );
    solids
        .overlap_rect(band, SolidGroup::Wall)
        .into_iter()
        .filter_map(|id| solids.get(id))
        .any(|solid| solid.source == tile.pos)
}
