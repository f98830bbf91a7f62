use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use tilehop_core::math::{Rect, Vec2};
use tilehop_core::session::LevelId;

/// Tiled gid flag bits.
pub const FLIP_HORIZONTAL: u32 = 0x8000_0000;
pub const FLIP_VERTICAL: u32 = 0x4000_0000;
pub const FLIP_DIAGONAL: u32 = 0x2000_0000;
const GID_MASK: u32 = !(FLIP_HORIZONTAL | FLIP_VERTICAL | FLIP_DIAGONAL);

pub const COLLISION_LAYER: &str = "Colliders";
pub const START_DOOR_LAYER: &str = "StartDoor";
pub const EXIT_DOOR_LAYER: &str = "ExitDoor";

/// Errors that abort loading or building a level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LevelError {
    Io(String),
    Parse(String),
    MissingLayer {
        level: LevelId,
        layer: String,
    },
    LayerSizeMismatch {
        level: LevelId,
        layer: String,
        expected: usize,
        actual: usize,
    },
    MissingStartDoor(LevelId),
    MissingExitDoor(LevelId),
    UnknownLevel(LevelId),
}

impl std::fmt::Display for LevelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(m) | Self::Parse(m) => write!(f, "{m}"),
            Self::MissingLayer { level, layer } => {
                write!(f, "level {level} has no `{layer}` layer")
            },
            Self::LayerSizeMismatch {
                level,
                layer,
                expected,
                actual,
            } => write!(
                f,
                "layer `{layer}` of level {level} has {actual} cells, expected {expected}"
            ),
            Self::MissingStartDoor(level) => write!(f, "level {level} has no start door"),
            Self::MissingExitDoor(level) => write!(f, "level {level} has no exit door"),
            Self::UnknownLevel(level) => write!(f, "level {level} is not loaded"),
        }
    }
}

impl std::error::Error for LevelError {}

/// Tile orientation. Level art only ever flips vertically.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TileRotation {
    #[default]
    None,
    Half,
}

/// How a tile takes part in collision, resolved when the level is built.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TileKind {
    /// Full-square collision handled by the physics engine.
    #[default]
    Default,
    /// Collides only through its derived hitbox rectangles.
    CustomSolid,
    /// Overlap-only (exit doors).
    Trigger,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TilePos {
    pub column: u32,
    pub row: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    pub pos: TilePos,
    /// Tileset index (visual and behavioural type).
    pub index: u32,
    pub rotation: TileRotation,
    pub kind: TileKind,
}

/// Designer-authored collision rectangle inside a tile, in tile-local pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CustomHitbox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Custom hitboxes keyed by tile index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HitboxTable {
    by_tile: HashMap<u32, Vec<CustomHitbox>>,
}

#[derive(Debug, Clone, Deserialize)]
struct HitboxEntry {
    tile: u32,
    x: f32,
    y: f32,
    width: f32,
    height: f32,
}

#[derive(Debug, Clone, Deserialize)]
struct HitboxDocument {
    hitboxes: Vec<HitboxEntry>,
}

impl HitboxTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tile_index: u32, hitbox: CustomHitbox) {
        self.by_tile.entry(tile_index).or_default().push(hitbox);
    }

    pub fn get(&self, tile_index: u32) -> &[CustomHitbox] {
        self.by_tile
            .get(&tile_index)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn is_custom(&self, tile_index: u32) -> bool {
        !self.get(tile_index).is_empty()
    }

    /// Parse a tileset hitbox document: `{"hitboxes": [{tile, x, y, width, height}]}`.
    pub fn from_json(json: &str) -> Result<Self, LevelError> {
        let doc: HitboxDocument =
            serde_json::from_str(json).map_err(|e| LevelError::Parse(e.to_string()))?;
        let mut table = Self::new();
        for e in doc.hitboxes {
            table.register(
                e.tile,
                CustomHitbox {
                    x: e.x,
                    y: e.y,
                    width: e.width,
                    height: e.height,
                },
            );
        }
        Ok(table)
    }
}

/// A grid of tiles stored row-major (row * width + column).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileLayer {
    pub name: String,
    /// Width in tiles.
    pub width: u32,
    /// Height in tiles.
    pub height: u32,
    pub tile_width: f32,
    pub tile_height: f32,
    cells: Vec<Option<Tile>>,
}

impl TileLayer {
    /// Build a layer from Tiled-style gids (0 = empty). Tile kinds start as
    /// `Default`. `None` if `gids` does not cover the grid exactly or the grid
    /// is too large to address.
    pub fn from_gids(
        name: impl Into<String>,
        width: u32,
        height: u32,
        tile_size: Vec2,
        gids: &[u32],
    ) -> Option<Self> {
        let cell_count = width.checked_mul(height)?;
        if gids.len() != cell_count as usize {
            return None;
        }
        let cells = gids
            .iter()
            .enumerate()
            .map(|(i, &gid)| {
                let index = gid & GID_MASK;
                (index != 0).then(|| Tile {
                    pos: TilePos {
                        column: i as u32 % width,
                        row: i as u32 / width,
                    },
                    index,
                    rotation: if gid & FLIP_VERTICAL != 0 {
                        TileRotation::Half
                    } else {
                        TileRotation::None
                    },
                    kind: TileKind::Default,
                })
            })
            .collect();
        Some(Self {
            name: name.into(),
            width,
            height,
            tile_width: tile_size.x,
            tile_height: tile_size.y,
            cells,
        })
    }

    pub fn tile_at(&self, column: i32, row: i32) -> Option<&Tile> {
        if column < 0 || row < 0 || column >= self.width as i32 || row >= self.height as i32 {
            return None;
        }
        self.cells
            .get(row as usize * self.width as usize + column as usize)
            .and_then(Option::as_ref)
    }

    /// Tile covering the world point, if any.
    pub fn tile_at_world(&self, x: f32, y: f32) -> Option<&Tile> {
        if !x.is_finite() || !y.is_finite() {
            return None;
        }
        let column = (x / self.tile_width).floor() as i32;
        let row = (y / self.tile_height).floor() as i32;
        self.tile_at(column, row)
    }

    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.cells.iter().flatten()
    }

    /// World-space square covered by the tile at `pos`.
    pub fn tile_rect(&self, pos: TilePos) -> Rect {
        Rect::new(
            pos.column as f32 * self.tile_width,
            pos.row as f32 * self.tile_height,
            self.tile_width,
            self.tile_height,
        )
    }

    pub fn width_in_pixels(&self) -> f32 {
        self.width as f32 * self.tile_width
    }

    pub fn height_in_pixels(&self) -> f32 {
        self.height as f32 * self.tile_height
    }

    fn assign_kinds(&mut self, kind_of: impl Fn(&Tile) -> TileKind) {
        for tile in self.cells.iter_mut().flatten() {
            tile.kind = kind_of(tile);
        }
    }
}

/// JSON level file as exported from the map editor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelDocument {
    pub width: u32,
    pub height: u32,
    pub tilewidth: f32,
    pub tileheight: f32,
    pub layers: Vec<LayerDocument>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerDocument {
    pub name: String,
    pub data: Vec<u32>,
}

/// A loaded level. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Level {
    pub id: LevelId,
    /// Width in tiles.
    pub width: u32,
    /// Height in tiles.
    pub height: u32,
    pub collision: TileLayer,
    pub decoration: Vec<TileLayer>,
    pub start_doors: TileLayer,
    pub exit_doors: TileLayer,
}

impl Level {
    /// Assemble a level, resolving tile kinds against `hitboxes` and checking
    /// that it can be played (has a start door and an exit door).
    pub fn new(
        id: LevelId,
        mut collision: TileLayer,
        decoration: Vec<TileLayer>,
        start_doors: TileLayer,
        mut exit_doors: TileLayer,
        hitboxes: &HitboxTable,
    ) -> Result<Self, LevelError> {
        if start_doors.tiles().next().is_none() {
            return Err(LevelError::MissingStartDoor(id));
        }
        if exit_doors.tiles().next().is_none() {
            return Err(LevelError::MissingExitDoor(id));
        }
        collision.assign_kinds(|t| {
            if hitboxes.is_custom(t.index) {
                TileKind::CustomSolid
            } else {
                TileKind::Default
            }
        });
        exit_doors.assign_kinds(|_| TileKind::Trigger);
        Ok(Self {
            id,
            width: collision.width,
            height: collision.height,
            collision,
            decoration,
            start_doors,
            exit_doors,
        })
    }

    pub fn from_document(
        id: LevelId,
        doc: LevelDocument,
        hitboxes: &HitboxTable,
    ) -> Result<Self, LevelError> {
        let tile_size = Vec2::new(doc.tilewidth, doc.tileheight);
        let expected = (doc.width as usize).saturating_mul(doc.height as usize);

        let mut collision = None;
        let mut start_doors = None;
        let mut exit_doors = None;
        let mut decoration = Vec::new();
        for layer in doc.layers {
            let built =
                TileLayer::from_gids(&layer.name, doc.width, doc.height, tile_size, &layer.data)
                    .ok_or_else(|| LevelError::LayerSizeMismatch {
                        level: id.clone(),
                        layer: layer.name.clone(),
                        expected,
                        actual: layer.data.len(),
                    })?;
            match layer.name.as_str() {
                COLLISION_LAYER => collision = Some(built),
                START_DOOR_LAYER => start_doors = Some(built),
                EXIT_DOOR_LAYER => exit_doors = Some(built),
                _ => decoration.push(built),
            }
        }

        let missing = |layer: &str| LevelError::MissingLayer {
            level: id.clone(),
            layer: layer.to_string(),
        };
        let collision = collision.ok_or_else(|| missing(COLLISION_LAYER))?;
        let start_doors = start_doors.ok_or_else(|| missing(START_DOOR_LAYER))?;
        let exit_doors = exit_doors.ok_or_else(|| missing(EXIT_DOOR_LAYER))?;

        Self::new(id, collision, decoration, start_doors, exit_doors, hitboxes)
    }

    pub fn from_json(id: LevelId, json: &str, hitboxes: &HitboxTable) -> Result<Self, LevelError> {
        let doc: LevelDocument = serde_json::from_str(json)
            .map_err(|e| LevelError::Parse(format!("level {id}: {e}")))?;
        Self::from_document(id, doc, hitboxes)
    }

    /// First start-door tile in row-major order.
    pub fn start_door(&self) -> Option<&Tile> {
        self.start_doors.tiles().next()
    }

    pub fn tile_width(&self) -> f32 {
        self.collision.tile_width
    }

    pub fn tile_height(&self) -> f32 {
        self.collision.tile_height
    }

    pub fn width_in_pixels(&self) -> f32 {
        self.collision.width_in_pixels()
    }

    pub fn height_in_pixels(&self) -> f32 {
        self.collision.height_in_pixels()
    }
}

/// Load `{dir}/{id}.json`.
pub fn load_level_from_file(
    dir: &str,
    id: &LevelId,
    hitboxes: &HitboxTable,
) -> Result<Level, LevelError> {
    let path = format!("{dir}/{id}.json");
    let content = std::fs::read_to_string(&path)
        .map_err(|e| LevelError::Io(format!("failed to read {path}: {e}")))?;
    let level = Level::from_json(id.clone(), &content, hitboxes);
    if let Err(e) = &level {
        tracing::warn!("Rejected level {path}: {e}");
    }
    level
}

/// Load every level in `ids` from `dir`. The first failure aborts loading.
pub fn load_levels(
    dir: &str,
    ids: &[LevelId],
    hitboxes: &HitboxTable,
) -> Result<HashMap<LevelId, Level>, LevelError> {
    ids.iter()
        .map(|id| load_level_from_file(dir, id, hitboxes).map(|level| (id.clone(), level)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const T: Vec2 = Vec2::new(70.0, 70.0);

    fn layer(name: &str, w: u32, h: u32, placed: &[(u32, u32, u32)]) -> TileLayer {
        let mut gids = vec![0; (w * h) as usize];
        for &(c, r, gid) in placed {
            gids[(r * w + c) as usize] = gid;
        }
        TileLayer::from_gids(name, w, h, T, &gids).unwrap()
    }

    fn doc_json(start: u32, exit: u32) -> String {
        format!(
            r#"{{
                "width": 3, "height": 2, "tilewidth": 70, "tileheight": 70,
                "layers": [
                    {{ "name": "Colliders", "data": [0, 0, 0, 1, 1, 1073741829] }},
                    {{ "name": "Background", "data": [9, 9, 9, 9, 9, 9] }},
                    {{ "name": "StartDoor", "data": [{start}, 0, 0, 0, 0, 0] }},
                    {{ "name": "ExitDoor", "data": [0, 0, {exit}, 0, 0, 0] }}
                ]
            }}"#
        )
    }

    #[test]
    fn gids_decode_index_and_flip() {
        let l = layer("Colliders", 2, 1, &[(0, 0, 7), (1, 0, 7 | FLIP_VERTICAL)]);
        let a = l.tile_at(0, 0).unwrap();
        let b = l.tile_at(1, 0).unwrap();
        assert_eq!(a.index, 7);
        assert_eq!(a.rotation, TileRotation::None);
        assert_eq!(b.index, 7);
        assert_eq!(b.rotation, TileRotation::Half);
        assert_eq!(b.pos, TilePos { column: 1, row: 0 });
    }

    #[test]
    fn wrong_cell_count_is_rejected() {
        assert!(TileLayer::from_gids("x", 2, 2, T, &[0, 0, 0]).is_none());
    }

    #[test]
    fn unaddressable_grid_is_rejected() {
        assert!(TileLayer::from_gids("x", 65536, 65536, T, &[]).is_none());
    }

    #[test]
    fn oversized_document_is_a_size_error() {
        let json = r#"{"width": 65536, "height": 65536, "tilewidth": 70, "tileheight": 70,
            "layers": [
                {"name": "Colliders", "data": []},
                {"name": "StartDoor", "data": []},
                {"name": "ExitDoor", "data": []}
            ]}"#;
        let err = Level::from_json(LevelId::new("huge"), json, &HitboxTable::new()).unwrap_err();
        assert!(matches!(
            err,
            LevelError::LayerSizeMismatch { ref layer, actual: 0, .. } if layer == COLLISION_LAYER
        ));
    }

    #[test]
    fn world_lookup_floors_coordinates() {
        let l = layer("Colliders", 3, 3, &[(1, 2, 4)]);
        assert_eq!(l.tile_at_world(70.0, 140.0).map(|t| t.index), Some(4));
        assert_eq!(l.tile_at_world(139.9, 209.9).map(|t| t.index), Some(4));
        assert!(l.tile_at_world(140.0, 140.0).is_none());
        assert!(l.tile_at_world(-0.5, 140.0).is_none());
        assert!(l.tile_at_world(f32::NAN, 0.0).is_none());
    }

    #[test]
    fn document_loads_and_resolves_kinds() {
        let mut hitboxes = HitboxTable::new();
        hitboxes.register(
            5,
            CustomHitbox {
                x: 0.0,
                y: 10.0,
                width: 70.0,
                height: 20.0,
            },
        );
        let level = Level::from_json(LevelId::new("level1"), &doc_json(3, 4), &hitboxes).unwrap();
        assert_eq!(level.width, 3);
        assert_eq!(level.decoration.len(), 1);
        let custom = level.collision.tile_at(2, 1).unwrap();
        assert_eq!(custom.index, 5);
        assert_eq!(custom.kind, TileKind::CustomSolid);
        assert_eq!(custom.rotation, TileRotation::Half);
        assert_eq!(level.collision.tile_at(0, 1).unwrap().kind, TileKind::Default);
        assert_eq!(level.exit_doors.tile_at(2, 0).unwrap().kind, TileKind::Trigger);
        assert_eq!(level.start_door().unwrap().pos, TilePos { column: 0, row: 0 });
        assert_eq!(level.width_in_pixels(), 210.0);
        assert_eq!(level.height_in_pixels(), 140.0);
    }

    #[test]
    fn missing_start_door_is_fatal() {
        let err = Level::from_json(LevelId::new("level2"), &doc_json(0, 4), &HitboxTable::new())
            .unwrap_err();
        assert_eq!(err, LevelError::MissingStartDoor(LevelId::new("level2")));
    }

    #[test]
    fn missing_exit_door_is_fatal() {
        let err = Level::from_json(LevelId::new("level2"), &doc_json(3, 0), &HitboxTable::new())
            .unwrap_err();
        assert_eq!(err, LevelError::MissingExitDoor(LevelId::new("level2")));
    }

    #[test]
    fn missing_layer_is_fatal() {
        let json = r#"{"width": 1, "height": 1, "tilewidth": 70, "tileheight": 70,
            "layers": [{"name": "Colliders", "data": [1]}]}"#;
        let err = Level::from_json(LevelId::new("l"), json, &HitboxTable::new()).unwrap_err();
        assert!(matches!(
            err,
            LevelError::MissingLayer { ref layer, .. } if layer == START_DOOR_LAYER
        ));
    }

    #[test]
    fn malformed_json_is_parse_error() {
        let err = Level::from_json(LevelId::new("l"), "{", &HitboxTable::new()).unwrap_err();
        assert!(matches!(err, LevelError::Parse(_)));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_level_from_file("/nonexistent", &LevelId::new("level1"), &HitboxTable::new())
            .unwrap_err();
        assert!(matches!(err, LevelError::Io(_)));
    }

    #[test]
    fn hitbox_document_parses() {
        let table = HitboxTable::from_json(
            r#"{"hitboxes": [
                {"tile": 12, "x": 0, "y": 0, "width": 70, "height": 35},
                {"tile": 12, "x": 0, "y": 35, "width": 35, "height": 35}
            ]}"#,
        )
        .unwrap();
        assert_eq!(table.get(12).len(), 2);
        assert!(table.is_custom(12));
        assert!(!table.is_custom(13));
        assert!(table.get(13).is_empty());
    }
}
