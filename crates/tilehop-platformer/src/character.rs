use serde::{Deserialize, Serialize};

use tilehop_core::math::{Rect, Vec2};

use crate::config::CharacterConfig;

/// Playable animal. Purely cosmetic apart from where the art sits around the
/// square hitbox.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CharacterType {
    Elephant,
    Giraffe,
    Hippo,
    Monkey,
    Panda,
    Parrot,
    Penguin,
    Pig,
    #[default]
    Rabbit,
    Snake,
}

/// Unscaled pixel distance from each edge of the character image to the
/// square hitbox.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BodyOffsets {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
}

impl BodyOffsets {
    const fn new(left: f32, right: f32, top: f32, bottom: f32) -> Self {
        Self {
            left,
            right,
            top,
            bottom,
        }
    }
}

impl CharacterType {
    pub const ALL: [CharacterType; 10] = [
        CharacterType::Elephant,
        CharacterType::Giraffe,
        CharacterType::Hippo,
        CharacterType::Monkey,
        CharacterType::Panda,
        CharacterType::Parrot,
        CharacterType::Penguin,
        CharacterType::Pig,
        CharacterType::Rabbit,
        CharacterType::Snake,
    ];

    pub const fn offsets(self) -> BodyOffsets {
        match self {
            CharacterType::Elephant => BodyOffsets::new(70.0, 70.0, 28.0, 30.0),
            CharacterType::Giraffe => BodyOffsets::new(49.0, 49.0, 86.0, 0.0),
            CharacterType::Hippo => BodyOffsets::new(23.0, 24.0, 34.0, 24.0),
            CharacterType::Monkey => BodyOffsets::new(54.0, 54.0, 0.0, 0.0),
            CharacterType::Panda => BodyOffsets::new(54.0, 54.0, 47.0, 0.0),
            CharacterType::Parrot => BodyOffsets::new(0.0, 0.0, 0.0, 0.0),
            CharacterType::Penguin => BodyOffsets::new(0.0, 0.0, 0.0, 0.0),
            CharacterType::Pig => BodyOffsets::new(37.0, 37.0, 21.0, 0.0),
            CharacterType::Rabbit => BodyOffsets::new(0.0, 0.0, 130.0, 0.0),
            CharacterType::Snake => BodyOffsets::new(0.0, 0.0, 0.0, 50.0),
        }
    }
}

/// Character geometry resolved once at selection time.
///
/// Positions are sprite centres in world pixels; the hitbox is derived from
/// them through the scaled offsets.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CharacterProfile {
    pub kind: CharacterType,
    pub offsets: BodyOffsets,
    pub scale: f32,
    pub square_size: f32,
}

impl CharacterProfile {
    pub fn new(kind: CharacterType, config: &CharacterConfig) -> Self {
        Self {
            kind,
            offsets: kind.offsets(),
            scale: config.scale,
            square_size: config.square_size,
        }
    }

    /// Side length of the hitbox in world pixels.
    pub fn hitbox_size(&self) -> f32 {
        self.square_size * self.scale
    }

    /// Size of the drawn character art in world pixels.
    pub fn display_size(&self) -> Vec2 {
        let o = self.offsets;
        Vec2::new(
            (o.left + self.square_size + o.right) * self.scale,
            (o.top + self.square_size + o.bottom) * self.scale,
        )
    }

    /// Offset from the sprite centre to the hitbox centre.
    pub fn center_offset(&self) -> Vec2 {
        let o = self.offsets;
        Vec2::new(
            (o.left - o.right) / 2.0 * self.scale,
            (o.top - o.bottom) / 2.0 * self.scale,
        )
    }

    pub fn sprite_bounds(&self, sprite_center: Vec2) -> Rect {
        let size = self.display_size();
        Rect::new(
            sprite_center.x - size.x / 2.0,
            sprite_center.y - size.y / 2.0,
            size.x,
            size.y,
        )
    }

    /// World-space hitbox for a sprite centred at `sprite_center`.
    pub fn hitbox(&self, sprite_center: Vec2) -> Rect {
        let sprite = self.sprite_bounds(sprite_center);
        let size = self.hitbox_size();
        Rect::new(
            sprite.x + self.offsets.left * self.scale,
            sprite.y + self.offsets.top * self.scale,
            size,
            size,
        )
    }

    /// Sprite centre that puts the hitbox centre at `point`.
    pub fn sprite_center_for(&self, point: Vec2) -> Vec2 {
        point - self.center_offset()
    }

    /// Sprite centre for spawning on a tile centred at `tile_center`: the
    /// hitbox is centred horizontally and rests on the tile's bottom edge.
    pub fn spawn_center(&self, tile_center: Vec2, tile_height: f32) -> Vec2 {
        let drop = (tile_height - self.hitbox_size()) / 2.0;
        self.sprite_center_for(Vec2::new(tile_center.x, tile_center.y + drop))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(kind: CharacterType) -> CharacterProfile {
        CharacterProfile::new(kind, &CharacterConfig::default())
    }

    #[test]
    fn hitbox_is_square_for_every_character() {
        for kind in CharacterType::ALL {
            let hb = profile(kind).hitbox(Vec2::new(100.0, 100.0));
            assert_eq!(hb.width, 64.0);
            assert_eq!(hb.height, 64.0);
        }
    }

    #[test]
    fn hitbox_sits_inside_sprite_at_offsets() {
        let p = profile(CharacterType::Hippo);
        let center = Vec2::new(200.0, 300.0);
        let sprite = p.sprite_bounds(center);
        let hb = p.hitbox(center);
        assert!((hb.left() - (sprite.left() + 23.0 * 0.25)).abs() < 1e-4);
        assert!((hb.right() - (sprite.right() - 24.0 * 0.25)).abs() < 1e-4);
        assert!((hb.top() - (sprite.top() + 34.0 * 0.25)).abs() < 1e-4);
        assert!((hb.bottom() - (sprite.bottom() - 24.0 * 0.25)).abs() < 1e-4);
    }

    #[test]
    fn rabbit_hitbox_hangs_below_sprite_center() {
        let p = profile(CharacterType::Rabbit);
        // 130px of ears above the square, scaled by 0.25, split around the centre.
        assert_eq!(p.center_offset(), Vec2::new(0.0, 16.25));
    }

    #[test]
    fn spawn_rests_hitbox_on_tile_bottom() {
        for kind in CharacterType::ALL {
            let p = profile(kind);
            let tile_center = Vec2::new(105.0, 1085.0);
            let hb = p.hitbox(p.spawn_center(tile_center, 70.0));
            assert!((hb.center().x - 105.0).abs() < 1e-3, "{kind:?}");
            assert!((hb.bottom() - 1120.0).abs() < 1e-3, "{kind:?}");
        }
    }
}
