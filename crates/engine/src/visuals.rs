use thiserror::Error;
use tracing::debug;

use crate::app::{SpriteRenderer, VisualHandle};
use crate::world::{TileLayer, ENEMY_FRAME_COUNT, PLAYER_FRAME_COUNT};

/// Collision tile visuals, indexed by a tile's `visual_kind`.
pub const COLLISION_TILE_KEYS: [&str; 6] = [
    "tiles/gnd1",
    "tiles/brick",
    "tiles/pbox",
    "tiles/ebox",
    "tiles/ylwtile",
    "tiles/brg",
];

/// Background tile visuals, indexed by a tile's `visual_kind`.
pub const BACKGROUND_TILE_KEYS: [&str; 11] = [
    "bg/cl1", "bg/cl2", "bg/cl3", "bg/cl4", "bg/bh1", "bg/bh2", "bg/tr1", "bg/tr2", "bg/fn1",
    "bg/fn2", "bg/fn3",
];

/// Player frames: run cycle 0..=3, idle 4, 5 unused, jump 6.
pub const PLAYER_FRAME_KEYS: [&str; PLAYER_FRAME_COUNT] = [
    "player/pkn_1",
    "player/pkn_2",
    "player/pkn_3",
    "player/pkn_4",
    "player/pkn_5",
    "player/pkn_6",
    "player/pkn_7",
];

pub const ENEMY_FRAME_KEYS: [&str; ENEMY_FRAME_COUNT] = ["enemy/zerp_1", "enemy/zerp_2"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VisualKeyError {
    #[error("visual key must not be empty")]
    Empty,
    #[error("visual key must not start with '/'")]
    LeadingSlash,
    #[error("visual key must not contain '\\\\'")]
    Backslash,
    #[error("visual key must not contain '..'")]
    ParentTraversal,
    #[error("visual key contains invalid character '{character}'")]
    InvalidCharacter { character: char },
}

/// Keys are relative asset paths without extension: lowercase ASCII, digits,
/// `_`, `-` and `/` separators.
pub fn validate_visual_key(key: &str) -> Result<(), VisualKeyError> {
    if key.is_empty() {
        return Err(VisualKeyError::Empty);
    }
    if key.starts_with('/') {
        return Err(VisualKeyError::LeadingSlash);
    }
    if key.contains('\\') {
        return Err(VisualKeyError::Backslash);
    }
    if key.contains("..") {
        return Err(VisualKeyError::ParentTraversal);
    }
    for ch in key.chars() {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() || matches!(ch, '_' | '/' | '-') {
            continue;
        }
        return Err(VisualKeyError::InvalidCharacter { character: ch });
    }
    Ok(())
}

/// Handles for every visual a level can reference, resolved once per
/// renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisualCatalog {
    collision_tiles: Vec<VisualHandle>,
    background_tiles: Vec<VisualHandle>,
    player_frames: Vec<VisualHandle>,
    enemy_frames: [VisualHandle; ENEMY_FRAME_COUNT],
}

impl VisualCatalog {
    pub fn load<R>(renderer: &mut R) -> Self
    where
        R: SpriteRenderer + ?Sized,
    {
        let mut load_all = |keys: &[&str]| -> Vec<VisualHandle> {
            keys.iter().map(|key| renderer.load_visual(key)).collect()
        };
        let collision_tiles = load_all(&COLLISION_TILE_KEYS);
        let background_tiles = load_all(&BACKGROUND_TILE_KEYS);
        let player_frames = load_all(&PLAYER_FRAME_KEYS);
        let enemy_frames = ENEMY_FRAME_KEYS.map(|key| renderer.load_visual(key));

        let catalog = Self {
            collision_tiles,
            background_tiles,
            player_frames,
            enemy_frames,
        };
        debug!(
            placeholders = catalog.placeholder_count(),
            "visual_catalog_loaded"
        );
        catalog
    }

    /// Catalog with every slot set to the placeholder handle.
    pub fn placeholder() -> Self {
        Self {
            collision_tiles: vec![VisualHandle::PLACEHOLDER; COLLISION_TILE_KEYS.len()],
            background_tiles: vec![VisualHandle::PLACEHOLDER; BACKGROUND_TILE_KEYS.len()],
            player_frames: vec![VisualHandle::PLACEHOLDER; PLAYER_FRAME_COUNT],
            enemy_frames: [VisualHandle::PLACEHOLDER; ENEMY_FRAME_COUNT],
        }
    }

    fn layer_visuals(&self, layer: TileLayer) -> &[VisualHandle] {
        match layer {
            TileLayer::Background => &self.background_tiles,
            TileLayer::Collision => &self.collision_tiles,
        }
    }

    pub fn has_tile_visual(&self, layer: TileLayer, visual_kind: i32) -> bool {
        usize::try_from(visual_kind)
            .map(|index| index < self.layer_visuals(layer).len())
            .unwrap_or(false)
    }

    /// Unknown kinds resolve to the placeholder.
    pub fn tile_visual(&self, layer: TileLayer, visual_kind: i32) -> VisualHandle {
        usize::try_from(visual_kind)
            .ok()
            .and_then(|index| self.layer_visuals(layer).get(index).copied())
            .unwrap_or(VisualHandle::PLACEHOLDER)
    }

    pub fn player_frames(&self) -> &[VisualHandle] {
        &self.player_frames
    }

    pub fn enemy_frames(&self) -> [VisualHandle; ENEMY_FRAME_COUNT] {
        self.enemy_frames
    }

    pub fn placeholder_count(&self) -> usize {
        self.collision_tiles
            .iter()
            .chain(self.background_tiles.iter())
            .chain(self.player_frames.iter())
            .chain(self.enemy_frames.iter())
            .filter(|handle| handle.is_placeholder())
            .count()
    }
}
