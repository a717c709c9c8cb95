use crate::level::{LevelData, TileRecord};

pub const TILE_SIZE: i32 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TileLayer {
    Background,
    Collision,
}

impl TileLayer {
    /// Paint order hint; larger is drawn further back.
    pub const fn depth(self) -> i32 {
        match self {
            TileLayer::Background => 2,
            TileLayer::Collision => 1,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            TileLayer::Background => "background",
            TileLayer::Collision => "collision",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    pub x: i32,
    pub y: i32,
    pub depth: i32,
    pub visual_kind: i32,
    pub layer: TileLayer,
}

/// Flips a stored row (growing downward) into world `y` (growing upward)
/// for an object `height` units tall. Saturates at the `i32` range.
pub fn stored_row_to_world_y(stored_y: i32, height: i32) -> i32 {
    stored_y.saturating_neg().saturating_sub(height)
}

impl Tile {
    /// Converts a stored record to world space: the stored row grows
    /// downward, world `y` grows upward.
    pub fn from_record(record: &TileRecord, layer: TileLayer) -> Self {
        Self {
            x: record.x,
            y: stored_row_to_world_y(record.y, TILE_SIZE),
            depth: layer.depth(),
            visual_kind: record.visual_kind,
            layer,
        }
    }

    pub const fn size(&self) -> (i32, i32) {
        (TILE_SIZE, TILE_SIZE)
    }
}

/// Both tile layers of one loaded level. Built once per load and never
/// edited in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TileGrid {
    background: Vec<Tile>,
    collision: Vec<Tile>,
}

impl TileGrid {
    pub fn new(background: Vec<Tile>, collision: Vec<Tile>) -> Self {
        Self {
            background,
            collision,
        }
    }

    pub fn from_level(level: &LevelData) -> Self {
        Self {
            background: build_layer(&level.background_tiles, TileLayer::Background),
            collision: build_layer(&level.collision_tiles, TileLayer::Collision),
        }
    }

    pub fn layer(&self, layer: TileLayer) -> &[Tile] {
        match layer {
            TileLayer::Background => &self.background,
            TileLayer::Collision => &self.collision,
        }
    }

    pub fn background(&self) -> &[Tile] {
        &self.background
    }

    pub fn collision(&self) -> &[Tile] {
        &self.collision
    }

    pub fn len(&self) -> usize {
        self.background.len() + self.collision.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn build_layer(records: &[TileRecord], layer: TileLayer) -> Vec<Tile> {
    let mut tiles = Vec::with_capacity(records.len());
    for record in records {
        tiles.push(Tile::from_record(record, layer));
    }
    tiles
}
