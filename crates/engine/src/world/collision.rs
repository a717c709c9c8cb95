use super::tiles::{Tile, TILE_SIZE};

/// Actor hitbox, anchored at the actor position.
pub const ACTOR_HITBOX_WIDTH: f32 = 14.0;
pub const ACTOR_HITBOX_HEIGHT: f32 = 22.0;

/// Upper bound on single-unit contact steps for one tile. Resolving from an
/// embedded position can otherwise walk forever.
pub(crate) const MAX_CONTACT_STEPS: u32 = 64;

/// Box test between the actor at `(x + offset_x, y + offset_y)` and a tile.
pub fn overlaps(x: i32, y: i32, offset_x: f32, offset_y: f32, tile: &Tile) -> bool {
    let left = x as f32 + offset_x;
    let bottom = y as f32 + offset_y;
    let tile_left = tile.x as f32;
    let tile_bottom = tile.y as f32;
    let tile_size = TILE_SIZE as f32;

    left < tile_left + tile_size
        && left + ACTOR_HITBOX_WIDTH > tile_left
        && bottom < tile_bottom + tile_size
        && bottom + ACTOR_HITBOX_HEIGHT > tile_bottom
}

/// Walks one unit at a time from `start` until `touching` holds. Returns the
/// contact coordinate, or `None` when no contact is found within
/// [`MAX_CONTACT_STEPS`] (the caller keeps its starting position).
pub(crate) fn step_until_contact<F>(start: i32, direction: i32, touching: F) -> Option<i32>
where
    F: Fn(i32) -> bool,
{
    let mut position = start;
    for _ in 0..=MAX_CONTACT_STEPS {
        if touching(position) {
            return Some(position);
        }
        if direction == 0 {
            return None;
        }
        position = position.saturating_add(direction);
    }
    None
}

/// `-1`, `0` or `1`. Zero stays zero, unlike `f32::signum`.
pub(crate) fn sign(value: f32) -> i32 {
    if value > 0.0 {
        1
    } else if value < 0.0 {
        -1
    } else {
        0
    }
}
