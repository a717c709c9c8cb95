use crate::world::{Camera, Vec2};

/// Size of the low-resolution canvas in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// World (y up, camera at the bottom-left) to canvas (y down) coordinates.
pub fn world_to_canvas(world: Vec2, camera: Camera, viewport: Viewport) -> Vec2 {
    Vec2 {
        x: world.x - camera.x as f32,
        y: viewport.height as f32 - (world.y - camera.y as f32),
    }
}

pub fn canvas_to_world(canvas: Vec2, camera: Camera, viewport: Viewport) -> Vec2 {
    Vec2 {
        x: canvas.x + camera.x as f32,
        y: viewport.height as f32 - canvas.y + camera.y as f32,
    }
}
