use crate::app::{DrawOwner, DrawRequest, VisualHandle};

use super::tiles::TILE_SIZE;
use super::{Camera, Vec2};

pub const ENEMY_FRAME_COUNT: usize = 2;
pub const ENEMY_DEPTH: i32 = 0;
const ENEMY_FRAME_STEP: f32 = 0.01;

/// Patrolling enemy. Only the animation counter and the activation flag
/// change per tick; position is fixed after spawn.
#[derive(Debug, Clone, PartialEq)]
pub struct Enemy {
    x: i32,
    y: i32,
    width: i32,
    height: i32,
    // Carried for level data parity; never applied to the position.
    direction: i32,
    speed: i32,
    xsp: i32,
    ysp: i32,
    activated: bool,
    animation_frame: f32,
    frames: [VisualHandle; ENEMY_FRAME_COUNT],
}

impl Enemy {
    pub fn spawn(x: i32, y: i32, frames: [VisualHandle; ENEMY_FRAME_COUNT]) -> Self {
        Self {
            x,
            y,
            width: TILE_SIZE,
            height: TILE_SIZE,
            direction: 1,
            speed: 1,
            xsp: 0,
            ysp: 0,
            activated: false,
            animation_frame: 0.0,
            frames,
        }
    }

    pub fn tick(&mut self, camera: Camera, viewport_width: i32) {
        self.activated = self.x.saturating_sub(camera.x) < viewport_width;
        self.animation_frame += ENEMY_FRAME_STEP;
        if self.animation_frame >= ENEMY_FRAME_COUNT as f32 {
            self.animation_frame = 0.0;
        }
    }

    pub fn position(&self) -> (i32, i32) {
        (self.x, self.y)
    }

    pub fn size(&self) -> (i32, i32) {
        (self.width, self.height)
    }

    pub fn direction(&self) -> i32 {
        self.direction
    }

    pub fn speed(&self) -> i32 {
        self.speed
    }

    pub fn velocity(&self) -> (i32, i32) {
        (self.xsp, self.ysp)
    }

    pub fn is_activated(&self) -> bool {
        self.activated
    }

    pub fn animation_frame(&self) -> f32 {
        self.animation_frame
    }

    pub fn current_visual(&self) -> VisualHandle {
        self.frames
            .get(self.animation_frame as usize)
            .copied()
            .unwrap_or(VisualHandle::PLACEHOLDER)
    }

    pub fn draw_request(&self, index: usize) -> DrawRequest {
        DrawRequest::new(
            DrawOwner::Enemy(index),
            self.current_visual(),
            Vec2 {
                x: self.x as f32,
                y: self.y as f32,
            },
            ENEMY_DEPTH as f32,
        )
    }
}
