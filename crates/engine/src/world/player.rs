use tracing::debug;

use crate::app::{DrawOwner, DrawRequest, InputAction, InputSnapshot, VisualHandle};

use super::collision::{overlaps, sign, step_until_contact};
use super::tiles::Tile;
use super::Vec2;

/// Frame shown while standing still.
pub const IDLE_FRAME: f32 = 4.0;
/// Frame shown while airborne after a jump.
pub const JUMP_FRAME: f32 = 6.0;
/// Run cycle occupies frames `0..RUN_CYCLE_FRAMES`.
pub const RUN_CYCLE_FRAMES: f32 = 4.0;
pub const PLAYER_FRAME_COUNT: usize = 7;
/// Draw offset applied when facing left so the mirrored sprite stays over
/// the hitbox.
pub const FACING_MIRROR_OFFSET: i32 = 14;
pub const PLAYER_DEPTH: i32 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(i8)]
pub enum PlayerAction {
    #[default]
    Idle = 0,
    Moving = 1,
    Crouch = -1,
    Jumping = 2,
}

impl PlayerAction {
    pub const fn code(self) -> i8 {
        self as i8
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerTuning {
    pub acceleration: f32,
    pub deceleration: f32,
    pub dash_acceleration_factor: f32,
    pub walk_speed: f32,
    pub dash_speed: f32,
    pub jump_impulse: f32,
    pub jump_timer_step: f32,
    pub min_jump_ticks: f32,
    pub max_jump_ticks: f32,
    pub jump_hold_speed_factor: f32,
    pub gravity: f32,
    pub run_animation_rate: f32,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            acceleration: 0.25,
            deceleration: 0.125,
            dash_acceleration_factor: 1.25,
            walk_speed: 1.0,
            dash_speed: 2.0,
            jump_impulse: 3.0,
            jump_timer_step: 0.5,
            min_jump_ticks: 4.0,
            max_jump_ticks: 7.0,
            jump_hold_speed_factor: 0.15,
            gravity: 0.425,
            run_animation_rate: 0.125,
        }
    }
}

/// Buttons the player reads each tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlayerInput {
    pub left: bool,
    pub right: bool,
    pub down: bool,
    pub jump: bool,
    pub dash: bool,
}

impl PlayerInput {
    pub fn from_snapshot(input: &InputSnapshot) -> Self {
        Self {
            left: input.is_down(InputAction::MoveLeft),
            right: input.is_down(InputAction::MoveRight),
            down: input.is_down(InputAction::Crouch),
            jump: input.is_down(InputAction::Jump),
            dash: input.is_down(InputAction::Dash),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    x: i32,
    y: i32,
    xsp: f32,
    ysp: f32,
    grounded: bool,
    action: PlayerAction,
    jumping: bool,
    jump_timer: f32,
    jump_latched: bool,
    last_facing: i32,
    facing_offset: i32,
    x_collided: bool,
    max_speed: f32,
    animation_frame: f32,
    frames: Vec<VisualHandle>,
    tuning: PlayerTuning,
}

impl Default for Player {
    fn default() -> Self {
        Self::spawn(0, 0, vec![VisualHandle::PLACEHOLDER; PLAYER_FRAME_COUNT])
    }
}

impl Player {
    /// A fresh player at `(x, y)` in world space, standing and facing right.
    pub fn spawn(x: i32, y: i32, frames: Vec<VisualHandle>) -> Self {
        let tuning = PlayerTuning::default();
        Self {
            x,
            y,
            xsp: 0.0,
            ysp: 0.0,
            grounded: true,
            action: PlayerAction::Idle,
            jumping: false,
            jump_timer: 0.0,
            jump_latched: false,
            last_facing: 1,
            facing_offset: 0,
            x_collided: false,
            max_speed: tuning.walk_speed,
            animation_frame: 0.0,
            frames,
            tuning,
        }
    }

    pub fn with_tuning(mut self, tuning: PlayerTuning) -> Self {
        self.tuning = tuning;
        self.max_speed = tuning.walk_speed;
        self
    }

    /// Advances one simulation tick against `tiles` (the collision layer).
    /// Step order is load-bearing; reordering changes how the player feels.
    pub fn tick(&mut self, input: PlayerInput, tiles: &[Tile]) {
        self.apply_horizontal_intent(input);
        self.apply_auto_stop(input);
        self.apply_deceleration();
        self.update_facing();
        self.clamp_speed(input.dash);
        self.try_start_jump(input.jump);
        self.update_jump_hold(input.jump);
        self.probe_ground(input.jump, tiles);
        self.apply_gravity();

        self.x_collided = self.resolve_horizontal(tiles);
        if !self.x_collided {
            self.x = self.x.saturating_add(self.xsp.round() as i32);
        }
        self.resolve_vertical(tiles);

        self.facing_offset = if self.last_facing < 0 {
            FACING_MIRROR_OFFSET
        } else {
            0
        };
        self.advance_animation();
        self.y = self.y.saturating_add(self.ysp.round() as i32);
    }

    fn horizontal_acceleration(&self, dash: bool) -> f32 {
        let tuning = &self.tuning;
        if dash && self.grounded {
            tuning.acceleration * tuning.dash_acceleration_factor
        } else if self.grounded {
            tuning.acceleration
        } else {
            tuning.acceleration / tuning.dash_acceleration_factor
        }
    }

    fn apply_horizontal_intent(&mut self, input: PlayerInput) {
        if input.left {
            self.xsp -= self.horizontal_acceleration(input.dash);
            if self.grounded {
                self.action = PlayerAction::Moving;
            }
        } else if input.right && self.action != PlayerAction::Crouch {
            self.xsp += self.horizontal_acceleration(input.dash);
            if self.grounded {
                self.action = PlayerAction::Moving;
            }
        }

        if input.down && self.grounded {
            self.action = PlayerAction::Crouch;
        }

        let no_direction = !input.left && !input.right && !input.down;
        if no_direction && self.grounded && self.xsp == 0.0 && self.ysp == 0.0 {
            self.action = PlayerAction::Idle;
        }
    }

    fn apply_auto_stop(&mut self, input: PlayerInput) {
        if self.action != PlayerAction::Moving || self.xsp == 0.0 || !self.grounded {
            return;
        }
        if self.xsp > 0.0 && !input.right {
            self.action = PlayerAction::Idle;
        }
        if self.xsp < 0.0 && !input.left {
            self.action = PlayerAction::Idle;
        }
    }

    fn apply_deceleration(&mut self) {
        let slowing = matches!(self.action, PlayerAction::Idle | PlayerAction::Crouch);
        if !self.grounded || !slowing {
            return;
        }
        let deceleration = self.tuning.deceleration;
        if self.xsp > 0.0 {
            self.xsp = (self.xsp - deceleration).max(0.0);
        } else if self.xsp < 0.0 {
            self.xsp = (self.xsp + deceleration).min(0.0);
        }
    }

    fn update_facing(&mut self) {
        let steering = matches!(self.action, PlayerAction::Idle | PlayerAction::Moving);
        if self.grounded && steering && self.xsp.abs() > 0.0 {
            self.last_facing = sign(self.xsp);
        }
    }

    fn clamp_speed(&mut self, dash: bool) {
        self.max_speed = if dash {
            self.tuning.dash_speed
        } else {
            self.tuning.walk_speed
        };
        self.xsp = self.xsp.clamp(-self.max_speed, self.max_speed);
    }

    fn try_start_jump(&mut self, jump: bool) {
        if !jump || !self.grounded || self.jump_latched {
            return;
        }
        self.ysp = self.tuning.jump_impulse;
        self.jumping = true;
        self.grounded = false;
        self.action = PlayerAction::Jumping;
        self.jump_latched = true;
    }

    fn update_jump_hold(&mut self, jump: bool) {
        if !self.jumping {
            return;
        }
        let tuning = &self.tuning;
        self.jump_timer += tuning.jump_timer_step;
        let hold_limit =
            tuning.max_jump_ticks * (1.0 + tuning.jump_hold_speed_factor * self.xsp.abs());
        self.jumping =
            (jump && self.jump_timer < hold_limit) || self.jump_timer < tuning.min_jump_ticks;
    }

    fn probe_ground(&mut self, jump: bool, tiles: &[Tile]) {
        let mut contacts = 0usize;
        for tile in tiles {
            if overlaps(self.x, self.y, 0.0, self.ysp, tile) {
                self.grounded = true;
                self.action = PlayerAction::Idle;
                self.jump_timer = 0.0;
                self.jumping = false;
                contacts += 1;
            }
        }

        if !jump && self.grounded {
            self.jump_latched = false;
        }
        if contacts == 0 {
            self.grounded = false;
        }
    }

    fn apply_gravity(&mut self) {
        if !self.grounded && !self.jumping {
            self.ysp -= self.tuning.gravity;
        }
    }

    // Each overlapping tile is resolved on its own, in grid order; with
    // several walls the last one processed decides the final x.
    fn resolve_horizontal(&mut self, tiles: &[Tile]) -> bool {
        let direction = sign(self.xsp);
        let mut collided = false;
        for tile in tiles {
            if !overlaps(self.x, self.y, self.xsp, 1.0, tile) {
                continue;
            }
            let y = self.y;
            let probe = direction as f32;
            match step_until_contact(self.x, direction, |x| overlaps(x, y, probe, 1.0, tile)) {
                Some(x) => self.x = x,
                None => debug!(
                    x = self.x,
                    y = self.y,
                    tile_x = tile.x,
                    tile_y = tile.y,
                    "player_horizontal_contact_not_found"
                ),
            }
            collided = true;
        }
        collided
    }

    fn resolve_vertical(&mut self, tiles: &[Tile]) {
        for tile in tiles {
            if !overlaps(self.x, self.y, 0.0, self.ysp + 1.0, tile) {
                continue;
            }
            let direction = sign(self.ysp);
            let x = self.x;
            let probe = direction as f32 + 1.0;
            match step_until_contact(self.y, direction, |y| overlaps(x, y, 0.0, probe, tile)) {
                Some(y) => self.y = y,
                None => debug!(
                    x = self.x,
                    y = self.y,
                    tile_x = tile.x,
                    tile_y = tile.y,
                    "player_vertical_contact_not_found"
                ),
            }
            self.ysp = 0.0;
        }
    }

    fn advance_animation(&mut self) {
        let running = match self.action {
            PlayerAction::Moving => true,
            PlayerAction::Idle => self.xsp.abs() > 0.0,
            _ => false,
        };
        if running {
            self.animation_frame += self.tuning.run_animation_rate * self.xsp.abs();
            if self.animation_frame >= RUN_CYCLE_FRAMES {
                self.animation_frame = 0.0;
            }
        }
        if self.action == PlayerAction::Idle && self.xsp == 0.0 {
            self.animation_frame = IDLE_FRAME;
        }
        if self.action == PlayerAction::Jumping {
            self.animation_frame = JUMP_FRAME;
        }
    }

    pub fn position(&self) -> (i32, i32) {
        (self.x, self.y)
    }

    pub fn velocity(&self) -> (f32, f32) {
        (self.xsp, self.ysp)
    }

    pub fn is_grounded(&self) -> bool {
        self.grounded
    }

    pub fn action(&self) -> PlayerAction {
        self.action
    }

    pub fn is_jumping(&self) -> bool {
        self.jumping
    }

    pub fn jump_timer(&self) -> f32 {
        self.jump_timer
    }

    pub fn last_facing(&self) -> i32 {
        self.last_facing
    }

    pub fn facing_offset(&self) -> i32 {
        self.facing_offset
    }

    pub fn x_collided(&self) -> bool {
        self.x_collided
    }

    pub fn max_speed(&self) -> f32 {
        self.max_speed
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

    pub fn draw_request(&self) -> DrawRequest {
        DrawRequest::new(
            DrawOwner::Player,
            self.current_visual(),
            Vec2 {
                x: self.x.saturating_add(self.facing_offset) as f32,
                y: self.y as f32,
            },
            PLAYER_DEPTH as f32,
        )
        .with_scale(Vec2 {
            x: self.last_facing as f32,
            y: 1.0,
        })
    }
}
