mod collision;
mod enemy;
mod player;
mod tiles;

use tracing::{debug, info, warn};

use crate::app::{DrawOwner, DrawRequest, DrawSorter, InputSnapshot};
use crate::level::{BackgroundColor, LevelData, SpawnKind};
use crate::visuals::VisualCatalog;

pub use collision::{overlaps, ACTOR_HITBOX_HEIGHT, ACTOR_HITBOX_WIDTH};
pub use enemy::{Enemy, ENEMY_DEPTH, ENEMY_FRAME_COUNT};
pub use player::{
    Player, PlayerAction, PlayerInput, PlayerTuning, FACING_MIRROR_OFFSET, IDLE_FRAME, JUMP_FRAME,
    PLAYER_DEPTH, PLAYER_FRAME_COUNT, RUN_CYCLE_FRAMES,
};
pub use tiles::{stored_row_to_world_y, Tile, TileGrid, TileLayer, TILE_SIZE};

/// Low-resolution canvas the world is simulated and drawn against.
pub const VIEWPORT_WIDTH: i32 = 256;
pub const VIEWPORT_HEIGHT: i32 = 224;

/// Stored spawn rows are flipped into world space with these offsets.
pub const PLAYER_SPAWN_Y_OFFSET: i32 = 33;
pub const ENEMY_SPAWN_Y_OFFSET: i32 = 16;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

/// Bottom-left corner of the visible area in world units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Camera {
    pub x: i32,
    pub y: i32,
}

impl Camera {
    /// Camera for a freshly loaded level: stored rows `0..viewport_height`
    /// fill the screen top to bottom.
    pub const fn level_start(viewport_height: i32) -> Self {
        Self {
            x: 0,
            y: -viewport_height,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub background_tiles: usize,
    pub collision_tiles: usize,
    pub enemies: usize,
    pub player_spawns: usize,
    pub skipped_spawns: usize,
    pub unknown_tile_visuals: usize,
}

/// Everything one running level owns: tiles, actors and the camera.
#[derive(Debug, Clone)]
pub struct World {
    background: BackgroundColor,
    tiles: TileGrid,
    player: Player,
    enemies: Vec<Enemy>,
    camera: Camera,
    viewport_width: i32,
    viewport_height: i32,
    ticks: u64,
}

impl Default for World {
    fn default() -> Self {
        Self::new(VIEWPORT_WIDTH, VIEWPORT_HEIGHT)
    }
}

impl World {
    pub fn new(viewport_width: i32, viewport_height: i32) -> Self {
        Self {
            background: BackgroundColor::default(),
            tiles: TileGrid::default(),
            player: Player::default(),
            enemies: Vec::new(),
            camera: Camera::level_start(viewport_height),
            viewport_width,
            viewport_height,
            ticks: 0,
        }
    }

    /// Replaces every tile, actor and the camera with the contents of `level`.
    pub fn load_level(&mut self, level: &LevelData, visuals: &VisualCatalog) -> LoadSummary {
        let tiles = TileGrid::from_level(level);
        let unknown_tile_visuals = [TileLayer::Background, TileLayer::Collision]
            .into_iter()
            .flat_map(|layer| tiles.layer(layer).iter())
            .filter(|tile| !visuals.has_tile_visual(tile.layer, tile.visual_kind))
            .count();
        if unknown_tile_visuals > 0 {
            warn!(
                count = unknown_tile_visuals,
                "level_tiles_reference_unknown_visuals"
            );
        }

        let mut player = None;
        let mut player_spawns = 0usize;
        let mut enemies = Vec::new();
        let mut skipped_spawns = 0usize;
        for spawn in &level.spawns {
            match SpawnKind::from_raw(spawn.kind) {
                SpawnKind::Player => {
                    player_spawns += 1;
                    player = Some(Player::spawn(
                        spawn.x,
                        stored_row_to_world_y(spawn.y, PLAYER_SPAWN_Y_OFFSET),
                        visuals.player_frames().to_vec(),
                    ));
                }
                SpawnKind::Enemy => enemies.push(Enemy::spawn(
                    spawn.x,
                    stored_row_to_world_y(spawn.y, ENEMY_SPAWN_Y_OFFSET),
                    visuals.enemy_frames(),
                )),
                SpawnKind::Unknown(raw) => {
                    skipped_spawns += 1;
                    warn!(kind = raw, x = spawn.x, y = spawn.y, "spawn_kind_unknown");
                }
                reserved => {
                    skipped_spawns += 1;
                    debug!(
                        kind = reserved.label(),
                        x = spawn.x,
                        y = spawn.y,
                        "spawn_kind_skipped"
                    );
                }
            }
        }
        if player_spawns == 0 {
            warn!("level_has_no_player_spawn_using_origin");
        } else if player_spawns > 1 {
            debug!(player_spawns, "level_has_multiple_player_spawns_last_wins");
        }

        let summary = LoadSummary {
            background_tiles: tiles.background().len(),
            collision_tiles: tiles.collision().len(),
            enemies: enemies.len(),
            player_spawns,
            skipped_spawns,
            unknown_tile_visuals,
        };

        self.background = level.background;
        self.tiles = tiles;
        self.player = player
            .unwrap_or_else(|| Player::spawn(0, 0, visuals.player_frames().to_vec()));
        self.enemies = enemies;
        self.camera = Camera::level_start(self.viewport_height);
        self.ticks = 0;

        info!(
            background_tiles = summary.background_tiles,
            collision_tiles = summary.collision_tiles,
            enemies = summary.enemies,
            skipped_spawns = summary.skipped_spawns,
            "world_level_instantiated"
        );
        summary
    }

    /// One simulation step: the player first, then every enemy.
    pub fn tick(&mut self, input: &InputSnapshot) {
        self.player
            .tick(PlayerInput::from_snapshot(input), self.tiles.collision());
        for enemy in &mut self.enemies {
            enemy.tick(self.camera, self.viewport_width);
        }
        self.ticks = self.ticks.saturating_add(1);
    }

    /// Scrolls right so the player never passes the middle of the view. The
    /// camera never scrolls back left.
    pub fn follow_player(&mut self) {
        let (player_x, _) = self.player.position();
        let half_width = self.viewport_width / 2;
        let ahead = player_x.saturating_sub(self.camera.x);
        if ahead > half_width && player_x > self.camera.x {
            self.camera.x = self.camera.x.saturating_add(ahead - half_width);
        }
    }

    /// Queues this frame's draws: background tiles, collision tiles, enemies,
    /// then the player. Depth decides the final paint order.
    pub fn submit_draws(&self, visuals: &VisualCatalog, sorter: &mut DrawSorter) {
        for (index, tile) in self.tiles.background().iter().enumerate() {
            sorter.submit(tile_draw_request(
                DrawOwner::BackgroundTile(index),
                tile,
                visuals,
            ));
        }
        for (index, tile) in self.tiles.collision().iter().enumerate() {
            sorter.submit(tile_draw_request(
                DrawOwner::CollisionTile(index),
                tile,
                visuals,
            ));
        }
        for (index, enemy) in self.enemies.iter().enumerate() {
            sorter.submit(enemy.draw_request(index));
        }
        sorter.submit(self.player.draw_request());
    }

    pub fn background(&self) -> BackgroundColor {
        self.background
    }

    pub fn tiles(&self) -> &TileGrid {
        &self.tiles
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn enemies(&self) -> &[Enemy] {
        &self.enemies
    }

    pub fn camera(&self) -> Camera {
        self.camera
    }

    pub fn set_camera(&mut self, camera: Camera) {
        self.camera = camera;
    }

    pub fn viewport_size(&self) -> (i32, i32) {
        (self.viewport_width, self.viewport_height)
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}

fn tile_draw_request(owner: DrawOwner, tile: &Tile, visuals: &VisualCatalog) -> DrawRequest {
    DrawRequest::new(
        owner,
        visuals.tile_visual(tile.layer, tile.visual_kind),
        Vec2 {
            x: tile.x as f32,
            y: tile.y as f32,
        },
        tile.depth as f32,
    )
}
