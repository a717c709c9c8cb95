use std::path::PathBuf;

use engine::{
    read_level_file, DrawSorter, InputSnapshot, Scene, SceneCommand, SceneError, SpriteRenderer,
    VisualCatalog, World,
};
use tracing::info;

/// Plays a single level file. F5 re-reads the file and rebuilds the world.
pub(crate) struct LevelScene {
    level_path: PathBuf,
    title: String,
    visuals: VisualCatalog,
    loads: u32,
}

impl LevelScene {
    pub(crate) fn new(level_path: PathBuf, title: String) -> Self {
        Self {
            level_path,
            title,
            visuals: VisualCatalog::placeholder(),
            loads: 0,
        }
    }
}

impl Scene for LevelScene {
    fn load(
        &mut self,
        world: &mut World,
        renderer: &mut dyn SpriteRenderer,
    ) -> Result<(), SceneError> {
        let level = read_level_file(&self.level_path)?;
        self.visuals = VisualCatalog::load(renderer);
        let summary = world.load_level(&level, &self.visuals);
        self.loads = self.loads.saturating_add(1);
        info!(
            path = %self.level_path.display(),
            loads = self.loads,
            enemies = summary.enemies,
            unknown_tile_visuals = summary.unknown_tile_visuals,
            "level_scene_ready"
        );
        Ok(())
    }

    fn update(&mut self, input: &InputSnapshot, world: &mut World) -> SceneCommand {
        if input.quit_requested() {
            return SceneCommand::Quit;
        }
        if input.reload_pressed() {
            info!(path = %self.level_path.display(), "level_reload_requested");
            return SceneCommand::ReloadLevel;
        }

        world.tick(input);
        world.follow_player();
        SceneCommand::None
    }

    fn render(&mut self, world: &World, sorter: &mut DrawSorter) {
        world.submit_draws(&self.visuals, sorter);
    }

    fn debug_title(&self, world: &World) -> Option<String> {
        let player = world.player();
        let (x, y) = player.position();
        Some(format!(
            "{} | x={x} y={y} | {:?}",
            self.title,
            player.action()
        ))
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use engine::{
        write_level_file, DrawRequest, InputAction, LevelData, SpawnRecord, TileRecord,
        VisualHandle,
    };

    use super::*;

    #[derive(Default)]
    struct RecordingRenderer {
        loads: usize,
        drawn: Vec<DrawRequest>,
    }

    impl SpriteRenderer for RecordingRenderer {
        fn load_visual(&mut self, _key: &str) -> VisualHandle {
            self.loads += 1;
            VisualHandle::new(self.loads as u32 - 1)
        }

        fn draw_visual(&mut self, request: &DrawRequest) {
            self.drawn.push(*request);
        }
    }

    fn write_level(path: &Path, enemies: i32) {
        let mut spawns = vec![SpawnRecord {
            kind: 0,
            x: 40,
            y: 100,
        }];
        for index in 0..enemies {
            spawns.push(SpawnRecord {
                kind: 1,
                x: 120 + index * 32,
                y: 160,
            });
        }
        let level = LevelData {
            collision_tiles: vec![TileRecord {
                visual_kind: 1,
                x: 32,
                y: 208,
            }],
            spawns,
            ..LevelData::default()
        };
        write_level_file(path, &level).expect("write level");
    }

    fn loaded_scene(path: &Path) -> (LevelScene, World, RecordingRenderer) {
        let mut scene = LevelScene::new(path.to_path_buf(), "Test".to_string());
        let mut world = World::default();
        let mut renderer = RecordingRenderer::default();
        scene.load(&mut world, &mut renderer).expect("load");
        (scene, world, renderer)
    }

    #[test]
    fn load_builds_world_from_level_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("one.lvl");
        write_level(&path, 2);

        let (scene, world, _) = loaded_scene(&path);
        assert_eq!(world.enemies().len(), 2);
        assert_eq!(world.tiles().collision().len(), 1);
        assert_eq!(world.player().position(), (40, -133));
        assert_eq!(scene.loads, 1);
    }

    #[test]
    fn missing_level_file_is_a_scene_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut scene = LevelScene::new(dir.path().join("absent.lvl"), "Test".to_string());
        let mut world = World::default();
        let mut renderer = RecordingRenderer::default();

        assert!(matches!(
            scene.load(&mut world, &mut renderer),
            Err(SceneError::Level(_))
        ));
    }

    #[test]
    fn reload_edge_requests_reload_without_ticking() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("one.lvl");
        write_level(&path, 0);
        let (mut scene, mut world, _) = loaded_scene(&path);

        let command = scene.update(&InputSnapshot::empty().with_reload_pressed(true), &mut world);
        assert_eq!(command, SceneCommand::ReloadLevel);
        assert_eq!(world.ticks(), 0);

        let command = scene.update(&InputSnapshot::empty(), &mut world);
        assert_eq!(command, SceneCommand::None);
        assert_eq!(world.ticks(), 1);
    }

    #[test]
    fn reload_picks_up_edited_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("one.lvl");
        write_level(&path, 1);
        let (mut scene, mut world, mut renderer) = loaded_scene(&path);
        assert_eq!(world.enemies().len(), 1);

        write_level(&path, 3);
        scene.unload(&mut world);
        scene.load(&mut world, &mut renderer).expect("reload");
        assert_eq!(world.enemies().len(), 3);
        assert_eq!(scene.loads, 2);
    }

    #[test]
    fn quit_request_becomes_quit_command() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("one.lvl");
        write_level(&path, 0);
        let (mut scene, mut world, _) = loaded_scene(&path);

        let input = InputSnapshot::empty().with_quit_requested(true);
        assert_eq!(scene.update(&input, &mut world), SceneCommand::Quit);
    }

    #[test]
    fn render_submits_tiles_enemies_and_player() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("one.lvl");
        write_level(&path, 2);
        let (mut scene, mut world, mut renderer) = loaded_scene(&path);

        let input = InputSnapshot::empty().with_action_down(InputAction::MoveRight, true);
        scene.update(&input, &mut world);
        let mut sorter = DrawSorter::new();
        scene.render(&world, &mut sorter);

        assert_eq!(sorter.flush(&mut renderer), 1 + 2 + 1);
        assert!(renderer.drawn.iter().all(|request| !request.visual.is_placeholder()));
    }

    #[test]
    fn debug_title_shows_position_and_action() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("one.lvl");
        write_level(&path, 0);
        let (scene, world, _) = loaded_scene(&path);

        let title = scene.debug_title(&world).expect("title");
        assert_eq!(title, "Test | x=40 y=-133 | Idle");
    }
}
