use thiserror::Error;

use super::input::{ActionStates, InputAction};
use super::rendering::{DrawSorter, SpriteRenderer};
use crate::level::LevelIoError;
use crate::world::World;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneCommand {
    None,
    ReloadLevel,
    Quit,
}

#[derive(Debug, Error)]
pub enum SceneError {
    #[error(transparent)]
    Level(#[from] LevelIoError),
    #[error("scene failed to load: {0}")]
    Other(String),
}

/// Input sampled once per tick. Held buttons are levels; `reload_pressed`
/// is an edge that is true for a single tick.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputSnapshot {
    quit_requested: bool,
    reload_pressed: bool,
    actions: ActionStates,
}

impl InputSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub(crate) fn new(quit_requested: bool, reload_pressed: bool, actions: ActionStates) -> Self {
        Self {
            quit_requested,
            reload_pressed,
            actions,
        }
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    pub fn reload_pressed(&self) -> bool {
        self.reload_pressed
    }

    pub fn is_down(&self, action: InputAction) -> bool {
        self.actions.is_down(action)
    }

    pub fn with_action_down(mut self, action: InputAction, is_down: bool) -> Self {
        self.actions.set(action, is_down);
        self
    }

    pub fn with_reload_pressed(mut self, reload_pressed: bool) -> Self {
        self.reload_pressed = reload_pressed;
        self
    }

    pub fn with_quit_requested(mut self, quit_requested: bool) -> Self {
        self.quit_requested = quit_requested;
        self
    }
}

/// A playable scene driven by the frame loop. `load` runs once before the
/// first tick and again whenever `update` asks for a reload.
pub trait Scene {
    fn load(
        &mut self,
        world: &mut World,
        renderer: &mut dyn SpriteRenderer,
    ) -> Result<(), SceneError>;
    fn update(&mut self, input: &InputSnapshot, world: &mut World) -> SceneCommand;
    fn render(&mut self, world: &World, sorter: &mut DrawSorter);
    fn unload(&mut self, _world: &mut World) {}
    fn debug_title(&self, _world: &World) -> Option<String> {
        None
    }
}
