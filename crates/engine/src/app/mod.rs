mod input;
mod loop_runner;
mod metrics;
mod rendering;
mod scene;

pub use input::InputAction;
pub use loop_runner::{run_app, AppError, LoopConfig, SLOW_FRAME_ENV_VAR};
pub use metrics::LoopMetricsSnapshot;
pub use rendering::{
    canvas_to_world, world_to_canvas, DrawOwner, DrawRequest, DrawSorter, Renderer,
    SpriteRenderer, Viewport, VisualHandle,
};
pub use scene::{InputSnapshot, Scene, SceneCommand, SceneError};
