use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use pixels::Error as PixelsError;
use thiserror::Error;
use tracing::{error, info, warn};
use winit::dpi::LogicalSize;
use winit::error::{EventLoopError, OsError};
use winit::event::{ElementState, Event, KeyEvent, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::WindowBuilder;

use crate::world::{World, VIEWPORT_HEIGHT, VIEWPORT_WIDTH};
use crate::{resolve_app_paths, StartupError};

use super::input::ActionStates;
use super::metrics::MetricsAccumulator;
use super::{
    DrawSorter, InputAction, InputSnapshot, Renderer, Scene, SceneCommand, SceneError, Viewport,
};

pub const SLOW_FRAME_ENV_VAR: &str = "PLATFORMER_SLOW_FRAME_MS";

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub window_title: String,
    pub window_scale: u32,
    pub canvas: Viewport,
    pub frame_interval: Duration,
    pub metrics_log_interval: Duration,
    pub simulated_slow_frame_ms: u64,
    /// Sprite root; resolved from the project root when unset.
    pub asset_root: Option<PathBuf>,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            window_title: "Platformer".to_string(),
            window_scale: 4,
            canvas: Viewport {
                width: VIEWPORT_WIDTH as u32,
                height: VIEWPORT_HEIGHT as u32,
            },
            frame_interval: Duration::from_millis(16),
            metrics_log_interval: Duration::from_secs(1),
            simulated_slow_frame_ms: 0,
            asset_root: None,
        }
    }
}

impl LoopConfig {
    pub fn window_size(&self) -> (u32, u32) {
        let scale = self.window_scale.max(1);
        (
            self.canvas.width.saturating_mul(scale),
            self.canvas.height.saturating_mul(scale),
        )
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error("failed to create event loop: {0}")]
    CreateEventLoop(#[source] EventLoopError),
    #[error("failed to create application window: {0}")]
    CreateWindow(#[source] OsError),
    #[error("failed to initialize renderer: {0}")]
    CreateRenderer(#[source] PixelsError),
    #[error("failed to load scene: {0}")]
    SceneLoad(#[from] SceneError),
    #[error("event loop failed: {0}")]
    EventLoopRun(#[source] EventLoopError),
}

/// Opens the window and drives `scene` one tick and one sorted flush per
/// frame until the window closes or the scene asks to quit.
pub fn run_app(config: LoopConfig, mut scene: Box<dyn Scene>) -> Result<(), AppError> {
    let asset_root = match config.asset_root.clone() {
        Some(path) => path,
        None => {
            let app_paths = resolve_app_paths()?;
            info!(
                root = %app_paths.root.display(),
                assets_dir = %app_paths.assets_dir.display(),
                levels_dir = %app_paths.levels_dir.display(),
                "startup"
            );
            app_paths.assets_dir
        }
    };

    let event_loop = EventLoop::new().map_err(AppError::CreateEventLoop)?;
    let (window_width, window_height) = config.window_size();
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(config.window_title.clone())
            .with_inner_size(LogicalSize::new(window_width as f64, window_height as f64))
            .build(&event_loop)
            .map_err(AppError::CreateWindow)?,
    );
    let window_for_loop = Arc::clone(&window);
    let mut renderer =
        Renderer::new(window, config.canvas, asset_root).map_err(AppError::CreateRenderer)?;

    let mut world = World::new(config.canvas.width as i32, config.canvas.height as i32);
    scene.load(&mut world, &mut renderer)?;
    info!(
        tiles = world.tiles().len(),
        enemies = world.enemies().len(),
        sprites = renderer.loaded_sprite_count(),
        "scene_loaded"
    );

    event_loop.set_control_flow(ControlFlow::Poll);

    let frame_interval =
        normalize_non_zero_duration(config.frame_interval, Duration::from_millis(16));
    let metrics_log_interval =
        normalize_non_zero_duration(config.metrics_log_interval, Duration::from_secs(1));
    let slow_frame_delay = resolve_slow_frame_delay(config.simulated_slow_frame_ms);
    info!(
        canvas_width = config.canvas.width,
        canvas_height = config.canvas.height,
        window_scale = config.window_scale,
        frame_interval_ms = frame_interval.as_millis() as u64,
        metrics_log_interval_ms = metrics_log_interval.as_millis() as u64,
        slow_frame_delay_ms = slow_frame_delay.as_millis() as u64,
        "loop_config"
    );

    let mut input_collector = InputCollector::default();
    let mut sorter = DrawSorter::default();
    let mut last_frame_instant = Instant::now();
    let mut metrics_accumulator = MetricsAccumulator::new(metrics_log_interval);
    let mut last_applied_title: Option<String> = None;

    event_loop
        .run(move |event, window_target| match event {
            Event::WindowEvent { window_id, event } if window_id == window_for_loop.id() => {
                match event {
                    WindowEvent::CloseRequested => {
                        input_collector.mark_quit_requested();
                        info!(reason = "window_close", "shutdown_requested");
                        window_target.exit();
                    }
                    WindowEvent::Resized(new_size) => {
                        if let Err(error) = renderer.resize(new_size.width, new_size.height) {
                            warn!(error = %error, "renderer_resize_failed");
                            window_target.exit();
                        }
                    }
                    WindowEvent::ScaleFactorChanged { .. } => {
                        let size = window_for_loop.inner_size();
                        if let Err(error) = renderer.resize(size.width, size.height) {
                            warn!(error = %error, "renderer_resize_failed");
                            window_target.exit();
                        }
                    }
                    WindowEvent::KeyboardInput { event, .. } => {
                        input_collector.handle_keyboard_input(&event);
                        if input_collector.quit_requested {
                            info!(reason = "escape_key", "shutdown_requested");
                            window_target.exit();
                        }
                    }
                    WindowEvent::RedrawRequested => {
                        let frame_started = Instant::now();
                        if slow_frame_delay > Duration::ZERO {
                            // Debug perturbation only, separate from frame pacing.
                            thread::sleep(slow_frame_delay);
                        }

                        let now = Instant::now();
                        let raw_frame_dt = now.saturating_duration_since(last_frame_instant);
                        last_frame_instant = now;

                        let input_snapshot = input_collector.snapshot_for_tick();
                        match scene.update(&input_snapshot, &mut world) {
                            SceneCommand::None => {}
                            SceneCommand::ReloadLevel => {
                                scene.unload(&mut world);
                                match scene.load(&mut world, &mut renderer) {
                                    Ok(()) => info!(
                                        tiles = world.tiles().len(),
                                        enemies = world.enemies().len(),
                                        "scene_loaded"
                                    ),
                                    Err(error) => {
                                        error!(error = %error, "level_reload_failed");
                                    }
                                }
                            }
                            SceneCommand::Quit => {
                                info!(reason = "scene_command", "shutdown_requested");
                                window_target.exit();
                            }
                        }
                        metrics_accumulator.record_tick();

                        renderer.begin_frame(world.background().to_rgba(), world.camera());
                        scene.render(&world, &mut sorter);
                        let drawn = sorter.flush(&mut renderer);
                        sorter.reset();
                        if let Err(error) = renderer.present() {
                            warn!(error = %error, "renderer_draw_failed");
                            window_target.exit();
                        }

                        let next_title = scene.debug_title(&world);
                        if next_title != last_applied_title {
                            match &next_title {
                                Some(title) => window_for_loop.set_title(title),
                                None => window_for_loop.set_title(&config.window_title),
                            }
                            last_applied_title = next_title;
                        }

                        let cap_sleep = compute_cap_sleep(
                            Instant::now().saturating_duration_since(frame_started),
                            Some(frame_interval),
                        );
                        if cap_sleep > Duration::ZERO {
                            thread::sleep(cap_sleep);
                        }

                        metrics_accumulator.record_frame(raw_frame_dt, drawn);
                        if let Some(snapshot) = metrics_accumulator.maybe_snapshot(now) {
                            info!(
                                fps = snapshot.fps,
                                tps = snapshot.tps,
                                frame_time_ms = snapshot.frame_time_ms,
                                draws_per_frame = snapshot.draws_per_frame,
                                enemies = world.enemies().len(),
                                "loop_metrics"
                            );
                        }
                    }
                    _ => {}
                }
            }
            Event::AboutToWait => {
                window_for_loop.request_redraw();
            }
            Event::LoopExiting => {
                scene.unload(&mut world);
                info!(ticks = world.ticks(), "shutdown");
            }
            _ => {}
        })
        .map_err(AppError::EventLoopRun)
}

#[derive(Debug, Default)]
struct InputCollector {
    quit_requested: bool,
    reload_key_is_down: bool,
    reload_pressed_edge: bool,
    action_states: ActionStates,
}

impl InputCollector {
    fn mark_quit_requested(&mut self) {
        self.quit_requested = true;
    }

    fn handle_keyboard_input(&mut self, key_event: &KeyEvent) {
        let is_pressed = key_event.state == ElementState::Pressed;
        self.update_action_state_from_physical_key(key_event.physical_key, is_pressed);
        self.handle_reload_key_state(is_reload_key(key_event.physical_key), key_event.state);
    }

    fn handle_reload_key_state(&mut self, is_reload_key: bool, state: ElementState) {
        if !is_reload_key {
            return;
        }

        match state {
            ElementState::Pressed => {
                if !self.reload_key_is_down {
                    self.reload_pressed_edge = true;
                }
                self.reload_key_is_down = true;
            }
            ElementState::Released => self.reload_key_is_down = false,
        }
    }

    fn snapshot_for_tick(&mut self) -> InputSnapshot {
        let snapshot = InputSnapshot::new(
            self.quit_requested,
            self.reload_pressed_edge,
            self.action_states,
        );
        self.reload_pressed_edge = false;
        snapshot
    }

    fn update_action_state_from_physical_key(&mut self, key: PhysicalKey, is_pressed: bool) {
        let PhysicalKey::Code(code) = key else {
            return;
        };
        match code {
            KeyCode::KeyA | KeyCode::ArrowLeft => {
                self.action_states.set(InputAction::MoveLeft, is_pressed);
            }
            KeyCode::KeyD | KeyCode::ArrowRight => {
                self.action_states.set(InputAction::MoveRight, is_pressed);
            }
            KeyCode::KeyS | KeyCode::ArrowDown => {
                self.action_states.set(InputAction::Crouch, is_pressed);
            }
            KeyCode::KeyJ | KeyCode::Space => {
                self.action_states.set(InputAction::Jump, is_pressed);
            }
            KeyCode::KeyK | KeyCode::ShiftLeft => {
                self.action_states.set(InputAction::Dash, is_pressed);
            }
            KeyCode::Escape => {
                self.action_states.set(InputAction::Quit, is_pressed);
                if is_pressed {
                    self.mark_quit_requested();
                }
            }
            _ => {}
        }
    }
}

fn is_reload_key(key: PhysicalKey) -> bool {
    matches!(key, PhysicalKey::Code(KeyCode::F5))
}

fn normalize_non_zero_duration(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}

fn compute_cap_sleep(elapsed: Duration, target: Option<Duration>) -> Duration {
    match target {
        Some(frame_target) if elapsed < frame_target => frame_target - elapsed,
        _ => Duration::ZERO,
    }
}

fn resolve_slow_frame_delay(config_slow_frame_ms: u64) -> Duration {
    parse_slow_frame_delay(env::var(SLOW_FRAME_ENV_VAR), config_slow_frame_ms)
}

fn parse_slow_frame_delay(
    value: Result<String, env::VarError>,
    config_slow_frame_ms: u64,
) -> Duration {
    match value {
        Ok(value) => match value.trim().parse::<u64>() {
            Ok(ms) => Duration::from_millis(ms),
            Err(_) => {
                warn!(
                    env_var = SLOW_FRAME_ENV_VAR,
                    value = value.as_str(),
                    "invalid slow-frame env var value; falling back to config"
                );
                Duration::from_millis(config_slow_frame_ms)
            }
        },
        Err(env::VarError::NotPresent) => Duration::from_millis(config_slow_frame_ms),
        Err(err) => {
            warn!(
                env_var = SLOW_FRAME_ENV_VAR,
                error = %err,
                "unable to read slow-frame env var; falling back to config"
            );
            Duration::from_millis(config_slow_frame_ms)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_scales_canvas_to_window() {
        let config = LoopConfig::default();
        assert_eq!(config.canvas.width, 256);
        assert_eq!(config.canvas.height, 224);
        assert_eq!(config.window_size(), (1024, 896));
        assert_eq!(config.frame_interval, Duration::from_millis(16));
    }

    #[test]
    fn zero_window_scale_falls_back_to_canvas_size() {
        let config = LoopConfig {
            window_scale: 0,
            ..LoopConfig::default()
        };
        assert_eq!(config.window_size(), (256, 224));
    }

    #[test]
    fn reload_press_is_edge_triggered_for_single_tick() {
        let mut input = InputCollector::default();
        input.handle_reload_key_state(true, ElementState::Pressed);

        let first = input.snapshot_for_tick();
        let second = input.snapshot_for_tick();

        assert!(first.reload_pressed());
        assert!(!second.reload_pressed());
    }

    #[test]
    fn held_reload_does_not_spam_press_edges() {
        let mut input = InputCollector::default();

        input.handle_reload_key_state(true, ElementState::Pressed);
        let first = input.snapshot_for_tick();

        input.handle_reload_key_state(true, ElementState::Pressed);
        let second = input.snapshot_for_tick();

        input.handle_reload_key_state(true, ElementState::Released);
        input.handle_reload_key_state(true, ElementState::Pressed);
        let third = input.snapshot_for_tick();

        assert!(first.reload_pressed());
        assert!(!second.reload_pressed());
        assert!(third.reload_pressed());
    }

    #[test]
    fn non_reload_keys_are_ignored_by_reload_edge() {
        let mut input = InputCollector::default();
        let is_f9_reload = is_reload_key(PhysicalKey::Code(KeyCode::F9));
        input.handle_reload_key_state(is_f9_reload, ElementState::Pressed);
        assert!(!input.snapshot_for_tick().reload_pressed());
        assert!(is_reload_key(PhysicalKey::Code(KeyCode::F5)));
    }

    #[test]
    fn letter_and_arrow_keys_map_to_actions() {
        let mut input = InputCollector::default();

        input.update_action_state_from_physical_key(PhysicalKey::Code(KeyCode::KeyA), true);
        input.update_action_state_from_physical_key(PhysicalKey::Code(KeyCode::ArrowRight), true);
        input.update_action_state_from_physical_key(PhysicalKey::Code(KeyCode::ArrowDown), true);
        input.update_action_state_from_physical_key(PhysicalKey::Code(KeyCode::Space), true);
        input.update_action_state_from_physical_key(PhysicalKey::Code(KeyCode::ShiftLeft), true);

        let snapshot = input.snapshot_for_tick();
        assert!(snapshot.is_down(InputAction::MoveLeft));
        assert!(snapshot.is_down(InputAction::MoveRight));
        assert!(snapshot.is_down(InputAction::Crouch));
        assert!(snapshot.is_down(InputAction::Jump));
        assert!(snapshot.is_down(InputAction::Dash));
        assert!(!snapshot.quit_requested());
    }

    #[test]
    fn key_release_clears_action_state() {
        let mut input = InputCollector::default();
        input.update_action_state_from_physical_key(PhysicalKey::Code(KeyCode::KeyJ), true);
        input.update_action_state_from_physical_key(PhysicalKey::Code(KeyCode::KeyJ), false);

        let snapshot = input.snapshot_for_tick();
        assert!(!snapshot.is_down(InputAction::Jump));
    }

    #[test]
    fn held_action_persists_across_snapshots() {
        let mut input = InputCollector::default();
        input.update_action_state_from_physical_key(PhysicalKey::Code(KeyCode::KeyK), true);

        assert!(input.snapshot_for_tick().is_down(InputAction::Dash));
        assert!(input.snapshot_for_tick().is_down(InputAction::Dash));
    }

    #[test]
    fn escape_marks_quit_requested() {
        let mut input = InputCollector::default();
        input.update_action_state_from_physical_key(PhysicalKey::Code(KeyCode::Escape), true);

        let snapshot = input.snapshot_for_tick();
        assert!(snapshot.quit_requested());
        assert!(snapshot.is_down(InputAction::Quit));
    }

    #[test]
    fn compute_cap_sleep_fills_remaining_frame_interval() {
        let target = Some(Duration::from_millis(16));
        assert_eq!(
            compute_cap_sleep(Duration::from_millis(5), target),
            Duration::from_millis(11)
        );
        assert_eq!(compute_cap_sleep(Duration::from_millis(20), target), Duration::ZERO);
        assert_eq!(compute_cap_sleep(Duration::from_millis(5), None), Duration::ZERO);
    }

    #[test]
    fn zero_durations_fall_back() {
        assert_eq!(
            normalize_non_zero_duration(Duration::ZERO, Duration::from_secs(1)),
            Duration::from_secs(1)
        );
        assert_eq!(
            normalize_non_zero_duration(Duration::from_millis(8), Duration::from_secs(1)),
            Duration::from_millis(8)
        );
    }

    #[test]
    fn slow_frame_value_parsing() {
        assert_eq!(
            parse_slow_frame_delay(Ok("25".to_string()), 0),
            Duration::from_millis(25)
        );
        assert_eq!(
            parse_slow_frame_delay(Ok("fast".to_string()), 7),
            Duration::from_millis(7)
        );
        assert_eq!(
            parse_slow_frame_delay(Err(env::VarError::NotPresent), 3),
            Duration::from_millis(3)
        );
    }
}
