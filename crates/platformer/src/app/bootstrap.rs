use std::env;
use std::time::Duration;

use engine::{resolve_app_paths, LoopConfig, Scene, StartupError};
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

use super::level_scene::LevelScene;
use super::settings::{load_settings, SettingsError, LEVEL_ENV_VAR};

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) scene: Box<dyn Scene>,
}

#[derive(Debug, Error)]
pub(crate) enum BootstrapError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
}

pub(crate) fn build_app() -> Result<AppWiring, BootstrapError> {
    init_tracing();
    info!("=== Platformer Startup ===");

    let app_paths = resolve_app_paths()?;
    let level_override = env::var(LEVEL_ENV_VAR).ok();
    let settings = load_settings(&app_paths.root, level_override.as_deref())?;
    let level_path = settings.resolved_level_path(&app_paths.root);
    info!(
        root = %app_paths.root.display(),
        level = %level_path.display(),
        window_scale = settings.window_scale,
        "startup"
    );

    let config = LoopConfig {
        window_title: settings.window_title.clone(),
        window_scale: settings.window_scale,
        frame_interval: Duration::from_millis(settings.frame_interval_ms),
        asset_root: Some(app_paths.assets_dir),
        ..LoopConfig::default()
    };

    Ok(AppWiring {
        config,
        scene: Box::new(LevelScene::new(level_path, settings.window_title)),
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}
