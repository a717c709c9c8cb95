use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

pub(crate) const SETTINGS_FILE_NAME: &str = "platformer.json";
pub(crate) const LEVEL_ENV_VAR: &str = "PLATFORMER_LEVEL";

/// Optional overrides read from `platformer.json` at the project root.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct GameSettings {
    /// Relative paths resolve against the project root.
    pub(crate) level_path: PathBuf,
    pub(crate) window_scale: u32,
    pub(crate) frame_interval_ms: u64,
    pub(crate) window_title: String,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            level_path: PathBuf::from("assets/levels/demo.lvl"),
            window_scale: 4,
            frame_interval_ms: 16,
            window_title: "Platformer".to_string(),
        }
    }
}

impl GameSettings {
    pub(crate) fn resolved_level_path(&self, root: &Path) -> PathBuf {
        if self.level_path.is_absolute() {
            self.level_path.clone()
        } else {
            root.join(&self.level_path)
        }
    }
}

#[derive(Debug, Error)]
pub(crate) enum SettingsError {
    #[error("failed to read settings file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("settings file {path} is invalid at {field}: {source}")]
    Parse {
        path: PathBuf,
        field: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("settings field {field} is invalid: {message}")]
    Invalid {
        field: &'static str,
        message: &'static str,
    },
}

/// Loads `platformer.json` from `root` when present, then applies the level
/// override.
pub(crate) fn load_settings(
    root: &Path,
    level_override: Option<&str>,
) -> Result<GameSettings, SettingsError> {
    let path = root.join(SETTINGS_FILE_NAME);
    let mut settings = match fs::read_to_string(&path) {
        Ok(raw) => {
            let parsed = parse_settings_json(&path, &raw)?;
            info!(path = %path.display(), "settings_loaded");
            parsed
        }
        Err(source) if source.kind() == io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "settings_file_absent_using_defaults");
            GameSettings::default()
        }
        Err(source) => return Err(SettingsError::Read { path, source }),
    };

    if let Some(level) = level_override.map(str::trim).filter(|value| !value.is_empty()) {
        info!(env_var = LEVEL_ENV_VAR, level_path = level, "level_path_overridden");
        settings.level_path = PathBuf::from(level);
    }

    validate_settings(&settings)?;
    Ok(settings)
}

fn parse_settings_json(path: &Path, raw: &str) -> Result<GameSettings, SettingsError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    serde_path_to_error::deserialize::<_, GameSettings>(&mut deserializer).map_err(|error| {
        let field = error.path().to_string();
        SettingsError::Parse {
            path: path.to_path_buf(),
            field,
            source: error.into_inner(),
        }
    })
}

fn validate_settings(settings: &GameSettings) -> Result<(), SettingsError> {
    if settings.window_scale == 0 {
        return Err(SettingsError::Invalid {
            field: "window_scale",
            message: "must be at least 1",
        });
    }
    if settings.frame_interval_ms == 0 {
        return Err(SettingsError::Invalid {
            field: "frame_interval_ms",
            message: "must be at least 1",
        });
    }
    if settings.level_path.as_os_str().is_empty() {
        return Err(SettingsError::Invalid {
            field: "level_path",
            message: "must not be empty",
        });
    }
    Ok(())
}
