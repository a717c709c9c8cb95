use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use engine::world::{stored_row_to_world_y, ENEMY_SPAWN_Y_OFFSET, PLAYER_SPAWN_Y_OFFSET};
use engine::{
    decode_level, level_fingerprint, write_level_file, LevelData, LevelFormatError, LevelIoError,
    SpawnKind, SpawnRecord,
};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandKind {
    Inspect {
        level: PathBuf,
    },
    ToJson {
        level: PathBuf,
        output: Option<PathBuf>,
    },
    FromJson {
        input: PathBuf,
        output: PathBuf,
    },
}

#[derive(Debug, Error)]
pub enum LevelToolError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("level file {path} is malformed: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: LevelFormatError,
    },
    #[error(transparent)]
    Level(#[from] LevelIoError),
    #[error("{path} is not a valid level document at {field}: {source}")]
    ParseJson {
        path: PathBuf,
        field: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode level as json: {0}")]
    EncodeJson(#[source] serde_json::Error),
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write output: {0}")]
    Output(#[source] io::Error),
}

pub fn run<W: Write>(kind: CommandKind, stdout: &mut W) -> Result<(), LevelToolError> {
    match kind {
        CommandKind::Inspect { level } => {
            let bytes = read_bytes(&level)?;
            let data = decode(&level, &bytes)?;
            write_report(stdout, &level, &level_fingerprint(&bytes), &data)
                .map_err(LevelToolError::Output)
        }
        CommandKind::ToJson { level, output } => {
            let bytes = read_bytes(&level)?;
            let data = decode(&level, &bytes)?;
            let json = level_to_json(&data)?;
            match output {
                Some(path) => fs::write(&path, json + "\n")
                    .map_err(|source| LevelToolError::Write { path, source }),
                None => writeln!(stdout, "{json}").map_err(LevelToolError::Output),
            }
        }
        CommandKind::FromJson { input, output } => {
            let raw = fs::read_to_string(&input).map_err(|source| LevelToolError::Read {
                path: input.clone(),
                source,
            })?;
            let data = parse_level_json(&input, &raw)?;
            write_level_file(&output, &data)?;
            writeln!(
                stdout,
                "wrote {} ({} background tiles, {} collision tiles, {} spawns)",
                output.display(),
                data.background_tiles.len(),
                data.collision_tiles.len(),
                data.spawns.len()
            )
            .map_err(LevelToolError::Output)
        }
    }
}

pub fn level_to_json(level: &LevelData) -> Result<String, LevelToolError> {
    serde_json::to_string_pretty(level).map_err(LevelToolError::EncodeJson)
}

pub fn parse_level_json(path: &Path, raw: &str) -> Result<LevelData, LevelToolError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    serde_path_to_error::deserialize::<_, LevelData>(&mut deserializer).map_err(|error| {
        let field = error.path().to_string();
        LevelToolError::ParseJson {
            path: path.to_path_buf(),
            field,
            source: error.into_inner(),
        }
    })
}

/// Where a spawn lands once the world flips and offsets it, for the kinds
/// the world instantiates.
pub fn spawn_world_position(spawn: &SpawnRecord) -> Option<(i32, i32)> {
    match SpawnKind::from_raw(spawn.kind) {
        SpawnKind::Player => Some((
            spawn.x,
            stored_row_to_world_y(spawn.y, PLAYER_SPAWN_Y_OFFSET),
        )),
        SpawnKind::Enemy => Some((
            spawn.x,
            stored_row_to_world_y(spawn.y, ENEMY_SPAWN_Y_OFFSET),
        )),
        _ => None,
    }
}

fn read_bytes(path: &Path) -> Result<Vec<u8>, LevelToolError> {
    fs::read(path).map_err(|source| LevelToolError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn decode(path: &Path, bytes: &[u8]) -> Result<LevelData, LevelToolError> {
    decode_level(bytes).map_err(|source| LevelToolError::Decode {
        path: path.to_path_buf(),
        source,
    })
}

fn write_report<W: Write>(
    out: &mut W,
    path: &Path,
    fingerprint: &str,
    level: &LevelData,
) -> io::Result<()> {
    let background = level.background;
    writeln!(out, "level: {}", path.display())?;
    writeln!(out, "fingerprint: {fingerprint}")?;
    writeln!(
        out,
        "background: {} {} {}",
        background.r, background.g, background.b
    )?;
    writeln!(out, "background_tiles: {}", level.background_tiles.len())?;
    writeln!(out, "collision_tiles: {}", level.collision_tiles.len())?;
    writeln!(out, "spawns: {}", level.spawns.len())?;
    for (index, spawn) in level.spawns.iter().enumerate() {
        let kind = SpawnKind::from_raw(spawn.kind);
        match spawn_world_position(spawn) {
            Some((x, y)) => writeln!(
                out,
                "  [{index}] {} at ({}, {}) -> world ({x}, {y})",
                kind.label(),
                spawn.x,
                spawn.y
            )?,
            None => writeln!(
                out,
                "  [{index}] {} at ({}, {}) (not instantiated)",
                kind.label(),
                spawn.x,
                spawn.y
            )?,
        }
    }
    Ok(())
}
