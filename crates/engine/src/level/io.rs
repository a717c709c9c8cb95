use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::info;

use super::format::{decode_level, encode_level, LevelData, LevelFormatError};

#[derive(Debug, Error)]
pub enum LevelIoError {
    #[error("failed to read level file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write level file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("level file {path} is malformed: {source}")]
    Format {
        path: PathBuf,
        #[source]
        source: LevelFormatError,
    },
}

pub fn read_level_file(path: &Path) -> Result<LevelData, LevelIoError> {
    let bytes = fs::read(path).map_err(|source| LevelIoError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let level = decode_level(&bytes).map_err(|source| LevelIoError::Format {
        path: path.to_path_buf(),
        source,
    })?;
    info!(
        path = %path.display(),
        bytes = bytes.len(),
        fingerprint = %level_fingerprint(&bytes),
        background = ?level.background.to_rgba(),
        background_tiles = level.background_tiles.len(),
        collision_tiles = level.collision_tiles.len(),
        spawns = level.spawns.len(),
        "level_loaded"
    );
    Ok(level)
}

/// Encodes and writes `level` through a sibling temp file so a reader never
/// observes a half-written level.
pub fn write_level_file(path: &Path, level: &LevelData) -> Result<(), LevelIoError> {
    write_bytes_atomic(path, &encode_level(level)).map_err(|source| LevelIoError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Lowercase hex SHA-256 of the encoded level bytes.
pub fn level_fingerprint(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}

fn write_bytes_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let tmp_path = temp_path_for(path);
    fs::write(&tmp_path, bytes)?;
    if let Err(error) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(error);
    }
    Ok(())
}

fn temp_path_for(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("level.lvl");
    let tmp_name = format!("{file_name}.tmp");
    match path.parent() {
        Some(parent) => parent.join(tmp_name),
        None => PathBuf::from(tmp_name),
    }
}
