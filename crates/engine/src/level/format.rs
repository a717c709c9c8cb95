use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

const HEADER_FIELD_COUNT: usize = 6;
const RECORD_FIELD_COUNT: usize = 3;
const FIELD_SIZE: usize = std::mem::size_of::<i32>();
const RECORD_SIZE: usize = RECORD_FIELD_COUNT * FIELD_SIZE;

/// Background clear color as stored in the level header. Channels are kept as
/// the raw signed integers the format carries; clamping happens at draw time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackgroundColor {
    pub r: i32,
    pub g: i32,
    pub b: i32,
}

impl BackgroundColor {
    pub fn to_rgba(self) -> [u8; 4] {
        [
            clamp_channel(self.r),
            clamp_channel(self.g),
            clamp_channel(self.b),
            255,
        ]
    }
}

fn clamp_channel(value: i32) -> u8 {
    value.clamp(0, u8::MAX as i32) as u8
}

/// One tile record in stored (editor) coordinates: `y` grows downward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileRecord {
    pub visual_kind: i32,
    pub x: i32,
    pub y: i32,
}

/// One spawn record in stored (editor) coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnRecord {
    pub kind: i32,
    pub x: i32,
    pub y: i32,
}

/// Decoded level file. Coordinates are exactly what the file stores; the
/// world-space transform is applied when the level is instantiated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelData {
    pub background: BackgroundColor,
    pub background_tiles: Vec<TileRecord>,
    pub collision_tiles: Vec<TileRecord>,
    pub spawns: Vec<SpawnRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelSection {
    Header,
    BackgroundTiles,
    CollisionTiles,
    Spawns,
}

impl std::fmt::Display for LevelSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            LevelSection::Header => "header",
            LevelSection::BackgroundTiles => "background tiles",
            LevelSection::CollisionTiles => "collision tiles",
            LevelSection::Spawns => "spawns",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LevelFormatError {
    #[error("unexpected end of level data in {section} at byte {offset}: needed {needed} bytes, {available} available")]
    UnexpectedEnd {
        section: LevelSection,
        offset: usize,
        needed: usize,
        available: usize,
    },
    #[error("negative {section} count {count}")]
    NegativeCount { section: LevelSection, count: i32 },
    #[error("{section} count {count} does not fit in the remaining {available} bytes")]
    CountExceedsData {
        section: LevelSection,
        count: usize,
        available: usize,
    },
}

/// Decodes a level blob. Either every collection is produced or an error is
/// returned; nothing partial escapes.
pub fn decode_level(bytes: &[u8]) -> Result<LevelData, LevelFormatError> {
    let mut cursor = 0usize;

    let r = read_i32(bytes, &mut cursor, LevelSection::Header)?;
    let g = read_i32(bytes, &mut cursor, LevelSection::Header)?;
    let b = read_i32(bytes, &mut cursor, LevelSection::Header)?;
    let background_count = read_count(bytes, &mut cursor, LevelSection::BackgroundTiles)?;
    let collision_count = read_count(bytes, &mut cursor, LevelSection::CollisionTiles)?;
    let spawn_count = read_count(bytes, &mut cursor, LevelSection::Spawns)?;

    let background_tiles =
        read_tile_records(bytes, &mut cursor, background_count, LevelSection::BackgroundTiles)?;
    let collision_tiles =
        read_tile_records(bytes, &mut cursor, collision_count, LevelSection::CollisionTiles)?;

    ensure_records_fit(bytes, cursor, spawn_count, LevelSection::Spawns)?;
    let mut spawns = Vec::with_capacity(spawn_count);
    for _ in 0..spawn_count {
        let kind = read_i32(bytes, &mut cursor, LevelSection::Spawns)?;
        let x = read_i32(bytes, &mut cursor, LevelSection::Spawns)?;
        let y = read_i32(bytes, &mut cursor, LevelSection::Spawns)?;
        spawns.push(SpawnRecord { kind, x, y });
    }

    if cursor != bytes.len() {
        debug!(
            trailing_bytes = bytes.len() - cursor,
            "level_trailing_bytes_ignored"
        );
    }

    Ok(LevelData {
        background: BackgroundColor { r, g, b },
        background_tiles,
        collision_tiles,
        spawns,
    })
}

pub fn encode_level(level: &LevelData) -> Vec<u8> {
    let record_count =
        level.background_tiles.len() + level.collision_tiles.len() + level.spawns.len();
    let mut bytes =
        Vec::<u8>::with_capacity(HEADER_FIELD_COUNT * FIELD_SIZE + record_count * RECORD_SIZE);

    for value in [level.background.r, level.background.g, level.background.b] {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    for count in [
        level.background_tiles.len(),
        level.collision_tiles.len(),
        level.spawns.len(),
    ] {
        bytes.extend_from_slice(&(count as i32).to_le_bytes());
    }
    for tile in level
        .background_tiles
        .iter()
        .chain(level.collision_tiles.iter())
    {
        write_record(&mut bytes, tile.visual_kind, tile.x, tile.y);
    }
    for spawn in &level.spawns {
        write_record(&mut bytes, spawn.kind, spawn.x, spawn.y);
    }
    bytes
}

fn write_record(target: &mut Vec<u8>, first: i32, x: i32, y: i32) {
    target.extend_from_slice(&first.to_le_bytes());
    target.extend_from_slice(&x.to_le_bytes());
    target.extend_from_slice(&y.to_le_bytes());
}

fn read_tile_records(
    bytes: &[u8],
    cursor: &mut usize,
    count: usize,
    section: LevelSection,
) -> Result<Vec<TileRecord>, LevelFormatError> {
    ensure_records_fit(bytes, *cursor, count, section)?;
    let mut records = Vec::with_capacity(count);
    for _ in 0..count {
        let visual_kind = read_i32(bytes, cursor, section)?;
        let x = read_i32(bytes, cursor, section)?;
        let y = read_i32(bytes, cursor, section)?;
        records.push(TileRecord { visual_kind, x, y });
    }
    Ok(records)
}

fn read_count(
    bytes: &[u8],
    cursor: &mut usize,
    section: LevelSection,
) -> Result<usize, LevelFormatError> {
    let count = read_i32(bytes, cursor, LevelSection::Header)?;
    usize::try_from(count).map_err(|_| LevelFormatError::NegativeCount { section, count })
}

// Checked before allocating so a corrupt count cannot request a huge buffer.
fn ensure_records_fit(
    bytes: &[u8],
    cursor: usize,
    count: usize,
    section: LevelSection,
) -> Result<(), LevelFormatError> {
    let available = bytes.len().saturating_sub(cursor);
    match count.checked_mul(RECORD_SIZE) {
        Some(needed) if needed <= available => Ok(()),
        _ => Err(LevelFormatError::CountExceedsData {
            section,
            count,
            available,
        }),
    }
}

fn read_i32(
    bytes: &[u8],
    cursor: &mut usize,
    section: LevelSection,
) -> Result<i32, LevelFormatError> {
    let raw = read_exact(bytes, cursor, FIELD_SIZE, section)?;
    let mut word = [0u8; FIELD_SIZE];
    word.copy_from_slice(raw);
    Ok(i32::from_le_bytes(word))
}

fn read_exact<'a>(
    bytes: &'a [u8],
    cursor: &mut usize,
    len: usize,
    section: LevelSection,
) -> Result<&'a [u8], LevelFormatError> {
    let end = cursor.saturating_add(len);
    if end > bytes.len() {
        return Err(LevelFormatError::UnexpectedEnd {
            section,
            offset: *cursor,
            needed: len,
            available: bytes.len().saturating_sub(*cursor),
        });
    }
    let out = &bytes[*cursor..end];
    *cursor = end;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_level() -> LevelData {
        LevelData {
            background: BackgroundColor {
                r: 10,
                g: 20,
                b: 30,
            },
            background_tiles: vec![TileRecord {
                visual_kind: 2,
                x: 5,
                y: 7,
            }],
            collision_tiles: vec![TileRecord {
                visual_kind: 0,
                x: 0,
                y: 0,
            }],
            spawns: vec![SpawnRecord {
                kind: 0,
                x: 100,
                y: 50,
            }],
        }
    }

    fn words(values: &[i32]) -> Vec<u8> {
        values.iter().flat_map(|value| value.to_le_bytes()).collect()
    }

    #[test]
    fn decodes_handwritten_layout_field_by_field() {
        let bytes = words(&[
            10, 20, 30, // background
            1, 1, 1, // counts
            2, 5, 7, // background tile
            0, 0, 0, // collision tile
            0, 100, 50, // player spawn
        ]);

        let level = decode_level(&bytes).expect("decode");
        assert_eq!(level, sample_level());
    }

    #[test]
    fn encoder_writes_little_endian_sections_in_order() {
        let bytes = encode_level(&sample_level());
        assert_eq!(bytes.len(), (6 + 9) * 4);
        assert_eq!(&bytes[0..4], &10i32.to_le_bytes());
        assert_eq!(&bytes[12..16], &1i32.to_le_bytes());
        // spawn record is last: kind, x, y
        assert_eq!(&bytes[48..52], &0i32.to_le_bytes());
        assert_eq!(&bytes[52..56], &100i32.to_le_bytes());
        assert_eq!(&bytes[56..60], &50i32.to_le_bytes());
    }

    #[test]
    fn empty_level_has_only_a_header() {
        let bytes = words(&[0, 0, 0, 0, 0, 0]);
        let level = decode_level(&bytes).expect("decode");
        assert!(level.background_tiles.is_empty());
        assert!(level.collision_tiles.is_empty());
        assert!(level.spawns.is_empty());
    }

    #[test]
    fn truncated_header_is_rejected() {
        let bytes = words(&[1, 2, 3, 0]);
        let error = decode_level(&bytes).expect_err("truncated");
        assert!(matches!(
            error,
            LevelFormatError::UnexpectedEnd {
                section: LevelSection::Header,
                offset: 16,
                ..
            }
        ));
    }

    #[test]
    fn declared_count_larger_than_data_is_rejected_before_reading() {
        let mut bytes = words(&[0, 0, 0, 0, 3, 0]);
        bytes.extend(words(&[1, 16, 16]));
        let error = decode_level(&bytes).expect_err("count too large");
        assert_eq!(
            error,
            LevelFormatError::CountExceedsData {
                section: LevelSection::CollisionTiles,
                count: 3,
                available: 12,
            }
        );
    }

    #[test]
    fn partial_trailing_record_is_rejected() {
        let mut bytes = encode_level(&sample_level());
        bytes.truncate(bytes.len() - 2);
        let error = decode_level(&bytes).expect_err("partial record");
        assert!(matches!(
            error,
            LevelFormatError::CountExceedsData {
                section: LevelSection::Spawns,
                ..
            }
        ));
    }

    #[test]
    fn negative_count_is_rejected() {
        let bytes = words(&[0, 0, 0, -1, 0, 0]);
        let error = decode_level(&bytes).expect_err("negative");
        assert_eq!(
            error,
            LevelFormatError::NegativeCount {
                section: LevelSection::BackgroundTiles,
                count: -1,
            }
        );
    }

    #[test]
    fn trailing_bytes_are_ignored() {
        let mut bytes = encode_level(&sample_level());
        bytes.extend_from_slice(&[0xAA, 0xBB]);
        let level = decode_level(&bytes).expect("decode");
        assert_eq!(level, sample_level());
    }

    #[test]
    fn reserved_spawn_kinds_decode_without_error() {
        let mut level = sample_level();
        level.spawns.extend((2..=5).map(|kind| SpawnRecord { kind, x: 1, y: 1 }));
        let decoded = decode_level(&encode_level(&level)).expect("decode");
        assert_eq!(decoded.spawns.len(), 5);
    }

    #[test]
    fn background_color_clamps_to_byte_range() {
        let color = BackgroundColor {
            r: -4,
            g: 128,
            b: 999,
        };
        assert_eq!(color.to_rgba(), [0, 128, 255, 255]);
    }
}
