mod format;
mod io;
mod spawn;

pub use format::{
    decode_level, encode_level, BackgroundColor, LevelData, LevelFormatError, LevelSection,
    SpawnRecord, TileRecord,
};
pub use io::{level_fingerprint, read_level_file, write_level_file, LevelIoError};
pub use spawn::SpawnKind;
