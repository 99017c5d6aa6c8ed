//! Command implementations for xtask
//!
//! Each command is a separate module that implements its own CLI args and execution logic.

mod decode;
mod render;
mod sample;

pub use decode::Decode;
pub use render::Render;
pub use sample::Sample;

use std::path::Path;

use anyhow::{Context, Result};
use map_core::{DungeonMap, Floor, MapConfig, MapUpdate, PixelBuffer, SystemClock};

/// Reads a buffer dump: a JSON array of one classification code per pixel.
pub fn load_buffer(path: &Path) -> Result<PixelBuffer> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read buffer dump: {}", path.display()))?;
    parse_buffer(&text).with_context(|| format!("Invalid buffer dump: {}", path.display()))
}

pub fn parse_buffer(json: &str) -> Result<PixelBuffer> {
    let buffer: PixelBuffer = serde_json::from_str(json)?;
    Ok(buffer)
}

/// Decodes one buffer into a fresh map.
pub fn decode_buffer(
    buffer: &PixelBuffer,
    floor: Floor,
    config: MapConfig,
) -> (DungeonMap<SystemClock>, MapUpdate) {
    let mut map = DungeonMap::with_config(floor, config, SystemClock);
    let update = map.update(buffer);
    tracing::debug!("Decoded {} rooms on floor {}", map.registry().len(), floor);
    (map, update)
}

#[cfg(test)]
mod tests {
    use map_core::{BufferBuilder, Position, RoomType};

    use super::*;

    #[test]
    fn short_dump_is_rejected() {
        assert!(parse_buffer("[0, 1, 2]").is_err());
        assert!(parse_buffer("{}").is_err());
    }

    #[test]
    fn dump_decodes_into_rooms() {
        let buffer = BufferBuilder::blank().room(Position::new(1, 1), 18).build();
        let json = serde_json::to_string(&buffer).unwrap();

        let parsed = parse_buffer(&json).unwrap();
        let (map, update) = decode_buffer(&parsed, Floor::Catacombs(5), MapConfig::default());

        assert_eq!(update.created, 1);
        assert_eq!(map.room_at(Position::new(1, 1)).unwrap().room_type(), RoomType::Blood);
    }
}
