//! Write a sample buffer dump for trying out the other commands.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use map_core::{BufferBuilder, MapConfig, PixelBuffer, Position, RoomType};

/// Write a sample buffer dump
#[derive(Parser)]
pub struct Sample {
    /// Output file (prints to stdout if omitted)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,
}

impl Sample {
    pub fn execute(self) -> Result<()> {
        let json = serde_json::to_string(&sample_buffer()).context("Failed to serialize buffer")?;

        match self.output {
            Some(path) => {
                std::fs::write(&path, json)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                println!("{} {}", style("Wrote sample buffer:").bold().green(), path.display());
            }
            None => println!("{}", json),
        }
        Ok(())
    }
}

/// A small floor: every special room once, an L-shaped normal room and a
/// 2x1 normal room.
pub fn sample_buffer() -> PixelBuffer {
    let normal = MapConfig::NORMAL_ROOM_CODE;
    let mut builder = BufferBuilder::blank()
        .room(Position::new(0, 5), RoomType::Spawn.code())
        .room(Position::new(5, 0), RoomType::Blood.code())
        .room(Position::new(2, 3), RoomType::Fairy.code())
        .room(Position::new(4, 4), RoomType::Puzzle.code())
        .room(Position::new(0, 0), RoomType::Trap.code())
        .room(Position::new(3, 5), RoomType::Miniboss.code());

    // L-shape: (1, 1) - (2, 1) - (2, 2)
    builder = builder
        .room(Position::new(1, 1), normal)
        .connect_right(Position::new(1, 1), normal)
        .room(Position::new(2, 1), normal)
        .connect_down(Position::new(2, 1), normal)
        .room(Position::new(2, 2), normal);

    // 2x1: (4, 2) - (5, 2)
    builder
        .room(Position::new(4, 2), normal)
        .connect_right(Position::new(4, 2), normal)
        .room(Position::new(5, 2), normal)
        .build()
}
