//! Decode a buffer dump and display the reconstructed rooms.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use map_core::{CoordinateOrigin, DungeonMap, Floor, MapUpdate, Room, SystemClock};
use serde::Serialize;

use crate::config::XtaskConfig;

/// Decode a buffer dump
#[derive(Parser)]
pub struct Decode {
    /// JSON buffer dump (array of 16384 classification codes)
    #[arg(value_name = "BUFFER")]
    buffer: PathBuf,

    /// Floor identifier (E, F1..F7, M1..M7); defaults to the configured floor
    #[arg(short, long, value_name = "FLOOR")]
    floor: Option<Floor>,

    /// Output format
    #[arg(long, value_enum, default_value = "summary")]
    format: OutputFormat,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    /// Summary view (origin, update counts, one line per room)
    Summary,
    /// Full JSON output
    Json,
}

#[derive(Serialize)]
struct DecodeReport<'a> {
    floor: Floor,
    origin: Option<&'a CoordinateOrigin>,
    update: MapUpdate,
    rooms: Vec<RoomReport<'a>>,
}

#[derive(Serialize)]
struct RoomReport<'a> {
    id: u32,
    #[serde(flatten)]
    room: &'a Room,
}

impl Decode {
    pub fn execute(self, config: &XtaskConfig) -> Result<()> {
        let floor = self.floor.unwrap_or(config.floor);
        let buffer = super::load_buffer(&self.buffer)?;
        let (map, update) = super::decode_buffer(&buffer, floor, config.map_config());

        println!(
            "{} {}",
            style("Buffer File:").bold().cyan(),
            self.buffer.display()
        );
        println!("{} {}", style("Floor:").bold().cyan(), floor);
        println!();

        match self.format {
            OutputFormat::Summary => print_summary(&map, &update),
            OutputFormat::Json => print_json(&map, update)?,
        }

        Ok(())
    }
}

fn print_summary(map: &DungeonMap<SystemClock>, update: &MapUpdate) {
    println!("{}", style("=== Map Summary ===").bold().green());
    println!();

    let Some(origin) = map.origin() else {
        println!("{}", style("No room found; origin unknown").yellow());
        return;
    };

    println!("{}", style("Origin:").bold().yellow());
    println!("  Offset: ({}, {})", origin.offset().x, origin.offset().y);
    println!("  Cell Size: {} px", origin.cell_pixel_size());
    println!("  Room Width: {} px", origin.room_image_width());
    println!();

    println!("{}", style("Update:").bold().yellow());
    println!("  Created: {}", update.created);
    println!("  Reclassified: {}", update.reclassified);
    println!("  Merged: {}", update.merged);
    println!();

    println!("{}", style("Rooms:").bold().yellow());
    for (id, room) in map.rooms() {
        let cells: Vec<String> = room.components().iter().map(ToString::to_string).collect();
        println!(
            "  {} {:<8} {}",
            id,
            room.room_type().as_ref(),
            cells.join(" ")
        );
    }
}

fn print_json(map: &DungeonMap<SystemClock>, update: MapUpdate) -> Result<()> {
    let report = DecodeReport {
        floor: map.floor(),
        origin: map.origin(),
        update,
        rooms: map
            .rooms()
            .map(|(id, room)| RoomReport { id: id.0, room })
            .collect(),
    };
    let json =
        serde_json::to_string_pretty(&report).context("Failed to serialize map to JSON")?;
    println!("{}", json);
    Ok(())
}
