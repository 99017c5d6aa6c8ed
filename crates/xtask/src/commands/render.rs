//! Decode a buffer dump and draw it through a render context.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use map_core::Floor;
use map_render::{RenderContextManager, SettingsManager, SettingsPatch, TextRenderer, room_rects};

use crate::config::XtaskConfig;

/// Draw a buffer dump as text
#[derive(Parser)]
pub struct Render {
    /// JSON buffer dump (array of 16384 classification codes)
    #[arg(value_name = "BUFFER")]
    buffer: PathBuf,

    /// Floor identifier (E, F1..F7, M1..M7); defaults to the configured floor
    #[arg(short, long, value_name = "FLOOR")]
    floor: Option<Floor>,

    /// Print the screen rectangles of every room as well
    #[arg(long)]
    rects: bool,
}

impl Render {
    pub fn execute(self, config: &XtaskConfig) -> Result<()> {
        let floor = self.floor.unwrap_or(config.floor);
        let buffer = super::load_buffer(&self.buffer)?;
        let (map, _) = super::decode_buffer(&buffer, floor, config.map_config());

        let settings_path = config.settings_path();
        let mut settings = SettingsManager::load(&settings_path).with_context(|| {
            format!("Failed to load render settings: {}", settings_path.display())
        })?;
        let mut contexts = RenderContextManager::new();
        let id = settings.create_context(&mut contexts, SettingsPatch::default());

        let text = contexts
            .draw(id, &map, &mut TextRenderer)
            .context("Render context vanished before drawing")?;

        println!("{} {}", style("Floor:").bold().cyan(), floor);
        println!();
        println!("{}", text);

        if self.rects {
            let resolved = settings.base();
            println!();
            println!("{}", style("Room Rects:").bold().yellow());
            for (id, room) in map.rooms() {
                for rect in room_rects(room, resolved) {
                    println!(
                        "  {} {:<8} x={} y={} w={} h={}",
                        id,
                        room.room_type().as_ref(),
                        rect.x,
                        rect.y,
                        rect.width,
                        rect.height
                    );
                }
            }
        }

        Ok(())
    }
}
