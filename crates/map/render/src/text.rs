//! Character-grid renderer.
use map_core::{Clock, DungeonMap, MapConfig, Position, RoomType};

use crate::context::MapRenderer;
use crate::settings::RenderSettings;

/// Renders the grid as text: one glyph per cell with connector marks between
/// cells of the same room. Cleared rooms are drawn in lower case.
///
/// ```text
/// S · N-N
///     |
/// · · N ·
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct TextRenderer;

impl TextRenderer {
    pub const EMPTY: char = '·';

    pub const fn glyph(room_type: RoomType) -> char {
        match room_type {
            RoomType::Spawn => 'S',
            RoomType::Puzzle => 'P',
            RoomType::Fairy => 'F',
            RoomType::Blood => 'B',
            RoomType::Trap => 'T',
            RoomType::Miniboss => 'M',
            RoomType::Unknown => '?',
            RoomType::Normal => 'N',
        }
    }
}

impl MapRenderer for TextRenderer {
    type Image = String;

    fn render<C: Clock>(&mut self, map: &DungeonMap<C>, _settings: &RenderSettings) -> String {
        let span = (MapConfig::GRID_SIZE * 2 - 1) as usize;
        let mut canvas = vec![vec![' '; span]; span];
        for position in Position::grid() {
            canvas[position.y as usize * 2][position.x as usize * 2] = Self::EMPTY;
        }

        for (_, room) in map.rooms() {
            let glyph = Self::glyph(room.room_type());
            let glyph = if room.is_cleared() {
                glyph.to_ascii_lowercase()
            } else {
                glyph
            };

            for &cell in room.components().iter().filter(|cell| cell.in_grid()) {
                let (column, row) = (cell.x as usize * 2, cell.y as usize * 2);
                canvas[row][column] = glyph;
                if room.contains(cell.right()) && cell.right().in_grid() {
                    canvas[row][column + 1] = '-';
                }
                if room.contains(cell.down()) && cell.down().in_grid() {
                    canvas[row + 1][column] = '|';
                }
            }
        }

        canvas
            .into_iter()
            .map(|row| row.into_iter().collect::<String>().trim_end().to_owned())
            .collect::<Vec<_>>()
            .join("\n")
    }
}
