//! Screen-space geometry of rooms and doors.
//!
//! Cell `(x, y)` owns the square `[x, x + 1) * block_size`. Rooms are drawn
//! inset by half the gap on every side, so gaps are centered on cell edges and
//! a door between two cells is centered on their shared edge.
use map_core::{Position, Room, RoomType};

use crate::settings::{RenderSettings, Rgba};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Rectangles covering one room: a square per component plus a strip over
/// each gap between two of its components.
pub fn room_rects(room: &Room, settings: &RenderSettings) -> Vec<Rect> {
    let block = settings.block_size as f32;
    let gap = settings.room_gap as f32;
    let inner = block - gap;
    let half_gap = gap / 2.0;

    let mut rects = Vec::with_capacity(room.components().len() * 2);
    for &cell in room.components() {
        let left = cell.x as f32 * block + half_gap;
        let top = cell.y as f32 * block + half_gap;
        rects.push(Rect::new(left, top, inner, inner));

        if room.contains(cell.right()) {
            rects.push(Rect::new(left + inner, top, gap, inner));
        }
        if room.contains(cell.down()) {
            rects.push(Rect::new(left, top + inner, inner, gap));
        }
    }
    rects
}

/// A door between two orthogonally adjacent cells.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Door {
    /// Center of the door in cell units.
    pub center_x: f32,
    pub center_y: f32,
    /// True when the door joins a left/right pair and spans a vertical gap.
    pub horizontal: bool,
    pub room_type: RoomType,
}

impl Door {
    /// Door on the edge shared by `a` and `b`; `None` unless they touch.
    pub fn between(a: Position, b: Position, room_type: RoomType) -> Option<Self> {
        let (dx, dy) = (b.x - a.x, b.y - a.y);
        let horizontal = match (dx.abs(), dy.abs()) {
            (1, 0) => true,
            (0, 1) => false,
            _ => return None,
        };
        let min_x = a.x.min(b.x) as f32;
        let min_y = a.y.min(b.y) as f32;
        let (center_x, center_y) = if horizontal {
            (min_x + 1.0, min_y + 0.5)
        } else {
            (min_x + 0.5, min_y + 1.0)
        };
        Some(Self {
            center_x,
            center_y,
            horizontal,
            room_type,
        })
    }

    /// Doors into normal rooms use the connection color.
    pub fn color(&self, settings: &RenderSettings) -> Rgba {
        if self.room_type.is_normal() {
            settings.colors.normal_connection
        } else {
            settings.colors.for_type(self.room_type)
        }
    }
}

/// Screen rectangle of a door: gap-deep along the crossing axis,
/// `door_width` wide along the edge.
pub fn door_rect(door: &Door, settings: &RenderSettings) -> Rect {
    let block = settings.block_size as f32;
    let gap = settings.room_gap as f32;
    let breadth = settings.door_width as f32;
    let (width, height) = if door.horizontal {
        (gap, breadth)
    } else {
        (breadth, gap)
    };
    Rect::new(
        door.center_x * block - width / 2.0,
        door.center_y * block - height / 2.0,
        width,
        height,
    )
}
