//! Coordinate spaces and origin discovery.
//!
//! A room cell can be addressed three ways:
//! - [`Position`]: grid indices in the 6×6 dungeon grid
//! - [`PixelPos`]: top-left pixel of the cell inside the classification buffer
//! - [`WorldPos`]: world block coordinates, used as the registry key
//!
//! Grid and world space are related by fixed constants. Pixel space depends on
//! the [`CoordinateOrigin`] discovered from the first buffer that contains a
//! room.
use std::fmt;

use crate::config::MapConfig;
use crate::floor::Floor;
use crate::pixels::PixelBuffer;

/// Grid cell in the dungeon room grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const ORIGIN: Self = Self { x: 0, y: 0 };

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Returns true if the cell lies inside the 6×6 grid.
    pub const fn in_grid(self) -> bool {
        self.x >= 0
            && self.y >= 0
            && self.x < MapConfig::GRID_SIZE
            && self.y < MapConfig::GRID_SIZE
    }

    pub const fn left(self) -> Self {
        Self::new(self.x - 1, self.y)
    }

    pub const fn up(self) -> Self {
        Self::new(self.x, self.y - 1)
    }

    pub const fn right(self) -> Self {
        Self::new(self.x + 1, self.y)
    }

    pub const fn down(self) -> Self {
        Self::new(self.x, self.y + 1)
    }

    /// Projects the cell into world space.
    pub const fn world(self) -> WorldPos {
        WorldPos::new(
            MapConfig::WORLD_ORIGIN + self.x * MapConfig::WORLD_CELL_SPAN,
            MapConfig::WORLD_ORIGIN + self.y * MapConfig::WORLD_CELL_SPAN,
        )
    }

    /// Iterates every cell of the grid, column by column.
    pub fn grid() -> impl Iterator<Item = Position> {
        (0..MapConfig::GRID_SIZE)
            .flat_map(|x| (0..MapConfig::GRID_SIZE).map(move |y| Position::new(x, y)))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// World block coordinates of a cell's top-left corner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WorldPos {
    pub x: i32,
    pub y: i32,
}

impl WorldPos {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Inverse of [`Position::world`]. Returns `None` off the cell lattice.
    pub const fn to_grid(self) -> Option<Position> {
        let dx = self.x - MapConfig::WORLD_ORIGIN;
        let dy = self.y - MapConfig::WORLD_ORIGIN;
        if dx % MapConfig::WORLD_CELL_SPAN != 0 || dy % MapConfig::WORLD_CELL_SPAN != 0 {
            return None;
        }
        Some(Position::new(
            dx.div_euclid(MapConfig::WORLD_CELL_SPAN),
            dy.div_euclid(MapConfig::WORLD_CELL_SPAN),
        ))
    }

    /// Key of the cell immediately to the left.
    pub const fn left(self) -> Self {
        Self::new(self.x - MapConfig::WORLD_CELL_SPAN, self.y)
    }

    /// Key of the cell immediately above.
    pub const fn up(self) -> Self {
        Self::new(self.x, self.y - MapConfig::WORLD_CELL_SPAN)
    }
}

impl fmt::Display for WorldPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

/// Pixel coordinates inside the classification buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PixelPos {
    pub x: i32,
    pub y: i32,
}

impl PixelPos {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

/// Anchor of the room grid inside the classification buffer.
///
/// Discovered once per map from the first buffer that contains a room and
/// never recomputed afterwards.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CoordinateOrigin {
    offset: PixelPos,
    cell_pixel_size: i32,
    room_image_width: i32,
}

impl CoordinateOrigin {
    /// Callers guarantee a positive cell size; public construction goes
    /// through [`from_room`](Self::from_room).
    pub(crate) const fn new(
        offset: PixelPos,
        cell_pixel_size: i32,
        room_image_width: i32,
    ) -> Self {
        Self {
            offset,
            cell_pixel_size,
            room_image_width,
        }
    }

    /// Derives the origin from a measured room footprint.
    ///
    /// Rooms cover 4/5 of a grid period; the remainder is the gap between
    /// neighbouring rooms.
    pub fn from_room(corner: PixelPos, room_width: i32, floor: Floor) -> Option<Self> {
        if room_width < MapConfig::MIN_ROOM_WIDTH {
            return None;
        }

        let cell_pixel_size = room_width * 5 / 4;
        let mut offset = PixelPos::new(
            corner.x.rem_euclid(cell_pixel_size),
            corner.y.rem_euclid(cell_pixel_size),
        );
        if floor.shifts_origin() {
            offset.x += cell_pixel_size;
        }

        Some(Self::new(offset, cell_pixel_size, room_width))
    }

    /// Locates the first room in `buffer` and derives the grid origin from it.
    ///
    /// Returns `None` while the buffer holds no room pixels at all.
    pub fn discover(buffer: &PixelBuffer, floor: Floor, config: &MapConfig) -> Option<Self> {
        let (corner, run) = find_first_room(buffer, config.scan_stride)?;
        let Some(room_width) = room_width_from_run(run) else {
            tracing::debug!(
                "Pixel run of {} at {:?} does not match any room layout",
                run,
                corner
            );
            return None;
        };

        let origin = Self::from_room(corner, room_width, floor)?;
        tracing::debug!(
            "Discovered map origin: corner={:?}, room_width={}, origin={:?}",
            corner,
            room_width,
            origin
        );
        Some(origin)
    }

    pub const fn offset(&self) -> PixelPos {
        self.offset
    }

    pub const fn cell_pixel_size(&self) -> i32 {
        self.cell_pixel_size
    }

    pub const fn room_image_width(&self) -> i32 {
        self.room_image_width
    }

    /// Top-left pixel of a grid cell.
    pub const fn grid_to_pixel(&self, position: Position) -> PixelPos {
        PixelPos::new(
            self.offset.x + self.cell_pixel_size * position.x,
            self.offset.y + self.cell_pixel_size * position.y,
        )
    }

    /// Inverse of [`grid_to_pixel`](Self::grid_to_pixel). Returns `None` for
    /// pixels that are not a cell's top-left corner.
    pub const fn pixel_to_grid(&self, pixel: PixelPos) -> Option<Position> {
        let dx = pixel.x - self.offset.x;
        let dy = pixel.y - self.offset.y;
        if dx % self.cell_pixel_size != 0 || dy % self.cell_pixel_size != 0 {
            return None;
        }
        Some(Position::new(
            dx.div_euclid(self.cell_pixel_size),
            dy.div_euclid(self.cell_pixel_size),
        ))
    }

    pub const fn pixel_to_world(&self, pixel: PixelPos) -> Option<WorldPos> {
        match self.pixel_to_grid(pixel) {
            Some(position) => Some(position.world()),
            None => None,
        }
    }

    pub const fn world_to_pixel(&self, world: WorldPos) -> Option<PixelPos> {
        match world.to_grid() {
            Some(position) => Some(self.grid_to_pixel(position)),
            None => None,
        }
    }
}

/// Finds the top-left corner of the first room hit by a coarse scan and the
/// length of the pixel run extending right from it.
fn find_first_room(buffer: &PixelBuffer, stride: usize) -> Option<(PixelPos, i32)> {
    let size = MapConfig::BUFFER_SIZE as i32;
    let stride = stride.max(1);

    let seed = (0..size)
        .step_by(stride)
        .flat_map(|x| (0..size).step_by(stride).map(move |y| PixelPos::new(x, y)))
        .find(|&pixel| buffer.at(pixel) != MapConfig::UNDISCOVERED_CODE)?;

    let mut corner = seed;
    while buffer.at(corner.offset(-1, 0)) != MapConfig::UNDISCOVERED_CODE {
        corner.x -= 1;
    }
    while buffer.at(corner.offset(0, -1)) != MapConfig::UNDISCOVERED_CODE {
        corner.y -= 1;
    }

    let mut run = 0;
    while buffer.at(corner.offset(run, 0)) != MapConfig::UNDISCOVERED_CODE {
        run += 1;
    }

    Some((corner, run))
}

/// Width of one room given a run of room pixels starting at a room's left
/// edge.
///
/// The gaps between cells of a multi-cell room are filled, so the run may
/// span `k` cells: `k * width + (k - 1) * gap`. The smallest `k` with a
/// plausible width wins.
fn room_width_from_run(run: i32) -> Option<i32> {
    (1..=MapConfig::GRID_SIZE).find_map(|cells| {
        (MapConfig::MIN_ROOM_WIDTH..=MapConfig::MAX_ROOM_WIDTH).find(|&width| {
            let gap = width * 5 / 4 - width;
            cells * width + (cells - 1) * gap == run
        })
    })
}
