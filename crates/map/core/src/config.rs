/// Decoder constants and tunable parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MapConfig {
    /// Distance between sampled pixels while searching for the first room.
    pub scan_stride: usize,
}

impl MapConfig {
    // ===== buffer and grid geometry =====
    /// Width and height of the classification buffer in pixels.
    pub const BUFFER_SIZE: usize = 128;
    /// Number of room cells along each axis of the dungeon grid.
    pub const GRID_SIZE: i32 = 6;
    /// Upper bound on the cells a single room can cover.
    pub const MAX_COMPONENTS: usize = (Self::GRID_SIZE * Self::GRID_SIZE) as usize;

    // ===== world space =====
    /// World coordinate of the top-left grid cell.
    pub const WORLD_ORIGIN: i32 = -200;
    /// World blocks spanned by one grid cell.
    pub const WORLD_CELL_SPAN: i32 = 32;

    // ===== classification codes =====
    /// Buffer value of an undiscovered pixel.
    pub const UNDISCOVERED_CODE: u8 = 0;
    /// Buffer value of a normal (mergeable) room pixel.
    pub const NORMAL_ROOM_CODE: u8 = 63;

    /// Smallest room width that still yields a usable 5/4 grid period.
    pub const MIN_ROOM_WIDTH: i32 = 4;
    /// Widest single room any layout uses; narrower than two joined cells.
    pub const MAX_ROOM_WIDTH: i32 = 24;

    // ===== runtime-tunable defaults =====
    pub const DEFAULT_SCAN_STRIDE: usize = 20;

    pub fn new() -> Self {
        Self {
            scan_stride: Self::DEFAULT_SCAN_STRIDE,
        }
    }

    pub fn with_scan_stride(scan_stride: usize) -> Self {
        Self {
            scan_stride: scan_stride.max(1),
        }
    }
}

impl Default for MapConfig {
    fn default() -> Self {
        Self::new()
    }
}
