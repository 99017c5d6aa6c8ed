//! The classification buffer shipped by the game as its in-game map.
use crate::config::MapConfig;
use crate::coords::{PixelPos, Position};
use crate::error::{ErrorSeverity, MapError};

/// Immutable 128×128 grid of classification codes.
///
/// Each byte is a room-type code, or 0 for pixels the player has not
/// discovered yet. Reads outside the grid return 0.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(into = "Vec<u8>", try_from = "Vec<u8>")
)]
pub struct PixelBuffer {
    data: Box<[u8]>,
}

impl PixelBuffer {
    pub const WIDTH: usize = MapConfig::BUFFER_SIZE;
    pub const HEIGHT: usize = MapConfig::BUFFER_SIZE;
    pub const LEN: usize = Self::WIDTH * Self::HEIGHT;

    /// Wraps a row-major buffer of exactly [`Self::LEN`] bytes.
    pub fn new(data: Vec<u8>) -> Result<Self, BufferError> {
        if data.len() != Self::LEN {
            return Err(BufferError::InvalidLength {
                expected: Self::LEN,
                actual: data.len(),
            });
        }
        Ok(Self {
            data: data.into_boxed_slice(),
        })
    }

    /// Buffer with every pixel undiscovered.
    pub fn empty() -> Self {
        Self {
            data: vec![MapConfig::UNDISCOVERED_CODE; Self::LEN].into_boxed_slice(),
        }
    }

    /// Code at `(x, y)`, or 0 outside the buffer.
    pub fn get(&self, x: i32, y: i32) -> u8 {
        if x < 0 || y < 0 || x >= Self::WIDTH as i32 || y >= Self::HEIGHT as i32 {
            return MapConfig::UNDISCOVERED_CODE;
        }
        self.data[x as usize + y as usize * Self::WIDTH]
    }

    pub fn at(&self, pixel: PixelPos) -> u8 {
        self.get(pixel.x, pixel.y)
    }

    /// Returns true if no pixel has been discovered.
    pub fn is_blank(&self) -> bool {
        self.data.iter().all(|&code| code == MapConfig::UNDISCOVERED_CODE)
    }
}

impl Default for PixelBuffer {
    fn default() -> Self {
        Self::empty()
    }
}

impl TryFrom<Vec<u8>> for PixelBuffer {
    type Error = BufferError;

    fn try_from(data: Vec<u8>) -> Result<Self, Self::Error> {
        Self::new(data)
    }
}

impl From<PixelBuffer> for Vec<u8> {
    fn from(buffer: PixelBuffer) -> Self {
        buffer.data.into_vec()
    }
}

/// Errors raised while constructing a [`PixelBuffer`].
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum BufferError {
    #[error("map buffer must hold {expected} pixels, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}

impl MapError for BufferError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidLength { .. } => "BUFFER_INVALID_LENGTH",
        }
    }
}

/// Paints rooms into a buffer using the same layout the game uses.
///
/// Rooms are `room_width` pixels square and repeat every `room_width * 5 / 4`
/// pixels. Cells of the same multi-cell room are joined by filling the gap
/// between them.
#[derive(Clone, Debug)]
pub struct BufferBuilder {
    data: Vec<u8>,
    offset: PixelPos,
    room_width: i32,
    cell_pixel_size: i32,
}

impl BufferBuilder {
    pub fn new(offset: PixelPos, room_width: i32) -> Self {
        Self {
            data: vec![MapConfig::UNDISCOVERED_CODE; PixelBuffer::LEN],
            offset,
            room_width,
            cell_pixel_size: room_width * 5 / 4,
        }
    }

    /// Builder using the layout of a standard seven-floor dungeon map.
    pub fn blank() -> Self {
        Self::new(PixelPos::new(5, 5), 16)
    }

    /// Fills the footprint of the room at `position` with `code`.
    pub fn room(self, position: Position, code: u8) -> Self {
        let corner = self.corner(position);
        let width = self.room_width;
        self.rect(corner, width, width, code)
    }

    /// Fills the gap between `position` and the cell to its right.
    pub fn connect_right(self, position: Position, code: u8) -> Self {
        let width = self.room_width;
        let corner = self.corner(position).offset(width, 0);
        let gap = self.cell_pixel_size - width;
        self.rect(corner, gap, width, code)
    }

    /// Fills the gap between `position` and the cell below it.
    pub fn connect_down(self, position: Position, code: u8) -> Self {
        let width = self.room_width;
        let corner = self.corner(position).offset(0, width);
        let gap = self.cell_pixel_size - width;
        self.rect(corner, width, gap, code)
    }

    /// Sets a single pixel.
    pub fn pixel(mut self, pixel: PixelPos, code: u8) -> Self {
        self.set(pixel, code);
        self
    }

    pub fn build(self) -> PixelBuffer {
        PixelBuffer {
            data: self.data.into_boxed_slice(),
        }
    }

    fn corner(&self, position: Position) -> PixelPos {
        PixelPos::new(
            self.offset.x + position.x * self.cell_pixel_size,
            self.offset.y + position.y * self.cell_pixel_size,
        )
    }

    fn rect(mut self, corner: PixelPos, width: i32, height: i32, code: u8) -> Self {
        for dy in 0..height {
            for dx in 0..width {
                self.set(corner.offset(dx, dy), code);
            }
        }
        self
    }

    fn set(&mut self, pixel: PixelPos, code: u8) {
        let size = PixelBuffer::WIDTH as i32;
        if (0..size).contains(&pixel.x) && (0..size).contains(&pixel.y) {
            self.data[pixel.x as usize + pixel.y as usize * PixelBuffer::WIDTH] = code;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_wrong_length() {
        let err = PixelBuffer::new(vec![0; 100]).unwrap_err();
        assert_eq!(
            err,
            BufferError::InvalidLength {
                expected: 16384,
                actual: 100
            }
        );
        assert_eq!(err.error_code(), "BUFFER_INVALID_LENGTH");
    }

    #[test]
    fn out_of_range_reads_are_undiscovered() {
        let buffer = BufferBuilder::blank()
            .pixel(PixelPos::new(0, 0), 30)
            .pixel(PixelPos::new(127, 127), 63)
            .build();
        assert_eq!(buffer.get(0, 0), 30);
        assert_eq!(buffer.get(127, 127), 63);
        assert_eq!(buffer.get(-1, 0), 0);
        assert_eq!(buffer.get(0, 128), 0);
        assert_eq!(buffer.get(128, 5), 0);
    }

    #[test]
    fn builder_paints_rooms_and_connectors() {
        let buffer = BufferBuilder::blank()
            .room(Position::new(1, 0), 63)
            .connect_right(Position::new(1, 0), 63)
            .room(Position::new(2, 0), 63)
            .build();

        // Room (1, 0) spans x 25..41, the gap 41..45, room (2, 0) 45..61.
        assert_eq!(buffer.get(25, 5), 63);
        assert_eq!(buffer.get(40, 20), 63);
        assert_eq!(buffer.get(43, 5), 63);
        assert_eq!(buffer.get(44, 5), 63);
        assert_eq!(buffer.get(45, 5), 63);
        assert_eq!(buffer.get(24, 5), 0);
        assert_eq!(buffer.get(25, 21), 0);
    }

    #[test]
    fn builder_paints_vertical_connector() {
        let buffer = BufferBuilder::blank()
            .room(Position::new(0, 1), 18)
            .connect_down(Position::new(0, 1), 18)
            .room(Position::new(0, 2), 18)
            .build();

        // Room (0, 1) spans y 25..41, the gap 41..45, room (0, 2) 45..61.
        assert_eq!(buffer.get(5, 41), 18);
        assert_eq!(buffer.get(20, 44), 18);
        assert_eq!(buffer.get(12, 60), 18);
        assert_eq!(buffer.get(21, 43), 0);
        assert_eq!(buffer.get(5, 61), 0);
    }

    #[test]
    fn blank_detection() {
        assert!(PixelBuffer::empty().is_blank());
        assert!(!BufferBuilder::blank().room(Position::ORIGIN, 30).build().is_blank());
    }
}
