//! Room topology reconstruction for the dungeon minimap.
//!
//! `map-core` turns the 128×128 classification buffer the game ships as its
//! in-game map into a registry of discrete rooms. The pipeline is:
//!
//! 1. [`coords`] discovers the room grid origin once per map and converts
//!    between pixel, grid and world coordinates
//! 2. [`decoder`] samples the 6×6 room grid and classifies each cell
//! 3. [`registry`] stores rooms under their world keys and merges adjacent
//!    normal cells into multi-cell rooms
//! 4. [`tracker`] stamps every mutating pass so renderers can invalidate
//!    cached images
//!
//! [`DungeonMap`] owns all of the above for one level attempt.
pub mod config;
pub mod coords;
pub mod decoder;
pub mod error;
pub mod floor;
pub mod map;
pub mod pixels;
pub mod registry;
pub mod room;
pub mod tracker;

pub use config::MapConfig;
pub use coords::{CoordinateOrigin, PixelPos, Position, WorldPos};
pub use decoder::{CellKind, MapDecoder, MapUpdate};
pub use error::{ErrorSeverity, MapError};
pub use floor::{Floor, FloorParseError};
pub use map::DungeonMap;
pub use pixels::{BufferBuilder, BufferError, PixelBuffer};
pub use registry::{RegistryError, RoomId, RoomRegistry};
pub use room::{Checkmark, Components, Room, RoomType};
pub use tracker::{ChangeTracker, Clock, ManualClock, SystemClock, Timestamp};
