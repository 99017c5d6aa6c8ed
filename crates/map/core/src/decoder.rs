//! Per-pass decoding of the room grid.
//!
//! The decoder samples the top-left pixel of every grid cell and mutates the
//! registry to match what it sees. Cells that are already classified correctly
//! are left untouched, so replaying the same buffer is a no-op.
//!
//! # Merging
//!
//! Normal rooms can span several cells. The game fills the gap between two
//! cells of the same room with the normal-room code, so a cell whose left (or
//! upper) edge is touched by that code belongs to the same room as its left
//! (or upper) neighbour. When the neighbour is already registered the cell is
//! folded into it; when the cell itself already belonged to a different room,
//! that whole room is folded in as well so each logical room stays a single
//! registry entry.
use arrayvec::ArrayVec;

use crate::config::MapConfig;
use crate::coords::{CoordinateOrigin, Position, WorldPos};
use crate::pixels::PixelBuffer;
use crate::registry::RoomRegistry;
use crate::room::{Room, RoomType};

/// Classification of a sampled buffer value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CellKind {
    /// Nothing discovered at this cell yet.
    Undiscovered,
    /// Single-cell room of a fixed type.
    Special(RoomType),
    /// Normal room cell that may merge with its neighbours.
    Normal,
    /// Any other value (doors, markers); ignored.
    Unclassified(u8),
}

impl CellKind {
    pub const fn classify(code: u8) -> Self {
        if code == MapConfig::UNDISCOVERED_CODE {
            return Self::Undiscovered;
        }
        if code == MapConfig::NORMAL_ROOM_CODE {
            return Self::Normal;
        }
        match RoomType::from_special_code(code) {
            Some(room_type) => Self::Special(room_type),
            None => Self::Unclassified(code),
        }
    }
}

/// Summary of one update pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MapUpdate {
    /// The grid origin was found during this pass.
    pub origin_discovered: bool,
    /// Rooms created.
    pub created: u32,
    /// Rooms whose type changed.
    pub reclassified: u32,
    /// Cells folded into a neighbouring room.
    pub merged: u32,
}

impl MapUpdate {
    /// Returns true if the registry was mutated.
    pub fn is_changed(&self) -> bool {
        self.created > 0 || self.reclassified > 0 || self.merged > 0
    }
}

/// Single decoding pass over one buffer.
pub struct MapDecoder<'a> {
    buffer: &'a PixelBuffer,
    origin: CoordinateOrigin,
    registry: &'a mut RoomRegistry,
    update: MapUpdate,
}

impl<'a> MapDecoder<'a> {
    pub fn new(
        buffer: &'a PixelBuffer,
        origin: CoordinateOrigin,
        registry: &'a mut RoomRegistry,
    ) -> Self {
        Self {
            buffer,
            origin,
            registry,
            update: MapUpdate::default(),
        }
    }

    /// Decodes every grid cell and returns what changed.
    pub fn run(mut self) -> MapUpdate {
        for position in Position::grid() {
            self.decode_cell(position);
        }
        self.update
    }

    fn decode_cell(&mut self, position: Position) {
        let pixel = self.origin.grid_to_pixel(position);
        match CellKind::classify(self.buffer.at(pixel)) {
            CellKind::Special(room_type) => self.decode_special(position, room_type),
            CellKind::Normal => self.decode_normal(position),
            CellKind::Undiscovered | CellKind::Unclassified(_) => {}
        }
    }

    fn decode_special(&mut self, position: Position, room_type: RoomType) {
        let key = position.world();
        match self.registry.room_id_at(key) {
            None => {
                let id = self.registry.insert(Room::new(room_type, position));
                self.update.created += 1;
                tracing::trace!("Created {} {} at {}", room_type, id, position);
            }
            Some(id) => {
                let changed = self
                    .registry
                    .room_mut(id)
                    .is_some_and(|room| room.set_type(room_type));
                if changed {
                    self.update.reclassified += 1;
                    tracing::trace!("Reclassified {} at {} as {}", id, position, room_type);
                }
            }
        }
    }

    fn decode_normal(&mut self, position: Position) {
        let pixel = self.origin.grid_to_pixel(position);
        let key = position.world();

        let mut neighbours: ArrayVec<WorldPos, 2> = ArrayVec::new();
        if self.buffer.at(pixel.offset(-1, 0)) == MapConfig::NORMAL_ROOM_CODE {
            neighbours.push(key.left());
        }
        if self.buffer.at(pixel.offset(0, -1)) == MapConfig::NORMAL_ROOM_CODE {
            neighbours.push(key.up());
        }

        let mut current = self.registry.room_id_at(key);
        let has_neighbour = neighbours
            .iter()
            .any(|&neighbour| self.registry.room_id_at(neighbour).is_some());

        if current.is_none() && !has_neighbour {
            let id = self.registry.insert(Room::new(RoomType::Normal, position));
            self.update.created += 1;
            tracing::trace!("Created normal {} at {}", id, position);
            return;
        }

        if let Some(id) = current {
            let changed = self
                .registry
                .room_mut(id)
                .is_some_and(|room| room.set_type(RoomType::Normal));
            if changed {
                self.update.reclassified += 1;
                tracing::trace!("Reclassified {} at {} as normal", id, position);
            }
        }

        // Resolved one at a time: the first merge may fold away the room the
        // second key pointed at.
        for neighbour_key in neighbours {
            let Some(neighbour) = self.registry.room_id_at(neighbour_key) else {
                continue;
            };
            let covered = self
                .registry
                .room(neighbour)
                .is_some_and(|room| room.contains(position));
            if covered {
                continue;
            }

            match current {
                Some(id) if id != neighbour => {
                    self.registry.absorb(neighbour, id);
                    tracing::trace!("Folded {} into {} at {}", id, neighbour, position);
                }
                _ => {
                    self.registry.push_component(neighbour, position);
                    tracing::trace!("Merged {} into {}", position, neighbour);
                }
            }
            current = Some(neighbour);
            self.update.merged += 1;
        }
    }
}
