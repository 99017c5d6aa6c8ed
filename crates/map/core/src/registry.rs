//! Storage for reconstructed rooms.
//!
//! Rooms live in an arena addressed by [`RoomId`]. Every grid cell a room covers
//! has a key (its [`WorldPos`]) pointing at the room, so multi-cell rooms are
//! reachable from any of their cells while iteration still visits each room
//! once.
use std::collections::BTreeMap;
use std::fmt;

use crate::coords::{Position, WorldPos};
use crate::error::{ErrorSeverity, MapError};
use crate::room::Room;

/// Stable handle of a room inside a [`RoomRegistry`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RoomId(pub u32);

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "room#{}", self.0)
    }
}

/// World-keyed room index plus the distinct-room collection.
///
/// Invariant: a key points at a room exactly when that room lists the key's
/// cell among its components. [`validate`](Self::validate) checks it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RoomRegistry {
    keys: BTreeMap<WorldPos, RoomId>,
    rooms: BTreeMap<RoomId, Room>,
    next_id: u32,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Room registered under `key`.
    pub fn get(&self, key: WorldPos) -> Option<&Room> {
        self.room_id_at(key).and_then(|id| self.rooms.get(&id))
    }

    pub fn room_id_at(&self, key: WorldPos) -> Option<RoomId> {
        self.keys.get(&key).copied()
    }

    pub fn room_at_grid(&self, position: Position) -> Option<&Room> {
        self.get(position.world())
    }

    pub fn room(&self, id: RoomId) -> Option<&Room> {
        self.rooms.get(&id)
    }

    pub fn room_mut(&mut self, id: RoomId) -> Option<&mut Room> {
        self.rooms.get_mut(&id)
    }

    /// Points `key` at `id`, replacing any previous entry.
    pub fn put(&mut self, key: WorldPos, id: RoomId) -> Option<RoomId> {
        self.keys.insert(key, id)
    }

    /// Adds a room to the distinct collection without registering keys.
    pub fn add_distinct(&mut self, room: Room) -> RoomId {
        let id = RoomId(self.next_id);
        self.next_id += 1;
        self.rooms.insert(id, room);
        id
    }

    /// Adds a room and registers a key for each of its components.
    pub fn insert(&mut self, room: Room) -> RoomId {
        let keys: Vec<WorldPos> = room.components().iter().map(|p| p.world()).collect();
        let id = self.add_distinct(room);
        for key in keys {
            self.put(key, id);
        }
        id
    }

    /// Removes a room from the collection along with every key pointing at it.
    pub fn remove_distinct(&mut self, id: RoomId) -> Option<Room> {
        let room = self.rooms.remove(&id)?;
        self.keys.retain(|_, target| *target != id);
        Some(room)
    }

    /// Adds `position` to a room and points its key at that room.
    ///
    /// Returns false if the room is unknown or already covers the cell.
    pub fn push_component(&mut self, id: RoomId, position: Position) -> bool {
        let Some(room) = self.rooms.get_mut(&id) else {
            return false;
        };
        if !room.push_component(position) {
            return false;
        }
        self.keys.insert(position.world(), id);
        true
    }

    /// Folds `source` into `target`: every component of `source` moves over,
    /// its keys are re-pointed and `source` leaves the collection.
    ///
    /// Returns false if either room is unknown or both are the same room.
    pub fn absorb(&mut self, target: RoomId, source: RoomId) -> bool {
        if target == source || !self.rooms.contains_key(&target) {
            return false;
        }
        let Some(absorbed) = self.remove_distinct(source) else {
            return false;
        };

        for &position in absorbed.components() {
            self.push_component(target, position);
            // Already covered by the target: keep the key pointing there.
            self.keys.insert(position.world(), target);
        }
        true
    }

    /// Distinct rooms in creation order.
    pub fn iter(&self) -> impl Iterator<Item = (RoomId, &Room)> {
        self.rooms.iter().map(|(id, room)| (*id, room))
    }

    pub fn rooms(&self) -> impl Iterator<Item = &Room> {
        self.rooms.values()
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    pub fn clear(&mut self) {
        self.keys.clear();
        self.rooms.clear();
    }

    /// Checks the key/component invariant.
    pub fn validate(&self) -> Result<(), RegistryError> {
        for (&key, &id) in &self.keys {
            let room = self
                .rooms
                .get(&id)
                .ok_or(RegistryError::DanglingKey { key, room: id })?;
            let covered = key.to_grid().is_some_and(|position| room.contains(position));
            if !covered {
                return Err(RegistryError::ForeignKey { key, room: id });
            }
        }

        for (&id, room) in &self.rooms {
            for &position in room.components() {
                let key = position.world();
                if self.keys.get(&key) != Some(&id) {
                    return Err(RegistryError::MissingKey { key, room: id });
                }
            }
        }

        Ok(())
    }
}

/// Registry invariant violations reported by [`RoomRegistry::validate`].
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("key {key} points at {room}, which is not in the registry")]
    DanglingKey { key: WorldPos, room: RoomId },

    #[error("key {key} points at {room}, which does not cover that cell")]
    ForeignKey { key: WorldPos, room: RoomId },

    #[error("{room} covers {key} but the key does not point back at it")]
    MissingKey { key: WorldPos, room: RoomId },
}

impl MapError for RegistryError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Internal
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::DanglingKey { .. } => "REGISTRY_DANGLING_KEY",
            Self::ForeignKey { .. } => "REGISTRY_FOREIGN_KEY",
            Self::MissingKey { .. } => "REGISTRY_MISSING_KEY",
        }
    }
}
