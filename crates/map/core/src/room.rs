//! Rooms reconstructed from the map.
use arrayvec::ArrayVec;

use crate::config::MapConfig;
use crate::coords::Position;

/// Grid cells covered by a room. A room can never exceed the grid.
pub type Components = ArrayVec<Position, { MapConfig::MAX_COMPONENTS }>;

/// Room classification derived from the map color of its cells.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
    strum::EnumIter,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum RoomType {
    /// Entrance room the party spawns in
    Spawn,
    Puzzle,
    /// Healing room; always a single cell
    Fairy,
    /// Boss room; opens once the dungeon is cleared
    Blood,
    Trap,
    Miniboss,
    /// Room seen on the map but not yet entered
    Unknown,
    /// Regular room; may span several cells
    Normal,
}

impl RoomType {
    /// Maps a single-cell room code to its type.
    ///
    /// Normal rooms use [`MapConfig::NORMAL_ROOM_CODE`] and are not part of
    /// this table because they merge with their neighbours.
    pub const fn from_special_code(code: u8) -> Option<Self> {
        match code {
            30 => Some(Self::Spawn),
            66 => Some(Self::Puzzle),
            82 => Some(Self::Fairy),
            18 => Some(Self::Blood),
            62 => Some(Self::Trap),
            74 => Some(Self::Miniboss),
            85 => Some(Self::Unknown),
            _ => None,
        }
    }

    /// Map code the game paints cells of this type with.
    pub const fn code(self) -> u8 {
        match self {
            Self::Spawn => 30,
            Self::Puzzle => 66,
            Self::Fairy => 82,
            Self::Blood => 18,
            Self::Trap => 62,
            Self::Miniboss => 74,
            Self::Unknown => 85,
            Self::Normal => MapConfig::NORMAL_ROOM_CODE,
        }
    }

    pub const fn is_normal(self) -> bool {
        matches!(self, Self::Normal)
    }
}

/// Completion marker drawn on a room.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
    strum::EnumIter,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Checkmark {
    /// Room has not been reached yet
    Unexplored,
    /// Room reached but nothing completed
    #[default]
    None,
    /// Room cleared, secrets still missing
    White,
    /// Room cleared with all secrets found
    Green,
    /// Puzzle failed
    Failed,
}

impl Checkmark {
    pub const fn is_cleared(self) -> bool {
        matches!(self, Self::White | Self::Green)
    }
}

/// A logical room covering one or more grid cells.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Room {
    room_type: RoomType,
    components: Components,
    checkmark: Checkmark,
    secrets: Option<u32>,
}

impl Room {
    /// Creates a room covering a single cell.
    pub fn new(room_type: RoomType, position: Position) -> Self {
        let mut components = Components::new();
        components.push(position);
        Self {
            room_type,
            components,
            checkmark: Checkmark::default(),
            secrets: None,
        }
    }

    /// Creates a room covering the given cells, skipping duplicates.
    pub fn with_components(
        room_type: RoomType,
        positions: impl IntoIterator<Item = Position>,
    ) -> Self {
        let mut room = Self {
            room_type,
            components: Components::new(),
            checkmark: Checkmark::default(),
            secrets: None,
        };
        for position in positions {
            room.push_component(position);
        }
        room
    }

    pub fn room_type(&self) -> RoomType {
        self.room_type
    }

    /// Reclassifies the room. Returns true if the type changed.
    pub fn set_type(&mut self, room_type: RoomType) -> bool {
        if self.room_type == room_type {
            return false;
        }
        self.room_type = room_type;
        true
    }

    pub fn components(&self) -> &[Position] {
        &self.components
    }

    pub fn contains(&self, position: Position) -> bool {
        self.components.contains(&position)
    }

    /// Adds a cell to the room. Returns false if it was already present or
    /// the room is full.
    pub fn push_component(&mut self, position: Position) -> bool {
        if self.contains(position) {
            return false;
        }
        self.components.try_push(position).is_ok()
    }

    pub fn checkmark(&self) -> Checkmark {
        self.checkmark
    }

    /// Returns true if the checkmark changed.
    pub fn set_checkmark(&mut self, checkmark: Checkmark) -> bool {
        if self.checkmark == checkmark {
            return false;
        }
        self.checkmark = checkmark;
        true
    }

    pub fn is_cleared(&self) -> bool {
        self.checkmark.is_cleared()
    }

    pub fn secrets(&self) -> Option<u32> {
        self.secrets
    }

    /// Returns true if the secret count changed.
    pub fn set_secrets(&mut self, secrets: Option<u32>) -> bool {
        if self.secrets == secrets {
            return false;
        }
        self.secrets = secrets;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn special_codes_round_trip() {
        for room_type in RoomType::iter().filter(|t| !t.is_normal()) {
            assert_eq!(RoomType::from_special_code(room_type.code()), Some(room_type));
        }
        assert_eq!(RoomType::from_special_code(MapConfig::NORMAL_ROOM_CODE), None);
        assert_eq!(RoomType::from_special_code(0), None);
    }

    #[test]
    fn room_type_names() {
        assert_eq!(RoomType::Miniboss.to_string(), "miniboss");
        assert_eq!("BLOOD".parse::<RoomType>(), Ok(RoomType::Blood));
    }

    #[test]
    fn components_are_deduplicated() {
        let mut room = Room::new(RoomType::Normal, Position::new(1, 1));
        assert!(!room.push_component(Position::new(1, 1)));
        assert!(room.push_component(Position::new(2, 1)));
        assert_eq!(room.components().len(), 2);

        let room = Room::with_components(
            RoomType::Normal,
            [Position::new(0, 0), Position::new(0, 0), Position::new(0, 1)],
        );
        assert_eq!(room.components(), &[Position::new(0, 0), Position::new(0, 1)]);
    }

    #[test]
    fn setters_report_changes() {
        let mut room = Room::new(RoomType::Spawn, Position::ORIGIN);
        assert!(!room.set_type(RoomType::Spawn));
        assert!(room.set_type(RoomType::Puzzle));
        assert!(room.set_checkmark(Checkmark::Green));
        assert!(!room.set_checkmark(Checkmark::Green));
        assert!(room.is_cleared());
        assert!(room.set_secrets(Some(3)));
        assert!(!room.set_secrets(Some(3)));
    }
}
