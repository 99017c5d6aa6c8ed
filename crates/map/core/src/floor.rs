//! Dungeon floor identifiers.
use std::fmt;
use std::str::FromStr;

use crate::error::{ErrorSeverity, MapError};

/// Floor the map belongs to.
///
/// Identifiers follow the in-game scoreboard: `E` for the entrance, `F1`..`F7`
/// for the catacombs and `M1`..`M7` for master mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(into = "String", try_from = "String")
)]
pub enum Floor {
    Entrance,
    Catacombs(u8),
    MasterMode(u8),
}

impl Floor {
    pub const MAX_FLOOR: u8 = 7;

    /// Floor number, with the entrance counted as floor 0.
    pub const fn number(self) -> u8 {
        match self {
            Self::Entrance => 0,
            Self::Catacombs(n) | Self::MasterMode(n) => n,
        }
    }

    /// The entrance and first floors lay their grid out one cell to the
    /// right of the rest.
    pub const fn shifts_origin(self) -> bool {
        matches!(self, Self::Entrance) || self.number() == 1
    }
}

impl fmt::Display for Floor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Entrance => write!(f, "E"),
            Self::Catacombs(n) => write!(f, "F{n}"),
            Self::MasterMode(n) => write!(f, "M{n}"),
        }
    }
}

/// Error returned when a floor identifier cannot be parsed.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum FloorParseError {
    #[error("unknown floor identifier '{0}'")]
    Unknown(String),
}

impl MapError for FloorParseError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Unknown(_) => "FLOOR_UNKNOWN",
        }
    }
}

impl FromStr for Floor {
    type Err = FloorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let unknown = || FloorParseError::Unknown(s.to_string());

        if trimmed.eq_ignore_ascii_case("e") {
            return Ok(Self::Entrance);
        }

        let mut chars = trimmed.chars();
        let prefix = chars.next().ok_or_else(unknown)?;
        let number: u8 = chars.as_str().parse().map_err(|_| unknown())?;
        if !(1..=Self::MAX_FLOOR).contains(&number) {
            return Err(unknown());
        }

        match prefix.to_ascii_uppercase() {
            'F' => Ok(Self::Catacombs(number)),
            'M' => Ok(Self::MasterMode(number)),
            _ => Err(unknown()),
        }
    }
}

impl From<Floor> for String {
    fn from(floor: Floor) -> Self {
        floor.to_string()
    }
}

impl TryFrom<String> for Floor {
    type Error = FloorParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
