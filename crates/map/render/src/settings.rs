//! Render settings: persisted base values plus per-target overrides.
//!
//! Every render context is built from the base settings with its own
//! [`SettingsPatch`] layered on top. Applying a patch to the base re-layers
//! every tracked context, marks it for re-render, and saves the new base on a
//! background thread.
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use map_core::{ErrorSeverity, MapError, RoomType};
use serde::{Deserialize, Serialize};

use crate::context::{RenderContextId, RenderContextManager};

/// Packed RGBA color, stored in settings files as `#rrggbb` or `#rrggbbaa`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Parses `#rrggbb` or `#rrggbbaa`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        let byte = |index: usize| {
            digits
                .get(index..index + 2)
                .and_then(|pair| u8::from_str_radix(pair, 16).ok())
        };
        match digits.len() {
            6 => Some(Self::rgb(byte(0)?, byte(2)?, byte(4)?)),
            8 => Some(Self {
                r: byte(0)?,
                g: byte(2)?,
                b: byte(4)?,
                a: byte(6)?,
            }),
            _ => None,
        }
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)?;
        if self.a != u8::MAX {
            write!(f, "{:02x}", self.a)?;
        }
        Ok(())
    }
}

impl From<Rgba> for String {
    fn from(color: Rgba) -> Self {
        color.to_string()
    }
}

impl TryFrom<String> for Rgba {
    type Error = ColorParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value).ok_or(ColorParseError(value))
    }
}

/// Error returned for a color that is not `#rrggbb` or `#rrggbbaa`.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("invalid color '{0}'")]
pub struct ColorParseError(pub String);

/// Colors used for each room type and for normal-room doors.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomColors {
    pub spawn: Rgba,
    pub puzzle: Rgba,
    pub fairy: Rgba,
    pub blood: Rgba,
    pub trap: Rgba,
    pub miniboss: Rgba,
    pub unknown: Rgba,
    pub normal: Rgba,
    pub normal_connection: Rgba,
}

impl RoomColors {
    pub fn for_type(&self, room_type: RoomType) -> Rgba {
        match room_type {
            RoomType::Spawn => self.spawn,
            RoomType::Puzzle => self.puzzle,
            RoomType::Fairy => self.fairy,
            RoomType::Blood => self.blood,
            RoomType::Trap => self.trap,
            RoomType::Miniboss => self.miniboss,
            RoomType::Unknown => self.unknown,
            RoomType::Normal => self.normal,
        }
    }
}

impl Default for RoomColors {
    fn default() -> Self {
        Self {
            spawn: Rgba::rgb(0x00, 0x7c, 0x00),
            puzzle: Rgba::rgb(0x75, 0x2f, 0xb8),
            fairy: Rgba::rgb(0xe0, 0x00, 0xff),
            blood: Rgba::rgb(0xff, 0x00, 0x00),
            trap: Rgba::rgb(0xd8, 0x7f, 0x33),
            miniboss: Rgba::rgb(0xfe, 0xdf, 0x00),
            unknown: Rgba::rgb(0x41, 0x41, 0x41),
            normal: Rgba::rgb(0x6b, 0x3a, 0x11),
            normal_connection: Rgba::rgb(0x6b, 0x3a, 0x11),
        }
    }
}

/// Resolved settings for one render target.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    /// Screen position of the map's top-left corner.
    pub pos_x: i32,
    pub pos_y: i32,
    /// Edge length of the drawn map in screen pixels.
    pub size: u32,
    /// Scale of player head markers relative to a cell.
    pub head_scale: f32,
    /// Pixels per grid cell, gap included.
    pub block_size: u32,
    /// Gap between neighbouring cells.
    pub room_gap: u32,
    /// Breadth of a door across the gap.
    pub door_width: u32,
    pub colors: RoomColors,
}

impl RenderSettings {
    pub const DEFAULT_SIZE: u32 = 150;
    pub const DEFAULT_BLOCK_SIZE: u32 = 32;
    pub const DEFAULT_ROOM_GAP: u32 = 6;
    pub const DEFAULT_DOOR_WIDTH: u32 = 8;
    pub const DEFAULT_HEAD_SCALE: f32 = 8.0;

    /// Returns a copy with every field set in `patch` replaced.
    pub fn merged(&self, patch: &SettingsPatch) -> Self {
        Self {
            pos_x: patch.pos_x.unwrap_or(self.pos_x),
            pos_y: patch.pos_y.unwrap_or(self.pos_y),
            size: patch.size.unwrap_or(self.size),
            head_scale: patch.head_scale.unwrap_or(self.head_scale),
            block_size: patch.block_size.unwrap_or(self.block_size),
            room_gap: patch.room_gap.unwrap_or(self.room_gap),
            door_width: patch.door_width.unwrap_or(self.door_width),
            colors: patch.colors.clone().unwrap_or_else(|| self.colors.clone()),
        }
    }
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            pos_x: 10,
            pos_y: 10,
            size: Self::DEFAULT_SIZE,
            head_scale: Self::DEFAULT_HEAD_SCALE,
            block_size: Self::DEFAULT_BLOCK_SIZE,
            room_gap: Self::DEFAULT_ROOM_GAP,
            door_width: Self::DEFAULT_DOOR_WIDTH,
            colors: RoomColors::default(),
        }
    }
}

/// Partial settings; unset fields fall through to the layer below.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pos_x: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pos_y: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub head_scale: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room_gap: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub door_width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub colors: Option<RoomColors>,
}

/// Errors from loading or saving the settings file.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("settings file {} could not be accessed: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("settings are not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("settings save thread panicked")]
    SaveThread,

    #[error("settings save lock poisoned")]
    LockPoisoned,
}

impl MapError for SettingsError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Json(_) => ErrorSeverity::Validation,
            Self::Io { .. } | Self::SaveThread | Self::LockPoisoned => ErrorSeverity::Internal,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Io { .. } => "SETTINGS_IO",
            Self::Json(_) => "SETTINGS_JSON",
            Self::SaveThread => "SETTINGS_SAVE_THREAD",
            Self::LockPoisoned => "SETTINGS_LOCK_POISONED",
        }
    }
}

/// Owns the base settings and the overrides of every live render context.
#[derive(Debug)]
pub struct SettingsManager {
    path: PathBuf,
    base: RenderSettings,
    overrides: BTreeMap<RenderContextId, SettingsPatch>,
    /// Generation of the most recent save request.
    generation: u64,
    /// Generation currently on disk. Saves older than this are dropped.
    persisted: Arc<Mutex<u64>>,
}

impl SettingsManager {
    pub fn new(path: impl Into<PathBuf>, base: RenderSettings) -> Self {
        Self {
            path: path.into(),
            base,
            overrides: BTreeMap::new(),
            generation: 0,
            persisted: Arc::new(Mutex::new(0)),
        }
    }

    /// Reads base settings from `path`, falling back to defaults when the
    /// file does not exist yet.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, SettingsError> {
        let path = path.into();
        let base = match fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No settings at {}; using defaults", path.display());
                RenderSettings::default()
            }
            Err(source) => return Err(SettingsError::Io { path, source }),
        };
        Ok(Self::new(path, base))
    }

    pub fn base(&self) -> &RenderSettings {
        &self.base
    }

    /// Settings a context with `overrides` would render with.
    pub fn resolve(&self, overrides: &SettingsPatch) -> RenderSettings {
        self.base.merged(overrides)
    }

    /// Creates a render context tracked by this manager.
    pub fn create_context<I>(
        &mut self,
        contexts: &mut RenderContextManager<I>,
        overrides: SettingsPatch,
    ) -> RenderContextId {
        let id = contexts.create(self.resolve(&overrides));
        self.overrides.insert(id, overrides);
        id
    }

    /// Destroys a context and forgets its overrides.
    pub fn destroy_context<I>(
        &mut self,
        contexts: &mut RenderContextManager<I>,
        id: RenderContextId,
    ) {
        self.overrides.remove(&id);
        contexts.destroy(id);
    }

    /// Layers `patch` onto the base settings, pushes the result to every
    /// tracked context and saves the new base in the background.
    pub fn apply<I>(
        &mut self,
        patch: &SettingsPatch,
        contexts: &mut RenderContextManager<I>,
    ) -> JoinHandle<Result<(), SettingsError>> {
        self.base = self.base.merged(patch);

        for (id, overrides) in &self.overrides {
            let settings = self.base.merged(overrides);
            match contexts.get_mut(*id) {
                Some(context) => context.set_settings(settings),
                None => tracing::warn!("Settings tracked for missing render context {}", id),
            }
        }
        tracing::debug!("Applied settings to {} contexts", self.overrides.len());

        self.save()
    }

    /// Writes the base settings to disk on a background thread.
    ///
    /// Serialization happens on the caller's thread so the worker only
    /// touches the filesystem. Workers write one at a time, and a worker
    /// whose snapshot is older than the file on disk skips its write, so the
    /// newest base always ends up persisted.
    pub fn save(&mut self) -> JoinHandle<Result<(), SettingsError>> {
        self.generation += 1;
        let generation = self.generation;
        let persisted = Arc::clone(&self.persisted);
        let path = self.path.clone();
        let json = serde_json::to_string_pretty(&self.base);

        thread::spawn(move || {
            let result = json.map_err(SettingsError::from).and_then(|json| {
                let mut on_disk = persisted.lock().map_err(|_| SettingsError::LockPoisoned)?;
                if *on_disk > generation {
                    tracing::trace!("Dropping stale settings save #{}", generation);
                    return Ok(());
                }
                write_settings(&path, &json)?;
                *on_disk = generation;
                Ok(())
            });
            match &result {
                Ok(()) => tracing::debug!("Saved settings to {}", path.display()),
                Err(err) => tracing::warn!("Failed to save settings: {}", err),
            }
            result
        })
    }
}

fn write_settings(path: &Path, json: &str) -> Result<(), SettingsError> {
    let io_err = |source| SettingsError::Io {
        path: path.to_path_buf(),
        source,
    };
    let dir = match path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        Some(parent) => {
            fs::create_dir_all(parent).map_err(io_err)?;
            parent
        }
        None => Path::new("."),
    };

    // Write to a uniquely named temp file, then atomic rename
    let mut file = tempfile::NamedTempFile::new_in(dir).map_err(io_err)?;
    file.write_all(json.as_bytes()).map_err(io_err)?;
    file.persist(path).map_err(|err| io_err(err.error))?;
    Ok(())
}

/// Joins a save handle, folding a panicked worker into an error.
pub fn wait_for_save(handle: JoinHandle<Result<(), SettingsError>>) -> Result<(), SettingsError> {
    handle.join().map_err(|_| SettingsError::SaveThread)?
}

#[cfg(test)]
mod tests {
    use map_core::{ChangeTracker, ManualClock};

    use super::*;

    #[test]
    fn hex_colors_parse() {
        assert_eq!(Rgba::from_hex("#ff0000"), Some(Rgba::rgb(255, 0, 0)));
        assert_eq!(
            Rgba::from_hex("00ff0080"),
            Some(Rgba {
                r: 0,
                g: 255,
                b: 0,
                a: 0x80
            })
        );
        assert_eq!(Rgba::from_hex("#fff"), None);
        assert_eq!(Rgba::from_hex("#gg0000"), None);
    }

    #[test]
    fn colors_are_stored_as_hex() {
        let colors: RoomColors =
            serde_json::from_str(r##"{"blood": "#123456", "fairy": "#e000ff80"}"##).unwrap();
        assert_eq!(colors.blood, Rgba::rgb(0x12, 0x34, 0x56));
        assert_eq!(colors.fairy.a, 0x80);
        assert_eq!(colors.spawn, RoomColors::default().spawn);

        let json = serde_json::to_string(&Rgba::rgb(0xff, 0, 0x0a)).unwrap();
        assert_eq!(json, r##""#ff000a""##);
        assert!(serde_json::from_str::<Rgba>(r#""red""#).is_err());
    }

    #[test]
    fn patch_overrides_only_set_fields() {
        let base = RenderSettings::default();
        let patch = SettingsPatch {
            size: Some(200),
            room_gap: Some(4),
            ..SettingsPatch::default()
        };

        let merged = base.merged(&patch);
        assert_eq!(merged.size, 200);
        assert_eq!(merged.room_gap, 4);
        assert_eq!(merged.block_size, base.block_size);
        assert_eq!(merged.colors, base.colors);
    }

    #[test]
    fn later_patch_wins() {
        let dir = tempfile::tempdir().unwrap();
        let mut manager =
            SettingsManager::new(dir.path().join("s.json"), RenderSettings::default());
        let mut contexts: RenderContextManager<String> = RenderContextManager::new();

        let first = SettingsPatch {
            pos_x: Some(1),
            pos_y: Some(2),
            ..SettingsPatch::default()
        };
        let second = SettingsPatch {
            pos_x: Some(9),
            ..SettingsPatch::default()
        };
        wait_for_save(manager.apply(&first, &mut contexts)).unwrap();
        wait_for_save(manager.apply(&second, &mut contexts)).unwrap();

        assert_eq!(manager.base().pos_x, 9);
        assert_eq!(manager.base().pos_y, 2);
    }

    #[test]
    fn patch_json_omits_unset_fields() {
        let patch = SettingsPatch {
            door_width: Some(3),
            ..SettingsPatch::default()
        };
        let json = serde_json::to_string(&patch).unwrap();
        assert_eq!(json, r#"{"door_width":3}"#);

        let parsed: SettingsPatch = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, patch);
    }

    #[test]
    fn partial_settings_file_fills_defaults() {
        let settings: RenderSettings = serde_json::from_str(r#"{"size": 90}"#).unwrap();
        assert_eq!(settings.size, 90);
        assert_eq!(settings.block_size, RenderSettings::DEFAULT_BLOCK_SIZE);
    }

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let manager = SettingsManager::load(dir.path().join("minimap.json")).unwrap();
        assert_eq!(manager.base(), &RenderSettings::default());
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("minimap.json");
        fs::write(&path, "not json").unwrap();

        let err = SettingsManager::load(&path).unwrap_err();
        assert!(matches!(err, SettingsError::Json(_)));
        assert_eq!(err.error_code(), "SETTINGS_JSON");
        assert_eq!(err.severity(), ErrorSeverity::Validation);
    }

    #[test]
    fn apply_relayers_contexts_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("minimap.json");
        let mut manager = SettingsManager::load(&path).unwrap();
        let mut contexts: RenderContextManager<String> = RenderContextManager::new();

        let plain = manager.create_context(&mut contexts, SettingsPatch::default());
        let pinned = manager.create_context(
            &mut contexts,
            SettingsPatch {
                size: Some(64),
                ..SettingsPatch::default()
            },
        );
        let tracker = ChangeTracker::new(ManualClock::new(100));
        contexts.get_mut(plain).unwrap().store(String::from("old"), &tracker);
        contexts.get_mut(pinned).unwrap().store(String::from("old"), &tracker);
        assert!(!contexts.get(plain).unwrap().needs_rebuild(&tracker));

        let handle = manager.apply(
            &SettingsPatch {
                size: Some(300),
                room_gap: Some(2),
                ..SettingsPatch::default()
            },
            &mut contexts,
        );
        wait_for_save(handle).unwrap();

        let plain = contexts.get(plain).unwrap();
        assert_eq!(plain.settings().size, 300);
        assert_eq!(plain.settings().room_gap, 2);
        assert!(plain.needs_rebuild(&tracker));

        let pinned = contexts.get(pinned).unwrap();
        assert_eq!(pinned.settings().size, 64);
        assert_eq!(pinned.settings().room_gap, 2);
        assert!(pinned.needs_rebuild(&tracker));

        let reloaded = SettingsManager::load(&path).unwrap();
        assert_eq!(reloaded.base().size, 300);
        assert_eq!(reloaded.base().room_gap, 2);
    }

    #[test]
    fn destroyed_contexts_are_not_updated() {
        let dir = tempfile::tempdir().unwrap();
        let mut manager =
            SettingsManager::new(dir.path().join("s.json"), RenderSettings::default());
        let mut contexts: RenderContextManager<String> = RenderContextManager::new();

        let id = manager.create_context(&mut contexts, SettingsPatch::default());
        manager.destroy_context(&mut contexts, id);
        assert!(contexts.get(id).is_none());

        let handle = manager.apply(&SettingsPatch::default(), &mut contexts);
        wait_for_save(handle).unwrap();
        assert!(contexts.is_empty());
    }

    #[test]
    fn back_to_back_applies_persist_the_newest_base() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("minimap.json");
        let mut manager = SettingsManager::new(&path, RenderSettings::default());
        let mut contexts: RenderContextManager<String> = RenderContextManager::new();
        let sized = |size| SettingsPatch {
            size: Some(size),
            ..SettingsPatch::default()
        };

        for _ in 0..50 {
            let older = manager.apply(&sized(111), &mut contexts);
            let newer = manager.apply(&sized(222), &mut contexts);
            wait_for_save(newer).unwrap();
            wait_for_save(older).unwrap();

            let reloaded = SettingsManager::load(&path).unwrap();
            assert_eq!(reloaded.base().size, 222);
        }

        // Temp files are renamed into place or cleaned up.
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
