//! Render-side adapters for the dungeon minimap.
//!
//! `map-core` owns the decoded rooms; this crate turns them into something a
//! screen can show without re-rendering every frame:
//! - [`context`] keeps one cached image per render target and rebuilds it only
//!   when the map's change tracker moved
//! - [`settings`] layers per-target overrides over persisted base settings
//! - [`geometry`] computes room, connector and door rectangles
//! - [`text`] is a character renderer used by tools and tests
pub mod context;
pub mod geometry;
pub mod settings;
pub mod text;

pub use context::{MapRenderer, RenderContext, RenderContextId, RenderContextManager};
pub use geometry::{Door, Rect, door_rect, room_rects};
pub use settings::{
    ColorParseError, RenderSettings, Rgba, RoomColors, SettingsError, SettingsManager,
    SettingsPatch, wait_for_save,
};
pub use text::TextRenderer;
