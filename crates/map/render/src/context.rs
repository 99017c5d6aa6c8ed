//! Cached render targets.
use std::collections::BTreeMap;
use std::fmt;

use map_core::{ChangeTracker, Clock, DungeonMap, Timestamp};

use crate::settings::RenderSettings;

/// Produces an image of a map. The image type is renderer-specific.
pub trait MapRenderer {
    type Image;

    fn render<C: Clock>(&mut self, map: &DungeonMap<C>, settings: &RenderSettings) -> Self::Image;
}

/// Handle of a render context. Ids start at 1 and are never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RenderContextId(pub u32);

impl fmt::Display for RenderContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ctx#{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct BuildStamp {
    revision: u64,
    at: Timestamp,
}

/// One render target: its resolved settings and last built image.
#[derive(Debug)]
pub struct RenderContext<I> {
    settings: RenderSettings,
    image: Option<I>,
    built: Option<BuildStamp>,
    rerender: bool,
}

impl<I> RenderContext<I> {
    pub fn new(settings: RenderSettings) -> Self {
        Self {
            settings,
            image: None,
            built: None,
            rerender: true,
        }
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    /// Replaces the settings and forces the next draw to rebuild.
    pub fn set_settings(&mut self, settings: RenderSettings) {
        self.settings = settings;
        self.rerender = true;
    }

    /// Returns true if the cached image is missing, was invalidated, or
    /// predates the map's last change.
    pub fn needs_rebuild<C: Clock>(&self, tracker: &ChangeTracker<C>) -> bool {
        match self.built {
            None => true,
            Some(_) if self.rerender => true,
            Some(stamp) => {
                stamp.revision != tracker.revision() || tracker.is_newer_than(stamp.at)
            }
        }
    }

    /// Stores a freshly built image and records the map state it reflects.
    pub fn store<C: Clock>(&mut self, image: I, tracker: &ChangeTracker<C>) {
        self.image = Some(image);
        self.built = Some(BuildStamp {
            revision: tracker.revision(),
            at: tracker.last_changed(),
        });
        self.rerender = false;
    }

    pub fn image(&self) -> Option<&I> {
        self.image.as_ref()
    }
}

/// Owns every live render context.
#[derive(Debug)]
pub struct RenderContextManager<I> {
    contexts: BTreeMap<RenderContextId, RenderContext<I>>,
    next_id: u32,
}

impl<I> RenderContextManager<I> {
    pub fn new() -> Self {
        Self {
            contexts: BTreeMap::new(),
            next_id: 1,
        }
    }

    pub fn create(&mut self, settings: RenderSettings) -> RenderContextId {
        let id = RenderContextId(self.next_id);
        self.next_id += 1;
        self.contexts.insert(id, RenderContext::new(settings));
        tracing::debug!("Created render context {}", id);
        id
    }

    pub fn get(&self, id: RenderContextId) -> Option<&RenderContext<I>> {
        self.contexts.get(&id)
    }

    pub fn get_mut(&mut self, id: RenderContextId) -> Option<&mut RenderContext<I>> {
        self.contexts.get_mut(&id)
    }

    pub fn destroy(&mut self, id: RenderContextId) -> Option<RenderContext<I>> {
        let removed = self.contexts.remove(&id);
        if removed.is_some() {
            tracing::debug!("Destroyed render context {}", id);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }

    /// Returns the context's image, rebuilding it first if the map changed
    /// since the last build or a re-render was requested.
    pub fn draw<R, C>(
        &mut self,
        id: RenderContextId,
        map: &DungeonMap<C>,
        renderer: &mut R,
    ) -> Option<&I>
    where
        R: MapRenderer<Image = I>,
        C: Clock,
    {
        let context = self.contexts.get_mut(&id)?;
        if context.needs_rebuild(map.tracker()) {
            let image = renderer.render(map, &context.settings);
            context.store(image, map.tracker());
            tracing::trace!("Rebuilt {} at {}", id, map.last_changed());
        }
        context.image()
    }
}

impl<I> Default for RenderContextManager<I> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use map_core::{BufferBuilder, Checkmark, Floor, ManualClock, Position};

    use super::*;

    /// Counts how often it was asked to render.
    #[derive(Default)]
    struct CountingRenderer {
        renders: u32,
    }

    impl MapRenderer for CountingRenderer {
        type Image = u32;

        fn render<C: Clock>(&mut self, _map: &DungeonMap<C>, _settings: &RenderSettings) -> u32 {
            self.renders += 1;
            self.renders
        }
    }

    fn map_with_room() -> (DungeonMap<ManualClock>, ManualClock) {
        let clock = ManualClock::new(500);
        let mut map = DungeonMap::with_clock(Floor::Catacombs(3), clock.clone());
        map.update(&BufferBuilder::blank().room(Position::new(0, 0), 30).build());
        (map, clock)
    }

    #[test]
    fn ids_start_at_one_and_are_not_reused() {
        let mut contexts: RenderContextManager<u32> = RenderContextManager::new();
        let first = contexts.create(RenderSettings::default());
        let second = contexts.create(RenderSettings::default());
        assert_eq!(first, RenderContextId(1));
        assert_eq!(second, RenderContextId(2));

        assert!(contexts.destroy(first).is_some());
        assert!(contexts.destroy(first).is_none());
        assert_eq!(contexts.create(RenderSettings::default()), RenderContextId(3));
        assert_eq!(contexts.len(), 2);
    }

    #[test]
    fn draw_reuses_image_until_map_changes() {
        let (mut map, clock) = map_with_room();
        let mut contexts = RenderContextManager::new();
        let mut renderer = CountingRenderer::default();
        let id = contexts.create(RenderSettings::default());

        assert_eq!(contexts.draw(id, &map, &mut renderer), Some(&1));
        assert_eq!(contexts.draw(id, &map, &mut renderer), Some(&1));

        clock.advance(5);
        assert!(map.set_checkmark(Position::new(0, 0), Checkmark::White));
        assert_eq!(contexts.draw(id, &map, &mut renderer), Some(&2));
        assert!(!contexts.get(id).unwrap().needs_rebuild(map.tracker()));
    }

    #[test]
    fn changes_within_one_millisecond_still_rebuild() {
        let (mut map, _) = map_with_room();
        let mut contexts = RenderContextManager::new();
        let mut renderer = CountingRenderer::default();
        let id = contexts.create(RenderSettings::default());

        contexts.draw(id, &map, &mut renderer);
        // Clock frozen: only the revision moves.
        map.set_secrets(Position::new(0, 0), Some(2));
        assert_eq!(contexts.draw(id, &map, &mut renderer), Some(&2));
    }

    #[test]
    fn settings_change_forces_rebuild() {
        let (map, _) = map_with_room();
        let mut contexts = RenderContextManager::new();
        let mut renderer = CountingRenderer::default();
        let id = contexts.create(RenderSettings::default());
        contexts.draw(id, &map, &mut renderer);

        let context = contexts.get_mut(id).unwrap();
        context.set_settings(RenderSettings {
            size: 10,
            ..RenderSettings::default()
        });
        assert!(context.needs_rebuild(map.tracker()));
        assert_eq!(contexts.draw(id, &map, &mut renderer), Some(&2));
        assert!(!contexts.get(id).unwrap().needs_rebuild(map.tracker()));
    }

    #[test]
    fn unknown_context_draws_nothing() {
        let (map, _) = map_with_room();
        let mut contexts = RenderContextManager::new();
        let mut renderer = CountingRenderer::default();
        assert!(contexts.draw(RenderContextId(42), &map, &mut renderer).is_none());
        assert_eq!(renderer.renders, 0);
    }
}
