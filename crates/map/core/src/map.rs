//! Per-attempt dungeon map state.
use crate::config::MapConfig;
use crate::coords::{CoordinateOrigin, Position};
use crate::decoder::{MapDecoder, MapUpdate};
use crate::floor::Floor;
use crate::pixels::PixelBuffer;
use crate::registry::{RoomId, RoomRegistry};
use crate::room::{Checkmark, Room};
use crate::tracker::{ChangeTracker, Clock, SystemClock, Timestamp};

/// Rooms, grid origin and change stamp for one dungeon attempt.
///
/// Feed every fresh map buffer to [`update`](Self::update); read rooms back
/// through [`rooms`](Self::rooms) and compare [`last_changed`](Self::last_changed)
/// against cached renders.
#[derive(Debug)]
pub struct DungeonMap<C: Clock = SystemClock> {
    floor: Floor,
    config: MapConfig,
    origin: Option<CoordinateOrigin>,
    registry: RoomRegistry,
    tracker: ChangeTracker<C>,
}

impl DungeonMap<SystemClock> {
    pub fn new(floor: Floor) -> Self {
        Self::with_clock(floor, SystemClock)
    }
}

impl<C: Clock> DungeonMap<C> {
    pub fn with_clock(floor: Floor, clock: C) -> Self {
        Self::with_config(floor, MapConfig::default(), clock)
    }

    pub fn with_config(floor: Floor, config: MapConfig, clock: C) -> Self {
        Self {
            floor,
            config,
            origin: None,
            registry: RoomRegistry::new(),
            tracker: ChangeTracker::new(clock),
        }
    }

    /// Decodes a fresh map buffer into the registry.
    ///
    /// Until a buffer containing at least one room arrives the grid origin is
    /// unknown and the call is a no-op. The change stamp advances once if the
    /// pass created, reclassified or merged anything.
    pub fn update(&mut self, buffer: &PixelBuffer) -> MapUpdate {
        let mut origin_discovered = false;
        let origin = match self.origin {
            Some(origin) => origin,
            None => {
                let Some(origin) = CoordinateOrigin::discover(buffer, self.floor, &self.config)
                else {
                    tracing::trace!("Map origin not discoverable yet; skipping pass");
                    return MapUpdate::default();
                };
                self.origin = Some(origin);
                origin_discovered = true;
                origin
            }
        };

        let mut update = MapDecoder::new(buffer, origin, &mut self.registry).run();
        update.origin_discovered = origin_discovered;

        if update.is_changed() {
            let stamp = self.tracker.mark_changed();
            tracing::debug!(
                "Map updated: created={}, reclassified={}, merged={}, rooms={}, stamp={}",
                update.created,
                update.reclassified,
                update.merged,
                self.registry.len(),
                stamp
            );
        }

        update
    }

    /// Sets the completion marker of the room covering `position`.
    ///
    /// Returns false if no room covers the cell or the marker is unchanged.
    pub fn set_checkmark(&mut self, position: Position, checkmark: Checkmark) -> bool {
        self.modify_room(position, |room| room.set_checkmark(checkmark))
    }

    /// Sets the found-secret count of the room covering `position`.
    pub fn set_secrets(&mut self, position: Position, secrets: Option<u32>) -> bool {
        self.modify_room(position, |room| room.set_secrets(secrets))
    }

    fn modify_room(&mut self, position: Position, apply: impl FnOnce(&mut Room) -> bool) -> bool {
        let changed = self
            .registry
            .room_id_at(position.world())
            .and_then(|id| self.registry.room_mut(id))
            .is_some_and(apply);
        if changed {
            self.tracker.mark_changed();
        }
        changed
    }

    /// Releases every room. The origin is kept; a destroyed map is not reused.
    pub fn destroy(&mut self) {
        tracing::debug!("Destroying map with {} rooms", self.registry.len());
        self.registry.clear();
    }

    pub fn floor(&self) -> Floor {
        self.floor
    }

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    pub fn origin(&self) -> Option<&CoordinateOrigin> {
        self.origin.as_ref()
    }

    pub fn registry(&self) -> &RoomRegistry {
        &self.registry
    }

    /// Distinct rooms in discovery order.
    pub fn rooms(&self) -> impl Iterator<Item = (RoomId, &Room)> {
        self.registry.iter()
    }

    pub fn room_at(&self, position: Position) -> Option<&Room> {
        self.registry.room_at_grid(position)
    }

    /// Number of rooms whose checkmark counts as cleared.
    pub fn cleared_rooms(&self) -> usize {
        self.registry.rooms().filter(|room| room.is_cleared()).count()
    }

    pub fn tracker(&self) -> &ChangeTracker<C> {
        &self.tracker
    }

    pub fn last_changed(&self) -> Timestamp {
        self.tracker.last_changed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::PixelPos;
    use crate::pixels::BufferBuilder;
    use crate::tracker::ManualClock;

    fn map() -> (DungeonMap<ManualClock>, ManualClock) {
        let clock = ManualClock::new(1_000);
        (DungeonMap::with_clock(Floor::Catacombs(7), clock.clone()), clock)
    }

    #[test]
    fn origin_is_discovered_once() {
        let (mut map, _) = map();
        let buffer = BufferBuilder::blank().room(Position::new(0, 0), 30).build();

        assert!(map.update(&buffer).origin_discovered);
        let origin = *map.origin().unwrap();

        // A buffer laid out differently does not move the origin.
        let shifted = BufferBuilder::new(PixelPos::new(9, 9), 16)
            .room(Position::new(0, 0), 30)
            .build();
        assert!(!map.update(&shifted).origin_discovered);
        assert_eq!(map.origin(), Some(&origin));
    }

    #[test]
    fn checkmarks_mark_changes_only_when_different() {
        let (mut map, clock) = map();
        map.update(&BufferBuilder::blank().room(Position::new(2, 3), 66).build());
        let revision = map.tracker().revision();

        clock.advance(10);
        assert!(map.set_checkmark(Position::new(2, 3), Checkmark::Green));
        assert_eq!(map.tracker().revision(), revision + 1);
        assert_eq!(map.last_changed(), Timestamp(1_010));
        assert_eq!(map.cleared_rooms(), 1);

        assert!(!map.set_checkmark(Position::new(2, 3), Checkmark::Green));
        assert!(!map.set_checkmark(Position::new(0, 0), Checkmark::White));
        assert_eq!(map.tracker().revision(), revision + 1);
    }

    #[test]
    fn secrets_are_tracked_per_room() {
        let (mut map, _) = map();
        map.update(&BufferBuilder::blank().room(Position::new(1, 1), 63).build());

        assert!(map.set_secrets(Position::new(1, 1), Some(4)));
        assert_eq!(map.room_at(Position::new(1, 1)).unwrap().secrets(), Some(4));
        assert!(!map.set_secrets(Position::new(1, 1), Some(4)));
    }

    #[test]
    fn destroy_clears_rooms() {
        let (mut map, _) = map();
        map.update(&BufferBuilder::blank().room(Position::new(0, 0), 30).build());
        assert_eq!(map.registry().len(), 1);

        map.destroy();
        assert!(map.registry().is_empty());
        assert!(map.room_at(Position::new(0, 0)).is_none());
    }
}
