//! Change tracking for cached renders.
//!
//! Renderers keep a cached image per render target and rebuild it only when
//! the map changed after the image was built. The tracker exposes both a
//! wall-clock timestamp and a revision counter; the counter disambiguates
//! changes that land within the same millisecond.
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Milliseconds since the Unix epoch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Timestamp(pub u64);

impl Timestamp {
    pub const ZERO: Self = Self(0);
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

/// Time source for the change tracker.
pub trait Clock {
    fn now(&self) -> Timestamp;
}

/// Wall clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis() as u64)
            .unwrap_or(0);
        Timestamp(millis)
    }
}

/// Manually driven clock. Clones share the same time.
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    millis: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new(start: u64) -> Self {
        Self {
            millis: Arc::new(AtomicU64::new(start)),
        }
    }

    pub fn set(&self, millis: u64) {
        self.millis.store(millis, Ordering::Relaxed);
    }

    pub fn advance(&self, millis: u64) {
        self.millis.fetch_add(millis, Ordering::Relaxed);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        Timestamp(self.millis.load(Ordering::Relaxed))
    }
}

/// Last-modified stamp of a map.
#[derive(Clone, Debug)]
pub struct ChangeTracker<C = SystemClock> {
    clock: C,
    last_changed: Timestamp,
    revision: u64,
}

impl<C: Clock> ChangeTracker<C> {
    /// Starts the tracker at the clock's current time, revision 0.
    pub fn new(clock: C) -> Self {
        let last_changed = clock.now();
        Self {
            clock,
            last_changed,
            revision: 0,
        }
    }

    /// Records a change. The timestamp never moves backwards, even if the
    /// clock does.
    pub fn mark_changed(&mut self) -> Timestamp {
        self.last_changed = self.last_changed.max(self.clock.now());
        self.revision += 1;
        self.last_changed
    }

    pub fn last_changed(&self) -> Timestamp {
        self.last_changed
    }

    /// Number of changes recorded so far.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Returns true if the map changed after `timestamp`.
    pub fn is_newer_than(&self, timestamp: Timestamp) -> bool {
        self.last_changed > timestamp
    }
}

impl Default for ChangeTracker<SystemClock> {
    fn default() -> Self {
        Self::new(SystemClock)
    }
}
