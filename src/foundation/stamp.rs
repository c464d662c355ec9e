//! Logical clock shared by every stamped object in the process.
//!
//! Stamps are drawn from a single monotonically increasing counter, so comparing the stamps of
//! two unrelated objects is meaningful: the larger one was modified later.

use std::cell::Cell;
use std::sync::atomic::{AtomicU64, Ordering};

static CLOCK: AtomicU64 = AtomicU64::new(0);
static IDS: AtomicU64 = AtomicU64::new(0);

/// A point on the global logical clock.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    serde::Serialize,
    serde::Deserialize,
)]
pub struct Stamp(pub u64);

impl Stamp {
    /// "Never": older than every stamp handed out by [`Stamp::next`].
    pub const ZERO: Self = Self(0);

    /// Take the next value from the global clock.
    pub fn next() -> Self {
        Self(CLOCK.fetch_add(1, Ordering::Relaxed) + 1)
    }

    /// Most recent value handed out so far.
    pub fn current() -> Self {
        Self(CLOCK.load(Ordering::Relaxed))
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn is_newer_than(self, other: Stamp) -> bool {
        self.0 > other.0
    }
}

/// Stable identity of a stamped object, used as a cache key by view nodes and resources.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct ObjectId(pub u64);

impl ObjectId {
    pub fn next() -> Self {
        Self(IDS.fetch_add(1, Ordering::Relaxed) + 1)
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identity plus modification stamp, embedded by every domain object and pipeline node.
#[derive(Debug)]
pub struct Stamped {
    id: ObjectId,
    stamp: Cell<Stamp>,
}

impl Stamped {
    /// New objects count as modified at creation.
    pub fn new() -> Self {
        Self {
            id: ObjectId::next(),
            stamp: Cell::new(Stamp::next()),
        }
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn stamp(&self) -> Stamp {
        self.stamp.get()
    }

    /// Advance to the next global stamp. Does no other work.
    pub fn modified(&self) -> Stamp {
        let s = Stamp::next();
        self.stamp.set(s);
        s
    }
}

impl Default for Stamped {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/stamp.rs"]
mod tests;
