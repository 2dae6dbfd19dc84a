//! Tracked entries and the notifications that mutate them

use bitflags::bitflags;
use std::path::PathBuf;
use std::time::{Duration, Instant};

bitflags! {
    /// Operation kinds carried by a single notification
    ///
    /// A raw notification can combine several kinds; each one is applied
    /// independently.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct OpKinds: u8 {
        const CREATE = 1 << 0;
        const WRITE = 1 << 1;
        const REMOVE = 1 << 2;
        const RENAME = 1 << 3;
        const CHMOD = 1 << 4;
    }
}

impl OpKinds {
    /// True if the path went away (removed or renamed out)
    pub fn is_departure(self) -> bool {
        self.intersects(OpKinds::REMOVE | OpKinds::RENAME)
    }
}

/// One event from the notification source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Path the event refers to
    pub path: PathBuf,
    /// Kinds reported for this path
    pub kinds: OpKinds,
}

impl Notification {
    pub fn new(path: impl Into<PathBuf>, kinds: OpKinds) -> Self {
        Self {
            path: path.into(),
            kinds,
        }
    }
}

/// Cumulative per-kind counters
///
/// Counters never decrease and are never reset by deletion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counters {
    pub create: u64,
    pub write: u64,
    pub remove: u64,
    pub rename: u64,
    pub chmod: u64,
}

/// Aggregated state for one tracked path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Absolute path (registry key)
    pub path: PathBuf,
    /// Fixed at creation from the first observation
    pub is_dir: bool,
    /// Set by remove/rename, cleared by a later create
    pub deleted: bool,
    /// Event counters
    pub counts: Counters,
    /// Most recent notification touching this path; `None` if never touched
    pub last_event: Option<Instant>,
}

impl Entry {
    /// Create an untouched entry
    pub fn new(path: impl Into<PathBuf>, is_dir: bool) -> Self {
        Self {
            path: path.into(),
            is_dir,
            deleted: false,
            counts: Counters::default(),
            last_event: None,
        }
    }

    /// Create an entry discovered by a re-walk, stamped with `now`
    pub fn discovered(path: impl Into<PathBuf>, is_dir: bool, now: Instant) -> Self {
        Self {
            last_event: Some(now),
            ..Self::new(path, is_dir)
        }
    }

    pub fn touch(&mut self, now: Instant) {
        self.last_event = Some(now);
    }

    /// Time since the last event, if any
    pub fn age(&self, now: Instant) -> Option<Duration> {
        self.last_event.map(|t| now.saturating_duration_since(t))
    }

    /// Whether the entry saw an event within `window` of `now`
    pub fn is_recent(&self, now: Instant, window: Duration) -> bool {
        self.age(now).is_some_and(|age| age < window)
    }

    /// Deleted and the tombstone window has elapsed
    pub fn is_expired(&self, now: Instant, window: Duration) -> bool {
        if !self.deleted {
            return false;
        }
        match self.age(now) {
            Some(age) => age > window,
            None => true,
        }
    }
}
