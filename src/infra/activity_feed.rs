//! Bounded activity feed
//!
//! Newest entries sit at the front. Appending past capacity evicts from
//! the back, so the feed never holds more than `capacity` entries no
//! matter how many timers append in the same instant.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use tracing::trace;

use crate::domain::ActivityEntry;

use super::FeedObserver;

/// Default number of entries kept
pub const DEFAULT_FEED_CAPACITY: usize = 20;

/// Feed counters
#[derive(Debug, Default)]
pub struct FeedStats {
    appended: AtomicU64,
    evicted: AtomicU64,
}

impl FeedStats {
    pub fn appended(&self) -> u64 {
        self.appended.load(Ordering::Relaxed)
    }

    pub fn evicted(&self) -> u64 {
        self.evicted.load(Ordering::Relaxed)
    }
}

/// Ordered, bounded log of recent system events
pub struct ActivityFeed {
    capacity: usize,
    entries: RwLock<VecDeque<ActivityEntry>>,
    observers: RwLock<Vec<Arc<dyn FeedObserver>>>,
    stats: FeedStats,
}

impl ActivityFeed {
    /// Create an empty feed. A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: RwLock::new(VecDeque::with_capacity(capacity + 1)),
            observers: RwLock::new(Vec::new()),
            stats: FeedStats::default(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn stats(&self) -> &FeedStats {
        &self.stats
    }

    /// Register a render callback, invoked after every mutation
    pub fn subscribe(&self, observer: Arc<dyn FeedObserver>) {
        self.observers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(observer);
    }

    /// Insert at the front, evict past capacity, return the new snapshot
    pub fn append(&self, entry: ActivityEntry) -> Vec<ActivityEntry> {
        trace!(kind = %entry.kind, title = %entry.title, "Appending feed entry");

        let snapshot = {
            let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
            entries.push_front(entry);
            while entries.len() > self.capacity {
                entries.pop_back();
                self.stats.evicted.fetch_add(1, Ordering::Relaxed);
            }
            entries.iter().cloned().collect::<Vec<_>>()
        };
        self.stats.appended.fetch_add(1, Ordering::Relaxed);

        self.notify(&snapshot);
        snapshot
    }

    /// Replace the feed with `entries` (given newest first) and notify once
    pub fn seed(&self, entries: impl IntoIterator<Item = ActivityEntry>) -> Vec<ActivityEntry> {
        let snapshot = {
            let mut current = self.entries.write().unwrap_or_else(PoisonError::into_inner);
            current.clear();
            current.extend(entries.into_iter().take(self.capacity));
            current.iter().cloned().collect::<Vec<_>>()
        };

        self.notify(&snapshot);
        snapshot
    }

    /// Current entries, newest first
    pub fn snapshot(&self) -> Vec<ActivityEntry> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    /// Most recent entry, if any
    pub fn latest(&self) -> Option<ActivityEntry> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .front()
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn notify(&self, snapshot: &[ActivityEntry]) {
        let observers = self
            .observers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for observer in observers {
            observer.feed_changed(snapshot);
        }
    }
}

impl Default for ActivityFeed {
    fn default() -> Self {
        Self::new(DEFAULT_FEED_CAPACITY)
    }
}
