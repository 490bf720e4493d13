//! Memory trackers: observers for labelled live buffers.
//!
//! A container registers its buffer with a [`MemoryTracker`] when it is
//! allocated under a non-empty label, and deregisters it on relabel or
//! drop. [`NoopTracker`] is the default and compiles to nothing;
//! [`TrackingRegistry`] keeps an insertion-ordered table of live regions
//! that tools and tests can inspect; [`LogTracker`] forwards every event
//! to the `log` facade.

use std::sync::{Mutex, MutexGuard, PoisonError};

use indexmap::IndexMap;
use lanevec_core::{AllocationPolicy, Label, MemoryTracker, TrackedRegion};
use log::{debug, trace, warn};

/// Tracker that ignores every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopTracker;

/// Shared instance of [`NoopTracker`], the default for new containers.
pub static NOOP_TRACKER: NoopTracker = NoopTracker;

impl MemoryTracker for NoopTracker {
    #[inline]
    fn track(&self, _region: &TrackedRegion) {}

    #[inline]
    fn untrack(&self, _address: usize) {}
}

/// Tracker that reports every event at `debug` level.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogTracker;

impl MemoryTracker for LogTracker {
    fn track(&self, region: &TrackedRegion) {
        debug!(
            "lanevec: track '{}' {} bytes ({}) at {:#x}",
            region.label, region.bytes, region.policy, region.address
        );
    }

    fn untrack(&self, address: usize) {
        debug!("lanevec: untrack {address:#x}");
    }
}

/// Metadata kept for one live region.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TrackedEntry {
    /// Label the region was registered under.
    pub label: Label,
    /// Extent in bytes.
    pub bytes: usize,
    /// Arena backing the region.
    pub policy: AllocationPolicy,
}

/// Insertion-ordered table of live tracked regions, keyed by address.
///
/// Registering an address that is already live replaces its entry (the
/// buffer was relabelled without an intervening untrack). Untracking an
/// unknown address is logged and otherwise ignored.
#[derive(Debug, Default)]
pub struct TrackingRegistry {
    entries: Mutex<IndexMap<usize, TrackedEntry>>,
}

impl TrackingRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, IndexMap<usize, TrackedEntry>> {
        // Entries are plain data; a panic mid-update cannot leave them torn.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of live regions.
    pub fn live_count(&self) -> usize {
        self.entries().len()
    }

    /// Sum of the extents of all live regions.
    pub fn total_bytes(&self) -> usize {
        self.entries().values().map(|e| e.bytes).sum()
    }

    /// Entry for the region starting at `address`, if live.
    pub fn get(&self, address: usize) -> Option<TrackedEntry> {
        self.entries().get(&address).copied()
    }

    /// Labels of all live regions, in registration order.
    pub fn labels(&self) -> Vec<Label> {
        self.entries().values().map(|e| e.label).collect()
    }

    /// Live bytes attributed to `label`.
    pub fn bytes_for(&self, label: &str) -> usize {
        self.entries()
            .values()
            .filter(|e| e.label.as_str() == label)
            .map(|e| e.bytes)
            .sum()
    }
}

impl MemoryTracker for TrackingRegistry {
    fn track(&self, region: &TrackedRegion) {
        trace!(
            "lanevec: registry track '{}' {} bytes at {:#x}",
            region.label,
            region.bytes,
            region.address
        );
        self.entries().insert(
            region.address,
            TrackedEntry {
                label: region.label,
                bytes: region.bytes,
                policy: region.policy,
            },
        );
    }

    fn untrack(&self, address: usize) {
        // shift_remove keeps the remaining entries in registration order.
        if self.entries().shift_remove(&address).is_none() {
            warn!("lanevec: untrack of unregistered region {address:#x}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region(address: usize, label: &str, bytes: usize) -> TrackedRegion {
        TrackedRegion {
            address,
            label: Label::new(label),
            bytes,
            policy: AllocationPolicy::HostMem,
        }
    }

    #[test]
    fn track_and_untrack() {
        let registry = TrackingRegistry::new();
        registry.track(&region(0x1000, "tallies", 512));
        assert_eq!(registry.live_count(), 1);
        assert_eq!(registry.get(0x1000).unwrap().bytes, 512);

        registry.untrack(0x1000);
        assert_eq!(registry.live_count(), 0);
        assert!(registry.get(0x1000).is_none());
    }

    #[test]
    fn labels_keep_registration_order() {
        let registry = TrackingRegistry::new();
        registry.track(&region(0x3000, "c", 1));
        registry.track(&region(0x1000, "a", 1));
        registry.track(&region(0x2000, "b", 1));
        registry.untrack(0x1000);
        let labels: Vec<_> = registry.labels().iter().map(|l| l.to_string()).collect();
        assert_eq!(labels, vec!["c", "b"]);
    }

    #[test]
    fn retrack_replaces_entry() {
        let registry = TrackingRegistry::new();
        registry.track(&region(0x1000, "old", 64));
        registry.track(&region(0x1000, "new", 64));
        assert_eq!(registry.live_count(), 1);
        assert_eq!(registry.get(0x1000).unwrap().label.as_str(), "new");
    }

    #[test]
    fn totals_by_label() {
        let registry = TrackingRegistry::new();
        registry.track(&region(0x1000, "particles", 100));
        registry.track(&region(0x2000, "particles", 50));
        registry.track(&region(0x3000, "tallies", 7));
        assert_eq!(registry.total_bytes(), 157);
        assert_eq!(registry.bytes_for("particles"), 150);
    }

    #[test]
    fn untrack_unknown_is_ignored() {
        let registry = TrackingRegistry::new();
        registry.untrack(0xdead);
        assert_eq!(registry.live_count(), 0);
    }

    #[test]
    fn noop_and_log_trackers_accept_events() {
        NOOP_TRACKER.track(&region(0x1000, "x", 1));
        NOOP_TRACKER.untrack(0x1000);
        LogTracker.track(&region(0x1000, "x", 1));
        LogTracker.untrack(0x1000);
    }
}
