//! A tracker that records events in order.

use std::sync::{Mutex, PoisonError};

use lanevec_core::{MemoryTracker, TrackedRegion};

/// One call received by a [`RecordingTracker`].
#[derive(Clone, Debug, PartialEq)]
pub enum TrackerEvent {
    Track(TrackedRegion),
    Untrack(usize),
}

/// Tracker that appends every call to an in-memory log.
#[derive(Debug, Default)]
pub struct RecordingTracker {
    events: Mutex<Vec<TrackerEvent>>,
}

impl RecordingTracker {
    pub const fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }

    /// Events received so far, oldest first.
    pub fn events(&self) -> Vec<TrackerEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn record(&self, event: TrackerEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

impl MemoryTracker for RecordingTracker {
    fn track(&self, region: &TrackedRegion) {
        self.record(TrackerEvent::Track(*region));
    }

    fn untrack(&self, address: usize) {
        self.record(TrackerEvent::Untrack(address));
    }
}
