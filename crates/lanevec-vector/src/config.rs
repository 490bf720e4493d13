//! Construction-time settings for a [`LaneVec`](crate::LaneVec).

use std::fmt;

use lanevec_arena::NOOP_TRACKER;
use lanevec_core::{AllocationPolicy, Label, MemoryArena, MemoryTracker};

/// Where a container's storage comes from and how it is labelled.
///
/// The arena and tracker are process-lifetime services, so they are held
/// as `&'static` references and copied into every container built from
/// this config (and into every clone of those containers).
#[derive(Clone, Copy)]
pub struct StorageConfig {
    /// Arena used by the sized constructors.
    ///
    /// Default: `HostMem`. `reserve`/`resize` take their own policy.
    pub policy: AllocationPolicy,
    /// Tracking label. Empty labels are never registered.
    pub label: Label,
    /// Allocation service.
    ///
    /// Default: [`lanevec_arena::global`].
    pub arena: &'static dyn MemoryArena,
    /// Tracking side channel.
    ///
    /// Default: [`NOOP_TRACKER`].
    pub tracker: &'static dyn MemoryTracker,
}

impl StorageConfig {
    /// Default services with the given policy.
    pub fn new(policy: AllocationPolicy) -> Self {
        Self {
            policy,
            label: Label::EMPTY,
            arena: lanevec_arena::global(),
            tracker: &NOOP_TRACKER,
        }
    }

    /// Attach a tracking label.
    pub fn with_label(mut self, label: &str) -> Self {
        self.label = Label::new(label);
        self
    }

    /// Allocate from `arena` instead of the global arena.
    pub fn with_arena(mut self, arena: &'static dyn MemoryArena) -> Self {
        self.arena = arena;
        self
    }

    /// Report labelled buffers to `tracker`.
    pub fn with_tracker(mut self, tracker: &'static dyn MemoryTracker) -> Self {
        self.tracker = tracker;
        self
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::new(AllocationPolicy::HostMem)
    }
}

impl fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageConfig")
            .field("policy", &self.policy)
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}
