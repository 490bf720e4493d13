//! Test utilities and mock services for lanevec development.
//!
//! Provides instrumented implementations of the service traits
//! ([`MemoryArena`](lanevec_core::MemoryArena),
//! [`MemoryTracker`](lanevec_core::MemoryTracker)) so container tests can
//! observe which arena was asked for what, and when.

#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod arenas;
pub mod trackers;

pub use arenas::{CountingArena, FailingArena};
pub use trackers::{RecordingTracker, TrackerEvent};

/// Promote a test service to the `'static` lifetime containers expect.
///
/// Leaks one small allocation per call, which is fine for tests.
pub fn leak<T>(value: T) -> &'static T {
    Box::leak(Box::new(value))
}
