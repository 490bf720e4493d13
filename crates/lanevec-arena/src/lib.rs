//! Allocation service and memory tracking for lane vectors.
//!
//! Provides the concrete implementations of the two service traits
//! declared in `lanevec-core`:
//!
//! ```text
//! SystemArena (MemoryArena)
//! ├── ArenaConfig (byte budget, per-policy minimum alignment)
//! ├── ArenaStats × 4 (one per AllocationPolicy, atomic counters)
//! └── raw::{alloc, dealloc} (the only calls into the global allocator)
//!
//! NoopTracker, LogTracker, TrackingRegistry (MemoryTracker)
//! └── Mutex<IndexMap<address, TrackedEntry>>
//! ```
//!
//! # Policies without a device runtime
//!
//! This build has no accelerator runtime linked in. Pinned, managed and
//! device requests are all served from host memory, aligned to the
//! granularity the real runtime would use, and accounted separately per
//! policy so that mismatched deallocations remain observable.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod config;
mod raw;
pub mod system;
pub mod tracking;

pub use config::ArenaConfig;
pub use system::{global, ArenaStats, StatsSnapshot, SystemArena};
pub use tracking::{LogTracker, NoopTracker, TrackedEntry, TrackingRegistry, NOOP_TRACKER};
