//! lanevec: fixed-capacity vectors for code that runs on one host thread
//! and on many data-parallel lanes.
//!
//! This is the top-level facade crate that re-exports the public API from
//! all lanevec sub-crates. For most users, adding `lanevec` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use lanevec::prelude::*;
//!
//! // A labelled buffer in the managed arena.
//! let config = StorageConfig::new(AllocationPolicy::ManagedMem).with_label("events");
//! let mut events: LaneVec<u32> = LaneVec::unallocated(config);
//! events.reserve(1000, AllocationPolicy::ManagedMem).unwrap();
//!
//! // Lanes append without locking.
//! {
//!     let appender = events.concurrent();
//!     std::thread::scope(|s| {
//!         for lane in 0..10u32 {
//!             let appender = &appender;
//!             s.spawn(move || {
//!                 for i in 0..100 {
//!                     appender.push(lane * 100 + i);
//!                 }
//!             });
//!         }
//!     });
//! }
//! assert_eq!(events.len(), 1000);
//!
//! // Host code reads the result.
//! let total: u64 = events.iter().map(|&v| u64::from(v)).sum();
//! assert_eq!(total, 999 * 1000 / 2);
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in the prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `lanevec-core` | Policy tags, labels, errors, service traits, slot counters |
//! | [`arena`] | `lanevec-arena` | System arena, budgets, stats, memory trackers |
//! | [`vector`] | `lanevec-vector` | `LaneVec`, `ConcurrentAppender`, `StorageConfig` |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types, traits, and counters (`lanevec-core`).
///
/// Contains [`types::AllocationPolicy`], [`types::Label`], the
/// [`types::AllocError`] type, and the service traits
/// ([`types::MemoryArena`], [`types::MemoryTracker`]).
pub use lanevec_core as types;

/// Allocation and tracking services (`lanevec-arena`).
///
/// [`arena::SystemArena`] serves every policy; [`arena::global`] is the
/// process-wide instance. [`arena::TrackingRegistry`] records labelled
/// buffers.
pub use lanevec_arena as arena;

/// The container (`lanevec-vector`).
///
/// [`vector::LaneVec`] for storage, [`vector::ConcurrentAppender`] for safe
/// many-producer appends.
pub use lanevec_vector as vector;

/// Common imports for typical lanevec usage.
///
/// ```rust
/// use lanevec::prelude::*;
/// ```
pub mod prelude {
    // Core types and traits
    pub use lanevec_core::{AllocError, AllocationPolicy, Label, MemoryArena, MemoryTracker};

    // Services
    pub use lanevec_arena::{ArenaConfig, SystemArena, TrackingRegistry};

    // Container
    pub use lanevec_vector::{ConcurrentAppender, LaneVec, StorageConfig};
}
