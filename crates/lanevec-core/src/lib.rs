//! Core types and traits for lane vectors.
//!
//! This is the leaf crate with zero internal dependencies. It defines the
//! narrow contracts a `LaneVec` consumes from its collaborators: the
//! allocation service ([`MemoryArena`]), the optional tracking side channel
//! ([`MemoryTracker`]), and the atomic fetch-and-add primitive
//! ([`SlotCounter`]), together with the value types that cross those
//! boundaries.
//!
//! The only `unsafe` item here is the [`MemoryArena::deallocate`]
//! declaration; implementations live in `lanevec-arena`.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod counter;
pub mod error;
pub mod label;
pub mod policy;
pub mod traits;

pub use counter::SlotCounter;
pub use error::AllocError;
pub use label::Label;
pub use policy::AllocationPolicy;
pub use traits::{MemoryArena, MemoryTracker, TrackedRegion};
