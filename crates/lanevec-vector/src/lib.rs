//! Policy-backed vectors with lock-free slot reservation.
//!
//! [`LaneVec`] is a fixed-capacity container meant to be shared between
//! sequential host code and massively parallel producers. Its storage
//! comes from a [`MemoryArena`](lanevec_core::MemoryArena) selected by an
//! [`AllocationPolicy`](lanevec_core::AllocationPolicy) tag, and many
//! threads can append to it at once through
//! [`LaneVec::atomic_index_inc`] without taking a lock.
//!
//! ```
//! use lanevec_core::AllocationPolicy;
//! use lanevec_vector::{LaneVec, StorageConfig};
//!
//! let config = StorageConfig::new(AllocationPolicy::ManagedMem).with_label("tallies");
//! let mut tallies: LaneVec<f64> = LaneVec::unallocated(config);
//! tallies.reserve(1024, AllocationPolicy::ManagedMem).unwrap();
//!
//! tallies.open();
//! tallies.push(0.5);
//! tallies.close();
//!
//! let start = tallies.atomic_index_inc(3);
//! assert_eq!(start, 1);
//! assert_eq!(tallies.len(), 4);
//! ```
//!
//! # Unsafe code
//!
//! `buffer.rs` owns every raw-pointer operation on storage. `vector.rs`
//! and `appender.rs` add the unchecked and shared-write entry points
//! lanes need, each with a documented contract.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod appender;
mod buffer;
pub mod config;
pub mod vector;

pub use appender::ConcurrentAppender;
pub use config::StorageConfig;
pub use vector::LaneVec;
