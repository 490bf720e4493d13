//! Benchmark workloads for lanevec.
//!
//! - [`reserved`]: an empty container with storage for a workload
//! - [`lane_payload`]: deterministic per-lane values for append benches

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use lanevec_core::{AllocError, AllocationPolicy};
use lanevec_vector::{LaneVec, StorageConfig};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

/// Lanes used by the concurrent benches.
pub const LANES: usize = 8;

/// Build an empty container with `capacity` slots under `policy`.
pub fn reserved(capacity: usize, policy: AllocationPolicy) -> Result<LaneVec<u64>, AllocError> {
    let mut vec = LaneVec::unallocated(StorageConfig::new(policy).with_label("bench"));
    vec.reserve(capacity, policy)?;
    Ok(vec)
}

/// `len` values for `lane`, reproducible across runs.
///
/// Each lane draws from a ChaCha8 stream seeded with its index, so lanes
/// write distinguishable data.
pub fn lane_payload(lane: usize, len: usize) -> Vec<u64> {
    let mut rng = ChaCha8Rng::seed_from_u64(lane as u64);
    (0..len).map(|_| rng.random::<u64>()).collect()
}
