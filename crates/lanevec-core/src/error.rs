//! Allocation error types.
//!
//! Contract violations (double allocation, appending while closed, bulk
//! appends that do not fit) are not errors: they are programming mistakes
//! and panic at the call site. [`AllocError`] covers the one failure a
//! correct caller can still hit, which is the arena refusing a request.

use std::error::Error;
use std::fmt;

use crate::policy::AllocationPolicy;

/// Errors returned by a [`MemoryArena`](crate::MemoryArena).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AllocError {
    /// The arena's byte budget cannot satisfy the request.
    CapacityExceeded {
        /// Number of bytes requested.
        requested: usize,
        /// Bytes still available under the budget.
        available: usize,
        /// Policy the request was made against.
        policy: AllocationPolicy,
    },
    /// `count * size_of::<T>()` does not fit in a valid layout.
    LayoutOverflow {
        /// Requested element count.
        count: usize,
        /// Size of one element in bytes.
        elem_size: usize,
    },
    /// The underlying allocator returned no memory.
    OutOfMemory {
        /// Number of bytes requested.
        bytes: usize,
        /// Policy the request was made against.
        policy: AllocationPolicy,
    },
}

impl fmt::Display for AllocError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CapacityExceeded {
                requested,
                available,
                policy,
            } => {
                write!(
                    f,
                    "{policy} arena budget exceeded: requested {requested} bytes, {available} bytes available"
                )
            }
            Self::LayoutOverflow { count, elem_size } => {
                write!(
                    f,
                    "layout overflow: {count} elements of {elem_size} bytes"
                )
            }
            Self::OutOfMemory { bytes, policy } => {
                write!(f, "{policy} arena out of memory allocating {bytes} bytes")
            }
        }
    }
}

impl Error for AllocError {}
