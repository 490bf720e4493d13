//! Contracts for the services a lane vector consumes.

use std::alloc::Layout;
use std::ptr::NonNull;

use crate::error::AllocError;
use crate::label::Label;
use crate::policy::AllocationPolicy;

/// The allocation service.
///
/// Given a layout and a policy tag, hands out owned storage from the
/// matching arena, and later reclaims it given the same parameters.
/// Implementations must be usable from any thread.
#[allow(unsafe_code)]
pub trait MemoryArena: Sync {
    /// Allocate storage for `layout` from the arena selected by `policy`.
    ///
    /// The returned memory is uninitialized. Zero-sized layouts must
    /// succeed and return a dangling, suitably aligned pointer.
    fn allocate(&self, layout: Layout, policy: AllocationPolicy) -> Result<NonNull<u8>, AllocError>;

    /// Return storage previously obtained from [`MemoryArena::allocate`].
    ///
    /// # Safety
    ///
    /// `ptr` must have been returned by `allocate` on this same arena with
    /// exactly `layout` and `policy`, and must not be used afterwards.
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout, policy: AllocationPolicy);
}

/// A region registered with a [`MemoryTracker`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TrackedRegion {
    /// Start address of the buffer.
    pub address: usize,
    /// Label the owner attached to the buffer.
    pub label: Label,
    /// Extent of the buffer in bytes.
    pub bytes: usize,
    /// Arena the buffer lives in.
    pub policy: AllocationPolicy,
}

/// Optional observer for live allocations.
///
/// Purely observational: the container never reads anything back from a
/// tracker, so a tracker cannot change functional behavior.
pub trait MemoryTracker: Sync {
    /// A labelled buffer became live.
    fn track(&self, region: &TrackedRegion);

    /// The buffer starting at `address` is no longer tracked.
    fn untrack(&self, address: usize);
}
