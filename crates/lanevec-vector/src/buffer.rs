//! Owned, policy-tagged storage.
//!
//! [`Buffer`] is the only place in the crate that turns raw arena memory
//! into typed slots. It always holds exactly `capacity` initialized
//! elements (or none at all), and it returns its memory to the arena it
//! came from, under the policy recorded at allocation, when dropped.

#![allow(unsafe_code)]

use std::alloc::Layout;
use std::fmt;
use std::ptr::{self, NonNull};
use std::slice;

use lanevec_core::{AllocError, AllocationPolicy, MemoryArena};

/// Typed storage for `capacity` elements from one arena.
pub(crate) struct Buffer<T> {
    ptr: NonNull<T>,
    capacity: usize,
    policy: AllocationPolicy,
    arena: &'static dyn MemoryArena,
}

// SAFETY: Buffer owns its elements exactly like a Box<[T]>; the arena
// reference is `Sync` by the trait bound.
unsafe impl<T: Send> Send for Buffer<T> {}
// SAFETY: shared access hands out `&T` (needs `T: Sync`) and, through the
// unsafe slot API, moves values into slots from other threads (needs
// `T: Send`).
unsafe impl<T: Send + Sync> Sync for Buffer<T> {}

impl<T> Buffer<T> {
    /// A buffer with no storage, bound to `arena` and `policy`.
    pub(crate) fn unallocated(policy: AllocationPolicy, arena: &'static dyn MemoryArena) -> Self {
        Self {
            ptr: NonNull::dangling(),
            capacity: 0,
            policy,
            arena,
        }
    }

    fn layout(capacity: usize) -> Result<Layout, AllocError> {
        Layout::array::<T>(capacity).map_err(|_| AllocError::LayoutOverflow {
            count: capacity,
            elem_size: size_of::<T>(),
        })
    }

    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    pub(crate) fn policy(&self) -> AllocationPolicy {
        self.policy
    }

    pub(crate) fn arena(&self) -> &'static dyn MemoryArena {
        self.arena
    }

    pub(crate) fn is_allocated(&self) -> bool {
        self.capacity > 0
    }

    /// Start address, used as the tracking key.
    pub(crate) fn address(&self) -> usize {
        self.ptr.as_ptr() as usize
    }

    pub(crate) fn bytes(&self) -> usize {
        self.capacity * size_of::<T>()
    }

    /// Raw pointer to slot `index`. Never dereferenced here.
    pub(crate) fn slot_ptr(&self, index: usize) -> *mut T {
        self.ptr.as_ptr().wrapping_add(index)
    }

    /// Shared reference to slot `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= capacity`.
    pub(crate) fn get(&self, index: usize) -> &T {
        self.check(index);
        // SAFETY: index is in bounds and every slot is initialized.
        unsafe { &*self.ptr.as_ptr().add(index) }
    }

    /// Mutable reference to slot `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= capacity`.
    pub(crate) fn get_mut(&mut self, index: usize) -> &mut T {
        self.check(index);
        // SAFETY: index is in bounds, every slot is initialized, and
        // `&mut self` rules out other references.
        unsafe { &mut *self.ptr.as_ptr().add(index) }
    }

    fn check(&self, index: usize) {
        assert!(
            index < self.capacity,
            "index {index} out of bounds for LaneVec of capacity {}",
            self.capacity
        );
    }

    /// The first `len` slots. `len` is clamped to capacity.
    pub(crate) fn prefix(&self, len: usize) -> &[T] {
        let len = len.min(self.capacity);
        // SAFETY: the first `capacity` slots are initialized; a dangling
        // pointer is valid for a zero-length slice.
        unsafe { slice::from_raw_parts(self.ptr.as_ptr(), len) }
    }

    /// The first `len` slots, mutably. `len` is clamped to capacity.
    pub(crate) fn prefix_mut(&mut self, len: usize) -> &mut [T] {
        let len = len.min(self.capacity);
        // SAFETY: as for `prefix`, and `&mut self` rules out aliases.
        unsafe { slice::from_raw_parts_mut(self.ptr.as_ptr(), len) }
    }
}

impl<T: Copy> Buffer<T> {
    /// Allocate `capacity` slots, copy `prefix` into the front and set
    /// every remaining slot to `fill`.
    ///
    /// A zero capacity performs no allocation and returns an unallocated
    /// buffer bound to the same arena and policy.
    pub(crate) fn allocate(
        capacity: usize,
        prefix: &[T],
        fill: T,
        policy: AllocationPolicy,
        arena: &'static dyn MemoryArena,
    ) -> Result<Self, AllocError> {
        debug_assert!(prefix.len() <= capacity);
        if capacity == 0 {
            return Ok(Self::unallocated(policy, arena));
        }
        let layout = Self::layout(capacity)?;
        let ptr = arena.allocate(layout, policy)?.cast::<T>();
        let base = ptr.as_ptr();
        // SAFETY: `base` points to `capacity` uninitialized slots aligned
        // for T. `prefix` is a separate borrow and cannot overlap fresh
        // memory. Writing a Copy value needs no drop of the old contents.
        unsafe {
            ptr::copy_nonoverlapping(prefix.as_ptr(), base, prefix.len());
            for i in prefix.len()..capacity {
                base.add(i).write(fill);
            }
        }
        Ok(Self {
            ptr,
            capacity,
            policy,
            arena,
        })
    }
}

impl<T> Drop for Buffer<T> {
    fn drop(&mut self) {
        if self.capacity == 0 {
            return;
        }
        // The layout was valid when the buffer was allocated.
        let Ok(layout) = Self::layout(self.capacity) else {
            return;
        };
        // SAFETY: ptr came from `self.arena.allocate(layout, self.policy)`
        // and is released exactly once. Elements are `Copy` (enforced by
        // the only allocating constructor) so no element destructors run.
        unsafe {
            self.arena
                .deallocate(self.ptr.cast::<u8>(), layout, self.policy)
        };
    }
}

impl<T> fmt::Debug for Buffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buffer")
            .field("ptr", &self.ptr)
            .field("capacity", &self.capacity)
            .field("policy", &self.policy)
            .finish()
    }
}
