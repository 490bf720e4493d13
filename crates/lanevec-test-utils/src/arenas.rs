//! Instrumented arenas.
//!
//! - [`CountingArena`]: forwards to a [`SystemArena`] and records every
//!   allocation and release, flagging releases that do not match a live
//!   allocation.
//! - [`FailingArena`]: refuses every request.

use std::alloc::Layout;
use std::ptr::NonNull;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use lanevec_arena::SystemArena;
use lanevec_core::{AllocError, AllocationPolicy, MemoryArena};

/// Arena that counts what passes through it.
pub struct CountingArena {
    inner: SystemArena,
    live: Mutex<Vec<(usize, AllocationPolicy)>>,
    allocations: [AtomicUsize; 4],
    deallocations: AtomicUsize,
    mismatches: AtomicUsize,
}

impl CountingArena {
    pub const fn new() -> Self {
        Self {
            inner: SystemArena::with_defaults(),
            live: Mutex::new(Vec::new()),
            allocations: [const { AtomicUsize::new(0) }; 4],
            deallocations: AtomicUsize::new(0),
            mismatches: AtomicUsize::new(0),
        }
    }

    fn live_list(&self) -> MutexGuard<'_, Vec<(usize, AllocationPolicy)>> {
        self.live.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Successful allocations under any policy.
    pub fn allocations(&self) -> usize {
        self.allocations
            .iter()
            .map(|c| c.load(Ordering::Relaxed))
            .sum()
    }

    /// Successful allocations under `policy`.
    pub fn allocations_for(&self, policy: AllocationPolicy) -> usize {
        self.allocations[policy.index()].load(Ordering::Relaxed)
    }

    /// Releases received, matched or not.
    pub fn deallocations(&self) -> usize {
        self.deallocations.load(Ordering::Relaxed)
    }

    /// Allocations not yet released.
    pub fn live(&self) -> usize {
        self.live_list().len()
    }

    /// Releases whose pointer was unknown or whose policy differed from
    /// the one it was allocated under.
    pub fn mismatches(&self) -> usize {
        self.mismatches.load(Ordering::Relaxed)
    }
}

impl Default for CountingArena {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryArena for CountingArena {
    fn allocate(&self, layout: Layout, policy: AllocationPolicy) -> Result<NonNull<u8>, AllocError> {
        let ptr = self.inner.allocate(layout, policy)?;
        self.allocations[policy.index()].fetch_add(1, Ordering::Relaxed);
        self.live_list().push((ptr.as_ptr() as usize, policy));
        Ok(ptr)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout, policy: AllocationPolicy) {
        self.deallocations.fetch_add(1, Ordering::Relaxed);
        let address = ptr.as_ptr() as usize;
        let recorded = {
            let mut live = self.live_list();
            live.iter()
                .position(|&(a, _)| a == address)
                .map(|i| live.swap_remove(i).1)
        };
        let Some(recorded) = recorded else {
            self.mismatches.fetch_add(1, Ordering::Relaxed);
            return;
        };
        if recorded != policy {
            self.mismatches.fetch_add(1, Ordering::Relaxed);
        }
        // SAFETY: ptr was handed out by `inner` under `recorded` and has
        // just been removed from the live list, so it is released once.
        unsafe { self.inner.deallocate(ptr, layout, recorded) }
    }
}

/// Arena that refuses every allocation with `OutOfMemory`.
#[derive(Clone, Copy, Debug, Default)]
pub struct FailingArena;

impl MemoryArena for FailingArena {
    fn allocate(&self, layout: Layout, policy: AllocationPolicy) -> Result<NonNull<u8>, AllocError> {
        Err(AllocError::OutOfMemory {
            bytes: layout.size(),
            policy,
        })
    }

    unsafe fn deallocate(&self, _ptr: NonNull<u8>, _layout: Layout, _policy: AllocationPolicy) {
        unreachable!("FailingArena never hands out memory");
    }
}
