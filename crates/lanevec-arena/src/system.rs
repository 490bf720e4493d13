//! The process-memory implementation of [`MemoryArena`].
//!
//! [`SystemArena`] dispatches on the [`AllocationPolicy`] tag at runtime:
//! the tag selects the minimum alignment and the accounting bucket, and
//! the same tag must come back on deallocation. Every bucket is a set of
//! atomic counters so the arena can be shared as a `static`.

use std::alloc::Layout;
use std::ptr::NonNull;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use lanevec_core::{AllocError, AllocationPolicy, MemoryArena};
use log::{trace, warn};

use crate::config::ArenaConfig;
use crate::raw;

/// Per-policy allocation counters.
#[derive(Debug)]
pub struct ArenaStats {
    live_bytes: AtomicUsize,
    live_allocations: AtomicUsize,
    total_allocations: AtomicU64,
}

/// A point-in-time copy of an [`ArenaStats`] bucket.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Bytes currently allocated under the policy.
    pub live_bytes: usize,
    /// Allocations currently outstanding under the policy.
    pub live_allocations: usize,
    /// Allocations ever made under the policy.
    pub total_allocations: u64,
}

impl ArenaStats {
    const fn new() -> Self {
        Self {
            live_bytes: AtomicUsize::new(0),
            live_allocations: AtomicUsize::new(0),
            total_allocations: AtomicU64::new(0),
        }
    }

    fn record_alloc(&self, bytes: usize) {
        self.live_bytes.fetch_add(bytes, Ordering::Relaxed);
        self.live_allocations.fetch_add(1, Ordering::Relaxed);
        self.total_allocations.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns `false` if the bucket holds fewer bytes or allocations than
    /// are being released, which means the caller passed the wrong policy.
    fn record_dealloc(&self, bytes: usize) -> bool {
        let bytes_ok = self
            .live_bytes
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |live| live.checked_sub(bytes))
            .is_ok();
        let count_ok = self
            .live_allocations
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |live| live.checked_sub(1))
            .is_ok();
        bytes_ok && count_ok
    }

    /// Copy the current counter values.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            live_bytes: self.live_bytes.load(Ordering::Relaxed),
            live_allocations: self.live_allocations.load(Ordering::Relaxed),
            total_allocations: self.total_allocations.load(Ordering::Relaxed),
        }
    }
}

/// Host-backed allocation service for every [`AllocationPolicy`].
///
/// Without a device runtime, pinned, managed and device memory are plain
/// host allocations rounded up to the alignment configured for their
/// policy. A byte budget ([`ArenaConfig::max_bytes`]) is enforced across
/// all policies.
#[derive(Debug)]
pub struct SystemArena {
    config: ArenaConfig,
    /// Live bytes across all policies, charged before the allocator call.
    live_bytes: AtomicUsize,
    /// One bucket per policy, indexed by [`AllocationPolicy::index`].
    stats: [ArenaStats; 4],
}

static GLOBAL: SystemArena = SystemArena::with_defaults();

/// The process-wide arena with default configuration.
pub fn global() -> &'static SystemArena {
    &GLOBAL
}

impl SystemArena {
    /// Create an arena with the given configuration.
    ///
    /// # Panics
    ///
    /// Panics if `config` fails [`ArenaConfig::validate`].
    pub fn new(config: ArenaConfig) -> Self {
        if let Err(field) = config.validate() {
            panic!("invalid ArenaConfig: {field} must be a non-zero power of two");
        }
        Self {
            config,
            live_bytes: AtomicUsize::new(0),
            stats: [
                ArenaStats::new(),
                ArenaStats::new(),
                ArenaStats::new(),
                ArenaStats::new(),
            ],
        }
    }

    /// An arena with [`ArenaConfig::new`] defaults, usable in `static`s.
    pub const fn with_defaults() -> Self {
        Self {
            config: ArenaConfig::new(),
            live_bytes: AtomicUsize::new(0),
            stats: [
                ArenaStats::new(),
                ArenaStats::new(),
                ArenaStats::new(),
                ArenaStats::new(),
            ],
        }
    }

    /// The arena's configuration.
    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    /// Counters for one policy.
    pub fn stats(&self, policy: AllocationPolicy) -> StatsSnapshot {
        self.stats[policy.index()].snapshot()
    }

    /// Live bytes across all policies.
    pub fn live_bytes(&self) -> usize {
        self.live_bytes.load(Ordering::Acquire)
    }

    /// The layout actually requested from the allocator for `policy`.
    fn effective_layout(
        &self,
        layout: Layout,
        policy: AllocationPolicy,
    ) -> Result<Layout, AllocError> {
        let align = layout.align().max(self.config.min_alignment(policy));
        Layout::from_size_align(layout.size(), align).map_err(|_| AllocError::LayoutOverflow {
            count: layout.size(),
            elem_size: 1,
        })
    }

    fn charge(&self, bytes: usize, policy: AllocationPolicy) -> Result<(), AllocError> {
        let max = self.config.max_bytes;
        self.live_bytes
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |live| {
                let available = max.saturating_sub(live);
                (bytes <= available).then(|| live + bytes)
            })
            .map(|_| ())
            .map_err(|live| {
                let available = max.saturating_sub(live);
                warn!(
                    "lanevec: {policy} allocation of {bytes} bytes refused, {available} bytes left in budget"
                );
                AllocError::CapacityExceeded {
                    requested: bytes,
                    available,
                    policy,
                }
            })
    }

    fn refund(&self, bytes: usize) {
        self.live_bytes.fetch_sub(bytes, Ordering::AcqRel);
    }
}

impl Default for SystemArena {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[allow(unsafe_code)]
impl MemoryArena for SystemArena {
    fn allocate(&self, layout: Layout, policy: AllocationPolicy) -> Result<NonNull<u8>, AllocError> {
        let layout = self.effective_layout(layout, policy)?;
        let bytes = layout.size();
        if bytes == 0 {
            return Ok(raw::dangling(layout));
        }

        self.charge(bytes, policy)?;
        let Some(ptr) = raw::alloc(layout) else {
            self.refund(bytes);
            return Err(AllocError::OutOfMemory { bytes, policy });
        };
        self.stats[policy.index()].record_alloc(bytes);
        trace!(
            "lanevec: allocated {bytes} bytes ({policy}, align {}) at {:p}",
            layout.align(),
            ptr
        );
        Ok(ptr)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout, policy: AllocationPolicy) {
        // The layout was accepted by `allocate`, so adjusting it again
        // yields the same value.
        let Ok(layout) = self.effective_layout(layout, policy) else {
            return;
        };
        let bytes = layout.size();
        if bytes == 0 {
            return;
        }

        if !self.stats[policy.index()].record_dealloc(bytes) {
            warn!("lanevec: {bytes}-byte release at {ptr:p} matches no live {policy} allocation");
        }
        self.refund(bytes);
        trace!("lanevec: released {bytes} bytes ({policy}) at {ptr:p}");
        // SAFETY: caller guarantees ptr came from `allocate` with this
        // layout and policy; `effective_layout` is deterministic, so this
        // is the exact layout handed to `raw::alloc`.
        unsafe { raw::dealloc(ptr, layout) }
    }
}

#[cfg(test)]
#[allow(unsafe_code)]
mod tests {
    use super::*;

    fn alloc_release(arena: &SystemArena, bytes: usize, align: usize, policy: AllocationPolicy) {
        let layout = Layout::from_size_align(bytes, align).unwrap();
        let ptr = arena.allocate(layout, policy).unwrap();
        // SAFETY: same arena, layout and policy.
        unsafe { arena.deallocate(ptr, layout, policy) };
    }

    #[test]
    fn allocation_is_accounted_per_policy() {
        let arena = SystemArena::new(ArenaConfig::new());
        let layout = Layout::array::<u64>(16).unwrap();
        let ptr = arena.allocate(layout, AllocationPolicy::PinnedMem).unwrap();

        let pinned = arena.stats(AllocationPolicy::PinnedMem);
        assert_eq!(pinned.live_bytes, 128);
        assert_eq!(pinned.live_allocations, 1);
        assert_eq!(arena.stats(AllocationPolicy::HostMem), StatsSnapshot::default());

        // SAFETY: same arena, layout and policy.
        unsafe { arena.deallocate(ptr, layout, AllocationPolicy::PinnedMem) };
        let pinned = arena.stats(AllocationPolicy::PinnedMem);
        assert_eq!(pinned.live_bytes, 0);
        assert_eq!(pinned.live_allocations, 0);
        assert_eq!(pinned.total_allocations, 1);
        assert_eq!(arena.live_bytes(), 0);
    }

    #[test]
    fn policy_alignment_is_applied() {
        let arena = SystemArena::new(ArenaConfig::new());
        let layout = Layout::array::<u8>(10).unwrap();
        for policy in AllocationPolicy::ALL {
            let ptr = arena.allocate(layout, policy).unwrap();
            let align = arena.config().min_alignment(policy);
            assert_eq!(ptr.as_ptr() as usize % align, 0, "{policy}");
            // SAFETY: same arena, layout and policy.
            unsafe { arena.deallocate(ptr, layout, policy) };
        }
    }

    #[test]
    fn budget_refuses_oversized_requests() {
        let arena = SystemArena::new(ArenaConfig::new().with_max_bytes(1024));
        let layout = Layout::array::<u8>(2048).unwrap();
        let err = arena.allocate(layout, AllocationPolicy::DeviceMem).unwrap_err();
        assert_eq!(
            err,
            AllocError::CapacityExceeded {
                requested: 2048,
                available: 1024,
                policy: AllocationPolicy::DeviceMem,
            }
        );
        assert_eq!(arena.live_bytes(), 0);
    }

    #[test]
    fn budget_is_shared_across_policies() {
        let arena = SystemArena::new(ArenaConfig::new().with_max_bytes(1024));
        let layout = Layout::array::<u8>(768).unwrap();
        let ptr = arena.allocate(layout, AllocationPolicy::HostMem).unwrap();
        let err = arena.allocate(layout, AllocationPolicy::ManagedMem).unwrap_err();
        assert!(matches!(err, AllocError::CapacityExceeded { available: 256, .. }));

        // SAFETY: same arena, layout and policy.
        unsafe { arena.deallocate(ptr, layout, AllocationPolicy::HostMem) };
        alloc_release(&arena, 768, 1, AllocationPolicy::ManagedMem);
    }

    #[test]
    fn zero_sized_requests_skip_accounting() {
        let arena = SystemArena::new(ArenaConfig::new().with_max_bytes(0));
        alloc_release(&arena, 0, 8, AllocationPolicy::HostMem);
        assert_eq!(arena.stats(AllocationPolicy::HostMem).total_allocations, 0);
    }

    #[test]
    fn over_release_is_reported_not_wrapped() {
        let stats = ArenaStats::new();
        stats.record_alloc(64);
        assert!(!stats.record_dealloc(128));
        // The byte counter refused to underflow; the allocation count did not.
        let snap = stats.snapshot();
        assert_eq!(snap.live_bytes, 64);
        assert_eq!(snap.live_allocations, 0);
    }

    #[test]
    fn global_arena_is_shared() {
        assert!(std::ptr::eq(global(), global()));
        assert_eq!(global().config(), &ArenaConfig::new());
    }

    #[test]
    #[should_panic(expected = "invalid ArenaConfig")]
    fn new_rejects_invalid_config() {
        SystemArena::new(ArenaConfig {
            device_alignment: 3,
            ..ArenaConfig::new()
        });
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn budget_is_never_exceeded(
                sizes in proptest::collection::vec(1usize..512, 1..32),
                budget in 0usize..4096,
            ) {
                let arena = SystemArena::new(ArenaConfig::new().with_max_bytes(budget));
                let mut held = Vec::new();
                let mut expected = 0;
                for (i, &size) in sizes.iter().enumerate() {
                    let policy = AllocationPolicy::ALL[i % 4];
                    let layout = Layout::array::<u8>(size).unwrap();
                    match arena.allocate(layout, policy) {
                        Ok(ptr) => {
                            expected += size;
                            held.push((ptr, layout, policy));
                        }
                        Err(err) => {
                            prop_assert!(expected + size > budget);
                            let is_budget = matches!(err, AllocError::CapacityExceeded { .. });
                            prop_assert!(is_budget);
                        }
                    }
                    prop_assert!(arena.live_bytes() <= budget);
                    prop_assert_eq!(arena.live_bytes(), expected);
                }
                for (ptr, layout, policy) in held {
                    // SAFETY: same arena, layout and policy, released once.
                    unsafe { arena.deallocate(ptr, layout, policy) };
                }
                prop_assert_eq!(arena.live_bytes(), 0);
                for policy in AllocationPolicy::ALL {
                    prop_assert_eq!(arena.stats(policy).live_bytes, 0);
                }
            }
        }
    }
}
