//! Safe many-producer appends over atomic slot reservation.
//!
//! [`ConcurrentAppender`] exclusively borrows a [`LaneVec`] and can then
//! be shared by reference across any number of threads. No reference into
//! the buffer can exist while it is alive, and every write lands in a range
//! its caller reserved, so reserve-then-write needs no `unsafe`.

#![allow(unsafe_code)]

use lanevec_core::SlotCounter;

use crate::vector::LaneVec;

/// Lock-free appends into a borrowed [`LaneVec`] from many threads.
///
/// Created by [`LaneVec::concurrent`]. Ignores the open/closed gate, like
/// the reservation primitive it is built on.
///
/// ```
/// use lanevec_core::AllocationPolicy;
/// use lanevec_vector::LaneVec;
///
/// let mut hits: LaneVec<u32> = LaneVec::new();
/// hits.reserve(64, AllocationPolicy::HostMem).unwrap();
/// {
///     let appender = hits.concurrent();
///     std::thread::scope(|s| {
///         for lane in 0..4u32 {
///             let appender = &appender;
///             s.spawn(move || appender.extend_from_slice(&[lane; 8]));
///         }
///     });
/// }
/// assert_eq!(hits.len(), 32);
/// ```
pub struct ConcurrentAppender<'a, T, C: SlotCounter> {
    vec: &'a LaneVec<T, C>,
}

// Compile-time assertion: the appender is shareable across threads.
const _: fn() = || {
    fn assert<T: Send + Sync>() {}
    assert::<ConcurrentAppender<'static, u64, std::sync::atomic::AtomicUsize>>();
};

impl<'a, T, C: SlotCounter> ConcurrentAppender<'a, T, C> {
    pub(crate) fn new(vec: &'a mut LaneVec<T, C>) -> Self {
        Self { vec }
    }

    /// Reserve `inc` slots and return the first index. See
    /// [`LaneVec::atomic_index_inc`].
    #[inline]
    pub fn atomic_index_inc(&self, inc: usize) -> usize {
        self.vec.atomic_index_inc(inc)
    }

    /// Reserve one slot, write `value` into it and return its index.
    ///
    /// # Panics
    ///
    /// Panics if the reserved slot is past capacity. The length has
    /// already been advanced when this happens.
    pub fn push(&self, value: T) -> usize {
        let index = self.vec.atomic_index_inc(1);
        self.check_range(index, 1);
        // SAFETY: the slot is below capacity (checked) and was reserved by
        // this call alone; the exclusive borrow held by `self` rules out
        // references into the buffer.
        unsafe {
            self.vec.write_slot(index, value)
        };
        index
    }

    /// Reserve `values.len()` contiguous slots, copy `values` into them
    /// and return the first index.
    ///
    /// # Panics
    ///
    /// Panics if the reserved range extends past capacity. The length has
    /// already been advanced when this happens.
    pub fn extend_from_slice(&self, values: &[T]) -> usize
    where
        T: Copy,
    {
        let start = self.vec.atomic_index_inc(values.len());
        self.check_range(start, values.len());
        // SAFETY: [start, start + len) is below capacity (checked) and was
        // reserved by this call alone. `values` cannot alias the buffer
        // because the buffer is exclusively borrowed by `self`.
        unsafe {
            std::ptr::copy_nonoverlapping(values.as_ptr(), self.vec.slot_ptr(start), values.len())
        };
        start
    }

    /// Write `value` into slot `index` without reserving it.
    ///
    /// # Safety
    ///
    /// `index` must be below capacity and reserved by the caller through
    /// [`atomic_index_inc`](Self::atomic_index_inc), so that no other
    /// thread touches it.
    #[inline]
    pub unsafe fn write(&self, index: usize, value: T) {
        // SAFETY: forwarded caller contract.
        unsafe { self.vec.write_slot(index, value) }
    }

    /// Current length, including reservations not yet written.
    pub fn len(&self) -> usize {
        self.vec.len()
    }

    /// Whether nothing has been reserved.
    pub fn is_empty(&self) -> bool {
        self.vec.is_empty()
    }

    /// Capacity of the borrowed container.
    pub fn capacity(&self) -> usize {
        self.vec.capacity()
    }

    fn check_range(&self, start: usize, len: usize) {
        let capacity = self.vec.capacity();
        assert!(
            start.checked_add(len).is_some_and(|end| end <= capacity),
            "reserved slots {start}..{} past capacity {capacity}",
            start.saturating_add(len)
        );
    }
}
