//! The atomic fetch-and-add primitive behind slot reservation.
//!
//! [`SlotCounter`] is the only execution-context-sensitive piece of a lane
//! vector. Everything else is plain data; swapping the counter type is how
//! a target with different atomic support plugs in.

use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

/// A size counter supporting lock-free fetch-and-add.
///
/// `fetch_add` must be correct under any number of concurrent callers:
/// each call observes a distinct pre-increment value, and the values
/// observed by N calls tile `[start, start + Σinc)` with no gaps or
/// overlaps. The remaining methods are for exclusive (`&mut`) or
/// read-only access.
pub trait SlotCounter: Send + Sync {
    /// Create a counter holding `value`.
    fn new(value: usize) -> Self;

    /// Current value.
    fn load(&self) -> usize;

    /// Atomically add `inc` and return the value before the addition.
    fn fetch_add(&self, inc: usize) -> usize;

    /// Current value, read through exclusive access.
    fn get(&mut self) -> usize;

    /// Overwrite the value through exclusive access.
    fn set(&mut self, value: usize);
}

impl SlotCounter for AtomicUsize {
    fn new(value: usize) -> Self {
        AtomicUsize::new(value)
    }

    #[inline]
    fn load(&self) -> usize {
        AtomicUsize::load(self, Ordering::Acquire)
    }

    #[inline]
    fn fetch_add(&self, inc: usize) -> usize {
        AtomicUsize::fetch_add(self, inc, Ordering::AcqRel)
    }

    #[inline]
    fn get(&mut self) -> usize {
        *self.get_mut()
    }

    #[inline]
    fn set(&mut self, value: usize) {
        *self.get_mut() = value;
    }
}

/// 32-bit counter, matching the index width of device kernels.
///
/// Values beyond `u32::MAX` cannot be represented. `new` and `set` panic
/// on such values, and `fetch_add` panics instead of wrapping when the
/// sum would not fit, leaving the counter unchanged.
impl SlotCounter for AtomicU32 {
    fn new(value: usize) -> Self {
        AtomicU32::new(narrow(value))
    }

    #[inline]
    fn load(&self) -> usize {
        AtomicU32::load(self, Ordering::Acquire) as usize
    }

    #[inline]
    fn fetch_add(&self, inc: usize) -> usize {
        let inc = narrow(inc);
        match self.fetch_update(Ordering::AcqRel, Ordering::Acquire, |v| v.checked_add(inc)) {
            Ok(prev) => prev as usize,
            Err(prev) => panic!("slot counter {prev} + {inc} exceeds u32::MAX"),
        }
    }

    #[inline]
    fn get(&mut self) -> usize {
        *self.get_mut() as usize
    }

    #[inline]
    fn set(&mut self, value: usize) {
        *self.get_mut() = narrow(value);
    }
}

fn narrow(value: usize) -> u32 {
    u32::try_from(value)
        .unwrap_or_else(|_| panic!("slot counter value {value} exceeds u32::MAX"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn pre_increment_values<C: SlotCounter>(threads: usize, inc: usize) -> Vec<usize> {
        let counter = C::new(0);
        let mut starts: Vec<usize> = thread::scope(|s| {
            let handles: Vec<_> = (0..threads)
                .map(|_| s.spawn(|| counter.fetch_add(inc)))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        starts.sort_unstable();
        assert_eq!(counter.load(), threads * inc);
        starts
    }

    #[test]
    fn usize_counter_returns_previous_value() {
        let counter = <AtomicUsize as SlotCounter>::new(5);
        assert_eq!(SlotCounter::fetch_add(&counter, 3), 5);
        assert_eq!(SlotCounter::load(&counter), 8);
    }

    #[test]
    fn set_and_get_through_exclusive_access() {
        let mut counter = <AtomicU32 as SlotCounter>::new(0);
        SlotCounter::set(&mut counter, 42);
        assert_eq!(SlotCounter::get(&mut counter), 42);
    }

    #[test]
    fn concurrent_usize_reservations_tile_the_range() {
        let starts = pre_increment_values::<AtomicUsize>(16, 4);
        let expected: Vec<usize> = (0..16).map(|i| i * 4).collect();
        assert_eq!(starts, expected);
    }

    #[test]
    fn concurrent_u32_reservations_tile_the_range() {
        let starts = pre_increment_values::<AtomicU32>(8, 7);
        let expected: Vec<usize> = (0..8).map(|i| i * 7).collect();
        assert_eq!(starts, expected);
    }

    #[test]
    #[should_panic(expected = "exceeds u32::MAX")]
    fn u32_counter_refuses_to_wrap() {
        let counter = <AtomicU32 as SlotCounter>::new(u32::MAX as usize - 1);
        assert_eq!(SlotCounter::fetch_add(&counter, 1), u32::MAX as usize - 1);
        SlotCounter::fetch_add(&counter, 1);
    }

    #[test]
    fn refused_u32_reservation_leaves_counter_unchanged() {
        let counter = <AtomicU32 as SlotCounter>::new(u32::MAX as usize - 1);
        let result = std::panic::catch_unwind(|| SlotCounter::fetch_add(&counter, 5));
        assert!(result.is_err());
        assert_eq!(SlotCounter::load(&counter), u32::MAX as usize - 1);
        // The last representable slot is still handed out exactly once.
        assert_eq!(SlotCounter::fetch_add(&counter, 1), u32::MAX as usize - 1);
    }

    #[test]
    #[should_panic(expected = "exceeds u32::MAX")]
    fn u32_counter_rejects_wide_values() {
        let _ = <AtomicU32 as SlotCounter>::new(u32::MAX as usize + 1);
    }
}
