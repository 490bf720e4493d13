//! Low-level primitives over the global allocator.
//!
//! The two functions here are the only calls into the global allocator. Both
//! treat zero-sized layouts specially: no memory is requested, and a
//! dangling pointer carrying the layout's alignment stands in for it.

#![allow(unsafe_code)]

use std::alloc::{self, Layout};
use std::ptr::{self, NonNull};

/// A dangling, non-null pointer aligned for `layout`.
pub(crate) fn dangling(layout: Layout) -> NonNull<u8> {
    NonNull::new(ptr::without_provenance_mut::<u8>(layout.align())).unwrap_or(NonNull::dangling())
}

/// Allocate uninitialized memory for `layout`.
///
/// Returns `None` if the global allocator reports exhaustion.
pub(crate) fn alloc(layout: Layout) -> Option<NonNull<u8>> {
    if layout.size() == 0 {
        return Some(dangling(layout));
    }
    // SAFETY: layout has non-zero size, checked above.
    NonNull::new(unsafe { alloc::alloc(layout) })
}

/// Release memory obtained from [`alloc`].
///
/// # Safety
///
/// `ptr` must come from `alloc(layout)` with the same `layout` and must
/// not have been released already.
pub(crate) unsafe fn dealloc(ptr: NonNull<u8>, layout: Layout) {
    if layout.size() == 0 {
        return;
    }
    // SAFETY: forwarded caller contract; non-zero layouts were obtained
    // from the global allocator with this exact layout.
    unsafe { alloc::dealloc(ptr.as_ptr(), layout) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_sized_alloc_is_aligned_and_dangling() {
        let layout = Layout::from_size_align(0, 64).unwrap();
        let ptr = alloc(layout).unwrap();
        assert_eq!(ptr.as_ptr() as usize % 64, 0);
        // SAFETY: obtained from alloc with the same layout.
        unsafe { dealloc(ptr, layout) };
    }

    #[test]
    fn alloc_honours_alignment() {
        let layout = Layout::from_size_align(100, 4096).unwrap();
        let ptr = alloc(layout).unwrap();
        assert_eq!(ptr.as_ptr() as usize % 4096, 0);
        // SAFETY: obtained from alloc with the same layout.
        unsafe { dealloc(ptr, layout) };
    }
}
