//! The lane vector: a policy-backed, allocate-once container.
//!
//! [`LaneVec`] owns one buffer from one
//! [`MemoryArena`](lanevec_core::MemoryArena), allocated exactly
//! once (at construction, or later through [`reserve`](LaneVec::reserve)
//! or [`resize`](LaneVec::resize)). Its logical length lives in a
//! [`SlotCounter`], which makes two kinds of appends possible:
//!
//! - **Build phase** ([`open`](LaneVec::open) … [`close`](LaneVec::close)):
//!   a single writer calls [`push`](LaneVec::push) through `&mut self`.
//! - **Concurrent reservation**: any number of threads call
//!   [`atomic_index_inc`](LaneVec::atomic_index_inc) through `&self` to
//!   claim disjoint index ranges, then fill them. The safe way to do this
//!   is [`LaneVec::concurrent`]; the raw slot API is for callers that
//!   partition indices themselves.
//!
//! # Capacity and length
//!
//! `len <= capacity` holds unless callers reserve more slots than remain,
//! which the reservation primitive does not check. Slice views clamp to
//! capacity, and indexing panics at or beyond capacity, so over-committing
//! never lets safe code touch memory outside the buffer.

use std::fmt;
use std::ops::{Index, IndexMut};
use std::sync::atomic::AtomicUsize;

use lanevec_core::{AllocError, AllocationPolicy, Label, MemoryTracker, SlotCounter, TrackedRegion};
use log::debug;

use crate::appender::ConcurrentAppender;
use crate::buffer::Buffer;
use crate::config::StorageConfig;

/// A fixed-capacity vector backed by a policy-selected memory arena.
///
/// `T` must be plain data (`Copy`): buffers may be shared with device code
/// and truncation only moves the logical length. Every slot up to
/// `capacity` is always initialized (with `T::default()` unless a fill
/// value is given), so any index below capacity can be read.
///
/// `C` is the size counter; [`AtomicUsize`] by default, or any other
/// [`SlotCounter`] such as `AtomicU32` for 32-bit kernel indices.
pub struct LaneVec<T, C = AtomicUsize> {
    buffer: Buffer<T>,
    len: C,
    is_open: bool,
    label: Label,
    /// Whether `buffer` is currently registered with `tracker`.
    tracking: bool,
    tracker: &'static dyn MemoryTracker,
}

impl<T: Copy + Default, C: SlotCounter> LaneVec<T, C> {
    /// An empty, unallocated container using the default storage config.
    pub fn new() -> Self {
        Self::unallocated(StorageConfig::default())
    }

    /// An empty, unallocated container bound to `config`'s arena, tracker
    /// and label. Storage is allocated later by `reserve` or `resize`.
    pub fn unallocated(config: StorageConfig) -> Self {
        Self {
            buffer: Buffer::unallocated(config.policy, config.arena),
            len: C::new(0),
            is_open: false,
            label: config.label,
            tracking: false,
            tracker: config.tracker,
        }
    }

    /// Allocate `len` default-initialized elements; `len() == capacity() == len`.
    pub fn with_len(len: usize, config: StorageConfig) -> Result<Self, AllocError> {
        Self::filled(len, T::default(), config)
    }

    /// Allocate `len` elements, every one set to `value`.
    pub fn filled(len: usize, value: T, config: StorageConfig) -> Result<Self, AllocError> {
        let mut vec = Self::unallocated(config);
        vec.allocate(len, len, value, config.policy)?;
        Ok(vec)
    }

    /// Allocate `capacity` slots without advancing the length.
    ///
    /// This is the usual way to prepare a container for building with
    /// [`push`](Self::push) or concurrent reservation.
    ///
    /// # Panics
    ///
    /// Panics if the container is already allocated.
    pub fn reserve(&mut self, capacity: usize, policy: AllocationPolicy) -> Result<(), AllocError> {
        self.assert_unallocated("reserve");
        let len = self.len.get();
        self.allocate(capacity, len, T::default(), policy)
    }

    /// Allocate `len` default-initialized slots and set the length to `len`.
    ///
    /// # Panics
    ///
    /// Panics if the container is already allocated.
    pub fn resize(&mut self, len: usize, policy: AllocationPolicy) -> Result<(), AllocError> {
        self.resize_with_value(len, T::default(), policy)
    }

    /// Allocate `len` slots set to `value` and set the length to `len`.
    ///
    /// # Panics
    ///
    /// Panics if the container is already allocated.
    pub fn resize_with_value(
        &mut self,
        len: usize,
        value: T,
        policy: AllocationPolicy,
    ) -> Result<(), AllocError> {
        self.assert_unallocated("resize");
        self.allocate(len, len, value, policy)
    }

    fn assert_unallocated(&self, op: &str) {
        assert!(
            !self.buffer.is_allocated(),
            "{op} on a LaneVec that is already allocated (capacity {})",
            self.buffer.capacity()
        );
    }

    fn allocate(
        &mut self,
        capacity: usize,
        len: usize,
        fill: T,
        policy: AllocationPolicy,
    ) -> Result<(), AllocError> {
        let buffer = Buffer::allocate(capacity, &[], fill, policy, self.buffer.arena())?;
        debug!(
            "lanevec: allocated {capacity} x {} bytes ({policy}) for '{}'",
            size_of::<T>(),
            self.label
        );
        self.delete_label();
        self.buffer = buffer;
        self.len.set(len);
        self.apply_label();
        Ok(())
    }

    /// Deep copy: a fresh buffer of the same capacity, policy and arena,
    /// holding a copy of the live elements.
    ///
    /// Slots past the live length are default-initialized in the copy.
    pub fn try_clone(&self) -> Result<Self, AllocError> {
        let buffer = Buffer::allocate(
            self.buffer.capacity(),
            self.as_slice(),
            T::default(),
            self.buffer.policy(),
            self.buffer.arena(),
        )?;
        let mut copy = Self {
            buffer,
            len: C::new(self.len.load()),
            is_open: self.is_open,
            label: self.label,
            tracking: false,
            tracker: self.tracker,
        };
        copy.apply_label();
        Ok(copy)
    }

    /// Copy-and-swap assignment: `self` becomes a deep copy of `source`.
    ///
    /// The copy is built first; if that fails, `self` is left untouched.
    pub fn try_clone_from(&mut self, source: &Self) -> Result<(), AllocError> {
        let mut temp = source.try_clone()?;
        self.swap(&mut temp);
        Ok(())
    }

    /// Exchange the entire state of two containers, tracking included.
    pub fn swap(&mut self, other: &mut Self) {
        std::mem::swap(self, other);
    }

    /// Replace the tracking label.
    ///
    /// Deregisters the current buffer, then registers it again under the
    /// new label if it is non-empty and the container is allocated.
    pub fn set_label(&mut self, label: &str) {
        self.delete_label();
        self.label = Label::new(label);
        self.apply_label();
    }

    fn apply_label(&mut self) {
        if self.buffer.bytes() > 0 && !self.label.is_empty() {
            self.tracker.track(&TrackedRegion {
                address: self.buffer.address(),
                label: self.label,
                bytes: self.buffer.bytes(),
                policy: self.buffer.policy(),
            });
            self.tracking = true;
        }
    }

    fn delete_label(&mut self) {
        if self.tracking {
            self.tracker.untrack(self.buffer.address());
            self.tracking = false;
        }
    }

    /// Enter the build phase: [`push`](Self::push) is allowed.
    pub fn open(&mut self) {
        self.is_open = true;
    }

    /// Seal the container: [`push`](Self::push) panics until reopened.
    pub fn close(&mut self) {
        self.is_open = false;
    }

    /// Whether the container is in its build phase.
    pub fn is_open(&self) -> bool {
        self.is_open
    }

    /// Append one element. Single writer only.
    ///
    /// # Panics
    ///
    /// Panics if the container is closed or full.
    pub fn push(&mut self, value: T) {
        assert!(self.is_open, "push on a closed LaneVec");
        let len = self.len.get();
        *self.buffer.get_mut(len) = value;
        self.len.set(len + 1);
    }

    /// Copy `list` to the end of the container. Single writer only.
    ///
    /// # Panics
    ///
    /// Panics unless `len() + list.len() < capacity()`. The comparison is
    /// strict: a list that would fill the buffer exactly is rejected.
    pub fn append_list(&mut self, list: &[T]) {
        let len = self.len.get();
        let capacity = self.buffer.capacity();
        assert!(
            len.saturating_add(list.len()) < capacity,
            "append_list of {} elements does not fit: len {len}, capacity {capacity}",
            list.len()
        );
        let end = len + list.len();
        self.buffer.prefix_mut(end)[len..].copy_from_slice(list);
        self.len.set(end);
    }

    /// Drop the last element from the logical length.
    ///
    /// # Panics
    ///
    /// Panics if the container is empty.
    pub fn pop_back(&mut self) {
        let len = self.len.get();
        assert!(len > 0, "pop_back on an empty LaneVec");
        self.len.set(len - 1);
    }

    /// Set the logical length to `new_end`. Slots at or past `new_end`
    /// keep their contents but are no longer part of the live range.
    ///
    /// # Panics
    ///
    /// Panics if `new_end > capacity()`.
    pub fn erase_end(&mut self, new_end: usize) {
        let capacity = self.buffer.capacity();
        assert!(
            new_end <= capacity,
            "erase_end to {new_end} past capacity {capacity}"
        );
        self.len.set(new_end);
    }

    /// Set the logical length to zero. Storage is kept for reuse.
    pub fn clear(&mut self) {
        self.len.set(0);
    }

    /// The last live element.
    ///
    /// # Panics
    ///
    /// Panics if the container is empty.
    pub fn back(&self) -> &T {
        let len = self.len();
        assert!(len > 0, "back on an empty LaneVec");
        self.buffer.get(len - 1)
    }

    /// The last live element, mutably.
    ///
    /// # Panics
    ///
    /// Panics if the container is empty.
    pub fn back_mut(&mut self) -> &mut T {
        let len = self.len.get();
        assert!(len > 0, "back_mut on an empty LaneVec");
        self.buffer.get_mut(len - 1)
    }
}

impl<T, C: SlotCounter> LaneVec<T, C> {
    /// Atomically advance the length by `inc` and return the previous
    /// length: the first index of a freshly reserved `[start, start + inc)`.
    ///
    /// Safe to call from any number of threads at once. Ranges returned
    /// to different callers never overlap and together tile
    /// `[old_len, old_len + Σinc)`. No element is written and capacity is
    /// not checked: callers must keep `Σinc <= capacity - old_len`.
    #[inline]
    pub fn atomic_index_inc(&self, inc: usize) -> usize {
        self.len.fetch_add(inc)
    }

    /// Borrow the container for concurrent appends from many threads.
    pub fn concurrent(&mut self) -> ConcurrentAppender<'_, T, C> {
        ConcurrentAppender::new(self)
    }

    /// Raw pointer to slot `index`, for lanes writing into a range they
    /// reserved. Dereferencing it is only valid for `index < capacity()`.
    pub fn slot_ptr(&self, index: usize) -> *mut T {
        self.buffer.slot_ptr(index)
    }

    /// Write `value` into slot `index` through a shared reference.
    ///
    /// # Safety
    ///
    /// `index` must be below `capacity()`, and no other thread may read or
    /// write slot `index` concurrently (for example, because the caller
    /// reserved it with [`atomic_index_inc`](Self::atomic_index_inc)), and
    /// no reference to the slot obtained through indexing may be live.
    #[allow(unsafe_code)]
    #[inline]
    pub unsafe fn write_slot(&self, index: usize, value: T) {
        debug_assert!(index < self.buffer.capacity());
        // SAFETY: in bounds and exclusively owned by the caller per the
        // function contract.
        unsafe { self.buffer.slot_ptr(index).write(value) }
    }

    /// Reference to slot `index` without a bounds check.
    ///
    /// # Safety
    ///
    /// `index` must be below `capacity()`.
    #[allow(unsafe_code)]
    #[inline]
    pub unsafe fn get_unchecked(&self, index: usize) -> &T {
        // SAFETY: in bounds per contract; every slot is initialized.
        unsafe { &*self.buffer.slot_ptr(index) }
    }

    /// Mutable reference to slot `index` without a bounds check.
    ///
    /// # Safety
    ///
    /// `index` must be below `capacity()`.
    #[allow(unsafe_code)]
    #[inline]
    pub unsafe fn get_unchecked_mut(&mut self, index: usize) -> &mut T {
        // SAFETY: in bounds per contract; `&mut self` rules out aliases.
        unsafe { &mut *self.buffer.slot_ptr(index) }
    }

    /// Number of live elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.len.load()
    }

    /// Whether there are no live elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of slots in the buffer; zero until allocated.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.buffer.capacity()
    }

    /// Whether storage has been allocated.
    pub fn is_allocated(&self) -> bool {
        self.buffer.is_allocated()
    }

    /// The arena backing the storage.
    pub fn policy(&self) -> AllocationPolicy {
        self.buffer.policy()
    }

    /// The tracking label.
    pub fn label(&self) -> &str {
        self.label.as_str()
    }

    /// Size of the buffer in bytes.
    pub fn memory_bytes(&self) -> usize {
        self.buffer.bytes()
    }

    /// The live elements, clamped to capacity.
    pub fn as_slice(&self) -> &[T] {
        self.buffer.prefix(self.len.load())
    }

    /// The live elements, mutably, clamped to capacity.
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        let len = self.len.get();
        self.buffer.prefix_mut(len)
    }

    /// Iterate over the live elements.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.as_slice().iter()
    }
}

impl<T: Copy + Default, C: SlotCounter> Default for LaneVec<T, C> {
    fn default() -> Self {
        Self::new()
    }
}

/// Panics if the arena cannot satisfy the copy: allocation failure is
/// not recoverable here. Use [`LaneVec::try_clone`] to handle it.
impl<T: Copy + Default, C: SlotCounter> Clone for LaneVec<T, C> {
    fn clone(&self) -> Self {
        self.try_clone()
            .unwrap_or_else(|err| panic!("LaneVec clone failed: {err}"))
    }

    fn clone_from(&mut self, source: &Self) {
        let mut temp = source.clone();
        self.swap(&mut temp);
    }
}

impl<T, C> Drop for LaneVec<T, C> {
    fn drop(&mut self) {
        if self.tracking {
            self.tracker.untrack(self.buffer.address());
        }
    }
}

/// Indexes any slot below capacity, live or not.
///
/// # Panics
///
/// Panics if `index >= capacity()`.
impl<T, C> Index<usize> for LaneVec<T, C> {
    type Output = T;

    #[inline]
    fn index(&self, index: usize) -> &T {
        self.buffer.get(index)
    }
}

impl<T, C> IndexMut<usize> for LaneVec<T, C> {
    #[inline]
    fn index_mut(&mut self, index: usize) -> &mut T {
        self.buffer.get_mut(index)
    }
}

impl<'a, T, C: SlotCounter> IntoIterator for &'a LaneVec<T, C> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T: PartialEq, C: SlotCounter> PartialEq for LaneVec<T, C> {
    /// Compares live elements only.
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T: fmt::Debug, C: SlotCounter> fmt::Debug for LaneVec<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LaneVec")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .field("policy", &self.policy())
            .field("is_open", &self.is_open)
            .field("label", &self.label)
            .field("data", &self.as_slice())
            .finish()
    }
}
