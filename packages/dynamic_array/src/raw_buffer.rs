use std::alloc::{self, Layout};
use std::any::type_name;
use std::fmt;
use std::mem::{self, MaybeUninit};
use std::ops::{Index, IndexMut};
use std::ptr::NonNull;

use crate::AllocError;

/// Owns a block of uninitialized memory large enough for exactly `capacity` items of type `T`.
///
/// The buffer has no idea which of its slots hold live items. It never constructs or drops a
/// `T` - dropping the buffer only releases the memory. Whoever constructs items in the slots is
/// responsible for dropping them before the buffer is dropped or swapped away, otherwise those
/// items are leaked.
///
/// An empty buffer (capacity 0) owns no memory and makes no allocator calls. Neither does a
/// buffer of a zero-sized `T`, whatever its capacity.
///
/// # Examples
///
/// ```
/// use dynamic_array::RawBuffer;
///
/// let mut buffer = RawBuffer::<String>::with_capacity(2);
/// assert_eq!(buffer.capacity(), 2);
///
/// buffer[0].write("hello".to_string());
///
/// // SAFETY: We initialized slot 0 just above.
/// let value = unsafe { buffer[0].assume_init_read() };
/// assert_eq!(value, "hello");
/// ```
pub struct RawBuffer<T> {
    ptr: NonNull<T>,
    capacity: usize,
}

impl<T> RawBuffer<T> {
    /// Creates an empty buffer that owns no memory.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            ptr: NonNull::dangling(),
            capacity: 0,
        }
    }

    /// Allocates a buffer with room for exactly `capacity` items.
    ///
    /// # Panics
    ///
    /// Panics if the memory layout for `capacity` items cannot be represented. Allocator failure
    /// is reported via [`std::alloc::handle_alloc_error`].
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        match Self::try_with_capacity(capacity) {
            Ok(buffer) => buffer,
            Err(AllocError::CapacityOverflow { requested, .. }) => panic!(
                "capacity overflow: cannot allocate a buffer of {requested} items of {}",
                type_name::<T>()
            ),
            Err(AllocError::AllocationFailed { layout }) => alloc::handle_alloc_error(layout),
        }
    }

    /// Allocates a buffer with room for exactly `capacity` items, reporting failure to the
    /// caller instead of panicking.
    ///
    /// # Errors
    ///
    /// Returns [`AllocError::CapacityOverflow`] if the memory layout for `capacity` items cannot
    /// be represented and [`AllocError::AllocationFailed`] if the allocator returns no memory.
    pub fn try_with_capacity(capacity: usize) -> Result<Self, AllocError> {
        if capacity == 0 {
            return Ok(Self::new());
        }

        let layout = Self::layout(capacity)?;

        if layout.size() == 0 {
            // Zero-sized items occupy no memory, so any number of them fit behind a dangling
            // (but well-aligned) pointer.
            return Ok(Self {
                ptr: NonNull::dangling(),
                capacity,
            });
        }

        // SAFETY: The layout has a non-zero size, checked above.
        let raw = unsafe { alloc::alloc(layout) };

        let ptr = NonNull::new(raw.cast::<T>()).ok_or(AllocError::AllocationFailed { layout })?;

        Ok(Self { ptr, capacity })
    }

    fn layout(capacity: usize) -> Result<Layout, AllocError> {
        Layout::array::<T>(capacity).map_err(|source| AllocError::CapacityOverflow {
            requested: capacity,
            source,
        })
    }

    /// The number of items the buffer has room for.
    #[must_use]
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Pointer to the first slot. Dangling (but aligned) if the buffer owns no memory.
    #[must_use]
    #[inline]
    pub fn as_ptr(&self) -> *const T {
        self.ptr.as_ptr()
    }

    /// Mutable pointer to the first slot. Dangling (but aligned) if the buffer owns no memory.
    #[must_use]
    #[inline]
    pub fn as_mut_ptr(&mut self) -> *mut T {
        self.ptr.as_ptr()
    }

    /// Pointer to the slot at `offset`.
    ///
    /// `offset == capacity` is permitted and yields the one-past-the-end pointer, which may be
    /// used for address arithmetic and comparisons but must never be dereferenced.
    ///
    /// # Panics
    ///
    /// Panics if `offset` is greater than the capacity.
    #[must_use]
    #[inline]
    pub fn ptr_at(&self, offset: usize) -> *mut T {
        assert!(
            offset <= self.capacity,
            "offset {offset} is beyond the capacity {} of a buffer of {}",
            self.capacity,
            type_name::<T>()
        );

        // SAFETY: The offset is at most one past the end of the allocation (guarded above), which
        // is a valid pointer to compute. For an empty buffer or zero-sized items the byte offset
        // is zero, which is valid for a dangling pointer.
        unsafe { self.ptr.as_ptr().add(offset) }
    }

    /// Exchanges the memory owned by `self` and `other`. Never allocates.
    #[inline]
    pub fn swap(&mut self, other: &mut Self) {
        mem::swap(&mut self.ptr, &mut other.ptr);
        mem::swap(&mut self.capacity, &mut other.capacity);
    }

    fn assert_in_bounds(&self, index: usize) {
        assert!(
            index < self.capacity,
            "slot {index} index out of bounds in buffer of {} with capacity {}",
            type_name::<T>(),
            self.capacity
        );
    }
}

impl<T> Default for RawBuffer<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Indexing yields the raw slot. The buffer cannot know whether the slot holds a live item, so
/// it is exposed as [`MaybeUninit<T>`] and the caller decides when it may be assumed initialized.
impl<T> Index<usize> for RawBuffer<T> {
    type Output = MaybeUninit<T>;

    fn index(&self, index: usize) -> &Self::Output {
        self.assert_in_bounds(index);

        let slot = self.ptr_at(index).cast::<MaybeUninit<T>>();

        // SAFETY: The slot is in bounds (asserted above) and `MaybeUninit<T>` has the layout of
        // `T` while making no claim about initialization, so any slot is a valid referent.
        unsafe { &*slot }
    }
}

impl<T> IndexMut<usize> for RawBuffer<T> {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        self.assert_in_bounds(index);

        let slot = self.ptr_at(index).cast::<MaybeUninit<T>>();

        // SAFETY: See `index()`. We hold `&mut self`, so the reference is exclusive.
        unsafe { &mut *slot }
    }
}

impl<T> Drop for RawBuffer<T> {
    fn drop(&mut self) {
        if self.capacity == 0 || size_of::<T>() == 0 {
            return;
        }

        let layout =
            Self::layout(self.capacity).expect("layout was calculable when the buffer was allocated");

        // SAFETY: The memory was allocated in `try_with_capacity()` with this same layout.
        unsafe {
            alloc::dealloc(self.ptr.as_ptr().cast(), layout);
        }
    }
}

impl<T> fmt::Debug for RawBuffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawBuffer")
            .field("ptr", &self.ptr)
            .field("capacity", &self.capacity)
            .finish()
    }
}

// SAFETY: The buffer exclusively owns its memory. Moving it to another thread is fine as long as
// the items that may be stored in it can move between threads.
unsafe impl<T: Send> Send for RawBuffer<T> {}

// SAFETY: Shared access only hands out shared references to slots, so it is as thread-safe as `T`.
unsafe impl<T: Sync> Sync for RawBuffer<T> {}

#[cfg(test)]
#[allow(
    clippy::undocumented_unsafe_blocks,
    clippy::multiple_unsafe_ops_per_block,
    clippy::indexing_slicing,
    reason = "tests focus on succinct code and do not need to tick all the boxes"
)]
mod tests {
    use std::cell::Cell;
    use std::fmt::Debug;

    use static_assertions::{assert_impl_all, assert_not_impl_any};

    use super::*;

    assert_impl_all!(RawBuffer<u32>: Send, Sync, Debug, Default);
    assert_not_impl_any!(RawBuffer<u32>: Clone, Copy);
    assert_not_impl_any!(RawBuffer<Cell<u32>>: Sync);

    #[test]
    fn new_is_empty() {
        let buffer = RawBuffer::<u64>::new();

        assert_eq!(buffer.capacity(), 0);
        assert_eq!(buffer.as_ptr(), NonNull::<u64>::dangling().as_ptr().cast_const());
    }

    #[test]
    fn zero_capacity_owns_no_memory() {
        let buffer = RawBuffer::<u64>::with_capacity(0);

        assert_eq!(buffer.capacity(), 0);
        assert_eq!(buffer.as_ptr(), NonNull::<u64>::dangling().as_ptr().cast_const());
    }

    #[test]
    fn with_capacity_is_exact() {
        let buffer = RawBuffer::<String>::with_capacity(7);

        assert_eq!(buffer.capacity(), 7);
        assert_ne!(buffer.as_ptr(), NonNull::<String>::dangling().as_ptr().cast_const());
    }

    #[test]
    fn zero_sized_items_never_allocate() {
        let buffer = RawBuffer::<()>::with_capacity(1_000_000);

        assert_eq!(buffer.capacity(), 1_000_000);
        assert_eq!(buffer.as_ptr(), NonNull::<()>::dangling().as_ptr().cast_const());
    }

    #[test]
    fn try_with_capacity_reports_overflow() {
        let result = RawBuffer::<u64>::try_with_capacity(usize::MAX);

        assert!(matches!(
            result,
            Err(AllocError::CapacityOverflow {
                requested: usize::MAX,
                ..
            })
        ));
    }

    #[test]
    #[should_panic]
    fn with_capacity_panics_on_overflow() {
        let _buffer = RawBuffer::<u64>::with_capacity(usize::MAX);
    }

    #[test]
    fn ptr_at_allows_one_past_end() {
        let buffer = RawBuffer::<u32>::with_capacity(4);

        let end = buffer.ptr_at(4);

        assert_eq!(end, buffer.as_ptr().wrapping_add(4).cast_mut());
    }

    #[test]
    #[should_panic]
    fn ptr_at_beyond_end_panics() {
        let buffer = RawBuffer::<u32>::with_capacity(4);

        let _ptr = buffer.ptr_at(5);
    }

    #[test]
    fn slots_round_trip_values() {
        let mut buffer = RawBuffer::<String>::with_capacity(3);

        buffer[0].write("a".to_string());
        buffer[2].write("c".to_string());

        unsafe {
            assert_eq!(buffer[0].assume_init_ref(), "a");
            assert_eq!(buffer[2].assume_init_ref(), "c");

            // The buffer never drops items, so we must.
            buffer[0].assume_init_drop();
            buffer[2].assume_init_drop();
        }
    }

    #[test]
    #[should_panic]
    fn index_at_capacity_panics() {
        let buffer = RawBuffer::<u32>::with_capacity(2);

        let _slot = &buffer[2];
    }

    #[test]
    #[should_panic]
    fn index_into_empty_panics() {
        let mut buffer = RawBuffer::<u32>::new();

        buffer[0].write(1);
    }

    #[test]
    fn swap_exchanges_storage() {
        let mut a = RawBuffer::<u32>::with_capacity(2);
        let mut b = RawBuffer::<u32>::with_capacity(5);

        a[0].write(10);
        b[0].write(20);

        let a_ptr = a.as_ptr();
        let b_ptr = b.as_ptr();

        a.swap(&mut b);

        assert_eq!(a.capacity(), 5);
        assert_eq!(b.capacity(), 2);
        assert_eq!(a.as_ptr(), b_ptr);
        assert_eq!(b.as_ptr(), a_ptr);

        unsafe {
            assert_eq!(a[0].assume_init_read(), 20);
            assert_eq!(b[0].assume_init_read(), 10);
        }
    }

    #[test]
    fn take_leaves_source_empty() {
        let mut source = RawBuffer::<u32>::with_capacity(3);
        let source_ptr = source.as_ptr();

        let taken = mem::take(&mut source);

        assert_eq!(taken.capacity(), 3);
        assert_eq!(taken.as_ptr(), source_ptr);
        assert_eq!(source.capacity(), 0);
    }

    #[test]
    fn dropping_never_drops_items() {
        thread_local! {
            static DROPS: Cell<usize> = const { Cell::new(0) };
        }

        struct Tracked;

        impl Drop for Tracked {
            fn drop(&mut self) {
                DROPS.with(|drops| drops.set(drops.get() + 1));
            }
        }

        let mut buffer = RawBuffer::<Tracked>::with_capacity(2);
        buffer[0].write(Tracked);
        buffer[1].write(Tracked);

        // Ownership of the items is taken out before the buffer goes away.
        let first = unsafe { buffer[0].assume_init_read() };
        let second = unsafe { buffer[1].assume_init_read() };

        drop(buffer);
        assert_eq!(DROPS.with(Cell::get), 0);

        drop(first);
        drop(second);
        assert_eq!(DROPS.with(Cell::get), 2);
    }

    #[test]
    fn debug_output_names_type() {
        let buffer = RawBuffer::<u8>::with_capacity(1);

        let output = format!("{buffer:?}");

        assert!(output.contains("RawBuffer"));
        assert!(output.contains("capacity: 1"));
    }
}
