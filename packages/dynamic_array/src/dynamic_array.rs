use std::any::type_name;
use std::convert::Infallible;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::mem::{self, ManuallyDrop};
use std::ops::{Deref, DerefMut, Index, IndexMut};
use std::ptr;
use std::slice::{self, SliceIndex};

use crate::{AllocError, RawBuffer, construct};

/// A growable array of `T` stored contiguously in a [`RawBuffer`].
///
/// The first `len()` slots of the buffer hold live items, the rest of the capacity is
/// uninitialized. The array only ever exposes the live range.
///
/// # Growth
///
/// When an insertion finds the buffer full, the array allocates a new buffer with twice the
/// capacity (at least 1) and relocates its items there. Relocation is a move, which cannot fail,
/// so existing items are never cloned during growth. [`reserve()`][Self::reserve] grows to exactly
/// the requested capacity. Shrinking the length never releases memory.
///
/// # Panic safety
///
/// A panic (or an `Err` from a fallible constructor) raised by item code leaves the array valid,
/// with nothing leaked and nothing dropped twice. In addition:
///
/// * Growth, insertion and copy construction are all-or-nothing: if constructing the new item
///   fails, the array is exactly as it was before the call.
/// * [`clone_from()`][Clone::clone_from] into an array with enough capacity reuses existing items
///   via element-wise `clone_from()`. A panic part way through leaves a valid array whose items
///   may be partially updated.
///
/// # Examples
///
/// ```
/// use dynamic_array::DynamicArray;
///
/// let mut array = DynamicArray::new();
/// array.push_back(1);
/// array.push_back(2);
/// array.push_back(3);
/// assert_eq!(array, [1, 2, 3]);
///
/// array.erase(1);
/// assert_eq!(array, [1, 3]);
///
/// array.insert(0, 0);
/// assert_eq!(array, [0, 1, 3]);
/// ```
///
/// # Thread safety
///
/// The array is [`Send`] and [`Sync`] exactly when `T` is. It performs no synchronization of its
/// own: mutation requires `&mut` access as usual.
pub struct DynamicArray<T> {
    buffer: RawBuffer<T>,

    /// Number of live items, stored contiguously from the start of the buffer.
    len: usize,
}

impl<T> DynamicArray<T> {
    /// Creates an empty array. Does not allocate.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            buffer: RawBuffer::new(),
            len: 0,
        }
    }

    /// Creates an empty array with room for exactly `capacity` items.
    ///
    /// # Panics
    ///
    /// Panics if the capacity cannot be represented as a memory layout.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: RawBuffer::with_capacity(capacity),
            len: 0,
        }
    }

    /// Creates an array of `len` default-valued items, with capacity exactly `len`.
    ///
    /// # Examples
    ///
    /// ```
    /// use dynamic_array::DynamicArray;
    ///
    /// let array = DynamicArray::<u32>::with_len(3);
    /// assert_eq!(array, [0, 0, 0]);
    /// assert_eq!(array.capacity(), 3);
    /// ```
    #[must_use]
    pub fn with_len(len: usize) -> Self
    where
        T: Default,
    {
        Self::with_len_with(len, |_| T::default())
    }

    /// Creates an array of `len` items produced by `make(index)`, with capacity exactly `len`.
    ///
    /// If `make` panics, the items produced so far are dropped and the memory is released.
    #[must_use]
    pub fn with_len_with(len: usize, make: impl FnMut(usize) -> T) -> Self {
        let mut buffer = RawBuffer::with_capacity(len);

        // SAFETY: The buffer was just allocated with `len` uninitialized slots.
        unsafe {
            construct::construct_each(buffer.as_mut_ptr(), len, make);
        }

        Self { buffer, len }
    }

    /// Number of live items.
    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether there are no live items.
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of items the array can hold without reallocating.
    #[must_use]
    #[inline]
    pub fn capacity(&self) -> usize {
        self.buffer.capacity()
    }

    /// The live items as a slice.
    #[must_use]
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        // SAFETY: The first `len` slots hold live items and the pointer is aligned and non-null
        // even for an empty buffer.
        unsafe { slice::from_raw_parts(self.buffer.as_ptr(), self.len) }
    }

    /// The live items as a mutable slice.
    #[must_use]
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        // SAFETY: See `as_slice()`. We hold `&mut self`, so the slice is exclusive.
        unsafe { slice::from_raw_parts_mut(self.buffer.as_mut_ptr(), self.len) }
    }

    /// Pointer to the first item. Dangling (but aligned) if the array owns no memory.
    #[must_use]
    #[inline]
    pub fn as_ptr(&self) -> *const T {
        self.buffer.as_ptr()
    }

    /// Exchanges the contents of two arrays. Never allocates, never fails.
    #[inline]
    pub fn swap(&mut self, other: &mut Self) {
        self.buffer.swap(&mut other.buffer);
        mem::swap(&mut self.len, &mut other.len);
    }

    /// Ensures the capacity is at least `capacity`.
    ///
    /// Does nothing if the capacity is already sufficient. Otherwise allocates a buffer of exactly
    /// `capacity` items and moves the existing items into it. Existing items keep their values
    /// and order, only their addresses change.
    ///
    /// # Panics
    ///
    /// Panics if the capacity cannot be represented as a memory layout.
    pub fn reserve(&mut self, capacity: usize) {
        if capacity <= self.capacity() {
            return;
        }

        self.reallocate(RawBuffer::with_capacity(capacity));
    }

    /// Ensures the capacity is at least `capacity`, reporting allocation failure to the caller.
    ///
    /// On failure, the array is unchanged.
    ///
    /// # Errors
    ///
    /// Returns an [`AllocError`] if the new buffer could not be allocated.
    ///
    /// # Examples
    ///
    /// ```
    /// use dynamic_array::{AllocError, DynamicArray};
    ///
    /// let mut array = DynamicArray::<u64>::new();
    ///
    /// assert!(array.try_reserve(16).is_ok());
    /// assert_eq!(array.capacity(), 16);
    ///
    /// let error = array.try_reserve(usize::MAX).unwrap_err();
    /// assert!(matches!(error, AllocError::CapacityOverflow { .. }));
    /// assert_eq!(array.capacity(), 16);
    /// ```
    pub fn try_reserve(&mut self, capacity: usize) -> Result<(), AllocError> {
        if capacity <= self.capacity() {
            return Ok(());
        }

        self.reallocate(RawBuffer::try_with_capacity(capacity)?);
        Ok(())
    }

    /// Moves every live item into `new_buffer`, which becomes the array's storage.
    fn reallocate(&mut self, mut new_buffer: RawBuffer<T>) {
        #[cfg(debug_assertions)]
        self.integrity_check();

        debug_assert!(new_buffer.capacity() >= self.len);

        // SAFETY: The first `len` slots of the current buffer are live, the new buffer has at
        // least `len` uninitialized slots and the two are separate allocations.
        unsafe {
            construct::relocate(self.buffer.as_ptr(), new_buffer.as_mut_ptr(), self.len);
        }

        // The items now live in `new_buffer`. The old slots are logically uninitialized, so
        // dropping the old buffer only releases its memory.
        self.buffer.swap(&mut new_buffer);
    }

    /// Sets the length to `len`, dropping trailing items or appending default-valued ones.
    ///
    /// Shrinking never releases memory. Growing reserves exactly `len` if the capacity is
    /// insufficient.
    pub fn resize(&mut self, len: usize)
    where
        T: Default,
    {
        self.resize_with(len, T::default);
    }

    /// Sets the length to `len`, dropping trailing items or appending items produced by `make`.
    ///
    /// If `make` panics, the items it produced so far are dropped and the length is unchanged.
    pub fn resize_with(&mut self, len: usize, mut make: impl FnMut() -> T) {
        if len <= self.len {
            self.truncate(len);
            return;
        }

        self.reserve(len);

        let additional = len
            .checked_sub(self.len)
            .expect("guarded by len > self.len above");

        // SAFETY: We reserved capacity for `len` items, so the `additional` slots after the live
        // range are uninitialized and in bounds.
        unsafe {
            construct::construct_each(self.buffer.ptr_at(self.len), additional, |_| make());
        }

        self.len = len;
    }

    /// Drops the items at `[len, self.len())`. Does nothing if `len >= self.len()`.
    pub fn truncate(&mut self, len: usize) {
        let Some(excess) = self.len.checked_sub(len).filter(|excess| *excess > 0) else {
            return;
        };

        let tail = ptr::slice_from_raw_parts_mut(self.buffer.ptr_at(len), excess);

        // The length goes down first, so a panicking destructor cannot lead to a double drop.
        self.len = len;

        // SAFETY: These slots held live items that are no longer part of the live range.
        unsafe {
            ptr::drop_in_place(tail);
        }
    }

    /// Drops all items. Keeps the capacity.
    pub fn clear(&mut self) {
        self.truncate(0);
    }

    /// Appends `value` and returns a reference to it.
    pub fn push_back(&mut self, value: T) -> &mut T {
        self.emplace_back(|| value)
    }

    /// Appends the item produced by `make` and returns a reference to it.
    ///
    /// Amortized constant time. If `make` panics, the array is unchanged.
    pub fn emplace_back(&mut self, make: impl FnOnce() -> T) -> &mut T {
        let end = self.len;
        self.emplace(end, make)
    }

    /// Appends the item produced by `make` if it succeeds.
    ///
    /// # Errors
    ///
    /// Returns the error from `make` unchanged, in which case the array is unchanged.
    pub fn try_emplace_back<E>(
        &mut self,
        make: impl FnOnce() -> Result<T, E>,
    ) -> Result<&mut T, E> {
        let end = self.len;
        self.try_emplace(end, make)
    }

    /// Inserts `value` at `index`, shifting the items at `[index, len)` one slot to the right.
    ///
    /// # Panics
    ///
    /// Panics if `index > len`.
    pub fn insert(&mut self, index: usize, value: T) -> &mut T {
        self.emplace(index, || value)
    }

    /// Inserts the item produced by `make` at `index`, shifting the items at `[index, len)` one
    /// slot to the right, and returns a reference to the new item.
    ///
    /// If `make` panics, the array is unchanged.
    ///
    /// # Panics
    ///
    /// Panics if `index > len`.
    pub fn emplace(&mut self, index: usize, make: impl FnOnce() -> T) -> &mut T {
        let Ok(item) = self.try_emplace(index, || Ok::<T, Infallible>(make()));
        item
    }

    /// Inserts the item produced by `make` at `index` if it succeeds, shifting the items at
    /// `[index, len)` one slot to the right.
    ///
    /// # Errors
    ///
    /// Returns the error from `make` unchanged, in which case the array is unchanged.
    ///
    /// # Panics
    ///
    /// Panics if `index > len`.
    ///
    /// # Examples
    ///
    /// ```
    /// use dynamic_array::DynamicArray;
    ///
    /// let mut array = DynamicArray::from([1, 3]);
    ///
    /// array.try_emplace(1, || "2".parse::<i32>()).unwrap();
    /// assert_eq!(array, [1, 2, 3]);
    ///
    /// assert!(array.try_emplace(0, || "zero".parse::<i32>()).is_err());
    /// assert_eq!(array, [1, 2, 3]);
    /// ```
    pub fn try_emplace<E>(
        &mut self,
        index: usize,
        make: impl FnOnce() -> Result<T, E>,
    ) -> Result<&mut T, E> {
        assert!(
            index <= self.len,
            "insertion index {index} is out of bounds in DynamicArray of {} with length {}",
            type_name::<T>(),
            self.len
        );

        #[cfg(debug_assertions)]
        self.integrity_check();

        if self.len < self.capacity() {
            self.emplace_within_capacity(index, make)
        } else {
            self.emplace_reallocating(index, make)
        }
    }

    fn emplace_within_capacity<E>(
        &mut self,
        index: usize,
        make: impl FnOnce() -> Result<T, E>,
    ) -> Result<&mut T, E> {
        // The new item exists before any existing item is touched, so a failing constructor
        // leaves the array as it was.
        let value = make()?;

        let slot = self.buffer.ptr_at(index);
        let trailing = self.len.checked_sub(index).expect("guarded by index <= len");

        // SAFETY: `len < capacity`, so there is an uninitialized slot right after the live range
        // for the last item to shift into. `ptr::copy` permits the overlap. After the shift, the
        // slot at `index` is logically uninitialized and receives the new item.
        unsafe {
            ptr::copy(slot, slot.add(1), trailing);
            slot.write(value);
        }

        self.len = self.len.checked_add(1).expect("guarded by len < capacity");

        // SAFETY: The slot holds the live item we just wrote and we hold `&mut self`.
        Ok(unsafe { &mut *slot })
    }

    fn emplace_reallocating<E>(
        &mut self,
        index: usize,
        make: impl FnOnce() -> Result<T, E>,
    ) -> Result<&mut T, E> {
        let mut new_buffer: RawBuffer<T> =
            RawBuffer::with_capacity(Self::grown_capacity(self.len));

        // The new item goes straight to its final slot in the detached buffer. If construction
        // fails, dropping `new_buffer` only releases memory and the array is untouched.
        let value = make()?;

        // SAFETY: The new capacity exceeds `len`, so `index <= len` is an uninitialized slot.
        unsafe {
            new_buffer.ptr_at(index).write(value);
        }

        let trailing = self.len.checked_sub(index).expect("guarded by index <= len");
        let after_new_item = index.checked_add(1).expect("guarded by index <= len < capacity");

        // SAFETY: The prefix `[0, index)` and the suffix `[index, len)` of the current buffer are
        // live. They land on either side of the new item, in slots that are uninitialized and in
        // bounds of the larger new buffer. Relocation cannot fail, so nothing past this point
        // needs to be rolled back.
        unsafe {
            construct::relocate(self.buffer.as_ptr(), new_buffer.as_mut_ptr(), index);
        }

        // SAFETY: See above.
        unsafe {
            construct::relocate(
                self.buffer.ptr_at(index),
                new_buffer.ptr_at(after_new_item),
                trailing,
            );
        }

        // Every item now lives in `new_buffer`. The old buffer only has memory left to release.
        self.buffer.swap(&mut new_buffer);
        self.len = self.len.checked_add(1).expect("guarded by len < new capacity");

        // SAFETY: The slot holds the new item and we hold `&mut self`.
        Ok(unsafe { &mut *self.buffer.ptr_at(index) })
    }

    /// Capacity to use when an insertion finds the buffer full.
    fn grown_capacity(len: usize) -> usize {
        assert!(
            len < usize::MAX,
            "capacity overflow in DynamicArray of {}",
            type_name::<T>()
        );

        len.saturating_mul(2).max(1)
    }

    /// Removes and returns the last item, or `None` if the array is empty.
    ///
    /// Never releases memory.
    pub fn pop_back(&mut self) -> Option<T> {
        let last = self.len.checked_sub(1)?;
        self.len = last;

        // SAFETY: The slot held the last live item and is no longer part of the live range, so
        // ownership moves to the caller.
        Some(unsafe { self.buffer.ptr_at(last).read() })
    }

    /// Drops the item at `index`, shifting the items after it one slot to the left.
    ///
    /// Returns the index of the item that followed the erased one, which is `index` itself (and
    /// equal to the new length if the erased item was the last).
    ///
    /// # Panics
    ///
    /// Panics if `index >= len`.
    pub fn erase(&mut self, index: usize) -> usize {
        // The array is consistent again before the removed item's destructor runs.
        drop(self.remove(index));
        index
    }

    /// Removes the item at `index` and returns it, shifting the items after it one slot to the
    /// left.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len`.
    pub fn remove(&mut self, index: usize) -> T {
        assert!(
            index < self.len,
            "removal index {index} is out of bounds in DynamicArray of {} with length {}",
            type_name::<T>(),
            self.len
        );

        #[cfg(debug_assertions)]
        self.integrity_check();

        let last = self.len.checked_sub(1).expect("guarded by index < len");
        let trailing = last.checked_sub(index).expect("guarded by index < len");
        let slot = self.buffer.ptr_at(index);

        // SAFETY: The slot at `index` is live and we take ownership of its item, after which the
        // slot is logically uninitialized and the `trailing` live items after it shift down to
        // close the gap. `ptr::copy` permits the overlap.
        let value = unsafe {
            let value = slot.read();
            ptr::copy(slot.add(1), slot, trailing);
            value
        };

        self.len = last;
        value
    }

    /// Splits the array into its buffer and length without dropping any items.
    pub(crate) fn into_raw_parts(self) -> (RawBuffer<T>, usize) {
        let mut array = ManuallyDrop::new(self);
        (mem::take(&mut array.buffer), array.len)
    }

    #[cfg_attr(test, mutants::skip)] // This is essentially test logic, mutation is meaningless.
    #[cfg(debug_assertions)]
    fn integrity_check(&self) {
        assert!(
            self.len <= self.buffer.capacity(),
            "length {} exceeds capacity {} in DynamicArray of {}",
            self.len,
            self.buffer.capacity(),
            type_name::<T>()
        );
    }
}

impl<T> Drop for DynamicArray<T> {
    fn drop(&mut self) {
        // SAFETY: The live range holds live items that nobody else owns. The buffer releases the
        // memory afterwards when it is dropped as a field.
        unsafe {
            ptr::drop_in_place(self.as_mut_slice());
        }
    }
}

impl<T: Clone> Clone for DynamicArray<T> {
    /// Clones into a new array with capacity exactly `self.len()`.
    ///
    /// If an item clone panics, the clones made so far are dropped and the memory is released.
    fn clone(&self) -> Self {
        let mut buffer = RawBuffer::with_capacity(self.len);

        // SAFETY: The fresh buffer has `len` uninitialized slots and is a separate allocation.
        unsafe {
            construct::clone_into(self.as_slice(), buffer.as_mut_ptr());
        }

        Self {
            buffer,
            len: self.len,
        }
    }

    /// Makes `self` a copy of `source`, reusing the existing allocation when it is large enough.
    ///
    /// If `source` does not fit in the current capacity, a complete copy is built first and only
    /// then swapped in, so a panicking clone leaves `self` untouched. Otherwise the shared prefix
    /// is updated in place via element-wise `clone_from()`, surplus items are dropped and missing
    /// ones are cloned into the spare capacity. A panic on that path leaves `self` valid, with a
    /// possibly partially updated prefix.
    fn clone_from(&mut self, source: &Self) {
        if source.len > self.capacity() {
            let mut copy = source.clone();
            self.swap(&mut copy);
            return;
        }

        for (target, item) in self.as_mut_slice().iter_mut().zip(source.as_slice()) {
            target.clone_from(item);
        }

        if self.len >= source.len {
            self.truncate(source.len);
            return;
        }

        let missing = source
            .as_slice()
            .get(self.len..)
            .expect("guarded by self.len < source.len");

        // SAFETY: `source.len <= capacity`, so the slots after the live range are uninitialized
        // and in bounds for every missing item.
        unsafe {
            construct::clone_into(missing, self.buffer.ptr_at(self.len));
        }

        self.len = source.len;
    }
}

impl<T> Default for DynamicArray<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Deref for DynamicArray<T> {
    type Target = [T];

    #[inline]
    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T> DerefMut for DynamicArray<T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<T, I: SliceIndex<[T]>> Index<I> for DynamicArray<T> {
    type Output = I::Output;

    #[inline]
    fn index(&self, index: I) -> &Self::Output {
        Index::index(self.as_slice(), index)
    }
}

impl<T, I: SliceIndex<[T]>> IndexMut<I> for DynamicArray<T> {
    #[inline]
    fn index_mut(&mut self, index: I) -> &mut Self::Output {
        IndexMut::index_mut(self.as_mut_slice(), index)
    }
}

impl<T: fmt::Debug> fmt::Debug for DynamicArray<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.as_slice()).finish()
    }
}

impl<T: PartialEq> PartialEq for DynamicArray<T> {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T: Eq> Eq for DynamicArray<T> {}

impl<T: PartialEq<U>, U, const N: usize> PartialEq<[U; N]> for DynamicArray<T> {
    fn eq(&self, other: &[U; N]) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T: PartialEq<U>, U> PartialEq<[U]> for DynamicArray<T> {
    fn eq(&self, other: &[U]) -> bool {
        self.as_slice() == other
    }
}

impl<T: Hash> Hash for DynamicArray<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_slice().hash(state);
    }
}

impl<T> Extend<T> for DynamicArray<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        let iter = iter.into_iter();

        let (lower_bound, _) = iter.size_hint();
        let required = self.len.saturating_add(lower_bound);

        if required > self.capacity() {
            self.reserve(required.max(Self::grown_capacity(self.len)));
        }

        for item in iter {
            self.push_back(item);
        }
    }
}

impl<'a, T: Clone + 'a> Extend<&'a T> for DynamicArray<T> {
    fn extend<I: IntoIterator<Item = &'a T>>(&mut self, iter: I) {
        Extend::<T>::extend(self, iter.into_iter().cloned());
    }
}

impl<T> FromIterator<T> for DynamicArray<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut array = Self::new();
        array.extend(iter);
        array
    }
}

impl<T, const N: usize> From<[T; N]> for DynamicArray<T> {
    fn from(items: [T; N]) -> Self {
        items.into_iter().collect()
    }
}

impl<'a, T> IntoIterator for &'a DynamicArray<T> {
    type Item = &'a T;
    type IntoIter = slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.as_slice().iter()
    }
}

impl<'a, T> IntoIterator for &'a mut DynamicArray<T> {
    type Item = &'a mut T;
    type IntoIter = slice::IterMut<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.as_mut_slice().iter_mut()
    }
}

#[cfg(test)]
#[allow(
    clippy::arithmetic_side_effects,
    clippy::indexing_slicing,
    clippy::cast_possible_truncation,
    clippy::redundant_clone,
    reason = "tests focus on succinct code and do not need to tick all the boxes"
)]
mod tests {
    use std::cell::Cell;
    use std::fmt::Debug;
    use std::hash::{BuildHasher, RandomState};
    use std::panic::{self, AssertUnwindSafe};
    use std::rc::Rc;

    use static_assertions::{assert_impl_all, assert_not_impl_any};

    use super::*;
    use crate::probe::{self, Probe, ProbeError};

    assert_impl_all!(DynamicArray<u32>: Send, Sync, Debug, Default, Clone);
    assert_not_impl_any!(DynamicArray<Cell<u32>>: Sync);
    assert_not_impl_any!(DynamicArray<Rc<u32>>: Send);

    fn probes(values: &[u32]) -> DynamicArray<Probe> {
        values.iter().map(|value| Probe::new(*value)).collect()
    }

    /// Snapshot of everything observable about an array, for strong-guarantee checks.
    fn snapshot(array: &DynamicArray<Probe>) -> (usize, usize, *const Probe, Vec<u32>) {
        (
            array.len(),
            array.capacity(),
            array.as_ptr(),
            probe::values(array),
        )
    }

    #[test]
    fn smoke_test() {
        let mut array = DynamicArray::new();

        array.push_back(1);
        array.push_back(2);
        array.push_back(3);
        assert_eq!(array.len(), 3);
        assert_eq!(array, [1, 2, 3]);

        assert_eq!(array.erase(1), 1);
        assert_eq!(array, [1, 3]);
        assert_eq!(array.len(), 2);

        array.insert(0, 0);
        assert_eq!(array, [0, 1, 3]);
        assert_eq!(array.len(), 3);
    }

    #[test]
    fn new_does_not_allocate() {
        let array = DynamicArray::<String>::new();

        assert_eq!(array.len(), 0);
        assert_eq!(array.capacity(), 0);
        assert!(array.is_empty());
        assert!(array.iter().next().is_none());
    }

    #[test]
    fn with_len_value_constructs_exactly() {
        probe::reset();

        let array = DynamicArray::<Probe>::with_len(4);

        assert_eq!(array.len(), 4);
        assert_eq!(array.capacity(), 4);
        assert_eq!(probe::values(&array), [0, 0, 0, 0]);
        assert_eq!(probe::counters().constructions, 4);
    }

    #[test]
    fn with_len_with_rolls_back_on_panic() {
        probe::reset();
        probe::fail_on_construction(3);

        let result = panic::catch_unwind(|| {
            DynamicArray::with_len_with(5, |index| Probe::new(index as u32))
        });

        assert!(result.is_err());
        assert_eq!(probe::counters().live, 0);
    }

    #[test]
    fn with_capacity_is_exact_and_empty() {
        let array = DynamicArray::<u8>::with_capacity(10);

        assert_eq!(array.capacity(), 10);
        assert!(array.is_empty());
    }

    #[test]
    fn push_back_doubles_capacity() {
        let mut array = DynamicArray::new();
        let mut capacities = Vec::new();

        for value in 0..9 {
            array.push_back(value);
            capacities.push(array.capacity());
        }

        assert_eq!(capacities, [1, 2, 4, 4, 8, 8, 8, 8, 16]);
    }

    #[test]
    fn push_back_returns_new_item() {
        let mut array = DynamicArray::from([1, 2]);

        *array.push_back(3) += 10;

        assert_eq!(array, [1, 2, 13]);
    }

    #[test]
    fn growth_moves_and_never_clones() {
        probe::reset();

        let mut array = DynamicArray::new();
        for value in 0..100 {
            array.push_back(Probe::new(value));
        }

        let counters = probe::counters();
        assert_eq!(counters.clones, 0);
        assert_eq!(counters.drops, 0);
        assert_eq!(counters.live, 100);

        array.reserve(1000);

        let counters = probe::counters();
        assert_eq!(counters.clones, 0);
        assert_eq!(counters.drops, 0);
        assert_eq!(probe::values(&array), (0..100).collect::<Vec<_>>());
    }

    #[test]
    fn growth_works_for_move_only_items() {
        struct MoveOnly(Box<u32>);

        let mut array = DynamicArray::new();
        for value in 0..10 {
            array.push_back(MoveOnly(Box::new(value)));
        }
        array.insert(5, MoveOnly(Box::new(99)));
        array.reserve(64);

        let values: Vec<u32> = array.iter().map(|item| *item.0).collect();
        assert_eq!(values, [0, 1, 2, 3, 4, 99, 5, 6, 7, 8, 9]);
    }

    #[test]
    fn reserve_within_capacity_changes_nothing() {
        let mut array = DynamicArray::with_capacity(8);
        array.push_back(1);
        array.push_back(2);
        let ptr = array.as_ptr();

        array.reserve(8);
        array.reserve(3);
        array.reserve(0);

        assert_eq!(array.capacity(), 8);
        assert_eq!(array.as_ptr(), ptr);
        assert_eq!(array, [1, 2]);
    }

    #[test]
    fn reserve_beyond_capacity_is_exact() {
        let mut array = DynamicArray::from([1, 2, 3]);

        array.reserve(11);

        assert_eq!(array.capacity(), 11);
        assert_eq!(array, [1, 2, 3]);
    }

    #[test]
    fn try_reserve_overflow_leaves_array_unchanged() {
        let mut array = DynamicArray::from([1_u64, 2]);
        let ptr = array.as_ptr();

        let result = array.try_reserve(usize::MAX);

        assert!(matches!(result, Err(AllocError::CapacityOverflow { .. })));
        assert_eq!(array.capacity(), 2);
        assert_eq!(array.as_ptr(), ptr);
        assert_eq!(array, [1, 2]);
    }

    #[test]
    fn resize_down_keeps_capacity() {
        probe::reset();

        let mut array = probes(&[1, 2, 3, 4]);
        let capacity = array.capacity();

        array.resize(1);

        assert_eq!(probe::values(&array), [1]);
        assert_eq!(array.capacity(), capacity);
        assert_eq!(probe::counters().live, 1);
    }

    #[test]
    fn resize_up_default_constructs_tail() {
        let mut array = DynamicArray::from([7_u32]);

        array.resize(4);

        assert_eq!(array, [7, 0, 0, 0]);
        assert_eq!(array.capacity(), 4);
    }

    #[test]
    fn resize_with_panic_keeps_length() {
        probe::reset();

        let mut array = probes(&[1, 2]);
        probe::fail_on_construction(2);

        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            array.resize_with(5, || Probe::new(9));
        }));

        assert!(result.is_err());
        assert_eq!(probe::values(&array), [1, 2]);
        assert_eq!(probe::counters().live, 2);
    }

    #[test]
    fn truncate_and_clear_drop_items() {
        probe::reset();

        let mut array = probes(&[1, 2, 3]);

        array.truncate(5);
        assert_eq!(array.len(), 3);

        array.truncate(2);
        assert_eq!(probe::counters().live, 2);

        array.clear();
        assert!(array.is_empty());
        assert_eq!(probe::counters().live, 0);
        assert!(array.capacity() >= 3);
    }

    #[test]
    fn truncate_survives_panicking_destructor() {
        thread_local! {
            static DROPS: Cell<usize> = const { Cell::new(0) };
        }

        struct Bomb(bool);

        impl Drop for Bomb {
            fn drop(&mut self) {
                DROPS.with(|drops| drops.set(drops.get() + 1));
                assert!(!self.0, "bomb went off");
            }
        }

        let mut array = DynamicArray::new();
        array.push_back(Bomb(false));
        array.push_back(Bomb(true));
        array.push_back(Bomb(false));

        let result = panic::catch_unwind(AssertUnwindSafe(|| array.truncate(1)));

        assert!(result.is_err());
        assert_eq!(array.len(), 1);
        // The remaining items of the tail are still dropped after the panic.
        assert_eq!(DROPS.with(Cell::get), 2);
    }

    #[test]
    fn pop_back_returns_items_in_reverse() {
        let mut array = DynamicArray::from([1, 2, 3]);
        let capacity = array.capacity();

        assert_eq!(array.pop_back(), Some(3));
        assert_eq!(array.pop_back(), Some(2));
        assert_eq!(array.pop_back(), Some(1));
        assert_eq!(array.pop_back(), None);
        assert_eq!(array.capacity(), capacity);
    }

    #[test]
    fn erase_shifts_tail_left() {
        probe::reset();

        let mut array = probes(&[0, 1, 2, 3, 4]);

        assert_eq!(array.erase(0), 0);
        assert_eq!(probe::values(&array), [1, 2, 3, 4]);

        assert_eq!(array.erase(3), 3);
        assert_eq!(probe::values(&array), [1, 2, 3]);

        assert_eq!(array.erase(1), 1);
        assert_eq!(probe::values(&array), [1, 3]);

        let counters = probe::counters();
        assert_eq!(counters.drops, 3);
        assert_eq!(counters.live, 2);
        assert_eq!(counters.clones, 0);
    }

    #[test]
    #[should_panic]
    fn erase_out_of_bounds_panics() {
        let mut array = DynamicArray::from([1, 2]);

        array.erase(2);
    }

    #[test]
    #[should_panic]
    fn erase_from_empty_panics() {
        let mut array = DynamicArray::<u32>::new();

        array.erase(0);
    }

    #[test]
    fn remove_returns_item() {
        let mut array = DynamicArray::from(["a".to_string(), "b".to_string(), "c".to_string()]);

        assert_eq!(array.remove(1), "b");
        assert_eq!(array, ["a", "c"]);
    }

    #[test]
    fn erase_survives_panicking_destructor() {
        struct Bomb(u32);

        impl Drop for Bomb {
            fn drop(&mut self) {
                assert!(self.0 != 1, "bomb went off");
            }
        }

        let mut array = DynamicArray::new();
        for value in 0..4 {
            array.push_back(Bomb(value));
        }

        let result = panic::catch_unwind(AssertUnwindSafe(|| array.erase(1)));

        assert!(result.is_err());
        let values: Vec<u32> = array.iter().map(|bomb| bomb.0).collect();
        assert_eq!(values, [0, 2, 3]);
    }

    #[test]
    fn emplace_within_capacity_shifts_right() {
        let mut array = DynamicArray::with_capacity(8);
        array.extend([1, 2, 4, 5]);
        let ptr = array.as_ptr();

        let inserted = array.emplace(2, || 3);
        assert_eq!(*inserted, 3);

        assert_eq!(array, [1, 2, 3, 4, 5]);
        assert_eq!(array.as_ptr(), ptr);
    }

    #[test]
    fn emplace_reallocating_places_item_between_prefix_and_suffix() {
        let mut array = DynamicArray::from([1, 2, 4, 5]);
        assert_eq!(array.capacity(), 4);

        array.emplace(2, || 3);

        assert_eq!(array, [1, 2, 3, 4, 5]);
        assert_eq!(array.capacity(), 8);
    }

    #[test]
    fn emplace_at_both_ends() {
        let mut array = DynamicArray::new();

        array.emplace(0, || 2);
        array.emplace(0, || 1);
        array.emplace(2, || 3);

        assert_eq!(array, [1, 2, 3]);
    }

    #[test]
    #[should_panic]
    fn emplace_past_end_panics() {
        let mut array = DynamicArray::from([1]);

        array.emplace(2, || 0);
    }

    #[test]
    fn failed_emplace_within_capacity_is_strong() {
        probe::reset();

        let mut array = DynamicArray::with_capacity(8);
        array.extend([Probe::new(1), Probe::new(2), Probe::new(3)]);
        let before = snapshot(&array);

        probe::fail_on_construction(1);
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            array.emplace(1, || Probe::new(42));
        }));

        assert!(result.is_err());
        assert_eq!(snapshot(&array), before);
        assert_eq!(probe::counters().live, 3);
    }

    #[test]
    fn failed_emplace_reallocating_is_strong() {
        probe::reset();

        let mut array = probes(&[1, 2, 3, 4]);
        assert_eq!(array.len(), array.capacity());
        let before = snapshot(&array);

        probe::fail_on_construction(1);
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            array.emplace(2, || Probe::new(42));
        }));

        assert!(result.is_err());
        assert_eq!(snapshot(&array), before);

        let counters = probe::counters();
        assert_eq!(counters.live, 4);
        assert_eq!(counters.clones, 0);
    }

    #[test]
    fn failed_try_emplace_returns_error_and_is_strong() {
        probe::reset();

        let mut array = probes(&[1, 2]);
        let before = snapshot(&array);

        probe::fail_on_construction(1);
        let result = array.try_emplace(0, || Probe::try_new(7)).map(|item| item.value());

        assert_eq!(result, Err(ProbeError));
        assert_eq!(snapshot(&array), before);

        let result = array.try_emplace_back(|| Probe::try_new(8)).map(|item| item.value());
        assert_eq!(result, Ok(8));
        assert_eq!(probe::values(&array), [1, 2, 8]);
    }

    #[test]
    fn failed_emplace_back_on_empty_is_strong() {
        probe::reset();

        let mut array = DynamicArray::<Probe>::new();

        probe::fail_on_construction(1);
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            array.emplace_back(|| Probe::new(1));
        }));

        assert!(result.is_err());
        assert_eq!(array.len(), 0);
        assert_eq!(array.capacity(), 0);
    }

    #[test]
    fn insert_then_erase_restores_sequence() {
        let original = DynamicArray::from([10, 20, 30]);

        for index in 0..=original.len() {
            let mut array = original.clone();

            array.insert(index, 99);
            assert_eq!(array[index], 99);

            array.erase(index);
            assert_eq!(array, original);
        }
    }

    #[test]
    fn clone_has_exact_capacity() {
        let mut array = DynamicArray::with_capacity(32);
        array.extend(["a".to_string(), "b".to_string()]);

        let copy = array.clone();

        assert_eq!(copy, array);
        assert_eq!(copy.capacity(), 2);
    }

    #[test]
    fn clone_panic_leaks_nothing() {
        probe::reset();

        let array = probes(&[1, 2, 3]);

        probe::fail_on_clone(3);
        let result = panic::catch_unwind(AssertUnwindSafe(|| array.clone()));

        assert!(result.is_err());
        assert_eq!(probe::counters().live, 3);
        assert_eq!(probe::values(&array), [1, 2, 3]);
    }

    #[test]
    fn clone_from_every_relative_size() {
        let cases: [(&[u32], &[u32]); 6] = [
            (&[], &[]),
            (&[], &[1, 2]),
            (&[1, 2], &[]),
            (&[1, 2, 3], &[4]),
            (&[1], &[4, 5, 6]),
            (&[1, 2], &[3, 4]),
        ];

        for (target_values, source_values) in cases {
            let mut target: DynamicArray<u32> = target_values.iter().copied().collect();
            let mut source: DynamicArray<u32> = source_values.iter().copied().collect();

            target.clone_from(&source);
            assert_eq!(target, source);

            // The copy is independent of its source.
            source.push_back(100);
            if let Some(first) = source.first_mut() {
                *first = 200;
            }
            assert_eq!(target, *source_values);
        }
    }

    #[test]
    fn clone_from_with_capacity_reuses_buffer() {
        probe::reset();

        let mut target = DynamicArray::with_capacity(8);
        target.extend([Probe::new(1), Probe::new(2)]);
        let ptr = target.as_ptr();

        let source = probes(&[5, 6, 7, 8]);
        target.clone_from(&source);

        assert_eq!(target.as_ptr(), ptr);
        assert_eq!(target.capacity(), 8);
        assert_eq!(probe::values(&target), [5, 6, 7, 8]);
        assert_eq!(probe::counters().live, 8);
    }

    #[test]
    fn clone_from_shrinking_drops_surplus() {
        probe::reset();

        let mut target = probes(&[1, 2, 3, 4]);
        let source = probes(&[9]);

        target.clone_from(&source);

        assert_eq!(probe::values(&target), [9]);
        assert_eq!(target.capacity(), 4);
        assert_eq!(probe::counters().live, 2);
    }

    #[test]
    fn clone_from_reallocating_panic_leaves_target_untouched() {
        probe::reset();

        let mut target = probes(&[1]);
        let source = probes(&[5, 6, 7]);
        let before = snapshot(&target);

        probe::fail_on_clone(2);
        let result = panic::catch_unwind(AssertUnwindSafe(|| target.clone_from(&source)));

        assert!(result.is_err());
        assert_eq!(snapshot(&target), before);
        assert_eq!(probe::counters().live, 4);
    }

    #[test]
    fn clone_from_in_place_panic_is_valid_and_leaks_nothing() {
        probe::reset();

        let mut target = DynamicArray::with_capacity(8);
        target.extend([Probe::new(1)]);
        let source = probes(&[5, 6, 7]);

        // Probe uses the default `clone_from()`, which clones. The prefix update is the first
        // clone, the tail needs two more and the last of those fails.
        probe::fail_on_clone(3);
        let result = panic::catch_unwind(AssertUnwindSafe(|| target.clone_from(&source)));

        assert!(result.is_err());
        assert_eq!(probe::values(&target), [5]);
        assert_eq!(probe::counters().live, 4);
    }

    #[test]
    fn move_leaves_source_empty() {
        let mut source = DynamicArray::from([1, 2, 3]);
        let ptr = source.as_ptr();

        let target = mem::take(&mut source);

        assert_eq!(target, [1, 2, 3]);
        assert_eq!(target.as_ptr(), ptr);
        assert!(source.is_empty());
        assert_eq!(source.capacity(), 0);
    }

    #[test]
    fn swap_exchanges_contents() {
        let mut a = DynamicArray::from([1, 2, 3]);
        let mut b = DynamicArray::with_capacity(10);
        b.push_back(9);

        a.swap(&mut b);

        assert_eq!(a, [9]);
        assert_eq!(a.capacity(), 10);
        assert_eq!(b, [1, 2, 3]);
        assert_eq!(b.capacity(), 3);
    }

    #[test]
    fn drop_drops_every_live_item_once() {
        probe::reset();

        {
            let mut array = DynamicArray::with_capacity(16);
            array.extend([Probe::new(1), Probe::new(2), Probe::new(3)]);
        }

        let counters = probe::counters();
        assert_eq!(counters.drops, 3);
        assert_eq!(counters.live, 0);
    }

    #[test]
    fn zero_sized_items() {
        let mut array = DynamicArray::new();

        for _ in 0..10 {
            array.push_back(());
        }
        array.insert(3, ());
        array.erase(0);

        assert_eq!(array.len(), 10);
        assert_eq!(array.pop_back(), Some(()));
        assert_eq!(array.len(), 9);
    }

    #[test]
    fn slice_access_covers_live_range_only() {
        let mut array = DynamicArray::with_capacity(10);
        array.extend([1, 2, 3]);

        assert_eq!(array.iter().count(), 3);
        assert_eq!(array[1..], [2, 3]);
        assert_eq!(array.get(3), None);

        for item in &mut array {
            *item *= 2;
        }
        assert_eq!(array, [2, 4, 6]);
    }

    #[test]
    #[should_panic]
    fn index_beyond_len_panics_even_within_capacity() {
        let mut array = DynamicArray::with_capacity(10);
        array.push_back(1);

        let _item = array[1];
    }

    #[test]
    fn extend_from_references_clones() {
        let mut array = DynamicArray::from(["a".to_string()]);
        let extra = ["b".to_string(), "c".to_string()];

        array.extend(&extra);

        assert_eq!(array, ["a", "b", "c"]);
    }

    #[test]
    fn repeated_extend_keeps_amortized_growth() {
        let mut array = DynamicArray::new();
        let mut reallocations = 0;

        for value in 0..1000 {
            let ptr = array.as_ptr();
            array.extend([value]);

            if array.as_ptr() != ptr {
                reallocations += 1;
            }
        }

        assert_eq!(array.len(), 1000);
        assert_eq!(array.capacity(), 1024);
        assert_eq!(reallocations, 11);
    }

    #[test]
    fn extend_with_large_batch_reserves_exactly() {
        let mut array = DynamicArray::from([1, 2]);

        array.extend(3..=10);

        assert_eq!(array.len(), 10);
        assert_eq!(array.capacity(), 10);
    }

    #[test]
    fn hash_matches_slice_hash() {
        let array = DynamicArray::from([1, 2, 3]);
        let hasher = RandomState::new();

        assert_eq!(hasher.hash_one(&array), hasher.hash_one([1, 2, 3].as_slice()));
        assert_ne!(hasher.hash_one(&array), hasher.hash_one([1, 2].as_slice()));
    }

    #[test]
    fn debug_lists_items() {
        let array = DynamicArray::from([1, 2]);

        assert_eq!(format!("{array:?}"), "[1, 2]");
    }
}
