use std::fmt;
use std::iter::FusedIterator;
use std::ptr;
use std::slice;

use crate::{DynamicArray, RawBuffer};

/// An iterator that moves items out of a [`DynamicArray`], front to back.
///
/// Items not yet yielded are dropped when the iterator is dropped, after which the storage is
/// released.
///
/// # Examples
///
/// ```
/// use dynamic_array::DynamicArray;
///
/// let array = DynamicArray::from(["a".to_string(), "b".to_string()]);
///
/// let mut iter = array.into_iter();
/// assert_eq!(iter.next().as_deref(), Some("a"));
/// assert_eq!(iter.as_slice(), ["b"]);
/// ```
pub struct IntoIter<T> {
    buffer: RawBuffer<T>,

    /// Items in `[front, back)` are live and not yet yielded.
    front: usize,
    back: usize,
}

impl<T> IntoIter<T> {
    fn new(array: DynamicArray<T>) -> Self {
        let (buffer, len) = array.into_raw_parts();

        Self {
            buffer,
            front: 0,
            back: len,
        }
    }

    /// The items not yet yielded.
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        // SAFETY: The slots in `[front, back)` hold live items.
        unsafe { slice::from_raw_parts(self.buffer.ptr_at(self.front), self.remaining()) }
    }

    fn remaining(&self) -> usize {
        self.back
            .checked_sub(self.front)
            .expect("front never passes back")
    }
}

impl<T> Iterator for IntoIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        if self.front == self.back {
            return None;
        }

        let slot = self.buffer.ptr_at(self.front);
        self.front = self.front.checked_add(1).expect("guarded by front < back");

        // SAFETY: The slot held a live item and has just left the live range, so ownership moves
        // to the caller.
        Some(unsafe { slot.read() })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.remaining();
        (remaining, Some(remaining))
    }
}

impl<T> DoubleEndedIterator for IntoIter<T> {
    fn next_back(&mut self) -> Option<T> {
        if self.front == self.back {
            return None;
        }

        self.back = self.back.checked_sub(1).expect("guarded by front < back");

        // SAFETY: The slot held a live item and has just left the live range, so ownership moves
        // to the caller.
        Some(unsafe { self.buffer.ptr_at(self.back).read() })
    }
}

impl<T> ExactSizeIterator for IntoIter<T> {}

impl<T> FusedIterator for IntoIter<T> {}

impl<T> Drop for IntoIter<T> {
    fn drop(&mut self) {
        let rest = ptr::slice_from_raw_parts_mut(self.buffer.ptr_at(self.front), self.remaining());

        // Nothing remains live in the buffer even if a destructor panics.
        self.front = self.back;

        // SAFETY: These slots held the live items that were never yielded.
        unsafe {
            ptr::drop_in_place(rest);
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for IntoIter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("IntoIter").field(&self.as_slice()).finish()
    }
}

impl<T> IntoIterator for DynamicArray<T> {
    type Item = T;
    type IntoIter = IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter::new(self)
    }
}

#[cfg(test)]
mod tests {
    use std::fmt::Debug;

    use static_assertions::assert_impl_all;

    use super::*;
    use crate::probe::{self, Probe};

    assert_impl_all!(IntoIter<u32>: Send, Sync, Debug, ExactSizeIterator, DoubleEndedIterator);

    #[test]
    fn yields_items_in_order() {
        let array = DynamicArray::from([1, 2, 3]);

        let items: Vec<_> = array.into_iter().collect();

        assert_eq!(items, [1, 2, 3]);
    }

    #[test]
    fn yields_from_both_ends() {
        let mut iter = DynamicArray::from([1, 2, 3, 4]).into_iter();

        assert_eq!(iter.len(), 4);
        assert_eq!(iter.next(), Some(1));
        assert_eq!(iter.next_back(), Some(4));
        assert_eq!(iter.as_slice(), [2, 3]);
        assert_eq!(iter.next_back(), Some(3));
        assert_eq!(iter.next(), Some(2));
        assert_eq!(iter.next(), None);
        assert_eq!(iter.next_back(), None);
    }

    #[test]
    fn drop_releases_unyielded_items() {
        probe::reset();

        let array: DynamicArray<Probe> = (0..5).map(Probe::new).collect();
        let mut iter = array.into_iter();

        let first = iter.next().expect("five items were inserted");
        assert_eq!(first.value(), 0);
        drop(iter);

        let counters = probe::counters();
        assert_eq!(counters.drops, 4);
        assert_eq!(counters.live, 1);

        drop(first);
        assert_eq!(probe::counters().live, 0);
    }

    #[test]
    fn empty_array_yields_nothing() {
        let mut iter = DynamicArray::<String>::new().into_iter();

        assert_eq!(iter.size_hint(), (0, Some(0)));
        assert!(iter.next().is_none());
    }

    #[test]
    fn debug_shows_remaining_items() {
        let mut iter = DynamicArray::from([1, 2]).into_iter();
        iter.next();

        assert_eq!(format!("{iter:?}"), "IntoIter([2])");
    }
}
