//! Element lifecycle primitives that operate on uninitialized slots.
//!
//! Carrying existing items into new storage is always a relocation: a Rust move is a bitwise
//! copy that cannot fail, so it is the right choice for every item type and is decided at compile
//! time. Cloning is reserved for operations that are copies by nature. Construction of several
//! items is staged: if producing an item panics, the items already constructed by that stage are
//! dropped before the panic continues, leaving every slot uninitialized again.

use std::ptr;

use scopeguard::ScopeGuard;

/// Moves `count` live items from `src` into the uninitialized slots starting at `dst`.
///
/// No item code runs and nothing can fail. Afterwards the source slots must be treated as
/// uninitialized: the items now live only at `dst`.
///
/// # Safety
///
/// `src` must point to `count` live items and `dst` to `count` writable uninitialized slots. The
/// two ranges must not overlap.
pub(crate) unsafe fn relocate<T>(src: *const T, dst: *mut T, count: usize) {
    // SAFETY: Forwarding the caller's guarantees.
    unsafe {
        ptr::copy_nonoverlapping(src, dst, count);
    }
}

/// Constructs `count` items in the uninitialized slots starting at `dst`, taking each value from
/// `make(index)` in ascending index order.
///
/// If `make` panics, the items constructed so far are dropped before the panic continues.
///
/// # Safety
///
/// `dst` must point to `count` writable uninitialized slots.
pub(crate) unsafe fn construct_each<T>(
    dst: *mut T,
    count: usize,
    mut make: impl FnMut(usize) -> T,
) {
    let mut constructed = scopeguard::guard(0_usize, move |constructed| {
        // SAFETY: Exactly `constructed` slots starting at `dst` hold live items, all created by
        // this function, and nobody else knows about them yet.
        unsafe {
            ptr::drop_in_place(ptr::slice_from_raw_parts_mut(dst, constructed));
        }
    });

    for index in 0..count {
        let value = make(index);

        // SAFETY: `index < count` and the caller guarantees `count` writable slots.
        unsafe {
            dst.add(index).write(value);
        }

        *constructed = index
            .checked_add(1)
            .expect("guarded by index < count <= usize::MAX");
    }

    // Every slot is filled, ownership passes to the caller.
    ScopeGuard::into_inner(constructed);
}

/// Clones every item of `src` into the uninitialized slots starting at `dst`, preserving order.
///
/// If a clone panics, the clones made so far are dropped before the panic continues. `src` is
/// never modified.
///
/// # Safety
///
/// `dst` must point to `src.len()` writable uninitialized slots that do not overlap `src`.
pub(crate) unsafe fn clone_into<T: Clone>(src: &[T], dst: *mut T) {
    let mut items = src.iter();

    // SAFETY: Forwarding the caller's guarantees.
    unsafe {
        construct_each(dst, src.len(), |_| {
            items
                .next()
                .expect("exactly one source item per destination slot")
                .clone()
        });
    }
}

#[cfg(test)]
#[allow(
    clippy::undocumented_unsafe_blocks,
    clippy::multiple_unsafe_ops_per_block,
    clippy::indexing_slicing,
    clippy::cast_possible_truncation,
    reason = "tests focus on succinct code and do not need to tick all the boxes"
)]
mod tests {
    use std::panic::{self, AssertUnwindSafe};

    use super::*;
    use crate::RawBuffer;
    use crate::probe::{self, Probe};

    #[test]
    fn relocate_moves_without_cloning_or_dropping() {
        probe::reset();

        let mut src = RawBuffer::<Probe>::with_capacity(3);
        let mut dst = RawBuffer::<Probe>::with_capacity(3);

        unsafe { construct_each(src.as_mut_ptr(), 3, |index| Probe::new(index as u32)) };
        unsafe { relocate(src.as_ptr(), dst.as_mut_ptr(), 3) };

        let counters = probe::counters();
        assert_eq!(counters.clones, 0);
        assert_eq!(counters.drops, 0);
        assert_eq!(counters.live, 3);

        let moved = unsafe { &*ptr::slice_from_raw_parts(dst.as_ptr(), 3) };
        assert_eq!(probe::values(moved), [0, 1, 2]);

        unsafe { ptr::drop_in_place(ptr::slice_from_raw_parts_mut(dst.as_mut_ptr(), 3)) };
        assert_eq!(probe::counters().live, 0);
    }

    #[test]
    fn construct_each_fills_in_order() {
        let mut buffer = RawBuffer::<String>::with_capacity(4);

        unsafe { construct_each(buffer.as_mut_ptr(), 4, |index| index.to_string()) };

        let items = unsafe { &mut *ptr::slice_from_raw_parts_mut(buffer.as_mut_ptr(), 4) };
        assert_eq!(items, ["0", "1", "2", "3"]);

        unsafe { ptr::drop_in_place(items) };
    }

    #[test]
    fn construct_each_rolls_back_on_panic() {
        probe::reset();

        let mut buffer = RawBuffer::<Probe>::with_capacity(5);
        let dst = buffer.as_mut_ptr();

        probe::fail_on_construction(3);

        let result = panic::catch_unwind(AssertUnwindSafe(|| unsafe {
            construct_each(dst, 5, |index| Probe::new(index as u32));
        }));

        assert!(result.is_err());

        let counters = probe::counters();
        assert_eq!(counters.constructions, 2);
        assert_eq!(counters.drops, 2);
        assert_eq!(counters.live, 0);
    }

    #[test]
    fn clone_into_rolls_back_on_panic_and_leaves_source_intact() {
        probe::reset();

        let source = [Probe::new(1), Probe::new(2), Probe::new(3)];
        let mut buffer = RawBuffer::<Probe>::with_capacity(3);
        let dst = buffer.as_mut_ptr();

        probe::fail_on_clone(2);

        let result = panic::catch_unwind(AssertUnwindSafe(|| unsafe {
            clone_into(&source, dst);
        }));

        assert!(result.is_err());

        let counters = probe::counters();
        assert_eq!(counters.clones, 1);
        assert_eq!(counters.live, 3);
        assert_eq!(probe::values(&source), [1, 2, 3]);
    }

    #[test]
    fn clone_into_copies_every_item() {
        let source = ["x".to_string(), "y".to_string()];
        let mut buffer = RawBuffer::<String>::with_capacity(2);

        unsafe { clone_into(&source, buffer.as_mut_ptr()) };

        let items = unsafe { &mut *ptr::slice_from_raw_parts_mut(buffer.as_mut_ptr(), 2) };
        assert_eq!(items, source);

        unsafe { ptr::drop_in_place(items) };
    }
}
