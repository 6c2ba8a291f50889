//! Integration tests for the `dynamic_array` package.
//!
//! These exercise the public API across operations: sequences of pushes and pops, capacity
//! management, copy and move semantics and insertion/erasure round trips.

use std::cell::Cell;
use std::mem;

use dynamic_array::DynamicArray;
use proptest::prelude::*;

thread_local! {
    static CLONES: Cell<usize> = const { Cell::new(0) };
}

/// Counts how often it is cloned, so tests can tell relocation apart from copying.
#[derive(Debug, Eq, PartialEq)]
struct CloneCounter(u32);

impl Clone for CloneCounter {
    fn clone(&self) -> Self {
        CLONES.with(|clones| clones.set(clones.get() + 1));
        Self(self.0)
    }
}

fn clones() -> usize {
    CLONES.with(Cell::get)
}

#[test]
fn push_erase_insert_scenario() {
    let mut array = DynamicArray::new();

    array.push_back(1);
    array.push_back(2);
    array.push_back(3);
    assert_eq!(array.len(), 3);
    assert_eq!(array, [1, 2, 3]);

    array.erase(1);
    assert_eq!(array, [1, 3]);
    assert_eq!(array.len(), 2);

    array.insert(0, 0);
    assert_eq!(array, [0, 1, 3]);
    assert_eq!(array.len(), 3);
}

#[test]
fn growth_relocates_instead_of_cloning() {
    let mut array = DynamicArray::new();

    for value in 0..50 {
        array.push_back(CloneCounter(value));
    }
    array.insert(0, CloneCounter(100));
    array.reserve(500);
    array.resize_with(60, || CloneCounter(7));

    assert_eq!(clones(), 0);
    assert_eq!(array.len(), 60);
    assert_eq!(array[0], CloneCounter(100));
    assert_eq!(array[1], CloneCounter(0));

    let copy = array.clone();
    assert_eq!(clones(), 60);
    assert_eq!(copy, array);
}

#[test]
fn move_assignment_transfers_everything() {
    let mut source = DynamicArray::from(["x".to_string(), "y".to_string()]);
    let mut target = DynamicArray::from(["old".to_string()]);
    assert_eq!(target, ["old"]);

    target = mem::take(&mut source);

    assert_eq!(target, ["x", "y"]);
    assert!(source.is_empty());
    assert_eq!(source.capacity(), 0);

    // The moved-from array is still fully usable.
    source.push_back("z".to_string());
    assert_eq!(source, ["z"]);
}

#[test]
fn owned_iteration_round_trip() {
    let array: DynamicArray<u32> = (1..=5).collect();

    let doubled: DynamicArray<u32> = array.into_iter().map(|value| value * 2).collect();

    assert_eq!(doubled, [2, 4, 6, 8, 10]);
}

#[derive(Clone, Copy, Debug)]
enum Op {
    Push(u8),
    Pop,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![any::<u8>().prop_map(Op::Push), Just(Op::Pop)]
}

proptest! {
    #[test]
    fn push_pop_sequences_behave_like_a_stack(ops in proptest::collection::vec(op(), 0..200)) {
        let mut array = DynamicArray::new();
        let mut model = Vec::new();

        for op in ops {
            match op {
                Op::Push(value) => {
                    array.push_back(value);
                    model.push(value);
                }
                Op::Pop => {
                    prop_assert_eq!(array.pop_back(), model.pop());
                }
            }

            prop_assert!(array.len() <= array.capacity());
        }

        prop_assert_eq!(array.len(), model.len());
        prop_assert_eq!(array.as_slice(), model.as_slice());
    }

    #[test]
    fn reserve_never_shrinks_or_disturbs_items(
        values in proptest::collection::vec(any::<u32>(), 0..64),
        requested in 0_usize..128,
    ) {
        let mut array: DynamicArray<u32> = values.iter().copied().collect();
        let capacity_before = array.capacity();
        let ptr_before = array.as_ptr();

        array.reserve(requested);

        if requested <= capacity_before {
            prop_assert_eq!(array.capacity(), capacity_before);
            prop_assert_eq!(array.as_ptr(), ptr_before);
        } else {
            prop_assert!(array.capacity() >= requested);
        }

        prop_assert_eq!(array.len(), values.len());
        prop_assert_eq!(array.as_slice(), values.as_slice());
    }

    #[test]
    fn copy_assignment_is_deep(
        target_values in proptest::collection::vec(any::<u16>(), 0..32),
        source_values in proptest::collection::vec(any::<u16>(), 0..32),
        spare_capacity in 0_usize..32,
    ) {
        let mut target: DynamicArray<String> =
            DynamicArray::with_capacity(target_values.len() + spare_capacity);
        target.extend(target_values.iter().map(ToString::to_string));
        let mut source: DynamicArray<String> =
            source_values.iter().map(ToString::to_string).collect();

        target.clone_from(&source);
        prop_assert_eq!(&target, &source);

        source.push_back("extra".to_string());
        for item in &mut source {
            item.push('!');
        }

        let expected: Vec<String> = source_values.iter().map(ToString::to_string).collect();
        prop_assert_eq!(target.as_slice(), expected.as_slice());
    }

    #[test]
    fn insert_then_erase_restores_original(
        values in proptest::collection::vec(any::<i64>(), 0..32),
        position in any::<prop::sample::Index>(),
        inserted in any::<i64>(),
    ) {
        let mut array: DynamicArray<i64> = values.iter().copied().collect();
        let index = position.index(values.len() + 1);

        array.insert(index, inserted);
        prop_assert_eq!(array[index], inserted);
        prop_assert_eq!(array.len(), values.len() + 1);

        prop_assert_eq!(array.erase(index), index);
        prop_assert_eq!(array.as_slice(), values.as_slice());
    }
}
