//! Basic benchmarks for the `dynamic_array` package.
#![allow(
    missing_docs,
    reason = "No need for API documentation in benchmark code"
)]

use std::hint::black_box;
use std::time::Instant;

use alloc_tracker::Allocator;
use criterion::{Criterion, criterion_group, criterion_main};
use dynamic_array::DynamicArray;

criterion_group!(benches, entrypoint);
criterion_main!(benches);

#[global_allocator]
static ALLOCATOR: Allocator<std::alloc::System> = Allocator::system();

type TestItem = usize;
const TEST_VALUE: TestItem = 1024;
const ITEM_COUNT: usize = 1000;

fn entrypoint(c: &mut Criterion) {
    let allocs = alloc_tracker::Session::new();

    let mut group = c.benchmark_group("da_basic");

    let allocs_op = allocs.operation("new_empty");
    group.bench_function("new_empty", |b| {
        b.iter_custom(|iters| {
            let _span = allocs_op.measure_thread().iterations(iters);

            let start = Instant::now();

            for _ in 0..iters {
                drop(black_box(DynamicArray::<TestItem>::new()));
            }

            start.elapsed()
        });
    });

    let allocs_op = allocs.operation("push_back_growing");
    group.bench_function("push_back_growing", |b| {
        b.iter_custom(|iters| {
            let _span = allocs_op.measure_thread().iterations(iters);

            let start = Instant::now();

            for _ in 0..iters {
                let mut array = DynamicArray::new();

                for _ in 0..ITEM_COUNT {
                    array.push_back(black_box(TEST_VALUE));
                }

                drop(black_box(array));
            }

            start.elapsed()
        });
    });

    let allocs_op = allocs.operation("push_back_reserved");
    group.bench_function("push_back_reserved", |b| {
        b.iter_custom(|iters| {
            let _span = allocs_op.measure_thread().iterations(iters);

            let start = Instant::now();

            for _ in 0..iters {
                let mut array = DynamicArray::with_capacity(ITEM_COUNT);

                for _ in 0..ITEM_COUNT {
                    array.push_back(black_box(TEST_VALUE));
                }

                drop(black_box(array));
            }

            start.elapsed()
        });
    });

    let allocs_op = allocs.operation("insert_front");
    group.bench_function("insert_front", |b| {
        b.iter_custom(|iters| {
            let mut array = DynamicArray::with_len_with(ITEM_COUNT, |index| index);
            array.reserve(ITEM_COUNT * 2);

            let _span = allocs_op.measure_thread().iterations(iters);

            let start = Instant::now();

            for _ in 0..iters {
                array.insert(0, black_box(TEST_VALUE));
                array.erase(0);
            }

            start.elapsed()
        });
    });

    let allocs_op = allocs.operation("clone_from_reusing");
    group.bench_function("clone_from_reusing", |b| {
        b.iter_custom(|iters| {
            let source = DynamicArray::<TestItem>::with_len(ITEM_COUNT);
            let mut target = DynamicArray::with_capacity(ITEM_COUNT);

            let _span = allocs_op.measure_thread().iterations(iters);

            let start = Instant::now();

            for _ in 0..iters {
                target.clone_from(black_box(&source));
            }

            start.elapsed()
        });
    });

    group.finish();

    allocs.print_to_stdout();
}
