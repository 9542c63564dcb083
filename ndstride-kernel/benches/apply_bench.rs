//! Apply engine benchmarks.
//!
//! Compares the vector and scalar paths on contiguous rows, measures
//! transposed sources (always scalar), and times sequential against parallel
//! traversal of a large transposed operand.
//!
//! Run with: cargo bench -p ndstride-kernel --bench apply_bench

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ndstride_kernel::{ops::Dispatcher, BinaryOp, StridedArray};
use std::hint::black_box;
use std::time::Duration;

fn make_matrix(n: usize) -> StridedArray<f64> {
    StridedArray::from_fn_row_major(&[n, n], |idx| ((idx[0] * 31 + idx[1] * 7) % 101) as f64)
}

fn bench_add_contiguous(c: &mut Criterion) {
    let mut group = c.benchmark_group("add_contiguous");
    group.sample_size(20);
    group.warm_up_time(Duration::from_secs(1));

    for n in [64, 256, 1024] {
        group.throughput(Throughput::Elements((n * n) as u64));
        let a = make_matrix(n);
        let b = make_matrix(n);
        let mut out = StridedArray::<f64>::row_major(&[n, n]);

        for (label, dispatcher) in [("vector", Dispatcher::default()), ("scalar", Dispatcher::scalar())] {
            group.bench_with_input(BenchmarkId::new(label, n), &n, |bench, _| {
                bench.iter(|| {
                    dispatcher
                        .binary_into(BinaryOp::Add, &mut out.view_mut(), &a.view(), &b.view())
                        .unwrap();
                    black_box(out.data()[0])
                })
            });
        }
    }
    group.finish();
}

fn bench_add_transposed(c: &mut Criterion) {
    let mut group = c.benchmark_group("add_transposed");
    group.sample_size(20);

    for n in [256, 1024] {
        group.throughput(Throughput::Elements((n * n) as u64));
        let a = make_matrix(n);
        let b = make_matrix(n);
        let a_t = a.view().transpose();
        let mut out = StridedArray::<f64>::row_major(&[n, n]);

        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |bench, _| {
            bench.iter(|| {
                Dispatcher::default()
                    .binary_into(BinaryOp::Add, &mut out.view_mut(), &a_t, &b.view())
                    .unwrap();
                black_box(out.data()[0])
            })
        });
    }
    group.finish();
}

fn bench_parallel(c: &mut Criterion) {
    let mut group = c.benchmark_group("mul_transposed_parallel");
    group.sample_size(10);
    group.measurement_time(Duration::from_secs(3));

    let n = 2048;
    group.throughput(Throughput::Elements((n * n) as u64));
    let a = make_matrix(n);
    let b = make_matrix(n);
    let a_t = a.view().transpose();
    let mut out = StridedArray::<f64>::row_major(&[n, n]);

    for parallel in [false, true] {
        let dispatcher = Dispatcher {
            parallel,
            ..Dispatcher::default()
        };
        let label = if parallel { "parallel" } else { "sequential" };
        group.bench_function(label, |bench| {
            bench.iter(|| {
                dispatcher
                    .binary_into(BinaryOp::Mul, &mut out.view_mut(), &a_t, &b.view())
                    .unwrap();
                black_box(out.data()[0])
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_add_contiguous, bench_add_transposed, bench_parallel);
criterion_main!(benches);
