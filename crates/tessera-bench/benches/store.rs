//! Primitive store benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tessera_bench::fixtures::{generate_ints, generate_selection, Scale};
use tessera_core::{Column, IntColumn};

fn bench_sort(c: &mut Criterion) {
    let mut group = c.benchmark_group("store/sort");

    for scale in [Scale::Small, Scale::Medium, Scale::Large] {
        let column = IntColumn::from_options("n", generate_ints(scale.rows(), 0.05));
        group.bench_with_input(
            BenchmarkId::new("ascending", scale.name()),
            &column,
            |b, column| {
                b.iter(|| {
                    let mut sorted = column.clone();
                    sorted.sort_ascending();
                    black_box(sorted)
                });
            },
        );
        group.bench_with_input(
            BenchmarkId::new("descending", scale.name()),
            &column,
            |b, column| {
                b.iter(|| {
                    let mut sorted = column.clone();
                    sorted.sort_descending();
                    black_box(sorted)
                });
            },
        );
    }

    group.finish();
}

fn bench_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("store/scan");
    let rows = Scale::Medium.rows();
    let column = IntColumn::from_options("n", generate_ints(rows, 0.1));

    group.bench_function("is_greater_than", |b| {
        b.iter(|| black_box(column.is_greater_than(500_000)));
    });

    group.bench_function("missing", |b| {
        b.iter(|| black_box(column.missing()));
    });

    group.bench_function("count_unique", |b| {
        b.iter(|| black_box(column.count_unique()));
    });

    group.bench_function("lag", |b| {
        b.iter(|| black_box(column.lag(3)));
    });

    let selection = generate_selection(rows, 0.25, 11);
    group.bench_function("filter", |b| {
        b.iter(|| black_box(column.filter(&selection).unwrap()));
    });

    group.finish();
}

fn bench_arithmetic(c: &mut Criterion) {
    let mut group = c.benchmark_group("store/arith");
    let rows = Scale::Medium.rows();
    let left = IntColumn::from_options("a", generate_ints(rows, 0.1));
    let right = IntColumn::from_options("b", generate_ints(rows, 0.1));

    group.bench_function("add", |b| {
        b.iter(|| black_box(left.add(&right).unwrap()));
    });

    group.bench_function("divide", |b| {
        b.iter(|| black_box(left.divide(&right).unwrap()));
    });

    group.bench_function("cumulative_sum", |b| {
        b.iter(|| black_box(left.cumulative_sum()));
    });

    group.finish();
}

criterion_group!(benches, bench_sort, bench_scan, bench_arithmetic);
criterion_main!(benches);
