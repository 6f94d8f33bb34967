//! Selection bitmap benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tessera_bench::fixtures::{generate_selection, Scale};
use tessera_core::Selection;

fn bench_algebra(c: &mut Criterion) {
    let mut group = c.benchmark_group("selection/algebra");

    for scale in [Scale::Small, Scale::Medium, Scale::Large] {
        let rows = scale.rows();
        let left = generate_selection(rows, 0.5, 1);
        let right = generate_selection(rows, 0.3, 2);

        group.bench_with_input(BenchmarkId::new("and", scale.name()), &rows, |b, _| {
            b.iter(|| black_box(left.intersection(&right)));
        });

        group.bench_with_input(BenchmarkId::new("or", scale.name()), &rows, |b, _| {
            b.iter(|| black_box(left.union(&right)));
        });

        group.bench_with_input(BenchmarkId::new("and_not", scale.name()), &rows, |b, _| {
            b.iter(|| black_box(left.difference(&right)));
        });
    }

    group.finish();
}

fn bench_construction(c: &mut Criterion) {
    let mut group = c.benchmark_group("selection/build");
    let rows = Scale::Medium.rows();

    group.bench_function("with_range", |b| {
        b.iter(|| black_box(Selection::with_range(0, rows).unwrap()));
    });

    group.bench_function("collect_every_third", |b| {
        b.iter(|| black_box((0..rows).step_by(3).collect::<Selection>()));
    });

    group.bench_function("flip", |b| {
        let base = generate_selection(rows, 0.5, 3);
        b.iter(|| {
            let mut flipped = base.clone();
            flipped.flip(0, rows).unwrap();
            black_box(flipped)
        });
    });

    group.finish();
}

fn bench_random(c: &mut Criterion) {
    let mut group = c.benchmark_group("selection/random");
    let rows = Scale::Large.rows();

    for n in [100usize, 10_000, 500_000] {
        group.bench_with_input(BenchmarkId::new("select_n", n), &n, |b, &n| {
            let mut rng = StdRng::seed_from_u64(7);
            b.iter(|| black_box(Selection::select_n_at_random(n, rows, &mut rng).unwrap()));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_algebra, bench_construction, bench_random);
criterion_main!(benches);
