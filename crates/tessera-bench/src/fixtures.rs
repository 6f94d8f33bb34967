//! Test data generation for benchmarks.
//!
//! Every generator is seeded so runs are comparable.

use rand::distributions::Alphanumeric;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tessera_core::{PackedDate, Selection};

/// Scale factor for benchmark data generation.
#[derive(Clone, Copy, Debug, Default)]
pub enum Scale {
    /// 1,000 rows. Use for quick iteration.
    Tiny,
    /// 10,000 rows.
    Small,
    /// 100,000 rows; above the parallel sort threshold.
    #[default]
    Medium,
    /// 1,000,000 rows.
    Large,
}

impl Scale {
    /// Row count for this scale.
    pub fn rows(&self) -> usize {
        match self {
            Scale::Tiny => 1_000,
            Scale::Small => 10_000,
            Scale::Medium => 100_000,
            Scale::Large => 1_000_000,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Scale::Tiny => "tiny",
            Scale::Small => "small",
            Scale::Medium => "medium",
            Scale::Large => "large",
        }
    }
}

/// Integers in `[0, 1_000_000)` with roughly `missing_ratio` of rows missing.
pub fn generate_ints(rows: usize, missing_ratio: f64) -> Vec<Option<i32>> {
    const SEED: u64 = 12345;
    let mut rng = StdRng::seed_from_u64(SEED);
    (0..rows)
        .map(|_| {
            if rng.gen_bool(missing_ratio) {
                None
            } else {
                Some(rng.gen_range(0..1_000_000))
            }
        })
        .collect()
}

/// Strings drawn from `distinct` random category labels.
pub fn generate_categories(rows: usize, distinct: usize) -> Vec<Option<String>> {
    const SEED: u64 = 54321;
    let mut rng = StdRng::seed_from_u64(SEED);
    let labels: Vec<String> = (0..distinct.max(1))
        .map(|i| {
            let suffix: String = (0..8).map(|_| rng.sample(Alphanumeric) as char).collect();
            format!("cat_{}_{}", i, suffix)
        })
        .collect();
    (0..rows)
        .map(|_| Some(labels[rng.gen_range(0..labels.len())].clone()))
        .collect()
}

/// Dates spread over 1950-2049.
pub fn generate_dates(rows: usize) -> Vec<PackedDate> {
    const SEED: u64 = 98765;
    let mut rng = StdRng::seed_from_u64(SEED);
    (0..rows)
        .map(|_| {
            let year = rng.gen_range(1950..2050);
            let month = rng.gen_range(1..=12);
            let day = rng.gen_range(1..=28);
            PackedDate::pack(year, month, day).unwrap_or(PackedDate::MISSING)
        })
        .collect()
}

/// A selection over `[0, rows)` containing roughly `density` of the rows.
pub fn generate_selection(rows: usize, density: f64, seed: u64) -> Selection {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..rows).filter(|_| rng.gen_bool(density)).collect()
}
