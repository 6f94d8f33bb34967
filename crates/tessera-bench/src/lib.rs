//! Tessera Benchmark Suite
//!
//! This crate provides Criterion benchmarks for the Tessera column core.
//!
//! # Benchmark Categories
//!
//! - **Selection**: Bitmap algebra, range construction, random sampling
//! - **Dictionary**: String encoding, sharded ingestion, key merges
//! - **Store**: Sorting, lag/lead, filtering, missing-value scans
//! - **Temporal**: Packing, field extraction, date arithmetic

pub mod fixtures;

pub use fixtures::{
    generate_categories, generate_dates, generate_ints, generate_selection, Scale,
};

/// Install a `tracing` subscriber configured from `RUST_LOG`.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .try_init();
}
