//! Tessera Core - Columnar encodings and row selections.
//!
//! This crate provides the storage substrate for Tessera tables: fixed-width
//! column stores with per-type missing sentinels, dictionary-encoded strings,
//! order-preserving packed temporal values, and the bitmap [`Selection`] that
//! every column predicate returns.

#[cfg(feature = "mimalloc")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

pub mod column;
pub mod config;
pub mod dictionary;
pub mod error;
pub mod missing;
pub mod parse;
pub mod selection;
pub mod store;
pub mod temporal;

pub use column::{
    BooleanColumn, ByteColumn, Column, ColumnType, DateColumn, DateRangeColumn, DateTimeColumn,
    DictionaryBacked, DoubleColumn, FloatColumn, InstantColumn, IntColumn, LongColumn,
    NumberColumn, NumericColumn, PackedColumn, ShortColumn, SortableColumn, StringColumn,
    TemporalColumn, TemporalValue, TimeColumn,
};
pub use config::ParseOptions;
pub use dictionary::{Dictionary, KeyRemap};
pub use error::{Error, Result, WideValue};
pub use missing::MissingValue;
pub use selection::Selection;
pub use store::{NumericType, Primitive, PrimitiveStore};

// Temporal exports
pub use temporal::{
    PackedDate, PackedDateRange, PackedDateTime, PackedInstant, PackedTime, TimeUnit,
};
