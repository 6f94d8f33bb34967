//! Fixed-width primitive cell types.

use std::cmp::Ordering;
use std::fmt::Debug;

use bytes::BufMut;

use crate::column::ColumnType;
use crate::missing::MissingValue;

/// A fixed-width raw cell value.
///
/// Ordering places the missing sentinel before every real value, so missing
/// rows sort first ascending and last descending for every width, including
/// floats whose NaN sentinel has no natural order.
pub trait Primitive: MissingValue + Debug + PartialEq + Send + Sync + 'static {
    /// Width of one cell in bytes.
    const BYTE_SIZE: usize;

    /// Total order with the sentinel as the minimum.
    fn compare(a: Self, b: Self) -> Ordering;

    /// Append the big-endian encoding of this value.
    fn put_be<B: BufMut>(self, buf: &mut B);

    /// Key used for distinct counting. Equal values produce equal keys.
    fn distinct_key(self) -> u64;
}

/// A primitive that participates in numeric conversion and arithmetic.
pub trait NumericType: Primitive + PartialOrd {
    /// Column type that stores this width.
    const COLUMN_TYPE: ColumnType;

    /// True for `f32`/`f64`.
    const IS_FLOAT: bool;

    /// The value as a double; the sentinel becomes NaN.
    ///
    /// Integers wider than 53 bits round to the nearest representable double.
    fn to_f64(self) -> f64;

    /// The value as a 64-bit integer, truncating any fraction.
    fn to_i64(self) -> i64;

    /// Narrow or widen from a 64-bit integer.
    ///
    /// Narrowing discards high-order bits and may flip the sign. A result
    /// that lands on the sentinel pattern reads back as missing.
    fn from_i64_wrapping(value: i64) -> Self;

    /// Convert from a double, saturating at the real value range.
    fn from_f64_lossy(value: f64) -> Self;

    /// Convert to another numeric width, propagating the sentinel.
    #[inline]
    fn cast<U: NumericType>(self) -> U {
        if self.is_missing_value() {
            U::MISSING
        } else if Self::IS_FLOAT || U::IS_FLOAT {
            if U::IS_FLOAT {
                U::from_f64_lossy(self.to_f64())
            } else {
                U::from_f64_lossy(self.to_f64().trunc())
            }
        } else {
            U::from_i64_wrapping(self.to_i64())
        }
    }
}

macro_rules! integer_primitive {
    ($t:ty, $size:expr, $put:ident, $column_type:expr) => {
        impl Primitive for $t {
            const BYTE_SIZE: usize = $size;

            #[inline]
            fn compare(a: Self, b: Self) -> Ordering {
                // The sentinel is the type minimum, so natural order already
                // sorts it first.
                a.cmp(&b)
            }

            #[inline]
            fn put_be<B: BufMut>(self, buf: &mut B) {
                buf.$put(self);
            }

            #[inline]
            fn distinct_key(self) -> u64 {
                self as i64 as u64
            }
        }

        impl NumericType for $t {
            const COLUMN_TYPE: ColumnType = $column_type;
            const IS_FLOAT: bool = false;

            #[inline]
            fn to_f64(self) -> f64 {
                if self.is_missing_value() {
                    f64::NAN
                } else {
                    self as f64
                }
            }

            #[inline]
            fn to_i64(self) -> i64 {
                self as i64
            }

            #[inline]
            fn from_i64_wrapping(value: i64) -> Self {
                value as $t
            }

            #[inline]
            fn from_f64_lossy(value: f64) -> Self {
                if value.is_nan() {
                    return Self::MISSING;
                }
                // Keep saturated values off the sentinel.
                let lo = (<$t>::MIN as f64) + 1.0;
                let hi = <$t>::MAX as f64;
                value.clamp(lo, hi) as $t
            }
        }
    };
}

integer_primitive!(i8, 1, put_i8, ColumnType::Byte);
integer_primitive!(i16, 2, put_i16, ColumnType::Short);
integer_primitive!(i32, 4, put_i32, ColumnType::Integer);
integer_primitive!(i64, 8, put_i64, ColumnType::Long);

macro_rules! float_primitive {
    ($t:ty, $size:expr, $put:ident, $column_type:expr) => {
        impl Primitive for $t {
            const BYTE_SIZE: usize = $size;

            #[inline]
            fn compare(a: Self, b: Self) -> Ordering {
                match (a.is_nan(), b.is_nan()) {
                    (true, true) => Ordering::Equal,
                    (true, false) => Ordering::Less,
                    (false, true) => Ordering::Greater,
                    (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
                }
            }

            #[inline]
            fn put_be<B: BufMut>(self, buf: &mut B) {
                buf.$put(self);
            }

            #[inline]
            fn distinct_key(self) -> u64 {
                // Fold -0.0 into 0.0 so they count once.
                let normalized = if self == 0.0 { 0.0 } else { self };
                normalized.to_bits() as u64
            }
        }

        impl NumericType for $t {
            const COLUMN_TYPE: ColumnType = $column_type;
            const IS_FLOAT: bool = true;

            #[inline]
            fn to_f64(self) -> f64 {
                self as f64
            }

            #[inline]
            fn to_i64(self) -> i64 {
                self as i64
            }

            #[inline]
            fn from_i64_wrapping(value: i64) -> Self {
                value as $t
            }

            #[inline]
            fn from_f64_lossy(value: f64) -> Self {
                value as $t
            }
        }
    };
}

float_primitive!(f32, 4, put_f32, ColumnType::Float);
float_primitive!(f64, 8, put_f64, ColumnType::Double);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_sorts_first() {
        assert_eq!(i32::compare(i32::MISSING, -5), Ordering::Less);
        assert_eq!(f64::compare(f64::MISSING, f64::NEG_INFINITY), Ordering::Less);
        assert_eq!(f64::compare(1.0, f64::MISSING), Ordering::Greater);
        assert_eq!(f32::compare(f32::MISSING, f32::MISSING), Ordering::Equal);
    }

    #[test]
    fn test_big_endian_encoding() {
        let mut buf = Vec::new();
        0x0102_0304i32.put_be(&mut buf);
        assert_eq!(buf, vec![1, 2, 3, 4]);

        let mut buf = Vec::new();
        1.0f64.put_be(&mut buf);
        assert_eq!(buf, 1.0f64.to_be_bytes().to_vec());
    }

    #[test]
    fn test_widening_preserves_value() {
        assert_eq!(120i8.cast::<i64>(), 120);
        assert_eq!((-7i16).cast::<f64>(), -7.0);
        assert_eq!(i32::MAX.cast::<i64>(), i32::MAX as i64);
    }

    #[test]
    fn test_widening_to_float_rounds() {
        let big = (1i64 << 53) + 1;
        assert_eq!(big.cast::<f64>(), (1i64 << 53) as f64);
    }

    #[test]
    fn test_narrowing_discards_high_bits() {
        assert_eq!(70_000i32.cast::<i16>(), 70_000i32 as i16);
        assert_eq!(200i32.cast::<i8>(), -56);
    }

    #[test]
    fn test_missing_propagates_through_cast() {
        assert!(i16::MISSING.cast::<i64>().is_missing_value());
        assert!(i64::MISSING.cast::<f32>().is_missing_value());
        assert!(f64::MISSING.cast::<i32>().is_missing_value());
    }

    #[test]
    fn test_float_to_int_saturates_off_sentinel() {
        assert_eq!((-1e12f64).cast::<i32>(), i32::MIN + 1);
        assert_eq!(1e12f64.cast::<i32>(), i32::MAX);
        assert_eq!(2.9f64.cast::<i32>(), 2);
    }

    #[test]
    fn test_distinct_key_folds_negative_zero() {
        assert_eq!((-0.0f64).distinct_key(), 0.0f64.distinct_key());
    }
}
