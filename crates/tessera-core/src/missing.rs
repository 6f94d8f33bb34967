//! Missing-value sentinels.
//!
//! Every fixed-width primitive reserves one bit pattern that means "no value
//! present". Integer widths use their minimum value and floating widths use
//! NaN. The sentinel for wide integers relies on the extreme value never
//! occurring in real data; a column cannot store `i64::MIN` as a value.
//!
//! Combining a sentinel with anything yields the sentinel.

/// Byte stored in a boolean cell for `false`.
pub const BOOLEAN_FALSE: i8 = 0;
/// Byte stored in a boolean cell for `true`.
pub const BOOLEAN_TRUE: i8 = 1;
/// Byte stored in a boolean cell when the value is missing.
pub const BOOLEAN_MISSING: i8 = i8::MIN;

/// A primitive width with a reserved missing sentinel.
pub trait MissingValue: Copy {
    /// The reserved sentinel.
    const MISSING: Self;

    /// Returns the sentinel.
    #[inline]
    fn missing_indicator() -> Self {
        Self::MISSING
    }

    /// Returns true if `self` is the sentinel.
    fn is_missing_value(self) -> bool;
}

macro_rules! integer_missing {
    ($($t:ty),*) => {
        $(
            impl MissingValue for $t {
                const MISSING: Self = <$t>::MIN;

                #[inline]
                fn is_missing_value(self) -> bool {
                    self == <$t>::MIN
                }
            }
        )*
    };
}

integer_missing!(i8, i16, i32, i64);

impl MissingValue for f32 {
    const MISSING: Self = f32::NAN;

    #[inline]
    fn is_missing_value(self) -> bool {
        self.is_nan()
    }
}

impl MissingValue for f64 {
    const MISSING: Self = f64::NAN;

    #[inline]
    fn is_missing_value(self) -> bool {
        self.is_nan()
    }
}

/// Apply `op` to two raw values, propagating the sentinel.
#[inline]
pub fn combine<A, B, U, F>(a: A, b: B, op: F) -> U
where
    A: MissingValue,
    B: MissingValue,
    U: MissingValue,
    F: FnOnce(A, B) -> U,
{
    if a.is_missing_value() || b.is_missing_value() {
        U::MISSING
    } else {
        op(a, b)
    }
}

/// Apply `op` to one raw value, propagating the sentinel.
#[inline]
pub fn map<T, U, F>(a: T, op: F) -> U
where
    T: MissingValue,
    U: MissingValue,
    F: FnOnce(T) -> U,
{
    if a.is_missing_value() {
        U::MISSING
    } else {
        op(a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_sentinels() {
        assert!(i8::MIN.is_missing_value());
        assert!(i16::MIN.is_missing_value());
        assert!(i32::MIN.is_missing_value());
        assert!(i64::MIN.is_missing_value());
        assert!(!0i32.is_missing_value());
        assert!(!(i32::MIN + 1).is_missing_value());
        assert_eq!(i32::missing_indicator(), i32::MIN);
    }

    #[test]
    fn test_float_sentinels() {
        assert!(f64::MISSING.is_missing_value());
        assert!(f32::missing_indicator().is_missing_value());
        assert!(!f64::INFINITY.is_missing_value());
        assert!(!0.0f32.is_missing_value());
    }

    #[test]
    fn test_combine_propagates_missing() {
        let sum: i64 = combine(3i32, 4i32, |a, b| (a + b) as i64);
        assert_eq!(sum, 7);

        let missing: i64 = combine(3i32, i32::MISSING, |a, b| (a + b) as i64);
        assert!(missing.is_missing_value());

        let ratio: f64 = combine(1.0f64, f64::MISSING, |a, b| a / b);
        assert!(ratio.is_nan());
    }

    #[test]
    fn test_map_propagates_missing() {
        let doubled: f64 = map(21i16, |v| v as f64 * 2.0);
        assert_eq!(doubled, 42.0);
        let missing: f64 = map(i16::MISSING, |v| v as f64);
        assert!(missing.is_missing_value());
    }
}
