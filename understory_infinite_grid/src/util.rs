// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

/// Largest magnitude at which an `f64` can still carry a fractional part (2^52).
const FRACTION_LIMIT: f64 = 4_503_599_627_370_496.0;

/// Rounds `value` toward negative infinity without relying on `std` float intrinsics.
#[inline]
pub(crate) fn floor_f64(value: f64) -> f64 {
    if !value.is_finite() || value >= FRACTION_LIMIT || value <= -FRACTION_LIMIT {
        return value;
    }
    #[allow(
        clippy::cast_possible_truncation,
        reason = "Magnitude is below 2^52, so the value fits in i64 exactly."
    )]
    let truncated = value as i64 as f64;

    // Round towards -∞ (the cast above has already truncated).
    if truncated > value {
        truncated - 1.0
    } else {
        truncated
    }
}

/// Floors `value` and converts it to `i64`, saturating at the bounds and mapping NaN to 0.
#[inline]
pub(crate) fn floor_to_i64(value: f64) -> i64 {
    #[allow(
        clippy::cast_possible_truncation,
        reason = "Float to int `as` casts saturate, which is the intended behavior here."
    )]
    let floored = floor_f64(value) as i64;
    floored
}

/// Converts a collection length to `i64`, saturating at `i64::MAX`.
#[inline]
pub(crate) fn len_to_i64(len: usize) -> i64 {
    i64::try_from(len).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::{floor_f64, floor_to_i64, len_to_i64};

    #[test]
    fn floor_rounds_toward_negative_infinity() {
        assert_eq!(floor_f64(2.5), 2.0);
        assert_eq!(floor_f64(-2.5), -3.0);
        assert_eq!(floor_f64(-3.0), -3.0);
        assert_eq!(floor_f64(0.0), 0.0);
        assert_eq!(floor_f64(-0.25), -1.0);
        assert!(floor_f64(f64::NAN).is_nan());
    }

    #[test]
    fn floor_to_i64_saturates() {
        assert_eq!(floor_to_i64(-2.9), -3);
        assert_eq!(floor_to_i64(f64::INFINITY), i64::MAX);
        assert_eq!(floor_to_i64(f64::NEG_INFINITY), i64::MIN);
        assert_eq!(floor_to_i64(f64::NAN), 0);
    }

    #[test]
    fn len_conversion() {
        assert_eq!(len_to_i64(0), 0);
        assert_eq!(len_to_i64(300), 300);
    }
}
