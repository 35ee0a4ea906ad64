//! Assignment of fractional keys, which lets an entry be placed between two neighbours without
//! renumbering anything else.
//!
//! Only the keys of the two immediate neighbours are consulted. Between two entries, the new key
//! is their mean; at either end of the queue, it is the next integer outward. Both cases can run
//! out of room, since keys are `f64`s: repeatedly splitting the same gap eventually leaves no
//! `f64` strictly inside it, and repeatedly appending (or prepending) eventually leaves the range
//! of exactly-representable integers. Either way the insertion is rejected, and the caller is
//! expected to treat that as a recoverable condition.

use crate::error::QueueError;


/// The largest integer `n` such that `n` and `n + 1` are both exactly representable as an `f64`
/// (that is, `2^53 - 1`).
pub const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// The smallest integer `n` such that `n` and `n - 1` are both exactly representable as an `f64`.
pub const MIN_SAFE_INTEGER: f64 = -MAX_SAFE_INTEGER;


/// Whether `key` has no fractional part. Infinite and `NaN` keys are not integers.
#[inline]
#[must_use]
pub fn is_integer(key: f64) -> bool {
    key.is_finite() && key.fract() == 0.
}

/// Whether `key` is an integer in `MIN_SAFE_INTEGER..=MAX_SAFE_INTEGER`.
#[inline]
#[must_use]
pub fn is_safe_integer(key: f64) -> bool {
    is_integer(key) && key.abs() <= MAX_SAFE_INTEGER
}

/// Choose a key strictly between `lower` and `upper`, the keys of two adjacent nodes on level 0.
///
/// `lower` is either finite or `-inf` (the head sentinel), and `upper` is either finite or `+inf`
/// (the tail sentinel), with `lower < upper`.
///
/// - If both are finite, the new key is their mean.
/// - If the queue is empty (`-inf` and `+inf`), the new key is `0`.
/// - Before the first entry, the new key is `upper - 1` if `upper` is an integer, and
///   `floor(upper)` otherwise.
/// - After the last entry, the new key is `lower + 1` if `lower` is an integer, and
///   `ceil(lower)` otherwise.
///
/// # Errors
/// - [`QueueError::TooMuchAveraging`] if the mean of two finite keys equals one of them.
/// - [`QueueError::UnsafeInteger`] if a key at either end of the queue would fall outside
///   `MIN_SAFE_INTEGER..=MAX_SAFE_INTEGER`.
pub fn key_between(lower: f64, upper: f64) -> Result<f64, QueueError> {
    debug_assert!(lower < upper, "neighbouring keys are strictly ordered");

    if lower.is_finite() && upper.is_finite() {
        let mean = (lower + upper) / 2.;

        #[expect(clippy::float_cmp, reason = "an exact collision is what is being detected")]
        let collapsed = mean == lower || mean == upper;

        return if collapsed {
            Err(QueueError::TooMuchAveraging { lower, upper })
        } else {
            Ok(mean)
        };
    }

    let key = if lower.is_finite() {
        if is_integer(lower) { lower + 1. } else { lower.ceil() }
    } else if upper.is_finite() {
        if is_integer(upper) { upper - 1. } else { upper.floor() }
    } else {
        0.
    };

    if is_safe_integer(key) {
        Ok(key)
    } else {
        Err(QueueError::UnsafeInteger(key))
    }
}
