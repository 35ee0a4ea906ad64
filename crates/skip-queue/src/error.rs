use thiserror::Error;


/// The broad category of a [`QueueError`].
///
/// Callers which translate queue failures into user-facing responses (for instance, an HTTP
/// layer) usually only need to branch on the kind.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Hash)]
pub enum ErrorKind {
    /// An argument had the wrong type; for an `f64` key, this means the key was `NaN`.
    Type,
    /// An argument was numerically invalid, or the key space between two neighbours
    /// has been exhausted.
    Range,
    /// A referenced key does not exist in the queue.
    Reference,
}

impl ErrorKind {
    /// The HTTP status code a request handler should respond with for this kind of failure.
    #[inline]
    #[must_use]
    pub const fn http_status(self) -> u16 {
        match self {
            Self::Type | Self::Range => 400,
            Self::Reference          => 404,
        }
    }
}

/// The errors that can be returned by the operations of a [`SkipQueue`].
///
/// Every error is detected before the queue is mutated, so a failed call leaves the queue
/// exactly as it was.
///
/// [`SkipQueue`]: crate::SkipQueue
#[allow(variant_size_differences, reason = "the error enum shouldn't be hot")]
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum QueueError {
    /// A key passed to `get`, `set`, `remove`, or used to construct a node was `NaN`.
    #[error("key must be a number")]
    KeyNotANumber,
    /// The relative key passed to `add_after` was `NaN`.
    #[error("relativeKey must be a number or absent")]
    RelativeKeyNotANumber,
    /// A key passed to `get`, `set`, or `remove` (or added directly to a level) was infinite.
    ///
    /// Infinite keys are reserved for the sentinels at either end of every level.
    #[error("key must be finite, got `{0}`")]
    KeyNotFinite(f64),
    /// The relative key passed to `add_after` was positive infinity, which is reserved for
    /// the tail sentinel and can never be the key of an entry.
    #[error("relativeKey must be less than positive infinity")]
    RelativeKeyInfinite,
    /// The mean of two neighbouring keys collapsed onto one of them; no `f64` lies strictly
    /// between `lower` and `upper`.
    #[error("too much averaging: no key fits between `{lower}` and `{upper}`")]
    TooMuchAveraging {
        lower: f64,
        upper: f64,
    },
    /// Appending or prepending would produce a key outside of the range of integers which an
    /// `f64` represents exactly.
    #[error("unsafe integer: key `{0}` is outside the exactly-representable integer range")]
    UnsafeInteger(f64),
    /// The relative key passed to `add_after` does not belong to any entry in the queue.
    #[error("relativeKey `{0}` not found")]
    RelativeKeyNotFound(f64),
}

impl QueueError {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::KeyNotANumber | Self::RelativeKeyNotANumber => ErrorKind::Type,
            Self::KeyNotFinite(_)
            | Self::RelativeKeyInfinite
            | Self::TooMuchAveraging { .. }
            | Self::UnsafeInteger(_)                          => ErrorKind::Range,
            Self::RelativeKeyNotFound(_)                      => ErrorKind::Reference,
        }
    }

    /// A stable, machine-readable code for this error, suitable for an API response body.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::KeyNotANumber          => "key_not_a_number",
            Self::RelativeKeyNotANumber  => "relative_key_not_a_number",
            Self::KeyNotFinite(_)        => "key_not_finite",
            Self::RelativeKeyInfinite    => "relative_key_infinite",
            Self::TooMuchAveraging { .. } => "too_much_averaging",
            Self::UnsafeInteger(_)       => "unsafe_integer",
            Self::RelativeKeyNotFound(_) => "relative_key_not_found",
        }
    }
}

/// Checks a key passed to `get`, `set`, or `remove`.
pub(crate) fn validate_key(key: f64) -> Result<f64, QueueError> {
    if key.is_nan() {
        Err(QueueError::KeyNotANumber)
    } else if key.is_infinite() {
        Err(QueueError::KeyNotFinite(key))
    } else {
        Ok(key)
    }
}


#[cfg(test)]
mod tests {
    use super::*;


    #[test]
    fn kinds_and_statuses() {
        assert_eq!(QueueError::KeyNotANumber.kind(), ErrorKind::Type);
        assert_eq!(QueueError::RelativeKeyNotANumber.kind(), ErrorKind::Type);
        assert_eq!(QueueError::KeyNotFinite(f64::INFINITY).kind(), ErrorKind::Range);
        assert_eq!(QueueError::RelativeKeyInfinite.kind(), ErrorKind::Range);
        assert_eq!(
            QueueError::TooMuchAveraging { lower: 0., upper: 1. }.kind(),
            ErrorKind::Range,
        );
        assert_eq!(QueueError::UnsafeInteger(1e16).kind(), ErrorKind::Range);
        assert_eq!(QueueError::RelativeKeyNotFound(3.).kind(), ErrorKind::Reference);

        assert_eq!(ErrorKind::Type.http_status(), 400);
        assert_eq!(ErrorKind::Range.http_status(), 400);
        assert_eq!(ErrorKind::Reference.http_status(), 404);
    }

    #[test]
    fn messages() {
        assert_eq!(
            QueueError::RelativeKeyInfinite.to_string(),
            "relativeKey must be less than positive infinity",
        );
        assert_eq!(QueueError::RelativeKeyNotFound(2.5).to_string(), "relativeKey `2.5` not found");
        assert_eq!(QueueError::RelativeKeyNotFound(2.5).code(), "relative_key_not_found");
    }

    #[test]
    fn key_validation() {
        assert_eq!(validate_key(-3.25), Ok(-3.25));
        assert_eq!(validate_key(f64::NAN), Err(QueueError::KeyNotANumber));
        assert_eq!(
            validate_key(f64::NEG_INFINITY),
            Err(QueueError::KeyNotFinite(f64::NEG_INFINITY)),
        );
    }
}
