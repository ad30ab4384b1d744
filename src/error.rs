use std::fmt::Display;

use thiserror::Error;

use crate::math::FloatNumber;

/// Error that might occur while constructing or driving the incremental
/// clustering index.
///
/// Shaped after the corpus's `DBSCANError<T>` (a `thiserror`-derived enum
/// parameterized over the float type so the offending value can be echoed
/// back verbatim), merged with the crate-root placement of the corpus's own
/// `Error` enum.
///
/// # Type Parameters
/// * `T` - The floating point type.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error<T>
where
    T: FloatNumber + Display,
{
    /// The minimum number of points is invalid.
    #[error("min_pts must be greater than zero, got: {0}")]
    InvalidMinPoints(usize),

    /// The epsilon radius is invalid.
    #[error("eps must be greater than zero, got: {0}")]
    InvalidEpsilon(T),

    /// The Minkowski order does not name a supported metric.
    #[error("p must be one of 1, 2, or infinity, got: {0}")]
    InvalidMetricOrder(T),

    /// A point's dimension differs from the dimension fixed by the first
    /// point ever inserted into this index.
    #[error("expected points of dimension {expected}, got dimension {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}
