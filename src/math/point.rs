use std::hash::{Hash, Hasher};

use crate::math::FloatNumber;

/// Point in an N-dimensional space.
///
/// Unlike the corpus's `Point<T, N> = [T; N]` alias, `N` is not known at
/// compile time here: the spec fixes dimension from the first coordinate a
/// client streams in, not from a type parameter. A plain `Vec<T>` is the
/// natural runtime-dimensional analogue.
///
/// # Type Parameters
/// * `T` - The floating point type (typically `f32` or `f64`).
pub type Point<T> = Vec<T>;

/// A bitwise-equality, hashable key derived from a [`Point`].
///
/// The data model requires "coordinate equality is exact ... bitwise on the
/// coordinate tuple": floats are not `Eq`/`Hash`, so this wraps each
/// coordinate's `to_bits` representation, mirroring the common Rust idiom for
/// keying maps by float vectors without pulling in an `ordered-float`
/// dependency the corpus itself never uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordKey(Vec<u64>);

impl CoordKey {
    /// Builds a coordinate key from a point.
    ///
    /// # Arguments
    /// * `point` - The point to derive the key from.
    ///
    /// # Returns
    /// A new `CoordKey` instance.
    #[must_use]
    pub fn new<T>(point: &Point<T>) -> Self
    where
        T: FloatNumber,
    {
        Self(point.iter().map(|value| to_bits(*value)).collect())
    }

    /// Returns the dimension of the underlying point.
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.0.len()
    }
}

impl Hash for CoordKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

/// Converts a floating point value into a canonical bit pattern for hashing.
///
/// Normalizes the two zero representations (`+0.0`/`-0.0`) to a single
/// pattern so that `-0.0` and `0.0` compare equal as coordinates, matching
/// ordinary floating point equality semantics.
fn to_bits<T>(value: T) -> u64
where
    T: FloatNumber,
{
    if value == T::zero() {
        return 0;
    }
    // `to_f64` is lossless for both f32 and f64 inputs widened to f64 bits.
    value.to_f64().unwrap_or(0.0).to_bits()
}
