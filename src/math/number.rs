use std::fmt::{Debug, Display};
use std::iter::Sum;

use num_traits::Float;

/// Trait representing the floating point type the engine is generic over.
///
/// This is a narrowed form of the corpus's `Number`/`Float` trait family: the
/// clamp/normalize operations that family carries belong to color-space math
/// and have no use here, so only what the metric, object store, and update
/// engine actually need is kept. `num_traits::Float` (rather than the
/// corpus's choice of the narrower `Real`) is used because the cluster-label
/// query needs `NaN` to signal "unknown point".
///
/// # Type Parameters
/// * `Self` - the concrete float type (`f32` or `f64`).
pub trait FloatNumber: Float + Debug + Display + Sum + Copy + 'static {}

impl FloatNumber for f32 {}
impl FloatNumber for f64 {}
