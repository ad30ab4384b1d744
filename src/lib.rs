//! An incremental DBSCAN clustering index.
//!
//! Unlike a batch DBSCAN implementation, which recomputes every point's label
//! from scratch given a full data set, [`IncrementalDbscan`] maintains a
//! correct labeling while points are inserted and deleted one at a time (or
//! in batches), without ever re-scanning the whole data set.
//!
//! ```
//! use incremental_dbscan::IncrementalDbscan;
//!
//! let mut index = IncrementalDbscan::<f64>::default();
//! index.insert(&[vec![0.0, 0.0], vec![1.0, 0.0], vec![0.5, 0.5]]).unwrap();
//!
//! let labels = index.get_cluster_labels(&[vec![0.0, 0.0]]).unwrap();
//! assert!(labels[0] >= 0.0);
//! ```

mod engine;
mod error;
mod index;
mod math;
mod registry;
mod store;

use std::fmt::Display;

use num_traits::NumCast;

pub use error::Error;
pub use math::{FloatNumber, Metric};
pub use registry::{ClusterId, Label};

use engine::UpdateEngine;
use math::Point;

/// Sentinel returned by [`IncrementalDbscan::get_cluster_labels`] for a noise
/// point.
const NOISE_LABEL: f64 = -1.0;

/// An incremental DBSCAN clustering index.
///
/// # Type Parameters
/// * `T` - The floating point type used for coordinates (`f32` or `f64`).
#[derive(Debug)]
pub struct IncrementalDbscan<T>
where
    T: FloatNumber + Display,
{
    eps: T,
    min_pts: usize,
    metric: Metric,
    engine: UpdateEngine<T>,
}

impl<T> IncrementalDbscan<T>
where
    T: FloatNumber + Display,
{
    /// Builds a new, empty incremental DBSCAN index.
    ///
    /// # Arguments
    /// * `eps` - The neighborhood radius; must be strictly positive.
    /// * `min_pts` - The minimum neighborhood weight for a point to be core;
    ///   must be strictly positive.
    /// * `metric` - The distance metric.
    ///
    /// # Errors
    /// Returns [`Error::InvalidEpsilon`] if `eps` is not strictly positive,
    /// or [`Error::InvalidMinPoints`] if `min_pts` is zero.
    pub fn new(eps: T, min_pts: usize, metric: Metric) -> Result<Self, Error<T>> {
        if eps <= T::zero() {
            return Err(Error::InvalidEpsilon(eps));
        }
        if min_pts == 0 {
            return Err(Error::InvalidMinPoints(min_pts));
        }
        Ok(Self {
            eps,
            min_pts,
            metric,
            engine: UpdateEngine::new(eps, min_pts as u64, metric),
        })
    }

    /// Builds a new, empty incremental DBSCAN index from a Minkowski order,
    /// mirroring `sklearn.cluster.DBSCAN`'s `p` parameter.
    ///
    /// # Arguments
    /// * `eps` - The neighborhood radius.
    /// * `min_pts` - The minimum neighborhood weight for a point to be core.
    /// * `order` - `1.0` (Manhattan), `2.0` (Euclidean), or `f64::INFINITY`
    ///   (Chebyshev).
    ///
    /// # Errors
    /// Returns [`Error::InvalidMetricOrder`] if `order` names no supported
    /// Minkowski order, in addition to the errors [`Self::new`] can return.
    pub fn with_order(eps: T, min_pts: usize, order: T) -> Result<Self, Error<T>> {
        let order_f64: f64 = NumCast::from(order).unwrap_or(f64::NAN);
        let metric = Metric::from_order(order_f64).ok_or(Error::InvalidMetricOrder(order))?;
        Self::new(eps, min_pts, metric)
    }

    /// The neighborhood radius this index was built with.
    #[must_use]
    pub fn eps(&self) -> T {
        self.eps
    }

    /// The minimum neighborhood weight this index was built with.
    #[must_use]
    pub fn min_pts(&self) -> usize {
        self.min_pts
    }

    /// The distance metric this index was built with.
    #[must_use]
    pub fn metric(&self) -> Metric {
        self.metric
    }

    /// Inserts `points` into the index, one at a time, updating labels as
    /// needed.
    ///
    /// # Arguments
    /// * `points` - The coordinates to insert. May contain duplicates, which
    ///   increase that coordinate's multiplicity rather than erroring.
    ///
    /// # Errors
    /// Returns [`Error::DimensionMismatch`] if any point's dimension differs
    /// from the dimension fixed by the first point ever inserted into this
    /// index. On error, no point in `points` is inserted.
    pub fn insert(&mut self, points: &[Point<T>]) -> Result<(), Error<T>> {
        self.check_dimensions(points)?;
        for point in points {
            self.engine.insert(point.clone());
        }
        Ok(())
    }

    /// Deletes `points` from the index, one at a time, updating labels as
    /// needed (including splitting a cluster into several, or destroying
    /// it).
    ///
    /// # Arguments
    /// * `points` - The coordinates to delete. A coordinate inserted `k`
    ///   times must be deleted `k` times before it disappears.
    ///
    /// # Returns
    /// A vector parallel to `points`: `true` at index `i` iff `points[i]` was
    /// found and its multiplicity was decremented.
    ///
    /// # Errors
    /// Returns [`Error::DimensionMismatch`] under the same condition as
    /// [`Self::insert`]. On error, no point in `points` is deleted.
    pub fn delete(&mut self, points: &[Point<T>]) -> Result<Vec<bool>, Error<T>> {
        self.check_dimensions(points)?;
        Ok(points.iter().map(|point| self.engine.delete(point)).collect())
    }

    /// Looks up the current cluster label of each point in `points`.
    ///
    /// # Arguments
    /// * `points` - The coordinates to look up.
    ///
    /// # Returns
    /// A vector parallel to `points`, where each entry is:
    /// - `NaN` if the coordinate is not currently stored in the index,
    /// - `-1.0` if the coordinate is currently labeled noise,
    /// - the cluster identity (a non-negative integer) otherwise.
    ///
    /// # Errors
    /// Returns [`Error::DimensionMismatch`] under the same condition as
    /// [`Self::insert`].
    pub fn get_cluster_labels(&self, points: &[Point<T>]) -> Result<Vec<T>, Error<T>> {
        self.check_dimensions(points)?;
        Ok(points
            .iter()
            .map(|point| match self.engine.label(point) {
                None => T::nan(),
                Some(Label::Noise) => NumCast::from(NOISE_LABEL).unwrap_or_else(|| -T::one()),
                Some(Label::Cluster(id)) => NumCast::from(id).unwrap_or_else(T::zero),
            })
            .collect())
    }

    /// Validates that every point in `points` matches the dimension fixed by
    /// the first point ever inserted. If no dimension has been fixed yet,
    /// the first point in `points` fixes it for the rest of this same call,
    /// so a single batch establishing the index's dimension cannot itself
    /// contain mismatched points.
    fn check_dimensions(&self, points: &[Point<T>]) -> Result<(), Error<T>> {
        let mut expected = self.engine.dimension();
        for point in points {
            match expected {
                Some(dim) if point.len() != dim => {
                    return Err(Error::DimensionMismatch {
                        expected: dim,
                        actual: point.len(),
                    });
                }
                Some(_) => {}
                None => expected = Some(point.len()),
            }
        }
        Ok(())
    }
}

impl<T> Default for IncrementalDbscan<T>
where
    T: FloatNumber + Display,
{
    /// Builds an index with `sklearn.cluster.DBSCAN`'s defaults: `eps =
    /// 0.5`, `min_pts = 5`, Euclidean distance.
    fn default() -> Self {
        Self::new(
            NumCast::from(0.5).unwrap_or_else(T::zero),
            5,
            Metric::Euclidean,
        )
        .expect("default parameters are always valid")
    }
}
