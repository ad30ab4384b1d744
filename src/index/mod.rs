//! Neighborhood index: returns stored points within `eps` of a query point
//! and supports point-at-a-time insertion and removal.
//!
//! The corpus's neighbor-search abstraction (`NeighborSearch`, backed by a
//! k-d tree or a linear scan) is built once over a static slice of points and
//! has no notion of inserting or removing a single point afterwards. This
//! engine instead needs an index that stays correct as points stream in and
//! out one at a time, over a dimension fixed only at runtime — so it is
//! rebuilt here as a uniform grid hash, the high-dimension fallback the
//! design guidance calls out as an acceptable implementation strategy.

use std::collections::HashMap;

use num_traits::ToPrimitive;

use crate::math::{FloatNumber, Metric, Point};

/// Stable identifier for a point stored in the [`crate::store::ObjectStore`],
/// reused by the neighborhood index so a query can return identifiers
/// directly instead of coordinates.
pub type PointId = usize;

/// A grid cell coordinate: one `i64` bucket index per dimension.
type CellKey = Vec<i64>;

/// Mutable neighborhood index over points of a fixed runtime dimension.
///
/// Contract (mirrors `SPEC_FULL.md` §4.2):
/// - `put`: register a point as queryable. Idempotent is not required here
///   since the caller (the object store) already deduplicates by coordinate.
/// - `drop`: remove a point, called only once its multiplicity reaches zero.
/// - `query`: all stored points within `eps` of a query point, including the
///   query point itself if stored.
#[derive(Debug)]
pub struct GridIndex<T>
where
    T: FloatNumber,
{
    eps: T,
    metric: Metric,
    cells: HashMap<CellKey, Vec<PointId>>,
    coords: HashMap<PointId, Point<T>>,
}

impl<T> GridIndex<T>
where
    T: FloatNumber,
{
    /// Builds a new, empty grid index.
    ///
    /// # Arguments
    /// * `eps` - The neighborhood radius; also used as the grid's cell size.
    /// * `metric` - The distance metric used to refine candidates within a
    ///   cell neighborhood into an exact `eps`-radius result.
    ///
    /// # Returns
    /// A new `GridIndex` instance.
    #[must_use]
    pub fn new(eps: T, metric: Metric) -> Self {
        Self {
            eps,
            metric,
            cells: HashMap::new(),
            coords: HashMap::new(),
        }
    }

    /// Registers a point as queryable.
    ///
    /// # Arguments
    /// * `id` - The stable identifier of the point.
    /// * `coord` - The point's coordinate.
    pub fn put(&mut self, id: PointId, coord: Point<T>) {
        let key = self.cell_key(&coord);
        self.cells.entry(key).or_default().push(id);
        self.coords.insert(id, coord);
    }

    /// Removes a point from the index.
    ///
    /// # Arguments
    /// * `id` - The stable identifier of the point to remove.
    pub fn drop(&mut self, id: PointId) {
        let Some(coord) = self.coords.remove(&id) else {
            return;
        };
        let key = self.cell_key(&coord);
        if let Some(bucket) = self.cells.get_mut(&key) {
            bucket.retain(|stored| *stored != id);
            if bucket.is_empty() {
                self.cells.remove(&key);
            }
        }
    }

    /// Finds all stored points within `eps` of `query`, including `query`
    /// itself if it is stored under the same coordinate.
    ///
    /// # Arguments
    /// * `query` - The point to search from.
    ///
    /// # Returns
    /// The identifiers of every stored point within `eps`.
    #[must_use]
    pub fn query(&self, query: &Point<T>) -> Vec<PointId> {
        let center = self.cell_key(query);
        let mut results = Vec::new();
        for offset in neighbor_offsets(center.len()) {
            let key: CellKey = center.iter().zip(offset.iter()).map(|(c, o)| c + o).collect();
            let Some(bucket) = self.cells.get(&key) else {
                continue;
            };
            for &id in bucket {
                let coord = &self.coords[&id];
                if let Some(distance) = self.metric.measure(query, coord) {
                    if distance <= self.eps {
                        results.push(id);
                    }
                }
            }
        }
        results
    }

    /// Returns the coordinate stored for a given point identifier, if any.
    #[must_use]
    pub fn coord(&self, id: PointId) -> Option<&Point<T>> {
        self.coords.get(&id)
    }

    /// Number of distinct coordinates currently stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.coords.len()
    }

    /// Whether the index currently holds no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    /// Maps a coordinate to its grid cell.
    fn cell_key(&self, coord: &Point<T>) -> CellKey {
        coord
            .iter()
            .map(|&v| (v / self.eps).floor().to_i64().unwrap_or(0))
            .collect()
    }
}

/// Generates every offset in `{-1, 0, 1}^dim`, the 3^dim cells adjacent to
/// (and including) a center cell, which always cover every point within
/// `eps` of a query point when cells are sized `eps` on a side.
fn neighbor_offsets(dim: usize) -> Vec<Vec<i64>> {
    let mut offsets = vec![Vec::new()];
    for _ in 0..dim {
        let mut next = Vec::with_capacity(offsets.len() * 3);
        for prefix in &offsets {
            for delta in [-1i64, 0, 1] {
                let mut extended = prefix.clone();
                extended.push(delta);
                next.push(extended);
            }
        }
        offsets = next;
    }
    offsets
}
