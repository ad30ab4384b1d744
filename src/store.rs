//! Object store: owns every distinct point currently alive, its multiplicity,
//! and its cached neighborhood weight.
//!
//! Grounded on the corpus's
//! `examples/t28hub-auto-palette/crates/auto-palette/src/math/clustering/dbscan/label.rs`
//! (a small struct wrapping per-point state alongside sentinel label
//! constants) and
//! `examples/t28hub-auto-palette/crates/auto-palette/src/math/clustering/cluster.rs`
//! (index-based membership), generalized
//! from a fixed-size array over a static batch to a slab that supports
//! insertion and removal.

use std::collections::HashMap;

use crate::math::{CoordKey, FloatNumber, Point};

/// Stable identifier for a point, reused as the key into the neighborhood
/// index (see [`crate::index::PointId`]).
pub type PointId = usize;

/// A single distinct point and its incrementally maintained state.
#[derive(Debug, Clone)]
pub struct PointRecord<T>
where
    T: FloatNumber,
{
    /// The point's coordinate.
    pub coord: Point<T>,
    /// Number of times this exact coordinate has been inserted minus the
    /// number of times it has been deleted. The record exists iff this is
    /// greater than zero.
    pub count: u64,
    /// Cached sum of `count` over every stored point within `eps`,
    /// including this point itself.
    pub neighbor_weight: u64,
}

impl<T> PointRecord<T>
where
    T: FloatNumber,
{
    /// Whether this record's multiplicity is exhausted (count reached zero).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// Owns every live [`PointRecord`], keyed by coordinate and by stable id.
#[derive(Debug)]
pub struct ObjectStore<T>
where
    T: FloatNumber,
{
    records: HashMap<PointId, PointRecord<T>>,
    by_coord: HashMap<CoordKey, PointId>,
    next_id: PointId,
}

impl<T> ObjectStore<T>
where
    T: FloatNumber,
{
    /// Builds a new, empty object store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: HashMap::new(),
            by_coord: HashMap::new(),
            next_id: 0,
        }
    }

    /// Returns the existing point for `coord`, or creates one with `count =
    /// 0` if none exists yet.
    ///
    /// # Arguments
    /// * `coord` - The coordinate to look up or create.
    ///
    /// # Returns
    /// `(id, created)` where `created` is `true` iff a new record was
    /// allocated.
    pub fn get_or_create(&mut self, coord: Point<T>) -> (PointId, bool) {
        let key = CoordKey::new(&coord);
        if let Some(&id) = self.by_coord.get(&key) {
            return (id, false);
        }

        let id = self.next_id;
        self.next_id += 1;
        self.records.insert(
            id,
            PointRecord {
                coord,
                count: 0,
                neighbor_weight: 0,
            },
        );
        self.by_coord.insert(key, id);
        (id, true)
    }

    /// Looks up the id of an already-stored point, without creating one.
    ///
    /// # Arguments
    /// * `coord` - The coordinate to look up.
    #[must_use]
    pub fn lookup(&self, coord: &Point<T>) -> Option<PointId> {
        self.by_coord.get(&CoordKey::new(coord)).copied()
    }

    /// Adjusts a point's multiplicity by `delta`.
    ///
    /// # Arguments
    /// * `id` - The point to adjust.
    /// * `delta` - `+1` for an insertion, `-1` for a deletion.
    ///
    /// # Panics
    /// Panics if `id` is unknown, or if `delta` would drive `count` negative.
    pub fn bump(&mut self, id: PointId, delta: i64) {
        let record = self.records.get_mut(&id).expect("unknown point id");
        if delta >= 0 {
            record.count += delta as u64;
        } else {
            record.count = record
                .count
                .checked_sub((-delta) as u64)
                .expect("count underflow");
        }
    }

    /// Whether a point currently exists (`count > 0`).
    #[must_use]
    pub fn exists(&self, id: PointId) -> bool {
        self.records.get(&id).is_some_and(|r| !r.is_empty())
    }

    /// Permanently removes an exhausted record from the store.
    ///
    /// # Arguments
    /// * `id` - The point to remove.
    ///
    /// # Panics
    /// Panics if the record still has a nonzero count.
    pub fn remove(&mut self, id: PointId) -> PointRecord<T> {
        let record = self.records.remove(&id).expect("unknown point id");
        assert!(record.is_empty(), "removing a still-live point");
        self.by_coord.remove(&CoordKey::new(&record.coord));
        record
    }

    /// Returns a shared reference to a point's record.
    #[must_use]
    pub fn get(&self, id: PointId) -> Option<&PointRecord<T>> {
        self.records.get(&id)
    }

    /// Returns a mutable reference to a point's record.
    #[must_use]
    pub fn get_mut(&mut self, id: PointId) -> Option<&mut PointRecord<T>> {
        self.records.get_mut(&id)
    }

    /// The dimension fixed by the first point ever inserted, if any point is
    /// currently (or was ever) stored.
    #[must_use]
    pub fn dimension(&self) -> Option<usize> {
        self.records.values().next().map(|r| r.coord.len())
    }
}

impl<T> Default for ObjectStore<T>
where
    T: FloatNumber,
{
    fn default() -> Self {
        Self::new()
    }
}
