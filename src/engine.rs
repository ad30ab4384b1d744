//! Update engine: orchestrates insertion and deletion, classifying points as
//! core/non-core and propagating cluster identity changes (creation, merge,
//! absorption on insert; shrink, split, destruction on delete).
//!
//! Grounded on the corpus's
//! `examples/t28hub-auto-palette/crates/auto-palette/src/math/clustering/dbscan.rs`: its
//! `expand_cluster` drives a frontier queue seeded from a point's neighbors,
//! growing a single cluster outward over a static, already-fully-known point
//! set. That one-shot expansion has no counterpart for *shrinking* a cluster,
//! since the corpus's batch algorithm never un-clusters a point — the split
//! detection in `delete` below (a multi-source BFS joined by a union-find)
//! has no direct analogue in the corpus and is built from `SPEC_FULL.md`
//! §4.5.2 directly.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::{
    index::GridIndex,
    math::{FloatNumber, Metric, Point},
    registry::{ClusterId, Label, LabelRegistry},
    store::{ObjectStore, PointId},
};

/// Orchestrates the Object Store, Neighborhood Index, and Label Registry to
/// maintain a correct incremental DBSCAN labeling.
#[derive(Debug)]
pub struct UpdateEngine<T>
where
    T: FloatNumber,
{
    min_pts: u64,
    store: ObjectStore<T>,
    index: GridIndex<T>,
    registry: LabelRegistry,
}

impl<T> UpdateEngine<T>
where
    T: FloatNumber,
{
    /// Builds a new, empty update engine.
    ///
    /// # Arguments
    /// * `eps` - The neighborhood radius.
    /// * `min_pts` - The minimum neighborhood weight for a point to be core.
    /// * `metric` - The distance metric.
    #[must_use]
    pub fn new(eps: T, min_pts: u64, metric: Metric) -> Self {
        Self {
            min_pts,
            store: ObjectStore::new(),
            index: GridIndex::new(eps, metric),
            registry: LabelRegistry::new(),
        }
    }

    /// The dimension fixed by the first point ever inserted, if any.
    #[must_use]
    pub fn dimension(&self) -> Option<usize> {
        self.store.dimension()
    }

    /// Returns the current label of a coordinate: `None` if the coordinate is
    /// not currently stored, `Some(Label::Noise)`, or `Some(Label::Cluster)`.
    #[must_use]
    pub fn label(&self, coord: &Point<T>) -> Option<Label> {
        let id = self.store.lookup(coord)?;
        if !self.store.exists(id) {
            return None;
        }
        self.registry.get(id)
    }

    #[inline]
    fn is_core(&self, id: PointId) -> bool {
        self.store
            .get(id)
            .is_some_and(|r| r.neighbor_weight >= self.min_pts)
    }

    /// Inserts one coordinate, per `SPEC_FULL.md` §4.5.1.
    pub fn insert(&mut self, coord: Point<T>) {
        let (p, created) = self.store.get_or_create(coord.clone());
        if created {
            self.index.put(p, coord.clone());
            self.registry.set(p, Label::Noise);
        }

        let old_weight_p = self.store.get(p).map(|r| r.neighbor_weight).unwrap_or(0);
        self.store.bump(p, 1);

        let neighbors = self.index.query(&coord);
        let old_core: HashMap<PointId, bool> = neighbors
            .iter()
            .filter(|&&q| q != p)
            .map(|&q| (q, self.is_core(q)))
            .collect();

        for &q in &neighbors {
            if q != p {
                if let Some(rec) = self.store.get_mut(q) {
                    rec.neighbor_weight += 1;
                }
            }
        }
        let total: u64 = neighbors
            .iter()
            .map(|&q| self.store.get(q).map(|r| r.count).unwrap_or(0))
            .sum();
        if let Some(rec) = self.store.get_mut(p) {
            rec.neighbor_weight = total;
        }

        let p_is_core = self.is_core(p);
        let p_is_new_core = p_is_core && old_weight_p < self.min_pts;
        let other_new_cores: Vec<PointId> = neighbors
            .iter()
            .copied()
            .filter(|&q| q != p && self.is_core(q) && !*old_core.get(&q).unwrap_or(&false))
            .collect();

        let mut new_core_set = other_new_cores;
        if p_is_new_core {
            new_core_set.push(p);
        }

        if new_core_set.is_empty() {
            if !p_is_core {
                // Case (a): absorption as border, or remains noise.
                let border_identity = neighbors
                    .iter()
                    .filter(|&&q| q != p && self.is_core(q))
                    .find_map(|&q| self.registry.get(q).and_then(Label::cluster_id));
                match border_identity {
                    Some(id) => self.registry.set(p, Label::Cluster(id)),
                    None => self.registry.set(p, Label::Noise),
                }
            }
            // Else: p was already core and nothing else changed; labels stand.
            return;
        }

        // Case (b)/(c): at least one new core. Gather identities already
        // held by cores in the union of *every* new core's own neighborhood,
        // not just p's — a new core elsewhere in the graph can be adjacent
        // to an already-core point that never entered p's own query.
        let new_core_id_set: HashSet<PointId> = new_core_set.iter().copied().collect();
        let mut neighbor_queries: Vec<(PointId, Vec<PointId>)> =
            Vec::with_capacity(new_core_set.len());
        let mut existing: HashSet<ClusterId> = HashSet::new();
        for &core_point in &new_core_set {
            let core_coord = self.store.get(core_point).unwrap().coord.clone();
            let core_neighbors = self.index.query(&core_coord);
            for &n in &core_neighbors {
                if !new_core_id_set.contains(&n) && self.is_core(n) {
                    if let Some(id) = self.registry.get(n).and_then(Label::cluster_id) {
                        existing.insert(id);
                    }
                }
            }
            neighbor_queries.push((core_point, core_neighbors));
        }

        let target = if let Some(&min_id) = existing.iter().min() {
            let others: Vec<ClusterId> =
                existing.iter().copied().filter(|&id| id != min_id).collect();
            if !others.is_empty() {
                self.registry.merge_into(&others, min_id);
            }
            min_id
        } else {
            self.registry.fresh_identity()
        };

        for &core_point in &new_core_set {
            self.registry.set(core_point, Label::Cluster(target));
        }
        for (_, core_neighbors) in &neighbor_queries {
            for &n in core_neighbors {
                if !self.is_core(n) {
                    self.registry.set(n, Label::Cluster(target));
                }
            }
        }
    }

    /// Deletes one coordinate, per `SPEC_FULL.md` §4.5.2.
    ///
    /// # Returns
    /// `true` iff the coordinate existed and its multiplicity was
    /// decremented.
    pub fn delete(&mut self, coord: &Point<T>) -> bool {
        let Some(p) = self.store.lookup(coord) else {
            return false;
        };
        if !self.store.exists(p) {
            return false;
        }

        let neighbors = self.index.query(coord);
        let old_core: HashMap<PointId, bool> =
            neighbors.iter().map(|&q| (q, self.is_core(q))).collect();
        let old_labels: HashMap<PointId, Option<Label>> =
            neighbors.iter().map(|&q| (q, self.registry.get(q))).collect();

        self.store.bump(p, -1);
        for &q in &neighbors {
            if q != p {
                if let Some(rec) = self.store.get_mut(q) {
                    rec.neighbor_weight -= 1;
                }
            }
        }

        if self.store.exists(p) {
            let total: u64 = neighbors
                .iter()
                .map(|&q| self.store.get(q).map(|r| r.count).unwrap_or(0))
                .sum();
            self.store.get_mut(p).unwrap().neighbor_weight = total;
        } else {
            self.index.drop(p);
            self.registry.remove(p);
            self.store.remove(p);
        }

        let mut ex_core: Vec<PointId> = Vec::new();
        for &q in &neighbors {
            let was = *old_core.get(&q).unwrap_or(&false);
            let now = self.store.get(q).is_some() && self.is_core(q);
            if was && !now {
                ex_core.push(q);
            }
        }

        // Step 5: reclassify any non-core neighbor with no remaining core
        // neighbor as noise. The candidate set is every non-core neighbor of
        // p *and* every non-core neighbor of each demoted ex-core point —
        // a border two hops from p can still be orphaned by a demotion one
        // hop away from it.
        let mut border_candidates: HashSet<PointId> = neighbors.iter().copied().collect();
        for &q in &ex_core {
            let q_coord = if q == p {
                coord.clone()
            } else {
                match self.store.get(q) {
                    Some(record) => record.coord.clone(),
                    None => continue,
                }
            };
            border_candidates.extend(self.index.query(&q_coord));
        }
        for &b in &border_candidates {
            if self.store.get(b).is_none() || self.is_core(b) {
                continue;
            }
            let b_coord = self.store.get(b).unwrap().coord.clone();
            let has_core_neighbor = self
                .index
                .query(&b_coord)
                .into_iter()
                .any(|n| n != b && self.is_core(n));
            if !has_core_neighbor {
                self.registry.set(b, Label::Noise);
            }
        }

        // Steps 6/7: split detection and cluster destruction, per affected
        // identity.
        let mut affected: HashSet<ClusterId> = HashSet::new();
        for &q in &ex_core {
            if let Some(id) = old_labels
                .get(&q)
                .copied()
                .flatten()
                .and_then(Label::cluster_id)
            {
                affected.insert(id);
            }
        }
        for c in affected {
            let seeds = self.compute_seeds(c, &ex_core, &old_labels, p, coord);
            self.resolve_split(c, seeds);
        }

        true
    }

    /// Computes the multi-source BFS seed set for cluster `c`: the
    /// still-existing core neighbors of every `ExCore` vertex that held
    /// identity `c`.
    fn compute_seeds(
        &self,
        c: ClusterId,
        ex_core: &[PointId],
        old_labels: &HashMap<PointId, Option<Label>>,
        p: PointId,
        p_coord: &Point<T>,
    ) -> Vec<PointId> {
        let mut seeds: HashSet<PointId> = HashSet::new();
        for &q in ex_core {
            let identity = old_labels
                .get(&q)
                .copied()
                .flatten()
                .and_then(Label::cluster_id);
            if identity != Some(c) {
                continue;
            }
            let coord = if q == p {
                p_coord.clone()
            } else {
                match self.store.get(q) {
                    Some(record) => record.coord.clone(),
                    None => continue,
                }
            };
            for n in self.index.query(&coord) {
                if n == q || self.store.get(n).is_none() || !self.is_core(n) {
                    continue;
                }
                if self.registry.get(n).and_then(Label::cluster_id) == Some(c) {
                    seeds.insert(n);
                }
            }
        }
        seeds.into_iter().collect()
    }

    /// Determines whether cluster `c` fragmented, and relabels accordingly.
    ///
    /// Runs a multi-source frontier BFS from `seeds` over the core
    /// points currently labeled `c`, merging frontiers with a union-find
    /// when they meet. Any core left unreached by a seed (possible only
    /// when multiple simultaneously-lost vertices jointly sever a path with
    /// no surviving shared neighbor) is folded in by a second, exhaustive
    /// pass so every core still ends up in exactly one component.
    fn resolve_split(&mut self, c: ClusterId, seeds: Vec<PointId>) {
        let prior_members: Vec<PointId> = self.registry.members_of(c);
        let cores: Vec<PointId> = prior_members
            .iter()
            .copied()
            .filter(|&m| self.is_core(m))
            .collect();

        if cores.is_empty() {
            for &m in &prior_members {
                self.registry.set(m, Label::Noise);
            }
            return;
        }
        if seeds.is_empty() {
            return;
        }

        let core_set: HashSet<PointId> = cores.iter().copied().collect();
        let mut union_find = UnionFind::new(seeds.len());
        let mut owner: HashMap<PointId, usize> = HashMap::new();
        let mut frontiers: Vec<VecDeque<PointId>> = Vec::with_capacity(seeds.len());
        for (i, &seed) in seeds.iter().enumerate() {
            owner.insert(seed, i);
            frontiers.push(VecDeque::from([seed]));
        }

        loop {
            let mut progressed = false;
            for i in 0..frontiers.len() {
                let Some(node) = frontiers[i].pop_front() else {
                    continue;
                };
                progressed = true;
                let coord = self.store.get(node).unwrap().coord.clone();
                for n in self.index.query(&coord) {
                    if n == node || !core_set.contains(&n) {
                        continue;
                    }
                    match owner.get(&n) {
                        None => {
                            owner.insert(n, i);
                            frontiers[i].push_back(n);
                        }
                        Some(&j) => union_find.union(i, j),
                    }
                }
            }
            if !progressed {
                break;
            }
        }

        // Safety net: fold in any core unreached by a seed's BFS.
        for &core in &cores {
            owner.entry(core).or_insert_with(|| union_find.add());
        }
        for &core in &cores {
            let coord = self.store.get(core).unwrap().coord.clone();
            let i = owner[&core];
            for n in self.index.query(&coord) {
                if n == core || !core_set.contains(&n) {
                    continue;
                }
                if let Some(&j) = owner.get(&n) {
                    union_find.union(i, j);
                }
            }
        }

        let mut groups: HashMap<usize, Vec<PointId>> = HashMap::new();
        for &core in &cores {
            let root = union_find.find(owner[&core]);
            groups.entry(root).or_default().push(core);
        }

        if groups.len() <= 1 {
            return;
        }

        let mut group_list: Vec<Vec<PointId>> = groups.into_values().collect();
        let smallest = |group: &[PointId]| -> Point<T> {
            group
                .iter()
                .map(|&id| self.store.get(id).unwrap().coord.clone())
                .fold(None, |best: Option<Point<T>>, coord| match best {
                    None => Some(coord),
                    Some(current) => {
                        if lexicographically_less(&coord, &current) {
                            Some(coord)
                        } else {
                            Some(current)
                        }
                    }
                })
                .unwrap()
        };
        group_list.sort_by(|a, b| {
            b.len().cmp(&a.len()).then_with(|| {
                let a_min = smallest(a);
                let b_min = smallest(b);
                if lexicographically_less(&a_min, &b_min) {
                    std::cmp::Ordering::Less
                } else if lexicographically_less(&b_min, &a_min) {
                    std::cmp::Ordering::Greater
                } else {
                    std::cmp::Ordering::Equal
                }
            })
        });

        let prior_member_set: HashSet<PointId> = prior_members.into_iter().collect();
        for (index, group) in group_list.into_iter().enumerate() {
            let identity = if index == 0 {
                c
            } else {
                self.registry.fresh_identity()
            };
            for &core_point in &group {
                self.registry.set(core_point, Label::Cluster(identity));
                let coord = self.store.get(core_point).unwrap().coord.clone();
                for n in self.index.query(&coord) {
                    if n == core_point || self.is_core(n) || !prior_member_set.contains(&n) {
                        continue;
                    }
                    self.registry.set(n, Label::Cluster(identity));
                }
            }
        }
    }
}

/// Lexicographic comparison of two equal-length coordinate vectors.
fn lexicographically_less<T>(a: &[T], b: &[T]) -> bool
where
    T: FloatNumber,
{
    for (x, y) in a.iter().zip(b.iter()) {
        match x.partial_cmp(y) {
            Some(std::cmp::Ordering::Less) => return true,
            Some(std::cmp::Ordering::Greater) => return false,
            _ => continue,
        }
    }
    false
}

/// A minimal union-find over a dynamically growing set of indices, used to
/// merge BFS frontiers as they meet during split detection.
#[derive(Debug)]
struct UnionFind {
    parent: Vec<usize>,
}

impl UnionFind {
    fn new(size: usize) -> Self {
        Self {
            parent: (0..size).collect(),
        }
    }

    fn add(&mut self) -> usize {
        let index = self.parent.len();
        self.parent.push(index);
        index
    }

    fn find(&mut self, x: usize) -> usize {
        if self.parent[x] != x {
            let root = self.find(self.parent[x]);
            self.parent[x] = root;
        }
        self.parent[x]
    }

    fn union(&mut self, a: usize, b: usize) {
        let (root_a, root_b) = (self.find(a), self.find(b));
        if root_a != root_b {
            self.parent[root_a] = root_b;
        }
    }
}
