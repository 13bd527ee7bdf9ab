//! Region quadtree over places.
//!
//! Each node is either a leaf holding up to `capacity` places directly, or an
//! internal node that owns exactly four children (NE, NW, SE, SW) and holds
//! nothing itself. Leaves split when they reach capacity and merge back when
//! removal empties all four children.

use tracing::{debug, trace, warn};

use crate::place::{Place, ServiceMask};
use crate::rectangle::{Quadrant, Rectangle};

/// Default depth cutoff below which nodes stop splitting.
pub const DEFAULT_MAX_DEPTH: u32 = 32;

/// Hard ceiling on `max_depth`. Insertion and removal recurse once per level.
pub const MAX_DEPTH_LIMIT: u32 = 64;

/// How many places a leaf may hold before it splits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapacityPolicy {
    /// Same capacity at every depth.
    Fixed(usize),
    /// `base + floor(ln(depth + 1) * base)`: deeper nodes hold more.
    Logarithmic { base: usize },
}

impl CapacityPolicy {
    /// Capacity of a node at `depth`. Never less than 1.
    pub fn capacity_at(self, depth: u32) -> usize {
        let cap = match self {
            CapacityPolicy::Fixed(n) => n,
            CapacityPolicy::Logarithmic { base } => {
                base + ((depth as f64 + 1.0).ln() * base as f64) as usize
            }
        };
        cap.max(1)
    }
}

impl Default for CapacityPolicy {
    fn default() -> Self {
        CapacityPolicy::Logarithmic { base: 10 }
    }
}

/// Outcome of a batch insert.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub inserted: usize,
    /// Places skipped because they fell outside the boundary.
    pub rejected: usize,
}

impl BatchReport {
    fn merge(&mut self, other: BatchReport) {
        self.inserted += other.inserted;
        self.rejected += other.rejected;
    }
}

/// Statistics about a quadtree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuadTreeStats {
    pub node_count: usize,
    pub leaf_count: usize,
    pub place_count: usize,
    /// Deepest node depth (root = 0).
    pub max_depth: u32,
}

/// Quadtree node. The root is just a node at depth 0.
#[derive(Debug, Clone)]
pub struct QuadTree {
    boundary: Rectangle,
    policy: CapacityPolicy,
    max_depth: u32,
    depth: u32,
    /// Places held directly. Always empty once divided.
    items: Vec<Place>,
    /// Children in [`Quadrant::ALL`] order, present iff divided.
    children: Option<Box<[QuadTree; 4]>>,
}

impl QuadTree {
    /// Create an empty root covering `boundary`.
    pub fn new(boundary: Rectangle, policy: CapacityPolicy) -> Self {
        Self::with_max_depth(boundary, policy, DEFAULT_MAX_DEPTH)
    }

    /// Create an empty root that stops splitting at `max_depth`, clamped to
    /// [`MAX_DEPTH_LIMIT`].
    pub fn with_max_depth(boundary: Rectangle, policy: CapacityPolicy, max_depth: u32) -> Self {
        if max_depth > MAX_DEPTH_LIMIT {
            warn!(max_depth, limit = MAX_DEPTH_LIMIT, "Clamping quadtree max depth");
        }
        Self::node(boundary, policy, max_depth.min(MAX_DEPTH_LIMIT), 0)
    }

    /// Depth at which nodes stop splitting.
    #[inline]
    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    fn node(boundary: Rectangle, policy: CapacityPolicy, max_depth: u32, depth: u32) -> Self {
        let capacity = policy.capacity_at(depth);
        Self {
            boundary,
            policy,
            max_depth,
            depth,
            items: Vec::with_capacity(capacity.min(64)),
            children: None,
        }
    }

    #[inline]
    pub fn boundary(&self) -> &Rectangle {
        &self.boundary
    }

    #[inline]
    pub fn depth(&self) -> u32 {
        self.depth
    }

    #[inline]
    pub fn policy(&self) -> CapacityPolicy {
        self.policy
    }

    /// Capacity of this node under its policy.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.policy.capacity_at(self.depth)
    }

    #[inline]
    pub fn is_divided(&self) -> bool {
        self.children.is_some()
    }

    /// Places held directly by this node (empty for internal nodes).
    #[inline]
    pub fn items(&self) -> &[Place] {
        &self.items
    }

    /// Child for `quadrant`, if this node is divided.
    pub fn child(&self, quadrant: Quadrant) -> Option<&QuadTree> {
        self.children.as_ref().map(|c| &c[quadrant.index()])
    }

    /// Whether this node may still split.
    #[inline]
    fn can_split(&self) -> bool {
        self.depth < self.max_depth
    }

    /// Empty leaf: no items and no children.
    #[inline]
    fn is_empty_leaf(&self) -> bool {
        self.items.is_empty() && self.children.is_none()
    }

    /// Insert a place. Returns `false` if it lies outside this node's boundary.
    pub fn insert(&mut self, place: Place) -> bool {
        if !self.boundary.contains_point(place.position) {
            warn!(
                x = place.x(),
                y = place.y(),
                boundary = %self.boundary,
                "Place out of bounds"
            );
            return false;
        }
        self.insert_contained(place);
        true
    }

    /// Insert a place already known to lie inside this node.
    fn insert_contained(&mut self, place: Place) {
        if self.children.is_none() && self.items.len() >= self.capacity() && self.can_split() {
            self.subdivide();
        }

        match &mut self.children {
            None => self.items.push(place),
            Some(children) => {
                let q = self.boundary.quadrant_of(place.x(), place.y());
                let inserted = children[q.index()].insert(place);
                assert!(inserted, "quadrant routing disagrees with child boundary");
            }
        }
    }

    /// Split this leaf into four children and push its items down.
    ///
    /// No-op if already divided.
    pub fn subdivide(&mut self) {
        if self.children.is_some() {
            return;
        }

        let depth = self.depth + 1;
        let child = |q: Quadrant| {
            QuadTree::node(self.boundary.subdivide(q), self.policy, self.max_depth, depth)
        };
        let mut children = Box::new(Quadrant::ALL.map(child));

        trace!(
            depth = self.depth,
            items = self.items.len(),
            boundary = %self.boundary,
            "Subdividing node"
        );

        for place in self.items.drain(..) {
            let q = self.boundary.quadrant_of(place.x(), place.y());
            let inserted = children[q.index()].insert(place);
            assert!(inserted, "quadrant routing disagrees with child boundary");
        }
        self.children = Some(children);
    }

    /// Insert many places at once.
    ///
    /// Produces the same set of stored places as inserting each one in turn.
    /// A leaf decides once whether the whole batch fits; an internal node
    /// splits the batch per quadrant and recurses. Out-of-bounds places are
    /// skipped and counted.
    pub fn insert_batch(&mut self, batch: Vec<Place>) -> BatchReport {
        let mut report = BatchReport::default();
        if batch.is_empty() {
            return report;
        }

        let (inside, outside): (Vec<Place>, Vec<Place>) = batch
            .into_iter()
            .partition(|p| self.boundary.contains_point(p.position));
        if !outside.is_empty() {
            warn!(
                rejected = outside.len(),
                boundary = %self.boundary,
                "Batch contained places out of bounds"
            );
        }
        report.rejected = outside.len();
        report.merge(self.insert_batch_contained(inside));
        report
    }

    fn insert_batch_contained(&mut self, batch: Vec<Place>) -> BatchReport {
        let count = batch.len();
        if count == 0 {
            return BatchReport::default();
        }

        if self.children.is_none()
            && self.items.len() + count > self.capacity()
            && self.can_split()
        {
            self.subdivide();
        }

        let Some(children) = &mut self.children else {
            self.items.extend(batch);
            return BatchReport { inserted: count, rejected: 0 };
        };

        let mut parts: [Vec<Place>; 4] = Default::default();
        for place in batch {
            let q = self.boundary.quadrant_of(place.x(), place.y());
            parts[q.index()].push(place);
        }

        let mut report = BatchReport::default();
        for (child, part) in children.iter_mut().zip(parts) {
            report.merge(child.insert_batch_contained(part));
        }
        report
    }

    /// All places inside `range` whose services intersect `filter`.
    ///
    /// Children are visited in NE, NW, SE, SW order, so the result order is
    /// stable for a given tree.
    pub fn query(&self, range: &Rectangle, filter: Option<ServiceMask>) -> Vec<Place> {
        let mut found = Vec::new();
        self.query_into(range, filter, &mut found);
        found
    }

    /// Like [`QuadTree::query`] but appends into `found`.
    pub fn query_into(&self, range: &Rectangle, filter: Option<ServiceMask>, found: &mut Vec<Place>) {
        if !self.boundary.intersects(range) {
            return;
        }

        found.extend(
            self.items
                .iter()
                .filter(|p| range.contains_point(p.position) && p.matches(filter))
                .copied(),
        );

        if let Some(children) = &self.children {
            for child in children.iter() {
                child.query_into(range, filter, found);
            }
        }
    }

    /// Place stored at exactly `(x, y)`.
    pub fn find_place(&self, x: f64, y: f64) -> Option<&Place> {
        let cell = Rectangle::new(x, y, 1.0, 1.0);
        self.find_in(&cell, x, y)
    }

    fn find_in(&self, cell: &Rectangle, x: f64, y: f64) -> Option<&Place> {
        if !self.boundary.intersects(cell) {
            return None;
        }
        if let Some(place) = self.items.iter().find(|p| p.is_at(x, y)) {
            return Some(place);
        }
        self.children
            .as_ref()?
            .iter()
            .find_map(|child| child.find_in(cell, x, y))
    }

    /// Services of the place at exactly `(x, y)`.
    ///
    /// Coordinates are not reachable through this, so an edit can never move
    /// a place out of the leaf that owns it.
    pub fn services_mut(&mut self, x: f64, y: f64) -> Option<&mut ServiceMask> {
        self.leaf_for_mut(x, y)?
            .items
            .iter_mut()
            .find(|p| p.is_at(x, y))
            .map(|p| &mut p.services)
    }

    /// Leaf that owns `(x, y)`, if the point is inside this node.
    pub fn leaf_for(&self, x: f64, y: f64) -> Option<&QuadTree> {
        if !self.boundary.contains(x, y) {
            return None;
        }
        let mut node = self;
        while let Some(children) = &node.children {
            node = &children[node.boundary.quadrant_of(x, y).index()];
        }
        Some(node)
    }

    fn leaf_for_mut(&mut self, x: f64, y: f64) -> Option<&mut QuadTree> {
        if !self.boundary.contains(x, y) {
            return None;
        }
        let mut node = self;
        while node.children.is_some() {
            let q = node.boundary.quadrant_of(x, y);
            node = &mut node.children.as_mut()?[q.index()];
        }
        Some(node)
    }

    /// Remove the place at `place`'s coordinates.
    pub fn remove(&mut self, place: &Place) -> bool {
        self.remove_at(place.x(), place.y()).is_some()
    }

    /// Remove and return the place at exactly `(x, y)`, merging emptied
    /// subtrees on the way back to this node.
    pub fn remove_at(&mut self, x: f64, y: f64) -> Option<Place> {
        if !self.boundary.contains(x, y) {
            return None;
        }

        let Some(children) = &mut self.children else {
            let idx = self.items.iter().position(|p| p.is_at(x, y))?;
            return Some(self.items.swap_remove(idx));
        };

        let q = self.boundary.quadrant_of(x, y);
        let removed = children[q.index()].remove_at(x, y)?;
        self.try_merge();
        Some(removed)
    }

    /// Drop the children if all four are empty leaves.
    ///
    /// Only looks one level down; a merge here may enable one in the parent.
    pub fn try_merge(&mut self) -> bool {
        let Some(children) = &self.children else {
            return false;
        };
        if !children.iter().all(QuadTree::is_empty_leaf) {
            return false;
        }

        debug!(depth = self.depth, boundary = %self.boundary, "Merging empty children");
        self.children = None;
        true
    }

    /// Total number of places under this node.
    pub fn len(&self) -> usize {
        self.items.len()
            + self
                .children
                .as_ref()
                .map_or(0, |c| c.iter().map(QuadTree::len).sum::<usize>())
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
            && self
                .children
                .as_ref()
                .is_none_or(|c| c.iter().all(QuadTree::is_empty))
    }

    /// Remove every place and collapse back to a single leaf.
    pub fn clear(&mut self) {
        self.items.clear();
        self.children = None;
    }

    /// Every stored place in traversal order.
    pub fn iter(&self) -> impl Iterator<Item = &Place> {
        let mut stack = vec![self];
        let mut current: std::slice::Iter<'_, Place> = Default::default();
        std::iter::from_fn(move || loop {
            if let Some(place) = current.next() {
                return Some(place);
            }
            let node = stack.pop()?;
            current = node.items.iter();
            if let Some(children) = &node.children {
                stack.extend(children.iter().rev());
            }
        })
    }

    pub fn stats(&self) -> QuadTreeStats {
        let mut stats = QuadTreeStats::default();
        self.collect_stats(&mut stats);
        stats
    }

    fn collect_stats(&self, stats: &mut QuadTreeStats) {
        stats.node_count += 1;
        stats.place_count += self.items.len();
        stats.max_depth = stats.max_depth.max(self.depth);
        match &self.children {
            None => stats.leaf_count += 1,
            Some(children) => {
                for child in children.iter() {
                    child.collect_stats(stats);
                }
            }
        }
    }
}
