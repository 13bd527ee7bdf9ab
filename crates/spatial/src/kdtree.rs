//! Two-dimensional k-d tree over places.
//!
//! A plain unbalanced 2-d tree keyed by place coordinates. Levels alternate
//! between splitting on x (even depth) and y (odd depth). A node's left
//! subtree holds strictly smaller values on its axis, its right subtree holds
//! equal or larger ones.
//!
//! Traversal, removal and drop are iterative, so height (which grows with
//! sorted input) never turns into recursion depth.

use std::fmt;

use glam::DVec2;

use crate::place::{Place, ServiceMask};

#[derive(Debug)]
struct KdNode {
    place: Place,
    left: Option<Box<KdNode>>,
    right: Option<Box<KdNode>>,
}

impl KdNode {
    fn new(place: Place) -> Self {
        Self {
            place,
            left: None,
            right: None,
        }
    }

    /// Place with the smallest value on `axis` in the subtree rooted here.
    fn min_along(&self, axis: usize, depth: u32) -> Place {
        let mut best = self.place;
        let mut stack = vec![(self, depth)];
        while let Some((node, d)) = stack.pop() {
            if node.place.position[axis] < best.position[axis] {
                best = node.place;
            }
            if let Some(left) = node.left.as_deref() {
                stack.push((left, d + 1));
            }
            // On its own axis the right side never holds anything smaller.
            if axis_at(d) != axis {
                if let Some(right) = node.right.as_deref() {
                    stack.push((right, d + 1));
                }
            }
        }
        best
    }
}

type Link = Option<Box<KdNode>>;

#[inline]
fn axis_at(depth: u32) -> usize {
    (depth % 2) as usize
}

/// Slot holding the node at exactly `target`, with that node's depth.
fn locate(mut slot: &mut Link, mut depth: u32, target: DVec2) -> Option<(&mut Link, u32)> {
    loop {
        let node = slot.as_ref()?;
        if node.place.position == target {
            return Some((slot, depth));
        }
        let axis = axis_at(depth);
        let go_left = target[axis] < node.place.position[axis];
        let node = slot.as_mut()?;
        slot = if go_left { &mut node.left } else { &mut node.right };
        depth += 1;
    }
}

/// Remove the node in `slot`, pulling replacements up from below.
fn delete_node(mut slot: &mut Link, mut depth: u32) {
    loop {
        // Leaf: just unlink it.
        if matches!(slot, Some(n) if n.left.is_none() && n.right.is_none()) {
            *slot = None;
            return;
        }
        let Some(node) = slot else { return };
        if node.right.is_none() {
            // Only a left subtree: move it right and pull its minimum up.
            node.right = node.left.take();
        }

        let axis = axis_at(depth);
        let Some(min) = node.right.as_deref().map(|r| r.min_along(axis, depth + 1)) else {
            return;
        };
        node.place = min;
        let Some((next, next_depth)) = locate(&mut node.right, depth + 1, min.position) else {
            return;
        };
        slot = next;
        depth = next_depth;
    }
}

/// Unbalanced 2-d tree with unique coordinates.
#[derive(Default)]
pub struct KdTree {
    root: Link,
    len: usize,
}

impl KdTree {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Insert a place. Returns `false` if a place with the same coordinates
    /// is already stored.
    pub fn insert(&mut self, place: Place) -> bool {
        let mut slot = &mut self.root;
        let mut depth = 0;
        while let Some(node) = slot {
            if node.place.position == place.position {
                return false;
            }
            let axis = axis_at(depth);
            slot = if node.place.position[axis] > place.position[axis] {
                &mut node.left
            } else {
                &mut node.right
            };
            depth += 1;
        }
        *slot = Some(Box::new(KdNode::new(place)));
        self.len += 1;
        true
    }

    /// Place stored at exactly `(x, y)`.
    pub fn find(&self, x: f64, y: f64) -> Option<&Place> {
        let target = DVec2::new(x, y);
        let mut link = self.root.as_deref();
        let mut depth = 0;
        while let Some(node) = link {
            if node.place.position == target {
                return Some(&node.place);
            }
            let axis = axis_at(depth);
            link = if target[axis] < node.place.position[axis] {
                node.left.as_deref()
            } else {
                node.right.as_deref()
            };
            depth += 1;
        }
        None
    }

    #[inline]
    pub fn contains(&self, x: f64, y: f64) -> bool {
        self.find(x, y).is_some()
    }

    /// Services of the place at `(x, y)`. Coordinates stay fixed.
    pub fn services_mut(&mut self, x: f64, y: f64) -> Option<&mut ServiceMask> {
        let (slot, _) = locate(&mut self.root, 0, DVec2::new(x, y))?;
        slot.as_mut().map(|node| &mut node.place.services)
    }

    /// Remove and return the place at exactly `(x, y)`.
    pub fn remove_at(&mut self, x: f64, y: f64) -> Option<Place> {
        let (slot, depth) = locate(&mut self.root, 0, DVec2::new(x, y))?;
        let removed = slot.as_ref()?.place;
        delete_node(slot, depth);
        self.len -= 1;
        Some(removed)
    }

    /// Every place in pre-order.
    pub fn iter(&self) -> impl Iterator<Item = &Place> {
        let mut stack: Vec<&KdNode> = self.root.as_deref().into_iter().collect();
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            stack.extend(node.right.as_deref());
            stack.extend(node.left.as_deref());
            Some(&node.place)
        })
    }

    /// Number of levels (0 when empty).
    pub fn height(&self) -> usize {
        let mut height = 0;
        let mut stack: Vec<(&KdNode, usize)> =
            self.root.as_deref().map(|n| (n, 1)).into_iter().collect();
        while let Some((node, level)) = stack.pop() {
            height = height.max(level);
            stack.extend(node.left.as_deref().map(|n| (n, level + 1)));
            stack.extend(node.right.as_deref().map(|n| (n, level + 1)));
        }
        height
    }

    pub fn clear(&mut self) {
        let mut stack: Vec<Box<KdNode>> = self.root.take().into_iter().collect();
        while let Some(mut node) = stack.pop() {
            stack.extend(node.left.take());
            stack.extend(node.right.take());
        }
        self.len = 0;
    }
}

impl Drop for KdTree {
    fn drop(&mut self) {
        self.clear();
    }
}

impl fmt::Debug for KdTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KdTree")
            .field("len", &self.len)
            .field("height", &self.height())
            .finish()
    }
}

/// Indented tree dump, one node per line.
impl fmt::Display for KdTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut stack: Vec<(&KdNode, usize, &str)> =
            self.root.as_deref().map(|n| (n, 0, "root")).into_iter().collect();
        while let Some((node, depth, side)) = stack.pop() {
            let axis = if axis_at(depth as u32) == 0 { 'x' } else { 'y' };
            writeln!(
                f,
                "{:indent$}{side} [{axis}] ({}, {}) services={:#b}",
                "",
                node.place.x(),
                node.place.y(),
                node.place.services,
                indent = depth * 2
            )?;
            stack.extend(node.right.as_deref().map(|n| (n, depth + 1, "R")));
            stack.extend(node.left.as_deref().map(|n| (n, depth + 1, "L")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn place(x: f64, y: f64) -> Place {
        Place::new(x, y, ServiceMask(1))
    }

    #[test]
    fn test_insert_and_find() {
        let mut tree = KdTree::new();
        for &(x, y) in &[(30.0, 40.0), (5.0, 25.0), (10.0, 12.0), (70.0, 70.0), (50.0, 30.0), (35.0, 45.0)] {
            assert!(tree.insert(place(x, y)));
        }
        assert_eq!(tree.len(), 6);
        assert!(tree.contains(10.0, 12.0));
        assert!(tree.contains(35.0, 45.0));
        assert!(!tree.contains(35.0, 44.0));
        assert!(!tree.insert(place(50.0, 30.0)));
        assert_eq!(tree.len(), 6);
    }

    #[test]
    fn test_remove_leaf_and_inner_nodes() {
        let mut tree = KdTree::new();
        let points = [(30.0, 40.0), (5.0, 25.0), (10.0, 12.0), (70.0, 70.0), (50.0, 30.0), (35.0, 45.0)];
        for &(x, y) in &points {
            tree.insert(place(x, y));
        }

        // Root first, then everything else.
        assert!(tree.remove_at(30.0, 40.0).is_some());
        assert!(!tree.contains(30.0, 40.0));
        for &(x, y) in &points[1..] {
            assert!(tree.contains(x, y), "lost ({x}, {y})");
        }

        assert!(tree.remove_at(5.0, 25.0).is_some());
        assert!(tree.remove_at(5.0, 25.0).is_none());
        assert_eq!(tree.len(), 4);
        for &(x, y) in &points[2..] {
            assert!(tree.remove_at(x, y).is_some(), "missing ({x}, {y})");
        }
        assert!(tree.is_empty());
        assert_eq!(tree.height(), 0);
    }

    #[test]
    fn test_random_removal_keeps_rest_reachable() {
        let mut rng = StdRng::seed_from_u64(17);
        let mut tree = KdTree::new();
        let mut points = Vec::new();
        while points.len() < 300 {
            let p = (rng.random_range(0..50) as f64, rng.random_range(0..50) as f64);
            if tree.insert(place(p.0, p.1)) {
                points.push(p);
            }
        }

        for (i, &(x, y)) in points.iter().enumerate() {
            assert!(tree.remove_at(x, y).is_some(), "missing ({x}, {y})");
            if i % 25 == 0 {
                for &(rx, ry) in &points[i + 1..] {
                    assert!(tree.contains(rx, ry), "lost ({rx}, {ry}) after removing ({x}, {y})");
                }
            }
        }
        assert!(tree.is_empty());
    }

    #[test]
    fn test_services_mut_keeps_coordinates() {
        let mut tree = KdTree::new();
        tree.insert(place(1.0, 2.0));
        tree.insert(place(3.0, 4.0));
        tree.services_mut(3.0, 4.0).unwrap().insert(5);
        assert_eq!(tree.find(3.0, 4.0).unwrap().services, ServiceMask(0b10_0001));
        assert!(tree.services_mut(9.0, 9.0).is_none());
    }

    #[test]
    fn test_sorted_input_does_not_recurse() {
        let mut tree = KdTree::new();
        for i in 0..20_000 {
            tree.insert(place(i as f64, i as f64));
        }
        assert_eq!(tree.height(), 20_000);
        assert!(tree.contains(19_999.0, 19_999.0));
        assert_eq!(tree.iter().count(), 20_000);
        assert!(tree.remove_at(0.0, 0.0).is_some());
        assert_eq!(tree.len(), 19_999);
    }

    #[test]
    fn test_display() {
        let mut tree = KdTree::new();
        tree.insert(Place::new(30.0, 40.0, ServiceMask(0b1)));
        tree.insert(Place::new(5.0, 25.0, ServiceMask(0b10)));
        tree.insert(Place::new(70.0, 70.0, ServiceMask(0b11)));
        assert_eq!(
            tree.to_string(),
            "root [x] (30, 40) services=0b1\n  L [y] (5, 25) services=0b10\n  R [y] (70, 70) services=0b11\n"
        );
    }
}
