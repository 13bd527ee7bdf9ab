use std::collections::HashSet;

use proptest::collection::{hash_set, vec};
use proptest::prelude::*;
use spatial::{CapacityPolicy, KdTree, Place, QuadTree, Rectangle, ServiceMask};

const EXTENT: f64 = 1_000.0;

fn full() -> Rectangle {
    Rectangle::new(0.0, 0.0, EXTENT, EXTENT)
}

/// Distinct in-bounds places on a 0.5-unit grid, including points on
/// quadrant edges.
fn places(max: usize) -> impl Strategy<Value = Vec<Place>> {
    hash_set((0u32..2_000, 0u32..2_000), 1..max).prop_flat_map(|coords| {
        let n = coords.len();
        let coords: Vec<_> = coords.into_iter().collect();
        vec(1u32..1_024, n).prop_map(move |masks| {
            coords
                .iter()
                .zip(masks)
                .map(|(&(x, y), m)| Place::new(x as f64 / 2.0, y as f64 / 2.0, ServiceMask(m)))
                .collect()
        })
    })
}

fn range() -> impl Strategy<Value = Rectangle> {
    (-50.0..EXTENT, -50.0..EXTENT, 0.0..600.0, 0.0..600.0)
        .prop_map(|(x, y, w, h)| Rectangle::new(x, y, w, h))
}

fn policy() -> impl Strategy<Value = CapacityPolicy> {
    prop_oneof![
        Just(CapacityPolicy::Fixed(1)),
        Just(CapacityPolicy::Fixed(4)),
        Just(CapacityPolicy::Fixed(100)),
        (1usize..12).prop_map(|base| CapacityPolicy::Logarithmic { base }),
    ]
}

fn keys(places: &[Place]) -> HashSet<(u64, u64, u32)> {
    places
        .iter()
        .map(|p| (p.x().to_bits(), p.y().to_bits(), p.services.bits()))
        .collect()
}

fn build(policy: CapacityPolicy, places: &[Place]) -> QuadTree {
    let mut tree = QuadTree::new(full(), policy);
    for p in places {
        assert!(tree.insert(*p));
    }
    tree
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_no_loss_and_containment(policy in policy(), places in places(400)) {
        let tree = build(policy, &places);
        let found = tree.query(&full(), None);
        prop_assert_eq!(found.len(), places.len());
        prop_assert!(found.iter().all(|p| full().contains_point(p.position)));
        prop_assert_eq!(keys(&found), keys(&places));
    }

    #[test]
    fn prop_batch_equals_sequential(
        policy in policy(),
        places in places(400),
        ranges in vec(range(), 1..8),
    ) {
        let seq = build(policy, &places);
        let mut batch = QuadTree::new(full(), policy);
        let report = batch.insert_batch(places.clone());
        prop_assert_eq!(report.inserted, places.len());
        prop_assert_eq!(report.rejected, 0);

        for r in &ranges {
            prop_assert_eq!(keys(&seq.query(r, None)), keys(&batch.query(r, None)));
        }
    }

    #[test]
    fn prop_query_is_exact(places in places(300), ranges in vec(range(), 1..8)) {
        let tree = build(CapacityPolicy::Fixed(4), &places);
        for r in &ranges {
            let expected: Vec<Place> = places
                .iter()
                .filter(|p| r.contains_point(p.position))
                .copied()
                .collect();
            prop_assert_eq!(keys(&tree.query(r, None)), keys(&expected));
        }
    }

    #[test]
    fn prop_filter_is_subset(places in places(300), r in range(), mask in 1u32..1_024) {
        let tree = build(CapacityPolicy::Fixed(4), &places);
        let mask = ServiceMask(mask);
        let all = keys(&tree.query(&r, None));
        let filtered = tree.query(&r, Some(mask));
        prop_assert!(filtered.iter().all(|p| p.services.intersects(mask)));
        prop_assert!(keys(&filtered).is_subset(&all));
    }

    #[test]
    fn prop_remove_all_merges_root(policy in policy(), places in places(200)) {
        let mut tree = build(policy, &places);
        for p in &places {
            prop_assert!(tree.remove(p));
        }
        prop_assert!(tree.query(&full(), None).is_empty());
        prop_assert!(!tree.is_divided());
    }

    #[test]
    fn prop_kdtree_agrees_with_quadtree(places in places(300), removed in 0usize..300) {
        let mut quad = build(CapacityPolicy::Fixed(4), &places);
        let mut kd = KdTree::new();
        for p in &places {
            prop_assert!(kd.insert(*p));
        }
        prop_assert_eq!(kd.len(), places.len());
        prop_assert_eq!(keys(&kd.iter().copied().collect::<Vec<_>>()), keys(&places));

        for p in places.iter().take(removed) {
            prop_assert_eq!(kd.remove_at(p.x(), p.y()), quad.remove_at(p.x(), p.y()));
        }
        for p in &places {
            prop_assert_eq!(kd.find(p.x(), p.y()), quad.find_place(p.x(), p.y()));
        }
    }
}

#[test]
fn test_shared_edge_is_consistent_across_subdivisions() {
    let mut tree = QuadTree::new(Rectangle::new(0.0, 0.0, 100.0, 100.0), CapacityPolicy::Fixed(1));
    tree.insert(Place::new(50.0, 50.0, ServiceMask(1)));
    // Keep splitting the quadrant that holds (50, 50).
    for p in [(60.0, 60.0), (55.0, 55.0), (51.0, 51.0)] {
        tree.insert(Place::new(p.0, p.1, ServiceMask(1)));
    }
    let leaf = tree.leaf_for(50.0, 50.0).unwrap();
    assert!(leaf.boundary().contains(50.0, 50.0));
    assert_eq!(leaf.boundary().min_x, 50.0);
    assert_eq!(leaf.boundary().min_y, 50.0);
    assert_eq!(tree.query(&Rectangle::new(0.0, 0.0, 100.0, 100.0), None).len(), 4);
}
