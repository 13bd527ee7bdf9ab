//! Placemap - bulk-load and query demo

use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use placemap::{Config, KdTree, PlaceMap, Quadrant, ServiceAction, ServiceMask};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Placemap v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = Config::load()?;
    let registry = Arc::new(config.services.registry()?);
    info!("Loaded configuration");
    info!("  Map: {}", config.map.boundary());
    info!("  Capacity: {:?}, max depth {}", config.tree.policy(), config.tree.max_depth);
    info!("  Batch size: {}", config.loader.batch_size);
    info!("  Services: {}", registry.all_names().join(", "));

    let mut map = PlaceMap::from_config(&config, registry.clone());
    let mut rng = match config.demo.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_rng(&mut rand::rng()),
    };

    // Spread places evenly over the four quadrants
    let boundary = *map.boundary();
    let start = Instant::now();
    let mut rejected = 0usize;
    for i in 0..config.demo.places {
        let area = boundary.subdivide(Quadrant::ALL[i % 4]);
        let x = rng.random_range(area.min_x..area.max_x);
        let y = rng.random_range(area.min_y..area.max_y);
        let services = random_services(&mut rng, registry.len());
        if map.add_place(x, y, services).is_err() {
            rejected += 1;
        }
    }
    let report = map.flush();
    rejected += report.rejected;
    info!(
        "Inserted {} places in {:.2} ms ({} rejected)",
        map.len(),
        start.elapsed().as_secs_f64() * 1e3,
        rejected
    );

    let stats = map.tree().stats();
    info!(
        "Tree: {} nodes, {} leaves, depth {}",
        stats.node_count, stats.leaf_count, stats.max_depth
    );

    // Query the whole map
    let area = boundary;
    let start = Instant::now();
    let found = map.search(&area, None);
    info!(
        "Query within {} completed in {:.2} ms, found {} places",
        area,
        start.elapsed().as_secs_f64() * 1e3,
        found.len()
    );
    for place in found.iter().take(config.demo.print_limit) {
        println!("{}", map.describe(place));
    }

    // Exact-coordinate index over the same places
    let start = Instant::now();
    let mut index = KdTree::new();
    for place in &found {
        index.insert(*place);
    }
    info!(
        "Built k-d tree of {} places (height {}) in {:.2} ms",
        index.len(),
        index.height(),
        start.elapsed().as_secs_f64() * 1e3
    );

    let Some(chosen) = found.get(found.len() / 2).copied() else {
        warn!("Map is empty, nothing to edit");
        return Ok(());
    };
    println!("Chosen place: {}", map.describe(&chosen));
    if index.find(chosen.x(), chosen.y()).is_none() {
        warn!("Chosen place missing from k-d tree");
    }

    let service = registry
        .index_to_name(1.min(registry.len().saturating_sub(1)))
        .context("service registry is empty")?
        .to_string();
    let outcome = map.edit_place_services(chosen.x(), chosen.y(), ServiceAction::Add, &service)?;
    if outcome.changed() {
        println!("Added '{}': {}", service, map.describe(outcome.place()));
    } else {
        println!("Place already has '{}': {}", service, map.describe(outcome.place()));
    }

    let removed = map.remove_place(chosen.x(), chosen.y())?;
    println!("Removed: {}", map.describe(&removed));

    index.remove_at(chosen.x(), chosen.y());

    let after = map.search(&area, None);
    info!("Found {} places after removal ({} in k-d tree)", after.len(), index.len());

    Ok(())
}

/// One to three random services.
fn random_services(rng: &mut impl Rng, service_count: usize) -> ServiceMask {
    if service_count == 0 {
        return ServiceMask::EMPTY;
    }
    let count = rng.random_range(1..=3);
    (0..count).map(|_| rng.random_range(0..service_count)).collect()
}
