//! Spatial core for placemap.
//!
//! This crate contains:
//! - `Rectangle` and `Quadrant` geometry (min-corner, half-open)
//! - `Place` records and their `ServiceMask`
//! - The region `QuadTree` with insert, batch insert, query, lookup, removal and merge
//! - A plain 2-d `KdTree` keyed by exact coordinates

mod error;
mod kdtree;
mod place;
mod quadtree;
mod rectangle;

pub use error::SpatialError;
pub use kdtree::KdTree;
pub use place::{Place, ServiceMask};
pub use quadtree::{BatchReport, CapacityPolicy, QuadTree, QuadTreeStats, DEFAULT_MAX_DEPTH, MAX_DEPTH_LIMIT};
pub use rectangle::{Quadrant, Rectangle};
