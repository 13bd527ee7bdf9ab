//! Service-tagged place map.
//!
//! Wraps the `spatial` quadtree with a service registry, TOML configuration
//! and buffered bulk loading.

pub mod config;
pub mod error;
pub mod map;
pub mod registry;

// Re-export commonly used types
pub use config::Config;
pub use error::{ConfigError, MapError, RegistryError};
pub use map::{Described, EditOutcome, PlaceMap, ServiceAction};
pub use registry::{ServiceRegistry, DEFAULT_SERVICES};
pub use spatial::{
    BatchReport, CapacityPolicy, KdTree, Place, Quadrant, QuadTree, Rectangle, ServiceMask,
};
