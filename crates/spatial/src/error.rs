//! Spatial error types.

use thiserror::Error;

/// Errors raised by the geometry layer.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SpatialError {
    /// A quadrant name or index that does not map to NE/NW/SE/SW.
    #[error("Invalid quadrant: {0}")]
    InvalidQuadrant(String),

    #[error("Rectangle extent must be finite and non-negative (w={w}, h={h})")]
    NegativeExtent { w: f64, h: f64 },
}
