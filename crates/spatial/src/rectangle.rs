//! Axis-aligned rectangles and quadrant subdivision.
//!
//! Rectangles use the min-corner convention: `(x, y)` is the top-left corner
//! and the extent grows right and down. Containment is half-open (closed on the
//! left/top edge, open on the right/bottom edge), so a point on an edge shared
//! by two siblings belongs to exactly one of them.

use std::fmt;
use std::str::FromStr;

use glam::DVec2;

use crate::error::SpatialError;

/// One of the four children of a subdivided region.
///
/// North is the smaller-y half, east the larger-x half.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quadrant {
    NorthEast,
    NorthWest,
    SouthEast,
    SouthWest,
}

impl Quadrant {
    /// All quadrants in child-slot order.
    pub const ALL: [Quadrant; 4] = [
        Quadrant::NorthEast,
        Quadrant::NorthWest,
        Quadrant::SouthEast,
        Quadrant::SouthWest,
    ];

    /// Child-slot index of this quadrant.
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            Quadrant::NorthEast => 0,
            Quadrant::NorthWest => 1,
            Quadrant::SouthEast => 2,
            Quadrant::SouthWest => 3,
        }
    }

    pub fn from_index(index: usize) -> Result<Self, SpatialError> {
        Self::ALL
            .get(index)
            .copied()
            .ok_or_else(|| SpatialError::InvalidQuadrant(index.to_string()))
    }

    #[inline]
    const fn is_east(self) -> bool {
        matches!(self, Quadrant::NorthEast | Quadrant::SouthEast)
    }

    #[inline]
    const fn is_south(self) -> bool {
        matches!(self, Quadrant::SouthEast | Quadrant::SouthWest)
    }
}

impl FromStr for Quadrant {
    type Err = SpatialError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ne" | "northeast" => Ok(Quadrant::NorthEast),
            "nw" | "northwest" => Ok(Quadrant::NorthWest),
            "se" | "southeast" => Ok(Quadrant::SouthEast),
            "sw" | "southwest" => Ok(Quadrant::SouthWest),
            _ => Err(SpatialError::InvalidQuadrant(s.to_string())),
        }
    }
}

impl fmt::Display for Quadrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Quadrant::NorthEast => "ne",
            Quadrant::NorthWest => "nw",
            Quadrant::SouthEast => "se",
            Quadrant::SouthWest => "sw",
        };
        f.write_str(name)
    }
}

/// Axis-aligned bounding rectangle.
///
/// Stored as min/max corners so that subdivision splits at one midpoint value
/// shared by both halves.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rectangle {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Rectangle {
    /// Create a rectangle from its top-left corner and extent.
    ///
    /// Negative extents are clamped to zero.
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self {
            min_x: x,
            min_y: y,
            max_x: x + w.max(0.0),
            max_y: y + h.max(0.0),
        }
    }

    /// Like [`Rectangle::new`] but rejects negative or non-finite extents.
    pub fn try_new(x: f64, y: f64, w: f64, h: f64) -> Result<Self, SpatialError> {
        if !(w.is_finite() && h.is_finite()) || w < 0.0 || h < 0.0 {
            return Err(SpatialError::NegativeExtent { w, h });
        }
        Ok(Self::new(x, y, w, h))
    }

    #[inline]
    pub fn from_corners(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self { min_x, min_y, max_x, max_y }
    }

    #[inline]
    pub fn x(&self) -> f64 {
        self.min_x
    }

    #[inline]
    pub fn y(&self) -> f64 {
        self.min_y
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Midpoint used for subdivision and routing.
    #[inline]
    pub fn center(&self) -> DVec2 {
        DVec2::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    /// Half-open point containment.
    #[inline]
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x < self.max_x && y >= self.min_y && y < self.max_y
    }

    #[inline]
    pub fn contains_point(&self, p: DVec2) -> bool {
        self.contains(p.x, p.y)
    }

    /// Check whether `other` lies entirely within this rectangle.
    #[inline]
    pub fn contains_rect(&self, other: &Rectangle) -> bool {
        other.min_x >= self.min_x
            && other.max_x <= self.max_x
            && other.min_y >= self.min_y
            && other.max_y <= self.max_y
    }

    /// Check if two rectangles overlap. Touching edges count.
    #[inline]
    pub fn intersects(&self, other: &Rectangle) -> bool {
        !(other.min_x > self.max_x
            || other.max_x < self.min_x
            || other.min_y > self.max_y
            || other.max_y < self.min_y)
    }

    /// Quadrant that owns `(x, y)`: one comparison per axis against the midpoint.
    ///
    /// Agrees with `self.subdivide(q).contains(x, y)` for every point inside
    /// `self`.
    #[inline]
    pub fn quadrant_of(&self, x: f64, y: f64) -> Quadrant {
        let mid = self.center();
        match (x >= mid.x, y >= mid.y) {
            (true, false) => Quadrant::NorthEast,
            (false, false) => Quadrant::NorthWest,
            (true, true) => Quadrant::SouthEast,
            (false, true) => Quadrant::SouthWest,
        }
    }

    /// Sub-rectangle for one quadrant. The four results tile `self` exactly.
    pub fn subdivide(&self, quadrant: Quadrant) -> Rectangle {
        let mid = self.center();
        let (min_x, max_x) = if quadrant.is_east() {
            (mid.x, self.max_x)
        } else {
            (self.min_x, mid.x)
        };
        let (min_y, max_y) = if quadrant.is_south() {
            (mid.y, self.max_y)
        } else {
            (self.min_y, mid.y)
        };
        Rectangle::from_corners(min_x, min_y, max_x, max_y)
    }

    /// Horizontal gap between `x` and this rectangle's span. Zero inside it.
    #[inline]
    pub fn x_distance_from(&self, x: f64) -> f64 {
        (self.min_x - x).max(x - self.max_x).max(0.0)
    }

    /// Vertical gap between `y` and this rectangle's span. Zero inside it.
    #[inline]
    pub fn y_distance_from(&self, y: f64) -> f64 {
        (self.min_y - y).max(y - self.max_y).max(0.0)
    }

    /// Squared distance from `p` to the nearest point of the rectangle.
    #[inline]
    pub fn sq_distance_from(&self, p: DVec2) -> f64 {
        let dx = self.x_distance_from(p.x);
        let dy = self.y_distance_from(p.y);
        dx * dx + dy * dy
    }

    #[inline]
    pub fn distance_from(&self, p: DVec2) -> f64 {
        self.sq_distance_from(p).sqrt()
    }
}

impl fmt::Display for Rectangle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}, {}, {}, {}]",
            self.min_x,
            self.min_y,
            self.width(),
            self.height()
        )
    }
}
