//! Places and their service bitmask.

use std::fmt;
use std::ops::{BitAnd, BitOr};

use glam::DVec2;

/// Fixed-width service bitmask. Bit `i` marks membership in service `i`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ServiceMask(pub u32);

impl ServiceMask {
    /// Number of distinct services a mask can hold.
    pub const BITS: usize = u32::BITS as usize;

    pub const EMPTY: ServiceMask = ServiceMask(0);

    #[inline]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    #[inline]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Mask with a single service set. Indices past [`ServiceMask::BITS`] yield an empty mask.
    #[inline]
    pub fn single(index: usize) -> Self {
        if index < Self::BITS {
            Self(1 << index)
        } else {
            Self::EMPTY
        }
    }

    #[inline]
    pub fn contains(self, index: usize) -> bool {
        index < Self::BITS && self.0 & (1 << index) != 0
    }

    /// Set a service bit. Returns `false` if it was already set.
    #[inline]
    pub fn insert(&mut self, index: usize) -> bool {
        let had = self.contains(index);
        self.0 |= Self::single(index).0;
        !had
    }

    /// Clear a service bit. Returns `false` if it was not set.
    #[inline]
    pub fn remove(&mut self, index: usize) -> bool {
        let had = self.contains(index);
        self.0 &= !Self::single(index).0;
        had
    }

    /// True if the two masks share at least one service.
    #[inline]
    pub fn intersects(self, other: ServiceMask) -> bool {
        self.0 & other.0 != 0
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub fn count(self) -> u32 {
        self.0.count_ones()
    }

    /// Indices of the set bits, lowest first.
    pub fn iter(self) -> impl Iterator<Item = usize> {
        (0..Self::BITS).filter(move |&i| self.contains(i))
    }
}

impl From<u32> for ServiceMask {
    fn from(bits: u32) -> Self {
        Self(bits)
    }
}

impl BitOr for ServiceMask {
    type Output = ServiceMask;

    fn bitor(self, rhs: Self) -> Self::Output {
        ServiceMask(self.0 | rhs.0)
    }
}

impl BitAnd for ServiceMask {
    type Output = ServiceMask;

    fn bitand(self, rhs: Self) -> Self::Output {
        ServiceMask(self.0 & rhs.0)
    }
}

impl FromIterator<usize> for ServiceMask {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        let mut mask = ServiceMask::EMPTY;
        for index in iter {
            mask.insert(index);
        }
        mask
    }
}

impl fmt::Binary for ServiceMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Binary::fmt(&self.0, f)
    }
}

/// A point-like record tagged with services.
///
/// Identity for lookup and removal is the exact coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Place {
    pub position: DVec2,
    pub services: ServiceMask,
}

impl Place {
    #[inline]
    pub fn new(x: f64, y: f64, services: ServiceMask) -> Self {
        Self {
            position: DVec2::new(x, y),
            services,
        }
    }

    #[inline]
    pub fn x(&self) -> f64 {
        self.position.x
    }

    #[inline]
    pub fn y(&self) -> f64 {
        self.position.y
    }

    /// Exact coordinate match.
    #[inline]
    pub fn is_at(&self, x: f64, y: f64) -> bool {
        self.position.x == x && self.position.y == y
    }

    /// Enable or disable one service.
    #[inline]
    pub fn toggle_service(&mut self, index: usize, enable: bool) -> bool {
        if enable {
            self.services.insert(index)
        } else {
            self.services.remove(index)
        }
    }

    #[inline]
    pub fn has_service(&self, index: usize) -> bool {
        self.services.contains(index)
    }

    /// Filter test used by range queries: no filter matches everything.
    #[inline]
    pub fn matches(&self, filter: Option<ServiceMask>) -> bool {
        filter.is_none_or(|mask| self.services.intersects(mask))
    }
}

impl fmt::Display for Place {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Place{{x={}, y={}, services={:#b}}}",
            self.position.x, self.position.y, self.services
        )
    }
}
