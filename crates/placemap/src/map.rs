//! Place map facade.
//!
//! Owns the quadtree, shares the service registry, and buffers inbound
//! inserts so bulk loads hit the tree in large batches.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use spatial::{BatchReport, CapacityPolicy, Place, QuadTree, Rectangle, ServiceMask};
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{MapError, RegistryError};
use crate::registry::ServiceRegistry;

/// Requested change to a place's services.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceAction {
    Add,
    Remove,
}

impl FromStr for ServiceAction {
    type Err = MapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "add" => Ok(ServiceAction::Add),
            "remove" => Ok(ServiceAction::Remove),
            _ => Err(MapError::InvalidAction(s.to_string())),
        }
    }
}

/// Result of a service edit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EditOutcome {
    /// The bit was flipped; holds the updated place.
    Applied(Place),
    /// The place already had the requested state.
    Unchanged(Place),
}

impl EditOutcome {
    pub fn place(&self) -> &Place {
        match self {
            EditOutcome::Applied(p) | EditOutcome::Unchanged(p) => p,
        }
    }

    pub fn changed(&self) -> bool {
        matches!(self, EditOutcome::Applied(_))
    }
}

/// A 2D map of service-tagged places.
#[derive(Debug)]
pub struct PlaceMap {
    tree: QuadTree,
    registry: Arc<ServiceRegistry>,
    /// Places accepted by `add_place` but not yet in the tree.
    pending: Vec<Place>,
    batch_size: usize,
}

impl PlaceMap {
    /// Create an empty map covering `boundary`.
    pub fn new(
        boundary: Rectangle,
        policy: CapacityPolicy,
        max_depth: u32,
        batch_size: usize,
        registry: Arc<ServiceRegistry>,
    ) -> Self {
        Self {
            tree: QuadTree::with_max_depth(boundary, policy, max_depth),
            registry,
            pending: Vec::with_capacity(batch_size.min(1 << 16)),
            batch_size,
        }
    }

    /// Create a map from a validated config.
    pub fn from_config(config: &Config, registry: Arc<ServiceRegistry>) -> Self {
        Self::new(
            config.map.boundary(),
            config.tree.policy(),
            config.tree.max_depth,
            config.loader.batch_size,
            registry,
        )
    }

    #[inline]
    pub fn registry(&self) -> &ServiceRegistry {
        &self.registry
    }

    #[inline]
    pub fn boundary(&self) -> &Rectangle {
        self.tree.boundary()
    }

    /// Underlying tree. Does not include buffered places; call [`PlaceMap::flush`] first.
    #[inline]
    pub fn tree(&self) -> &QuadTree {
        &self.tree
    }

    #[inline]
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Number of places, buffered ones included.
    pub fn len(&self) -> usize {
        self.tree.len() + self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty() && self.tree.is_empty()
    }

    /// Add a place. Out-of-bounds coordinates are rejected immediately, even
    /// when the insert is buffered.
    pub fn add_place(&mut self, x: f64, y: f64, services: ServiceMask) -> Result<(), MapError> {
        if !self.tree.boundary().contains(x, y) {
            return Err(MapError::OutOfBounds { x, y });
        }

        let place = Place::new(x, y, services);
        if self.batch_size <= 1 {
            if !self.tree.insert(place) {
                return Err(MapError::OutOfBounds { x, y });
            }
            return Ok(());
        }

        self.pending.push(place);
        if self.pending.len() >= self.batch_size {
            self.flush();
        }
        Ok(())
    }

    /// Push buffered places into the tree.
    pub fn flush(&mut self) -> BatchReport {
        if self.pending.is_empty() {
            return BatchReport::default();
        }
        let batch = std::mem::replace(&mut self.pending, Vec::with_capacity(self.batch_size.min(1 << 16)));
        let report = self.tree.insert_batch(batch);
        debug!(
            inserted = report.inserted,
            rejected = report.rejected,
            total = self.tree.len(),
            "Flushed place batch"
        );
        report
    }

    /// Place stored at exactly `(x, y)`.
    pub fn find_place(&mut self, x: f64, y: f64) -> Option<Place> {
        self.flush();
        self.tree.find_place(x, y).copied()
    }

    /// Add or remove one named service on the place at `(x, y)`.
    pub fn edit_place_services(
        &mut self,
        x: f64,
        y: f64,
        action: ServiceAction,
        service_name: &str,
    ) -> Result<EditOutcome, MapError> {
        self.flush();

        let index = self.registry.name_to_index(service_name).map_err(|e| match e {
            RegistryError::NotFound(name) => MapError::InvalidServiceName(name),
            other => MapError::Registry(other),
        })?;
        let services = self
            .tree
            .services_mut(x, y)
            .ok_or(MapError::NotFound { x, y })?;

        let changed = match action {
            ServiceAction::Add => services.insert(index),
            ServiceAction::Remove => services.remove(index),
        };
        let place = Place::new(x, y, *services);
        if changed {
            info!(x, y, service = service_name, ?action, "Updated place services");
            Ok(EditOutcome::Applied(place))
        } else {
            debug!(x, y, service = service_name, ?action, "Service already in requested state");
            Ok(EditOutcome::Unchanged(place))
        }
    }

    /// Remove the place at `(x, y)`.
    pub fn remove_place(&mut self, x: f64, y: f64) -> Result<Place, MapError> {
        self.flush();
        let removed = self.tree.remove_at(x, y).ok_or(MapError::NotFound { x, y })?;
        info!(x, y, "Removed place");
        Ok(removed)
    }

    /// All places in `area` offering any service in `filter`.
    pub fn search(&mut self, area: &Rectangle, filter: Option<ServiceMask>) -> Vec<Place> {
        self.flush();
        self.tree.query(area, filter)
    }

    /// Like [`PlaceMap::search`] with the filter given by service names.
    /// An empty name list means no filter.
    pub fn search_services<S: AsRef<str>>(
        &mut self,
        area: &Rectangle,
        names: &[S],
    ) -> Result<Vec<Place>, MapError> {
        let filter = if names.is_empty() {
            None
        } else {
            Some(self.registry.mask_for(names).map_err(|e| match e {
                RegistryError::NotFound(name) => MapError::InvalidServiceName(name),
                other => MapError::Registry(other),
            })?)
        };
        Ok(self.search(area, filter))
    }

    /// Render a place with its service names.
    pub fn describe<'a>(&'a self, place: &'a Place) -> Described<'a> {
        Described {
            place,
            registry: &self.registry,
        }
    }
}

/// Display adapter returned by [`PlaceMap::describe`].
pub struct Described<'a> {
    place: &'a Place,
    registry: &'a ServiceRegistry,
}

impl fmt::Display for Described<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Place{{x={}, y={}, services={}}}",
            self.place.x(),
            self.place.y(),
            self.registry.names_in(self.place.services).join(", ")
        )
    }
}
