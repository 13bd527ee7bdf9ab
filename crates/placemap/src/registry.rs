//! Service name registry.
//!
//! A fixed name ↔ index table built once at startup and shared read-only.
//! Index `i` is bit `i` of a [`ServiceMask`].

use spatial::ServiceMask;

use crate::error::RegistryError;

/// Service names used when the config does not override them.
pub const DEFAULT_SERVICES: [&str; 10] = [
    "Cafe",
    "Restaurant",
    "Gas Station",
    "Library",
    "Hospital",
    "School",
    "Store",
    "Park",
    "Hotel",
    "Gym",
];

/// Read-only table of service names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceRegistry {
    names: Vec<String>,
}

impl ServiceRegistry {
    /// Build a registry. Names must be non-empty, unique (ignoring case) and
    /// fit in a [`ServiceMask`].
    pub fn new<I, S>(names: I) -> Result<Self, RegistryError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(|s| s.into().trim().to_string()).collect();

        if names.len() > ServiceMask::BITS {
            return Err(RegistryError::TooManyServices(names.len()));
        }
        for (i, name) in names.iter().enumerate() {
            if name.is_empty() {
                return Err(RegistryError::EmptyName);
            }
            if names[..i].iter().any(|n| n.eq_ignore_ascii_case(name)) {
                return Err(RegistryError::Duplicate(name.clone()));
            }
        }

        Ok(Self { names })
    }

    /// Index of `name`, matched case-insensitively.
    pub fn name_to_index(&self, name: &str) -> Result<usize, RegistryError> {
        let name = name.trim();
        self.names
            .iter()
            .position(|n| n.eq_ignore_ascii_case(name))
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))
    }

    pub fn index_to_name(&self, index: usize) -> Result<&str, RegistryError> {
        self.names
            .get(index)
            .map(String::as_str)
            .ok_or(RegistryError::OutOfRange(index))
    }

    /// All names in index order.
    #[inline]
    pub fn all_names(&self) -> &[String] {
        &self.names
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Mask with every known service set.
    pub fn full_mask(&self) -> ServiceMask {
        (0..self.names.len()).collect()
    }

    /// Mask for a list of names. Fails on the first unknown name.
    pub fn mask_for<S: AsRef<str>>(&self, names: &[S]) -> Result<ServiceMask, RegistryError> {
        names
            .iter()
            .map(|n| self.name_to_index(n.as_ref()))
            .collect::<Result<ServiceMask, _>>()
    }

    /// Names of the services set in `mask`. Bits without a name are skipped.
    pub fn names_in(&self, mask: ServiceMask) -> Vec<&str> {
        mask.iter()
            .filter_map(|i| self.names.get(i).map(String::as_str))
            .collect()
    }
}

impl Default for ServiceRegistry {
    fn default() -> Self {
        Self {
            names: DEFAULT_SERVICES.iter().map(|s| s.to_string()).collect(),
        }
    }
}
