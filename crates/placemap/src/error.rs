//! Place map error types.

use thiserror::Error;

/// Errors from the service registry.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Service not found: {0}")]
    NotFound(String),

    #[error("Invalid service index: {0}")]
    OutOfRange(usize),

    #[error("Too many services: {0} (a service mask holds at most 32)")]
    TooManyServices(usize),

    #[error("Duplicate service name: {0}")]
    Duplicate(String),

    #[error("Service names must not be empty")]
    EmptyName,
}

/// Errors surfaced by [`crate::PlaceMap`] operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MapError {
    #[error("Place out of bounds: ({x}, {y})")]
    OutOfBounds { x: f64, y: f64 },

    #[error("Place not found at coordinates ({x}, {y})")]
    NotFound { x: f64, y: f64 },

    #[error("Invalid service name: {0}")]
    InvalidServiceName(String),

    #[error("Invalid action '{0}', expected 'add' or 'remove'")]
    InvalidAction(String),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Errors loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}
