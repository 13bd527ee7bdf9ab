//! Place map configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};
use spatial::{CapacityPolicy, Rectangle, MAX_DEPTH_LIMIT};
use tracing::info;

use crate::error::{ConfigError, RegistryError};
use crate::registry::{ServiceRegistry, DEFAULT_SERVICES};

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE: &str = "placemap.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub map: MapConfig,
    #[serde(default)]
    pub tree: TreeConfig,
    #[serde(default)]
    pub loader: LoaderConfig,
    #[serde(default)]
    pub services: ServicesConfig,
    #[serde(default)]
    pub demo: DemoConfig,
}

impl Config {
    /// Load configuration from `placemap.toml` or use defaults.
    pub fn load() -> anyhow::Result<Self> {
        let path = Path::new(CONFIG_FILE);
        if path.exists() {
            Ok(Self::load_from(path)?)
        } else {
            info!("No {} found, creating default config", CONFIG_FILE);
            let default_config = Self::default();
            default_config.save(path)?;
            Ok(default_config)
        }
    }

    /// Load and validate configuration from an explicit path.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        std::fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let m = &self.map;
        if !(m.width.is_finite() && m.height.is_finite()) || m.width <= 0.0 || m.height <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "map extent must be positive, got {}x{}",
                m.width, m.height
            )));
        }
        if self.tree.capacity == 0 {
            return Err(ConfigError::Invalid("tree.capacity must be at least 1".into()));
        }
        if self.tree.max_depth > MAX_DEPTH_LIMIT {
            return Err(ConfigError::Invalid(format!(
                "tree.max_depth must be at most {MAX_DEPTH_LIMIT}, got {}",
                self.tree.max_depth
            )));
        }
        self.services
            .registry()
            .map_err(|e| ConfigError::Invalid(format!("services: {e}")))?;
        Ok(())
    }
}

/// Extent of the whole map.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MapConfig {
    /// Left edge.
    #[serde(default)]
    pub x: f64,
    /// Top edge.
    #[serde(default)]
    pub y: f64,
    #[serde(default = "default_map_size")]
    pub width: f64,
    #[serde(default = "default_map_size")]
    pub height: f64,
}

impl MapConfig {
    /// Root boundary of the tree.
    pub fn boundary(&self) -> Rectangle {
        Rectangle::new(self.x, self.y, self.width, self.height)
    }
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: default_map_size(),
            height: default_map_size(),
        }
    }
}

fn default_map_size() -> f64 {
    10_000_000.0
}

/// How node capacity changes with depth.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Growth {
    Fixed,
    #[default]
    Logarithmic,
}

/// Quadtree tuning.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TreeConfig {
    /// Leaf capacity (the base capacity under logarithmic growth).
    #[serde(default = "default_capacity")]
    pub capacity: usize,
    #[serde(default)]
    pub growth: Growth,
    /// Nodes at this depth never split.
    #[serde(default = "default_max_depth")]
    pub max_depth: u32,
}

impl TreeConfig {
    pub fn policy(&self) -> CapacityPolicy {
        match self.growth {
            Growth::Fixed => CapacityPolicy::Fixed(self.capacity),
            Growth::Logarithmic => CapacityPolicy::Logarithmic { base: self.capacity },
        }
    }
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            growth: Growth::default(),
            max_depth: default_max_depth(),
        }
    }
}

fn default_capacity() -> usize {
    10
}
fn default_max_depth() -> u32 {
    spatial::DEFAULT_MAX_DEPTH
}

/// Bulk-load buffering.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LoaderConfig {
    /// Buffered inserts are flushed into the tree at this size. 0 or 1 inserts directly.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
        }
    }
}

fn default_batch_size() -> usize {
    10_000
}

/// Service name table.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ServicesConfig {
    #[serde(default = "default_service_names")]
    pub names: Vec<String>,
}

impl ServicesConfig {
    pub fn registry(&self) -> Result<ServiceRegistry, RegistryError> {
        ServiceRegistry::new(self.names.iter().cloned())
    }
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            names: default_service_names(),
        }
    }
}

fn default_service_names() -> Vec<String> {
    DEFAULT_SERVICES.iter().map(|s| s.to_string()).collect()
}

/// Settings for the bulk-load demo binary.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DemoConfig {
    /// Number of random places to generate.
    #[serde(default = "default_demo_places")]
    pub places: usize,
    /// RNG seed; random when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Maximum number of search results to print.
    #[serde(default = "default_print_limit")]
    pub print_limit: usize,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            places: default_demo_places(),
            seed: None,
            print_limit: default_print_limit(),
        }
    }
}

fn default_demo_places() -> usize {
    1_000_000
}
fn default_print_limit() -> usize {
    50
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.tree.policy(), CapacityPolicy::Logarithmic { base: 10 });
        assert_eq!(config.loader.batch_size, 10_000);
        assert_eq!(config.services.names.len(), 10);
    }

    #[test]
    fn test_partial_override() {
        let config = Config::from_toml_str(
            r#"
            [map]
            width = 100.0
            height = 50.0

            [tree]
            capacity = 4
            growth = "fixed"

            [services]
            names = ["Cafe", "Gym"]
            "#,
        )
        .unwrap();
        assert_eq!(config.map.boundary(), Rectangle::new(0.0, 0.0, 100.0, 50.0));
        assert_eq!(config.tree.policy(), CapacityPolicy::Fixed(4));
        assert_eq!(config.tree.max_depth, spatial::DEFAULT_MAX_DEPTH);
        assert_eq!(config.services.registry().unwrap().len(), 2);
    }

    #[test]
    fn test_validation_errors() {
        assert!(matches!(
            Config::from_toml_str("[map]\nwidth = 0.0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            Config::from_toml_str("[tree]\ncapacity = 0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            Config::from_toml_str("[services]\nnames = [\"A\", \"a\"]"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            Config::from_toml_str("[tree]\ngrowth = \"cubic\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_max_depth_ceiling() {
        let err = Config::from_toml_str("[tree]\ncapacity = 1\ngrowth = \"fixed\"\nmax_depth = 1000000")
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(ref msg) if msg.contains("max_depth")));

        let config = Config::from_toml_str(&format!("[tree]\nmax_depth = {MAX_DEPTH_LIMIT}")).unwrap();
        assert_eq!(config.tree.max_depth, MAX_DEPTH_LIMIT);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        let mut config = Config::default();
        config.demo.seed = Some(9);
        config.save(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), config);
    }
}
