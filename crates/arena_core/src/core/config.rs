//! # Unified Configuration System
//!
//! Tunables for the spatial index, the path search and the hunting agents,
//! grouped under [`EngineConfig`]. Every struct is serializable, has sensible
//! defaults and can be loaded from TOML or RON through the [`Config`] trait.
//!
//! ```toml
//! [grid]
//! cell_size = 4.0
//!
//! [navigation]
//! step_size = 1.0
//! arrival_tolerance = 0.5
//! max_expanded_nodes = 4096
//!
//! [hunt]
//! recompute_distance = 2.0
//! recompute_interval = 0.5
//! waypoint_radius = 0.25
//! ```

use serde::{Deserialize, Serialize};

pub use crate::config::{Config, ConfigError, ConfigFormat};

/// # Chunk Grid Configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Edge length of a square cell in world units
    pub cell_size: f32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self { cell_size: 4.0 }
    }
}

impl Config for GridConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        positive("grid.cell_size", self.cell_size)
    }
}

/// # Path Search Configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationConfig {
    /// Distance between neighbouring search nodes
    pub step_size: f32,
    /// A node this close to the goal counts as arrived
    pub arrival_tolerance: f32,
    /// Upper bound on node expansions per search; the conceptual grid is
    /// unbounded, so this is what ends a search for a sealed-off goal
    pub max_expanded_nodes: usize,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            step_size: 1.0,
            arrival_tolerance: 0.5,
            max_expanded_nodes: 4096,
        }
    }
}

impl Config for NavigationConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        positive("navigation.step_size", self.step_size)?;
        non_negative("navigation.arrival_tolerance", self.arrival_tolerance)?;
        if self.max_expanded_nodes == 0 {
            return Err(ConfigError::Invalid {
                field: "navigation.max_expanded_nodes",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// # Hunting Agent Configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HuntConfig {
    /// Recompute once the target drifts this far from the cached path goal
    pub recompute_distance: f32,
    /// Minimum seconds between two path searches of one agent
    pub recompute_interval: f32,
    /// Distance at which a waypoint counts as reached
    pub waypoint_radius: f32,
}

impl Default for HuntConfig {
    fn default() -> Self {
        Self {
            recompute_distance: 2.0,
            recompute_interval: 0.5,
            waypoint_radius: 0.25,
        }
    }
}

impl Config for HuntConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        non_negative("hunt.recompute_distance", self.recompute_distance)?;
        non_negative("hunt.recompute_interval", self.recompute_interval)?;
        positive("hunt.waypoint_radius", self.waypoint_radius)
    }
}

/// # Engine Configuration
///
/// Aggregate of every subsystem configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Spatial index settings
    pub grid: GridConfig,
    /// Path search settings
    pub navigation: NavigationConfig,
    /// Hunting agent settings
    pub hunt: HuntConfig,
}

impl Config for EngineConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        self.grid.validate()?;
        self.navigation.validate()?;
        self.hunt.validate()
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        log::warn!("Rejecting {field} = {value}");
        Err(ConfigError::Invalid {
            field,
            reason: format!("expected a finite value > 0, got {value}"),
        })
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        log::warn!("Rejecting {field} = {value}");
        Err(ConfigError::Invalid {
            field,
            reason: format!("expected a finite value >= 0, got {value}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_toml_falls_back_to_defaults() {
        let config = EngineConfig::from_str_with_format(
            "[grid]\ncell_size = 8.0\n",
            ConfigFormat::Toml,
        )
        .unwrap();
        assert_eq!(config.grid.cell_size, 8.0);
        assert_eq!(config.navigation, NavigationConfig::default());
        assert_eq!(config.hunt, HuntConfig::default());
    }

    #[test]
    fn test_ron_roundtrip_preserves_values() {
        let mut config = EngineConfig::default();
        config.navigation.step_size = 0.5;
        config.hunt.recompute_interval = 1.25;

        let text = config.to_string_with_format(ConfigFormat::Ron).unwrap();
        let parsed = EngineConfig::from_str_with_format(&text, ConfigFormat::Ron).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_rejects_non_positive_cell_size() {
        let result = EngineConfig::from_str_with_format(
            "[grid]\ncell_size = 0.0\n",
            ConfigFormat::Toml,
        );
        assert!(matches!(
            result,
            Err(ConfigError::Invalid { field: "grid.cell_size", .. })
        ));
    }

    #[test]
    fn test_rejects_zero_node_budget() {
        let config = NavigationConfig {
            max_expanded_nodes: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_extension_is_unsupported() {
        let result = EngineConfig::load_from_file("settings.yaml");
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_save_and_load_toml_file() {
        let path = std::env::temp_dir().join(format!("arena_core_config_{}.toml", std::process::id()));
        let mut config = EngineConfig::default();
        config.grid.cell_size = 2.5;

        config.save_to_file(&path).unwrap();
        let loaded = EngineConfig::load_from_file(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(loaded, config);
    }
}
