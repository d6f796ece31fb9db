pub mod aggregation;
pub mod grid;
pub mod model;

use std::{fs, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use self::{
    aggregation::Aggregation,
    grid::Grid,
    model::{DegeneratePolicy, Model},
};
use crate::core::error::InfluenceError;

/// Struct to hold the configuration for an influence run.
///
/// Contains fields for:
///
/// - `grid`: Raster dimensions in yards.
/// - `model`: Covariance and density parameters.
/// - `aggregation`: How per-player rasters are combined into team surfaces.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub grid: Grid,
    #[serde(default)]
    pub model: Model,
    #[serde(default)]
    pub aggregation: Aggregation,
}

impl Config {
    /// Reads a config from a TOML file. Missing sections fall back to their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid TOML or
    /// fails [`Config::validate`].
    #[tracing::instrument(level = "info")]
    pub fn from_file(path: &Path) -> Result<Self> {
        info!("Loading config");
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Could not read config file '{}'", path.display()))?;
        let config: Self = toml::from_str(&contents)
            .with_context(|| format!("Could not parse config file '{}'", path.display()))?;
        config
            .validate()
            .with_context(|| format!("Config file '{}' is invalid", path.display()))?;
        Ok(config)
    }

    /// Checks that the values can drive a rasterization.
    ///
    /// # Errors
    ///
    /// Returns [`InfluenceError::InvalidConfig`] for empty or oversized grids,
    /// empty or oversized teams, and a variance floor that is not a positive
    /// finite number.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn validate(&self) -> Result<(), InfluenceError> {
        debug!("Validating config");
        if self.grid.width == 0 || self.grid.height == 0 {
            return Err(InfluenceError::InvalidConfig(format!(
                "grid must not be empty, got {}x{}",
                self.grid.width, self.grid.height
            )));
        }
        if self.grid.width.checked_mul(self.grid.height).is_none() {
            return Err(InfluenceError::InvalidConfig(format!(
                "grid of {}x{} cells is too large",
                self.grid.width, self.grid.height
            )));
        }
        if self.aggregation.team_size == 0 {
            return Err(InfluenceError::InvalidConfig(
                "team size must be at least one".to_string(),
            ));
        }
        if self.aggregation.team_size.checked_mul(2).is_none() {
            return Err(InfluenceError::InvalidConfig(format!(
                "team size {} is too large",
                self.aggregation.team_size
            )));
        }
        if let DegeneratePolicy::VarianceFloor { min_variance } = self.model.degenerate_policy {
            if !(min_variance.is_finite() && min_variance > 0.0) {
                return Err(InfluenceError::InvalidConfig(format!(
                    "variance floor must be positive and finite, got {min_variance}"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::{
        aggregation::{CarrierPolicy, RasterNormalization},
        model::EvaluationStrategy,
        *,
    };

    #[test]
    fn default_is_valid() {
        let config = Config::default();

        assert!(config.validate().is_ok());
        assert_eq!(config.grid.width, 120);
        assert_eq!(config.grid.height, 57);
        assert_eq!(config.aggregation.team_size, 11);
    }

    #[test]
    fn empty_grid_is_rejected() {
        let mut config = Config::default();
        config.grid.height = 0;

        assert!(matches!(
            config.validate(),
            Err(InfluenceError::InvalidConfig(_))
        ));
    }

    #[test]
    fn oversized_grid_and_team_are_rejected() {
        let mut config = Config::default();
        config.grid.width = usize::MAX;
        config.grid.height = 2;
        assert!(matches!(
            config.validate(),
            Err(InfluenceError::InvalidConfig(_))
        ));

        let mut config = Config::default();
        config.aggregation.team_size = usize::MAX;
        assert!(matches!(
            config.validate(),
            Err(InfluenceError::InvalidConfig(_))
        ));
    }

    #[test]
    fn zero_variance_floor_is_rejected() {
        let mut config = Config::default();
        config.model.degenerate_policy = DegeneratePolicy::VarianceFloor { min_variance: 0.0 };

        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let contents = r#"
            [grid]
            width = 12
            height = 6

            [model]
            evaluation = "Scalar"
            degenerate_policy = { kind = "Reject" }

            [aggregation]
            carrier_policy = "Exclude"
        "#;

        let config: Config = toml::from_str(contents).unwrap();

        assert_eq!(config.grid, Grid { width: 12, height: 6 });
        assert_eq!(config.model.evaluation, EvaluationStrategy::Scalar);
        assert_eq!(config.model.degenerate_policy, DegeneratePolicy::Reject);
        assert!(config.model.use_acceleration);
        assert_eq!(config.aggregation.carrier_policy, CarrierPolicy::Exclude);
        assert_eq!(config.aggregation.normalization, RasterNormalization::None);
        assert_eq!(config.aggregation.team_size, 11);
    }

    #[test]
    fn from_file_round_trips_default() {
        let dir = std::env::temp_dir().join("gridiron_influence_config_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(toml::to_string(&Config::default()).unwrap().as_bytes())
            .unwrap();

        let loaded = Config::from_file(&path).unwrap();

        assert_eq!(loaded, Config::default());
        std::fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn from_file_missing_is_error() {
        let result = Config::from_file(Path::new("./does/not/exist.toml"));

        assert!(result.is_err());
    }
}
