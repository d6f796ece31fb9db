use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter};

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
pub struct Aggregation {
    /// Players per team. The first `team_size` rasters are team A, the next
    /// `team_size` team B.
    #[serde(default = "default_team_size")]
    pub team_size: usize,
    #[serde(default)]
    pub carrier_policy: CarrierPolicy,
    #[serde(default)]
    pub normalization: RasterNormalization,
}

const fn default_team_size() -> usize {
    11
}

impl Default for Aggregation {
    fn default() -> Self {
        Self {
            team_size: default_team_size(),
            carrier_policy: CarrierPolicy::default(),
            normalization: RasterNormalization::default(),
        }
    }
}

impl Aggregation {
    /// Rasters per play. Saturates for team sizes [`crate::core::config::Config::validate`] rejects.
    #[must_use]
    pub const fn player_count(&self) -> usize {
        self.team_size.saturating_mul(2)
    }
}

/// Whether the ball carrier's raster counts towards its team surface.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Default, Display, EnumIter)]
pub enum CarrierPolicy {
    #[default]
    Include,
    Exclude,
}

/// Per-player rescaling applied after the sigmoid.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Default, Display, EnumIter)]
pub enum RasterNormalization {
    #[default]
    None,
    /// Divide the squashed raster by its maximum so each player peaks at 1.
    Peak,
}
