use ndarray::Array2;
use ndarray_stats::QuantileExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::{
    config::{
        aggregation::{Aggregation, CarrierPolicy, RasterNormalization},
        grid::Grid,
    },
    error::InfluenceError,
    raster::InfluenceRaster,
};

/// Logistic function, evaluated without overflow for large `|x|`.
#[must_use]
pub fn sigmoid(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

/// Team level surfaces of one play.
///
/// `team_a` and `team_b` are sums of squashed player rasters, so each cell
/// lies in `[players / 2, players]`. `control` is
/// `sigmoid(team_a - team_b)`: near 1 team A dominates, near 0 team B.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct TeamSurfaces {
    pub team_a: Array2<f64>,
    pub team_b: Array2<f64>,
    pub control: Array2<f64>,
}

/// Condensed view of a control surface.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct SurfaceSummary {
    /// Field coordinates of the cell team A controls most.
    pub team_a_stronghold: (f64, f64),
    /// Field coordinates of the cell team B controls most.
    pub team_b_stronghold: (f64, f64),
    /// Share of cells with control within `0.5 ± band`.
    pub contested_fraction: f64,
    pub mean_control: f64,
}

impl TeamSurfaces {
    /// Summarizes the control surface, treating cells within `band` of 0.5 as contested.
    ///
    /// # Errors
    ///
    /// Returns [`InfluenceError::DimensionMismatch`] if the surface is empty.
    #[allow(clippy::cast_precision_loss)]
    pub fn summary(&self, band: f64) -> Result<SurfaceSummary, InfluenceError> {
        let (height, width) = self.control.dim();
        let empty = || InfluenceError::DimensionMismatch {
            index: 0,
            expected: [1, 1],
            found: [height, width],
        };
        let grid = Grid { width, height };
        let (a_row, a_col) = self.control.argmax_skipnan().map_err(|_| empty())?;
        let (b_row, b_col) = self.control.argmin_skipnan().map_err(|_| empty())?;
        let contested = self
            .control
            .iter()
            .filter(|value| (**value - 0.5).abs() <= band)
            .count();
        let mean_control = self.control.mean().ok_or_else(empty)?;

        Ok(SurfaceSummary {
            team_a_stronghold: grid.field_coordinates(a_row, a_col),
            team_b_stronghold: grid.field_coordinates(b_row, b_col),
            contested_fraction: contested as f64 / self.control.len() as f64,
            mean_control,
        })
    }
}

/// Applies the sigmoid and then the configured normalization to one raster.
#[must_use]
pub fn squash(raster: &InfluenceRaster, normalization: RasterNormalization) -> Array2<f64> {
    let squashed = raster.values.mapv(sigmoid);
    match normalization {
        RasterNormalization::None => squashed,
        RasterNormalization::Peak => {
            let peak = *squashed.max_skipnan();
            if peak > 0.0 {
                squashed / peak
            } else {
                squashed
            }
        }
    }
}

/// Combines per-player rasters into team surfaces and a control surface.
///
/// The first `config.team_size` rasters belong to team A, the next
/// `config.team_size` to team B. With [`CarrierPolicy::Exclude`] the raster at
/// `ball_carrier` is left out of its team's sum.
///
/// # Errors
///
/// Returns [`InfluenceError::RasterCount`] if there are not exactly two teams
/// of rasters, [`InfluenceError::DimensionMismatch`] if the rasters differ in
/// shape and [`InfluenceError::CarrierOutOfRange`] for an invalid ball carrier
/// row.
#[tracing::instrument(level = "debug", skip(rasters))]
pub fn aggregate_teams(
    rasters: &[InfluenceRaster],
    config: &Aggregation,
    ball_carrier: Option<usize>,
) -> Result<TeamSurfaces, InfluenceError> {
    debug!("Aggregating {} rasters", rasters.len());
    let players = config.player_count();
    if rasters.len() != players || players == 0 {
        return Err(InfluenceError::RasterCount {
            expected: players,
            found: rasters.len(),
        });
    }
    let expected = rasters[0].shape();
    if let Some((index, raster)) = rasters
        .iter()
        .enumerate()
        .find(|(_, raster)| raster.shape() != expected)
    {
        return Err(InfluenceError::DimensionMismatch {
            index,
            expected,
            found: raster.shape(),
        });
    }
    if let Some(index) = ball_carrier {
        if index >= players {
            return Err(InfluenceError::CarrierOutOfRange { index, players });
        }
    }

    let excluded = match config.carrier_policy {
        CarrierPolicy::Include => None,
        CarrierPolicy::Exclude => ball_carrier,
    };
    let team_sum = |range: std::ops::Range<usize>| {
        let mut sum = Array2::<f64>::zeros(rasters[0].values.raw_dim());
        for index in range.filter(|index| Some(*index) != excluded) {
            trace!("Adding player {index}");
            sum += &squash(&rasters[index], config.normalization);
        }
        sum
    };

    let team_a = team_sum(0..config.team_size);
    let team_b = team_sum(config.team_size..players);
    let control = (&team_a - &team_b).mapv(sigmoid);

    Ok(TeamSurfaces {
        team_a,
        team_b,
        control,
    })
}
