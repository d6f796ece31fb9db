
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{
    aggregation::{aggregate_teams, TeamSurfaces},
    config::{grid::Grid, model::Model, Config},
    error::InfluenceError,
    play::{Play, PlayRow, PlayerState},
    raster::{rasterize_influence, InfluenceRaster},
};

/// Per-player rasters and team surfaces of one play.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct PlayInfluence {
    /// One raster per player, in play row order.
    pub rasters: Vec<InfluenceRaster>,
    pub surfaces: TeamSurfaces,
}

impl PlayInfluence {
    /// Rasterizes every player of `play` and aggregates the rasters by team.
    ///
    /// Players are rasterized in parallel; the result does not depend on
    /// scheduling.
    ///
    /// # Errors
    ///
    /// Returns an error if the config is invalid, the play's team size does not
    /// match the config, a player's covariance is rejected by the degenerate
    /// policy, or aggregation fails.
    #[tracing::instrument(level = "info", skip_all)]
    pub fn compute(play: &Play, config: &Config) -> Result<Self, InfluenceError> {
        info!("Computing influence for play");
        config.validate()?;
        if play.team_size() != config.aggregation.team_size {
            return Err(InfluenceError::PlayerCount {
                expected: config.aggregation.player_count(),
                found: play.players().len(),
            });
        }

        let rasters = play
            .players()
            .par_iter()
            .enumerate()
            .map(|(index, player)| {
                player_raster(player, &config.grid, &config.model)
                    .map_err(|error| error.for_player(index))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let surfaces = aggregate_teams(&rasters, &config.aggregation, Some(play.ball_carrier()))?;

        Ok(Self { rasters, surfaces })
    }

    /// Extracts play `play_index` from `rows` and computes its influence.
    ///
    /// # Errors
    ///
    /// Returns any extraction error of [`Play::extract`] or computation error
    /// of [`PlayInfluence::compute`].
    #[tracing::instrument(level = "info", skip(rows, config))]
    pub fn from_rows(
        rows: &[PlayRow],
        play_index: usize,
        config: &Config,
    ) -> Result<(Play, Self), InfluenceError> {
        let play = Play::extract(rows, play_index, config.aggregation.team_size)?;
        let influence = Self::compute(&play, config)?;
        Ok((play, influence))
    }
}

/// Raster of a single player's influence, centered on the yard nearest to
/// the player.
///
/// # Errors
///
/// Returns [`InfluenceError::DegenerateCovariance`] if the player's covariance
/// is singular and the model rejects singular covariances.
#[tracing::instrument(level = "debug", skip_all, fields(nfl_id = player.nfl_id))]
pub fn player_raster(
    player: &PlayerState,
    grid: &Grid,
    model: &Model,
) -> Result<InfluenceRaster, InfluenceError> {
    debug!("Rasterizing player");
    rasterize_influence(player.grid_position(), player.covariance(model), grid, model)
}
