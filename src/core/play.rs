use nalgebra::{Matrix2, Point2, Vector2};
use serde::{Deserialize, Serialize};
use strum_macros::Display;
use tracing::{debug, warn};

use super::{
    angle::heading_vector_deg, config::model::Model, covariance::build_covariance,
    error::InfluenceError,
};

/// One player-play row as delivered by the tracking data loader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayRow {
    #[serde(rename = "NflId")]
    pub nfl_id: u64,
    #[serde(rename = "NflIdRusher")]
    pub nfl_id_rusher: u64,
    #[serde(rename = "X")]
    pub x: f64,
    #[serde(rename = "Y")]
    pub y: f64,
    #[serde(rename = "S")]
    pub speed: f64,
    #[serde(rename = "A")]
    pub acceleration: f64,
    #[serde(rename = "Dir")]
    pub direction_deg: f64,
    #[serde(rename = "Orientation")]
    pub orientation_deg: f64,
}

impl PlayRow {
    fn first_non_finite(&self) -> Option<&'static str> {
        [
            ("X", self.x),
            ("Y", self.y),
            ("S", self.speed),
            ("A", self.acceleration),
            ("Dir", self.direction_deg),
            ("Orientation", self.orientation_deg),
        ]
        .into_iter()
        .find(|(_, value)| !value.is_finite())
        .map(|(name, _)| name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    pub nfl_id: u64,
    /// Field position in yards.
    pub position: Point2<f64>,
    pub speed: f64,
    pub acceleration: f64,
    /// Heading of motion, clockwise from the field's y axis.
    pub direction_deg: f64,
    /// Body orientation, same convention as `direction_deg`.
    pub orientation_deg: f64,
}

impl From<&PlayRow> for PlayerState {
    fn from(row: &PlayRow) -> Self {
        Self {
            nfl_id: row.nfl_id,
            position: Point2::new(row.x, row.y),
            speed: row.speed,
            acceleration: row.acceleration,
            direction_deg: row.direction_deg,
            orientation_deg: row.orientation_deg,
        }
    }
}

impl PlayerState {
    #[must_use]
    pub fn direction_vector(&self) -> Vector2<f64> {
        heading_vector_deg(self.direction_deg)
    }

    #[must_use]
    pub fn orientation_vector(&self) -> Vector2<f64> {
        heading_vector_deg(self.orientation_deg)
    }

    /// Direction of motion scaled by speed, and by acceleration if requested.
    #[must_use]
    pub fn motion_vector(&self, use_acceleration: bool) -> Vector2<f64> {
        let magnitude = if use_acceleration {
            self.speed * self.acceleration
        } else {
            self.speed
        };
        self.direction_vector() * magnitude
    }

    /// Position rounded to the nearest yard, ties to even.
    #[must_use]
    pub fn grid_position(&self) -> Point2<f64> {
        self.position.map(f64::round_ties_even)
    }

    #[must_use]
    pub fn covariance(&self, model: &Model) -> Matrix2<f64> {
        build_covariance(
            self.direction_deg,
            self.speed,
            model.use_acceleration.then_some(self.acceleration),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Role {
    BallCarrier,
    TeamA,
    TeamB,
}

/// Everything a renderer needs to draw one player's arrows.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerVectors {
    pub position: Point2<f64>,
    pub role: Role,
    pub direction: Vector2<f64>,
    pub orientation: Vector2<f64>,
    pub motion: Vector2<f64>,
}

/// Distances from the ball carrier to the opposing players.
#[derive(Debug, Clone, PartialEq)]
pub struct Clearance {
    /// `(row, distance)` for every opposing player, in row order.
    pub distances: Vec<(usize, f64)>,
    /// The closest opposing player.
    pub nearest: (usize, f64),
}

/// The players of a single play, team A first, and the ball carrier row.
#[derive(Debug, Clone, PartialEq)]
pub struct Play {
    players: Vec<PlayerState>,
    ball_carrier: usize,
    team_size: usize,
}

impl Play {
    /// # Errors
    ///
    /// Returns [`InfluenceError::PlayerCount`] if there are not `2 * team_size`
    /// players and [`InfluenceError::CarrierOutOfRange`] for an invalid
    /// ball carrier row.
    pub fn new(
        players: Vec<PlayerState>,
        ball_carrier: usize,
        team_size: usize,
    ) -> Result<Self, InfluenceError> {
        let expected = team_size.saturating_mul(2);
        if players.len() != expected || team_size == 0 {
            return Err(InfluenceError::PlayerCount {
                expected,
                found: players.len(),
            });
        }
        if ball_carrier >= players.len() {
            return Err(InfluenceError::CarrierOutOfRange {
                index: ball_carrier,
                players: players.len(),
            });
        }
        Ok(Self {
            players,
            ball_carrier,
            team_size,
        })
    }

    /// Selects the rows of play `play_index` from a dataset ordered by play,
    /// `2 * team_size` rows per play, and locates the ball carrier.
    ///
    /// # Errors
    ///
    /// Fails with a data integrity error if the dataset is too short, the
    /// selected rows disagree on the rusher id, a value is not finite, or not
    /// exactly one row is the rusher.
    #[tracing::instrument(level = "debug", skip(rows))]
    pub fn extract(
        rows: &[PlayRow],
        play_index: usize,
        team_size: usize,
    ) -> Result<Self, InfluenceError> {
        debug!("Extracting play");
        let players_per_play = team_size.saturating_mul(2);
        let start = play_index.saturating_mul(players_per_play);
        let end = start.saturating_add(players_per_play);
        let play_rows = rows
            .get(start..end)
            .filter(|play_rows| !play_rows.is_empty())
            .ok_or(InfluenceError::PlayOutOfRange {
                play: play_index,
                start,
                end,
                available: rows.len(),
            })?;

        let rusher_id = play_rows[0].nfl_id_rusher;
        for (offset, row) in play_rows.iter().enumerate() {
            if row.nfl_id_rusher != rusher_id {
                return Err(InfluenceError::MixedPlay {
                    row: start + offset,
                    expected: rusher_id,
                    found: row.nfl_id_rusher,
                });
            }
            if let Some(field) = row.first_non_finite() {
                return Err(InfluenceError::NonFiniteField {
                    row: start + offset,
                    field,
                });
            }
        }

        let carriers: Vec<usize> = play_rows
            .iter()
            .enumerate()
            .filter(|(_, row)| row.nfl_id == row.nfl_id_rusher)
            .map(|(offset, _)| offset)
            .collect();
        let ball_carrier = match carriers.as_slice() {
            [] => {
                return Err(InfluenceError::MissingBallCarrier { play: play_index });
            }
            [carrier] => *carrier,
            _ => {
                warn!("Several rows match the rusher id");
                return Err(InfluenceError::MultipleBallCarriers {
                    play: play_index,
                    rows: carriers.iter().map(|offset| start + offset).collect(),
                });
            }
        };

        Self::new(
            play_rows.iter().map(PlayerState::from).collect(),
            ball_carrier,
            team_size,
        )
    }

    #[must_use]
    pub fn players(&self) -> &[PlayerState] {
        &self.players
    }

    /// Row of the ball carrier within the play.
    #[must_use]
    pub const fn ball_carrier(&self) -> usize {
        self.ball_carrier
    }

    #[must_use]
    pub const fn team_size(&self) -> usize {
        self.team_size
    }

    /// Team of the player in row `index`, ignoring the ball carrier, `None`
    /// for rows outside the play.
    #[must_use]
    pub fn team_of(&self, index: usize) -> Option<Role> {
        if index < self.team_size {
            Some(Role::TeamA)
        } else if index < self.players.len() {
            Some(Role::TeamB)
        } else {
            None
        }
    }

    #[must_use]
    pub fn role(&self, index: usize) -> Option<Role> {
        if index == self.ball_carrier {
            Some(Role::BallCarrier)
        } else {
            self.team_of(index)
        }
    }

    /// Positions and arrows of all players in row order.
    #[must_use]
    pub fn vectors(&self, use_acceleration: bool) -> Vec<PlayerVectors> {
        self.players
            .iter()
            .enumerate()
            .filter_map(|(index, player)| {
                Some(PlayerVectors {
                    position: player.position,
                    role: self.role(index)?,
                    direction: player.direction_vector(),
                    orientation: player.orientation_vector(),
                    motion: player.motion_vector(use_acceleration),
                })
            })
            .collect()
    }

    /// Distances from the ball carrier to every player of the other team.
    #[must_use]
    pub fn carrier_clearance(&self) -> Clearance {
        let carrier = &self.players[self.ball_carrier];
        let opponents = if self.ball_carrier < self.team_size {
            self.team_size..self.players.len()
        } else {
            0..self.team_size
        };
        let distances: Vec<(usize, f64)> = opponents
            .map(|index| {
                let distance = nalgebra::distance(&carrier.position, &self.players[index].position);
                (index, distance)
            })
            .collect();
        // team_size > 0 guarantees at least one opponent
        let nearest = distances
            .iter()
            .copied()
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .unwrap_or((self.ball_carrier, 0.0));

        Clearance { distances, nearest }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::core::error::ErrorKind;

    const RUSHER: u64 = 2_555_000;

    #[allow(clippy::cast_precision_loss)]
    pub(crate) fn rows_for_play(rusher_row: usize, rusher_id: u64) -> Vec<PlayRow> {
        (0..22)
            .map(|index| PlayRow {
                nfl_id: if index == rusher_row {
                    rusher_id
                } else {
                    1000 + index as u64
                },
                nfl_id_rusher: rusher_id,
                x: 30.0 + index as f64,
                y: 10.0 + (index % 11) as f64 * 3.0,
                speed: 1.0 + index as f64 / 10.0,
                acceleration: 0.5 + index as f64 / 20.0,
                direction_deg: 25.0 * index as f64 % 360.0,
                orientation_deg: 40.0 * index as f64 % 360.0,
            })
            .collect()
    }

    #[test]
    fn extracts_second_play() {
        let mut rows = rows_for_play(3, RUSHER);
        rows.extend(rows_for_play(14, RUSHER + 1));

        let play = Play::extract(&rows, 1, 11).unwrap();

        assert_eq!(play.players().len(), 22);
        assert_eq!(play.ball_carrier(), 14);
        assert_eq!(play.players()[14].nfl_id, RUSHER + 1);
        assert_eq!(play.role(14), Some(Role::BallCarrier));
        assert_eq!(play.team_of(14), Some(Role::TeamB));
    }

    #[test]
    fn carrier_in_first_row_is_found() {
        let rows = rows_for_play(0, RUSHER);

        let play = Play::extract(&rows, 0, 11).unwrap();

        assert_eq!(play.ball_carrier(), 0);
    }

    #[test]
    fn missing_carrier_is_an_error() {
        let mut rows = rows_for_play(0, RUSHER);
        rows[0].nfl_id = 1;

        let error = Play::extract(&rows, 0, 11).unwrap_err();

        assert_eq!(error, InfluenceError::MissingBallCarrier { play: 0 });
        assert_eq!(error.kind(), ErrorKind::DataIntegrity);
    }

    #[test]
    fn duplicate_carrier_is_an_error() {
        let mut rows = rows_for_play(5, RUSHER);
        rows[17].nfl_id = RUSHER;

        let error = Play::extract(&rows, 0, 11).unwrap_err();

        assert_eq!(
            error,
            InfluenceError::MultipleBallCarriers {
                play: 0,
                rows: vec![5, 17]
            }
        );
        assert_eq!(error.kind(), ErrorKind::DataIntegrity);
    }

    #[test]
    fn short_dataset_is_an_error() {
        let mut rows = rows_for_play(5, RUSHER);
        rows.extend(rows_for_play(5, RUSHER + 1).into_iter().take(21));

        let error = Play::extract(&rows, 1, 11).unwrap_err();

        assert_eq!(
            error,
            InfluenceError::PlayOutOfRange {
                play: 1,
                start: 22,
                end: 44,
                available: 43
            }
        );
    }

    #[test]
    fn misaligned_rows_are_an_error() {
        let mut rows = rows_for_play(5, RUSHER);
        rows.remove(8);
        rows.extend(rows_for_play(5, RUSHER + 1));

        let error = Play::extract(&rows, 0, 11).unwrap_err();

        assert_eq!(
            error,
            InfluenceError::MixedPlay {
                row: 21,
                expected: RUSHER,
                found: RUSHER + 1
            }
        );
    }

    #[test]
    fn non_finite_direction_is_an_error() {
        let mut rows = rows_for_play(5, RUSHER);
        rows[9].direction_deg = f64::NAN;

        let error = Play::extract(&rows, 0, 11).unwrap_err();

        assert_eq!(
            error,
            InfluenceError::NonFiniteField {
                row: 9,
                field: "Dir"
            }
        );
    }

    #[test]
    fn new_checks_player_count() {
        let players: Vec<PlayerState> = rows_for_play(0, RUSHER)
            .iter()
            .take(21)
            .map(PlayerState::from)
            .collect();

        assert_eq!(
            Play::new(players, 0, 11),
            Err(InfluenceError::PlayerCount {
                expected: 22,
                found: 21
            })
        );
    }

    #[test]
    fn oversized_team_is_an_error() {
        let players: Vec<PlayerState> = rows_for_play(0, RUSHER)
            .iter()
            .map(PlayerState::from)
            .collect();

        assert_eq!(
            Play::new(players, 0, usize::MAX),
            Err(InfluenceError::PlayerCount {
                expected: usize::MAX,
                found: 22
            })
        );

        let error = Play::extract(&rows_for_play(0, RUSHER), 0, usize::MAX).unwrap_err();
        assert!(matches!(error, InfluenceError::PlayOutOfRange { start: 0, .. }));
    }

    #[test]
    fn grid_position_rounds_half_to_even() {
        let mut player = PlayerState::from(&rows_for_play(0, RUSHER)[0]);
        player.position = Point2::new(42.5, 17.5);

        assert_eq!(player.grid_position(), Point2::new(42.0, 18.0));
    }

    #[test]
    fn motion_vector_scales_direction() {
        let mut player = PlayerState::from(&rows_for_play(0, RUSHER)[0]);
        player.direction_deg = 90.0;
        player.speed = 4.0;
        player.acceleration = 2.0;

        assert_relative_eq!(player.motion_vector(false), Vector2::new(4.0, 0.0), epsilon = 1e-12);
        assert_relative_eq!(player.motion_vector(true), Vector2::new(8.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn covariance_respects_acceleration_flag() {
        let player = PlayerState::from(&rows_for_play(0, RUSHER)[7]);
        let speed_only = Model {
            use_acceleration: false,
            ..Model::default()
        };

        assert_eq!(
            player.covariance(&speed_only),
            build_covariance(player.direction_deg, player.speed, None)
        );
        assert_eq!(
            player.covariance(&Model::default()),
            build_covariance(player.direction_deg, player.speed, Some(player.acceleration))
        );
    }

    #[test]
    fn vectors_tag_roles() {
        let play = Play::extract(&rows_for_play(3, RUSHER), 0, 11).unwrap();

        let vectors = play.vectors(true);

        assert_eq!(vectors.len(), 22);
        assert_eq!(vectors[3].role, Role::BallCarrier);
        assert_eq!(vectors[0].role, Role::TeamA);
        assert_eq!(vectors[11].role, Role::TeamB);
        assert_relative_eq!(vectors[5].direction.norm(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn clearance_measures_opposing_team() {
        let play = Play::extract(&rows_for_play(3, RUSHER), 0, 11).unwrap();

        let clearance = play.carrier_clearance();

        assert_eq!(clearance.distances.len(), 11);
        assert!(clearance.distances.iter().all(|(row, _)| *row >= 11));
        // row 13 sits at (43, 16), the carrier at (33, 19)
        assert_eq!(clearance.nearest.0, 13);
        assert_relative_eq!(clearance.nearest.1, 109.0_f64.sqrt());
    }
}
