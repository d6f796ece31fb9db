use thiserror::Error;

/// Coarse classification of [`InfluenceError`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The play data handed to the extractor is inconsistent.
    DataIntegrity,
    /// A covariance matrix was singular and the configured policy rejects it.
    DegenerateCovariance,
    /// Array shapes or counts do not line up.
    DimensionMismatch,
    /// A configuration value is out of range.
    Config,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum InfluenceError {
    #[error("play {play} needs rows {start}..{end} but only {available} rows are available")]
    PlayOutOfRange {
        play: usize,
        start: usize,
        end: usize,
        available: usize,
    },
    #[error("row {row} has rusher id {found} but the play's rusher id is {expected}")]
    MixedPlay { row: usize, expected: u64, found: u64 },
    #[error("row {row} has a non-finite value in field '{field}'")]
    NonFiniteField { row: usize, field: &'static str },
    #[error("no row of play {play} belongs to the ball carrier")]
    MissingBallCarrier { play: usize },
    #[error("rows {rows:?} of play {play} all match the ball carrier id")]
    MultipleBallCarriers { play: usize, rows: Vec<usize> },
    #[error("ball carrier row {index} is outside the {players} players of the play")]
    CarrierOutOfRange { index: usize, players: usize },
    #[error("expected {expected} players, found {found}")]
    PlayerCount { expected: usize, found: usize },
    #[error("covariance of player {player:?} is singular (determinant {determinant:e})")]
    DegenerateCovariance {
        player: Option<usize>,
        determinant: f64,
    },
    #[error("raster {index} has shape {found:?}, expected {expected:?}")]
    DimensionMismatch {
        index: usize,
        expected: [usize; 2],
        found: [usize; 2],
    },
    #[error("expected {expected} rasters, found {found}")]
    RasterCount { expected: usize, found: usize },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl InfluenceError {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::PlayOutOfRange { .. }
            | Self::MixedPlay { .. }
            | Self::NonFiniteField { .. }
            | Self::MissingBallCarrier { .. }
            | Self::MultipleBallCarriers { .. }
            | Self::CarrierOutOfRange { .. }
            | Self::PlayerCount { .. } => ErrorKind::DataIntegrity,
            Self::DegenerateCovariance { .. } => ErrorKind::DegenerateCovariance,
            Self::DimensionMismatch { .. } | Self::RasterCount { .. } => {
                ErrorKind::DimensionMismatch
            }
            Self::InvalidConfig(_) => ErrorKind::Config,
        }
    }

    /// Attaches the player row to a covariance error raised before the row was known.
    #[must_use]
    pub fn for_player(self, index: usize) -> Self {
        match self {
            Self::DegenerateCovariance { determinant, .. } => Self::DegenerateCovariance {
                player: Some(index),
                determinant,
            },
            other => other,
        }
    }
}
