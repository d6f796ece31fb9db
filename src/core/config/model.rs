use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter};

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Model {
    /// Scale the covariance axes by acceleration as well as speed.
    /// When false the speed-only variant is used.
    #[serde(default = "default_use_acceleration")]
    pub use_acceleration: bool,
    #[serde(default)]
    pub evaluation: EvaluationStrategy,
    #[serde(default)]
    pub degenerate_policy: DegeneratePolicy,
}

const fn default_use_acceleration() -> bool {
    true
}

impl Default for Model {
    fn default() -> Self {
        Self {
            use_acceleration: true,
            evaluation: EvaluationStrategy::default(),
            degenerate_policy: DegeneratePolicy::default(),
        }
    }
}

/// How a raster is filled. All variants produce the same values up to
/// floating point rounding.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Default, Display, EnumIter)]
pub enum EvaluationStrategy {
    /// Explicit loop over rows and columns.
    Scalar,
    /// Whole-grid array expressions over the row/column cross product.
    #[default]
    Batched,
    /// Cells split across the rayon thread pool.
    Parallel,
}

/// What to do with a singular covariance matrix, e.g. from a player standing
/// still or moving exactly along a field axis.
///
/// In TOML: `degenerate_policy = { kind = "VarianceFloor", min_variance = 1.0 }`.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Copy, Display)]
#[serde(tag = "kind")]
pub enum DegeneratePolicy {
    /// Fail with [`crate::core::error::InfluenceError::DegenerateCovariance`].
    Reject,
    /// Raise every eigenvalue of the covariance to at least `min_variance` (yards²).
    VarianceFloor { min_variance: f64 },
    /// The player exerts no influence: density is zero everywhere.
    Zero,
}

impl Default for DegeneratePolicy {
    fn default() -> Self {
        Self::VarianceFloor { min_variance: 1.0 }
    }
}
