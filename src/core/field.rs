use std::f64::consts::PI;

use nalgebra::{Matrix2, Point2};
use tracing::{debug, trace};

use super::{config::model::DegeneratePolicy, error::InfluenceError};

/// Eigenvalues below this multiple of machine epsilon, relative to the
/// largest eigenvalue, count as zero.
const SINGULAR_CUTOFF: f64 = 1e6 * f64::EPSILON;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Density {
    Gaussian { precision: Matrix2<f64>, scale: f64 },
    Zero,
}

/// Bivariate normal density centered on a player.
#[derive(Debug, Clone, PartialEq)]
pub struct InfluenceField {
    mean: Point2<f64>,
    covariance: Matrix2<f64>,
    density: Density,
}

impl InfluenceField {
    /// Creates a field from a mean and a covariance, applying `policy` to
    /// singular covariances.
    ///
    /// # Errors
    ///
    /// Returns [`InfluenceError::DegenerateCovariance`] if the covariance is
    /// singular and the policy is [`DegeneratePolicy::Reject`], or if it is
    /// not finite.
    #[tracing::instrument(level = "trace")]
    pub fn new(
        mean: Point2<f64>,
        covariance: Matrix2<f64>,
        policy: DegeneratePolicy,
    ) -> Result<Self, InfluenceError> {
        trace!("Creating influence field");
        let degenerate = || InfluenceError::DegenerateCovariance {
            player: None,
            determinant: covariance.determinant(),
        };
        if !covariance.iter().all(|v| v.is_finite()) {
            return Err(degenerate());
        }

        let covariance = match policy {
            DegeneratePolicy::VarianceFloor { min_variance } if is_singular(&covariance) => {
                debug!("Singular covariance, raising eigenvalues to {min_variance}");
                with_variance_floor(&covariance, min_variance)
            }
            _ => covariance,
        };

        if is_singular(&covariance) {
            return match policy {
                DegeneratePolicy::Zero => {
                    debug!("Singular covariance, using zero density");
                    Ok(Self {
                        mean,
                        covariance,
                        density: Density::Zero,
                    })
                }
                _ => Err(degenerate()),
            };
        }

        let precision = covariance.try_inverse().ok_or_else(degenerate)?;
        let scale = 1.0 / (2.0 * PI * covariance.determinant().sqrt());

        Ok(Self {
            mean,
            covariance,
            density: Density::Gaussian { precision, scale },
        })
    }

    #[must_use]
    pub const fn mean(&self) -> Point2<f64> {
        self.mean
    }

    /// The covariance actually used. Differs from the input only when a
    /// singular input was floored.
    #[must_use]
    pub const fn covariance(&self) -> Matrix2<f64> {
        self.covariance
    }

    /// True if the field evaluates to zero everywhere.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        matches!(self.density, Density::Zero)
    }

    /// Inverse covariance and normalization constant, `None` for a zero field.
    #[must_use]
    pub const fn gaussian_parts(&self) -> Option<(Matrix2<f64>, f64)> {
        match self.density {
            Density::Gaussian { precision, scale } => Some((precision, scale)),
            Density::Zero => None,
        }
    }

    /// Density at field coordinates `(x, y)`.
    #[must_use]
    pub fn density(&self, x: f64, y: f64) -> f64 {
        match self.density {
            Density::Gaussian { precision, scale } => {
                gaussian(&precision, scale, x - self.mean.x, y - self.mean.y)
            }
            Density::Zero => 0.0,
        }
    }
}

/// Normal density for an offset `(dx, dy)` from the mean.
#[inline]
pub(crate) fn gaussian(precision: &Matrix2<f64>, scale: f64, dx: f64, dy: f64) -> f64 {
    let mahalanobis = precision[(1, 1)].mul_add(
        dy * dy,
        precision[(0, 0)].mul_add(dx * dx, 2.0 * precision[(0, 1)] * dx * dy),
    );
    scale * (-0.5 * mahalanobis).exp()
}

/// A symmetric covariance is singular when its smallest eigenvalue is
/// negligible compared to its largest one.
#[must_use]
pub fn is_singular(covariance: &Matrix2<f64>) -> bool {
    let eigenvalues = covariance.symmetric_eigenvalues();
    let largest = eigenvalues.amax();
    let smallest = eigenvalues.min();
    smallest <= SINGULAR_CUTOFF * largest
}

/// Raises every eigenvalue of a symmetric matrix to at least `min_variance`.
#[must_use]
pub fn with_variance_floor(covariance: &Matrix2<f64>, min_variance: f64) -> Matrix2<f64> {
    let mut eigen = covariance.symmetric_eigen();
    eigen
        .eigenvalues
        .iter_mut()
        .for_each(|value| *value = value.max(min_variance));
    eigen.recompose()
}
