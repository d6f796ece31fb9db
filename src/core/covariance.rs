use nalgebra::Matrix2;
use tracing::trace;

use super::angle::{to_radians, to_standard_angle};

/// Rotation by `theta` radians counter-clockwise.
#[must_use]
pub fn rotation(theta: f64) -> Matrix2<f64> {
    let (sin, cos) = theta.sin_cos();
    Matrix2::new(cos, -sin, sin, cos)
}

/// Builds the covariance of a player's influence from their motion.
///
/// The heading is turned into a standard angle `theta`, and speed (times
/// acceleration, when given) is projected onto the rotated axes to form the
/// diagonal scale `S = diag(v cos θ, v sin θ)`. The covariance is
/// `R(θ) · S · S · R(θ)⁻¹`, whose eigenvalues are `v² cos² θ` and `v² sin² θ`.
///
/// The result is symmetric positive semi-definite but singular whenever the
/// scale has a zero entry: zero speed, zero acceleration, or a heading that
/// lies exactly on a field axis. Singular matrices are returned as is and
/// handled by [`crate::core::field::InfluenceField`].
#[must_use]
#[tracing::instrument(level = "trace")]
pub fn build_covariance(direction_deg: f64, speed: f64, acceleration: Option<f64>) -> Matrix2<f64> {
    trace!("Building covariance");
    let theta = to_standard_angle(to_radians(direction_deg));
    let rotation = rotation(theta);
    let magnitude = acceleration.map_or(speed, |acceleration| speed * acceleration);
    let scale = Matrix2::new(magnitude * theta.cos(), 0.0, 0.0, magnitude * theta.sin());

    // the inverse of a rotation is its transpose
    rotation * scale * scale * rotation.transpose()
}

/// Largest absolute difference between the matrix and its transpose.
#[must_use]
pub fn asymmetry(matrix: &Matrix2<f64>) -> f64 {
    (matrix[(0, 1)] - matrix[(1, 0)]).abs()
}
