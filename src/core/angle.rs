use std::f64::consts::PI;

use nalgebra::Vector2;

/// Converts an angle in degrees to radians.
#[must_use]
pub fn to_radians(degrees: f64) -> f64 {
    degrees * (PI / 180.0)
}

/// Unit vector for a heading given in radians.
///
/// Headings are measured clockwise from the field's y axis, so the vector is
/// `(sin θ, cos θ)` as `(x, y)` rather than the usual `(cos θ, sin θ)`.
#[must_use]
pub fn heading_vector(radians: f64) -> Vector2<f64> {
    Vector2::new(radians.sin(), radians.cos())
}

/// Unit vector for a heading given in degrees.
#[must_use]
pub fn heading_vector_deg(degrees: f64) -> Vector2<f64> {
    heading_vector(to_radians(degrees))
}

/// Rotates a heading (clockwise from +y) into the counter-clockwise-from-+x
/// angle used by rotation matrices.
#[must_use]
pub fn to_standard_angle(heading_radians: f64) -> f64 {
    -(heading_radians - PI / 2.0)
}
