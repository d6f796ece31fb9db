use itertools::{iproduct, Itertools};
use nalgebra::{Matrix2, Point2};
use ndarray::{Array1, Array2, Zip};
use ndarray_stats::QuantileExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::{
    config::{
        grid::Grid,
        model::{EvaluationStrategy, Model},
    },
    error::InfluenceError,
    field::{gaussian, InfluenceField},
};

/// Density of one player's influence sampled on a [`Grid`].
///
/// Has dimensions (`height` `width`). Row 0 holds the highest field `y`.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct InfluenceRaster {
    pub values: Array2<f64>,
}

impl InfluenceRaster {
    #[must_use]
    pub fn empty(grid: &Grid) -> Self {
        Self {
            values: Array2::zeros(grid.shape()),
        }
    }

    /// Samples `field` at every cell of `grid`.
    #[must_use]
    #[tracing::instrument(level = "trace", skip(field))]
    pub fn from_field(field: &InfluenceField, grid: &Grid, strategy: EvaluationStrategy) -> Self {
        trace!("Rasterizing influence field");
        let values = match strategy {
            EvaluationStrategy::Scalar => fill_scalar(field, grid),
            EvaluationStrategy::Batched => fill_batched(field, grid),
            EvaluationStrategy::Parallel => fill_parallel(field, grid),
        };
        Self { values }
    }

    /// `[rows, columns]` of the underlying array.
    #[must_use]
    pub fn shape(&self) -> [usize; 2] {
        let (rows, cols) = self.values.dim();
        [rows, cols]
    }

    /// Largest sampled density, zero for an empty raster.
    #[must_use]
    pub fn peak(&self) -> f64 {
        (*self.values.max_skipnan()).max(0.0)
    }
}

/// Builds the field for `mean` and `covariance` and rasterizes it on `grid`.
///
/// # Errors
///
/// Returns [`InfluenceError::DegenerateCovariance`] if the covariance is
/// singular and the model's policy rejects it.
#[tracing::instrument(level = "debug", skip(model))]
pub fn rasterize_influence(
    mean: Point2<f64>,
    covariance: Matrix2<f64>,
    grid: &Grid,
    model: &Model,
) -> Result<InfluenceRaster, InfluenceError> {
    debug!("Rasterizing influence");
    let field = InfluenceField::new(mean, covariance, model.degenerate_policy)?;
    Ok(InfluenceRaster::from_field(&field, grid, model.evaluation))
}

fn fill_scalar(field: &InfluenceField, grid: &Grid) -> Array2<f64> {
    let mut values = Array2::zeros(grid.shape());
    for field_y in 0..grid.height {
        let row = grid.height - 1 - field_y;
        for col in 0..grid.width {
            #[allow(clippy::cast_precision_loss)]
            let density = field.density(col as f64, field_y as f64);
            values[(row, col)] = density;
        }
    }
    values
}

/// Evaluates all cells at once from the flattened row/column cross product
/// and scatters the densities back into the grid.
fn fill_batched(field: &InfluenceField, grid: &Grid) -> Array2<f64> {
    let mut values = Array2::zeros(grid.shape());
    let Some((precision, scale)) = field.gaussian_parts() else {
        return values;
    };
    let mean = field.mean();

    let (rows, cols): (Vec<usize>, Vec<usize>) =
        iproduct!(0..grid.height, 0..grid.width).unzip();
    #[allow(clippy::cast_precision_loss)]
    let dx: Array1<f64> = cols.iter().map(|&col| col as f64 - mean.x).collect();
    #[allow(clippy::cast_precision_loss)]
    let dy: Array1<f64> = rows
        .iter()
        .map(|&row| (grid.height - 1 - row) as f64 - mean.y)
        .collect();

    let densities = Zip::from(&dx)
        .and(&dy)
        .map_collect(|&dx, &dy| gaussian(&precision, scale, dx, dy));

    rows.into_iter()
        .zip_eq(cols)
        .zip_eq(densities.iter())
        .for_each(|((row, col), density)| values[(row, col)] = *density);
    values
}

fn fill_parallel(field: &InfluenceField, grid: &Grid) -> Array2<f64> {
    let mut values = Array2::zeros(grid.shape());
    if field.is_zero() {
        return values;
    }
    Zip::indexed(&mut values).par_for_each(|(row, col), value| {
        let (x, y) = grid.field_coordinates(row, col);
        *value = field.density(x, y);
    });
    values
}
