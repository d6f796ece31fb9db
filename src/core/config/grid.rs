use serde::{Deserialize, Serialize};

/// Raster dimensions, one cell per yard.
///
/// Array row `r` holds field `y = height - 1 - r` so that row 0 is the
/// highest sampled `y`. Array column `c` holds field `x = c`.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
pub struct Grid {
    pub width: usize,
    pub height: usize,
}

impl Default for Grid {
    /// 120 x 57 yards, covering the full field including end zones.
    fn default() -> Self {
        Self {
            width: 120,
            height: 57,
        }
    }
}

impl Grid {
    /// Shape of a raster over this grid as `(rows, columns)`.
    #[must_use]
    pub const fn shape(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    #[must_use]
    pub const fn cell_count(&self) -> usize {
        self.width.saturating_mul(self.height)
    }

    /// Field coordinates `(x, y)` sampled by array cell `(row, col)`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn field_coordinates(&self, row: usize, col: usize) -> (f64, f64) {
        (col as f64, (self.height - 1 - row) as f64)
    }

    /// Array cell `(row, col)` sampling the yard nearest to `(x, y)`, if inside the grid.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn cell_of(&self, x: f64, y: f64) -> Option<(usize, usize)> {
        let x = x.round_ties_even();
        let y = y.round_ties_even();
        if !(x.is_finite() && y.is_finite()) || x < 0.0 || y < 0.0 {
            return None;
        }
        let (col, field_row) = (x as usize, y as usize);
        if col >= self.width || field_row >= self.height {
            return None;
        }
        Some((self.height - 1 - field_row, col))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_row_is_highest_y() {
        let grid = Grid::default();

        assert_eq!(grid.field_coordinates(0, 0), (0.0, 56.0));
        assert_eq!(grid.field_coordinates(grid.height - 1, 0), (0.0, 0.0));
        assert_eq!(grid.field_coordinates(3, 119), (119.0, 53.0));
    }

    #[test]
    fn cell_of_inverts_field_coordinates() {
        let grid = Grid {
            width: 7,
            height: 4,
        };
        for row in 0..grid.height {
            for col in 0..grid.width {
                let (x, y) = grid.field_coordinates(row, col);
                assert_eq!(grid.cell_of(x, y), Some((row, col)));
            }
        }
    }

    #[test]
    fn cell_of_outside_is_none() {
        let grid = Grid::default();

        assert_eq!(grid.cell_of(-1.0, 10.0), None);
        assert_eq!(grid.cell_of(120.0, 10.0), None);
        assert_eq!(grid.cell_of(10.0, 57.0), None);
        assert_eq!(grid.cell_of(f64::NAN, 10.0), None);
    }

    #[test]
    fn cell_of_rounds_half_to_even() {
        let grid = Grid::default();

        assert_eq!(grid.cell_of(2.5, 56.0), Some((0, 2)));
        assert_eq!(grid.cell_of(3.5, 56.0), Some((0, 4)));
    }
}
