//! Reflectance band grids
//!
//! A [`BandGrid`] is a dense row-major 2-D grid of surface reflectance
//! values backed by `ndarray`. Missing or unusable pixels carry `NaN`;
//! every consumer in the pipeline treats `NaN` as "excluded", so no
//! separate validity mask needs to travel with the data.

use crate::error::{Error, Result};
use ndarray::{Array2, ArrayView2};

/// A single 2-D reflectance band.
///
/// Values are dimensionless surface reflectance, nominally in `[0, 1]`.
/// Out-of-range values are not rejected here because masking rules
/// differ per index; index calculators decide what to exclude.
#[derive(Debug, Clone, PartialEq)]
pub struct BandGrid {
    data: Array2<f64>,
}

impl BandGrid {
    /// Create a band from a row-major value vector.
    pub fn from_vec(rows: usize, cols: usize, values: Vec<f64>) -> Result<Self> {
        if rows == 0 || cols == 0 {
            return Err(Error::InvalidDimensions { rows, cols });
        }
        if values.len() != rows * cols {
            return Err(Error::InvalidParameter {
                name: "values",
                value: values.len().to_string(),
                reason: format!("expected {} values for a {}x{} grid", rows * cols, rows, cols),
            });
        }
        let data = Array2::from_shape_vec((rows, cols), values)
            .map_err(|e| Error::Other(e.to_string()))?;
        Ok(BandGrid { data })
    }

    /// Create a band filled with a constant value.
    pub fn filled(rows: usize, cols: usize, value: f64) -> Result<Self> {
        if rows == 0 || cols == 0 {
            return Err(Error::InvalidDimensions { rows, cols });
        }
        Ok(BandGrid {
            data: Array2::from_elem((rows, cols), value),
        })
    }

    /// Wrap an existing array.
    pub fn from_array(data: Array2<f64>) -> Result<Self> {
        let (rows, cols) = data.dim();
        if rows == 0 || cols == 0 {
            return Err(Error::InvalidDimensions { rows, cols });
        }
        Ok(BandGrid { data })
    }

    pub fn rows(&self) -> usize {
        self.data.nrows()
    }

    pub fn cols(&self) -> usize {
        self.data.ncols()
    }

    /// `(rows, cols)` pair.
    pub fn shape(&self) -> (usize, usize) {
        self.data.dim()
    }

    /// Total number of pixels.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Value at `(row, col)`, or `None` when out of bounds.
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        self.data.get((row, col)).copied()
    }

    /// Value at `(row, col)` without bounds checking.
    ///
    /// # Safety
    /// `row < rows()` and `col < cols()` must hold.
    #[inline]
    pub unsafe fn get_unchecked(&self, row: usize, col: usize) -> f64 {
        debug_assert!(row < self.rows() && col < self.cols());
        *self.data.uget((row, col))
    }

    /// Number of pixels that are not `NaN`.
    pub fn valid_count(&self) -> usize {
        self.data.iter().filter(|v| !v.is_nan()).count()
    }

    pub fn view(&self) -> ArrayView2<'_, f64> {
        self.data.view()
    }

    pub fn data(&self) -> &Array2<f64> {
        &self.data
    }

    pub fn into_inner(self) -> Array2<f64> {
        self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_vec() {
        let b = BandGrid::from_vec(2, 3, vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6]).unwrap();
        assert_eq!(b.shape(), (2, 3));
        assert_eq!(b.get(0, 0), Some(0.1));
        assert_eq!(b.get(1, 2), Some(0.6));
        assert_eq!(b.get(2, 0), None);
    }

    #[test]
    fn test_from_vec_length_mismatch() {
        let b = BandGrid::from_vec(2, 2, vec![1.0, 2.0, 3.0]);
        assert!(matches!(b, Err(Error::InvalidParameter { .. })));
    }

    #[test]
    fn test_zero_sized_rejected() {
        assert!(matches!(
            BandGrid::from_vec(0, 5, vec![]),
            Err(Error::InvalidDimensions { rows: 0, cols: 5 })
        ));
        assert!(BandGrid::filled(3, 0, 1.0).is_err());
    }

    #[test]
    fn test_valid_count_ignores_nan() {
        let b = BandGrid::from_vec(2, 2, vec![0.1, f64::NAN, 0.3, f64::NAN]).unwrap();
        assert_eq!(b.valid_count(), 2);
        assert_eq!(b.len(), 4);
    }

    #[test]
    fn test_get_unchecked_matches_get() {
        let b = BandGrid::filled(4, 4, 0.25).unwrap();
        for row in 0..4 {
            for col in 0..4 {
                let v = unsafe { b.get_unchecked(row, col) };
                assert_eq!(Some(v), b.get(row, col));
            }
        }
    }
}
