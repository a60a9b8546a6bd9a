//! Per-column min-max scaling to `[0, 1]`.

use ndarray::{Array1, Array2, ArrayView2, Axis};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ScalerError {
    #[error("cannot fit a scaler on an empty matrix")]
    Empty,

    #[error("non-finite value at row {row}, column {column}")]
    NonFinite { row: usize, column: usize },

    #[error("expected {expected} columns, got {actual}")]
    WidthMismatch { expected: usize, actual: usize },

    #[error("column {column} out of range for {width} features")]
    ColumnOutOfRange { column: usize, width: usize },
}

/// Fitted min-max transform: `x' = (x - min) / (max - min)` per column.
///
/// Columns are scaled independently. A constant column (max == min) uses a
/// unit range, so it maps to 0 and inverts back exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinMaxScaler {
    data_min: Array1<f64>,
    data_max: Array1<f64>,
}

impl MinMaxScaler {
    /// Fit per-column ranges over every row of `data`.
    pub fn fit(data: ArrayView2<'_, f64>) -> Result<Self, ScalerError> {
        if data.nrows() == 0 || data.ncols() == 0 {
            return Err(ScalerError::Empty);
        }
        check_finite(data)?;

        let data_min = data.fold_axis(Axis(0), f64::INFINITY, |acc, &x| acc.min(x));
        let data_max = data.fold_axis(Axis(0), f64::NEG_INFINITY, |acc, &x| acc.max(x));
        Ok(Self { data_min, data_max })
    }

    pub fn n_features(&self) -> usize {
        self.data_min.len()
    }

    pub fn data_min(&self) -> &Array1<f64> {
        &self.data_min
    }

    pub fn data_max(&self) -> &Array1<f64> {
        &self.data_max
    }

    fn range(&self) -> Array1<f64> {
        (&self.data_max - &self.data_min).mapv(|r| if r == 0.0 { 1.0 } else { r })
    }

    /// Scale rows into the fitted unit range.
    pub fn transform(&self, data: ArrayView2<'_, f64>) -> Result<Array2<f64>, ScalerError> {
        self.check_width(data.ncols())?;
        check_finite(data)?;
        Ok((&data - &self.data_min) / &self.range())
    }

    /// Map scaled rows back to original units.
    pub fn inverse_transform(&self, data: ArrayView2<'_, f64>) -> Result<Array2<f64>, ScalerError> {
        self.check_width(data.ncols())?;
        Ok(&data * &self.range() + &self.data_min)
    }

    /// Invert a single scaled column.
    ///
    /// Builds a `values.len() × n_features` matrix with `values` in `column`
    /// and zeros elsewhere, inverts the whole matrix, and keeps `column`. The
    /// placeholder columns never influence the result because each column's
    /// transform is linear and independent of the others; a scaler that
    /// mixed columns would need a different inversion.
    pub fn inverse_column(&self, column: usize, values: &[f64]) -> Result<Vec<f64>, ScalerError> {
        let width = self.n_features();
        if column >= width {
            return Err(ScalerError::ColumnOutOfRange { column, width });
        }

        let mut padded = Array2::zeros((values.len(), width));
        for (cell, &v) in padded.column_mut(column).iter_mut().zip(values) {
            *cell = v;
        }
        let restored = self.inverse_transform(padded.view())?;
        Ok(restored.column(column).to_vec())
    }

    fn check_width(&self, actual: usize) -> Result<(), ScalerError> {
        let expected = self.n_features();
        if actual != expected {
            return Err(ScalerError::WidthMismatch { expected, actual });
        }
        Ok(())
    }
}

fn check_finite(data: ArrayView2<'_, f64>) -> Result<(), ScalerError> {
    match data.indexed_iter().find(|(_, v)| !v.is_finite()) {
        Some(((row, column), _)) => Err(ScalerError::NonFinite { row, column }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn fit_transform_maps_to_unit_range() {
        let data = array![[1.0, 10.0], [3.0, 30.0], [2.0, 20.0]];
        let scaler = MinMaxScaler::fit(data.view()).unwrap();
        let scaled = scaler.transform(data.view()).unwrap();
        assert_eq!(scaled, array![[0.0, 0.0], [1.0, 1.0], [0.5, 0.5]]);
    }

    #[test]
    fn constant_column_maps_to_zero_and_back() {
        let data = array![[5.0, 1.0], [5.0, 2.0]];
        let scaler = MinMaxScaler::fit(data.view()).unwrap();
        let scaled = scaler.transform(data.view()).unwrap();
        assert_eq!(scaled.column(0).to_vec(), vec![0.0, 0.0]);
        let back = scaler.inverse_transform(scaled.view()).unwrap();
        assert_eq!(back, data);
    }

    #[test]
    fn inverse_column_ignores_placeholder_columns() {
        let data = array![
            [10.0, 12.0, 9.0, 11.0, 1_000.0],
            [20.0, 22.0, 19.0, 21.0, 5_000.0],
            [15.0, 17.0, 14.0, 16.0, 3_000.0],
        ];
        let scaler = MinMaxScaler::fit(data.view()).unwrap();
        let scaled = scaler.transform(data.view()).unwrap();
        let closes: Vec<f64> = scaled.column(3).to_vec();
        let restored = scaler.inverse_column(3, &closes).unwrap();
        for (r, o) in restored.iter().zip([11.0, 21.0, 16.0]) {
            assert!((r - o).abs() < 1e-9, "{r} vs {o}");
        }
    }

    #[test]
    fn values_outside_fit_range_extrapolate() {
        let data = array![[0.0], [10.0]];
        let scaler = MinMaxScaler::fit(data.view()).unwrap();
        let scaled = scaler.transform(array![[15.0]].view()).unwrap();
        assert_eq!(scaled[[0, 0]], 1.5);
    }

    #[test]
    fn rejects_bad_input() {
        let empty = Array2::<f64>::zeros((0, 5));
        assert_eq!(MinMaxScaler::fit(empty.view()), Err(ScalerError::Empty));

        let nan = array![[1.0, f64::NAN]];
        assert_eq!(
            MinMaxScaler::fit(nan.view()),
            Err(ScalerError::NonFinite { row: 0, column: 1 })
        );

        let scaler = MinMaxScaler::fit(array![[1.0, 2.0]].view()).unwrap();
        assert_eq!(
            scaler.transform(array![[1.0, 2.0, 3.0]].view()),
            Err(ScalerError::WidthMismatch { expected: 2, actual: 3 })
        );
        assert_eq!(
            scaler.inverse_column(2, &[0.5]),
            Err(ScalerError::ColumnOutOfRange { column: 2, width: 2 })
        );
    }
}
