//! Sliding-window construction of supervised training pairs.

use ndarray::{s, Array2, Array3, ArrayView2};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum WindowError {
    #[error("window length and horizon must both be at least 1")]
    ZeroLength,

    #[error("need at least {required} rows to build one window, got {rows}")]
    TooShort { rows: usize, required: usize },

    #[error("target column {column} out of range for {width} features")]
    ColumnOutOfRange { column: usize, width: usize },
}

/// Supervised pairs: `x[i]` is a `time_steps × features` slice and `y[i]`
/// holds the next `future_days` values of the target column.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowedDataset {
    pub x: Array3<f64>,
    pub y: Array2<f64>,
}

impl WindowedDataset {
    pub fn len(&self) -> usize {
        self.x.shape()[0]
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn time_steps(&self) -> usize {
        self.x.shape()[1]
    }

    pub fn n_features(&self) -> usize {
        self.x.shape()[2]
    }

    pub fn horizon(&self) -> usize {
        self.y.ncols()
    }

    /// Split into `[0, index)` and `[index, len)`, keeping time order.
    pub fn split_at(&self, index: usize) -> (WindowedDataset, WindowedDataset) {
        let index = index.min(self.len());
        let head = WindowedDataset {
            x: self.x.slice(s![..index, .., ..]).to_owned(),
            y: self.y.slice(s![..index, ..]).to_owned(),
        };
        let tail = WindowedDataset {
            x: self.x.slice(s![index.., .., ..]).to_owned(),
            y: self.y.slice(s![index.., ..]).to_owned(),
        };
        (head, tail)
    }
}

/// Number of windows a table of `rows` yields, or `None` when it is too short.
pub fn window_count(rows: usize, time_steps: usize, future_days: usize) -> Option<usize> {
    (rows + 1)
        .checked_sub(time_steps + future_days)
        .filter(|&n| n > 0)
}

/// Slide a `time_steps` window over `data`, pairing each position with the
/// next `future_days` values of `target_column`.
///
/// Yields exactly `rows - time_steps - future_days + 1` pairs.
pub fn build_windows(
    data: ArrayView2<'_, f64>,
    time_steps: usize,
    future_days: usize,
    target_column: usize,
) -> Result<WindowedDataset, WindowError> {
    if time_steps == 0 || future_days == 0 {
        return Err(WindowError::ZeroLength);
    }
    let (rows, width) = data.dim();
    if target_column >= width {
        return Err(WindowError::ColumnOutOfRange {
            column: target_column,
            width,
        });
    }
    let count = window_count(rows, time_steps, future_days).ok_or(WindowError::TooShort {
        rows,
        required: time_steps + future_days,
    })?;

    let mut x = Array3::zeros((count, time_steps, width));
    let mut y = Array2::zeros((count, future_days));

    for i in 0..count {
        let end = i + time_steps;
        x.slice_mut(s![i, .., ..])
            .assign(&data.slice(s![i..end, ..]));
        y.slice_mut(s![i, ..])
            .assign(&data.slice(s![end..end + future_days, target_column]));
    }

    Ok(WindowedDataset { x, y })
}
