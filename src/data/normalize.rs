//! Per-column min–max normalization onto `[0, 1]`.
//!
//! The original `(min, max)` of every column is kept so fitted outputs can be
//! mapped back to the measurement scale.

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::error::IdentError;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColumnScale {
    pub min: f64,
    pub max: f64,
}

impl ColumnScale {
    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    pub fn normalize(&self, v: f64) -> f64 {
        (v - self.min) / self.span()
    }

    pub fn denormalize(&self, v: f64) -> f64 {
        v * self.span() + self.min
    }
}

/// Normalized copy of the sample plus the scales that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedSample {
    pub values: DMatrix<f64>,
    pub scales: Vec<ColumnScale>,
}

impl NormalizedSample {
    /// Map a block of normalized columns back to original scale.
    ///
    /// `first_column` is the sample column that `m`'s column 0 corresponds to.
    pub fn denormalize_columns(
        &self,
        m: &DMatrix<f64>,
        first_column: usize,
    ) -> Result<DMatrix<f64>, IdentError> {
        if first_column + m.ncols() > self.scales.len() {
            return Err(IdentError::Shape(format!(
                "cannot denormalize {} columns starting at {first_column}; sample has {}",
                m.ncols(),
                self.scales.len()
            )));
        }
        let mut out = m.clone();
        for (j, mut col) in out.column_iter_mut().enumerate() {
            let scale = self.scales[first_column + j];
            col.apply(|v| *v = scale.denormalize(*v));
        }
        Ok(out)
    }

    pub fn denormalize(&self) -> Result<DMatrix<f64>, IdentError> {
        self.denormalize_columns(&self.values, 0)
    }
}

/// Normalize every column of `sample` onto `[0, 1]`.
///
/// Fails with `DegenerateColumn` for a constant column and `NonFiniteValue`
/// for NaN/inf entries.
pub fn normalize(sample: &DMatrix<f64>) -> Result<NormalizedSample, IdentError> {
    let mut scales = Vec::with_capacity(sample.ncols());
    for (j, col) in sample.column_iter().enumerate() {
        if let Some(i) = col.iter().position(|v| !v.is_finite()) {
            return Err(IdentError::NonFiniteValue { row: i, column: j });
        }
        let scale = ColumnScale {
            min: col.min(),
            max: col.max(),
        };
        if !(scale.span() > 0.0) {
            return Err(IdentError::DegenerateColumn {
                column: j,
                value: scale.min,
            });
        }
        scales.push(scale);
    }

    let mut values = sample.clone();
    for (j, mut col) in values.column_iter_mut().enumerate() {
        let scale = scales[j];
        col.apply(|v| *v = scale.normalize(*v));
    }

    Ok(NormalizedSample { values, scales })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn sample() -> DMatrix<f64> {
        DMatrix::from_row_slice(
            4,
            3,
            &[
                1.0, -5.0, 100.0, //
                2.0, 0.0, 250.0, //
                4.0, 5.0, 175.0, //
                3.0, 2.5, 400.0,
            ],
        )
    }

    #[test]
    fn columns_map_onto_unit_interval() {
        let norm = normalize(&sample()).unwrap();
        for col in norm.values.column_iter() {
            assert_abs_diff_eq!(col.min(), 0.0);
            assert_abs_diff_eq!(col.max(), 1.0);
        }
        assert_abs_diff_eq!(norm.values[(1, 1)], 0.5);
        assert_eq!(norm.scales[2], ColumnScale { min: 100.0, max: 400.0 });
    }

    #[test]
    fn denormalize_inverts_normalize() {
        let raw = sample();
        let back = normalize(&raw).unwrap().denormalize().unwrap();
        assert_abs_diff_eq!(back, raw, epsilon = 1e-12);
    }

    #[test]
    fn denormalize_columns_uses_offset_scales() {
        let norm = normalize(&sample()).unwrap();
        let tail = norm.values.columns(2, 1).into_owned();
        let back = norm.denormalize_columns(&tail, 2).unwrap();
        assert_abs_diff_eq!(back, sample().columns(2, 1).into_owned(), epsilon = 1e-12);
        assert!(norm.denormalize_columns(&tail, 3).is_err());
    }

    #[test]
    fn constant_column_is_flagged() {
        let raw = DMatrix::from_row_slice(3, 2, &[1.0, 7.0, 2.0, 7.0, 3.0, 7.0]);
        let err = normalize(&raw).unwrap_err();
        assert_eq!(err, IdentError::DegenerateColumn { column: 1, value: 7.0 });
    }

    #[test]
    fn nan_is_flagged() {
        let raw = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, f64::NAN, 3.0]);
        assert_eq!(
            normalize(&raw).unwrap_err(),
            IdentError::NonFiniteValue { row: 1, column: 0 }
        );
    }
}
