//! Shared log/exp transform for the multiplicative model.
//!
//! Forward: `ln(v + 1 + LOG_OFFSET)`. Inverse: `exp(v) - 1 - LOG_OFFSET`.
//! Every stage uses this pair so the inverse cancels the forward exactly.

use nalgebra::DMatrix;

/// Keeps the log argument strictly positive when `v` is exactly zero.
pub const LOG_OFFSET: f64 = 1e-10;

pub fn log_shift(v: f64) -> f64 {
    (v + 1.0 + LOG_OFFSET).ln()
}

pub fn exp_unshift(v: f64) -> f64 {
    v.exp() - 1.0 - LOG_OFFSET
}

pub fn log_shift_matrix(m: &DMatrix<f64>) -> DMatrix<f64> {
    m.map(log_shift)
}

pub fn exp_unshift_matrix(m: &DMatrix<f64>) -> DMatrix<f64> {
    m.map(exp_unshift)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn zero_maps_to_finite_log() {
        assert!(log_shift(0.0).is_finite());
        assert!(log_shift(-1.0).is_finite());
        assert_abs_diff_eq!(log_shift(0.0), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn transform_round_trip_recovers_non_negative_matrix() {
        let m = DMatrix::from_row_slice(3, 3, &[0.0, 0.5, 1.0, 2.0, 10.0, 1e-6, 0.25, 3.5, 100.0]);
        let back = exp_unshift_matrix(&log_shift_matrix(&m));
        assert_abs_diff_eq!(back, m, epsilon = 1e-8);
    }
}
