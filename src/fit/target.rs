//! Aggregate target `B` derived from normalized outputs.

use nalgebra::DMatrix;

use crate::domain::Weighting;
use crate::math::log_shift_matrix;

#[derive(Debug, Clone, PartialEq)]
pub struct TargetMatrix {
    pub b: DMatrix<f64>,
    pub b_log: DMatrix<f64>,
}

/// Build `B` (and its log transform) from normalized `Y` (n × dimY).
pub fn build_target(y: &DMatrix<f64>, weighting: Weighting) -> TargetMatrix {
    let b = match weighting {
        Weighting::Scaled => y.clone(),
        Weighting::Average => {
            let mut b = DMatrix::zeros(y.nrows(), y.ncols());
            for (i, row) in y.row_iter().enumerate() {
                let mid = (row.max() + row.min()) / 2.0;
                b.row_mut(i).fill(mid);
            }
            b
        }
    };
    let b_log = log_shift_matrix(&b);
    TargetMatrix { b, b_log }
}
