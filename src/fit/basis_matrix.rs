//! Basis matrix `A`: every input coordinate expanded into polynomial columns.
//!
//! Column order is block-major, then vector-within-block, then increasing
//! degree. Downstream stages slice `A` through `BlockLayout`, so this order
//! must match `BlockLayout::vector_basis_ranges` exactly.

use nalgebra::DMatrix;

use crate::domain::{BlockLayout, PolyFamily};
use crate::error::IdentError;
use crate::math::{evaluate, log_shift_matrix};

#[derive(Debug, Clone, PartialEq)]
pub struct BasisMatrix {
    pub a: DMatrix<f64>,
    /// `ln(A + 1 + LOG_OFFSET)`, the design used by every fit.
    pub a_log: DMatrix<f64>,
}

/// Expand normalized inputs `x` (n × input vectors) into `A`.
pub fn build_basis_matrix(
    x: &DMatrix<f64>,
    layout: &BlockLayout,
    family: PolyFamily,
) -> Result<BasisMatrix, IdentError> {
    if x.ncols() != layout.input_vectors() {
        return Err(IdentError::Shape(format!(
            "expected {} input columns, got {}",
            layout.input_vectors(),
            x.ncols()
        )));
    }
    for span in layout.basis_spans() {
        span.require_nonempty("basis")?;
    }

    let n = x.nrows();
    let mut a = DMatrix::<f64>::zeros(n, layout.basis_columns());
    for (v, (_, range)) in layout.vector_basis_ranges().into_iter().enumerate() {
        for (degree, col) in range.enumerate() {
            for i in 0..n {
                a[(i, col)] = evaluate(family, degree, x[(i, v)]);
            }
        }
    }

    let a_log = log_shift_matrix(&a);
    log::info!("basis matrix A: {}x{} ({})", a.nrows(), a.ncols(), family.name());
    Ok(BasisMatrix { a, a_log })
}
