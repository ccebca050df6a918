//! Psi / a / Phi aggregation, all in log space and per output dimension.
//!
//! - Psi: one column per input vector, `A_log[:, vec] · λ[vec]`
//! - a: block-local weights with `Psi_log[:, block] · a_block ≈ ln(Y + 1 + ε)`,
//!   always solved block by block
//! - Phi: one column per block, `Psi_log[:, block] · a[block]`

use std::ops::Range;

use nalgebra::{DMatrix, DVector};
use rayon::prelude::*;

use crate::domain::{BlockId, BlockSpan, SolverSettings};
use crate::error::IdentError;
use crate::fit::diagnostics::{SolveReport, Stage};
use crate::math::minimize;

#[derive(Debug, Clone, PartialEq)]
pub struct BlockWeights {
    /// input vectors × output dimensions
    pub a: DMatrix<f64>,
    pub reports: Vec<SolveReport>,
}

/// Build `Psi_log` for every output column of `lambda`.
///
/// `vector_ranges[v]` is the basis column range of input vector `v`.
pub fn build_psi(
    a_log: &DMatrix<f64>,
    lambda: &DMatrix<f64>,
    vector_ranges: &[(BlockId, Range<usize>)],
) -> Result<Vec<DMatrix<f64>>, IdentError> {
    if lambda.nrows() != a_log.ncols() {
        return Err(IdentError::Shape(format!(
            "lambda has {} rows but A has {} columns",
            lambda.nrows(),
            a_log.ncols()
        )));
    }

    let n = a_log.nrows();
    let mut out = Vec::with_capacity(lambda.ncols());
    for j in 0..lambda.ncols() {
        let mut psi = DMatrix::<f64>::zeros(n, vector_ranges.len());
        for (v, (block, range)) in vector_ranges.iter().enumerate() {
            if range.is_empty() {
                return Err(IdentError::Configuration(format!(
                    "input vector {v} of block {} has no basis columns",
                    block.label()
                )));
            }
            let len = range.end - range.start;
            let col = a_log.columns(range.start, len) * lambda.view((range.start, j), (len, 1));
            psi.set_column(v, &col.column(0));
        }
        out.push(psi);
    }
    Ok(out)
}

/// Fit block weights `a` for every output.
///
/// `y_log` is `ln(Y + 1 + ε)` (n × output dimensions).
pub fn fit_block_weights(
    psi_log: &[DMatrix<f64>],
    y_log: &DMatrix<f64>,
    spans: &[BlockSpan],
    solver: &SolverSettings,
) -> Result<BlockWeights, IdentError> {
    if psi_log.len() != y_log.ncols() {
        return Err(IdentError::Shape(format!(
            "{} Psi matrices for {} outputs",
            psi_log.len(),
            y_log.ncols()
        )));
    }
    for span in spans {
        span.require_nonempty("input vector")?;
    }
    let vectors = psi_log.first().map(|m| m.ncols()).unwrap_or(0);

    let per_output = psi_log
        .par_iter()
        .enumerate()
        .map(|(j, psi)| -> Result<(DVector<f64>, Vec<SolveReport>), IdentError> {
            let target = y_log.column(j).into_owned();
            let mut a = DVector::<f64>::zeros(psi.ncols());
            let mut reports = Vec::with_capacity(spans.len());
            for span in spans {
                let slice = psi.columns(span.start, span.len()).into_owned();
                let out = minimize(&slice, &target, solver)?;
                a.rows_mut(span.start, span.len()).copy_from(&out.x);
                reports.push(SolveReport::new(Stage::BlockWeights, j, Some(span.block), &out));
            }
            Ok((a, reports))
        })
        .collect::<Result<Vec<_>, IdentError>>()?;

    let mut a = DMatrix::<f64>::zeros(vectors, y_log.ncols());
    let mut reports = Vec::new();
    for (j, (col, r)) in per_output.into_iter().enumerate() {
        a.set_column(j, &col);
        reports.extend(r);
    }
    Ok(BlockWeights { a, reports })
}

/// Build `Phi_log` (n × blocks) for every output.
pub fn build_phi(
    psi_log: &[DMatrix<f64>],
    a: &DMatrix<f64>,
    spans: &[BlockSpan],
) -> Result<Vec<DMatrix<f64>>, IdentError> {
    let mut out = Vec::with_capacity(psi_log.len());
    for (j, psi) in psi_log.iter().enumerate() {
        if psi.ncols() != a.nrows() {
            return Err(IdentError::Shape(format!(
                "Psi{} has {} columns but a has {} rows",
                j + 1,
                psi.ncols(),
                a.nrows()
            )));
        }
        let mut phi = DMatrix::<f64>::zeros(psi.nrows(), spans.len());
        for (b, span) in spans.iter().enumerate() {
            span.require_nonempty("input vector")?;
            let col = psi.columns(span.start, span.len()) * a.view((span.start, j), (span.len(), 1));
            phi.set_column(b, &col.column(0));
        }
        out.push(phi);
    }
    Ok(out)
}
