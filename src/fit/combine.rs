//! Final combination: weights `c`, reconstruction `F`, error norms.

use nalgebra::{DMatrix, DVector};
use rayon::prelude::*;

use crate::domain::SolverSettings;
use crate::error::IdentError;
use crate::fit::diagnostics::{SolveReport, Stage};
use crate::math::{exp_unshift_matrix, minimize};

#[derive(Debug, Clone, PartialEq)]
pub struct Combination {
    /// blocks × output dimensions
    pub c: DMatrix<f64>,
    pub reports: Vec<SolveReport>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Reconstruction {
    pub f_log: DMatrix<f64>,
    /// `exp(F_log) - 1 - LOG_OFFSET`, normalized scale.
    pub f: DMatrix<f64>,
}

/// Fit `c` so that `Phi_log · c ≈ y_log` for every output.
pub fn fit_combination(
    phi_log: &[DMatrix<f64>],
    y_log: &DMatrix<f64>,
    solver: &SolverSettings,
) -> Result<Combination, IdentError> {
    if phi_log.len() != y_log.ncols() {
        return Err(IdentError::Shape(format!(
            "{} Phi matrices for {} outputs",
            phi_log.len(),
            y_log.ncols()
        )));
    }
    let blocks = phi_log.first().map(|m| m.ncols()).unwrap_or(0);

    let columns = phi_log
        .par_iter()
        .enumerate()
        .map(|(j, phi)| -> Result<(DVector<f64>, SolveReport), IdentError> {
            let out = minimize(phi, &y_log.column(j).into_owned(), solver)?;
            let report = SolveReport::new(Stage::Combination, j, None, &out);
            Ok((out.x, report))
        })
        .collect::<Result<Vec<_>, IdentError>>()?;

    let mut c = DMatrix::<f64>::zeros(blocks, y_log.ncols());
    let mut reports = Vec::with_capacity(columns.len());
    for (j, (col, report)) in columns.into_iter().enumerate() {
        c.set_column(j, &col);
        reports.push(report);
    }
    Ok(Combination { c, reports })
}

pub fn reconstruct(phi_log: &[DMatrix<f64>], c: &DMatrix<f64>) -> Result<Reconstruction, IdentError> {
    let n = phi_log.first().map(|m| m.nrows()).unwrap_or(0);
    let mut f_log = DMatrix::<f64>::zeros(n, phi_log.len());
    for (j, phi) in phi_log.iter().enumerate() {
        if phi.ncols() != c.nrows() || phi.nrows() != n {
            return Err(IdentError::Shape(format!(
                "Phi{} is {}x{}, expected {n}x{}",
                j + 1,
                phi.nrows(),
                phi.ncols(),
                c.nrows()
            )));
        }
        f_log.set_column(j, &(phi * c.column(j)));
    }
    let f = exp_unshift_matrix(&f_log);
    Ok(Reconstruction { f_log, f })
}

/// Infinity norm of `target - fit` per output column.
///
/// Any non-finite entry in `fit` is reported as `NumericalInstability` for
/// the first affected column.
pub fn approximation_error(target: &DMatrix<f64>, fit: &DMatrix<f64>) -> Result<Vec<f64>, IdentError> {
    if target.shape() != fit.shape() {
        return Err(IdentError::Shape(format!(
            "target is {:?} but fit is {:?}",
            target.shape(),
            fit.shape()
        )));
    }
    let mut errors = Vec::with_capacity(fit.ncols());
    for (j, (t, f)) in target.column_iter().zip(fit.column_iter()).enumerate() {
        if let Some(row) = f.iter().position(|v| !v.is_finite()) {
            return Err(IdentError::NumericalInstability {
                output: j,
                detail: format!("fitted value at row {row} is {}", f[row]),
            });
        }
        errors.push((t - f).amax());
    }
    Ok(errors)
}
