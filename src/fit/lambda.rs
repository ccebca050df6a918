//! Lambda estimation: basis coefficients with `A_log · λ ≈ B_log`.
//!
//! Two objectives:
//!
//! - `joint`: one solve over every basis column
//! - `split`: one solve per block slice, each fitted to the *same* target
//!   column on its own; the slices are stacked into one λ
//!
//! `split` is a different model, not an approximation of `joint`.

use nalgebra::{DMatrix, DVector};
use rayon::prelude::*;

use crate::domain::{BlockSpan, LambdaMode, SolverSettings};
use crate::error::IdentError;
use crate::fit::diagnostics::{SolveReport, Stage};
use crate::math::minimize;

#[derive(Debug, Clone, PartialEq)]
pub struct LambdaEstimate {
    /// basis columns × output dimensions
    pub lambda: DMatrix<f64>,
    pub reports: Vec<SolveReport>,
}

pub fn estimate_lambda(
    a_log: &DMatrix<f64>,
    b_log: &DMatrix<f64>,
    spans: &[BlockSpan],
    mode: LambdaMode,
    solver: &SolverSettings,
) -> Result<LambdaEstimate, IdentError> {
    for span in spans {
        span.require_nonempty("basis")?;
        if span.end > a_log.ncols() {
            return Err(IdentError::Shape(format!(
                "block {} spans basis columns {}..{} but A has {}",
                span.block.label(),
                span.start,
                span.end,
                a_log.ncols()
            )));
        }
    }

    let per_output = (0..b_log.ncols())
        .into_par_iter()
        .map(|j| -> Result<(DVector<f64>, Vec<SolveReport>), IdentError> {
            let target = b_log.column(j).into_owned();
            match mode {
                LambdaMode::Joint => {
                    let out = minimize(a_log, &target, solver)?;
                    let report = SolveReport::new(Stage::Lambda, j, None, &out);
                    Ok((out.x, vec![report]))
                }
                LambdaMode::Split => {
                    let mut lambda = DVector::<f64>::zeros(a_log.ncols());
                    let mut reports = Vec::with_capacity(spans.len());
                    for span in spans {
                        let slice = a_log.columns(span.start, span.len()).into_owned();
                        let out = minimize(&slice, &target, solver)?;
                        lambda.rows_mut(span.start, span.len()).copy_from(&out.x);
                        reports.push(SolveReport::new(Stage::Lambda, j, Some(span.block), &out));
                    }
                    Ok((lambda, reports))
                }
            }
        })
        .collect::<Result<Vec<_>, IdentError>>()?;

    let mut lambda = DMatrix::<f64>::zeros(a_log.ncols(), b_log.ncols());
    let mut reports = Vec::new();
    for (j, (col, r)) in per_output.into_iter().enumerate() {
        lambda.set_column(j, &col);
        reports.extend(r);
    }

    log::info!(
        "lambda ({:?}): {}x{}",
        mode,
        lambda.nrows(),
        lambda.ncols()
    );
    Ok(LambdaEstimate { lambda, reports })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BlockId, SolverKind};
    use approx::assert_abs_diff_eq;

    fn design() -> (DMatrix<f64>, DMatrix<f64>) {
        // 8 rows, 4 columns in two 2-column blocks, 2 outputs.
        let mut a = DMatrix::zeros(8, 4);
        let mut b = DMatrix::zeros(8, 2);
        for i in 0..8 {
            let t = i as f64 / 7.0;
            a[(i, 0)] = 1.0;
            a[(i, 1)] = t;
            a[(i, 2)] = (t * 3.0).sin();
            a[(i, 3)] = t * t;
            b[(i, 0)] = 0.5 + 2.0 * t - t * t;
            b[(i, 1)] = 1.0 - (t * 3.0).sin();
        }
        (a, b)
    }

    #[test]
    fn split_equals_joint_for_single_block() {
        let (a, b) = design();
        let spans = [BlockSpan::new(BlockId::X1, 0, 4)];
        let solver = SolverSettings::default();
        let joint = estimate_lambda(&a, &b, &spans, LambdaMode::Joint, &solver).unwrap();
        let split = estimate_lambda(&a, &b, &spans, LambdaMode::Split, &solver).unwrap();
        assert_eq!(joint.lambda, split.lambda);
    }

    #[test]
    fn joint_recovers_exact_coefficients() {
        let (a, b) = design();
        let spans = [BlockSpan::new(BlockId::X1, 0, 2), BlockSpan::new(BlockId::X2, 2, 4)];
        let solver = SolverSettings {
            kind: SolverKind::Lstsq,
            ..SolverSettings::default()
        };
        let est = estimate_lambda(&a, &b, &spans, LambdaMode::Joint, &solver).unwrap();
        assert_abs_diff_eq!(est.lambda[(0, 0)], 0.5, epsilon = 1e-8);
        assert_abs_diff_eq!(est.lambda[(1, 0)], 2.0, epsilon = 1e-8);
        assert_abs_diff_eq!(est.lambda[(3, 0)], -1.0, epsilon = 1e-8);
        assert_abs_diff_eq!(est.lambda[(2, 1)], -1.0, epsilon = 1e-8);
        assert_eq!(est.reports.len(), 2);
        assert!(est.reports.iter().all(|r| r.block.is_none()));
    }

    #[test]
    fn split_fits_each_block_to_the_same_target() {
        let (a, b) = design();
        let spans = [BlockSpan::new(BlockId::X1, 0, 2), BlockSpan::new(BlockId::X2, 2, 4)];
        let solver = SolverSettings {
            kind: SolverKind::Lstsq,
            ..SolverSettings::default()
        };
        let est = estimate_lambda(&a, &b, &spans, LambdaMode::Split, &solver).unwrap();
        assert_eq!(est.reports.len(), 4);

        // Second block alone, fitted to output 0.
        let slice = a.columns(2, 2).into_owned();
        let alone = minimize(&slice, &b.column(0).into_owned(), &solver).unwrap();
        assert_abs_diff_eq!(est.lambda[(2, 0)], alone.x[0], epsilon = 1e-12);
        assert_abs_diff_eq!(est.lambda[(3, 0)], alone.x[1], epsilon = 1e-12);
    }

    #[test]
    fn empty_block_is_rejected() {
        let (a, b) = design();
        let spans = [BlockSpan::new(BlockId::X1, 0, 4), BlockSpan::new(BlockId::X2, 4, 4)];
        let err = estimate_lambda(&a, &b, &spans, LambdaMode::Split, &SolverSettings::default())
            .unwrap_err();
        assert!(matches!(err, IdentError::Configuration(_)));
    }
}
