//! Least-squares solvers for `minimize |A x - b|`.
//!
//! Every coefficient estimate in the pipeline is a small over-determined system.
//! The default path forms the normal equations `(AᵗA) x = Aᵗb` and runs
//! conjugate gradient on them:
//!
//! - `cg`: plain CG from `x0 = 0`
//! - `jacobi_cg`: CG preconditioned by `diag(AᵗA)^-1`
//! - `restarted_cg`: CG that recomputes the true residual and resets the search
//!   direction every `restart` iterations
//! - `lstsq`: SVD on `A` directly (no normal equations)
//!
//! Rank-deficient bases are common here (each block contributes a constant
//! column), so the CG variants never fail: at the iteration cap, or on a
//! non-positive curvature `pᵗMp`, they return the current iterate with
//! `converged = false`.

use nalgebra::{DMatrix, DVector};

use crate::domain::{SolverKind, SolverSettings};
use crate::error::IdentError;

/// Result of one solve.
#[derive(Debug, Clone, PartialEq)]
pub struct SolveOutcome {
    pub x: DVector<f64>,
    pub iterations: usize,
    /// `|M x - v|` for the normal-equation system.
    pub residual_norm: f64,
    pub converged: bool,
}

/// Solve `minimize |A x - b|` with the configured solver.
pub fn minimize(
    a: &DMatrix<f64>,
    b: &DVector<f64>,
    settings: &SolverSettings,
) -> Result<SolveOutcome, IdentError> {
    if a.nrows() != b.len() {
        return Err(IdentError::Shape(format!(
            "design has {} rows but target has {}",
            a.nrows(),
            b.len()
        )));
    }
    if a.ncols() == 0 {
        return Err(IdentError::Shape("design matrix has no columns".into()));
    }

    let at = a.transpose();
    let m = &at * a;
    let v = &at * b;
    let dim = v.len();
    let cap = settings.iteration_cap(dim);
    let tol = settings.tolerance;

    let outcome = match settings.kind {
        SolverKind::Cg => conjugate_gradient(&m, &v, tol, cap),
        SolverKind::JacobiCg => jacobi_conjugate_gradient(&m, &v, tol, cap),
        SolverKind::RestartedCg => {
            restarted_conjugate_gradient(&m, &v, tol, cap, settings.restart.unwrap_or(dim))
        }
        SolverKind::Lstsq => {
            let x = solve_least_squares(a, b).ok_or(IdentError::SingularSystem {
                rows: a.nrows(),
                cols: a.ncols(),
            })?;
            let residual_norm = (&m * &x - &v).norm();
            SolveOutcome {
                x,
                iterations: 0,
                residual_norm,
                converged: true,
            }
        }
    };
    Ok(outcome)
}

/// Plain conjugate gradient for a symmetric positive (semi)definite `m`.
pub fn conjugate_gradient(
    m: &DMatrix<f64>,
    v: &DVector<f64>,
    tolerance: f64,
    max_iterations: usize,
) -> SolveOutcome {
    run_cg(m, v, tolerance, max_iterations, None, None)
}

/// Conjugate gradient with a Jacobi (diagonal) preconditioner.
///
/// Zero or non-finite diagonal entries fall back to a unit preconditioner.
pub fn jacobi_conjugate_gradient(
    m: &DMatrix<f64>,
    v: &DVector<f64>,
    tolerance: f64,
    max_iterations: usize,
) -> SolveOutcome {
    let inv_diag = m.diagonal().map(|d| {
        if d.is_finite() && d > 0.0 {
            1.0 / d
        } else {
            1.0
        }
    });
    run_cg(m, v, tolerance, max_iterations, Some(&inv_diag), None)
}

/// Conjugate gradient restarted from the true residual every `restart` steps.
pub fn restarted_conjugate_gradient(
    m: &DMatrix<f64>,
    v: &DVector<f64>,
    tolerance: f64,
    max_iterations: usize,
    restart: usize,
) -> SolveOutcome {
    run_cg(m, v, tolerance, max_iterations, None, Some(restart.max(1)))
}

fn run_cg(
    m: &DMatrix<f64>,
    v: &DVector<f64>,
    tolerance: f64,
    max_iterations: usize,
    inv_diag: Option<&DVector<f64>>,
    restart: Option<usize>,
) -> SolveOutcome {
    let precondition = |r: &DVector<f64>| match inv_diag {
        Some(d) => r.component_mul(d),
        None => r.clone(),
    };

    let mut x = DVector::<f64>::zeros(v.len());
    let mut r = v.clone();
    let mut z = precondition(&r);
    let mut p = z.clone();
    let mut rz = r.dot(&z);
    let mut residual_norm = r.norm();
    let mut iterations = 0;

    while iterations < max_iterations && residual_norm >= tolerance {
        let mp = m * &p;
        let curvature = p.dot(&mp);
        // Singular direction (or NaN): keep the best iterate so far.
        if !(curvature.is_finite() && curvature > 0.0) {
            break;
        }

        let alpha = rz / curvature;
        x.axpy(alpha, &p, 1.0);
        iterations += 1;

        let restart_now = restart.is_some_and(|k| iterations % k == 0);
        if restart_now {
            r = v - m * &x;
        } else {
            r.axpy(-alpha, &mp, 1.0);
        }
        residual_norm = r.norm();

        z = precondition(&r);
        let rz_next = r.dot(&z);
        if restart_now {
            p = z.clone();
        } else {
            let beta = rz_next / rz;
            p = &z + &p * beta;
        }
        rz = rz_next;
    }

    SolveOutcome {
        x,
        iterations,
        residual_norm,
        converged: residual_norm < tolerance,
    }
}

/// Rank cutoffs tried in order for the SVD path.
const SVD_RANK_TOLERANCES: [f64; 3] = [1e-10, 1e-8, 1e-6];

/// Direct SVD solve of `A x = b` behind `SolverKind::Lstsq`.
///
/// Skips the normal equations, so it serves as the exact reference the CG
/// variants are checked against. `None` means no cutoff gave a finite
/// solution; `minimize` reports that as `IdentError::SingularSystem`.
pub fn solve_least_squares(a: &DMatrix<f64>, b: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = a.clone().svd(true, true);
    SVD_RANK_TOLERANCES.iter().find_map(|&eps| {
        svd.solve(b, eps)
            .ok()
            .filter(|x| x.iter().all(|v| v.is_finite()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn well_conditioned() -> (DMatrix<f64>, DVector<f64>) {
        // y = 2 + 3t - 0.5t^2 on 6 points, exactly representable.
        let ts = [0.0, 0.5, 1.0, 1.5, 2.0, 3.0];
        let mut a = DMatrix::zeros(ts.len(), 3);
        let mut b = DVector::zeros(ts.len());
        for (i, &t) in ts.iter().enumerate() {
            a[(i, 0)] = 1.0;
            a[(i, 1)] = t;
            a[(i, 2)] = t * t;
            b[i] = 2.0 + 3.0 * t - 0.5 * t * t;
        }
        (a, b)
    }

    fn settings(kind: SolverKind) -> SolverSettings {
        SolverSettings {
            kind,
            ..SolverSettings::default()
        }
    }

    #[test]
    fn lstsq_returns_minimum_norm_solution_for_duplicate_columns() {
        // x1 + x2 = 2 has a line of solutions; SVD picks (1, 1).
        let a = DMatrix::from_row_slice(4, 2, &[1.0, 1.0, 2.0, 2.0, 3.0, 3.0, 4.0, 4.0]);
        let b = DVector::from_row_slice(&[2.0, 4.0, 6.0, 8.0]);
        let out = minimize(&a, &b, &settings(SolverKind::Lstsq)).unwrap();
        assert!(out.converged);
        assert_eq!(out.iterations, 0);
        assert_abs_diff_eq!(out.x, DVector::from_row_slice(&[1.0, 1.0]), epsilon = 1e-10);
        assert!(out.residual_norm < 1e-9, "{}", out.residual_norm);
    }

    #[test]
    fn restart_every_step_still_matches_lstsq() {
        let (a, b) = well_conditioned();
        let exact = minimize(&a, &b, &settings(SolverKind::Lstsq)).unwrap();
        let s = SolverSettings {
            restart: Some(1),
            max_iterations: Some(5000),
            ..settings(SolverKind::RestartedCg)
        };
        let out = minimize(&a, &b, &s).unwrap();
        assert!(out.converged, "stopped after {} iterations", out.iterations);
        assert!(out.iterations > 3);
        assert_abs_diff_eq!(out.x, exact.x, epsilon = 1e-6);
    }

    #[test]
    fn jacobi_handles_a_zero_diagonal_entry() {
        // Second column is all zeros, so diag(AᵗA) = [14, 0].
        let a = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 2.0, 0.0, 3.0, 0.0]);
        let b = DVector::from_row_slice(&[1.0, 2.0, 3.0]);
        let out = minimize(&a, &b, &settings(SolverKind::JacobiCg)).unwrap();
        assert!(out.converged);
        assert_abs_diff_eq!(out.x, DVector::from_row_slice(&[1.0, 0.0]), epsilon = 1e-12);
    }

    #[test]
    fn all_variants_agree_on_well_conditioned_system() {
        let (a, b) = well_conditioned();
        let expected = DVector::from_row_slice(&[2.0, 3.0, -0.5]);
        for kind in [
            SolverKind::Cg,
            SolverKind::JacobiCg,
            SolverKind::RestartedCg,
            SolverKind::Lstsq,
        ] {
            let out = minimize(&a, &b, &settings(kind)).unwrap();
            assert!(out.converged, "{kind:?} did not converge");
            assert_abs_diff_eq!(out.x, expected, epsilon = 1e-6);
        }
    }

    #[test]
    fn repeated_solves_are_identical() {
        let (a, b) = well_conditioned();
        let s = settings(SolverKind::Cg);
        let first = minimize(&a, &b, &s).unwrap();
        let second = minimize(&a, &b, &s).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn iteration_cap_returns_best_effort_iterate() {
        let (a, b) = well_conditioned();
        let s = SolverSettings {
            max_iterations: Some(1),
            ..settings(SolverKind::Cg)
        };
        let out = minimize(&a, &b, &s).unwrap();
        assert_eq!(out.iterations, 1);
        assert!(!out.converged);
        assert!(out.x.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn rank_deficient_system_does_not_fail() {
        // Two identical columns: AᵗA is singular but the system is consistent.
        let a = DMatrix::from_row_slice(4, 2, &[1.0, 1.0, 2.0, 2.0, 3.0, 3.0, 4.0, 4.0]);
        let b = DVector::from_row_slice(&[2.0, 4.0, 6.0, 8.0]);
        for kind in [SolverKind::Cg, SolverKind::JacobiCg, SolverKind::RestartedCg] {
            let out = minimize(&a, &b, &settings(kind)).unwrap();
            assert!(out.x.iter().all(|v| v.is_finite()));
            let fitted = &a * &out.x;
            assert_abs_diff_eq!(fitted, b, epsilon = 1e-6);
        }
    }

    #[test]
    fn zero_matrix_stops_without_nan() {
        let m = DMatrix::<f64>::zeros(2, 2);
        let v = DVector::from_row_slice(&[1.0, 1.0]);
        let out = conjugate_gradient(&m, &v, 1e-8, 50);
        assert_eq!(out.iterations, 0);
        assert!(!out.converged);
        assert_eq!(out.x, DVector::zeros(2));
    }

    #[test]
    fn shape_mismatch_is_reported() {
        let a = DMatrix::<f64>::zeros(3, 2);
        let b = DVector::<f64>::zeros(4);
        assert!(matches!(
            minimize(&a, &b, &SolverSettings::default()),
            Err(IdentError::Shape(_))
        ));
    }
}
