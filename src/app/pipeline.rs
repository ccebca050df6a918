//! Shared identification pipeline used by every subcommand.
//!
//! normalize -> A -> lambda -> Psi -> a -> Phi -> c -> F -> denormalize -> errors
//!
//! Each stage reads the outputs of earlier stages and returns new values; the
//! final `Identification` owns all of them so exporters and the summary
//! printer never recompute anything.

use nalgebra::DMatrix;

use crate::data::{NormalizedSample, normalize};
use crate::domain::{BlockLayout, IdentConfig};
use crate::error::IdentError;
use crate::fit::{
    BasisMatrix, SolveReport, TargetMatrix, approximation_error, build_basis_matrix, build_phi,
    build_psi, build_target, estimate_lambda, fit_block_weights, fit_combination, reconstruct,
};
use crate::math::{exp_unshift_matrix, log_shift_matrix};

/// Everything produced by one identification run.
#[derive(Debug, Clone)]
pub struct Identification {
    /// Config with `samples` resolved against the sample.
    pub config: IdentConfig,
    pub layout: BlockLayout,
    pub sample: DMatrix<f64>,
    pub normalized: NormalizedSample,
    pub target: TargetMatrix,
    pub basis: BasisMatrix,
    pub lambda: DMatrix<f64>,
    pub psi_log: Vec<DMatrix<f64>>,
    pub psi: Vec<DMatrix<f64>>,
    pub a: DMatrix<f64>,
    pub phi_log: Vec<DMatrix<f64>>,
    pub phi: Vec<DMatrix<f64>>,
    pub c: DMatrix<f64>,
    pub f_log: DMatrix<f64>,
    /// Fitted outputs, normalized scale.
    pub f: DMatrix<f64>,
    /// Fitted outputs, original scale.
    pub f_original: DMatrix<f64>,
    pub error_normalized: Vec<f64>,
    pub error_original: Vec<f64>,
    pub diagnostics: Vec<SolveReport>,
}

impl Identification {
    pub fn unconverged(&self) -> impl Iterator<Item = &SolveReport> {
        self.diagnostics.iter().filter(|r| !r.converged)
    }

    /// Raw input columns (`X1 | X2 | X3`).
    pub fn raw_inputs(&self) -> DMatrix<f64> {
        self.sample.columns(0, self.layout.input_vectors()).into_owned()
    }

    pub fn raw_outputs(&self) -> DMatrix<f64> {
        let span = self.layout.output_span();
        self.sample.columns(span.start, span.len()).into_owned()
    }

    pub fn normalized_inputs(&self) -> DMatrix<f64> {
        self.normalized.values.columns(0, self.layout.input_vectors()).into_owned()
    }

    pub fn normalized_outputs(&self) -> DMatrix<f64> {
        let span = self.layout.output_span();
        self.normalized.values.columns(span.start, span.len()).into_owned()
    }

    /// Every produced matrix, by name, in export order.
    pub fn named_matrices(&self) -> Vec<(String, &DMatrix<f64>)> {
        let mut out: Vec<(String, &DMatrix<f64>)> = vec![
            ("A".into(), &self.basis.a),
            ("A_log".into(), &self.basis.a_log),
            ("B".into(), &self.target.b),
            ("B_log".into(), &self.target.b_log),
            ("Lambda".into(), &self.lambda),
        ];
        for (j, m) in self.psi.iter().enumerate() {
            out.push((format!("Psi{}", j + 1), m));
        }
        for (j, m) in self.psi_log.iter().enumerate() {
            out.push((format!("Psi_log{}", j + 1), m));
        }
        out.push(("a".into(), &self.a));
        for (j, m) in self.phi.iter().enumerate() {
            out.push((format!("Phi{}", j + 1), m));
        }
        for (j, m) in self.phi_log.iter().enumerate() {
            out.push((format!("Phi_log{}", j + 1), m));
        }
        out.push(("c".into(), &self.c));
        out.push(("F".into(), &self.f));
        out.push(("F_log".into(), &self.f_log));
        out.push(("F_original".into(), &self.f_original));
        out
    }
}

/// Run the full identification on a raw sample.
///
/// When `config.samples()` is nonzero only the first `samples` rows are used.
pub fn identify(config: &IdentConfig, sample: &DMatrix<f64>) -> Result<Identification, IdentError> {
    // 1) Check the sample against the layout and resolve the row count.
    let layout = config.layout();
    layout.validate()?;

    if sample.ncols() != layout.sample_columns() {
        return Err(IdentError::Configuration(format!(
            "sample has {} columns but dims require {}",
            sample.ncols(),
            layout.sample_columns()
        )));
    }
    let rows = match config.samples() {
        0 => sample.nrows(),
        n if n <= sample.nrows() => n,
        n => {
            return Err(IdentError::Configuration(format!(
                "requested {n} samples but only {} rows are available",
                sample.nrows()
            )));
        }
    };
    let config = config.with_samples(rows)?;
    let sample = sample.rows(0, rows).into_owned();
    log::info!("identify: {config}");
    log::info!("sample: {}x{}", sample.nrows(), sample.ncols());

    // 2) Normalize every column to [0, 1] and split off Y.
    let normalized = normalize(&sample)?;
    let inputs = normalized.values.columns(0, layout.input_vectors()).into_owned();
    let out_span = layout.output_span();
    let y = normalized.values.columns(out_span.start, out_span.len()).into_owned();
    let y_log = log_shift_matrix(&y);

    // 3) Target B and basis matrix A.
    let target = build_target(&y, config.weighting());
    let basis = build_basis_matrix(&inputs, &layout, config.family())?;

    // 4) Lambda against B_log.
    let solver = config.solver();
    let lambda = estimate_lambda(
        &basis.a_log,
        &target.b_log,
        layout.basis_spans(),
        config.lambda_mode(),
        solver,
    )?;

    // 5) Psi, block weights a, Phi.
    let psi_log = build_psi(&basis.a_log, &lambda.lambda, &layout.vector_basis_ranges())?;
    let weights = fit_block_weights(&psi_log, &y_log, layout.vector_spans(), solver)?;
    let phi_log = build_phi(&psi_log, &weights.a, layout.vector_spans())?;
    // 6) Combination c and reconstructed F.
    let combination = fit_combination(&phi_log, &y_log, solver)?;
    let rec = reconstruct(&phi_log, &combination.c)?;

    // 7) Errors in both scales.
    let error_normalized = approximation_error(&y, &rec.f)?;
    let f_original = normalized.denormalize_columns(&rec.f, out_span.start)?;
    let raw_y = sample.columns(out_span.start, out_span.len()).into_owned();
    let error_original = approximation_error(&raw_y, &f_original)?;

    for (j, (en, eo)) in error_normalized.iter().zip(&error_original).enumerate() {
        log::info!("Y{}: error normalized={en:.6} original={eo:.6}", j + 1);
    }

    // 8) Collect per-solve diagnostics.
    let diagnostics = lambda
        .reports
        .into_iter()
        .chain(weights.reports)
        .chain(combination.reports)
        .collect::<Vec<_>>();
    let unconverged = diagnostics.iter().filter(|r| !r.converged).count();
    if unconverged > 0 {
        log::warn!("{unconverged} of {} solves hit the iteration cap", diagnostics.len());
    }

    Ok(Identification {
        psi: psi_log.iter().map(exp_unshift_matrix).collect(),
        phi: phi_log.iter().map(exp_unshift_matrix).collect(),
        config,
        layout,
        sample,
        normalized,
        target,
        basis,
        lambda: lambda.lambda,
        psi_log,
        a: weights.a,
        phi_log,
        c: combination.c,
        f_log: rec.f_log,
        f: rec.f,
        f_original,
        error_normalized,
        error_original,
        diagnostics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BlockDims, Degrees, LambdaMode, PolyFamily, RunSettings, SolverKind, Weighting};

    /// Y = X1 over ten rows; X2 and X3 are permutations on different scales.
    fn identity_sample() -> DMatrix<f64> {
        let n = 10;
        DMatrix::from_fn(n, 4, |i, j| {
            let x1 = i as f64 / 9.0;
            let x2 = ((i * 9) % 10) as f64 / 9.0;
            let x3 = ((i + 5) % 10) as f64 / 9.0;
            match j {
                0 | 3 => 10.0 + 5.0 * x1,
                1 => -3.0 + 2.0 * x2,
                _ => 100.0 * x3 + 0.5,
            }
        })
    }

    fn settings() -> RunSettings {
        RunSettings {
            samples: 10,
            dims: BlockDims::default(),
            degrees: Degrees::default(),
            family: PolyFamily::ShiftedChebyshev,
            weighting: Weighting::Scaled,
            lambda_mode: LambdaMode::Joint,
            ..RunSettings::default()
        }
    }

    #[test]
    fn identity_relation_is_recovered() {
        let config = IdentConfig::new(settings()).unwrap();
        let run = identify(&config, &identity_sample()).unwrap();

        assert_eq!(run.basis.a.shape(), (10, 9));
        assert_eq!(run.lambda.shape(), (9, 1));
        assert_eq!(run.psi_log[0].shape(), (10, 3));
        assert_eq!(run.a.shape(), (3, 1));
        assert_eq!(run.phi_log[0].shape(), (10, 3));
        assert_eq!(run.c.shape(), (3, 1));
        assert_eq!(run.f.shape(), (10, 1));

        assert!(run.error_normalized[0] < 0.05, "{:?}", run.error_normalized);
        // Y spans 5 units in original scale.
        assert!(run.error_original[0] < 0.25, "{:?}", run.error_original);
    }

    #[test]
    fn named_matrices_follow_export_order() {
        let mut s = settings();
        s.dims.y = 2;
        let mut sample = identity_sample().insert_column(4, 0.0);
        for i in 0..10 {
            sample[(i, 4)] = (i as f64 * 0.7).sin();
        }
        let run = identify(&IdentConfig::new(s).unwrap(), &sample).unwrap();
        let names: Vec<String> = run.named_matrices().into_iter().map(|(n, _)| n).collect();
        assert_eq!(
            names,
            [
                "A", "A_log", "B", "B_log", "Lambda", "Psi1", "Psi2", "Psi_log1", "Psi_log2", "a",
                "Phi1", "Phi2", "Phi_log1", "Phi_log2", "c", "F", "F_log", "F_original"
            ]
        );
        assert_eq!(run.error_normalized.len(), 2);
        assert_eq!(run.c.shape(), (3, 2));
    }

    #[test]
    fn sample_count_selects_leading_rows() {
        let mut s = settings();
        s.samples = 6;
        let run = identify(&IdentConfig::new(s).unwrap(), &identity_sample()).unwrap();
        assert_eq!(run.config.samples(), 6);
        assert_eq!(run.sample.nrows(), 6);
        assert_eq!(run.f_original.nrows(), 6);
    }

    #[test]
    fn too_many_samples_is_a_configuration_error() {
        let mut s = settings();
        s.samples = 11;
        let err = identify(&IdentConfig::new(s).unwrap(), &identity_sample()).unwrap_err();
        assert!(matches!(err, IdentError::Configuration(_)));
    }

    #[test]
    fn constant_column_fails_before_fitting() {
        let mut sample = identity_sample();
        sample.column_mut(2).fill(4.0);
        let err = identify(&IdentConfig::new(settings()).unwrap(), &sample).unwrap_err();
        assert_eq!(err, IdentError::DegenerateColumn { column: 2, value: 4.0 });
    }

    #[test]
    fn degree_zero_block_still_solves() {
        let mut s = settings();
        s.degrees.x2 = 0;
        let run = identify(&IdentConfig::new(s).unwrap(), &identity_sample()).unwrap();
        assert_eq!(run.basis.a.ncols(), 3 + 1 + 3);
        assert!(run.error_normalized[0].is_finite());
    }

    #[test]
    fn tiny_iteration_cap_is_reported_not_fatal() {
        let mut s = settings();
        s.solver.kind = SolverKind::Cg;
        s.solver.max_iterations = Some(1);
        let run = identify(&IdentConfig::new(s).unwrap(), &identity_sample()).unwrap();
        assert!(run.unconverged().count() > 0);
        assert!(run.error_normalized[0].is_finite());
    }
}
