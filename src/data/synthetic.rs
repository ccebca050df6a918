//! Reproducible synthetic samples for demos and tests.
//!
//! Inputs are uniform on `[0, 1]`. Output `k` follows the multiplicative relation
//!
//! ```text
//! y_k = Π_b (1 + w_kb · mean(X_b)),   w_kb = 1 / (1 + k + b)
//! ```
//!
//! plus optional Gaussian noise.

use nalgebra::DMatrix;
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::IdentConfig;
use crate::error::IdentError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyntheticSpec {
    pub samples: usize,
    pub seed: u64,
    /// Standard deviation of additive noise on every output.
    pub noise: f64,
}

pub fn generate_sample(config: &IdentConfig, spec: &SyntheticSpec) -> Result<DMatrix<f64>, IdentError> {
    if spec.samples < 2 {
        return Err(IdentError::Configuration("synthetic sample needs at least 2 rows".into()));
    }
    if !(spec.noise.is_finite() && spec.noise >= 0.0) {
        return Err(IdentError::Configuration(format!(
            "noise must be finite and >= 0, got {}",
            spec.noise
        )));
    }

    let layout = config.layout();
    let mut rng = StdRng::seed_from_u64(spec.seed);
    let normal = Normal::new(0.0, spec.noise.max(f64::MIN_POSITIVE))
        .map_err(|e| IdentError::Configuration(format!("noise distribution error: {e}")))?;

    let mut sample = DMatrix::<f64>::zeros(spec.samples, layout.sample_columns());
    for i in 0..spec.samples {
        for j in 0..layout.input_vectors() {
            sample[(i, j)] = rng.gen_range(0.0..=1.0);
        }

        let means: Vec<f64> = layout
            .vector_spans()
            .iter()
            .map(|span| {
                let sum: f64 = span.range().map(|j| sample[(i, j)]).sum();
                sum / span.len() as f64
            })
            .collect();

        let out = layout.output_span();
        for (k, j) in out.range().enumerate() {
            let clean: f64 = means
                .iter()
                .enumerate()
                .map(|(b, m)| 1.0 + m / (1.0 + k as f64 + b as f64))
                .product();
            let noise = if spec.noise > 0.0 { normal.sample(&mut rng) } else { 0.0 };
            sample[(i, j)] = clean + noise;
        }
    }

    Ok(sample)
}
