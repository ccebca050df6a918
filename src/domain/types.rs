//! Run configuration types.
//!
//! This module defines:
//!
//! - closed selector enums (`PolyFamily`, `Weighting`, `LambdaMode`, `SolverKind`)
//! - block dimension / degree records (`BlockDims`, `Degrees`)
//! - the loosely-typed, deserializable `RunSettings`
//! - the validated, immutable `IdentConfig` every pipeline stage reads

use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::domain::layout::BlockLayout;
use crate::error::IdentError;

/// Orthogonal polynomial family used to expand normalized inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum PolyFamily {
    /// Shifted Chebyshev of the first kind, `T*_k(x) = T_k(2x - 1)`.
    #[serde(alias = "sh_cheb_doubled")]
    #[value(alias = "sh_cheb_doubled")]
    ShiftedChebyshev,
    /// Plain Chebyshev of the first kind. The caller owns the domain mapping.
    #[serde(alias = "cheb")]
    #[value(alias = "cheb")]
    Chebyshev,
    /// Shifted Chebyshev of the second kind scaled by `2^-k`.
    #[serde(alias = "sh_cheb_2")]
    #[value(alias = "sh_cheb_2")]
    ShiftedChebyshevSecond,
}

impl PolyFamily {
    pub const ALL: [PolyFamily; 3] = [
        PolyFamily::ShiftedChebyshev,
        PolyFamily::Chebyshev,
        PolyFamily::ShiftedChebyshevSecond,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PolyFamily::ShiftedChebyshev => "shifted_chebyshev",
            PolyFamily::Chebyshev => "chebyshev",
            PolyFamily::ShiftedChebyshevSecond => "shifted_chebyshev_second",
        }
    }

    /// Human-readable label for terminal output.
    pub fn display_name(self) -> &'static str {
        match self {
            PolyFamily::ShiftedChebyshev => "shifted Chebyshev T*",
            PolyFamily::Chebyshev => "Chebyshev T",
            PolyFamily::ShiftedChebyshevSecond => "shifted Chebyshev U*/2^k",
        }
    }
}

impl FromStr for PolyFamily {
    type Err = IdentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "shifted_chebyshev" | "sh_cheb_doubled" => Ok(PolyFamily::ShiftedChebyshev),
            "chebyshev" | "cheb" => Ok(PolyFamily::Chebyshev),
            "shifted_chebyshev_second" | "sh_cheb_2" => Ok(PolyFamily::ShiftedChebyshevSecond),
            other => Err(IdentError::Configuration(format!(
                "unknown polynomial family '{other}'"
            ))),
        }
    }
}

/// How the aggregate target `B` is derived from normalized `Y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum Weighting {
    /// `B[i, :] = (max Y[i, :] + min Y[i, :]) / 2`.
    Average,
    /// `B = Y`.
    Scaled,
}

impl FromStr for Weighting {
    type Err = IdentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "average" => Ok(Weighting::Average),
            "scaled" => Ok(Weighting::Scaled),
            other => Err(IdentError::Configuration(format!("unknown weighting '{other}'"))),
        }
    }
}

/// Lambda estimation objective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum LambdaMode {
    /// One solve over every basis column.
    Joint,
    /// One solve per input block, each against the same target column.
    Split,
}

/// Linear solver used for every coefficient estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum SolverKind {
    /// Conjugate gradient on the normal equations.
    Cg,
    /// Diagonally preconditioned conjugate gradient.
    JacobiCg,
    /// Conjugate gradient with periodic true-residual restarts.
    RestartedCg,
    /// Exact least squares via SVD.
    Lstsq,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BlockDims {
    pub x1: usize,
    pub x2: usize,
    pub x3: usize,
    pub y: usize,
}

impl BlockDims {
    pub fn inputs(&self) -> [usize; 3] {
        [self.x1, self.x2, self.x3]
    }

    pub fn total(&self) -> usize {
        self.x1 + self.x2 + self.x3 + self.y
    }
}

impl Default for BlockDims {
    fn default() -> Self {
        Self { x1: 1, x2: 1, x3: 1, y: 1 }
    }
}

/// Highest polynomial degree per input block; expansion uses `0..=degree`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Degrees {
    pub x1: usize,
    pub x2: usize,
    pub x3: usize,
}

impl Degrees {
    pub fn as_array(&self) -> [usize; 3] {
        [self.x1, self.x2, self.x3]
    }
}

impl Default for Degrees {
    fn default() -> Self {
        Self { x1: 2, x2: 2, x3: 2 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SolverSettings {
    pub kind: SolverKind,
    /// Residual norm below which an iterative solve counts as converged.
    pub tolerance: f64,
    /// Iteration cap; `None` means `max(100, 10 * dim)`.
    pub max_iterations: Option<usize>,
    /// Restart period for `restarted_cg`; `None` means the system dimension.
    pub restart: Option<usize>,
}

impl SolverSettings {
    pub fn iteration_cap(&self, dim: usize) -> usize {
        self.max_iterations.unwrap_or_else(|| (10 * dim).max(100))
    }
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            kind: SolverKind::Cg,
            tolerance: 1e-8,
            max_iterations: None,
            restart: None,
        }
    }
}

/// Raw run settings as read from TOML or assembled from CLI flags.
///
/// Nothing here is trusted until it passes through `IdentConfig::new`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunSettings {
    /// Number of sample rows to use; `0` means every row of the input.
    pub samples: usize,
    pub dims: BlockDims,
    pub degrees: Degrees,
    pub family: PolyFamily,
    pub weighting: Weighting,
    pub lambda_mode: LambdaMode,
    pub solver: SolverSettings,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            samples: 0,
            dims: BlockDims::default(),
            degrees: Degrees::default(),
            family: PolyFamily::ShiftedChebyshev,
            weighting: Weighting::Scaled,
            lambda_mode: LambdaMode::Joint,
            solver: SolverSettings::default(),
        }
    }
}

/// Highest accepted polynomial degree per block.
pub const MAX_DEGREE: usize = 64;

/// Validated, immutable run configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct IdentConfig {
    samples: usize,
    dims: BlockDims,
    degrees: Degrees,
    family: PolyFamily,
    weighting: Weighting,
    lambda_mode: LambdaMode,
    solver: SolverSettings,
    layout: BlockLayout,
}

impl IdentConfig {
    pub fn new(settings: RunSettings) -> Result<Self, IdentError> {
        let RunSettings {
            samples,
            dims,
            degrees,
            family,
            weighting,
            lambda_mode,
            solver,
        } = settings;

        for (label, d) in [("x1", dims.x1), ("x2", dims.x2), ("x3", dims.x3), ("y", dims.y)] {
            if d == 0 {
                return Err(IdentError::Configuration(format!(
                    "block dimension {label} must be >= 1"
                )));
            }
        }
        for (label, d) in [("x1", degrees.x1), ("x2", degrees.x2), ("x3", degrees.x3)] {
            if d > MAX_DEGREE {
                return Err(IdentError::Configuration(format!(
                    "degree {label} = {d} exceeds the maximum of {MAX_DEGREE}"
                )));
            }
        }
        let layout = BlockLayout::new(dims, degrees)?;
        if samples == 1 {
            return Err(IdentError::Configuration(
                "at least 2 samples are required for min-max normalization".into(),
            ));
        }
        if !(solver.tolerance.is_finite() && solver.tolerance > 0.0) {
            return Err(IdentError::Configuration(format!(
                "solver tolerance must be finite and > 0, got {}",
                solver.tolerance
            )));
        }
        if solver.max_iterations == Some(0) {
            return Err(IdentError::Configuration("max_iterations must be >= 1".into()));
        }
        if solver.restart == Some(0) {
            return Err(IdentError::Configuration("restart period must be >= 1".into()));
        }

        Ok(Self {
            samples,
            dims,
            degrees,
            family,
            weighting,
            lambda_mode,
            solver,
            layout,
        })
    }

    /// Resolve an unset sample count against the rows actually available.
    pub fn with_samples(&self, samples: usize) -> Result<Self, IdentError> {
        let mut settings = self.settings();
        settings.samples = samples;
        if samples == 0 {
            return Err(IdentError::Configuration("sample is empty".into()));
        }
        IdentConfig::new(settings)
    }

    /// `0` until resolved with `with_samples`.
    pub fn samples(&self) -> usize {
        self.samples
    }

    pub fn dims(&self) -> BlockDims {
        self.dims
    }

    pub fn degrees(&self) -> Degrees {
        self.degrees
    }

    pub fn family(&self) -> PolyFamily {
        self.family
    }

    pub fn weighting(&self) -> Weighting {
        self.weighting
    }

    pub fn lambda_mode(&self) -> LambdaMode {
        self.lambda_mode
    }

    pub fn solver(&self) -> &SolverSettings {
        &self.solver
    }

    pub fn layout(&self) -> BlockLayout {
        self.layout.clone()
    }

    /// The settings this config was validated from.
    pub fn settings(&self) -> RunSettings {
        RunSettings {
            samples: self.samples,
            dims: self.dims,
            degrees: self.degrees,
            family: self.family,
            weighting: self.weighting,
            lambda_mode: self.lambda_mode,
            solver: self.solver,
        }
    }
}

impl fmt::Display for IdentConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "n={} dims=[{}, {}, {}, {}] degrees=[{}, {}, {}] family={} weighting={:?} lambda={:?} solver={:?}",
            self.samples,
            self.dims.x1,
            self.dims.x2,
            self.dims.x3,
            self.dims.y,
            self.degrees.x1,
            self.degrees.x2,
            self.degrees.x3,
            self.family.name(),
            self.weighting,
            self.lambda_mode,
            self.solver.kind,
        )
    }
}
