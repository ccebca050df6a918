//! Per-solve convergence records.
//!
//! A solve that hits its iteration cap is not an error; the run keeps going
//! with the best iterate and the report is kept so callers can see it.

use serde::{Deserialize, Serialize};

use crate::domain::BlockId;
use crate::math::SolveOutcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Lambda,
    BlockWeights,
    Combination,
}

impl Stage {
    pub fn label(self) -> &'static str {
        match self {
            Stage::Lambda => "lambda",
            Stage::BlockWeights => "a",
            Stage::Combination => "c",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolveReport {
    pub stage: Stage,
    /// 0-based output dimension.
    pub output: usize,
    /// `None` for a joint solve across all blocks.
    pub block: Option<BlockId>,
    pub iterations: usize,
    pub residual_norm: f64,
    pub converged: bool,
}

impl SolveReport {
    pub fn new(stage: Stage, output: usize, block: Option<BlockId>, outcome: &SolveOutcome) -> Self {
        let report = Self {
            stage,
            output,
            block,
            iterations: outcome.iterations,
            residual_norm: outcome.residual_norm,
            converged: outcome.converged,
        };
        report.log();
        report
    }

    pub fn describe(&self) -> String {
        let block = self.block.map(|b| b.label()).unwrap_or("all");
        format!(
            "{} Y{} block={} iterations={} residual={:.3e}",
            self.stage.label(),
            self.output + 1,
            block,
            self.iterations,
            self.residual_norm
        )
    }

    fn log(&self) {
        if self.converged {
            log::debug!("solve {}", self.describe());
        } else {
            log::warn!("solve did not converge: {}", self.describe());
        }
    }
}
