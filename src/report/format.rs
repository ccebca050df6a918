//! Formatted terminal output.
//!
//! Both a live run and a stored snapshot go through `RunSummary`, so `fit`,
//! `demo` and `show` print the same layout.

use nalgebra::DMatrix;

use crate::app::pipeline::Identification;
use crate::domain::{BlockLayout, RunSettings};
use crate::fit::SolveReport;
use crate::io::snapshot::RunSnapshot;

/// Borrowed view of what the summary prints.
#[derive(Debug, Clone)]
pub struct RunSummary<'a> {
    pub settings: RunSettings,
    pub layout: &'a BlockLayout,
    pub error_normalized: &'a [f64],
    pub error_original: &'a [f64],
    /// blocks × outputs
    pub c: Option<DMatrix<f64>>,
    pub solves: usize,
    pub unconverged: Vec<&'a SolveReport>,
}

impl<'a> RunSummary<'a> {
    pub fn from_run(run: &'a Identification) -> Self {
        Self {
            settings: run.config.settings(),
            layout: &run.layout,
            error_normalized: &run.error_normalized,
            error_original: &run.error_original,
            c: Some(run.c.clone()),
            solves: run.diagnostics.len(),
            unconverged: run.unconverged().collect(),
        }
    }

    pub fn from_snapshot(snapshot: &'a RunSnapshot) -> Self {
        Self {
            settings: snapshot.settings.clone(),
            layout: &snapshot.layout,
            error_normalized: &snapshot.error_normalized,
            error_original: &snapshot.error_original,
            c: snapshot.matrix("c").and_then(|m| m.to_matrix().ok()),
            solves: snapshot.diagnostics.len(),
            unconverged: snapshot.diagnostics.iter().filter(|r| !r.converged).collect(),
        }
    }
}

pub fn format_run_summary(run: &Identification) -> String {
    format_summary(&RunSummary::from_run(run))
}

pub fn format_snapshot_summary(snapshot: &RunSnapshot) -> String {
    let mut out = format!("Snapshot: {} ({})\n", snapshot.created_at.to_rfc3339(), snapshot.tool);
    out.push_str(&format_summary(&RunSummary::from_snapshot(snapshot)));
    out
}

pub fn format_summary(summary: &RunSummary<'_>) -> String {
    let s = &summary.settings;
    let mut out = String::new();

    out.push_str("=== sysid - polynomial system identification ===\n");
    out.push_str(&format!(
        "Sample: n={} | dims=[{}, {}, {}, {}] | degrees=[{}, {}, {}]\n",
        s.samples, s.dims.x1, s.dims.x2, s.dims.x3, s.dims.y, s.degrees.x1, s.degrees.x2, s.degrees.x3
    ));
    out.push_str(&format!(
        "Model: {} | weighting={:?} | lambda={:?} | solver={:?} (tol={:e})\n",
        s.family.display_name(),
        s.weighting,
        s.lambda_mode,
        s.solver.kind,
        s.solver.tolerance
    ));

    out.push_str("\nLayout:\n");
    for (col, basis) in summary.layout.column_spans().iter().zip(summary.layout.basis_spans()) {
        out.push_str(&format!(
            "  {:<3} columns {:>3}..{:<3} basis {:>3}..{:<3} ({} per vector)\n",
            col.block.label(),
            col.start,
            col.end,
            basis.start,
            basis.end,
            summary.layout.functions_per_vector(col.block)
        ));
    }
    let y = summary.layout.output_span();
    out.push_str(&format!("  {:<3} columns {:>3}..{}\n", y.block.label(), y.start, y.end));

    out.push_str("\nErrors (infinity norm of Y - F):\n");
    out.push_str(
        format!("{:<6} {:>14} {:>14}  {}\n", "output", "normalized", "original", "c (X1, X2, X3)").trim_end(),
    );
    out.push('\n');
    for (j, (en, eo)) in summary
        .error_normalized
        .iter()
        .zip(summary.error_original)
        .enumerate()
    {
        let c = summary
            .c
            .as_ref()
            .filter(|c| j < c.ncols())
            .map(|c| fmt_vec(c.column(j).iter().copied()))
            .unwrap_or_default();
        out.push_str(format!("{:<6} {en:>14.6e} {eo:>14.6e}  {c}\n", format!("Y{}", j + 1)).trim_end());
        out.push('\n');
    }

    if summary.unconverged.is_empty() {
        out.push_str(&format!("\nSolves: {} (all converged)\n", summary.solves));
    } else {
        out.push_str(&format!(
            "\nSolves: {} ({} did not converge)\n",
            summary.solves,
            summary.unconverged.len()
        ));
        for r in &summary.unconverged {
            out.push_str(&format!("  - {}\n", r.describe()));
        }
    }

    out
}

fn fmt_vec(v: impl Iterator<Item = f64>) -> String {
    let parts: Vec<String> = v.map(|x| format!("{x:.6}")).collect();
    format!("[{}]", parts.join(", "))
}
