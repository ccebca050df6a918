//! Command-line parsing for the identification tool.
//!
//! Argument parsing stays here; dispatch lives in `app`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::{
    BlockDims, Degrees, LambdaMode, PolyFamily, RunSettings, SolverKind, SolverSettings, Weighting,
};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "sysid", version, about = "Polynomial-basis system identification")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Identify a model from a sample file, print the summary, optionally export.
    Fit(FitArgs),
    /// Identify a model from a reproducible synthetic sample.
    Demo(DemoArgs),
    /// Print the summary stored in a JSON snapshot.
    Show(ShowArgs),
}

/// Model flags shared by `fit` and `demo`.
///
/// Ignored when `--config` is given.
#[derive(Debug, Args, Clone)]
pub struct ModelArgs {
    /// Block dimensions `x1,x2,x3,y`.
    #[arg(long, value_parser = parse_dims, default_value = "1,1,1,1")]
    pub dims: BlockDims,

    /// Polynomial degrees `p1,p2,p3`.
    #[arg(long, value_parser = parse_degrees, default_value = "2,2,2")]
    pub degrees: Degrees,

    #[arg(long, value_enum, default_value_t = PolyFamily::ShiftedChebyshev)]
    pub family: PolyFamily,

    #[arg(long, value_enum, default_value_t = Weighting::Scaled)]
    pub weighting: Weighting,

    #[arg(long, value_enum, default_value_t = LambdaMode::Joint)]
    pub lambda_mode: LambdaMode,

    #[arg(long, value_enum, default_value_t = SolverKind::Cg)]
    pub solver: SolverKind,

    /// Residual norm at which an iterative solve stops.
    #[arg(long, default_value_t = 1e-8)]
    pub tolerance: f64,

    /// Iteration cap per solve (default: max(100, 10 * dim)).
    #[arg(long)]
    pub max_iterations: Option<usize>,

    /// Restart period for `restarted_cg` (default: system dimension).
    #[arg(long)]
    pub restart: Option<usize>,
}

impl ModelArgs {
    pub fn to_settings(&self, samples: usize) -> RunSettings {
        RunSettings {
            samples,
            dims: self.dims,
            degrees: self.degrees,
            family: self.family,
            weighting: self.weighting,
            lambda_mode: self.lambda_mode,
            solver: SolverSettings {
                kind: self.solver,
                tolerance: self.tolerance,
                max_iterations: self.max_iterations,
                restart: self.restart,
            },
        }
    }
}

#[derive(Debug, Args, Clone)]
pub struct OutputArgs {
    /// Write every matrix and the error rows to a sectioned CSV workbook.
    #[arg(long, value_name = "CSV")]
    pub export: Option<PathBuf>,

    /// Write a JSON snapshot readable by `sysid show`.
    #[arg(long = "export-json", value_name = "JSON")]
    pub export_json: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct FitArgs {
    /// Sample file (`.csv` or whitespace-separated text).
    #[arg(short, long, value_name = "FILE")]
    pub input: PathBuf,

    /// The first data row is a header.
    #[arg(long)]
    pub header: bool,

    /// Rows to use from the top of the file (0 = all).
    #[arg(short = 'n', long, default_value_t = 0)]
    pub samples: usize,

    /// TOML run settings; replaces the model flags.
    #[arg(long, value_name = "TOML")]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub model: ModelArgs,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Args, Clone)]
pub struct DemoArgs {
    /// Rows to generate.
    #[arg(short = 'n', long, default_value_t = 40)]
    pub samples: usize,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Standard deviation of Gaussian noise added to the outputs.
    #[arg(long, default_value_t = 0.0)]
    pub noise: f64,

    /// TOML run settings; replaces the model flags.
    #[arg(long, value_name = "TOML")]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub model: ModelArgs,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Args, Clone)]
pub struct ShowArgs {
    /// Snapshot written by `--export-json`.
    #[arg(long, value_name = "JSON")]
    pub snapshot: PathBuf,
}

fn parse_list<const N: usize>(s: &str, what: &str) -> Result<[usize; N], String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    if parts.len() != N {
        return Err(format!("expected {N} comma-separated {what}, got '{s}'"));
    }
    let mut out = [0usize; N];
    for (slot, part) in out.iter_mut().zip(parts) {
        *slot = part
            .parse()
            .map_err(|_| format!("'{part}' is not a non-negative integer"))?;
    }
    Ok(out)
}

fn parse_dims(s: &str) -> Result<BlockDims, String> {
    let [x1, x2, x3, y] = parse_list::<4>(s, "dimensions")?;
    Ok(BlockDims { x1, x2, x3, y })
}

fn parse_degrees(s: &str) -> Result<Degrees, String> {
    let [x1, x2, x3] = parse_list::<3>(s, "degrees")?;
    Ok(Degrees { x1, x2, x3 })
}
