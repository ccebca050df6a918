//! Top-level application orchestration.
//!
//! `src/main.rs` only initialises logging and maps errors to exit codes; this
//! module is the "real main" that:
//! - parses CLI arguments
//! - resolves run settings (flags or TOML)
//! - loads or generates the sample
//! - runs the identification pipeline
//! - prints the summary and writes optional exports

use std::path::Path;

use clap::Parser;

use crate::cli::{Command, DemoArgs, FitArgs, ModelArgs, OutputArgs, ShowArgs};
use crate::data::{SyntheticSpec, generate_sample};
use crate::domain::{IdentConfig, RunSettings};
use crate::error::AppError;
use crate::io::ingest::{IngestOptions, load_sample};

pub mod pipeline;

/// Entry point for the `sysid` binary.
pub fn run() -> Result<(), AppError> {
    let cli = crate::cli::Cli::parse();

    match cli.command {
        Command::Fit(args) => handle_fit(args),
        Command::Demo(args) => handle_demo(args),
        Command::Show(args) => handle_show(args),
    }
}

fn handle_fit(args: FitArgs) -> Result<(), AppError> {
    let settings = resolve_settings(args.config.as_deref(), &args.model, args.samples)?;
    let config = IdentConfig::new(settings)?;

    let opts = IngestOptions {
        columns: config.dims().total(),
        samples: config.samples(),
        header: args.header,
    };
    let sample = load_sample(&args.input, &opts)?;
    let run = pipeline::identify(&config, &sample)?;

    finish(&run, &args.output)
}

fn handle_demo(args: DemoArgs) -> Result<(), AppError> {
    let mut settings = resolve_settings(args.config.as_deref(), &args.model, args.samples)?;
    if settings.samples == 0 {
        settings.samples = args.samples;
    }
    let config = IdentConfig::new(settings)?;

    let spec = SyntheticSpec {
        samples: config.samples(),
        seed: args.seed,
        noise: args.noise,
    };
    let sample = generate_sample(&config, &spec)?;
    log::info!("generated synthetic sample (seed={}, noise={})", spec.seed, spec.noise);
    let run = pipeline::identify(&config, &sample)?;

    finish(&run, &args.output)
}

fn handle_show(args: ShowArgs) -> Result<(), AppError> {
    let snapshot = crate::io::snapshot::read_snapshot_json(&args.snapshot)?;
    println!("{}", crate::report::format_snapshot_summary(&snapshot));
    Ok(())
}

/// Print the summary and write the requested exports.
fn finish(run: &pipeline::Identification, output: &OutputArgs) -> Result<(), AppError> {
    println!("{}", crate::report::format_run_summary(run));

    if let Some(path) = &output.export {
        crate::io::export::write_workbook_csv(path, run)?;
    }
    if let Some(path) = &output.export_json {
        crate::io::snapshot::write_snapshot_json(path, run)?;
    }
    Ok(())
}

/// The TOML file, when given, replaces every model flag.
pub fn resolve_settings(
    config: Option<&Path>,
    model: &ModelArgs,
    samples: usize,
) -> Result<RunSettings, AppError> {
    match config {
        Some(path) => {
            let settings = crate::io::settings::load_settings(path)?;
            log::info!("settings loaded from '{}'", path.display());
            Ok(settings)
        }
        None => Ok(model.to_settings(samples)),
    }
}
