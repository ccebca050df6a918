//! Workbook export as a sectioned CSV.
//!
//! Each section is a title row, one row per matrix row (with a leading empty
//! cell), then a blank separator row. The two error vectors close the file as
//! single rows.

use std::path::Path;

use nalgebra::DMatrix;

use crate::app::pipeline::Identification;
use crate::error::AppError;

/// Section titles and matrices in workbook order.
pub fn workbook_sections(run: &Identification) -> Vec<(String, DMatrix<f64>)> {
    let mut sections = vec![
        ("Input data: X".to_string(), run.raw_inputs()),
        ("Input data: Y".to_string(), run.raw_outputs()),
        ("X normalized:".to_string(), run.normalized_inputs()),
        ("Y normalized:".to_string(), run.normalized_outputs()),
        ("matrix B:".to_string(), run.target.b.clone()),
        ("matrix A:".to_string(), run.basis.a.clone()),
        ("matrix A_log:".to_string(), run.basis.a_log.clone()),
        ("matrix Lambda:".to_string(), run.lambda.clone()),
    ];
    for (j, psi) in run.psi.iter().enumerate() {
        sections.push((format!("matrix Psi{}:", j + 1), psi.clone()));
    }
    sections.push(("matrix a:".to_string(), run.a.clone()));
    for (j, phi) in run.phi.iter().enumerate() {
        sections.push((format!("matrix Phi{}:", j + 1), phi.clone()));
    }
    sections.push(("matrix c:".to_string(), run.c.clone()));
    sections.push(("Y rebuilt normalized:".to_string(), run.f.clone()));
    sections.push(("Y rebuilt:".to_string(), run.f_original.clone()));
    sections
}

pub fn write_workbook_csv(path: &Path, run: &Identification) -> Result<(), AppError> {
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export CSV '{}': {e}", path.display())))?;
    let fail = |e: csv::Error| AppError::new(2, format!("Failed to write export CSV: {e}"));

    let blank: [&str; 0] = [];
    for (title, m) in workbook_sections(run) {
        writer.write_record([title.as_str()]).map_err(fail)?;
        for row in m.row_iter() {
            writer.write_record(data_row(row.iter().copied())).map_err(fail)?;
        }
        writer.write_record(blank).map_err(fail)?;
    }

    writer.write_record(["Error normalized (Y - F)"]).map_err(fail)?;
    writer
        .write_record(data_row(run.error_normalized.iter().copied()))
        .map_err(fail)?;
    writer.write_record(["Error original scale (Y - F)"]).map_err(fail)?;
    writer
        .write_record(data_row(run.error_original.iter().copied()))
        .map_err(fail)?;

    writer
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush export CSV: {e}")))?;
    log::info!("wrote workbook CSV to '{}'", path.display());
    Ok(())
}

fn data_row(values: impl Iterator<Item = f64>) -> Vec<String> {
    std::iter::once(String::new())
        .chain(values.map(|v| v.to_string()))
        .collect()
}
