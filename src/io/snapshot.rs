//! JSON run snapshots.
//!
//! A snapshot is the portable record of one identification run: the resolved
//! settings, block layout, every named matrix, both error vectors and the
//! solve diagnostics. `sysid show` reads it back without refitting.

use std::fs::File;
use std::path::Path;

use chrono::{DateTime, Utc};
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::app::pipeline::Identification;
use crate::domain::{BlockLayout, RunSettings};
use crate::error::AppError;
use crate::fit::SolveReport;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedMatrix {
    pub name: String,
    pub rows: usize,
    pub cols: usize,
    /// Row-major values.
    pub data: Vec<Vec<f64>>,
}

impl NamedMatrix {
    pub fn from_matrix(name: impl Into<String>, m: &DMatrix<f64>) -> Self {
        Self {
            name: name.into(),
            rows: m.nrows(),
            cols: m.ncols(),
            data: m
                .row_iter()
                .map(|row| row.iter().copied().collect())
                .collect(),
        }
    }

    pub fn to_matrix(&self) -> Result<DMatrix<f64>, AppError> {
        if self.data.len() != self.rows || self.data.iter().any(|r| r.len() != self.cols) {
            return Err(AppError::new(
                2,
                format!("Matrix '{}' does not match its {}x{} shape.", self.name, self.rows, self.cols),
            ));
        }
        let flat: Vec<f64> = self.data.iter().flatten().copied().collect();
        Ok(DMatrix::from_row_slice(self.rows, self.cols, &flat))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSnapshot {
    pub tool: String,
    pub created_at: DateTime<Utc>,
    pub settings: RunSettings,
    pub layout: BlockLayout,
    pub matrices: Vec<NamedMatrix>,
    pub error_normalized: Vec<f64>,
    pub error_original: Vec<f64>,
    pub diagnostics: Vec<SolveReport>,
}

impl RunSnapshot {
    pub fn from_run(run: &Identification, created_at: DateTime<Utc>) -> Self {
        Self {
            tool: "sysid".to_string(),
            created_at,
            settings: run.config.settings(),
            layout: run.layout.clone(),
            matrices: run
                .named_matrices()
                .into_iter()
                .map(|(name, m)| NamedMatrix::from_matrix(name, m))
                .collect(),
            error_normalized: run.error_normalized.clone(),
            error_original: run.error_original.clone(),
            diagnostics: run.diagnostics.clone(),
        }
    }

    pub fn matrix(&self, name: &str) -> Option<&NamedMatrix> {
        self.matrices.iter().find(|m| m.name == name)
    }
}

pub fn write_snapshot_json(path: &Path, run: &Identification) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create snapshot JSON '{}': {e}", path.display())))?;
    let snapshot = RunSnapshot::from_run(run, Utc::now());
    serde_json::to_writer_pretty(file, &snapshot)
        .map_err(|e| AppError::new(2, format!("Failed to write snapshot JSON: {e}")))?;
    log::info!("wrote snapshot to '{}'", path.display());
    Ok(())
}

pub fn read_snapshot_json(path: &Path) -> Result<RunSnapshot, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open snapshot JSON '{}': {e}", path.display())))?;
    let snapshot: RunSnapshot = serde_json::from_reader(file)
        .map_err(|e| AppError::new(2, format!("Invalid snapshot JSON: {e}")))?;
    Ok(snapshot)
}
