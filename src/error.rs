//! Error types.
//!
//! - `IdentError` is the typed taxonomy raised by the identification core.
//! - `AppError` is what the binary reports: a message plus a process exit code.

use thiserror::Error;

/// Failures raised by the identification pipeline.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IdentError {
    /// Invalid or inconsistent dimensions, degrees, or selectors.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A sample column has `max == min` and cannot be mapped onto `[0, 1]`.
    #[error("column {column} is constant (every value is {value}); it cannot be normalized")]
    DegenerateColumn { column: usize, value: f64 },

    #[error("non-finite value in sample at row {row}, column {column}")]
    NonFiniteValue { row: usize, column: usize },

    /// NaN/inf reached the fitted output.
    #[error("numerical instability in output dimension {output}: {detail}")]
    NumericalInstability { output: usize, detail: String },

    /// The exact least-squares path could not produce a finite solution.
    #[error("least-squares system of shape {rows}x{cols} could not be solved")]
    SingularSystem { rows: usize, cols: usize },

    #[error("shape mismatch: {0}")]
    Shape(String),
}

impl IdentError {
    pub fn exit_code(&self) -> u8 {
        match self {
            IdentError::Configuration(_) | IdentError::Shape(_) => 2,
            IdentError::DegenerateColumn { .. } | IdentError::NonFiniteValue { .. } => 3,
            IdentError::NumericalInstability { .. } | IdentError::SingularSystem { .. } => 4,
        }
    }
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<IdentError> for AppError {
    fn from(err: IdentError) -> Self {
        AppError::new(err.exit_code(), err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
