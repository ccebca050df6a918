//! TOML run settings.
//!
//! ```toml
//! samples = 40
//! family = "sh_cheb_doubled"
//! weighting = "average"
//! lambda_mode = "split"
//!
//! [dims]
//! x1 = 2
//! x2 = 1
//! x3 = 1
//! y = 2
//!
//! [degrees]
//! x1 = 3
//! x2 = 2
//! x3 = 1
//!
//! [solver]
//! kind = "jacobi_cg"
//! tolerance = 1e-10
//! ```
//!
//! Omitted keys take their defaults; unknown keys are rejected.

use std::path::Path;

use crate::domain::RunSettings;
use crate::error::AppError;

pub fn load_settings(path: &Path) -> Result<RunSettings, AppError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| AppError::new(2, format!("Failed to read config '{}': {e}", path.display())))?;
    parse_settings(&text)
        .map_err(|e| AppError::new(2, format!("Invalid config '{}': {e}", path.display())))
}

pub fn parse_settings(text: &str) -> Result<RunSettings, toml::de::Error> {
    toml::from_str(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{LambdaMode, PolyFamily, SolverKind, Weighting};

    #[test]
    fn partial_file_keeps_defaults() {
        let s = parse_settings(
            r#"
family = "sh_cheb_2"
lambda_mode = "split"

[dims]
x1 = 2
x2 = 1
x3 = 1
y = 3

[solver]
kind = "restarted_cg"
restart = 4
"#,
        )
        .unwrap();
        assert_eq!(s.family, PolyFamily::ShiftedChebyshevSecond);
        assert_eq!(s.lambda_mode, LambdaMode::Split);
        assert_eq!(s.weighting, Weighting::Scaled);
        assert_eq!(s.dims.y, 3);
        assert_eq!(s.degrees.x1, 2);
        assert_eq!(s.solver.kind, SolverKind::RestartedCg);
        assert_eq!(s.solver.restart, Some(4));
        assert_eq!(s.solver.tolerance, 1e-8);
    }

    #[test]
    fn unknown_keys_and_families_are_rejected() {
        assert!(parse_settings("famly = \"cheb\"").is_err());
        assert!(parse_settings("family = \"legendre\"").is_err());
    }

    #[test]
    fn missing_file_is_exit_code_2() {
        let err = load_settings(Path::new("/nonexistent/run.toml")).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
