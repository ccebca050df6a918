//! Numeric sample ingest.
//!
//! Two text formats are accepted:
//!
//! - `.csv`: comma-delimited, parsed with the `csv` crate; `#` lines are
//!   comments and the first row may be a header
//! - anything else: whitespace-separated columns; `#` lines and blank lines
//!   are skipped
//!
//! Every row must carry exactly `columns` values. Ragged rows, unparsable
//! numbers and short files are rejected with exit code 2; nothing is skipped
//! silently.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use nalgebra::DMatrix;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestOptions {
    /// Values expected per row.
    pub columns: usize,
    /// Rows to read; `0` reads every row.
    pub samples: usize,
    /// Skip the first data line.
    pub header: bool,
}

/// Load a sample matrix from `path`.
pub fn load_sample(path: &Path, opts: &IngestOptions) -> Result<DMatrix<f64>, AppError> {
    let is_csv = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"));

    let rows = if is_csv {
        read_csv_rows(path, opts)?
    } else {
        read_whitespace_rows(path, opts)?
    };

    if rows.is_empty() {
        return Err(AppError::new(
            2,
            format!("No sample rows found in '{}'.", path.display()),
        ));
    }
    if opts.samples > 0 && rows.len() < opts.samples {
        return Err(AppError::new(
            2,
            format!(
                "'{}' has {} rows but {} samples were requested.",
                path.display(),
                rows.len(),
                opts.samples
            ),
        ));
    }

    let flat: Vec<f64> = rows.iter().flatten().copied().collect();
    let sample = DMatrix::from_row_slice(rows.len(), opts.columns, &flat);
    log::info!(
        "loaded {}x{} sample from '{}'",
        sample.nrows(),
        sample.ncols(),
        path.display()
    );
    Ok(sample)
}

fn read_csv_rows(path: &Path, opts: &IngestOptions) -> Result<Vec<Vec<f64>>, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open sample '{}': {e}", path.display())))?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(opts.header)
        .comment(Some(b'#'))
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let mut rows = Vec::new();
    for result in reader.records() {
        if opts.samples > 0 && rows.len() == opts.samples {
            break;
        }
        let record = result.map_err(|e| AppError::new(2, format!("CSV parse error: {e}")))?;
        let line = record.position().map(|p| p.line()).unwrap_or(0) as usize;
        rows.push(parse_values(record.iter(), line, opts.columns)?);
    }
    Ok(rows)
}

fn read_whitespace_rows(path: &Path, opts: &IngestOptions) -> Result<Vec<Vec<f64>>, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open sample '{}': {e}", path.display())))?;

    let mut rows = Vec::new();
    let mut header_pending = opts.header;
    for (idx, line) in BufReader::new(file).lines().enumerate() {
        if opts.samples > 0 && rows.len() == opts.samples {
            break;
        }
        let line = line.map_err(|e| AppError::new(2, format!("Failed to read '{}': {e}", path.display())))?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        if header_pending {
            header_pending = false;
            continue;
        }
        rows.push(parse_values(trimmed.split_whitespace(), idx + 1, opts.columns)?);
    }
    Ok(rows)
}

fn parse_values<'a>(
    fields: impl Iterator<Item = &'a str>,
    line: usize,
    columns: usize,
) -> Result<Vec<f64>, AppError> {
    let mut values = Vec::with_capacity(columns);
    for field in fields {
        let v = field.parse::<f64>().map_err(|_| {
            AppError::new(2, format!("Line {line}: '{field}' is not a number."))
        })?;
        values.push(v);
    }
    if values.len() != columns {
        return Err(AppError::new(
            2,
            format!("Line {line}: expected {columns} values, found {}.", values.len()),
        ));
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write(suffix: &str, body: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        f.write_all(body.as_bytes()).unwrap();
        f
    }

    fn opts(columns: usize, samples: usize, header: bool) -> IngestOptions {
        IngestOptions { columns, samples, header }
    }

    #[test]
    fn whitespace_file_skips_comments_and_blank_lines() {
        let f = write(".txt", "# x1 x2 y\n1 2 3\n\n4\t5   6\n# trailing\n7 8 9\n");
        let m = load_sample(f.path(), &opts(3, 0, false)).unwrap();
        assert_eq!(m.shape(), (3, 3));
        assert_eq!(m[(1, 1)], 5.0);
        assert_eq!(m[(2, 2)], 9.0);
    }

    #[test]
    fn csv_with_header_reads_leading_rows() {
        let f = write(".csv", "x1,x2,y\n# note\n1.5, 2, 3\n4,5,6\n7,8,9\n");
        let m = load_sample(f.path(), &opts(3, 2, true)).unwrap();
        assert_eq!(m.shape(), (2, 3));
        assert_eq!(m[(0, 0)], 1.5);
        assert_eq!(m[(1, 2)], 6.0);
    }

    #[test]
    fn ragged_row_is_rejected() {
        let f = write(".txt", "1 2 3\n4 5\n");
        let err = load_sample(f.path(), &opts(3, 0, false)).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("Line 2"));
    }

    #[test]
    fn bad_number_is_rejected() {
        let f = write(".csv", "1,2,abc\n");
        let err = load_sample(f.path(), &opts(3, 0, false)).unwrap_err();
        assert!(err.to_string().contains("abc"));
    }

    #[test]
    fn short_file_is_rejected() {
        let f = write(".txt", "1 2\n3 4\n");
        let err = load_sample(f.path(), &opts(2, 5, false)).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(load_sample(Path::new("/nonexistent/sample.txt"), &opts(2, 0, false)).is_err());
    }
}
