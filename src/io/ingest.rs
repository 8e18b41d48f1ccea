//! Delimited-text ingest and line validation.
//!
//! This module turns a file of `x, y, x_err, y_err` rows into a clean
//! `MeasurementSet` that is safe to fit.
//!
//! Design goals:
//! - **Row-level validation** (skip non-numeric rows, but report what happened)
//! - **Strict shape** for rows that are numeric but too short (hard error)
//! - **Deterministic behavior**: rows are kept in file order
//! - **Separation of concerns**: no fitting logic here

use std::fs::File;
use std::io::Write;
use std::path::Path;

use csv::StringRecord;

use crate::domain::{IngestOptions, Measurement, MeasurementSet};
use crate::error::AppError;

/// Number of leading fields consumed from each row.
const FIELDS_USED: usize = 4;

/// Outcome of validating a single row.
#[derive(Debug, Clone, PartialEq)]
pub enum LineCheck {
    /// Every field is numeric; the first four are kept.
    Valid(Measurement),
    /// `field` is the first entry that failed numeric conversion.
    NonNumeric { fields: Vec<String>, field: String },
    /// All fields are numeric but there are fewer than four of them.
    TooFewFields { fields: Vec<String> },
}

impl LineCheck {
    pub fn is_valid(&self) -> bool {
        matches!(self, LineCheck::Valid(_))
    }
}

/// A row-level problem encountered during ingest.
#[derive(Debug, Clone)]
pub struct RowError {
    /// 1-based line number in the input file.
    pub line: u64,
    pub message: String,
}

/// Ingest output: the measurements plus bookkeeping about skipped rows.
#[derive(Debug, Clone)]
pub struct IngestedData {
    pub data: MeasurementSet,
    /// 1-based file line of each kept row, parallel to `data`.
    pub lines: Vec<u64>,
    pub row_errors: Vec<RowError>,
    /// Data rows seen (the skipped header is not counted).
    pub rows_read: usize,
    pub rows_used: usize,
}

/// True when `entry` converts to a float. Surrounding whitespace is ignored.
pub fn check_numeric(entry: &str) -> bool {
    parse_field(entry).is_some()
}

/// True when an uncertainty is strictly positive.
pub fn check_uncertainty(uncertainty: f64) -> bool {
    uncertainty > 0.0
}

/// Split `line` on `delimiter` and validate its fields.
///
/// Non-numeric rows are reported on stdout (the omitted line, then the first
/// offending field).
pub fn validate_line(line: &str, delimiter: char) -> LineCheck {
    validate_line_to(&mut std::io::stdout().lock(), line, delimiter)
}

/// [`validate_line`] with diagnostics written to `out`.
pub fn validate_line_to(out: &mut impl Write, line: &str, delimiter: char) -> LineCheck {
    let line = line.trim_end_matches(['\n', '\r']);
    let fields: Vec<&str> = line.split(delimiter).collect();
    check_fields(out, &fields, line)
}

fn check_fields<S: AsRef<str>>(out: &mut impl Write, fields: &[S], raw_line: &str) -> LineCheck {
    let mut values = Vec::with_capacity(fields.len());
    for entry in fields {
        match parse_field(entry.as_ref()) {
            Some(v) => values.push(v),
            None => {
                let _ = writeln!(out, "Line omitted: {raw_line}.");
                let _ = writeln!(out, "{} is nonnumerical.", entry.as_ref());
                return LineCheck::NonNumeric {
                    fields: owned(fields),
                    field: entry.as_ref().to_string(),
                };
            }
        }
    }

    if values.len() < FIELDS_USED {
        return LineCheck::TooFewFields { fields: owned(fields) };
    }

    LineCheck::Valid(Measurement {
        x: values[0],
        y: values[1],
        x_err: values[2],
        y_err: values[3],
    })
}

/// Load measurements from a delimited text file.
///
/// If the file cannot be opened, two diagnostic lines are printed before the
/// error is returned.
pub fn load_measurements(path: &Path, opts: &IngestOptions) -> Result<IngestedData, AppError> {
    load_measurements_to(&mut std::io::stdout().lock(), path, opts)
}

/// [`load_measurements`] with the omitted-row and missing-file diagnostics
/// written to `out`.
pub fn load_measurements_to(
    out: &mut impl Write,
    path: &Path,
    opts: &IngestOptions,
) -> Result<IngestedData, AppError> {
    if !opts.delimiter.is_ascii() {
        return Err(AppError::input(format!(
            "Delimiter must be a single ASCII character, got '{}'.",
            opts.delimiter
        )));
    }

    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) => {
            let _ = writeln!(out, "File '{}' cannot be found.", path.display());
            let _ = writeln!(out, "Check it is in the correct directory.");
            return Err(AppError::input(format!(
                "Failed to open input file '{}': {e}",
                path.display()
            )));
        }
    };

    // The csv reader skips blank lines, so `has_headers` drops the first
    // non-blank record. Quoting is off so that quote characters reach the
    // numeric check like any other text.
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(opts.delimiter as u8)
        .has_headers(opts.skip_header)
        .flexible(true)
        .quoting(false)
        .from_reader(file);

    let delimiter = opts.delimiter.to_string();
    let mut data = MeasurementSet::new();
    let mut lines = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for result in reader.records() {
        rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                let line = e.position().map_or(0, |p| p.line());
                log::warn!("line {line}: unreadable row: {e}");
                row_errors.push(RowError {
                    line,
                    message: format!("Unreadable row: {e}"),
                });
                continue;
            }
        };

        let line = record_line(&record);
        let fields: Vec<&str> = record.iter().collect();
        let raw = fields.join(&delimiter);

        match check_fields(out, &fields, &raw) {
            LineCheck::Valid(m) => {
                if opts.require_positive_uncertainty {
                    if let Some(bad) = [m.x_err, m.y_err].into_iter().find(|u| !check_uncertainty(*u)) {
                        let _ = writeln!(out, "Line omitted: {raw}.");
                        let _ = writeln!(out, "{bad} is not a positive uncertainty.");
                        log::debug!("line {line}: non-positive uncertainty {bad}");
                        row_errors.push(RowError {
                            line,
                            message: format!("Non-positive uncertainty: {bad}"),
                        });
                        continue;
                    }
                }
                data.push(m);
                lines.push(line);
            }
            LineCheck::NonNumeric { field, .. } => {
                log::debug!("line {line}: '{field}' is nonnumerical");
                row_errors.push(RowError {
                    line,
                    message: format!("Nonnumerical field: '{field}'"),
                });
            }
            LineCheck::TooFewFields { fields } => {
                return Err(AppError::input(format!(
                    "Line {line} of '{}' has {} field(s); expected at least {FIELDS_USED} (x, y, x_err, y_err).",
                    path.display(),
                    fields.len()
                )));
            }
        }
    }

    let rows_used = data.len();
    if !row_errors.is_empty() {
        log::warn!(
            "omitted {} of {} row(s) from '{}'",
            row_errors.len(),
            rows_read,
            path.display()
        );
    }
    if rows_used == 0 {
        return Err(AppError::input(format!(
            "No valid rows found in '{}'.",
            path.display()
        )));
    }
    log::info!("loaded {rows_used} measurement(s) from '{}'", path.display());

    Ok(IngestedData {
        data,
        lines,
        row_errors,
        rows_read,
        rows_used,
    })
}

fn record_line(record: &StringRecord) -> u64 {
    record.position().map_or(0, |p| p.line())
}

fn parse_field(entry: &str) -> Option<f64> {
    entry.trim().parse::<f64>().ok()
}

fn owned<S: AsRef<str>>(fields: &[S]) -> Vec<String> {
    fields.iter().map(|s| s.as_ref().to_string()).collect()
}
