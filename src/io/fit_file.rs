//! Read/write fit JSON files.
//!
//! A fit file is the "portable" representation of a run:
//! - fitted parameters, standard errors, covariance
//! - goodness-of-fit statistics
//! - the measurements and the dense fitted grid, for redrawing
//!
//! The schema is defined by `domain::FitFile`.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::Utc;

use crate::domain::{AxisLabels, FitFile, FitGrid, MeasurementSet};
use crate::error::AppError;
use crate::math::OdrOutput;

/// Name recorded in the `tool` field.
pub const TOOL_NAME: &str = "odrplot";

/// Assemble a fit file from the outputs of a run.
pub fn build_fit_file(
    source: &Path,
    data: &MeasurementSet,
    fit: &OdrOutput,
    chi_squared: f64,
    reduced_chi_squared: f64,
    labels: &AxisLabels,
    curve: &[(f64, f64)],
) -> FitFile {
    FitFile {
        tool: TOOL_NAME.to_string(),
        generated_at: Utc::now(),
        source: source.display().to_string(),
        beta: fit.beta,
        sd_beta: fit.sd_beta,
        cov_beta: fit.cov_beta,
        res_var: fit.res_var,
        chi_squared,
        reduced_chi_squared,
        labels: labels.clone(),
        data: data.clone(),
        grid: FitGrid {
            x: curve.iter().map(|&(x, _)| x).collect(),
            y: curve.iter().map(|&(_, y)| y).collect(),
        },
    }
}

/// Write a fit JSON file.
pub fn write_fit_json(path: &Path, fit_file: &FitFile) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::input(format!("Failed to create fit JSON '{}': {e}", path.display())))?;
    write_fit_to(BufWriter::new(file), fit_file)?;

    log::info!("wrote fit '{}'", path.display());
    Ok(())
}

/// Serialize `fit_file` into `out` and flush it.
fn write_fit_to<W: Write>(mut out: W, fit_file: &FitFile) -> Result<(), AppError> {
    serde_json::to_writer_pretty(&mut out, fit_file)
        .map_err(|e| AppError::input(format!("Failed to write fit JSON: {e}")))?;
    out.flush()
        .map_err(|e| AppError::input(format!("Failed to write fit JSON: {e}")))?;
    Ok(())
}

/// Read a fit JSON file.
pub fn read_fit_json(path: &Path) -> Result<FitFile, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::input(format!("Failed to open fit JSON '{}': {e}", path.display())))?;
    let fit_file: FitFile = serde_json::from_reader(std::io::BufReader::new(file))
        .map_err(|e| AppError::input(format!("Invalid fit JSON: {e}")))?;
    if fit_file.grid.x.len() != fit_file.grid.y.len() {
        return Err(AppError::input("Invalid fit JSON: grid x and y differ in length."));
    }
    Ok(fit_file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{LinearParams, Measurement};
    use crate::math::{OdrOptions, fit_linear};
    use crate::models::fitted_curve;

    #[test]
    fn fit_file_survives_a_write_and_read() {
        let data: MeasurementSet = [(0.0, 1.1), (1.0, 2.9), (2.0, 5.2), (3.0, 6.9)]
            .into_iter()
            .map(|(x, y)| Measurement { x, y, x_err: 0.1, y_err: 0.2 })
            .collect();
        let fit = fit_linear(
            data.x(),
            data.y(),
            data.x_err(),
            data.y_err(),
            LinearParams::new(1.0, 0.0),
            &OdrOptions::default(),
        )
        .unwrap();
        let curve = fitted_curve(&fit.beta, 0.0, 3.0, 11);
        let written = build_fit_file(
            Path::new("e3data.csv"),
            &data,
            &fit,
            1.5,
            0.75,
            &AxisLabels::default(),
            &curve,
        );

        let path = std::env::temp_dir().join(format!("odr-plot-fit-{}.json", std::process::id()));
        write_fit_json(&path, &written).unwrap();
        let read = read_fit_json(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(read.tool, TOOL_NAME);
        assert!((read.beta.slope - fit.beta.slope).abs() < 1e-12);
        assert!((read.beta.intercept - fit.beta.intercept).abs() < 1e-12);
        assert_eq!(read.data, data);
        assert_eq!(read.grid.x.len(), curve.len());
        for ((x, y), (cx, cy)) in read.grid.points().into_iter().zip(curve) {
            assert!((x - cx).abs() < 1e-12 && (y - cy).abs() < 1e-12);
        }
        assert_eq!(read.reduced_chi_squared, 0.75);
    }

    /// Accepts everything written but fails on flush, like a full disk.
    struct FailingFlush(Vec<u8>);

    impl Write for FailingFlush {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Err(std::io::Error::other("no space left on device"))
        }
    }

    #[test]
    fn failed_flush_is_reported() {
        let data: MeasurementSet = [(0.0, 1.0), (1.0, 3.0), (2.0, 5.0)]
            .into_iter()
            .map(|(x, y)| Measurement { x, y, x_err: 0.1, y_err: 0.1 })
            .collect();
        let fit = fit_linear(
            data.x(),
            data.y(),
            data.x_err(),
            data.y_err(),
            LinearParams::new(1.0, 0.0),
            &OdrOptions::default(),
        )
        .unwrap();
        let curve = fitted_curve(&fit.beta, 0.0, 2.0, 3);
        let fit_file = build_fit_file(Path::new("in.csv"), &data, &fit, 0.0, 0.0, &AxisLabels::default(), &curve);

        let err = write_fit_to(BufWriter::new(FailingFlush(Vec::new())), &fit_file).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.message().contains("no space left"), "{}", err.message());
    }

    #[test]
    fn missing_fit_file_is_an_input_error() {
        let err = read_fit_json(Path::new("/nonexistent/odr-plot-fit.json")).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
