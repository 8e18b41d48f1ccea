//! Export per-point results to CSV.
//!
//! The export is meant to be easy to consume in spreadsheets or downstream scripts.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::domain::PointResidual;
use crate::error::AppError;

/// Write per-point results to a CSV file.
pub fn write_results_csv(path: &Path, residuals: &[PointResidual]) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::input(format!("Failed to create export CSV '{}': {e}", path.display())))?;
    let mut out = BufWriter::new(file);

    writeln!(out, "x,y,x_err,y_err,y_fit,residual,delta,eps,chi_contrib")
        .map_err(|e| AppError::input(format!("Failed to write export CSV header: {e}")))?;

    for r in residuals {
        let p = &r.point;
        writeln!(
            out,
            "{},{},{},{},{:.10},{:.10},{:.10},{:.10},{:.10}",
            p.x, p.y, p.x_err, p.y_err, r.y_fit, r.residual, r.delta, r.eps, r.chi_contrib,
        )
        .map_err(|e| AppError::input(format!("Failed to write export CSV row: {e}")))?;
    }

    out.flush()
        .map_err(|e| AppError::input(format!("Failed to flush export CSV '{}': {e}", path.display())))?;
    log::info!("wrote {} row(s) to '{}'", residuals.len(), path.display());
    Ok(())
}
