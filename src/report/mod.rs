//! Reporting utilities: per-point residuals and formatted terminal output.

use crate::domain::{MeasurementSet, PointResidual};
use crate::error::AppError;
use crate::math::OdrOutput;
use crate::models::predict;

pub mod format;

pub use format::*;

/// Compute fitted values, residuals, and chi-squared terms for each point.
pub fn compute_residuals(data: &MeasurementSet, fit: &OdrOutput) -> Result<Vec<PointResidual>, AppError> {
    if fit.delta.len() != data.len() || fit.eps.len() != data.len() {
        return Err(AppError::fit("Fit output does not match the measurement count."));
    }

    let mut out = Vec::with_capacity(data.len());
    for (i, point) in data.iter().enumerate() {
        let y_fit = predict(&fit.beta, point.x);
        if !y_fit.is_finite() {
            return Err(AppError::fit("Non-finite model prediction during residual computation."));
        }
        let residual = point.y - y_fit;
        out.push(PointResidual {
            point,
            y_fit,
            residual,
            delta: fit.delta[i],
            eps: fit.eps[i],
            chi_contrib: residual * residual / (point.y_err * point.y_err),
        });
    }
    Ok(out)
}
