//! Shared fit pipeline used by the CLI front-end and tests.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! load -> ODR fit -> chi-squared -> residuals -> fitted grid
//!
//! The work is split at the fit: [`load_and_fit`] stops once the solver has
//! run, so the caller can print its report before [`finish_run`] computes the
//! statistics that may still fail (too few points, a zero y uncertainty).
//!
//! The caller then focuses on presentation (printing, figure, exports).

use crate::domain::{FitConfig, PointResidual};
use crate::error::AppError;
use crate::fit::{chi_squared, fit_measurements, reduced_chi_squared};
use crate::io::ingest::{IngestedData, load_measurements};
use crate::math::OdrOutput;
use crate::models::fitted_curve;
use crate::report::compute_residuals;

/// All computed outputs of a single `odrplot fit` run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub ingest: IngestedData,
    pub fit: OdrOutput,
    pub chi_squared: f64,
    pub reduced_chi_squared: f64,
    pub residuals: Vec<PointResidual>,
    /// Dense fitted line from the first to the last data x.
    pub curve: Vec<(f64, f64)>,
}

/// Loaded measurements and the solver output.
#[derive(Debug, Clone)]
pub struct FitStage {
    pub ingest: IngestedData,
    pub fit: OdrOutput,
}

/// Execute the full pipeline and return the computed outputs.
pub fn run_fit(config: &FitConfig) -> Result<RunOutput, AppError> {
    let stage = load_and_fit(config)?;
    finish_run(stage, config)
}

/// Load the input and run the orthogonal-distance fit.
pub fn load_and_fit(config: &FitConfig) -> Result<FitStage, AppError> {
    let ingest = load_measurements(&config.input_path, &config.ingest)?;
    let fit = fit_measurements(&ingest.data, config)?;
    Ok(FitStage { ingest, fit })
}

/// Goodness of fit, residuals, and the overlay grid for a finished fit.
pub fn finish_run(stage: FitStage, config: &FitConfig) -> Result<RunOutput, AppError> {
    let FitStage { ingest, fit } = stage;
    let data = &ingest.data;

    // Goodness of fit (y uncertainties only).
    let chi = chi_squared(data.x(), data.y(), data.y_err(), &fit.beta);
    let reduced = reduced_chi_squared(data.x(), data.y(), data.y_err(), &fit.beta)?;
    log::info!("chi squared = {chi}, reduced = {reduced}");

    // Residuals and the overlay grid.
    let residuals = compute_residuals(data, &fit)?;
    let (x_first, x_last) = data
        .x_endpoints()
        .ok_or_else(|| AppError::fit("No data points to draw a fitted line through."))?;
    let curve = fitted_curve(&fit.beta, x_first, x_last, config.curve_points);

    Ok(RunOutput {
        ingest,
        fit,
        chi_squared: chi,
        reduced_chi_squared: reduced,
        residuals,
        curve,
    })
}
