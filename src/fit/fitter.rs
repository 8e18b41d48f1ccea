//! Pipeline-facing wrapper around the orthogonal-distance solver.
//!
//! Given a loaded `MeasurementSet` and the run configuration we:
//! - pull the four columns out of the set
//! - run the ODR fit from the configured initial guess
//! - log how the solver stopped

use crate::domain::{FitConfig, MeasurementSet};
use crate::error::AppError;
use crate::math::{OdrOptions, OdrOutput, fit_linear};

/// Solver options derived from the run configuration.
pub fn odr_options(config: &FitConfig) -> OdrOptions {
    OdrOptions {
        max_iterations: config.max_iterations,
        ..OdrOptions::default()
    }
}

/// Fit `y = B0·x + B1` to the measurements, weighting by both uncertainties.
pub fn fit_measurements(data: &MeasurementSet, config: &FitConfig) -> Result<OdrOutput, AppError> {
    if data.is_empty() {
        return Err(AppError::fit("No data points to fit."));
    }

    let out = fit_linear(
        data.x(),
        data.y(),
        data.x_err(),
        data.y_err(),
        config.beta0,
        &odr_options(config),
    )?;

    let reasons: Vec<String> = out.stop_reasons.iter().map(ToString::to_string).collect();
    if out.converged() {
        log::info!(
            "ODR fit finished after {} iteration(s): {}",
            out.iterations,
            reasons.join(", ")
        );
    } else {
        log::warn!(
            "ODR fit did not converge after {} iteration(s): {}",
            out.iterations,
            reasons.join(", ")
        );
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Measurement;

    #[test]
    fn fits_loaded_measurements() {
        let data: MeasurementSet = (0..6)
            .map(|i| {
                let x = i as f64;
                Measurement { x, y: 2.0 * x + 1.0, x_err: 0.05, y_err: 0.05 }
            })
            .collect();

        let out = fit_measurements(&data, &FitConfig::default()).unwrap();
        assert!((out.beta.slope - 2.0).abs() < 1e-6);
        assert!((out.beta.intercept - 1.0).abs() < 1e-6);
        assert_eq!(out.delta.len(), 6);
    }

    #[test]
    fn empty_set_is_rejected() {
        let err = fit_measurements(&MeasurementSet::new(), &FitConfig::default()).unwrap_err();
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn iteration_limit_is_honored() {
        let data: MeasurementSet = [(0.0, 1.2), (1.0, 2.7), (2.0, 5.3), (3.0, 6.8)]
            .into_iter()
            .map(|(x, y)| Measurement { x, y, x_err: 0.1, y_err: 0.2 })
            .collect();
        let config = FitConfig {
            max_iterations: 1,
            ..FitConfig::default()
        };
        let out = fit_measurements(&data, &config).unwrap();
        assert!(out.iterations <= 1);
    }
}
