//! Chi-squared goodness of fit.
//!
//! Only the y-uncertainties enter the statistic:
//!
//! ```text
//! χ² = Σ ((B0·x_i + B1) - y_i)² / σy_i²
//! χ²_red = χ² / (n - 2)
//! ```

use crate::domain::LinearParams;
use crate::error::AppError;
use crate::models::predict;

/// Number of fitted parameters (slope, intercept).
pub const FITTED_PARAMS: usize = 2;

/// Sum of squared, y-uncertainty-normalized residuals.
///
/// A zero uncertainty yields an infinite or NaN sum; use
/// [`reduced_chi_squared`] for a checked value.
pub fn chi_squared(x: &[f64], y: &[f64], y_err: &[f64], params: &LinearParams) -> f64 {
    x.iter()
        .zip(y)
        .zip(y_err)
        .map(|((&xi, &yi), &si)| {
            let r = predict(params, xi) - yi;
            r * r / (si * si)
        })
        .sum()
}

/// Chi-squared per degree of freedom.
pub fn reduced_chi_squared(
    x: &[f64],
    y: &[f64],
    y_err: &[f64],
    params: &LinearParams,
) -> Result<f64, AppError> {
    let n = x.len();
    if y.len() != n || y_err.len() != n {
        return Err(AppError::fit("Chi-squared inputs must all have the same length."));
    }
    if n <= FITTED_PARAMS {
        return Err(AppError::fit(format!(
            "Reduced chi-squared is undefined for {n} point(s): need more than {FITTED_PARAMS}."
        )));
    }
    if let Some(i) = y_err.iter().position(|s| *s == 0.0) {
        return Err(AppError::fit(format!(
            "Reduced chi-squared is undefined: y uncertainty of point {} is zero.",
            i + 1
        )));
    }

    let dof = (n - FITTED_PARAMS) as f64;
    Ok(chi_squared(x, y, y_err, params) / dof)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_fit_has_zero_reduced_chi() {
        let x = [0.0, 1.0, 2.0, 3.0, 4.0];
        let y = [1.0, 3.0, 5.0, 7.0, 9.0];
        let s = [0.1; 5];
        let params = LinearParams::new(2.0, 1.0);
        assert_eq!(chi_squared(&x, &y, &s, &params), 0.0);
        assert_eq!(reduced_chi_squared(&x, &y, &s, &params).unwrap(), 0.0);
    }

    #[test]
    fn chi_uses_y_uncertainty_only() {
        let x = [0.0, 1.0, 2.0];
        let y = [1.5, 3.0, 5.0];
        let s = [0.5, 1.0, 1.0];
        let params = LinearParams::new(2.0, 1.0);
        // Only the first point is off by 0.5, with σ=0.5.
        assert!((chi_squared(&x, &y, &s, &params) - 1.0).abs() < 1e-12);
        assert!((reduced_chi_squared(&x, &y, &s, &params).unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn undefined_cases_are_errors() {
        let params = LinearParams::new(1.0, 0.0);
        let err = reduced_chi_squared(&[1.0, 2.0], &[1.0, 2.0], &[0.1, 0.1], &params).unwrap_err();
        assert_eq!(err.exit_code(), 4);

        let err = reduced_chi_squared(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0], &[0.1, 0.0, 0.1], &params)
            .unwrap_err();
        assert!(err.message().contains("point 2"));
    }
}
