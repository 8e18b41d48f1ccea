//! SVD least-squares solver.
//!
//! The orthogonal-distance fitter solves one small, tall system per damped step:
//!
//! ```text
//! minimize ‖A s - b‖²
//! ```
//!
//! where `A` stacks the Jacobian on top of the damping rows. We use SVD so the
//! tall (more rows than columns) case is handled robustly; nalgebra's
//! `QR::solve` is intended for square systems.

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(a: &DMatrix<f64>, b: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = a.clone().svd(true, true);

    // Try progressively looser tolerances if strict solve fails.
    for &tol in &[1e-12, 1e-10, 1e-8] {
        if let Ok(s) = svd.solve(b, tol) {
            if s.iter().all(|v| v.is_finite()) {
                return Some(s);
            }
        }
    }

    None
}

/// Ratio of smallest to largest singular value (0 for a rank-deficient matrix).
pub fn inverse_condition_number(a: &DMatrix<f64>) -> f64 {
    let sv = a.singular_values();
    let max = sv.iter().copied().fold(0.0_f64, f64::max);
    let min = sv.iter().copied().fold(f64::INFINITY, f64::min);
    if max > 0.0 && min.is_finite() { min / max } else { 0.0 }
}
