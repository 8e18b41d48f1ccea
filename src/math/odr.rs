//! Weighted orthogonal-distance regression for a straight line.
//!
//! We fit `y = B0·x + B1` with errors in both variables:
//!
//! ```text
//! minimize Σ ε_i²/sy_i² + δ_i²/sx_i²
//! subject to y_i + ε_i = B0·(x_i + δ_i) + B1
//! ```
//!
//! For a linear model the optimal `δ_i` at fixed β has a closed form, which
//! collapses the problem to two parameters:
//!
//! ```text
//! S(β) = Σ r_i² / (sy_i² + B0²·sx_i²),   r_i = y_i - B0·x_i - B1
//! ```
//!
//! `S` is minimized with Levenberg–Marquardt. Each damped step is the
//! least-squares solution of `[J; √λ·D] s = [-f; 0]`, solved by SVD.
//!
//! Stopping follows ODRPACK's defaults: relative sum-of-squares change below
//! `ε^(1/2)`, relative parameter change below `ε^(2/3)`, or an iteration limit.

use std::fmt;

use nalgebra::{DMatrix, DVector};

use crate::domain::LinearParams;
use crate::error::AppError;
use crate::math::ols::{inverse_condition_number, solve_least_squares};

/// Damping increases tried before giving up on a step.
const MAX_DAMPING_TRIES: usize = 30;
const LAMBDA_INIT: f64 = 1e-3;
const LAMBDA_MIN: f64 = 1e-12;

/// Solver controls.
#[derive(Debug, Clone, Copy)]
pub struct OdrOptions {
    pub max_iterations: usize,
    /// Relative sum-of-squares convergence tolerance.
    pub sstol: f64,
    /// Relative parameter convergence tolerance.
    pub partol: f64,
}

impl Default for OdrOptions {
    fn default() -> Self {
        Self {
            max_iterations: 50,
            sstol: f64::EPSILON.sqrt(),
            partol: f64::EPSILON.powf(2.0 / 3.0),
        }
    }
}

/// Why the solver stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    SumOfSquares,
    Parameter,
    IterationLimit,
    NoImprovement,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StopReason::SumOfSquares => "Sum of squares convergence",
            StopReason::Parameter => "Parameter convergence",
            StopReason::IterationLimit => "Iteration limit reached",
            StopReason::NoImprovement => "No step reduced the sum of squares",
        };
        f.write_str(s)
    }
}

/// Everything the solver reports about a fit.
#[derive(Debug, Clone)]
pub struct OdrOutput {
    pub beta: LinearParams,
    /// Standard errors, `sqrt(diag(cov_beta) · res_var)`.
    pub sd_beta: [f64; 2],
    /// Unscaled covariance `(JᵀJ)⁻¹`.
    pub cov_beta: [[f64; 2]; 2],
    /// Estimated x errors.
    pub delta: Vec<f64>,
    /// Estimated y errors.
    pub eps: Vec<f64>,
    /// `x + delta`.
    pub xplus: Vec<f64>,
    /// Model value at `xplus`, which equals `y + eps`.
    pub y_fit: Vec<f64>,
    pub sum_square: f64,
    pub sum_square_delta: f64,
    pub sum_square_eps: f64,
    /// `sum_square / (n - 2)`, or 0 when there are no spare degrees of freedom.
    pub res_var: f64,
    pub inv_condnum: f64,
    pub iterations: usize,
    pub stop_reasons: Vec<StopReason>,
}

impl OdrOutput {
    pub fn converged(&self) -> bool {
        self.stop_reasons
            .iter()
            .any(|r| matches!(r, StopReason::SumOfSquares | StopReason::Parameter))
    }
}

struct Problem<'a> {
    x: &'a [f64],
    y: &'a [f64],
    sx: &'a [f64],
    sy: &'a [f64],
}

impl Problem<'_> {
    fn n(&self) -> usize {
        self.x.len()
    }

    /// Vertical residual and its standard deviation for point `i`.
    fn residual(&self, beta: [f64; 2], i: usize) -> (f64, f64) {
        let r = self.y[i] - beta[0] * self.x[i] - beta[1];
        let var = self.sy[i] * self.sy[i] + beta[0] * beta[0] * self.sx[i] * self.sx[i];
        (r, var.sqrt())
    }

    fn weighted_residuals(&self, beta: [f64; 2]) -> DVector<f64> {
        DVector::from_iterator(
            self.n(),
            (0..self.n()).map(|i| {
                let (r, sigma) = self.residual(beta, i);
                r / sigma
            }),
        )
    }

    fn jacobian(&self, beta: [f64; 2]) -> DMatrix<f64> {
        let mut j = DMatrix::zeros(self.n(), 2);
        for i in 0..self.n() {
            let (r, sigma) = self.residual(beta, i);
            let sx2 = self.sx[i] * self.sx[i];
            j[(i, 0)] = -self.x[i] / sigma - r * beta[0] * sx2 / sigma.powi(3);
            j[(i, 1)] = -1.0 / sigma;
        }
        j
    }
}

/// Fit `y = B0·x + B1` by orthogonal-distance regression.
///
/// `sx`/`sy` are the per-point standard uncertainties in x and y, used as
/// weights. The result is deterministic for identical inputs.
pub fn fit_linear(
    x: &[f64],
    y: &[f64],
    sx: &[f64],
    sy: &[f64],
    beta0: LinearParams,
    opts: &OdrOptions,
) -> Result<OdrOutput, AppError> {
    let n = x.len();
    if y.len() != n || sx.len() != n || sy.len() != n {
        return Err(AppError::fit("ODR inputs must all have the same length."));
    }
    if n < 2 {
        return Err(AppError::fit(format!(
            "ODR needs at least 2 points to fit a line, got {n}."
        )));
    }
    if !(beta0.slope.is_finite() && beta0.intercept.is_finite()) {
        return Err(AppError::fit("Initial parameter guess must be finite."));
    }

    let problem = Problem { x, y, sx, sy };
    let mut beta = beta0.as_array();
    let mut f = problem.weighted_residuals(beta);
    let mut s = f.norm_squared();
    if !s.is_finite() {
        return Err(AppError::fit(
            "Non-finite sum of squares at the initial guess (check for zero uncertainties).",
        ));
    }

    let mut lambda = LAMBDA_INIT;
    let mut iterations = 0usize;
    let mut stop_reasons = Vec::new();

    while stop_reasons.is_empty() {
        if s == 0.0 {
            stop_reasons.push(StopReason::SumOfSquares);
            break;
        }
        if iterations >= opts.max_iterations {
            stop_reasons.push(StopReason::IterationLimit);
            break;
        }
        iterations += 1;

        let j = problem.jacobian(beta);
        let scale = column_scale(&j);

        let mut accepted = None;
        for _ in 0..MAX_DAMPING_TRIES {
            if let Some(step) = damped_step(&j, &f, &scale, lambda) {
                let trial = [beta[0] + step[0], beta[1] + step[1]];
                let f_trial = problem.weighted_residuals(trial);
                let s_trial = f_trial.norm_squared();
                if s_trial.is_finite() && s_trial <= s {
                    accepted = Some((trial, step, f_trial, s_trial));
                    break;
                }
            }
            lambda *= 10.0;
        }

        let Some((trial, step, f_trial, s_trial)) = accepted else {
            stop_reasons.push(StopReason::NoImprovement);
            break;
        };

        let rel_ss = if s > 0.0 { (s - s_trial) / s } else { 0.0 };
        let beta_norm = (beta[0] * beta[0] + beta[1] * beta[1]).sqrt();
        let step_norm = (step[0] * step[0] + step[1] * step[1]).sqrt();
        let rel_par = step_norm / (beta_norm + opts.partol);

        log::debug!(
            "odr iter {iterations}: beta=[{:.6e}, {:.6e}] S={s_trial:.6e} lambda={lambda:.1e}",
            trial[0],
            trial[1]
        );

        beta = trial;
        f = f_trial;
        s = s_trial;
        lambda = (lambda / 10.0).max(LAMBDA_MIN);

        if rel_ss <= opts.sstol {
            stop_reasons.push(StopReason::SumOfSquares);
        }
        if rel_par <= opts.partol {
            stop_reasons.push(StopReason::Parameter);
        }
    }

    finish(&problem, beta, s, iterations, stop_reasons)
}

fn column_scale(j: &DMatrix<f64>) -> [f64; 2] {
    let mut out = [1.0; 2];
    for (k, d) in out.iter_mut().enumerate() {
        let norm = j.column(k).norm();
        if norm.is_finite() && norm > 0.0 {
            *d = norm;
        }
    }
    out
}

fn damped_step(j: &DMatrix<f64>, f: &DVector<f64>, scale: &[f64; 2], lambda: f64) -> Option<[f64; 2]> {
    let n = j.nrows();
    let mut a = DMatrix::zeros(n + 2, 2);
    a.view_mut((0, 0), (n, 2)).copy_from(j);
    let damping = lambda.sqrt();
    a[(n, 0)] = damping * scale[0];
    a[(n + 1, 1)] = damping * scale[1];

    let mut b = DVector::zeros(n + 2);
    b.rows_mut(0, n).copy_from(&f.map(|v| -v));

    let step = solve_least_squares(&a, &b)?;
    Some([step[0], step[1]])
}

fn finish(
    problem: &Problem<'_>,
    beta: [f64; 2],
    sum_square: f64,
    iterations: usize,
    stop_reasons: Vec<StopReason>,
) -> Result<OdrOutput, AppError> {
    let n = problem.n();
    let j = problem.jacobian(beta);
    let jtj = j.transpose() * &j;
    let cov = jtj
        .try_inverse()
        .ok_or_else(|| AppError::fit("Singular normal matrix at the solution (are all x values equal?)."))?;
    let cov_beta = [[cov[(0, 0)], cov[(0, 1)]], [cov[(1, 0)], cov[(1, 1)]]];

    let res_var = if n > 2 { sum_square / (n - 2) as f64 } else { 0.0 };
    let sd_beta = [
        (cov_beta[0][0] * res_var).sqrt(),
        (cov_beta[1][1] * res_var).sqrt(),
    ];

    let mut delta = Vec::with_capacity(n);
    let mut eps = Vec::with_capacity(n);
    let mut xplus = Vec::with_capacity(n);
    let mut y_fit = Vec::with_capacity(n);
    let mut sum_square_delta = 0.0;
    let mut sum_square_eps = 0.0;

    for i in 0..n {
        let (r, sigma) = problem.residual(beta, i);
        let var = sigma * sigma;
        let d = beta[0] * problem.sx[i] * problem.sx[i] * r / var;
        let e = -problem.sy[i] * problem.sy[i] * r / var;
        if problem.sx[i] > 0.0 {
            sum_square_delta += (d / problem.sx[i]).powi(2);
        }
        if problem.sy[i] > 0.0 {
            sum_square_eps += (e / problem.sy[i]).powi(2);
        }
        delta.push(d);
        eps.push(e);
        xplus.push(problem.x[i] + d);
        y_fit.push(problem.y[i] + e);
    }

    let all_finite = beta.iter().chain(sd_beta.iter()).all(|v| v.is_finite())
        && delta.iter().chain(eps.iter()).all(|v| v.is_finite());
    if !all_finite {
        return Err(AppError::fit("ODR produced non-finite estimates."));
    }

    Ok(OdrOutput {
        beta: LinearParams::new(beta[0], beta[1]),
        sd_beta,
        cov_beta,
        delta,
        eps,
        xplus,
        y_fit,
        sum_square,
        sum_square_delta,
        sum_square_eps,
        res_var,
        inv_condnum: inverse_condition_number(&j),
        iterations,
        stop_reasons,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tight() -> OdrOptions {
        OdrOptions {
            max_iterations: 200,
            sstol: 1e-14,
            partol: 1e-12,
        }
    }

    fn noisy_line() -> (Vec<f64>, Vec<f64>, Vec<f64>, Vec<f64>) {
        let x = vec![0.0, 0.9, 1.8, 2.6, 3.3, 4.4, 5.2, 6.1, 6.5, 7.4];
        let y = vec![5.9, 5.4, 4.4, 4.6, 3.5, 3.7, 2.8, 2.8, 2.4, 1.5];
        let sx = vec![0.03, 0.03, 0.04, 0.035, 0.07, 0.11, 0.13, 0.22, 0.74, 1.0];
        let sy = vec![1.0, 0.74, 0.5, 0.35, 0.22, 0.22, 0.12, 0.12, 0.1, 0.04];
        (x, y, sx, sy)
    }

    #[test]
    fn collinear_data_recovers_line() {
        let x: Vec<f64> = (0..8).map(|i| i as f64).collect();
        let y: Vec<f64> = x.iter().map(|v| 2.0 * v + 1.0).collect();
        let sx = vec![0.01; 8];
        let sy = vec![0.01; 8];

        let out = fit_linear(&x, &y, &sx, &sy, LinearParams::new(0.65, 0.0), &OdrOptions::default()).unwrap();
        assert!((out.beta.slope - 2.0).abs() < 1e-6, "slope {}", out.beta.slope);
        assert!((out.beta.intercept - 1.0).abs() < 1e-6, "intercept {}", out.beta.intercept);
        assert!(out.sum_square < 1e-10);
    }

    #[test]
    fn repeated_fits_are_identical() {
        let (x, y, sx, sy) = noisy_line();
        let beta0 = LinearParams::new(-1.0, 6.0);
        let a = fit_linear(&x, &y, &sx, &sy, beta0, &OdrOptions::default()).unwrap();
        let b = fit_linear(&x, &y, &sx, &sy, beta0, &OdrOptions::default()).unwrap();
        assert_eq!(a.beta, b.beta);
        assert_eq!(a.sd_beta, b.sd_beta);
        assert_eq!(a.iterations, b.iterations);
    }

    #[test]
    fn swapping_axes_inverts_slope() {
        // The objective is symmetric in (x, sx) <-> (y, sy), so the fitted
        // lines must coincide.
        let (x, y, sx, sy) = noisy_line();
        let opts = tight();
        let fwd = fit_linear(&x, &y, &sx, &sy, LinearParams::new(-1.0, 6.0), &opts).unwrap();
        let rev = fit_linear(&y, &x, &sy, &sx, LinearParams::new(-1.0, 6.0), &opts).unwrap();

        let slope_from_rev = 1.0 / rev.beta.slope;
        assert!(
            (fwd.beta.slope - slope_from_rev).abs() < 1e-5,
            "{} vs {}",
            fwd.beta.slope,
            slope_from_rev
        );
        assert!((fwd.sum_square - rev.sum_square).abs() < 1e-6 * fwd.sum_square.max(1.0));
    }

    #[test]
    fn zero_x_error_matches_weighted_least_squares() {
        let (x, y, _, sy) = noisy_line();
        let sx = vec![0.0; x.len()];
        let out = fit_linear(&x, &y, &sx, &sy, LinearParams::new(0.0, 0.0), &tight()).unwrap();

        let rows: Vec<f64> = x
            .iter()
            .zip(&sy)
            .flat_map(|(xi, si)| [xi / si, 1.0 / si])
            .collect();
        let a = DMatrix::from_row_slice(x.len(), 2, &rows);
        let b = DVector::from_iterator(y.len(), y.iter().zip(&sy).map(|(yi, si)| yi / si));
        let wls = solve_least_squares(&a, &b).unwrap();

        assert!((out.beta.slope - wls[0]).abs() < 1e-6);
        assert!((out.beta.intercept - wls[1]).abs() < 1e-6);
        assert!(out.delta.iter().all(|d| *d == 0.0));
    }

    #[test]
    fn error_estimates_reconstruct_the_line() {
        let (x, y, sx, sy) = noisy_line();
        let out = fit_linear(&x, &y, &sx, &sy, LinearParams::new(-1.0, 6.0), &OdrOptions::default()).unwrap();
        for i in 0..x.len() {
            let on_line = out.beta.slope * out.xplus[i] + out.beta.intercept;
            assert!((on_line - out.y_fit[i]).abs() < 1e-9);
        }
        let parts = out.sum_square_delta + out.sum_square_eps;
        assert!((parts - out.sum_square).abs() < 1e-9 * out.sum_square.max(1.0));
        assert!(out.res_var > 0.0);
        assert!(out.sd_beta.iter().all(|v| *v > 0.0));
    }

    #[test]
    fn rejects_degenerate_inputs() {
        let opts = OdrOptions::default();
        let beta0 = LinearParams::new(1.0, 0.0);
        assert!(fit_linear(&[1.0], &[1.0], &[0.1], &[0.1], beta0, &opts).is_err());
        assert!(fit_linear(&[1.0, 2.0], &[1.0], &[0.1, 0.1], &[0.1, 0.1], beta0, &opts).is_err());

        let err = fit_linear(&[1.0, 2.0], &[1.0, 2.0], &[0.0, 0.0], &[0.0, 0.0], beta0, &opts).unwrap_err();
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn two_points_fit_exactly_with_zero_residual_variance() {
        let out = fit_linear(
            &[0.0, 1.0],
            &[1.0, 3.0],
            &[0.1, 0.1],
            &[0.1, 0.1],
            LinearParams::new(0.65, 0.0),
            &OdrOptions::default(),
        )
        .unwrap();
        assert!((out.beta.slope - 2.0).abs() < 1e-6);
        assert_eq!(out.res_var, 0.0);
    }
}
