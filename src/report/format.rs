//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the math/fitting code stays clean and testable
//! - output changes are localized (important for snapshot tests)

use std::fmt::Write;
use std::path::Path;

use crate::domain::PointResidual;
use crate::io::ingest::IngestedData;
use crate::math::OdrOutput;

/// Solver report, laid out as `Beta:` / `Beta Std Error:` / ... blocks.
pub fn format_odr_output(out: &OdrOutput) -> String {
    let mut s = String::new();
    let _ = writeln!(s, "Beta: {}", format_array(&out.beta.as_array()));
    let _ = writeln!(s, "Beta Std Error: {}", format_array(&out.sd_beta));
    let _ = writeln!(
        s,
        "Beta Covariance: [{}\n {}]",
        format_array(&out.cov_beta[0]),
        format_array(&out.cov_beta[1])
    );
    let _ = writeln!(s, "Residual Variance: {}", out.res_var);
    let _ = writeln!(s, "Inverse Condition #: {}", out.inv_condnum);
    s.push_str("Reason(s) for Halting:");
    for reason in &out.stop_reasons {
        let _ = write!(s, "\n  {reason}");
    }
    s
}

/// The single line reporting the goodness of fit.
pub fn format_reduced_chi(value: f64) -> String {
    format!("Reduced chi squared = {value}")
}

/// Dataset and fit overview printed ahead of the solver report.
pub fn format_run_summary(input: &Path, ingest: &IngestedData, fit: &OdrOutput) -> String {
    let mut out = String::new();

    out.push_str("=== odrplot - Linear ODR Fit ===\n");
    let _ = writeln!(out, "Input: {}", input.display());
    let _ = writeln!(
        out,
        "Rows: read={} | used={} | omitted={}",
        ingest.rows_read,
        ingest.rows_used,
        ingest.row_errors.len()
    );
    for e in &ingest.row_errors {
        let _ = writeln!(out, "  line {}: {}", e.line, e.message);
    }
    if let (Some((x_min, x_max)), Some((y_min, y_max))) = (min_max(ingest.data.x()), min_max(ingest.data.y())) {
        let _ = writeln!(out, "Points: x=[{x_min:.4}, {x_max:.4}] | y=[{y_min:.4}, {y_max:.4}]");
    }
    let _ = write!(
        out,
        "Fit: y = {:.6}·x + {:.6} ({} iteration(s))",
        fit.beta.slope, fit.beta.intercept, fit.iterations
    );

    out
}

/// Table of the largest chi-squared contributions (`top_n` rows).
///
/// `lines` holds the file line of each residual, so the table matches the
/// `line N:` entries of the run summary.
pub fn format_worst_points(residuals: &[PointResidual], lines: &[u64], top_n: usize) -> String {
    let mut sorted: Vec<(usize, &PointResidual)> = residuals.iter().enumerate().collect();
    sorted.sort_by(|a, b| {
        b.1.chi_contrib
            .partial_cmp(&a.1.chi_contrib)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut out = String::new();
    out.push_str("line        x            y            resid        chi2\n");
    for (i, r) in sorted.into_iter().take(top_n) {
        let _ = writeln!(
            out,
            "{:>4} {:>12.5} {:>12.5} {:>12.5} {:>12.5}",
            lines.get(i).copied().unwrap_or(i as u64 + 1),
            r.point.x,
            r.point.y,
            r.residual,
            r.chi_contrib
        );
    }
    out
}

fn format_array(values: &[f64]) -> String {
    let parts: Vec<String> = values.iter().map(|&v| format_sci(v)).collect();
    format!("[{}]", parts.join(" "))
}

/// `{:.8e}` with a signed, two-digit exponent (`2.00000000e+00`).
fn format_sci(v: f64) -> String {
    let s = format!("{v:.8e}");
    let Some((mantissa, exp)) = s.split_once('e') else {
        return s;
    };
    let (sign, digits) = match exp.strip_prefix('-') {
        Some(d) => ('-', d),
        None => ('+', exp),
    };
    format!("{mantissa}e{sign}{digits:0>2}")
}

fn min_max(values: &[f64]) -> Option<(f64, f64)> {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for &v in values {
        min = min.min(v);
        max = max.max(v);
    }
    if min.is_finite() && max.is_finite() { Some((min, max)) } else { None }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{LinearParams, Measurement, MeasurementSet};
    use crate::math::StopReason;
    use crate::report::compute_residuals;

    fn output() -> OdrOutput {
        OdrOutput {
            beta: LinearParams::new(2.0, 1.0),
            sd_beta: [0.5, 0.25],
            cov_beta: [[1.0, -0.5], [-0.5, 2.0]],
            delta: vec![0.0, 0.0, 0.0],
            eps: vec![0.0, 0.5, 0.0],
            xplus: vec![0.0, 1.0, 2.0],
            y_fit: vec![1.0, 3.0, 5.0],
            sum_square: 1.0,
            sum_square_delta: 0.0,
            sum_square_eps: 1.0,
            res_var: 1.0,
            inv_condnum: 0.25,
            iterations: 3,
            stop_reasons: vec![StopReason::SumOfSquares, StopReason::Parameter],
        }
    }

    fn data() -> MeasurementSet {
        [(0.0, 1.0), (1.0, 2.5), (2.0, 5.0)]
            .into_iter()
            .map(|(x, y)| Measurement { x, y, x_err: 0.1, y_err: 0.5 })
            .collect()
    }

    #[test]
    fn odr_report_layout() {
        let txt = format_odr_output(&output());
        let expected = concat!(
            "Beta: [2.00000000e+00 1.00000000e+00]\n",
            "Beta Std Error: [5.00000000e-01 2.50000000e-01]\n",
            "Beta Covariance: [[1.00000000e+00 -5.00000000e-01]\n",
            " [-5.00000000e-01 2.00000000e+00]]\n",
            "Residual Variance: 1\n",
            "Inverse Condition #: 0.25\n",
            "Reason(s) for Halting:\n",
            "  Sum of squares convergence\n",
            "  Parameter convergence",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn reduced_chi_line() {
        assert_eq!(format_reduced_chi(0.5), "Reduced chi squared = 0.5");
    }

    #[test]
    fn residuals_and_worst_points() {
        let residuals = compute_residuals(&data(), &output()).unwrap();
        assert_eq!(residuals.len(), 3);
        assert!((residuals[1].residual + 0.5).abs() < 1e-12);
        assert!((residuals[1].chi_contrib - 1.0).abs() < 1e-12);
        assert_eq!(residuals[0].chi_contrib, 0.0);

        // The second kept row came from line 4 of the file.
        let table = format_worst_points(&residuals, &[2, 4, 5], 1);
        let rows: Vec<&str> = table.lines().collect();
        assert_eq!(rows.len(), 2);
        assert!(rows[0].starts_with("line"));
        assert!(rows[1].trim_start().starts_with("4 "), "{}", rows[1]);
    }

    #[test]
    fn scientific_values_use_two_digit_exponents() {
        assert_eq!(format_sci(2.021_999_78), "2.02199978e+00");
        assert_eq!(format_sci(-1.5e-7), "-1.50000000e-07");
        assert_eq!(format_sci(3.0e120), "3.00000000e+120");
        assert_eq!(format_sci(0.0), "0.00000000e+00");
        assert_eq!(format_sci(f64::INFINITY), "inf");
    }
}
