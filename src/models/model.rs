//! Evaluation of `y = B0·x + B1` and the dense overlay grid.

use crate::domain::LinearParams;

/// Predict `y(x)` for the fitted line.
pub fn predict(params: &LinearParams, x: f64) -> f64 {
    params.slope * x + params.intercept
}

/// `n` evenly spaced values from `start` to `stop`, both inclusive.
pub fn linspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (n as f64 - 1.0);
            (0..n)
                .map(|i| if i == n - 1 { stop } else { start + step * i as f64 })
                .collect()
        }
    }
}

/// Sample the fitted line between the first and last data x (file order).
pub fn fitted_curve(params: &LinearParams, x_first: f64, x_last: f64, n: usize) -> Vec<(f64, f64)> {
    linspace(x_first, x_last, n)
        .into_iter()
        .map(|x| (x, predict(params, x)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linspace_hits_both_ends() {
        let xs = linspace(1.0, 2.0, 5);
        assert_eq!(xs, vec![1.0, 1.25, 1.5, 1.75, 2.0]);
        assert!(linspace(0.0, 1.0, 0).is_empty());
        assert_eq!(linspace(3.0, 9.0, 1), vec![3.0]);
    }

    #[test]
    fn curve_follows_file_order_endpoints() {
        let params = LinearParams::new(2.0, 1.0);
        // Descending x: the grid runs from the first to the last point.
        let curve = fitted_curve(&params, 4.0, 0.0, 1000);
        assert_eq!(curve.len(), 1000);
        assert_eq!(curve[0], (4.0, 9.0));
        assert_eq!(curve[999], (0.0, 1.0));
    }
}
