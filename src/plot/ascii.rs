//! ASCII plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements:
//! - observed points: `o`
//! - fitted line: `-`
//! - error bars: `|` (y) and `=` (x), only where nothing else is drawn

use crate::domain::{AxisLabels, MeasurementSet};

/// Render the data and fitted line as a character grid.
pub fn render_ascii_plot(
    data: &MeasurementSet,
    curve: &[(f64, f64)],
    labels: &AxisLabels,
    width: usize,
    height: usize,
) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let (x_min, x_max) = x_range(data, curve).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = y_range(data, curve).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];

    // Draw curve first (so points can overlay).
    draw_curve(&mut grid, curve, x_min, x_max, y_min, y_max);

    for m in data.iter() {
        let col = map_x(m.x, x_min, x_max, width);
        let row = map_y(m.y, y_min, y_max, height);

        let top = map_y(m.y + m.y_err.abs(), y_min, y_max, height);
        let bottom = map_y(m.y - m.y_err.abs(), y_min, y_max, height);
        for r in top..=bottom {
            set_if_blank(&mut grid, r, col, '|');
        }
        let left = map_x(m.x - m.x_err.abs(), x_min, x_max, width);
        let right = map_x(m.x + m.x_err.abs(), x_min, x_max, width);
        for c in left..=right {
            set_if_blank(&mut grid, row, c, '=');
        }
    }

    for m in data.iter() {
        let col = map_x(m.x, x_min, x_max, width);
        let row = map_y(m.y, y_min, y_max, height);
        grid[row][col] = 'o';
    }

    // Build final string. We include a small header with ranges and a legend.
    let mut out = String::new();
    if !labels.title.is_empty() {
        out.push_str(&labels.title);
        out.push('\n');
    }
    out.push_str(&format!(
        "Plot: {} in [{x_min:.3}, {x_max:.3}] | {} in [{y_min:.3}, {y_max:.3}]\n",
        labels.x, labels.y
    ));

    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }
    out.push_str("o Data   - Linear Fit\n");

    out
}

fn x_range(data: &MeasurementSet, curve: &[(f64, f64)]) -> Option<(f64, f64)> {
    let from_data = data
        .iter()
        .flat_map(|m| [m.x - m.x_err.abs(), m.x + m.x_err.abs()]);
    span(from_data.chain(curve.iter().map(|&(x, _)| x)))
}

fn y_range(data: &MeasurementSet, curve: &[(f64, f64)]) -> Option<(f64, f64)> {
    let from_data = data
        .iter()
        .flat_map(|m| [m.y - m.y_err.abs(), m.y + m.y_err.abs()]);
    span(from_data.chain(curve.iter().map(|&(_, y)| y)))
}

/// Finite min/max of `values`, widened when they coincide.
pub(crate) fn span(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for v in values.filter(|v| v.is_finite()) {
        min = min.min(v);
        max = max.max(v);
    }
    if !(min.is_finite() && max.is_finite()) {
        return None;
    }
    if max > min {
        Some((min, max))
    } else {
        Some((min - 0.5, max + 0.5))
    }
}

pub(crate) fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(x: f64, x_min: f64, x_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((x - x_min) / (x_max - x_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

fn set_if_blank(grid: &mut [Vec<char>], row: usize, col: usize, ch: char) {
    if let Some(cell) = grid.get_mut(row).and_then(|r| r.get_mut(col)) {
        if *cell == ' ' {
            *cell = ch;
        }
    }
}

fn draw_curve(grid: &mut [Vec<char>], curve: &[(f64, f64)], x_min: f64, x_max: f64, y_min: f64, y_max: f64) {
    if curve.len() < 2 {
        return;
    }
    let height = grid.len();
    let width = grid[0].len();

    let mut prev = None;
    for &(x, y) in curve {
        let col = map_x(x, x_min, x_max, width);
        let row = map_y(y, y_min, y_max, height);
        if let Some((c0, r0)) = prev {
            draw_line(grid, c0, r0, col, row, '-');
        } else {
            grid[row][col] = '-';
        }
        prev = Some((col, row));
    }
}

/// Integer line drawing (Bresenham-ish).
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0 && x0 >= 0 {
            set_if_blank(grid, y0 as usize, x0 as usize, ch);
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}
