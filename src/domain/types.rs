//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during loading and fitting
//! - exported to JSON/CSV
//! - reloaded later for plotting without refitting

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// One validated input row: a value pair and its uncertainties.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub x: f64,
    pub y: f64,
    pub x_err: f64,
    pub y_err: f64,
}

/// Four lock-step columns of measurements, in file order.
///
/// The columns are private so they can only grow together; every column always
/// has the same length.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "MeasurementColumns")]
pub struct MeasurementSet {
    x: Vec<f64>,
    y: Vec<f64>,
    x_err: Vec<f64>,
    y_err: Vec<f64>,
}

/// Unchecked wire form of [`MeasurementSet`].
#[derive(Debug, Clone, Deserialize)]
struct MeasurementColumns {
    x: Vec<f64>,
    y: Vec<f64>,
    x_err: Vec<f64>,
    y_err: Vec<f64>,
}

impl TryFrom<MeasurementColumns> for MeasurementSet {
    type Error = AppError;

    fn try_from(c: MeasurementColumns) -> Result<Self, Self::Error> {
        MeasurementSet::from_columns(c.x, c.y, c.x_err, c.y_err)
    }
}

impl MeasurementSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from already-parsed columns.
    pub fn from_columns(
        x: Vec<f64>,
        y: Vec<f64>,
        x_err: Vec<f64>,
        y_err: Vec<f64>,
    ) -> Result<Self, AppError> {
        let n = x.len();
        if y.len() != n || x_err.len() != n || y_err.len() != n {
            return Err(AppError::input(format!(
                "Measurement columns differ in length: x={}, y={}, x_err={}, y_err={}",
                n,
                y.len(),
                x_err.len(),
                y_err.len()
            )));
        }
        Ok(Self { x, y, x_err, y_err })
    }

    pub fn push(&mut self, m: Measurement) {
        self.x.push(m.x);
        self.y.push(m.y);
        self.x_err.push(m.x_err);
        self.y_err.push(m.y_err);
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn x(&self) -> &[f64] {
        &self.x
    }

    pub fn y(&self) -> &[f64] {
        &self.y
    }

    pub fn x_err(&self) -> &[f64] {
        &self.x_err
    }

    pub fn y_err(&self) -> &[f64] {
        &self.y_err
    }

    pub fn get(&self, i: usize) -> Option<Measurement> {
        Some(Measurement {
            x: *self.x.get(i)?,
            y: self.y[i],
            x_err: self.x_err[i],
            y_err: self.y_err[i],
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = Measurement> + '_ {
        (0..self.len()).filter_map(|i| self.get(i))
    }

    /// First and last x in file order (not min/max).
    pub fn x_endpoints(&self) -> Option<(f64, f64)> {
        Some((*self.x.first()?, *self.x.last()?))
    }
}

impl FromIterator<Measurement> for MeasurementSet {
    fn from_iter<I: IntoIterator<Item = Measurement>>(iter: I) -> Self {
        let mut set = MeasurementSet::new();
        for m in iter {
            set.push(m);
        }
        set
    }
}

/// Parameters of `y = slope·x + intercept` (`B0`, `B1`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearParams {
    pub slope: f64,
    pub intercept: f64,
}

impl LinearParams {
    pub fn new(slope: f64, intercept: f64) -> Self {
        Self { slope, intercept }
    }

    pub fn as_array(&self) -> [f64; 2] {
        [self.slope, self.intercept]
    }
}

/// A per-point fitted result (used for summaries and exports).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointResidual {
    pub point: Measurement,
    pub y_fit: f64,
    /// `y - y_fit` measured vertically.
    pub residual: f64,
    /// Estimated error in x from the orthogonal-distance fit.
    pub delta: f64,
    /// Estimated error in y from the orthogonal-distance fit.
    pub eps: f64,
    /// This point's term in the chi-squared sum.
    pub chi_contrib: f64,
}

/// How the loader reads a delimited measurement file.
#[derive(Debug, Clone)]
pub struct IngestOptions {
    pub delimiter: char,
    /// Skip the first record. Blank lines are skipped by the reader and never
    /// reported, so the header is the first non-blank line.
    pub skip_header: bool,
    /// Omit rows with a non-positive uncertainty. Off by default, in which case
    /// such rows pass through untouched.
    pub require_positive_uncertainty: bool,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            delimiter: ',',
            skip_header: false,
            require_positive_uncertainty: false,
        }
    }
}

/// Axis labels and title shared by both renderers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisLabels {
    pub x: String,
    pub y: String,
    #[serde(default)]
    pub title: String,
}

impl Default for AxisLabels {
    fn default() -> Self {
        Self {
            x: "V_in / V".to_string(),
            y: "V_out / V".to_string(),
            title: String::new(),
        }
    }
}

/// Output settings for the saved figure.
#[derive(Debug, Clone)]
pub struct PlotOptions {
    pub output_path: PathBuf,
    pub labels: AxisLabels,
    pub dpi: u32,
    pub width_in: f64,
    pub height_in: f64,
}

impl PlotOptions {
    /// Canvas size in pixels.
    pub fn pixel_size(&self) -> (u32, u32) {
        let w = (self.width_in * f64::from(self.dpi)).round().max(1.0) as u32;
        let h = (self.height_in * f64::from(self.dpi)).round().max(1.0) as u32;
        (w, h)
    }
}

impl Default for PlotOptions {
    fn default() -> Self {
        Self {
            output_path: PathBuf::from("plot3.svg"),
            labels: AxisLabels::default(),
            dpi: 800,
            width_in: 6.4,
            height_in: 4.8,
        }
    }
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct FitConfig {
    pub input_path: PathBuf,
    pub ingest: IngestOptions,

    /// Initial guess handed to the solver.
    pub beta0: LinearParams,
    pub max_iterations: usize,

    /// Number of points in the dense fitted line.
    pub curve_points: usize,
    pub plot: PlotOptions,

    /// Render the terminal plot after saving the figure.
    pub show: bool,
    pub show_width: usize,
    pub show_height: usize,

    pub export_results: Option<PathBuf>,
    pub export_fit: Option<PathBuf>,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from("e3data.csv"),
            ingest: IngestOptions::default(),
            beta0: LinearParams::new(0.650_528_909_980_32, 0.0),
            max_iterations: 50,
            curve_points: 1000,
            plot: PlotOptions::default(),
            show: true,
            show_width: 80,
            show_height: 24,
            export_results: None,
            export_fit: None,
        }
    }
}

/// A saved fit (JSON), enough to redraw the figure without refitting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitFile {
    pub tool: String,
    pub generated_at: DateTime<Utc>,
    pub source: String,
    pub beta: LinearParams,
    pub sd_beta: [f64; 2],
    pub cov_beta: [[f64; 2]; 2],
    pub res_var: f64,
    pub chi_squared: f64,
    pub reduced_chi_squared: f64,
    pub labels: AxisLabels,
    pub data: MeasurementSet,
    pub grid: FitGrid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitGrid {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

impl FitGrid {
    pub fn points(&self) -> Vec<(f64, f64)> {
        self.x.iter().copied().zip(self.y.iter().copied()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_columns_rejects_ragged_input() {
        let err = MeasurementSet::from_columns(vec![1.0, 2.0], vec![1.0], vec![0.1, 0.1], vec![0.1, 0.1])
            .unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn push_keeps_columns_in_lock_step() {
        let mut set = MeasurementSet::new();
        set.push(Measurement { x: 1.0, y: 2.0, x_err: 0.1, y_err: 0.2 });
        set.push(Measurement { x: 3.0, y: 4.0, x_err: 0.3, y_err: 0.4 });

        assert_eq!(set.len(), 2);
        assert_eq!(set.x(), &[1.0, 3.0]);
        assert_eq!(set.y_err(), &[0.2, 0.4]);
        assert_eq!(set.x_endpoints(), Some((1.0, 3.0)));
        assert_eq!(set.get(1).unwrap().x_err, 0.3);
    }

    #[test]
    fn deserialize_validates_lengths() {
        let ok = r#"{"x":[1.0],"y":[2.0],"x_err":[0.1],"y_err":[0.2]}"#;
        let set: MeasurementSet = serde_json::from_str(ok).unwrap();
        assert_eq!(set.len(), 1);

        let bad = r#"{"x":[1.0,2.0],"y":[2.0],"x_err":[0.1],"y_err":[0.2]}"#;
        assert!(serde_json::from_str::<MeasurementSet>(bad).is_err());
    }

    #[test]
    fn default_canvas_is_800_dpi() {
        let opts = PlotOptions::default();
        assert_eq!(opts.pixel_size(), (5120, 3840));
    }
}
