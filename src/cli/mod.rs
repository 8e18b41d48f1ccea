//! Command-line parsing for the ODR line fitter.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! loading/fitting/plotting code. Defaults here are the defaults of a run.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "odrplot",
    version,
    about = "Straight-line fit with errors in both variables (orthogonal-distance regression)"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Load measurements, fit, print diagnostics, and save the figure.
    Fit(FitArgs),
    /// Write a synthetic measurement file around a known line.
    Sample(SampleArgs),
    /// Redraw the figure from a saved fit JSON without refitting.
    Plot(PlotArgs),
}

/// Options for fitting a measurement file.
#[derive(Debug, Parser, Clone)]
pub struct FitArgs {
    /// Delimited file with columns x, y, x-uncertainty, y-uncertainty.
    #[arg(value_name = "FILE", default_value = "e3data.csv")]
    pub input: PathBuf,

    /// Field delimiter (use ' ' for whitespace-separated .txt files).
    #[arg(short = 'd', long, default_value_t = ',')]
    pub delimiter: char,

    /// Skip the first line of the file (a header).
    #[arg(long)]
    pub skip_header: bool,

    /// Omit rows whose x or y uncertainty is not strictly positive.
    #[arg(long)]
    pub require_positive_uncertainty: bool,

    /// Initial slope guess for the solver.
    #[arg(long, default_value_t = 0.650_528_909_980_32, allow_negative_numbers = true)]
    pub beta0_slope: f64,

    /// Initial intercept guess for the solver.
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub beta0_intercept: f64,

    /// Maximum solver iterations.
    #[arg(long, default_value_t = 50)]
    pub max_iter: usize,

    /// Number of points on the drawn fit line.
    #[arg(long, default_value_t = 1000)]
    pub curve_points: usize,

    /// X axis label.
    #[arg(long, default_value = "V_in / V")]
    pub x_label: String,

    /// Y axis label.
    #[arg(long, default_value = "V_out / V")]
    pub y_label: String,

    /// Figure title (none by default).
    #[arg(long, default_value = "")]
    pub title: String,

    #[command(flatten)]
    pub figure: FigureArgs,

    /// Export per-point results to CSV.
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Export the fit (parameters, statistics, data, fitted grid) to JSON.
    #[arg(long = "export-fit")]
    pub export_fit: Option<PathBuf>,
}

/// Figure output and terminal preview options shared by `fit` and `plot`.
#[derive(Debug, Args, Clone)]
pub struct FigureArgs {
    /// Output image path (SVG).
    #[arg(short = 'o', long, default_value = "plot3.svg")]
    pub output: PathBuf,

    /// Resolution used to size the canvas.
    #[arg(long, default_value_t = 800)]
    pub dpi: u32,

    /// Figure width in inches.
    #[arg(long, default_value_t = 6.4)]
    pub fig_width: f64,

    /// Figure height in inches.
    #[arg(long, default_value_t = 4.8)]
    pub fig_height: f64,

    /// Do not draw the terminal plot.
    #[arg(long)]
    pub no_show: bool,

    /// Terminal plot width (columns).
    #[arg(long, default_value_t = 80)]
    pub width: usize,

    /// Terminal plot height (rows).
    #[arg(long, default_value_t = 24)]
    pub height: usize,
}

/// Options for generating a synthetic measurement file.
#[derive(Debug, Parser, Clone)]
pub struct SampleArgs {
    /// Where to write the file.
    #[arg(short = 'o', long, default_value = "sample.csv")]
    pub output: PathBuf,

    /// Number of rows.
    #[arg(short = 'n', long, default_value_t = 20)]
    pub count: usize,

    /// True slope.
    #[arg(long, default_value_t = 2.0, allow_negative_numbers = true)]
    pub slope: f64,

    /// True intercept.
    #[arg(long, default_value_t = 1.0, allow_negative_numbers = true)]
    pub intercept: f64,

    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub x_min: f64,

    #[arg(long, default_value_t = 10.0, allow_negative_numbers = true)]
    pub x_max: f64,

    /// Standard uncertainty in x (also the noise level).
    #[arg(long, default_value_t = 0.05)]
    pub x_err: f64,

    /// Standard uncertainty in y (also the noise level).
    #[arg(long, default_value_t = 0.2)]
    pub y_err: f64,

    /// Random seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Write an `x,y,x_err,y_err` header line.
    #[arg(long)]
    pub header: bool,

    /// Field delimiter.
    #[arg(short = 'd', long, default_value_t = ',')]
    pub delimiter: char,
}

/// Options for redrawing a saved fit.
#[derive(Debug, Parser, Clone)]
pub struct PlotArgs {
    /// Fit JSON file produced by `odrplot fit --export-fit`.
    #[arg(long, value_name = "JSON")]
    pub fit: PathBuf,

    #[command(flatten)]
    pub figure: FigureArgs,
}
