//! Synthetic measurement generation around a known straight line.
//!
//! True x values are drawn uniformly and sorted, then both coordinates are
//! perturbed with Gaussian noise whose standard deviation is the stated
//! uncertainty, so a correct fit has a reduced chi-squared near 1.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::{LinearParams, Measurement, MeasurementSet};
use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct SampleConfig {
    pub count: usize,
    pub line: LinearParams,
    pub x_min: f64,
    pub x_max: f64,
    pub x_err: f64,
    pub y_err: f64,
    pub seed: u64,
}

pub fn generate_sample(config: &SampleConfig) -> Result<MeasurementSet, AppError> {
    if config.count == 0 {
        return Err(AppError::input("Sample count must be > 0."));
    }
    if !(config.x_min.is_finite() && config.x_max.is_finite() && config.x_max > config.x_min) {
        return Err(AppError::input("Invalid x range for sample generation."));
    }
    if !(config.x_err.is_finite() && config.y_err.is_finite() && config.x_err >= 0.0 && config.y_err > 0.0) {
        return Err(AppError::input(
            "Sample uncertainties must be finite, with x_err >= 0 and y_err > 0.",
        ));
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let x_noise = Normal::new(0.0, config.x_err)
        .map_err(|e| AppError::input(format!("Noise distribution error: {e}")))?;
    let y_noise = Normal::new(0.0, config.y_err)
        .map_err(|e| AppError::input(format!("Noise distribution error: {e}")))?;

    let mut xs: Vec<f64> = (0..config.count)
        .map(|_| rng.gen_range(config.x_min..=config.x_max))
        .collect();
    xs.sort_by(|a, b| a.total_cmp(b));

    Ok(xs
        .into_iter()
        .map(|x_true| {
            let y_true = config.line.slope * x_true + config.line.intercept;
            Measurement {
                x: x_true + x_noise.sample(&mut rng),
                y: y_true + y_noise.sample(&mut rng),
                x_err: config.x_err,
                y_err: config.y_err,
            }
        })
        .collect())
}

/// Write measurements in the loader's format, optionally with a header line.
pub fn write_sample(path: &Path, data: &MeasurementSet, delimiter: char, header: bool) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::input(format!("Failed to create sample file '{}': {e}", path.display())))?;
    let mut out = BufWriter::new(file);
    let write_err = |e: std::io::Error| AppError::input(format!("Failed to write sample file: {e}"));

    if header {
        writeln!(out, "x{d}y{d}x_err{d}y_err", d = delimiter).map_err(write_err)?;
    }
    for m in data.iter() {
        writeln!(out, "{}{d}{}{d}{}{d}{}", m.x, m.y, m.x_err, m.y_err, d = delimiter).map_err(write_err)?;
    }
    out.flush().map_err(write_err)?;

    log::info!("wrote {} sample row(s) to '{}'", data.len(), path.display());
    Ok(())
}
