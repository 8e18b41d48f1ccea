//! Fitting orchestration.
//!
//! Responsibilities:
//!
//! - run the orthogonal-distance fit on a loaded `MeasurementSet`
//! - compute chi-squared goodness-of-fit statistics

pub mod chi;
pub mod fitter;

pub use chi::*;
pub use fitter::*;
