//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - measurement rows and the lock-step `MeasurementSet`
//! - the fitted line parameters (`LinearParams`)
//! - run configuration (`FitConfig`, `IngestOptions`, `PlotOptions`)
//! - the saved fit file (`FitFile`)

pub mod types;

pub use types::*;
