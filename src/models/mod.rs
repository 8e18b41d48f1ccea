//! The straight-line model fitted by the pipeline.
//!
//! Kept as small, pure functions so fitting, statistics, and plotting share one
//! definition of `y(x)`.

pub mod model;

pub use model::*;
