//! `odr-plot` library crate.
//!
//! The binary (`odrplot`) is a thin wrapper around this library so that:
//!
//! - loading, fitting, and statistics are testable without spawning processes
//! - the pipeline can be reused from other tools or notebooks

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod models;
pub mod plot;
pub mod report;
