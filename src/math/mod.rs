//! Mathematical utilities: SVD least squares and orthogonal-distance regression.

pub mod odr;
pub mod ols;

pub use odr::*;
pub use ols::*;
