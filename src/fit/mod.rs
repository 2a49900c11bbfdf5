//! Estimation and prediction.
//!
//! - `derivative`: differencing strategy for the weight-shape partials
//! - `residual`: residual vector, Jacobian and the solver-facing problem
//! - `estimator`: OLS seed plus Levenberg–Marquardt refinement
//! - `forecast`: predictions from a fitted model

pub mod derivative;
pub mod estimator;
pub mod forecast;
pub mod residual;

pub use derivative::*;
pub use estimator::*;
pub use forecast::*;
pub use residual::*;
