//! `midas-rs` library crate.
//!
//! Mixed-data sampling (MIDAS) regression: a low-frequency target regressed on
//! many lags of a high-frequency series whose weights follow a parametric
//! polynomial (Beta, Beta with non-zero tail, exponential Almon).
//!
//! The binary (`midas`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - modules are reusable from other tools and notebooks
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod backtest;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod mix;
pub mod report;
pub mod weights;
