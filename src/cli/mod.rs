//! Command-line parsing for the `midas` binary.
//!
//! Argument parsing and command dispatch stay separate from the estimation
//! code; `app` turns these structs into library configuration.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{ArgAction, Args, Parser, Subcommand};

use crate::backtest::DEFAULT_WINDOW_SIZE;
use crate::domain::{BacktestMethod, WeightFamily};
use crate::mix::LagSpec;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "midas", version, about = "Mixed-data sampling (MIDAS) regression")]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug). `RUST_LOG` takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fit one model over a fixed window and forecast the rows after it.
    Fit(FitArgs),
    /// Out-of-sample evaluation with fixed, rolling or recursive windows.
    Backtest(BacktestArgs),
    /// Apply a saved fit (`fit --export-fit`) to fresh data.
    Predict(PredictArgs),
    /// Write a seeded synthetic quarterly/monthly pair as CSV.
    Simulate(SimulateArgs),
}

/// The two input series.
#[derive(Debug, Args, Clone)]
pub struct DataArgs {
    /// Low-frequency target CSV (`DATE,VALUE`).
    #[arg(long, value_name = "CSV")]
    pub lf: PathBuf,

    /// High-frequency regressor CSV (`DATE,VALUE`).
    #[arg(long, value_name = "CSV")]
    pub hf: PathBuf,

    /// Convert both series to percent log growth first.
    #[arg(long)]
    pub growth: bool,
}

/// Mixing and estimation settings shared by `fit` and `backtest`.
#[derive(Debug, Args, Clone)]
pub struct ModelArgs {
    /// High-frequency lags: a count (`9`) or a span (`3M`, `1Q`, `22B`).
    #[arg(long, default_value = "3M")]
    pub xlag: LagSpec,

    /// Autoregressive lags of the target.
    #[arg(long, default_value_t = 1)]
    pub ylag: usize,

    /// Forecast horizon in high-frequency periods (negative = nowcast).
    #[arg(long, default_value_t = 1, allow_hyphen_values = true)]
    pub horizon: i64,

    /// First estimation date (YYYY-MM-DD).
    #[arg(long)]
    pub start: Option<NaiveDate>,

    /// Last estimation date (YYYY-MM-DD).
    #[arg(long)]
    pub end: Option<NaiveDate>,

    /// Weight polynomial: beta, beta_nz or expalmon.
    #[arg(long, default_value = "beta")]
    pub poly: WeightFamily,

    /// Solver evaluation cap.
    #[arg(long, default_value_t = 5000)]
    pub max_evals: usize,
}

#[derive(Debug, Args, Clone)]
pub struct FitArgs {
    #[command(flatten)]
    pub data: DataArgs,

    #[command(flatten)]
    pub model: ModelArgs,

    /// Save the fitted model as JSON.
    #[arg(long = "export-fit", value_name = "JSON")]
    pub export_fit: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct BacktestArgs {
    #[command(flatten)]
    pub data: DataArgs,

    #[command(flatten)]
    pub model: ModelArgs,

    /// fixed, rolling or recursive.
    #[arg(long, default_value = "rolling")]
    pub method: BacktestMethod,

    /// Forecast row each window is scored on (1 = next period).
    #[arg(long, default_value_t = 1)]
    pub forecast_horizon: usize,

    /// Rolling window width when `--end` is not given.
    #[arg(long, default_value_t = DEFAULT_WINDOW_SIZE)]
    pub window: usize,

    /// Export predictions to CSV.
    #[arg(long, value_name = "CSV")]
    pub export: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct PredictArgs {
    /// Fit JSON written by `midas fit --export-fit`.
    #[arg(long = "fit-file", value_name = "JSON")]
    pub fit_file: PathBuf,

    #[command(flatten)]
    pub data: DataArgs,

    /// Forecast the rows after this date (defaults to the fit's last estimation date).
    #[arg(long)]
    pub end: Option<NaiveDate>,
}

#[derive(Debug, Args, Clone)]
pub struct SimulateArgs {
    /// Directory receiving `lf.csv` and `hf.csv`.
    #[arg(long, value_name = "DIR")]
    pub out_dir: PathBuf,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Number of quarterly observations.
    #[arg(long, default_value_t = 120)]
    pub quarters: usize,

    /// Standard deviation of the target noise.
    #[arg(long, default_value_t = 0.3)]
    pub noise: f64,

    /// Weight polynomial of the simulated process.
    #[arg(long, default_value = "beta")]
    pub poly: WeightFamily,
}
