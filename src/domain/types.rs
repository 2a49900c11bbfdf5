//! Shared domain types.
//!
//! These types are kept small and serializable where they cross the library
//! boundary (fit results, backtest reports) so they can be exported as JSON/CSV
//! and reloaded later.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::NaiveDate;
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::error::MidasError;
use crate::fit::EstimateOptions;
use crate::mix::LagSpec;

/// Polynomial weight family applied across high-frequency lags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightFamily {
    /// Normalized Beta density on evenly spaced points in `(0, 1)`.
    Beta,
    /// Beta density plus a constant offset `θ3`.
    #[serde(rename = "beta_nz")]
    BetaNonZero,
    /// Exponential Almon polynomial `exp(θ1·i + θ2·i²)`.
    #[serde(rename = "expalmon")]
    ExpAlmon,
}

impl WeightFamily {
    pub const ALL: [WeightFamily; 3] = [
        WeightFamily::Beta,
        WeightFamily::BetaNonZero,
        WeightFamily::ExpAlmon,
    ];

    /// Configuration name (`beta`, `beta_nz`, `expalmon`).
    pub fn name(self) -> &'static str {
        match self {
            WeightFamily::Beta => "beta",
            WeightFamily::BetaNonZero => "beta_nz",
            WeightFamily::ExpAlmon => "expalmon",
        }
    }

    /// Number of shape parameters estimated for this family.
    pub fn num_params(self) -> usize {
        match self {
            WeightFamily::Beta => 2,
            WeightFamily::BetaNonZero => 3,
            WeightFamily::ExpAlmon => 2,
        }
    }

    /// Standard starting point for estimation.
    pub fn init_params(self) -> WeightParams {
        match self {
            WeightFamily::Beta => WeightParams::new(vec![1.0, 5.0]),
            WeightFamily::BetaNonZero => WeightParams::new(vec![1.0, 5.0, 0.0]),
            WeightFamily::ExpAlmon => WeightParams::new(vec![-1.0, 0.0]),
        }
    }
}

impl fmt::Display for WeightFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for WeightFamily {
    type Err = MidasError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "beta" => Ok(WeightFamily::Beta),
            "beta_nz" => Ok(WeightFamily::BetaNonZero),
            "expalmon" => Ok(WeightFamily::ExpAlmon),
            _ => Err(MidasError::UnknownWeightFamily(s.to_string())),
        }
    }
}

/// Weight-shape parameters `θ`. Immutable; passed explicitly on every evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeightParams(Vec<f64>);

impl WeightParams {
    pub fn new(values: impl Into<Vec<f64>>) -> Self {
        Self(values.into())
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&[f64]> for WeightParams {
    fn from(values: &[f64]) -> Self {
        Self(values.to_vec())
    }
}

impl From<Vec<f64>> for WeightParams {
    fn from(values: Vec<f64>) -> Self {
        Self(values)
    }
}

/// One aligned block of mixed-frequency data (estimation or forecast).
#[derive(Debug, Clone, PartialEq)]
pub struct MixedBlock {
    /// Low-frequency dates, one per row.
    pub dates: Vec<NaiveDate>,
    /// Low-frequency target.
    pub y: DVector<f64>,
    /// Autoregressive lags, `ylag` columns; `None` when `ylag == 0`.
    pub yl: Option<DMatrix<f64>>,
    /// High-frequency lags, `xlag` columns, most recent first.
    pub x: DMatrix<f64>,
}

impl MixedBlock {
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn row_of(&self, date: NaiveDate) -> Option<usize> {
        self.dates.binary_search(&date).ok()
    }

    pub fn x_row(&self, date: NaiveDate) -> Option<Vec<f64>> {
        let i = self.row_of(date)?;
        Some(self.x.row(i).iter().copied().collect())
    }

    pub fn yl_row(&self, date: NaiveDate) -> Option<Vec<f64>> {
        let i = self.row_of(date)?;
        self.yl.as_ref().map(|yl| yl.row(i).iter().copied().collect())
    }

    pub fn y_at(&self, date: NaiveDate) -> Option<f64> {
        self.row_of(date).map(|i| self.y[i])
    }
}

/// Output of the data mixer.
#[derive(Debug, Clone, PartialEq)]
pub struct MixedDataset {
    pub xlag: usize,
    pub ylag: usize,
    pub horizon: i64,
    /// Rows dated `start_date ..= end_date` (`y`, `yl`, `x`).
    pub estimation: MixedBlock,
    /// Rows dated after `end_date` (`yf`, `ylf`, `xf`).
    pub forecast: MixedBlock,
}

/// Why the least-squares solver stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// Gradient norm fell below `gtol`.
    Gtol,
    /// Relative cost reduction fell below `ftol`.
    Ftol,
    /// Relative step size fell below `xtol`.
    Xtol,
    /// Evaluation cap reached.
    MaxEvaluations,
    /// No further progress possible: tolerances below machine precision or a
    /// non-finite step.
    Stalled,
}

impl Termination {
    pub fn is_converged(self) -> bool {
        matches!(self, Termination::Gtol | Termination::Ftol | Termination::Xtol)
    }
}

/// Solver diagnostics attached to a fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitDiagnostics {
    pub converged: bool,
    pub termination: Termination,
    /// `0.5 * ||r||²` at the solution.
    pub cost: f64,
    pub residual_norm: f64,
    pub iterations: usize,
    pub evaluations: usize,
}

/// Fitted MIDAS parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitResult {
    pub family: WeightFamily,
    /// Intercept.
    pub a: f64,
    /// Slope on the weighted high-frequency term.
    pub b: f64,
    pub theta: WeightParams,
    /// AR coefficients, one per `yl` column.
    pub ar: Vec<f64>,
    pub diagnostics: FitDiagnostics,
}

impl FitResult {
    /// Flat parameter vector `[a, b, θ…, φ…]`.
    pub fn params(&self) -> DVector<f64> {
        let mut out = Vec::with_capacity(2 + self.theta.len() + self.ar.len());
        out.push(self.a);
        out.push(self.b);
        out.extend_from_slice(self.theta.as_slice());
        out.extend_from_slice(&self.ar);
        DVector::from_vec(out)
    }

    pub fn ar_order(&self) -> usize {
        self.ar.len()
    }
}

/// A single out-of-sample prediction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub prediction: f64,
    pub target: f64,
}

impl ForecastPoint {
    pub fn error(&self) -> f64 {
        self.prediction - self.target
    }
}

/// How the estimation window moves through time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BacktestMethod {
    /// One fit over `[start, end]`, scored on the whole forecast block.
    Fixed,
    /// Fixed-width window sliding one low-frequency period at a time.
    Rolling,
    /// Window start pinned, end expanding one period at a time.
    Recursive,
}

impl fmt::Display for BacktestMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BacktestMethod::Fixed => "fixed",
            BacktestMethod::Rolling => "rolling",
            BacktestMethod::Recursive => "recursive",
        })
    }
}

impl FromStr for BacktestMethod {
    type Err = MidasError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fixed" => Ok(BacktestMethod::Fixed),
            "rolling" => Ok(BacktestMethod::Rolling),
            "recursive" => Ok(BacktestMethod::Recursive),
            _ => Err(MidasError::UnknownBacktestMethod(s.to_string())),
        }
    }
}

/// Backtest output: RMSE plus the time-ordered prediction/target pairs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestReport {
    pub method: BacktestMethod,
    /// `None` when no forecast points were collected.
    pub rmse: Option<f64>,
    pub points: Vec<ForecastPoint>,
}

impl BacktestReport {
    pub fn predictions(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.prediction).collect()
    }

    pub fn targets(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.target).collect()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|p| p.date).collect()
    }
}

/// Configuration of a single-fit run (`midas fit`, and the data/model part
/// of `midas backtest`).
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub lf_path: PathBuf,
    pub hf_path: PathBuf,
    /// Convert both series to percent log growth before mixing.
    pub growth: bool,
    pub xlag: LagSpec,
    pub ylag: usize,
    pub horizon: i64,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub family: WeightFamily,
    pub options: EstimateOptions,
    pub export_fit: Option<PathBuf>,
}
