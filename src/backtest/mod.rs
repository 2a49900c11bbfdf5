//! Backtesting: fixed, rolling and recursive estimation windows.

pub mod driver;

pub use driver::{fixed_window, recursive, rolling, run_backtest};

use chrono::NaiveDate;

use crate::domain::{BacktestMethod, WeightFamily};
use crate::error::{MidasError, MidasResult};
use crate::fit::EstimateOptions;
use crate::mix::LagSpec;

/// Default rolling window width, in low-frequency periods.
pub const DEFAULT_WINDOW_SIZE: usize = 60;

/// Everything a backtest needs besides the two series.
#[derive(Debug, Clone)]
pub struct BacktestConfig {
    /// First estimation date (an exact low-frequency date for rolling and
    /// recursive runs).
    pub start_date: NaiveDate,
    /// Last date of the first estimation window.
    pub end_date: Option<NaiveDate>,
    pub xlag: LagSpec,
    pub ylag: usize,
    pub horizon: i64,
    /// Which forecast row (1-based) each window is scored on.
    pub forecast_horizon: usize,
    /// Window width when `end_date` is absent.
    pub window_size: usize,
    pub family: WeightFamily,
    pub method: BacktestMethod,
    pub options: EstimateOptions,
}

impl BacktestConfig {
    pub fn new(start_date: NaiveDate, xlag: LagSpec, ylag: usize, horizon: i64) -> Self {
        Self {
            start_date,
            end_date: None,
            xlag,
            ylag,
            horizon,
            forecast_horizon: 1,
            window_size: DEFAULT_WINDOW_SIZE,
            family: WeightFamily::Beta,
            method: BacktestMethod::Rolling,
            options: EstimateOptions::default(),
        }
    }

    pub fn validate(&self) -> MidasResult<()> {
        if self.forecast_horizon == 0 {
            return Err(MidasError::InvalidOption(
                "forecast horizon must be at least 1".to_string(),
            ));
        }
        if self.window_size == 0 {
            return Err(MidasError::InvalidOption(
                "window size must be at least 1".to_string(),
            ));
        }
        if let Some(end) = self.end_date {
            if end < self.start_date {
                return Err(MidasError::DateOutOfRange(format!(
                    "end date {end} precedes start date {}",
                    self.start_date
                )));
            }
        }
        self.options.validate()
    }
}

/// Root mean squared error; `None` when there is nothing to score.
pub fn rmse(predictions: &[f64], targets: &[f64]) -> Option<f64> {
    let n = predictions.len().min(targets.len());
    if n == 0 {
        return None;
    }
    let sse: f64 = predictions
        .iter()
        .zip(targets)
        .map(|(p, t)| (p - t) * (p - t))
        .sum();
    Some((sse / n as f64).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rmse_of_known_errors() {
        let v = rmse(&[1.0, 2.0, 3.0], &[1.0, 0.0, 5.0]).unwrap();
        assert!((v - (8.0_f64 / 3.0).sqrt()).abs() < 1e-12);
        assert_eq!(rmse(&[], &[]), None);
    }

    #[test]
    fn config_defaults_and_validation() {
        let start = NaiveDate::from_ymd_opt(1985, 1, 1).unwrap();
        let cfg = BacktestConfig::new(start, LagSpec::Periods(3), 1, 1);
        assert_eq!(cfg.window_size, 60);
        assert_eq!(cfg.forecast_horizon, 1);
        assert!(cfg.validate().is_ok());

        let zero_horizon = BacktestConfig {
            forecast_horizon: 0,
            ..cfg.clone()
        };
        assert!(matches!(zero_horizon.validate(), Err(MidasError::InvalidOption(_))));

        let reversed = BacktestConfig {
            end_date: NaiveDate::from_ymd_opt(1984, 1, 1),
            ..cfg
        };
        assert!(matches!(reversed.validate(), Err(MidasError::DateOutOfRange(_))));
    }
}
