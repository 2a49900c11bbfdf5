//! Out-of-sample evaluation loops.
//!
//! Every policy reduces to a list of estimation windows `(start, end)` over the
//! low-frequency index. Each window is mixed, estimated and forecast from
//! scratch, so windows are evaluated in parallel and reassembled in time order.
//! The list is cut at the first window whose forecast block is shorter than
//! `forecast_horizon`, before anything is fitted.

use rayon::prelude::*;
use tracing::{debug, info};

use crate::backtest::{rmse, BacktestConfig};
use crate::domain::{BacktestMethod, BacktestReport, ForecastPoint, MixedDataset, TimeSeries};
use crate::error::{MidasError, MidasResult};
use crate::fit::{estimate_with, forecast_block, CentralDifference};
use crate::math::LevenbergMarquardt;
use crate::mix::{mix, resolve_xlag, LagSpec};

/// Run the policy selected by `config.method`.
pub fn run_backtest(lf: &TimeSeries, hf: &TimeSeries, config: &BacktestConfig) -> MidasResult<BacktestReport> {
    match config.method {
        BacktestMethod::Fixed => fixed_window(lf, hf, config),
        BacktestMethod::Rolling => rolling(lf, hf, config),
        BacktestMethod::Recursive => recursive(lf, hf, config),
    }
}

/// One fit over `[start_date, end_date]`, scored on the whole forecast block.
pub fn fixed_window(lf: &TimeSeries, hf: &TimeSeries, config: &BacktestConfig) -> MidasResult<BacktestReport> {
    config.validate()?;
    let data = mix(
        lf,
        hf,
        config.xlag,
        config.ylag,
        config.horizon,
        Some(config.start_date),
        config.end_date,
    )?;
    let est = &data.estimation;
    let fit = estimate_with(
        &est.y,
        est.yl.as_ref(),
        &est.x,
        config.family,
        &config.options,
        &LevenbergMarquardt::default(),
        &CentralDifference,
    )?;
    let points = forecast_block(&data.forecast, &fit)?;
    Ok(report(BacktestMethod::Fixed, points))
}

/// Fixed-width window sliding one low-frequency period at a time.
///
/// The width is `end - start` when an end date is given, `window_size`
/// otherwise.
pub fn rolling(lf: &TimeSeries, hf: &TimeSeries, config: &BacktestConfig) -> MidasResult<BacktestReport> {
    config.validate()?;
    let xlag = resolve_xlag(config.xlag, lf, hf)?;
    let (start_loc, end_loc) = initial_window(lf, config)?;
    let width = end_loc - start_loc;

    let windows: Vec<(usize, usize)> = (start_loc..)
        .map(|s| (s, s + width))
        .take_while(|&(_, e)| e + config.forecast_horizon < lf.len())
        .collect();
    evaluate(lf, hf, config, xlag, BacktestMethod::Rolling, &windows)
}

/// Window start pinned at `start_date`, end expanding one period at a time.
pub fn recursive(lf: &TimeSeries, hf: &TimeSeries, config: &BacktestConfig) -> MidasResult<BacktestReport> {
    config.validate()?;
    let xlag = resolve_xlag(config.xlag, lf, hf)?;
    let (start_loc, end_loc) = initial_window(lf, config)?;

    let windows: Vec<(usize, usize)> = (end_loc..)
        .take_while(|&e| e + config.forecast_horizon < lf.len())
        .map(|e| (start_loc, e))
        .collect();
    evaluate(lf, hf, config, xlag, BacktestMethod::Recursive, &windows)
}

/// Exact positions of the first estimation window.
fn initial_window(lf: &TimeSeries, config: &BacktestConfig) -> MidasResult<(usize, usize)> {
    let locate = |date| {
        lf.position(date).ok_or_else(|| MidasError::DateNotInIndex {
            series: lf.name().to_string(),
            date,
        })
    };
    let start_loc = locate(config.start_date)?;
    let end_loc = match config.end_date {
        Some(date) => locate(date)?,
        None => start_loc + config.window_size,
    };
    if end_loc <= start_loc {
        return Err(MidasError::DateOutOfRange(format!(
            "backtest window must end after it starts ({} .. position {end_loc})",
            config.start_date
        )));
    }
    Ok((start_loc, end_loc))
}

fn evaluate(
    lf: &TimeSeries,
    hf: &TimeSeries,
    config: &BacktestConfig,
    xlag: usize,
    method: BacktestMethod,
    windows: &[(usize, usize)],
) -> MidasResult<BacktestReport> {
    // Mixing is cheap; do it in order and stop at the first window whose
    // forecast block cannot reach `forecast_horizon`. Later windows are
    // never fitted, and may not even be mixable once the high-frequency
    // series has run out.
    let mut datasets = Vec::with_capacity(windows.len());
    for &(start, end) in windows {
        let data = mix(
            lf,
            hf,
            LagSpec::Periods(xlag),
            config.ylag,
            config.horizon,
            lf.date(start),
            lf.date(end),
        )?;
        if data.forecast.len() < config.forecast_horizon {
            debug!(start = %lf.dates()[start], end = %lf.dates()[end], "forecast block exhausted");
            break;
        }
        datasets.push(data);
    }
    debug!(%method, windows = datasets.len(), xlag, "evaluating backtest windows");

    // Each window is independent; collect preserves window order.
    let points = datasets
        .par_iter()
        .map(|data| evaluate_window(data, config))
        .collect::<MidasResult<Vec<ForecastPoint>>>()?;
    Ok(report(method, points))
}

/// Fit one mixed window and score its `forecast_horizon`-th forecast row.
fn evaluate_window(data: &MixedDataset, config: &BacktestConfig) -> MidasResult<ForecastPoint> {
    let est = &data.estimation;
    let fit = estimate_with(
        &est.y,
        est.yl.as_ref(),
        &est.x,
        config.family,
        &config.options,
        &LevenbergMarquardt::default(),
        &CentralDifference,
    )?;
    let points = forecast_block(&data.forecast, &fit)?;
    let point = points
        .get(config.forecast_horizon - 1)
        .copied()
        .ok_or(MidasError::EmptyBlock("forecast"))?;
    debug!(date = %point.date, prediction = point.prediction, target = point.target, "window forecast");
    Ok(point)
}

fn report(method: BacktestMethod, points: Vec<ForecastPoint>) -> BacktestReport {
    let mut report = BacktestReport {
        method,
        rmse: None,
        points,
    };
    report.rmse = rmse(&report.predictions(), &report.targets());
    match report.rmse {
        Some(v) => info!(%method, points = report.points.len(), rmse = v, "backtest finished"),
        None => info!(%method, "backtest finished without forecasts"),
    }
    report
}
