//! Shared run logic for the `midas` subcommands.
//!
//! load CSVs -> (log growth) -> mix -> estimate -> forecast
//!
//! The CLI handlers only print and export what these functions return.

use std::path::Path;

use chrono::NaiveDate;
use tracing::info;

use crate::domain::{ForecastPoint, FitResult, MixedDataset, RunConfig, TimeSeries};
use crate::error::{MidasError, MidasResult};
use crate::fit::{estimate_with, forecast_block, CentralDifference};
use crate::io::{read_series_csv, FitFile};
use crate::math::LevenbergMarquardt;
use crate::mix::{mix, LagSpec};

/// All computed outputs of a single `midas fit` run.
#[derive(Debug, Clone)]
pub struct FitOutput {
    pub data: MixedDataset,
    pub fit: FitResult,
    pub forecasts: Vec<ForecastPoint>,
}

/// Read the low- and high-frequency series, optionally as log growth.
pub fn load_series(lf_path: &Path, hf_path: &Path, growth: bool) -> MidasResult<(TimeSeries, TimeSeries)> {
    let lf = read_series_csv(lf_path, "lf")?;
    let hf = read_series_csv(hf_path, "hf")?;
    if growth {
        Ok((lf.log_growth()?, hf.log_growth()?))
    } else {
        Ok((lf, hf))
    }
}

/// Load the configured files and run the fit pipeline.
pub fn run_fit(config: &RunConfig) -> MidasResult<FitOutput> {
    let (lf, hf) = load_series(&config.lf_path, &config.hf_path, config.growth)?;
    run_fit_with_series(config, &lf, &hf)
}

/// Fit pipeline on series that are already in memory.
pub fn run_fit_with_series(config: &RunConfig, lf: &TimeSeries, hf: &TimeSeries) -> MidasResult<FitOutput> {
    config.options.validate()?;
    let data = mix(
        lf,
        hf,
        config.xlag,
        config.ylag,
        config.horizon,
        config.start_date,
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
    let forecasts = forecast_block(&data.forecast, &fit)?;

    Ok(FitOutput {
        data,
        fit,
        forecasts,
    })
}

/// Package a fit with the settings needed to apply it again.
pub fn fit_file(output: &FitOutput) -> MidasResult<FitFile> {
    let dates = &output.data.estimation.dates;
    let (Some(&estimation_start), Some(&estimation_end)) = (dates.first(), dates.last()) else {
        return Err(MidasError::EmptyBlock("estimation"));
    };
    Ok(FitFile {
        tool: "midas".to_string(),
        xlag: output.data.xlag,
        ylag: output.data.ylag,
        horizon: output.data.horizon,
        estimation_start,
        estimation_end,
        fit: output.fit.clone(),
    })
}

/// Forecast every low-frequency date after `end` (default: the saved
/// estimation end) with a previously fitted model.
pub fn run_predict(
    file: &FitFile,
    lf: &TimeSeries,
    hf: &TimeSeries,
    end: Option<NaiveDate>,
) -> MidasResult<Vec<ForecastPoint>> {
    if file.fit.ar_order() != file.ylag {
        return Err(MidasError::DimensionMismatch {
            context: "AR coefficients in fit file",
            expected: file.ylag,
            found: file.fit.ar_order(),
        });
    }
    let end = end.unwrap_or(file.estimation_end);
    // Only the rows after the cut are predicted; start the mix at the cut so
    // no earlier high-frequency history is required.
    let cut = lf
        .position_at_or_before(end)
        .and_then(|i| lf.date(i))
        .ok_or_else(|| {
            MidasError::DateOutOfRange(format!(
                "forecast cut {end} is before the first observation of '{}' ({})",
                lf.name(),
                lf.first_date()
            ))
        })?;
    let data = mix(
        lf,
        hf,
        LagSpec::Periods(file.xlag),
        file.ylag,
        file.horizon,
        Some(cut),
        Some(end),
    )?;
    let points = forecast_block(&data.forecast, &file.fit)?;
    info!(end = %end, points = points.len(), "applied saved fit");
    Ok(points)
}
