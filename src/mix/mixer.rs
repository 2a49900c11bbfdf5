//! Frequency alignment: build the lagged design for every low-frequency date.
//!
//! For a low-frequency date `d`, let `start_hf` be the first high-frequency
//! position with date `>= d` and `top = start_hf - horizon`. The row is
//!
//! ```text
//! hf[top], hf[top - 1], ..., hf[top - xlag + 1]
//! ```
//!
//! (most recent first). A positive horizon moves the window earlier, a negative
//! one later. Windows that would start before the high-frequency history are
//! an error; a window running past the last high-frequency observation is an
//! error inside the estimation range and ends the forecast block otherwise.

use chrono::NaiveDate;
use nalgebra::{DMatrix, DVector};
use tracing::{debug, warn};

use crate::domain::{MixedBlock, MixedDataset, TimeSeries};
use crate::error::{MidasError, MidasResult};
use crate::mix::data_freq;
use crate::mix::lags::LagSpec;

/// Resolve a lag spec against the two series.
///
/// Plain counts are used as given. Calendar spans need both frequencies; the
/// low-frequency series must not be sampled more often than the high-frequency
/// one.
pub fn resolve_xlag(spec: LagSpec, lf: &TimeSeries, hf: &TimeSeries) -> MidasResult<usize> {
    match spec {
        LagSpec::Periods(0) => Err(MidasError::InvalidLagSpec {
            spec: spec.to_string(),
            reason: "at least one high-frequency lag is required".to_string(),
        }),
        LagSpec::Periods(n) => Ok(n),
        LagSpec::Span { .. } => {
            let hf_freq = data_freq(hf)?.freq;
            let lf_freq = data_freq(lf)?.freq;
            if lf_freq.is_finer_than(hf_freq) {
                return Err(MidasError::InvalidFrequency(format!(
                    "low-frequency series '{}' ({}) is sampled more often than high-frequency series '{}' ({})",
                    lf.name(),
                    lf_freq.code(),
                    hf.name(),
                    hf_freq.code()
                )));
            }
            let xlag = spec.resolve(hf_freq)?;
            debug!(%spec, xlag, hf = hf_freq.code(), "resolved high-frequency lags");
            Ok(xlag)
        }
    }
}

/// Align `lf` and `hf` into estimation and forecast blocks.
///
/// `start` and `end` are inclusive bounds over the low-frequency dates and
/// default to `lf[ylag]` and `lf[xlag + horizon]`.
pub fn mix(
    lf: &TimeSeries,
    hf: &TimeSeries,
    xlag: LagSpec,
    ylag: usize,
    horizon: i64,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> MidasResult<MixedDataset> {
    let xlag = resolve_xlag(xlag, lf, hf)?;

    if ylag >= lf.len() {
        return Err(MidasError::InsufficientHistory(format!(
            "{ylag} autoregressive lag(s) requested but '{}' has only {} observation(s)",
            lf.name(),
            lf.len()
        )));
    }

    let (start_idx, end_idx) = resolve_range(lf, xlag, ylag, horizon, start, end)?;
    if start_idx < ylag {
        return Err(MidasError::InsufficientHistory(format!(
            "{} has {start_idx} earlier observation(s), {ylag} autoregressive lag(s) needed",
            lf.dates()[start_idx]
        )));
    }

    let mut rows: Vec<(usize, Vec<f64>)> = Vec::with_capacity(lf.len() - start_idx);
    for i in start_idx..lf.len() {
        let date = lf.dates()[i];
        let Some(start_hf) = hf.position_at_or_after(date) else {
            if i <= end_idx {
                return Err(MidasError::DateNotReachable { date });
            }
            warn!(
                %date,
                last_hf = %hf.last_date(),
                "forecast block truncated: no high-frequency observation at or after this date"
            );
            break;
        };
        let top = start_hf as i64 - horizon;
        let first = top - xlag as i64 + 1;

        if first < 0 {
            return Err(MidasError::WindowOutOfRange {
                date,
                first,
                last: top,
                len: hf.len(),
            });
        }
        if top >= hf.len() as i64 {
            if i <= end_idx {
                return Err(MidasError::WindowOutOfRange {
                    date,
                    first,
                    last: top,
                    len: hf.len(),
                });
            }
            warn!(
                %date,
                last_hf = %hf.last_date(),
                "forecast block truncated: high-frequency window runs past available data"
            );
            break;
        }

        let top = top as usize;
        let window: Vec<f64> = (0..xlag).map(|k| hf.values()[top - k]).collect();
        rows.push((i, window));
    }

    let split = rows.partition_point(|(i, _)| *i <= end_idx);
    let (est_rows, fc_rows) = rows.split_at(split);
    if est_rows.is_empty() {
        return Err(MidasError::EmptyBlock("estimation"));
    }

    let estimation = build_block(lf, est_rows, xlag, ylag);
    let forecast = build_block(lf, fc_rows, xlag, ylag);

    debug!(
        xlag,
        ylag,
        horizon,
        start = %lf.dates()[start_idx],
        end = %lf.dates()[end_idx],
        estimation_rows = estimation.len(),
        forecast_rows = forecast.len(),
        "mixed series"
    );

    Ok(MixedDataset {
        xlag,
        ylag,
        horizon,
        estimation,
        forecast,
    })
}

/// Inclusive positions `[start, end]` of the estimation range in `lf`.
fn resolve_range(
    lf: &TimeSeries,
    xlag: usize,
    ylag: usize,
    horizon: i64,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> MidasResult<(usize, usize)> {
    let start_idx = match start {
        Some(date) => lf.position_at_or_after(date).ok_or_else(|| {
            MidasError::DateOutOfRange(format!(
                "start date {date} is after the last observation of '{}' ({})",
                lf.name(),
                lf.last_date()
            ))
        })?,
        None => ylag,
    };

    let end_idx = match end {
        Some(date) if date > lf.last_date() => {
            return Err(MidasError::DateOutOfRange(format!(
                "end date {date} is after the last observation of '{}' ({})",
                lf.name(),
                lf.last_date()
            )));
        }
        Some(date) => lf.position_at_or_before(date).ok_or_else(|| {
            MidasError::DateOutOfRange(format!(
                "end date {date} is before the first observation of '{}' ({})",
                lf.name(),
                lf.first_date()
            ))
        })?,
        None => {
            let idx = xlag as i64 + horizon;
            if idx < 0 || idx >= lf.len() as i64 {
                return Err(MidasError::DateOutOfRange(format!(
                    "default end position {idx} (xlag + horizon) is outside '{}' ({} observations)",
                    lf.name(),
                    lf.len()
                )));
            }
            idx as usize
        }
    };

    if start_idx > end_idx {
        return Err(MidasError::DateOutOfRange(format!(
            "estimation starts at {} but ends at {}",
            lf.dates()[start_idx],
            lf.dates()[end_idx]
        )));
    }
    Ok((start_idx, end_idx))
}

fn build_block(lf: &TimeSeries, rows: &[(usize, Vec<f64>)], xlag: usize, ylag: usize) -> MixedBlock {
    let n = rows.len();
    let values = lf.values();
    let dates = rows.iter().map(|(i, _)| lf.dates()[*i]).collect();
    let y = DVector::from_fn(n, |r, _| values[rows[r].0]);
    let x = DMatrix::from_fn(n, xlag, |r, c| rows[r].1[c]);
    // Column l holds the observation l + 1 periods back.
    let yl = (ylag > 0).then(|| DMatrix::from_fn(n, ylag, |r, l| values[rows[r].0 - l - 1]));
    MixedBlock { dates, y, yl, x }
}
