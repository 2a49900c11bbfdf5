//! CSV exports.
//!
//! Backtests get one row per forecast date, easy to load in a spreadsheet or
//! plotting script:
//!
//! ```text
//! date,prediction,target,error
//! ```
//!
//! Series are written in the same `DATE,VALUE` layout `ingest` reads.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::domain::{BacktestReport, TimeSeries};
use crate::error::MidasResult;

#[derive(Serialize)]
struct Row {
    date: String,
    prediction: f64,
    target: f64,
    error: f64,
}

/// Write a backtest report to `path`.
pub fn write_backtest_csv(path: &Path, report: &BacktestReport) -> MidasResult<()> {
    let file = File::create(path)?;
    write_backtest(file, report)?;
    tracing::info!(path = %path.display(), rows = report.points.len(), "wrote backtest CSV");
    Ok(())
}

/// Write a backtest report to any writer.
pub fn write_backtest<W: Write>(writer: W, report: &BacktestReport) -> MidasResult<()> {
    let mut out = csv::Writer::from_writer(writer);
    for p in &report.points {
        out.serialize(Row {
            date: p.date.format("%Y-%m-%d").to_string(),
            prediction: p.prediction,
            target: p.target,
            error: p.error(),
        })?;
    }
    // Keep the header even when there are no rows.
    if report.points.is_empty() {
        out.write_record(["date", "prediction", "target", "error"])?;
    }
    out.flush()?;
    Ok(())
}

/// Write a series as `DATE,VALUE` rows.
pub fn write_series_csv(path: &Path, series: &TimeSeries) -> MidasResult<()> {
    let file = File::create(path)?;
    write_series(file, series)?;
    tracing::info!(path = %path.display(), rows = series.len(), "wrote series CSV");
    Ok(())
}

pub fn write_series<W: Write>(writer: W, series: &TimeSeries) -> MidasResult<()> {
    let mut out = csv::Writer::from_writer(writer);
    out.write_record(["DATE", "VALUE"])?;
    for (date, value) in series.dates().iter().zip(series.values()) {
        out.write_record([date.format("%Y-%m-%d").to_string(), value.to_string()])?;
    }
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BacktestMethod, ForecastPoint};
    use chrono::NaiveDate;

    #[test]
    fn writes_header_and_rows() {
        let report = BacktestReport {
            method: BacktestMethod::Rolling,
            rmse: Some(0.5),
            points: vec![ForecastPoint {
                date: NaiveDate::from_ymd_opt(2010, 4, 1).unwrap(),
                prediction: 1.5,
                target: 1.0,
            }],
        };
        let mut buf = Vec::new();
        write_backtest(&mut buf, &report).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("date,prediction,target,error"));
        assert_eq!(lines.next(), Some("2010-04-01,1.5,1.0,0.5"));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn empty_report_still_has_header() {
        let report = BacktestReport {
            method: BacktestMethod::Fixed,
            rmse: None,
            points: vec![],
        };
        let mut buf = Vec::new();
        write_backtest(&mut buf, &report).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "date,prediction,target,error\n");
    }

    #[test]
    fn writes_to_disk() {
        let path = std::env::temp_dir().join(format!("midas-export-{}.csv", std::process::id()));
        let report = BacktestReport {
            method: BacktestMethod::Fixed,
            rmse: None,
            points: vec![],
        };
        write_backtest_csv(&path, &report).unwrap();
        assert!(path.exists());
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn series_round_trips_through_ingest() {
        let series = TimeSeries::new(
            "hf",
            vec![
                NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2020, 2, 1).unwrap(),
            ],
            vec![0.25, -1.5],
        )
        .unwrap();
        let mut buf = Vec::new();
        write_series(&mut buf, &series).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with("DATE,VALUE\n2020-01-01,0.25\n"));

        let back = crate::io::ingest::read_series(text.as_bytes(), "hf").unwrap();
        assert_eq!(back, series);
    }
}
