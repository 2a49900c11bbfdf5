//! Formatted terminal output for fits, forecasts and backtests.
//!
//! Formatting lives here so the estimation code stays free of presentation
//! concerns and output changes are localized.

use crate::domain::{BacktestReport, FitResult, ForecastPoint, MixedDataset};

/// Fit summary: settings, sample, parameters and solver diagnostics.
pub fn format_fit_summary(fit: &FitResult, data: &MixedDataset) -> String {
    let mut out = String::new();
    let est = &data.estimation;

    out.push_str("=== midas - MIDAS regression ===\n");
    out.push_str(&format!(
        "Weights: {} | xlag={} ylag={} horizon={}\n",
        fit.family, data.xlag, data.ylag, data.horizon
    ));
    if let (Some(first), Some(last)) = (est.dates.first(), est.dates.last()) {
        out.push_str(&format!("Estimation: {first} .. {last} (n={})\n", est.len()));
    }
    out.push_str(&format!("Forecast rows: {}\n", data.forecast.len()));

    out.push_str("\nParameters:\n");
    out.push_str(&format!("- a    : {:.6}\n", fit.a));
    out.push_str(&format!("- b    : {:.6}\n", fit.b));
    out.push_str(&format!("- theta: {}\n", fmt_vec(fit.theta.as_slice())));
    if !fit.ar.is_empty() {
        out.push_str(&format!("- ar   : {}\n", fmt_vec(&fit.ar)));
    }

    let d = &fit.diagnostics;
    out.push_str(&format!(
        "\nSolver: {} ({:?}) | cost={:.6e} | |r|={:.6} | iterations={} evaluations={}\n",
        if d.converged { "converged" } else { "NOT converged" },
        d.termination,
        d.cost,
        d.residual_norm,
        d.iterations,
        d.evaluations
    ));
    out
}

/// Backtest summary line plus the prediction table.
pub fn format_backtest_summary(report: &BacktestReport) -> String {
    let mut out = String::new();
    out.push_str(&format!("=== midas - {} backtest ===\n", report.method));
    match report.rmse {
        Some(v) => out.push_str(&format!("Forecasts: {} | RMSE={v:.6}\n", report.points.len())),
        None => out.push_str("Forecasts: 0 | RMSE=n/a\n"),
    }
    out.push('\n');
    out.push_str(&format_forecast_table(&report.points));
    out
}

/// `date prediction target error` table.
pub fn format_forecast_table(points: &[ForecastPoint]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<10} {:>12} {:>12} {:>12}",
        "date", "prediction", "target", "error"
    ));
    out.push('\n');
    out.push_str(&format!("{:-<10} {:-<12} {:-<12} {:-<12}", "", "", "", ""));
    out.push('\n');

    for p in points {
        out.push_str(&format!(
            "{:<10} {:>12.4} {:>12.4} {:>12.4}",
            p.date.format("%Y-%m-%d"),
            p.prediction,
            p.target,
            p.error()
        ));
        out.push('\n');
    }
    out
}

fn fmt_vec(v: &[f64]) -> String {
    let parts: Vec<String> = v.iter().map(|x| format!("{x:.6}")).collect();
    format!("[{}]", parts.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        BacktestMethod, FitDiagnostics, MixedBlock, Termination, WeightFamily, WeightParams,
    };
    use chrono::NaiveDate;
    use nalgebra::{DMatrix, DVector};

    fn date(y: i32, m: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, 1).unwrap()
    }

    #[test]
    fn forecast_table_has_header_and_rows() {
        let points = vec![ForecastPoint {
            date: date(2010, 4),
            prediction: 1.25,
            target: 1.0,
        }];
        let table = format_forecast_table(&points);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("date"));
        assert!(lines[2].starts_with("2010-04-01"));
        assert!(lines[2].ends_with("0.2500"));
    }

    #[test]
    fn backtest_summary_reports_missing_rmse() {
        let report = BacktestReport {
            method: BacktestMethod::Recursive,
            rmse: None,
            points: vec![],
        };
        let text = format_backtest_summary(&report);
        assert!(text.contains("recursive backtest"));
        assert!(text.contains("RMSE=n/a"));
    }

    #[test]
    fn fit_summary_lists_parameters() {
        let block = MixedBlock {
            dates: vec![date(2009, 7), date(2009, 10)],
            y: DVector::zeros(2),
            yl: None,
            x: DMatrix::zeros(2, 3),
        };
        let data = MixedDataset {
            xlag: 3,
            ylag: 0,
            horizon: 1,
            estimation: block.clone(),
            forecast: MixedBlock {
                dates: vec![],
                y: DVector::zeros(0),
                yl: None,
                x: DMatrix::zeros(0, 3),
            },
        };
        let fit = FitResult {
            family: WeightFamily::ExpAlmon,
            a: 0.1,
            b: 2.0,
            theta: WeightParams::new(vec![-1.0, 0.0]),
            ar: vec![],
            diagnostics: FitDiagnostics {
                converged: false,
                termination: Termination::MaxEvaluations,
                cost: 0.5,
                residual_norm: 1.0,
                iterations: 10,
                evaluations: 5000,
            },
        };
        let text = format_fit_summary(&fit, &data);
        assert!(text.contains("Weights: expalmon"));
        assert!(text.contains("Estimation: 2009-07-01 .. 2009-10-01 (n=2)"));
        assert!(text.contains("- theta: [-1.000000, 0.000000]"));
        assert!(!text.contains("- ar"));
        assert!(text.contains("NOT converged"));
    }
}
