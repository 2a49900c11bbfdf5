//! End-to-end runs through the public API: simulate -> mix -> estimate ->
//! forecast, and the backtest policies on top.

use approx::assert_abs_diff_eq;
use chrono::NaiveDate;

use midas_rs::backtest::{run_backtest, BacktestConfig};
use midas_rs::data::{simulate, SimulatedData, SimulationConfig};
use midas_rs::domain::{BacktestMethod, WeightFamily};
use midas_rs::fit::{estimate, forecast_block};
use midas_rs::io::{read_series_csv, write_series_csv};
use midas_rs::mix::{mix, LagSpec};

fn noise_free(quarters: usize) -> (SimulationConfig, SimulatedData) {
    let cfg = SimulationConfig {
        noise_sigma: 0.0,
        quarters,
        ..SimulationConfig::default()
    };
    let data = simulate(&cfg).unwrap();
    (cfg, data)
}

#[test]
fn noise_free_fit_recovers_process_and_forecasts_exactly() {
    let (cfg, sim) = noise_free(80);
    let end = sim.lf.date(60).unwrap();
    let data = mix(&sim.lf, &sim.hf, LagSpec::Periods(cfg.xlag), 1, cfg.horizon, None, Some(end)).unwrap();
    assert_eq!(data.estimation.len(), 60);
    assert_eq!(data.forecast.len(), 19);

    let est = &data.estimation;
    let fit = estimate(&est.y, est.yl.as_ref(), &est.x, WeightFamily::Beta).unwrap();
    assert!(fit.diagnostics.converged, "{:?}", fit.diagnostics);
    assert_abs_diff_eq!(fit.a, cfg.a, epsilon = 1e-4);
    assert_abs_diff_eq!(fit.b, cfg.b, epsilon = 1e-4);
    assert_abs_diff_eq!(fit.ar[0], cfg.phi, epsilon = 1e-4);
    assert_abs_diff_eq!(fit.theta.as_slice()[0], cfg.theta.as_slice()[0], epsilon = 1e-2);
    assert_abs_diff_eq!(fit.theta.as_slice()[1], cfg.theta.as_slice()[1], epsilon = 1e-2);

    let points = forecast_block(&data.forecast, &fit).unwrap();
    assert_eq!(points.len(), 19);
    assert_eq!(points[0].date, sim.lf.date(61).unwrap());
    for p in &points {
        assert_abs_diff_eq!(p.prediction, p.target, epsilon = 1e-4);
    }
}

#[test]
fn nowcast_with_negative_horizon() {
    let cfg = SimulationConfig {
        noise_sigma: 0.0,
        quarters: 50,
        horizon: -1,
        ..SimulationConfig::default()
    };
    let sim = simulate(&cfg).unwrap();
    let data = mix(&sim.lf, &sim.hf, LagSpec::Periods(cfg.xlag), 1, -1, None, sim.lf.date(40)).unwrap();
    let est = &data.estimation;
    let fit = estimate(&est.y, est.yl.as_ref(), &est.x, WeightFamily::Beta).unwrap();
    let points = forecast_block(&data.forecast, &fit).unwrap();
    assert!(!points.is_empty());
    for p in &points {
        assert_abs_diff_eq!(p.prediction, p.target, epsilon = 1e-4);
    }
}

#[test]
fn forecasting_without_autoregressive_lags() {
    let cfg = SimulationConfig {
        noise_sigma: 0.0,
        phi: 0.0,
        quarters: 40,
        ..SimulationConfig::default()
    };
    let sim = simulate(&cfg).unwrap();
    let data = mix(&sim.lf, &sim.hf, LagSpec::Periods(cfg.xlag), 0, 1, None, sim.lf.date(30)).unwrap();
    assert!(data.estimation.yl.is_none());
    assert_eq!(data.estimation.dates[0], sim.lf.first_date());

    let est = &data.estimation;
    let fit = estimate(&est.y, None, &est.x, WeightFamily::Beta).unwrap();
    assert!(fit.ar.is_empty());
    let points = forecast_block(&data.forecast, &fit).unwrap();
    assert_eq!(points.len(), 9);
    for p in &points {
        assert_abs_diff_eq!(p.prediction, p.target, epsilon = 1e-4);
    }
}

#[test]
fn rolling_rmse_tracks_noise_level() {
    let cfg = SimulationConfig::default();
    let sim = simulate(&cfg).unwrap();

    let config = BacktestConfig {
        end_date: sim.lf.date(61),
        ..BacktestConfig::new(sim.lf.date(1).unwrap(), LagSpec::Periods(cfg.xlag), 1, cfg.horizon)
    };
    let report = run_backtest(&sim.lf, &sim.hf, &config).unwrap();
    assert_eq!(report.method, BacktestMethod::Rolling);
    // Windows end at lf[61] ..= lf[118]; each scores the next quarter.
    assert_eq!(report.points.len(), 58);
    assert_eq!(report.points[0].date, sim.lf.date(62).unwrap());
    assert_eq!(report.points.last().map(|p| p.date), sim.lf.date(119));

    let rmse = report.rmse.unwrap();
    assert!(rmse > 0.15 && rmse < 0.6, "rmse = {rmse}");
}

#[test]
fn csv_files_feed_a_recursive_backtest() {
    let (_, sim) = noise_free(36);
    let dir = std::env::temp_dir().join(format!("midas-pipeline-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let lf_path = dir.join("lf.csv");
    let hf_path = dir.join("hf.csv");
    write_series_csv(&lf_path, &sim.lf).unwrap();
    write_series_csv(&hf_path, &sim.hf).unwrap();
    let lf = read_series_csv(&lf_path, "lf").unwrap();
    let hf = read_series_csv(&hf_path, "hf").unwrap();
    let _ = std::fs::remove_dir_all(&dir);
    assert_eq!(lf.values(), sim.lf.values());

    // Frequencies are inferred from the dates: 3 quarters of monthly data = 9 lags.
    let config = BacktestConfig {
        end_date: lf.date(28),
        method: BacktestMethod::Recursive,
        ..BacktestConfig::new(lf.date(1).unwrap(), "3Q".parse().unwrap(), 1, 1)
    };
    let report = run_backtest(&lf, &hf, &config).unwrap();
    assert_eq!(report.points.len(), 7);
    assert_eq!(report.points[0].date, lf.date(29).unwrap());
    assert!(report.rmse.unwrap() < 1e-4);
}

#[test]
fn backtest_start_must_be_an_observation_date() {
    let (cfg, sim) = noise_free(30);
    let off_index = NaiveDate::from_ymd_opt(1985, 2, 15).unwrap();
    let config = BacktestConfig::new(off_index, LagSpec::Periods(cfg.xlag), 1, 1);
    assert!(run_backtest(&sim.lf, &sim.hf, &config).is_err());
}
