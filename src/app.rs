//! Top-level application orchestration.
//!
//! `src/main.rs` parses the CLI and installs logging; this module is the
//! "real main" that:
//! - converts CLI flags into library configuration
//! - runs the fit / backtest / predict / simulate pipelines
//! - prints reports
//! - writes optional exports

use tracing::info;

use crate::backtest::{run_backtest, BacktestConfig};
use crate::cli::{BacktestArgs, Cli, Command, FitArgs, ModelArgs, PredictArgs, SimulateArgs};
use crate::data::{simulate, SimulationConfig};
use crate::domain::{RunConfig, TimeSeries};
use crate::error::{MidasError, MidasResult};
use crate::fit::EstimateOptions;
use crate::io::{read_fit_json, write_backtest_csv, write_fit_json, write_series_csv};
use crate::report::{format_backtest_summary, format_fit_summary, format_forecast_table};

pub mod pipeline;

/// Entry point for the `midas` binary.
pub fn run(cli: Cli) -> MidasResult<()> {
    match cli.command {
        Command::Fit(args) => handle_fit(args),
        Command::Backtest(args) => handle_backtest(args),
        Command::Predict(args) => handle_predict(args),
        Command::Simulate(args) => handle_simulate(args),
    }
}

fn handle_fit(args: FitArgs) -> MidasResult<()> {
    let config = run_config_from_args(&args);
    let run = pipeline::run_fit(&config)?;

    println!("{}", format_fit_summary(&run.fit, &run.data));
    if run.forecasts.is_empty() {
        println!("No rows after the estimation window to forecast.");
    } else {
        println!("Forecasts:\n{}", format_forecast_table(&run.forecasts));
    }

    if let Some(path) = &config.export_fit {
        write_fit_json(path, &pipeline::fit_file(&run)?)?;
        info!(path = %path.display(), "wrote fit JSON");
    }
    Ok(())
}

fn handle_backtest(args: BacktestArgs) -> MidasResult<()> {
    let (lf, hf) = pipeline::load_series(&args.data.lf, &args.data.hf, args.data.growth)?;
    let config = backtest_config_from_args(&args, &lf)?;
    let report = run_backtest(&lf, &hf, &config)?;

    println!("{}", format_backtest_summary(&report));
    if let Some(path) = &args.export {
        write_backtest_csv(path, &report)?;
    }
    Ok(())
}

fn handle_predict(args: PredictArgs) -> MidasResult<()> {
    let file = read_fit_json(&args.fit_file)?;
    let (lf, hf) = pipeline::load_series(&args.data.lf, &args.data.hf, args.data.growth)?;
    let points = pipeline::run_predict(&file, &lf, &hf, args.end)?;

    println!(
        "=== midas - {} fit from {} .. {} ===",
        file.fit.family, file.estimation_start, file.estimation_end
    );
    println!("{}", format_forecast_table(&points));
    Ok(())
}

fn handle_simulate(args: SimulateArgs) -> MidasResult<()> {
    let config = simulation_config_from_args(&args);
    let data = simulate(&config)?;

    std::fs::create_dir_all(&args.out_dir)?;
    let lf_path = args.out_dir.join("lf.csv");
    let hf_path = args.out_dir.join("hf.csv");
    write_series_csv(&lf_path, &data.lf)?;
    write_series_csv(&hf_path, &data.hf)?;

    println!(
        "Wrote {} quarterly observations to {} and {} monthly observations to {}",
        data.lf.len(),
        lf_path.display(),
        data.hf.len(),
        hf_path.display()
    );
    println!(
        "True process: {} theta={:?} xlag={} horizon={} a={} b={} phi={}",
        config.family,
        config.theta.as_slice(),
        config.xlag,
        config.horizon,
        config.a,
        config.b,
        config.phi
    );
    Ok(())
}

fn estimate_options(args: &ModelArgs) -> EstimateOptions {
    EstimateOptions {
        max_evaluations: args.max_evals,
        ..EstimateOptions::default()
    }
}

pub fn run_config_from_args(args: &FitArgs) -> RunConfig {
    RunConfig {
        lf_path: args.data.lf.clone(),
        hf_path: args.data.hf.clone(),
        growth: args.data.growth,
        xlag: args.model.xlag,
        ylag: args.model.ylag,
        horizon: args.model.horizon,
        start_date: args.model.start,
        end_date: args.model.end,
        family: args.model.poly,
        options: estimate_options(&args.model),
        export_fit: args.export_fit.clone(),
    }
}

/// Build the backtest configuration. Without `--start` the first window
/// starts at `lf[ylag]`, the mixer's default.
pub fn backtest_config_from_args(args: &BacktestArgs, lf: &TimeSeries) -> MidasResult<BacktestConfig> {
    let model = &args.model;
    let start_date = match model.start {
        Some(date) => date,
        None => lf.date(model.ylag).ok_or_else(|| {
            MidasError::DateOutOfRange(format!(
                "ylag {} leaves no default start in a series of {} observations",
                model.ylag,
                lf.len()
            ))
        })?,
    };
    let config = BacktestConfig {
        end_date: model.end,
        forecast_horizon: args.forecast_horizon,
        window_size: args.window,
        family: model.poly,
        method: args.method,
        options: estimate_options(model),
        ..BacktestConfig::new(start_date, model.xlag, model.ylag, model.horizon)
    };
    config.validate()?;
    Ok(config)
}

pub fn simulation_config_from_args(args: &SimulateArgs) -> SimulationConfig {
    SimulationConfig {
        seed: args.seed,
        quarters: args.quarters,
        noise_sigma: args.noise,
        ..SimulationConfig::for_family(args.poly)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BacktestMethod, WeightFamily};
    use crate::mix::LagSpec;
    use chrono::NaiveDate;
    use clap::Parser;

    fn date(y: i32, m: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, 1).unwrap()
    }

    fn lf() -> TimeSeries {
        TimeSeries::new(
            "lf",
            vec![date(2000, 1), date(2000, 4), date(2000, 7)],
            vec![1.0, 2.0, 3.0],
        )
        .unwrap()
    }

    fn backtest_args(extra: &[&str]) -> BacktestArgs {
        let mut argv = vec!["midas", "backtest", "--lf", "a.csv", "--hf", "b.csv"];
        argv.extend_from_slice(extra);
        match Cli::try_parse_from(argv).unwrap().command {
            Command::Backtest(args) => args,
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn fit_args_map_onto_run_config() {
        let cli = Cli::try_parse_from([
            "midas", "fit", "--lf", "a.csv", "--hf", "b.csv", "--xlag", "9", "--ylag", "0",
            "--poly", "beta_nz", "--max-evals", "100", "--growth",
        ])
        .unwrap();
        let Command::Fit(args) = cli.command else {
            panic!("expected fit");
        };
        let config = run_config_from_args(&args);
        assert_eq!(config.xlag, LagSpec::Periods(9));
        assert_eq!(config.ylag, 0);
        assert_eq!(config.family, WeightFamily::BetaNonZero);
        assert_eq!(config.options.max_evaluations, 100);
        assert_eq!(config.options.xtol, EstimateOptions::default().xtol);
        assert!(config.growth);
        assert!(config.export_fit.is_none());
    }

    #[test]
    fn backtest_start_defaults_to_lf_ylag() {
        let args = backtest_args(&["--method", "recursive", "--forecast-horizon", "2"]);
        let config = backtest_config_from_args(&args, &lf()).unwrap();
        assert_eq!(config.start_date, date(2000, 4));
        assert_eq!(config.method, BacktestMethod::Recursive);
        assert_eq!(config.forecast_horizon, 2);

        let args = backtest_args(&["--ylag", "3"]);
        assert!(matches!(
            backtest_config_from_args(&args, &lf()),
            Err(MidasError::DateOutOfRange(_))
        ));
    }

    #[test]
    fn backtest_config_is_validated() {
        let args = backtest_args(&["--forecast-horizon", "0"]);
        assert!(matches!(
            backtest_config_from_args(&args, &lf()),
            Err(MidasError::InvalidOption(_))
        ));
    }

    #[test]
    fn simulate_writes_both_series() {
        let dir = std::env::temp_dir().join(format!("midas-sim-{}", std::process::id()));
        let args = SimulateArgs {
            out_dir: dir.clone(),
            seed: 3,
            quarters: 16,
            noise: 0.1,
            poly: WeightFamily::ExpAlmon,
        };
        handle_simulate(args).unwrap();
        let lf = crate::io::read_series_csv(&dir.join("lf.csv"), "lf").unwrap();
        let hf = crate::io::read_series_csv(&dir.join("hf.csv"), "hf").unwrap();
        let _ = std::fs::remove_dir_all(&dir);
        assert_eq!(lf.len(), 16);
        assert!(hf.len() > 3 * 15);
    }
}
