//! Seeded synthetic MIDAS data.
//!
//! The high-frequency series is a monthly Gaussian AR(1). The quarterly target
//! follows the MIDAS equation on windows built with the same rule the mixer
//! uses:
//!
//! ```text
//! y_i = a + b · (w(θ) · hf[top_i ..= top_i - xlag + 1]) + φ · y_{i-1} + σ ε_i
//! ```
//!
//! With `noise_sigma = 0` every row from the second one on is fitted exactly by
//! the true parameters.

use chrono::{Months, NaiveDate};
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::{Frequency, FrequencyCode, TimeSeries, WeightFamily, WeightParams};
use crate::error::{MidasError, MidasResult};

/// Parameters of the simulated process.
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    pub seed: u64,
    /// Number of quarterly observations.
    pub quarters: usize,
    /// First quarterly date (first day of a month).
    pub start: NaiveDate,
    pub family: WeightFamily,
    pub theta: WeightParams,
    /// Monthly lags feeding each quarter.
    pub xlag: usize,
    pub horizon: i64,
    pub a: f64,
    pub b: f64,
    /// Coefficient on the previous quarter.
    pub phi: f64,
    pub hf_mean: f64,
    pub hf_persistence: f64,
    pub hf_sigma: f64,
    pub noise_sigma: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            quarters: 120,
            start: NaiveDate::from_ymd_opt(1985, 1, 1).unwrap_or_default(),
            family: WeightFamily::Beta,
            theta: WeightParams::new(vec![1.5, 5.0]),
            xlag: 9,
            horizon: 1,
            a: 0.5,
            b: 1.2,
            phi: 0.3,
            hf_mean: 0.2,
            hf_persistence: 0.5,
            hf_sigma: 0.4,
            noise_sigma: 0.3,
        }
    }
}

impl SimulationConfig {
    /// Defaults with a representative `θ` for `family`.
    pub fn for_family(family: WeightFamily) -> Self {
        let theta = match family {
            WeightFamily::Beta => vec![1.5, 5.0],
            WeightFamily::BetaNonZero => vec![1.5, 5.0, 0.02],
            WeightFamily::ExpAlmon => vec![0.1, -0.05],
        };
        Self {
            family,
            theta: WeightParams::new(theta),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct SimulatedData {
    /// Quarterly target.
    pub lf: TimeSeries,
    /// Monthly regressor.
    pub hf: TimeSeries,
}

pub fn simulate(config: &SimulationConfig) -> MidasResult<SimulatedData> {
    if config.quarters < 2 {
        return Err(MidasError::InvalidOption(
            "simulation needs at least two quarters".to_string(),
        ));
    }
    if config.xlag == 0 {
        return Err(MidasError::InvalidOption(
            "simulation needs at least one high-frequency lag".to_string(),
        ));
    }
    for (name, v) in [("hf_sigma", config.hf_sigma), ("noise_sigma", config.noise_sigma)] {
        if !v.is_finite() || v < 0.0 {
            return Err(MidasError::InvalidOption(format!(
                "{name} must be finite and non-negative (got {v})"
            )));
        }
    }
    let weights = config.family.weights(config.xlag, &config.theta)?;

    let mut rng = StdRng::seed_from_u64(config.seed);
    let normal = Normal::new(0.0, 1.0)
        .map_err(|e| MidasError::InvalidOption(format!("noise distribution: {e}")))?;

    // Months of high-frequency history before the first quarter, and after the
    // last one when the horizon is negative.
    let lead = config.xlag + config.horizon.unsigned_abs() as usize;
    let tail = if config.horizon < 0 {
        config.horizon.unsigned_abs() as usize
    } else {
        0
    };
    let months = lead + 3 * (config.quarters - 1) + 1 + tail;

    let hf_start = shift_months(config.start, -(lead as i64))?;
    let hf_dates = (0..months)
        .map(|m| shift_months(hf_start, m as i64))
        .collect::<MidasResult<Vec<_>>>()?;
    let mut hf_values = Vec::with_capacity(months);
    let mut level = config.hf_mean;
    for _ in 0..months {
        level = config.hf_mean
            + config.hf_persistence * (level - config.hf_mean)
            + config.hf_sigma * normal.sample(&mut rng);
        hf_values.push(level);
    }

    let lf_dates = (0..config.quarters)
        .map(|q| shift_months(config.start, 3 * q as i64))
        .collect::<MidasResult<Vec<_>>>()?;
    let mut lf_values = Vec::with_capacity(config.quarters);
    let mut previous = 0.0;
    for q in 0..config.quarters {
        // lf date q sits at hf position lead + 3q.
        let top = (lead + 3 * q) as i64 - config.horizon;
        let xw: f64 = (0..config.xlag)
            .map(|k| weights[k] * hf_values[(top - k as i64) as usize])
            .sum();
        let y = config.a
            + config.b * xw
            + config.phi * previous
            + config.noise_sigma * normal.sample(&mut rng);
        lf_values.push(y);
        previous = y;
    }

    let lf = TimeSeries::new("lf", lf_dates, lf_values)?
        .with_frequency(FrequencyCode::new(Frequency::Quarterly));
    let hf = TimeSeries::new("hf", hf_dates, hf_values)?
        .with_frequency(FrequencyCode::new(Frequency::Monthly));
    Ok(SimulatedData { lf, hf })
}

fn shift_months(date: NaiveDate, months: i64) -> MidasResult<NaiveDate> {
    let shifted = if months >= 0 {
        date.checked_add_months(Months::new(months as u32))
    } else {
        date.checked_sub_months(Months::new(months.unsigned_abs() as u32))
    };
    shifted.ok_or_else(|| {
        MidasError::InvalidOption(format!("date {date} shifted by {months} month(s) is out of range"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mix::{mix, LagSpec};

    #[test]
    fn same_seed_same_data() {
        let cfg = SimulationConfig::default();
        let a = simulate(&cfg).unwrap();
        let b = simulate(&cfg).unwrap();
        assert_eq!(a.lf, b.lf);
        assert_eq!(a.hf, b.hf);

        let other = simulate(&SimulationConfig {
            seed: 7,
            ..cfg
        })
        .unwrap();
        assert_ne!(a.hf.values(), other.hf.values());
    }

    #[test]
    fn family_presets_simulate() {
        for family in WeightFamily::ALL {
            let cfg = SimulationConfig {
                quarters: 12,
                ..SimulationConfig::for_family(family)
            };
            assert_eq!(cfg.theta.len(), family.num_params());
            let data = simulate(&cfg).unwrap();
            assert_eq!(data.lf.len(), 12);
        }
    }

    #[test]
    fn noise_free_target_matches_mixer_windows() {
        let cfg = SimulationConfig {
            noise_sigma: 0.0,
            quarters: 20,
            ..SimulationConfig::default()
        };
        let data = simulate(&cfg).unwrap();
        assert_eq!(data.lf.len(), 20);

        let mixed = mix(&data.lf, &data.hf, LagSpec::Periods(cfg.xlag), 1, cfg.horizon, None, Some(data.lf.last_date()))
            .unwrap();
        let w = cfg.family.weights(cfg.xlag, &cfg.theta).unwrap();
        let est = &mixed.estimation;
        let yl = est.yl.as_ref().unwrap();
        for i in 0..est.len() {
            let xw: f64 = (0..cfg.xlag).map(|k| est.x[(i, k)] * w[k]).sum();
            let expected = cfg.a + cfg.b * xw + cfg.phi * yl[(i, 0)];
            assert!((est.y[i] - expected).abs() < 1e-12);
        }
    }

    #[test]
    fn negative_horizon_extends_high_frequency_tail() {
        let cfg = SimulationConfig {
            horizon: -2,
            quarters: 8,
            ..SimulationConfig::default()
        };
        let data = simulate(&cfg).unwrap();
        let mixed = mix(&data.lf, &data.hf, LagSpec::Periods(cfg.xlag), 1, -2, None, Some(data.lf.last_date()));
        assert!(mixed.is_ok());
    }

    #[test]
    fn rejects_degenerate_configs() {
        let one_quarter = SimulationConfig {
            quarters: 1,
            ..SimulationConfig::default()
        };
        assert!(simulate(&one_quarter).is_err());

        let bad_theta = SimulationConfig {
            theta: WeightParams::new(vec![1.0]),
            ..SimulationConfig::default()
        };
        assert!(matches!(
            simulate(&bad_theta),
            Err(MidasError::WeightParamCount { .. })
        ));
    }
}
