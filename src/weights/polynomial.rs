//! Weight evaluation for Beta / Beta-nonzero / Exponential Almon.
//!
//! The estimator relies on two primitive operations:
//! - build the normalized weight vector for `n` lags and given `θ`
//! - collapse a matrix of high-frequency lags to one weighted value per row
//!
//! Both are pure: parameters are passed on every call and nothing is retained.

use nalgebra::{DMatrix, DVector};

use crate::domain::{WeightFamily, WeightParams};
use crate::error::{MidasError, MidasResult};

/// Weighted high-frequency regressor plus the weights that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedRegressor {
    /// `x · w`, one value per row of `x`.
    pub values: DVector<f64>,
    /// Weight vector applied to every row, most recent lag first.
    pub weights: DVector<f64>,
}

impl WeightFamily {
    /// Normalized weights over `n_lags` lags.
    ///
    /// Non-negative and summing to one for parameters away from the
    /// `0^negative` singularity; degenerate parameters yield non-finite values,
    /// which the solver treats as a rejected step.
    pub fn weights(self, n_lags: usize, params: &WeightParams) -> MidasResult<DVector<f64>> {
        if n_lags == 0 {
            return Err(MidasError::InvalidOption(
                "weights need at least one lag".to_string(),
            ));
        }
        let p = params.as_slice();
        match (self, p.len()) {
            (WeightFamily::Beta, 2) => Ok(beta_weights(n_lags, p[0], p[1])),
            (WeightFamily::BetaNonZero, 3) => Ok(beta_nonzero_weights(n_lags, p[0], p[1], p[2])),
            (WeightFamily::BetaNonZero, 2) => Ok(beta_nonzero_weights(n_lags, 1.0, p[0], p[1])),
            (WeightFamily::ExpAlmon, 2) => Ok(exp_almon_weights(n_lags, p[0], p[1])),
            (family, found) => Err(MidasError::WeightParamCount {
                family: family.name(),
                expected: match family {
                    WeightFamily::BetaNonZero => "2 or 3".to_string(),
                    other => other.num_params().to_string(),
                },
                found,
            }),
        }
    }

    /// Weight each row of `x` (one column per lag) into a single value.
    pub fn x_weighted(self, x: &DMatrix<f64>, params: &WeightParams) -> MidasResult<WeightedRegressor> {
        let weights = self.weights(x.ncols(), params)?;
        let values = x * &weights;
        Ok(WeightedRegressor { values, weights })
    }
}

/// Beta weights on evenly spaced points `u_i = (i + ε) / (n - 1 + 2ε)`.
///
/// `ε` (machine epsilon) keeps `u` strictly inside `(0, 1)`.
pub fn beta_weights(n: usize, theta1: f64, theta2: f64) -> DVector<f64> {
    let eps = f64::EPSILON;
    let denom = (n as f64 - 1.0) + 2.0 * eps;
    let raw = DVector::from_fn(n, |i, _| {
        let u = (i as f64 + eps) / denom;
        u.powf(theta1 - 1.0) * (1.0 - u).powf(theta2 - 1.0)
    });
    normalize(raw)
}

/// Beta weights plus a constant offset, renormalized.
pub fn beta_nonzero_weights(n: usize, theta1: f64, theta2: f64, theta3: f64) -> DVector<f64> {
    let shifted = beta_weights(n, theta1, theta2).add_scalar(theta3);
    normalize(shifted)
}

/// Exponential Almon weights `exp(θ1·i + θ2·i²)` for `i = 1..=n`.
pub fn exp_almon_weights(n: usize, theta1: f64, theta2: f64) -> DVector<f64> {
    let z = DVector::from_fn(n, |i, _| {
        let lag = (i + 1) as f64;
        theta1 * lag + theta2 * lag * lag
    });
    // Shift by the max exponent; the normalized result is unchanged.
    let shift = z.max();
    normalize(z.map(|v| (v - shift).exp()))
}

fn normalize(v: DVector<f64>) -> DVector<f64> {
    let total = v.sum();
    v / total
}
