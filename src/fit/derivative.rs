//! Partial derivatives of the weighted regressor with respect to `θ`.
//!
//! The estimator needs `∂(x · w(θ)) / ∂θ_k` for every shape parameter. The
//! strategy is a trait so another scheme (analytic, automatic differentiation)
//! can replace central differences without touching the estimator.

use nalgebra::DMatrix;

use crate::domain::{WeightFamily, WeightParams};
use crate::error::MidasResult;

/// Absolute finite-difference step. Each parameter is perturbed by
/// `±FD_STEP / 2`. Fixed for reproducibility; there is no adaptive sizing.
pub const FD_STEP: f64 = 1e-6;

/// Differencing strategy for the weight-shape columns of the Jacobian.
pub trait WeightDerivative {
    /// One column per entry of `theta`, one row per row of `x`.
    fn x_weighted_jacobian(
        &self,
        family: WeightFamily,
        x: &DMatrix<f64>,
        theta: &WeightParams,
    ) -> MidasResult<DMatrix<f64>>;
}

/// Central differences with the fixed step [`FD_STEP`].
#[derive(Debug, Clone, Copy, Default)]
pub struct CentralDifference;

impl WeightDerivative for CentralDifference {
    fn x_weighted_jacobian(
        &self,
        family: WeightFamily,
        x: &DMatrix<f64>,
        theta: &WeightParams,
    ) -> MidasResult<DMatrix<f64>> {
        let half = FD_STEP / 2.0;
        let mut out = DMatrix::zeros(x.nrows(), theta.len());

        for k in 0..theta.len() {
            let mut up = theta.as_slice().to_vec();
            let mut down = up.clone();
            up[k] += half;
            down[k] -= half;

            let xw_up = family.x_weighted(x, &WeightParams::new(up))?.values;
            let xw_down = family.x_weighted(x, &WeightParams::new(down))?.values;
            out.set_column(k, &((xw_up - xw_down) / FD_STEP));
        }
        Ok(out)
    }
}
