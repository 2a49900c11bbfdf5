//! Residuals and Jacobian of the MIDAS regression
//!
//! ```text
//! r = y - a - b · (x · w(θ)) - yl · φ
//! ```
//!
//! over the flat parameter vector `[a, b, θ…, φ…]`.

use std::ops::Range;

use nalgebra::{DMatrix, DVector};

use crate::domain::{WeightFamily, WeightParams};
use crate::error::{MidasError, MidasResult};
use crate::fit::derivative::WeightDerivative;
use crate::math::LeastSquaresProblem;

/// Positions of each parameter group in the flat vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamLayout {
    pub n_theta: usize,
    pub n_ar: usize,
}

/// A parameter vector split into its groups.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelParams {
    pub a: f64,
    pub b: f64,
    pub theta: WeightParams,
    pub ar: Vec<f64>,
}

impl ParamLayout {
    pub fn new(family: WeightFamily, n_ar: usize) -> Self {
        Self {
            n_theta: family.num_params(),
            n_ar,
        }
    }

    pub fn len(&self) -> usize {
        2 + self.n_theta + self.n_ar
    }

    pub fn theta_range(&self) -> Range<usize> {
        2..2 + self.n_theta
    }

    pub fn ar_range(&self) -> Range<usize> {
        2 + self.n_theta..self.len()
    }

    pub fn unpack(&self, params: &DVector<f64>) -> MidasResult<ModelParams> {
        if params.len() != self.len() {
            return Err(MidasError::DimensionMismatch {
                context: "parameter vector",
                expected: self.len(),
                found: params.len(),
            });
        }
        let p = params.as_slice();
        Ok(ModelParams {
            a: p[0],
            b: p[1],
            theta: WeightParams::from(&p[self.theta_range()]),
            ar: p[self.ar_range()].to_vec(),
        })
    }

    pub fn pack(&self, params: &ModelParams) -> MidasResult<DVector<f64>> {
        if params.theta.len() != self.n_theta || params.ar.len() != self.n_ar {
            return Err(MidasError::DimensionMismatch {
                context: "parameter groups",
                expected: self.n_theta + self.n_ar,
                found: params.theta.len() + params.ar.len(),
            });
        }
        let mut out = Vec::with_capacity(self.len());
        out.push(params.a);
        out.push(params.b);
        out.extend_from_slice(params.theta.as_slice());
        out.extend_from_slice(&params.ar);
        Ok(DVector::from_vec(out))
    }
}

fn check_shapes(x: &DMatrix<f64>, y: &DVector<f64>, yl: Option<&DMatrix<f64>>) -> MidasResult<()> {
    if x.nrows() != y.len() {
        return Err(MidasError::DimensionMismatch {
            context: "rows of x",
            expected: y.len(),
            found: x.nrows(),
        });
    }
    if let Some(yl) = yl {
        if yl.nrows() != y.len() {
            return Err(MidasError::DimensionMismatch {
                context: "rows of yl",
                expected: y.len(),
                found: yl.nrows(),
            });
        }
    }
    Ok(())
}

fn ar_order(yl: Option<&DMatrix<f64>>) -> usize {
    yl.map_or(0, |m| m.ncols())
}

/// Regression residuals at `params`.
pub fn residual(
    params: &DVector<f64>,
    x: &DMatrix<f64>,
    y: &DVector<f64>,
    yl: Option<&DMatrix<f64>>,
    family: WeightFamily,
) -> MidasResult<DVector<f64>> {
    check_shapes(x, y, yl)?;
    let p = ParamLayout::new(family, ar_order(yl)).unpack(params)?;
    let xw = family.x_weighted(x, &p.theta)?.values;

    let mut r = y - xw * p.b;
    r.add_scalar_mut(-p.a);
    if let Some(yl) = yl {
        r -= yl * DVector::from_column_slice(&p.ar);
    }
    Ok(r)
}

/// Jacobian of [`residual`], columns in parameter order.
///
/// `a` → `-1`, `b` → `-x·w`, `θ_k` → `-b · ∂(x·w)/∂θ_k`, `φ_l` → `-yl[:, l]`.
pub fn jacobian(
    params: &DVector<f64>,
    x: &DMatrix<f64>,
    y: &DVector<f64>,
    yl: Option<&DMatrix<f64>>,
    family: WeightFamily,
    derivative: &dyn WeightDerivative,
) -> MidasResult<DMatrix<f64>> {
    check_shapes(x, y, yl)?;
    let layout = ParamLayout::new(family, ar_order(yl));
    let p = layout.unpack(params)?;
    let n = y.len();

    let xw = family.x_weighted(x, &p.theta)?.values;
    let dxw = derivative.x_weighted_jacobian(family, x, &p.theta)?;

    let mut jac = DMatrix::zeros(n, layout.len());
    jac.set_column(0, &DVector::from_element(n, -1.0));
    jac.set_column(1, &(-xw));
    for (k, col) in layout.theta_range().enumerate() {
        jac.set_column(col, &(dxw.column(k) * -p.b));
    }
    if let Some(yl) = yl {
        for (l, col) in layout.ar_range().enumerate() {
            jac.set_column(col, &(yl.column(l) * -1.0));
        }
    }
    Ok(jac)
}

/// Estimation data bundled for the least-squares solver.
pub struct MidasProblem<'a> {
    pub x: &'a DMatrix<f64>,
    pub y: &'a DVector<f64>,
    pub yl: Option<&'a DMatrix<f64>>,
    pub family: WeightFamily,
    pub derivative: &'a dyn WeightDerivative,
}

impl LeastSquaresProblem for MidasProblem<'_> {
    fn residuals(&self, params: &DVector<f64>) -> MidasResult<DVector<f64>> {
        residual(params, self.x, self.y, self.yl, self.family)
    }

    fn jacobian(&self, params: &DVector<f64>) -> MidasResult<DMatrix<f64>> {
        jacobian(params, self.x, self.y, self.yl, self.family, self.derivative)
    }
}
