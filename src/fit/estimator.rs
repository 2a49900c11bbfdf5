//! MIDAS estimation: OLS seed, then nonlinear least squares.
//!
//! 1. weight `x` with the family's starting `θ`
//! 2. regress `y` on `[1, x·w, yl]` to seed `(a, b, φ)`
//! 3. refine `[a, b, θ, φ]` jointly with the least-squares solver
//!
//! Hitting the evaluation cap is not an error: the result carries
//! `converged = false` and the caller decides what to do with it.

use nalgebra::{DMatrix, DVector};
use tracing::{debug, info, warn};

use crate::domain::{FitDiagnostics, FitResult, MixedDataset, WeightFamily};
use crate::error::{MidasError, MidasResult};
use crate::fit::derivative::{CentralDifference, WeightDerivative};
use crate::fit::residual::{MidasProblem, ModelParams, ParamLayout};
use crate::math::{
    design_with_intercept, solve_least_squares, LeastSquaresSolver, LevenbergMarquardt,
    SolverOptions,
};

/// Solver settings for a single estimation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EstimateOptions {
    pub xtol: f64,
    pub ftol: f64,
    pub gtol: f64,
    pub max_evaluations: usize,
}

impl Default for EstimateOptions {
    fn default() -> Self {
        let s = SolverOptions::default();
        Self {
            xtol: s.xtol,
            ftol: s.ftol,
            gtol: s.gtol,
            max_evaluations: s.max_evaluations,
        }
    }
}

impl EstimateOptions {
    pub fn validate(&self) -> MidasResult<()> {
        for (name, v) in [("xtol", self.xtol), ("ftol", self.ftol), ("gtol", self.gtol)] {
            if !v.is_finite() || v <= 0.0 {
                return Err(MidasError::InvalidOption(format!(
                    "{name} must be a positive finite number (got {v})"
                )));
            }
        }
        if self.max_evaluations == 0 {
            return Err(MidasError::InvalidOption(
                "max_evaluations must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn solver_options(&self) -> SolverOptions {
        SolverOptions {
            xtol: self.xtol,
            ftol: self.ftol,
            gtol: self.gtol,
            max_evaluations: self.max_evaluations,
        }
    }
}

/// Fit with default options, Levenberg–Marquardt and central differences.
pub fn estimate(
    y: &DVector<f64>,
    yl: Option<&DMatrix<f64>>,
    x: &DMatrix<f64>,
    family: WeightFamily,
) -> MidasResult<FitResult> {
    estimate_with(
        y,
        yl,
        x,
        family,
        &EstimateOptions::default(),
        &LevenbergMarquardt::default(),
        &CentralDifference,
    )
}

/// Fit the estimation block of a mixed dataset.
pub fn estimate_dataset(data: &MixedDataset, family: WeightFamily) -> MidasResult<FitResult> {
    let block = &data.estimation;
    estimate(&block.y, block.yl.as_ref(), &block.x, family)
}

/// Fit with an explicit solver and differencing strategy.
pub fn estimate_with(
    y: &DVector<f64>,
    yl: Option<&DMatrix<f64>>,
    x: &DMatrix<f64>,
    family: WeightFamily,
    options: &EstimateOptions,
    solver: &dyn LeastSquaresSolver,
    derivative: &dyn WeightDerivative,
) -> MidasResult<FitResult> {
    options.validate()?;

    let n = y.len();
    if x.nrows() != n {
        return Err(MidasError::DimensionMismatch {
            context: "rows of x",
            expected: n,
            found: x.nrows(),
        });
    }
    if x.ncols() == 0 {
        return Err(MidasError::EmptyBlock("high-frequency lag"));
    }
    // A zero-width AR block is the same as no AR block.
    let yl = yl.filter(|m| m.ncols() > 0);
    if let Some(m) = yl {
        if m.nrows() != n {
            return Err(MidasError::DimensionMismatch {
                context: "rows of yl",
                expected: n,
                found: m.nrows(),
            });
        }
    }

    let layout = ParamLayout::new(family, yl.map_or(0, |m| m.ncols()));
    if n <= layout.len() {
        return Err(MidasError::InsufficientHistory(format!(
            "{n} observation(s) for {} parameter(s)",
            layout.len()
        )));
    }

    let theta0 = family.init_params();
    let xw0 = family.x_weighted(x, &theta0)?.values;
    let seed = solve_least_squares(&design_with_intercept(&xw0, yl), y)?;
    let p0 = layout.pack(&ModelParams {
        a: seed[0],
        b: seed[1],
        theta: theta0,
        ar: seed.iter().skip(2).copied().collect(),
    })?;
    debug!(%family, seed = ?p0.as_slice(), "ols seed");

    let problem = MidasProblem {
        x,
        y,
        yl,
        family,
        derivative,
    };
    let report = solver.minimize(&problem, p0, &options.solver_options())?;
    let fitted = layout.unpack(&report.params)?;

    let diagnostics = FitDiagnostics {
        converged: report.termination.is_converged(),
        termination: report.termination,
        cost: report.cost,
        residual_norm: report.residuals.norm(),
        iterations: report.iterations,
        evaluations: report.evaluations,
    };

    if diagnostics.converged {
        info!(
            %family,
            rows = n,
            cost = diagnostics.cost,
            iterations = diagnostics.iterations,
            "midas fit converged"
        );
    } else {
        warn!(
            %family,
            termination = ?diagnostics.termination,
            evaluations = diagnostics.evaluations,
            "midas fit did not converge"
        );
    }

    Ok(FitResult {
        family,
        a: fitted.a,
        b: fitted.b,
        theta: fitted.theta,
        ar: fitted.ar,
        diagnostics,
    })
}
