//! Nonlinear least squares behind a small trait seam.
//!
//! Minimizes `F(p) = 0.5 * ||r(p)||²` for a problem that exposes residuals and
//! their Jacobian. The estimator talks to two traits so any implementation can
//! drive it:
//!
//! - [`LeastSquaresProblem`]: residuals and Jacobian at a parameter vector
//! - [`LeastSquaresSolver`]: turns a problem plus a starting point into a
//!   [`SolverReport`]
//!
//! The bundled [`LevenbergMarquardt`] adapts the `levenberg-marquardt` crate
//! (MINPACK's trust-region LM with diagonal scaling).

use std::cell::{Cell, RefCell};

use levenberg_marquardt::TerminationReason;
use nalgebra::{DMatrix, DVector, Dyn, VecStorage, U1};
use tracing::debug;

use crate::domain::Termination;
use crate::error::{MidasError, MidasResult};

/// Residual/Jacobian provider.
pub trait LeastSquaresProblem {
    /// Residual vector at `params`. Non-finite entries mark an unusable point.
    fn residuals(&self, params: &DVector<f64>) -> MidasResult<DVector<f64>>;

    /// Jacobian of [`residuals`](Self::residuals), one row per residual.
    fn jacobian(&self, params: &DVector<f64>) -> MidasResult<DMatrix<f64>>;
}

/// A nonlinear least-squares minimizer.
pub trait LeastSquaresSolver {
    fn minimize(
        &self,
        problem: &dyn LeastSquaresProblem,
        x0: DVector<f64>,
        options: &SolverOptions,
    ) -> MidasResult<SolverReport>;
}

/// Stopping rules.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverOptions {
    /// Relative step tolerance.
    pub xtol: f64,
    /// Relative cost-reduction tolerance.
    pub ftol: f64,
    /// Orthogonality (scaled gradient) tolerance.
    pub gtol: f64,
    /// Cap on residual evaluations.
    pub max_evaluations: usize,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            xtol: 1e-9,
            ftol: 1e-9,
            gtol: 1e-8,
            max_evaluations: 5000,
        }
    }
}

/// Outcome of a minimization. Returned whether or not the solver converged.
#[derive(Debug, Clone)]
pub struct SolverReport {
    pub params: DVector<f64>,
    pub residuals: DVector<f64>,
    /// `0.5 * ||r||²` at `params`.
    pub cost: f64,
    pub evaluations: usize,
    /// Jacobian evaluations, one per outer iteration.
    pub iterations: usize,
    pub termination: Termination,
}

/// Levenberg–Marquardt from the `levenberg-marquardt` crate.
///
/// The crate caps evaluations at `patience · (n + 1)`; `max_evaluations` is
/// rounded down to that grid, with at least one full round.
#[derive(Debug, Clone, Copy)]
pub struct LevenbergMarquardt {
    /// Initial trust-region bound, as a factor of the scaled start norm.
    pub stepbound: f64,
    /// Rescale parameters by the Jacobian column norms.
    pub scale_diag: bool,
}

impl Default for LevenbergMarquardt {
    fn default() -> Self {
        Self {
            stepbound: 100.0,
            scale_diag: true,
        }
    }
}

impl LeastSquaresSolver for LevenbergMarquardt {
    fn minimize(
        &self,
        problem: &dyn LeastSquaresProblem,
        x0: DVector<f64>,
        options: &SolverOptions,
    ) -> MidasResult<SolverReport> {
        let r0 = problem.residuals(&x0)?;
        if !all_finite(&r0) {
            return Err(MidasError::NonFinite("residuals at the starting point"));
        }

        let n = x0.len();
        let patience = (options.max_evaluations / (n + 1)).max(1);
        let solver = levenberg_marquardt::LevenbergMarquardt::new()
            .with_xtol(options.xtol)
            .with_ftol(options.ftol)
            .with_gtol(options.gtol)
            .with_stepbound(self.stepbound)
            .with_scale_diag(self.scale_diag)
            .with_patience(patience);

        let (adapter, report) = solver.minimize(Adapter::new(problem, x0));
        if let Some(err) = adapter.error.into_inner() {
            return Err(err);
        }
        let termination = termination(&report.termination)?;

        let params = adapter.params;
        let residuals = problem.residuals(&params)?;
        let cost = 0.5 * residuals.norm_squared();
        let iterations = adapter.jacobians.get();
        debug!(
            ?termination,
            reason = ?report.termination,
            cost,
            evaluations = report.number_of_evaluations,
            iterations,
            "least squares finished"
        );
        Ok(SolverReport {
            params,
            residuals,
            cost,
            evaluations: report.number_of_evaluations,
            iterations,
            termination,
        })
    }
}

/// Map the crate's stop reason onto [`Termination`].
fn termination(reason: &TerminationReason) -> MidasResult<Termination> {
    Ok(match reason {
        TerminationReason::Orthogonal | TerminationReason::ResidualsZero => Termination::Gtol,
        TerminationReason::Converged { ftol: true, .. } => Termination::Ftol,
        TerminationReason::Converged { .. } => Termination::Xtol,
        TerminationReason::LostPatience => Termination::MaxEvaluations,
        TerminationReason::NoImprovementPossible(_)
        | TerminationReason::Numerical(_)
        | TerminationReason::User(_) => Termination::Stalled,
        TerminationReason::NoParameters
        | TerminationReason::NoResiduals
        | TerminationReason::WrongDimensions(_) => {
            return Err(MidasError::Solver(format!("{reason:?}")));
        }
    })
}

/// Presents a [`LeastSquaresProblem`] through the crate's stateful trait.
///
/// The crate only sees `None` on failure; the underlying error is kept and
/// returned once minimization stops.
struct Adapter<'a> {
    problem: &'a dyn LeastSquaresProblem,
    params: DVector<f64>,
    error: RefCell<Option<MidasError>>,
    jacobians: Cell<usize>,
}

impl<'a> Adapter<'a> {
    fn new(problem: &'a dyn LeastSquaresProblem, params: DVector<f64>) -> Self {
        Self {
            problem,
            params,
            error: RefCell::new(None),
            jacobians: Cell::new(0),
        }
    }

    fn keep<T>(&self, result: MidasResult<T>) -> Option<T> {
        match result {
            Ok(v) => Some(v),
            Err(err) => {
                self.error.borrow_mut().get_or_insert(err);
                None
            }
        }
    }
}

impl levenberg_marquardt::LeastSquaresProblem<f64, Dyn, Dyn> for Adapter<'_> {
    type ResidualStorage = VecStorage<f64, Dyn, U1>;
    type JacobianStorage = VecStorage<f64, Dyn, Dyn>;
    type ParameterStorage = VecStorage<f64, Dyn, U1>;

    fn set_params(&mut self, x: &DVector<f64>) {
        self.params.copy_from(x);
    }

    fn params(&self) -> DVector<f64> {
        self.params.clone()
    }

    fn residuals(&self) -> Option<DVector<f64>> {
        self.keep(self.problem.residuals(&self.params))
    }

    fn jacobian(&self) -> Option<DMatrix<f64>> {
        self.jacobians.set(self.jacobians.get() + 1);
        self.keep(self.problem.jacobian(&self.params))
    }
}

fn all_finite(v: &DVector<f64>) -> bool {
    v.iter().all(|x| x.is_finite())
}
