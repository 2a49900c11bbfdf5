//! Out-of-sample prediction from a fitted model.

use nalgebra::{DMatrix, DVector};

use crate::domain::{FitResult, ForecastPoint, MixedBlock};
use crate::error::{MidasError, MidasResult};

/// `ŷ = a + b · (x_new · w(θ)) + yl_new · φ`, one prediction per row.
///
/// `yl_new` must be present with one column per AR coefficient exactly when
/// the fit has an AR block.
pub fn forecast(
    x_new: &DMatrix<f64>,
    yl_new: Option<&DMatrix<f64>>,
    fit: &FitResult,
) -> MidasResult<DVector<f64>> {
    let xw = fit.family.x_weighted(x_new, &fit.theta)?.values;
    let mut pred = xw * fit.b;
    pred.add_scalar_mut(fit.a);

    let yl_new = yl_new.filter(|m| m.ncols() > 0);
    match (yl_new, fit.ar_order()) {
        (None, 0) => {}
        (Some(yl), order) if yl.ncols() == order => {
            if yl.nrows() != x_new.nrows() {
                return Err(MidasError::DimensionMismatch {
                    context: "forecast rows of yl",
                    expected: x_new.nrows(),
                    found: yl.nrows(),
                });
            }
            pred += yl * DVector::from_column_slice(&fit.ar);
        }
        (yl, order) => {
            return Err(MidasError::DimensionMismatch {
                context: "forecast autoregressive lags",
                expected: order,
                found: yl.map_or(0, |m| m.ncols()),
            });
        }
    }
    Ok(pred)
}

/// Predict every row of a block and pair it with its date and target.
pub fn forecast_block(block: &MixedBlock, fit: &FitResult) -> MidasResult<Vec<ForecastPoint>> {
    let pred = forecast(&block.x, block.yl.as_ref(), fit)?;
    Ok(block
        .dates
        .iter()
        .zip(pred.iter().zip(block.y.iter()))
        .map(|(&date, (&prediction, &target))| ForecastPoint {
            date,
            prediction,
            target,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FitDiagnostics, Termination, WeightFamily, WeightParams};
    use chrono::NaiveDate;

    fn fit(ar: Vec<f64>) -> FitResult {
        FitResult {
            family: WeightFamily::Beta,
            a: 0.5,
            b: 2.0,
            theta: WeightParams::new(vec![1.0, 5.0]),
            ar,
            diagnostics: FitDiagnostics {
                converged: true,
                termination: Termination::Gtol,
                cost: 0.0,
                residual_norm: 0.0,
                iterations: 3,
                evaluations: 4,
            },
        }
    }

    #[test]
    fn uniform_rows_predict_linear_combination() {
        let x = DMatrix::from_row_slice(2, 3, &[1.0, 1.0, 1.0, 2.0, 2.0, 2.0]);
        let yl = DMatrix::from_row_slice(2, 1, &[1.0, -1.0]);
        let pred = forecast(&x, Some(&yl), &fit(vec![0.25])).unwrap();
        assert!((pred[0] - (0.5 + 2.0 + 0.25)).abs() < 1e-12);
        assert!((pred[1] - (0.5 + 4.0 - 0.25)).abs() < 1e-12);
    }

    #[test]
    fn absent_ar_block_is_supported() {
        let x = DMatrix::from_element(1, 3, 1.0);
        let pred = forecast(&x, None, &fit(vec![])).unwrap();
        assert!((pred[0] - 2.5).abs() < 1e-12);
    }

    #[test]
    fn ar_order_mismatch_is_rejected() {
        let x = DMatrix::from_element(1, 3, 1.0);
        assert!(matches!(
            forecast(&x, None, &fit(vec![0.25])),
            Err(MidasError::DimensionMismatch { expected: 1, found: 0, .. })
        ));
        let yl = DMatrix::from_element(1, 2, 1.0);
        assert!(forecast(&x, Some(&yl), &fit(vec![0.25])).is_err());
    }

    #[test]
    fn block_forecast_pairs_dates_and_targets() {
        let date = NaiveDate::from_ymd_opt(2010, 4, 1).unwrap();
        let block = MixedBlock {
            dates: vec![date],
            y: DVector::from_element(1, 3.0),
            yl: None,
            x: DMatrix::from_element(1, 3, 1.0),
        };
        let points = forecast_block(&block, &fit(vec![])).unwrap();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].date, date);
        assert!((points[0].prediction - 2.5).abs() < 1e-12);
        assert!((points[0].error() + 0.5).abs() < 1e-12);
    }

    #[test]
    fn empty_block_forecasts_nothing() {
        let block = MixedBlock {
            dates: vec![],
            y: DVector::zeros(0),
            yl: None,
            x: DMatrix::zeros(0, 3),
        };
        assert!(forecast_block(&block, &fit(vec![])).unwrap().is_empty());
    }
}
