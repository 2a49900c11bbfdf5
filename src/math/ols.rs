//! Ordinary least squares via SVD.
//!
//! Used to seed the linear MIDAS coefficients `(a, b, φ…)` before nonlinear
//! refinement:
//!
//! ```text
//! minimize Σ (y_i - z_iᵀ c)²,   z_i = [1, x_weighted_i, yl_i…]
//! ```
//!
//! SVD handles the tall design (more rows than columns) robustly; nalgebra's
//! `QR::solve` is meant for square systems.

use nalgebra::{DMatrix, DVector};

use crate::error::{MidasError, MidasResult};

/// Solve a least squares problem using SVD.
///
/// Returns `SingularDesign` if the system is too ill-conditioned to solve.
pub fn solve_least_squares(z: &DMatrix<f64>, y: &DVector<f64>) -> MidasResult<DVector<f64>> {
    if z.nrows() != y.len() {
        return Err(MidasError::DimensionMismatch {
            context: "least squares rows",
            expected: z.nrows(),
            found: y.len(),
        });
    }

    let svd = z.clone().svd(true, true);

    // Progressively looser singular-value cutoffs for near-collinear designs.
    for &tol in &[1e-12, 1e-10, 1e-8] {
        if let Ok(c) = svd.solve(y, tol) {
            if c.iter().all(|v| v.is_finite()) {
                return Ok(c);
            }
        }
    }

    Err(MidasError::SingularDesign)
}

/// Stack `[1, column, extra…]` into a design matrix.
pub fn design_with_intercept(column: &DVector<f64>, extra: Option<&DMatrix<f64>>) -> DMatrix<f64> {
    let n = column.len();
    let k = extra.map_or(0, |m| m.ncols());
    DMatrix::from_fn(n, 2 + k, |i, j| match j {
        0 => 1.0,
        1 => column[i],
        _ => extra.map_or(0.0, |m| m[(i, j - 2)]),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn least_squares_solves_simple_system() {
        // Fit y = 2 + 3x on x = [0,1,2]
        let z = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0]);

        let c = solve_least_squares(&z, &y).unwrap();
        assert!((c[0] - 2.0).abs() < 1e-10);
        assert!((c[1] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn design_stacks_intercept_column_and_lags() {
        let col = DVector::from_row_slice(&[0.5, 1.5]);
        let yl = DMatrix::from_row_slice(2, 1, &[7.0, 8.0]);
        let z = design_with_intercept(&col, Some(&yl));
        assert_eq!(z.shape(), (2, 3));
        assert_eq!(z.row(1).iter().copied().collect::<Vec<_>>(), vec![1.0, 1.5, 8.0]);

        let z0 = design_with_intercept(&col, None);
        assert_eq!(z0.shape(), (2, 2));
    }

    #[test]
    fn mismatched_rows_are_rejected() {
        let z = DMatrix::from_element(3, 2, 1.0);
        let y = DVector::from_element(2, 1.0);
        assert!(matches!(
            solve_least_squares(&z, &y),
            Err(MidasError::DimensionMismatch { .. })
        ));
    }
}
