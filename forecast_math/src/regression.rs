//! Ordinary least squares
//!
//! Contains the pieces needed to estimate autoregressive coefficients:
//! - Normal-equation least squares over a row-major design matrix
//! - Dense linear solve by Gaussian elimination with partial pivoting

use crate::{MathError, Result};

/// Relative pivot size below which a system is treated as singular
const SINGULAR_TOLERANCE: f64 = 1e-12;

/// Fit `target ≈ design · beta` and return `beta`
///
/// Each element of `design` is one observation row; every row must have the
/// same width. A design with zero columns yields an empty coefficient vector.
pub fn least_squares(design: &[Vec<f64>], target: &[f64]) -> Result<Vec<f64>> {
    if design.len() != target.len() {
        return Err(MathError::InvalidInput(format!(
            "Design has {} rows but target has {} values",
            design.len(),
            target.len()
        )));
    }

    let width = design.first().map(|row| row.len()).unwrap_or(0);
    if design.iter().any(|row| row.len() != width) {
        return Err(MathError::InvalidInput(
            "Design rows must all have the same width".to_string(),
        ));
    }

    if width == 0 {
        return Ok(Vec::new());
    }

    if design.len() < width {
        return Err(MathError::InsufficientData(format!(
            "Least squares with {} regressors needs at least {} rows, got {}",
            width,
            width,
            design.len()
        )));
    }

    // Build X'X and X'y
    let mut xtx = vec![vec![0.0; width]; width];
    let mut xty = vec![0.0; width];
    for (row, &y) in design.iter().zip(target.iter()) {
        for i in 0..width {
            xty[i] += row[i] * y;
            for j in i..width {
                xtx[i][j] += row[i] * row[j];
            }
        }
    }
    for i in 0..width {
        for j in 0..i {
            xtx[i][j] = xtx[j][i];
        }
    }

    solve_linear_system(xtx, xty)
}

/// Solve the square system `a · x = b`
pub fn solve_linear_system(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Result<Vec<f64>> {
    let n = b.len();
    if a.len() != n || a.iter().any(|row| row.len() != n) {
        return Err(MathError::InvalidInput(
            "Linear system must be square and match the right-hand side".to_string(),
        ));
    }

    let scale = a
        .iter()
        .enumerate()
        .map(|(i, row)| row[i].abs())
        .fold(0.0_f64, f64::max)
        .max(f64::MIN_POSITIVE);

    for col in 0..n {
        // Partial pivoting
        let pivot_row = (col..n)
            .max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))
            .unwrap_or(col);

        if a[pivot_row][col].abs() <= SINGULAR_TOLERANCE * scale {
            return Err(MathError::CalculationError(
                "Linear system is singular or nearly singular".to_string(),
            ));
        }

        a.swap(col, pivot_row);
        b.swap(col, pivot_row);

        for row in col + 1..n {
            let factor = a[row][col] / a[col][col];
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    // Back substitution
    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = (row + 1..n).map(|k| a[row][k] * x[k]).sum();
        x[row] = (b[row] - tail) / a[row][row];
    }

    if x.iter().any(|v| !v.is_finite()) {
        return Err(MathError::CalculationError(
            "Linear solve produced non-finite coefficients".to_string(),
        ));
    }

    Ok(x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_least_squares_exact_line() {
        // y = 3 + 2x
        let design: Vec<Vec<f64>> = (0..5).map(|x| vec![1.0, x as f64]).collect();
        let target: Vec<f64> = (0..5).map(|x| 3.0 + 2.0 * x as f64).collect();

        let beta = least_squares(&design, &target).unwrap();
        assert_relative_eq!(beta[0], 3.0, epsilon = 1e-9);
        assert_relative_eq!(beta[1], 2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_least_squares_noisy_slope() {
        let design = vec![vec![1.0], vec![2.0], vec![3.0]];
        let target = vec![2.1, 3.9, 6.0];

        // beta = sum(xy) / sum(x^2) = (2.1 + 7.8 + 18.0) / 14
        let beta = least_squares(&design, &target).unwrap();
        assert_relative_eq!(beta[0], 27.9 / 14.0, epsilon = 1e-12);
    }

    #[test]
    fn test_singular_design_is_rejected() {
        let design = vec![vec![1.0, 2.0], vec![2.0, 4.0], vec![3.0, 6.0]];
        let target = vec![1.0, 2.0, 3.0];

        assert!(matches!(
            least_squares(&design, &target),
            Err(MathError::CalculationError(_))
        ));
    }

    #[test]
    fn test_shape_errors() {
        assert!(least_squares(&[vec![1.0]], &[1.0, 2.0]).is_err());
        assert!(least_squares(&[vec![1.0], vec![1.0, 2.0]], &[1.0, 2.0]).is_err());
        assert!(least_squares(&[vec![1.0, 2.0]], &[1.0]).is_err());
        assert_eq!(least_squares(&[vec![], vec![]], &[1.0, 2.0]).unwrap(), Vec::<f64>::new());
    }

    #[test]
    fn test_solve_with_pivoting() {
        let a = vec![vec![0.0, 1.0], vec![1.0, 0.0]];
        let x = solve_linear_system(a, vec![2.0, 3.0]).unwrap();
        assert_relative_eq!(x[0], 3.0);
        assert_relative_eq!(x[1], 2.0);
    }
}
