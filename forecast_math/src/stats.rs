//! Summary statistics

use crate::{MathError, Result};

/// Mean of squared values
pub fn mean_square(values: &[f64]) -> Result<f64> {
    if values.is_empty() {
        return Err(MathError::InsufficientData(
            "Mean square of an empty sample is undefined".to_string(),
        ));
    }

    Ok(values.iter().map(|v| v * v).sum::<f64>() / values.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_square() {
        assert!((mean_square(&[3.0, 4.0]).unwrap() - 12.5).abs() < 1e-12);
        assert!((mean_square(&[-2.0]).unwrap() - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty_samples() {
        assert!(mean_square(&[]).is_err());
    }
}
