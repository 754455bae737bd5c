//! Min-max scaling
//!
//! The scaler is fitted once and then frozen: transforming values outside
//! the fitted range maps them outside `[0, 1]` instead of refitting.

use crate::{MathError, Result};
use serde::{Deserialize, Serialize};

/// Linear map of a fitted `[min, max]` range onto `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MinMaxScaler {
    min: f64,
    max: f64,
}

impl MinMaxScaler {
    /// Fit the scaler on a set of values
    pub fn fit(values: &[f64]) -> Result<Self> {
        if values.is_empty() {
            return Err(MathError::InsufficientData(
                "Cannot fit a scaler on an empty sample".to_string(),
            ));
        }

        if values.iter().any(|v| !v.is_finite()) {
            return Err(MathError::InvalidInput(
                "Cannot fit a scaler on non-finite values".to_string(),
            ));
        }

        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        Ok(Self { min, max })
    }

    /// Lower bound of the fitted range
    pub fn min(&self) -> f64 {
        self.min
    }

    /// Upper bound of the fitted range
    pub fn max(&self) -> f64 {
        self.max
    }

    // A constant sample scales by 1 so it maps to 0
    fn range(&self) -> f64 {
        let range = self.max - self.min;
        if range > 0.0 {
            range
        } else {
            1.0
        }
    }

    /// Scale a single value
    pub fn transform(&self, value: f64) -> f64 {
        (value - self.min) / self.range()
    }

    /// Map a scaled value back to the original units
    pub fn inverse_transform(&self, scaled: f64) -> f64 {
        scaled * self.range() + self.min
    }

    /// Scale a slice of values
    pub fn transform_all(&self, values: &[f64]) -> Vec<f64> {
        values.iter().map(|&v| self.transform(v)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_fit_and_transform() {
        let scaler = MinMaxScaler::fit(&[10.0, 20.0, 15.0]).unwrap();

        assert_relative_eq!(scaler.transform(10.0), 0.0);
        assert_relative_eq!(scaler.transform(20.0), 1.0);
        assert_relative_eq!(scaler.transform(15.0), 0.5);
        assert_relative_eq!(scaler.inverse_transform(0.25), 12.5);
    }

    #[test]
    fn test_out_of_range_values_are_not_clipped() {
        let scaler = MinMaxScaler::fit(&[0.0, 10.0]).unwrap();

        assert_relative_eq!(scaler.transform(15.0), 1.5);
        assert_relative_eq!(scaler.transform(-5.0), -0.5);
        assert_eq!(scaler.max(), 10.0);
    }

    #[test]
    fn test_constant_sample() {
        let scaler = MinMaxScaler::fit(&[4.0, 4.0]).unwrap();
        assert_relative_eq!(scaler.transform(4.0), 0.0);
        assert_relative_eq!(scaler.inverse_transform(0.0), 4.0);
    }

    #[test]
    fn test_invalid_samples() {
        assert!(MinMaxScaler::fit(&[]).is_err());
        assert!(MinMaxScaler::fit(&[1.0, f64::NAN]).is_err());
    }
}
