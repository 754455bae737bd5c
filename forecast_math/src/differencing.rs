//! Differencing and its inverse
//!
//! `difference` removes trend by repeated first differences. `Integrator`
//! keeps the last value at every differencing level so forecasts made on a
//! differenced scale can be turned back into levels one step at a time.

use crate::{MathError, Result};

/// Apply `d` rounds of first differencing
pub fn difference(values: &[f64], d: usize) -> Result<Vec<f64>> {
    if values.len() <= d {
        return Err(MathError::InsufficientData(format!(
            "Differencing of order {} needs more than {} values, got {}",
            d,
            d,
            values.len()
        )));
    }

    let mut current = values.to_vec();
    for _ in 0..d {
        current = current.windows(2).map(|w| w[1] - w[0]).collect();
    }

    Ok(current)
}

/// Running state for undoing `d` rounds of differencing
#[derive(Debug, Clone, PartialEq)]
pub struct Integrator {
    /// last[k] is the most recent value of the k-th difference
    last: Vec<f64>,
}

impl Integrator {
    /// Seed the integrator from the history the differences were taken on
    pub fn new(values: &[f64], d: usize) -> Result<Self> {
        if values.len() <= d {
            return Err(MathError::InsufficientData(format!(
                "Integration of order {} needs more than {} values, got {}",
                d,
                d,
                values.len()
            )));
        }

        let mut last = Vec::with_capacity(d);
        let mut current = values.to_vec();
        for _ in 0..d {
            last.push(current[current.len() - 1]);
            current = current.windows(2).map(|w| w[1] - w[0]).collect();
        }

        Ok(Self { last })
    }

    /// Differencing order
    pub fn order(&self) -> usize {
        self.last.len()
    }

    /// Turn the next value on the differenced scale into a level
    pub fn integrate(&mut self, differenced: f64) -> f64 {
        let mut value = differenced;
        for k in (0..self.last.len()).rev() {
            value += self.last[k];
            self.last[k] = value;
        }
        value
    }

    /// Record an observed level and return its value on the differenced scale
    pub fn observe(&mut self, level: f64) -> f64 {
        let mut value = level;
        for k in 0..self.last.len() {
            let diff = value - self.last[k];
            self.last[k] = value;
            value = diff;
        }
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_difference_orders() {
        let values = [1.0, 4.0, 9.0, 16.0, 25.0];

        assert_eq!(difference(&values, 0).unwrap(), values.to_vec());
        assert_eq!(difference(&values, 1).unwrap(), vec![3.0, 5.0, 7.0, 9.0]);
        assert_eq!(difference(&values, 2).unwrap(), vec![2.0, 2.0, 2.0]);
        assert!(difference(&values, 5).is_err());
    }

    #[test]
    fn test_integrate_continues_quadratic() {
        let values = [1.0, 4.0, 9.0, 16.0, 25.0];
        let mut integrator = Integrator::new(&values, 2).unwrap();

        // Second difference of n^2 is constant 2
        assert_relative_eq!(integrator.integrate(2.0), 36.0);
        assert_relative_eq!(integrator.integrate(2.0), 49.0);
    }

    #[test]
    fn test_observe_matches_difference() {
        let values = [10.0, 12.0, 15.0];
        let mut integrator = Integrator::new(&values, 1).unwrap();

        assert_relative_eq!(integrator.observe(19.0), 4.0);
        assert_relative_eq!(integrator.integrate(1.0), 20.0);
    }

    #[test]
    fn test_zero_order_is_identity() {
        let mut integrator = Integrator::new(&[5.0], 0).unwrap();
        assert_eq!(integrator.order(), 0);
        assert_relative_eq!(integrator.integrate(7.5), 7.5);
        assert_relative_eq!(integrator.observe(3.0), 3.0);
    }
}
