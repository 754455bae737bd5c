//! ARIMA models for time series forecasting
//!
//! Coefficients are estimated with the Hannan–Rissanen two-stage regression:
//! a long autoregression supplies residual proxies, then the differenced
//! series is regressed on its own lags and the lagged proxies. Forecasts are
//! made on the differenced scale and integrated back to price levels.

use crate::data::Series;
use crate::error::{ForecastError, Result};
use crate::models::{
    check_held_out, training_values, z_score, ForecastModel, ForecastResult, Prediction,
    TrainedForecastModel,
};
use forecast_math::stats::mean_square;
use forecast_math::{difference, least_squares, Integrator};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Model order (p, d, q)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArimaOrder {
    /// AR order
    pub p: usize,
    /// Differencing order
    pub d: usize,
    /// MA order
    pub q: usize,
}

impl Default for ArimaOrder {
    fn default() -> Self {
        Self { p: 5, d: 1, q: 0 }
    }
}

impl fmt::Display for ArimaOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{},{})", self.p, self.d, self.q)
    }
}

impl FromStr for ArimaOrder {
    type Err = ForecastError;

    /// Parse `p,d,q`
    fn from_str(s: &str) -> Result<Self> {
        let parts = s
            .split(',')
            .map(|part| part.trim().parse::<usize>())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| ForecastError::InvalidInput(format!("Invalid ARIMA order '{}': {}", s, e)))?;

        match parts.as_slice() {
            [p, d, q] => Ok(Self {
                p: *p,
                d: *d,
                q: *q,
            }),
            _ => Err(ForecastError::InvalidInput(format!(
                "ARIMA order must have three components p,d,q, got '{}'",
                s
            ))),
        }
    }
}

/// ARIMA model (AutoRegressive Integrated Moving Average)
#[derive(Debug, Clone)]
pub struct ArimaModel {
    /// Name of the model
    name: String,
    order: ArimaOrder,
}

/// Trained ARIMA model
#[derive(Debug, Clone)]
pub struct TrainedArimaModel {
    /// Name of the model
    name: String,
    order: ArimaOrder,
    /// Constant term on the differenced scale (zero when d > 0)
    intercept: f64,
    /// Fitted AR coefficients
    ar_coefficients: Vec<f64>,
    /// Fitted MA coefficients
    ma_coefficients: Vec<f64>,
    /// Training levels
    history: Vec<f64>,
    /// Differenced training series
    differenced: Vec<f64>,
    /// In-sample one-step residuals on the differenced scale
    residuals: Vec<f64>,
    /// Innovation variance
    sigma2: f64,
}

impl Default for ArimaModel {
    fn default() -> Self {
        Self::with_order(ArimaOrder::default())
    }
}

impl ArimaModel {
    /// Create a new ARIMA model
    pub fn new(p: usize, d: usize, q: usize) -> Self {
        Self::with_order(ArimaOrder { p, d, q })
    }

    /// Create a new ARIMA model from an order triple
    pub fn with_order(order: ArimaOrder) -> Self {
        Self {
            name: format!("ARIMA{}", order),
            order,
        }
    }

    /// Model order
    pub fn order(&self) -> ArimaOrder {
        self.order
    }

    fn has_intercept(&self) -> bool {
        self.order.d == 0
    }

    // Order of the first-stage autoregression used for residual proxies
    fn long_ar_order(&self) -> usize {
        if self.order.q > 0 {
            (self.order.p + self.order.q).max(2)
        } else {
            0
        }
    }

    // First differenced index usable in the second-stage regression
    fn regression_start(&self) -> usize {
        self.order.p.max(self.long_ar_order() + self.order.q)
    }

    /// Residual proxies from a long autoregression (zero before it has lags)
    fn residual_proxies(&self, y: &[f64]) -> Result<Vec<f64>> {
        let m = self.long_ar_order();
        let mut proxies = vec![0.0; y.len()];
        if m == 0 {
            return Ok(proxies);
        }

        let (design, target) = lagged_design(y, None, m, 0, m, self.has_intercept());
        let beta = least_squares(&design, &target)?;

        for (t, row) in (m..y.len()).zip(design.iter()) {
            let fitted: f64 = row.iter().zip(beta.iter()).map(|(x, b)| x * b).sum();
            proxies[t] = y[t] - fitted;
        }

        Ok(proxies)
    }
}

/// Regression rows for `y[t]` on `[1?, y[t-1..=t-p], e[t-1..=t-q]]`, `t >= start`
fn lagged_design(
    y: &[f64],
    e: Option<&[f64]>,
    p: usize,
    q: usize,
    start: usize,
    intercept: bool,
) -> (Vec<Vec<f64>>, Vec<f64>) {
    let mut design = Vec::with_capacity(y.len().saturating_sub(start));
    let mut target = Vec::with_capacity(y.len().saturating_sub(start));

    for t in start..y.len() {
        let mut row = Vec::with_capacity(p + q + 1);
        if intercept {
            row.push(1.0);
        }
        row.extend((1..=p).map(|i| y[t - i]));
        if let Some(e) = e {
            row.extend((1..=q).map(|j| e[t - j]));
        }
        design.push(row);
        target.push(y[t]);
    }

    (design, target)
}

impl ForecastModel for ArimaModel {
    type Trained = TrainedArimaModel;

    fn fit(&self, train: &Series) -> Result<TrainedArimaModel> {
        let ArimaOrder { p, d, q } = self.order;
        let closes = training_values(&self.name, train, self.min_training_len())?;
        let intercept_flag = self.has_intercept();

        let y = difference(&closes, d)?;
        let proxies = self.residual_proxies(&y)?;

        let (design, target) =
            lagged_design(&y, Some(&proxies), p, q, self.regression_start(), intercept_flag);
        let beta = least_squares(&design, &target).map_err(|e| {
            ForecastError::ModelFit(format!("{} estimation failed: {}", self.name, e))
        })?;

        let (intercept, coefficients) = if intercept_flag {
            (beta[0], &beta[1..])
        } else {
            (0.0, &beta[..])
        };
        let ar_coefficients = coefficients[..p].to_vec();
        let ma_coefficients = coefficients[p..].to_vec();

        let mut model = TrainedArimaModel {
            name: self.name.clone(),
            order: self.order,
            intercept,
            ar_coefficients,
            ma_coefficients,
            history: closes,
            differenced: Vec::with_capacity(y.len()),
            residuals: Vec::with_capacity(y.len()),
            sigma2: 0.0,
        };

        // Filter the differenced series through the fitted recursion
        for &value in &y {
            let fitted = model.one_step();
            let residual = if model.differenced.len() >= p { value - fitted } else { 0.0 };
            model.differenced.push(value);
            model.residuals.push(residual);
        }

        model.sigma2 = mean_square(&model.residuals[p.min(y.len())..])?;

        let all_finite = model.sigma2.is_finite()
            && model.intercept.is_finite()
            && model.ar_coefficients.iter().all(|c| c.is_finite())
            && model.ma_coefficients.iter().all(|c| c.is_finite())
            && model.residuals.iter().all(|r| r.is_finite());
        if !all_finite {
            return Err(ForecastError::ModelFit(format!(
                "{} produced non-finite estimates; the MA part may not be invertible",
                self.name
            )));
        }

        debug!(
            model = %self.name,
            observations = train.len(),
            ar = ?model.ar_coefficients,
            ma = ?model.ma_coefficients,
            sigma2 = model.sigma2,
            "fitted ARIMA"
        );

        Ok(model)
    }

    fn min_training_len(&self) -> usize {
        let ArimaOrder { p, d, q } = self.order;
        let c = usize::from(self.has_intercept());
        let m = self.long_ar_order();
        let stage_two = self.regression_start() + p + q + c + 1;
        let stage_one = 2 * m + c + 1;
        d + stage_two.max(stage_one)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl TrainedArimaModel {
    /// Model order
    pub fn order(&self) -> ArimaOrder {
        self.order
    }

    /// Fitted AR coefficients
    pub fn ar_coefficients(&self) -> &[f64] {
        &self.ar_coefficients
    }

    /// Fitted MA coefficients
    pub fn ma_coefficients(&self) -> &[f64] {
        &self.ma_coefficients
    }

    /// Estimated innovation variance
    pub fn sigma2(&self) -> f64 {
        self.sigma2
    }

    /// Next value on the differenced scale given the current state
    fn one_step(&self) -> f64 {
        one_step(
            self.intercept,
            &self.ar_coefficients,
            &self.ma_coefficients,
            &self.differenced,
            &self.residuals,
        )
    }

    /// Psi weights of the integrated process, used for forecast variance
    fn psi_weights(&self, horizon: usize) -> Vec<f64> {
        let mut psi = Vec::with_capacity(horizon);
        for j in 0..horizon {
            if j == 0 {
                psi.push(1.0);
                continue;
            }
            let ma = self.ma_coefficients.get(j - 1).copied().unwrap_or(0.0);
            let ar: f64 = self
                .ar_coefficients
                .iter()
                .take(j)
                .enumerate()
                .map(|(i, phi)| phi * psi[j - 1 - i])
                .sum();
            psi.push(ma + ar);
        }

        // Each round of integration turns the weights into running sums
        for _ in 0..self.order.d {
            let mut total = 0.0;
            for w in psi.iter_mut() {
                total += *w;
                *w = total;
            }
        }

        psi
    }
}

/// ARMA recursion; lags before the start of the history count as zero
fn one_step(intercept: f64, ar: &[f64], ma: &[f64], y: &[f64], e: &[f64]) -> f64 {
    let ar_part: f64 = ar
        .iter()
        .enumerate()
        .filter_map(|(i, phi)| y.len().checked_sub(i + 1).map(|idx| phi * y[idx]))
        .sum();
    let ma_part: f64 = ma
        .iter()
        .enumerate()
        .filter_map(|(j, theta)| e.len().checked_sub(j + 1).map(|idx| theta * e[idx]))
        .sum();
    intercept + ar_part + ma_part
}

impl TrainedForecastModel for TrainedArimaModel {
    fn predict(&self, horizon: usize) -> Result<Prediction> {
        let mut integrator = Integrator::new(&self.history, self.order.d)?;
        let mut y = self.differenced.clone();
        let mut e = self.residuals.clone();
        let mut values = Vec::with_capacity(horizon);

        for _ in 0..horizon {
            let next = one_step(self.intercept, &self.ar_coefficients, &self.ma_coefficients, &y, &e);
            y.push(next);
            // Future innovations have zero expectation
            e.push(0.0);
            values.push(integrator.integrate(next));
        }

        Ok(Prediction::new(self.name.clone(), values))
    }

    fn walk_forward(&self, held_out: &[f64]) -> Result<Prediction> {
        check_held_out(held_out)?;

        let mut integrator = Integrator::new(&self.history, self.order.d)?;
        let mut y = self.differenced.clone();
        let mut e = self.residuals.clone();
        let mut values = Vec::with_capacity(held_out.len());

        for &actual in held_out {
            let next = one_step(self.intercept, &self.ar_coefficients, &self.ma_coefficients, &y, &e);
            values.push(integrator.clone().integrate(next));

            let observed = integrator.observe(actual);
            y.push(observed);
            e.push(observed - next);
        }

        Ok(Prediction::new(self.name.clone(), values))
    }

    fn predict_with_intervals(&self, horizon: usize, confidence: f64) -> Result<ForecastResult> {
        let z = z_score(confidence)?;
        let prediction = self.predict(horizon)?;
        let psi = self.psi_weights(horizon);

        let mut cumulative = 0.0;
        let intervals = prediction
            .values()
            .iter()
            .zip(psi.iter())
            .map(|(&value, &w)| {
                cumulative += w * w;
                let margin = z * (self.sigma2 * cumulative).sqrt();
                (value - margin, value + margin)
            })
            .collect();

        ForecastResult::new_with_intervals(prediction.values().to_vec(), horizon, intervals)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
