//! LSTM sequence model for time series forecasting
//!
//! A single LSTM layer reads a look-back window of min-max scaled closes and
//! a linear head maps the final hidden state to the next scaled close. The
//! scaler is fitted on the training series only and frozen with the model.
//! Training is full backpropagation through time with Adam on squared error.

use crate::data::Series;
use crate::error::{ForecastError, Result};
use crate::models::{
    check_held_out, training_values, z_score, ForecastModel, ForecastResult, Prediction,
    TrainedForecastModel,
};
use forecast_math::stats::mean_square;
use forecast_math::MinMaxScaler;
use ndarray::{s, Array, Array1, Array2, Axis, Dimension, Zip};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Global gradient norm cap
const MAX_GRAD_NORM: f64 = 5.0;

/// LSTM hyperparameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LstmConfig {
    /// Look-back window length
    pub window_size: usize,
    /// Hidden units
    pub hidden_size: usize,
    /// Passes over the training windows
    pub epochs: usize,
    /// Adam step size
    pub learning_rate: f64,
    /// Windows per gradient step
    pub batch_size: usize,
    /// Seed for weight initialisation and shuffling
    pub seed: u64,
}

impl Default for LstmConfig {
    fn default() -> Self {
        Self {
            window_size: 60,
            hidden_size: 32,
            epochs: 20,
            learning_rate: 0.01,
            batch_size: 32,
            seed: 42,
        }
    }
}

/// LSTM model (learned sequence variant)
#[derive(Debug, Clone)]
pub struct LstmModel {
    /// Name of the model
    name: String,
    config: LstmConfig,
}

/// Trained LSTM model
#[derive(Debug, Clone)]
pub struct TrainedLstmModel {
    /// Name of the model
    name: String,
    config: LstmConfig,
    params: LstmParams,
    /// Frozen scaler fitted on the training closes
    scaler: MinMaxScaler,
    /// Last `window_size` scaled training closes
    last_window: Vec<f64>,
    /// Std dev of in-sample one-step errors in price units
    residual_std: f64,
    /// Mean squared error of the last epoch, scaled units
    final_loss: f64,
}

impl LstmModel {
    /// Create a new LSTM model
    pub fn new(config: LstmConfig) -> Result<Self> {
        if config.window_size == 0 {
            return Err(ForecastError::InvalidInput(
                "Window size must be positive".to_string(),
            ));
        }
        if config.hidden_size == 0 {
            return Err(ForecastError::InvalidInput(
                "Hidden size must be positive".to_string(),
            ));
        }
        if config.epochs == 0 || config.batch_size == 0 {
            return Err(ForecastError::InvalidInput(
                "Epochs and batch size must be positive".to_string(),
            ));
        }
        if !(config.learning_rate.is_finite() && config.learning_rate > 0.0) {
            return Err(ForecastError::InvalidInput(format!(
                "Learning rate must be positive, got {}",
                config.learning_rate
            )));
        }

        Ok(Self {
            name: format!(
                "LSTM(window={}, hidden={})",
                config.window_size, config.hidden_size
            ),
            config,
        })
    }

    /// Hyperparameters
    pub fn config(&self) -> &LstmConfig {
        &self.config
    }
}

impl ForecastModel for LstmModel {
    type Trained = TrainedLstmModel;

    fn fit(&self, train: &Series) -> Result<TrainedLstmModel> {
        let closes = training_values(&self.name, train, self.min_training_len())?;
        let window = self.config.window_size;

        let scaler = MinMaxScaler::fit(&closes)?;
        let scaled = scaler.transform_all(&closes);

        let samples: Vec<(&[f64], f64)> = (0..scaled.len() - window)
            .map(|k| (&scaled[k..k + window], scaled[k + window]))
            .collect();

        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let mut params = LstmParams::init(self.config.hidden_size, &mut rng)?;
        let mut adam = Adam::new(self.config.hidden_size, self.config.learning_rate);
        let mut order: Vec<usize> = (0..samples.len()).collect();
        let mut final_loss = f64::NAN;

        for epoch in 0..self.config.epochs {
            order.shuffle(&mut rng);
            let mut epoch_loss = 0.0;

            for batch in order.chunks(self.config.batch_size) {
                let mut grads = LstmParams::zeros(self.config.hidden_size);
                let scale = 1.0 / batch.len() as f64;

                for &idx in batch {
                    let (inputs, target) = samples[idx];
                    let pass = params.forward(inputs);
                    let error = pass.output - target;
                    epoch_loss += error * error;
                    params.backward(&pass, 2.0 * error * scale, &mut grads);
                }

                grads.clip_norm(MAX_GRAD_NORM);
                adam.step(&mut params, &grads);
            }

            final_loss = epoch_loss / samples.len() as f64;
            if !final_loss.is_finite() {
                return Err(ForecastError::ModelFit(format!(
                    "{} training diverged at epoch {}",
                    self.name, epoch
                )));
            }
            debug!(model = %self.name, epoch, loss = final_loss, "LSTM epoch");
        }

        let errors: Vec<f64> = samples
            .iter()
            .map(|(inputs, target)| {
                let predicted = scaler.inverse_transform(params.forward(inputs).output);
                predicted - scaler.inverse_transform(*target)
            })
            .collect();
        let residual_std = mean_square(&errors)?.sqrt();

        info!(
            model = %self.name,
            windows = samples.len(),
            loss = final_loss,
            residual_std,
            "fitted LSTM"
        );

        Ok(TrainedLstmModel {
            name: self.name.clone(),
            config: self.config,
            params,
            scaler,
            last_window: scaled[scaled.len() - window..].to_vec(),
            residual_std,
            final_loss,
        })
    }

    fn min_training_len(&self) -> usize {
        self.config.window_size + 1
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl TrainedLstmModel {
    /// Scaler fitted on the training closes
    pub fn scaler(&self) -> &MinMaxScaler {
        &self.scaler
    }

    /// Training loss of the final epoch (scaled units)
    pub fn final_loss(&self) -> f64 {
        self.final_loss
    }

    /// Std dev of in-sample one-step errors in price units
    pub fn residual_std(&self) -> f64 {
        self.residual_std
    }

    fn rollout(&self, horizon: usize) -> Vec<f64> {
        let mut window = self.last_window.clone();
        let mut values = Vec::with_capacity(horizon);

        for _ in 0..horizon {
            let next = self.params.forward(&window).output;
            values.push(self.scaler.inverse_transform(next));
            window.rotate_left(1);
            if let Some(last) = window.last_mut() {
                *last = next;
            }
        }

        values
    }
}

impl TrainedForecastModel for TrainedLstmModel {
    /// Autoregressive rollout: every step consumes the previous outputs
    fn predict(&self, horizon: usize) -> Result<Prediction> {
        Ok(Prediction::new(self.name.clone(), self.rollout(horizon)))
    }

    /// One-step-ahead over real values; the first `window_size` held-out
    /// observations only serve as context
    fn walk_forward(&self, held_out: &[f64]) -> Result<Prediction> {
        let window = self.config.window_size;
        if held_out.len() <= window {
            return Err(ForecastError::InvalidInput(format!(
                "Walk-forward with window_size {} needs more than {} held-out values, got {}",
                window,
                window,
                held_out.len()
            )));
        }
        check_held_out(held_out)?;

        let scaled = self.scaler.transform_all(held_out);
        let values = scaled
            .windows(window)
            .take(scaled.len() - window)
            .map(|inputs| self.scaler.inverse_transform(self.params.forward(inputs).output))
            .collect();

        Ok(Prediction::new(self.name.clone(), values))
    }

    fn predict_with_intervals(&self, horizon: usize, confidence: f64) -> Result<ForecastResult> {
        let z = z_score(confidence)?;
        let values = self.rollout(horizon);

        // Rollout error compounds roughly like a random walk
        let intervals = values
            .iter()
            .enumerate()
            .map(|(i, &value)| {
                let margin = z * self.residual_std * ((i + 1) as f64).sqrt();
                (value - margin, value + margin)
            })
            .collect();

        ForecastResult::new_with_intervals(values, horizon, intervals)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Weights of the LSTM layer and the linear head
///
/// Gate blocks are stacked in the order input, forget, cell, output.
#[derive(Debug, Clone)]
struct LstmParams {
    w_in: Array1<f64>,
    u: Array2<f64>,
    b: Array1<f64>,
    w_out: Array1<f64>,
    b_out: f64,
}

/// Values kept from the forward pass for backpropagation
struct Step {
    x: f64,
    h_prev: Array1<f64>,
    c_prev: Array1<f64>,
    i: Array1<f64>,
    f: Array1<f64>,
    g: Array1<f64>,
    o: Array1<f64>,
    c: Array1<f64>,
}

struct ForwardPass {
    steps: Vec<Step>,
    h_last: Array1<f64>,
    output: f64,
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

impl LstmParams {
    fn zeros(hidden: usize) -> Self {
        Self {
            w_in: Array1::zeros(4 * hidden),
            u: Array2::zeros((4 * hidden, hidden)),
            b: Array1::zeros(4 * hidden),
            w_out: Array1::zeros(hidden),
            b_out: 0.0,
        }
    }

    fn init(hidden: usize, rng: &mut StdRng) -> Result<Self> {
        let std = 1.0 / (hidden as f64).sqrt();
        let normal = Normal::new(0.0, std)
            .map_err(|e| ForecastError::ModelFit(format!("Weight initialisation: {}", e)))?;

        let mut params = Self::zeros(hidden);
        params.w_in.mapv_inplace(|_| normal.sample(&mut *rng));
        params.u.mapv_inplace(|_| normal.sample(&mut *rng));
        params.w_out.mapv_inplace(|_| normal.sample(&mut *rng));
        // Start with the forget gate open
        params.b.slice_mut(s![hidden..2 * hidden]).fill(1.0);

        Ok(params)
    }

    fn hidden(&self) -> usize {
        self.w_out.len()
    }

    fn forward(&self, inputs: &[f64]) -> ForwardPass {
        let hidden = self.hidden();
        let mut h = Array1::zeros(hidden);
        let mut c = Array1::zeros(hidden);
        let mut steps = Vec::with_capacity(inputs.len());

        for &x in inputs {
            let z = &self.w_in * x + self.u.dot(&h) + &self.b;
            let i = z.slice(s![0..hidden]).mapv(sigmoid);
            let f = z.slice(s![hidden..2 * hidden]).mapv(sigmoid);
            let g = z.slice(s![2 * hidden..3 * hidden]).mapv(f64::tanh);
            let o = z.slice(s![3 * hidden..4 * hidden]).mapv(sigmoid);

            let c_next = &f * &c + &i * &g;
            let h_next = &o * &c_next.mapv(f64::tanh);

            steps.push(Step {
                x,
                h_prev: h,
                c_prev: c,
                i,
                f,
                g,
                o,
                c: c_next.clone(),
            });

            h = h_next;
            c = c_next;
        }

        let output = self.w_out.dot(&h) + self.b_out;
        ForwardPass {
            steps,
            h_last: h,
            output,
        }
    }

    /// Accumulate gradients of the loss given `d_output = dL/d(output)`
    fn backward(&self, pass: &ForwardPass, d_output: f64, grads: &mut LstmParams) {
        let hidden = self.hidden();

        grads.w_out.scaled_add(d_output, &pass.h_last);
        grads.b_out += d_output;

        let mut dh = &self.w_out * d_output;
        let mut dc = Array1::<f64>::zeros(hidden);

        for step in pass.steps.iter().rev() {
            let tanh_c = step.c.mapv(f64::tanh);

            let d_o = &dh * &tanh_c;
            dc = dc + &dh * &step.o * &tanh_c.mapv(|t| 1.0 - t * t);

            let d_i = &dc * &step.g;
            let d_g = &dc * &step.i;
            let d_f = &dc * &step.c_prev;

            let mut dz = Array1::<f64>::zeros(4 * hidden);
            dz.slice_mut(s![0..hidden])
                .assign(&(&d_i * &step.i.mapv(|v| v * (1.0 - v))));
            dz.slice_mut(s![hidden..2 * hidden])
                .assign(&(&d_f * &step.f.mapv(|v| v * (1.0 - v))));
            dz.slice_mut(s![2 * hidden..3 * hidden])
                .assign(&(&d_g * &step.g.mapv(|v| 1.0 - v * v)));
            dz.slice_mut(s![3 * hidden..4 * hidden])
                .assign(&(&d_o * &step.o.mapv(|v| v * (1.0 - v))));

            grads.w_in.scaled_add(step.x, &dz);
            let outer = dz
                .view()
                .insert_axis(Axis(1))
                .dot(&step.h_prev.view().insert_axis(Axis(0)));
            grads.u += &outer;
            grads.b += &dz;

            dh = self.u.t().dot(&dz);
            dc = &dc * &step.f;
        }
    }

    fn norm_squared(&self) -> f64 {
        self.w_in.mapv(|v| v * v).sum()
            + self.u.mapv(|v| v * v).sum()
            + self.b.mapv(|v| v * v).sum()
            + self.w_out.mapv(|v| v * v).sum()
            + self.b_out * self.b_out
    }

    fn clip_norm(&mut self, max_norm: f64) {
        let norm = self.norm_squared().sqrt();
        if norm > max_norm {
            let factor = max_norm / norm;
            self.w_in.mapv_inplace(|v| v * factor);
            self.u.mapv_inplace(|v| v * factor);
            self.b.mapv_inplace(|v| v * factor);
            self.w_out.mapv_inplace(|v| v * factor);
            self.b_out *= factor;
        }
    }
}

/// Adam optimiser state
struct Adam {
    learning_rate: f64,
    beta1: f64,
    beta2: f64,
    epsilon: f64,
    t: i32,
    m: LstmParams,
    v: LstmParams,
}

impl Adam {
    fn new(hidden: usize, learning_rate: f64) -> Self {
        Self {
            learning_rate,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-8,
            t: 0,
            m: LstmParams::zeros(hidden),
            v: LstmParams::zeros(hidden),
        }
    }

    fn step(&mut self, params: &mut LstmParams, grads: &LstmParams) {
        self.t += 1;
        let (b1, b2, eps) = (self.beta1, self.beta2, self.epsilon);
        let lr_t =
            self.learning_rate * (1.0 - b2.powi(self.t)).sqrt() / (1.0 - b1.powi(self.t));

        update(&mut params.w_in, &grads.w_in, &mut self.m.w_in, &mut self.v.w_in, lr_t, b1, b2, eps);
        update(&mut params.u, &grads.u, &mut self.m.u, &mut self.v.u, lr_t, b1, b2, eps);
        update(&mut params.b, &grads.b, &mut self.m.b, &mut self.v.b, lr_t, b1, b2, eps);
        update(&mut params.w_out, &grads.w_out, &mut self.m.w_out, &mut self.v.w_out, lr_t, b1, b2, eps);

        let g = grads.b_out;
        self.m.b_out = b1 * self.m.b_out + (1.0 - b1) * g;
        self.v.b_out = b2 * self.v.b_out + (1.0 - b2) * g * g;
        params.b_out -= lr_t * self.m.b_out / (self.v.b_out.sqrt() + eps);
    }
}

#[allow(clippy::too_many_arguments)]
fn update<D: Dimension>(
    param: &mut Array<f64, D>,
    grad: &Array<f64, D>,
    m: &mut Array<f64, D>,
    v: &mut Array<f64, D>,
    lr_t: f64,
    b1: f64,
    b2: f64,
    eps: f64,
) {
    Zip::from(param)
        .and(grad)
        .and(m)
        .and(v)
        .for_each(|p, &g, m, v| {
            *m = b1 * *m + (1.0 - b1) * g;
            *v = b2 * *v + (1.0 - b2) * g * g;
            *p -= lr_t * *m / (v.sqrt() + eps);
        });
}
