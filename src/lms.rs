//! Widrow-Hoff LMS: a linear regressor trained by steepest descent on squared
//! error, one sample at a time.
//!
//! With `error = y - y_hat` and `E = error^2`, the reported gradient is
//! `dE/dw = -2 * error * x`, `dE/db = -2 * error`, and the applied update is
//! `w += lr * error * x`, `b += lr * error` (i.e. `-lr / 2 * gradient`).
//! Unlike the perceptron, every step updates.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::contour::LinearField;
use crate::error::{check_dim, check_lr};
use crate::linear::LinearUnit;
use crate::vector::scaled;
use crate::{Dataset, Label, Result, Sample, loss};

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LmsConfig {
    pub lr: f64,
}

impl Default for LmsConfig {
    fn default() -> Self {
        Self { lr: 0.1 }
    }
}

impl LmsConfig {
    pub fn validate(&self) -> Result<()> {
        check_lr(self.lr)
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "LmsStateParts"))]
#[derive(Debug, Clone, PartialEq)]
pub struct LmsState {
    unit: LinearUnit,
    lr: f64,
    sample_index: usize,
}

/// Unvalidated state fields, used when decoding.
#[cfg_attr(feature = "serde", derive(Deserialize))]
#[derive(Debug, Clone)]
pub struct LmsStateParts {
    pub unit: LinearUnit,
    pub lr: f64,
    pub sample_index: usize,
}

impl TryFrom<LmsStateParts> for LmsState {
    type Error = crate::Error;

    fn try_from(parts: LmsStateParts) -> Result<Self> {
        let state = Self {
            unit: parts.unit,
            lr: parts.lr,
            sample_index: parts.sample_index,
        };
        state.validate()?;
        Ok(state)
    }
}

/// Snapshot of one LMS update.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct LmsStep {
    pub x: Vec<f64>,
    pub y: Label,
    pub lr: f64,
    pub w_before: Vec<f64>,
    pub b_before: f64,
    pub y_hat: f64,
    pub error: f64,
    /// `0.5 * error^2` before the update.
    pub loss: f64,
    pub grad_w: Vec<f64>,
    pub grad_b: f64,
    pub delta_w: Vec<f64>,
    pub delta_b: f64,
    pub w_after: Vec<f64>,
    pub b_after: f64,
}

impl LmsState {
    /// Zero weights sized for `dataset`, at sample 0.
    pub fn reset(dataset: &Dataset, config: &LmsConfig) -> Result<Self> {
        config.validate()?;
        tracing::debug!(dataset = dataset.name(), dim = dataset.dim(), "lms reset");
        Ok(Self {
            unit: LinearUnit::zeros(dataset.dim())?,
            lr: config.lr,
            sample_index: 0,
        })
    }

    pub fn from_parts(w: Vec<f64>, b: f64, lr: f64) -> Result<Self> {
        check_lr(lr)?;
        Ok(Self {
            unit: LinearUnit::from_parts(w, b)?,
            lr,
            sample_index: 0,
        })
    }

    pub fn validate(&self) -> Result<()> {
        check_lr(self.lr)?;
        self.unit.validate()
    }

    #[inline]
    pub fn w(&self) -> &[f64] {
        self.unit.w()
    }

    #[inline]
    pub fn b(&self) -> f64 {
        self.unit.b()
    }

    #[inline]
    pub fn lr(&self) -> f64 {
        self.lr
    }

    pub fn set_lr(&mut self, lr: f64) -> Result<()> {
        check_lr(lr)?;
        self.lr = lr;
        Ok(())
    }

    #[inline]
    pub fn sample_index(&self) -> usize {
        self.sample_index
    }

    /// Unthresholded output `dot(w, x) + b`.
    #[inline]
    pub fn predict(&self, x: &[f64]) -> Result<f64> {
        self.unit.score(x)
    }

    /// Trains on the current sample and advances the cycle index.
    pub fn step(&mut self, dataset: &Dataset, lr: Option<f64>) -> Result<LmsStep> {
        let sample = dataset.sample(self.sample_index);
        let record = self.step_on(sample, lr.unwrap_or(self.lr))?;
        self.sample_index = dataset.next_index(self.sample_index);
        Ok(record)
    }

    /// One gradient step on `sample`; leaves the cycle index alone.
    pub fn step_on(&mut self, sample: &Sample, lr: f64) -> Result<LmsStep> {
        check_lr(lr)?;
        check_dim(self.unit.dim(), sample.dim())?;

        let x = sample.x();
        let y = sample.y();
        let w_before = self.unit.w().to_vec();
        let b_before = self.unit.b();

        let y_hat = self.unit.score(x)?;
        let error = y.sign() - y_hat;
        // d/dy_hat of (y - y_hat)^2.
        let grad_common = 2.0 * loss::squared_error_grad(y.sign(), y_hat);
        let grad_w = scaled(grad_common, x);
        let (delta_w, delta_b) = self.unit.nudge(lr * error, x);

        Ok(LmsStep {
            x: x.to_vec(),
            y,
            lr,
            w_before,
            b_before,
            y_hat,
            error,
            loss: loss::squared_error(y.sign(), y_hat),
            grad_w,
            grad_b: grad_common,
            delta_w,
            delta_b,
            w_after: self.unit.w().to_vec(),
            b_after: self.unit.b(),
        })
    }

    /// Mean `0.5 * (y - y_hat)^2` over `dataset`.
    pub fn loss_on(&self, dataset: &Dataset) -> Result<f64> {
        let mut total = 0.0;
        for sample in dataset.samples() {
            total += loss::squared_error(sample.y().sign(), self.predict(sample.x())?);
        }
        Ok(total / dataset.len() as f64)
    }

    pub fn linear_field(&self) -> Result<LinearField> {
        self.unit.field()
    }
}
