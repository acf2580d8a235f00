//! Metrics.
//!
//! Metrics are evaluation helpers (they never update parameters). Each one takes
//! a signed scorer `x -> s` whose sign is the predicted class: `dot(w, x) + b`
//! for the linear rules, `p_hat - 0.5` for the MLP.

use crate::engine::ModelState;
use crate::{Dataset, Label, Result};

/// `y * s` for every sample, in dataset order. Positive means correctly
/// classified with room to spare.
pub fn margins<F>(dataset: &Dataset, mut score: F) -> Result<Vec<f64>>
where
    F: FnMut(&[f64]) -> Result<f64>,
{
    dataset
        .samples()
        .iter()
        .map(|s| Ok(s.y().sign() * score(s.x())?))
        .collect()
}

/// Samples with `y * s <= 0`, the perceptron's (inclusive) mistake test.
pub fn count_mistakes<F>(dataset: &Dataset, score: F) -> Result<usize>
where
    F: FnMut(&[f64]) -> Result<f64>,
{
    Ok(margins(dataset, score)?
        .into_iter()
        .filter(|&m| m <= 0.0)
        .count())
}

/// Fraction of samples whose predicted label (`s >= 0` is positive) matches.
pub fn accuracy<F>(dataset: &Dataset, mut score: F) -> Result<f64>
where
    F: FnMut(&[f64]) -> Result<f64>,
{
    let mut correct = 0usize;
    for sample in dataset.samples() {
        if Label::from_score(score(sample.x())?) == sample.y() {
            correct += 1;
        }
    }
    Ok(correct as f64 / dataset.len() as f64)
}

impl ModelState {
    /// Signed score of `x` under the current parameters.
    pub fn decision_score(&self, x: &[f64]) -> Result<f64> {
        match self {
            ModelState::Perceptron(s) => s.score(x),
            ModelState::Lms(s) => s.predict(x),
            ModelState::Mlp(s) => Ok(s.forward(x)?.a_out - 0.5),
        }
    }

    pub fn accuracy(&self, dataset: &Dataset) -> Result<f64> {
        accuracy(dataset, |x| self.decision_score(x))
    }

    pub fn count_mistakes(&self, dataset: &Dataset) -> Result<usize> {
        count_mistakes(dataset, |x| self.decision_score(x))
    }

    pub fn margins(&self, dataset: &Dataset) -> Result<Vec<f64>> {
        margins(dataset, |x| self.decision_score(x))
    }
}
