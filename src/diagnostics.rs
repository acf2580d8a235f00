//! Error-surface sweeps over a 2D slice of weight space.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::activation::Activation;
use crate::engine::ModelKind;
use crate::error::check_steps;
use crate::lms::LmsState;
use crate::perceptron::PerceptronState;
use crate::{Dataset, Error, Result, loss};

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepConfig {
    pub w1_range: (f64, f64),
    pub w2_range: (f64, f64),
    pub steps: usize,
    pub bias: f64,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            w1_range: (-2.0, 2.0),
            w2_range: (-2.0, 2.0),
            steps: 25,
            bias: 0.0,
        }
    }
}

impl SweepConfig {
    pub fn validate(&self) -> Result<()> {
        check_steps(self.steps)?;
        check_range("w1", self.w1_range)?;
        check_range("w2", self.w2_range)?;
        if !self.bias.is_finite() {
            return Err(Error::InvalidConfig("sweep bias must be finite".to_owned()));
        }
        Ok(())
    }

    pub fn sweep(&self, kind: ModelKind, dataset: &Dataset) -> Result<Vec<Vec<f64>>> {
        sweep_error_surface(
            kind,
            dataset,
            self.w1_range,
            self.w2_range,
            self.steps,
            self.bias,
        )
    }
}

fn check_range(name: &str, (lo, hi): (f64, f64)) -> Result<()> {
    if !(lo.is_finite() && hi.is_finite() && lo < hi) {
        return Err(Error::InvalidConfig(format!(
            "{name} range must be finite and increasing, got ({lo}, {hi})"
        )));
    }
    Ok(())
}

/// `steps` evenly spaced values from `lo` to `hi` inclusive.
fn linspace(lo: f64, hi: f64, steps: usize) -> impl Iterator<Item = f64> {
    let span = (hi - lo) / (steps - 1) as f64;
    (0..steps).map(move |i| lo + i as f64 * span)
}

/// Mean loss over `dataset` for every `(w1, w2)` pair on a `steps x steps` grid,
/// with the bias held at `bias`.
///
/// `grid[i][j]` is the loss at `w1 = w1_range.0 + i * dw1`, `w2 = w2_range.0 + j * dw2`.
/// Each kind is scored with its own training loss:
/// - `Perceptron`: `max(0, -y * s)`
/// - `Lms`: `0.5 * (y - y_hat)^2`
/// - `Mlp`: cross-entropy of a single logistic unit `sigmoid(w1*x1 + w2*x2 + b)`
///
/// Only 2D datasets can be swept. No live model is read or written.
pub fn sweep_error_surface(
    kind: ModelKind,
    dataset: &Dataset,
    w1_range: (f64, f64),
    w2_range: (f64, f64),
    steps: usize,
    bias: f64,
) -> Result<Vec<Vec<f64>>> {
    SweepConfig {
        w1_range,
        w2_range,
        steps,
        bias,
    }
    .validate()?;
    if dataset.dim() != 2 {
        return Err(Error::InvalidConfig(format!(
            "error surface needs 2D inputs, dataset has dimension {}",
            dataset.dim()
        )));
    }

    let w2s: Vec<f64> = linspace(w2_range.0, w2_range.1, steps).collect();
    let grid = linspace(w1_range.0, w1_range.1, steps)
        .map(|w1| {
            w2s.iter()
                .map(|&w2| mean_loss(kind, dataset, w1, w2, bias))
                .collect()
        })
        .collect::<Result<Vec<Vec<f64>>>>()?;

    tracing::debug!(?kind, steps, dataset = dataset.name(), "error surface swept");
    Ok(grid)
}

fn mean_loss(kind: ModelKind, dataset: &Dataset, w1: f64, w2: f64, bias: f64) -> Result<f64> {
    match kind {
        ModelKind::Perceptron => {
            PerceptronState::from_parts(vec![w1, w2], bias, 1.0)?.loss_on(dataset)
        }
        ModelKind::Lms => LmsState::from_parts(vec![w1, w2], bias, 1.0)?.loss_on(dataset),
        ModelKind::Mlp => {
            let total: f64 = dataset
                .samples()
                .iter()
                .map(|s| {
                    let x = s.x();
                    let z = w1.mul_add(x[0], w2.mul_add(x[1], bias));
                    let p_hat = Activation::Sigmoid.forward(z);
                    loss::binary_cross_entropy(s.y().as_01(), p_hat)
                })
                .sum();
            Ok(total / dataset.len() as f64)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Builtin, Label, Sample};

    fn one_sample() -> Dataset {
        Dataset::from_samples(vec![Sample::new(vec![1.0, 0.0], Label::Positive)]).unwrap()
    }

    #[test]
    fn rows_follow_w1_and_columns_follow_w2() {
        let ds = one_sample();
        let grid = sweep_error_surface(ModelKind::Lms, &ds, (-1.0, 1.0), (-5.0, 5.0), 3, 0.0)
            .unwrap();

        assert_eq!(grid.len(), 3);
        assert!(grid.iter().all(|row| row.len() == 3));
        // y_hat = w1, so the loss is 0.5 * (1 - w1)^2 whatever w2 is.
        for j in 0..3 {
            assert_eq!(grid[0][j], 2.0);
            assert_eq!(grid[1][j], 0.5);
            assert_eq!(grid[2][j], 0.0);
        }
    }

    #[test]
    fn each_kind_uses_its_own_loss() {
        let ds = one_sample();
        let sweep = |kind| {
            sweep_error_surface(kind, &ds, (-1.0, 1.0), (-1.0, 1.0), 3, 0.0).unwrap()
        };

        let perceptron = sweep(ModelKind::Perceptron);
        assert_eq!(perceptron[0][1], 1.0);
        assert_eq!(perceptron[2][1], 0.0);

        let mlp = sweep(ModelKind::Mlp);
        assert!((mlp[1][1] - std::f64::consts::LN_2).abs() < 1e-12);
        assert!(mlp[2][1] < mlp[0][1]);
    }

    #[test]
    fn origin_of_or_surface() {
        let ds = Dataset::builtin(Builtin::Or);
        let grid = SweepConfig::default().sweep(ModelKind::Lms, &ds).unwrap();
        assert_eq!(grid.len(), 25);
        // Centre of the default grid is w = (0, 0): every prediction is 0.
        assert!((grid[12][12] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn invalid_sweeps_are_rejected() {
        let ds = Dataset::builtin(Builtin::Xor);
        let bad = |w1: (f64, f64), steps: usize, bias: f64| {
            sweep_error_surface(ModelKind::Lms, &ds, w1, (-1.0, 1.0), steps, bias)
        };
        assert!(matches!(bad((-1.0, 1.0), 1, 0.0), Err(Error::InvalidConfig(_))));
        assert!(matches!(bad((1.0, -1.0), 5, 0.0), Err(Error::InvalidConfig(_))));
        assert!(matches!(bad((-1.0, f64::INFINITY), 5, 0.0), Err(Error::InvalidConfig(_))));
        assert!(matches!(bad((-1.0, 1.0), 5, f64::NAN), Err(Error::InvalidConfig(_))));

        let wide = Dataset::from_samples(vec![Sample::new(vec![1.0, 0.0, 1.0], Label::Negative)])
            .unwrap();
        assert!(
            sweep_error_surface(ModelKind::Mlp, &wide, (-1.0, 1.0), (-1.0, 1.0), 3, 0.0).is_err()
        );
    }
}
