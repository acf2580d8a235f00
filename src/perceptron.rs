//! Rosenblatt perceptron with mistake-driven updates.
//!
//! A sample counts as a mistake when `y * score <= 0`. The inclusive threshold
//! means a zero score is a mistake for *both* labels, even though `sign(0)`
//! predicts the positive class.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::contour::LinearField;
use crate::error::{check_dim, check_lr};
use crate::linear::LinearUnit;
use crate::{Dataset, Label, Result, Sample, loss};

/// How `reset` initializes the weights.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PerceptronInit {
    #[default]
    Zeros,
    /// Uniform in `[-0.5, 0.5)`, reproducible from `seed`.
    Random { seed: u64 },
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerceptronConfig {
    pub lr: f64,
    pub init: PerceptronInit,
}

impl Default for PerceptronConfig {
    fn default() -> Self {
        Self {
            lr: 1.0,
            init: PerceptronInit::Zeros,
        }
    }
}

impl PerceptronConfig {
    pub fn validate(&self) -> Result<()> {
        check_lr(self.lr)
    }
}

/// Current perceptron parameters plus the position in the dataset cycle.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "PerceptronStateParts"))]
#[derive(Debug, Clone, PartialEq)]
pub struct PerceptronState {
    unit: LinearUnit,
    lr: f64,
    sample_index: usize,
}

/// Unvalidated state fields, used when decoding.
#[cfg_attr(feature = "serde", derive(Deserialize))]
#[derive(Debug, Clone)]
pub struct PerceptronStateParts {
    pub unit: LinearUnit,
    pub lr: f64,
    pub sample_index: usize,
}

impl TryFrom<PerceptronStateParts> for PerceptronState {
    type Error = crate::Error;

    fn try_from(parts: PerceptronStateParts) -> Result<Self> {
        let state = Self {
            unit: parts.unit,
            lr: parts.lr,
            sample_index: parts.sample_index,
        };
        state.validate()?;
        Ok(state)
    }
}

/// Snapshot of one perceptron update.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct PerceptronStep {
    pub x: Vec<f64>,
    pub y: Label,
    pub lr: f64,
    pub w_before: Vec<f64>,
    pub b_before: f64,
    pub score: f64,
    pub pred: Label,
    pub mistake: bool,
    /// Zero when there was no mistake.
    pub delta_w: Vec<f64>,
    pub delta_b: f64,
    pub w_after: Vec<f64>,
    pub b_after: f64,
}

impl PerceptronState {
    /// Fresh state sized for `dataset`, at sample 0.
    pub fn reset(dataset: &Dataset, config: &PerceptronConfig) -> Result<Self> {
        config.validate()?;
        let unit = match config.init {
            PerceptronInit::Zeros => LinearUnit::zeros(dataset.dim())?,
            PerceptronInit::Random { seed } => {
                LinearUnit::random(dataset.dim(), &mut StdRng::seed_from_u64(seed))?
            }
        };
        tracing::debug!(dataset = dataset.name(), dim = dataset.dim(), "perceptron reset");
        Ok(Self {
            unit,
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

    /// Index of the sample the next `step` trains on.
    #[inline]
    pub fn sample_index(&self) -> usize {
        self.sample_index
    }

    /// `dot(w, x) + b`.
    #[inline]
    pub fn score(&self, x: &[f64]) -> Result<f64> {
        self.unit.score(x)
    }

    pub fn predict_label(&self, x: &[f64]) -> Result<Label> {
        Ok(Label::from_score(self.score(x)?))
    }

    /// Trains on the current sample, then advances the cycle index whether or not
    /// the sample was a mistake. `lr` overrides the state's rate for this step.
    pub fn step(&mut self, dataset: &Dataset, lr: Option<f64>) -> Result<PerceptronStep> {
        let sample = dataset.sample(self.sample_index);
        let record = self.step_on(sample, lr.unwrap_or(self.lr))?;
        self.sample_index = dataset.next_index(self.sample_index);
        Ok(record)
    }

    /// One mistake-driven update on `sample`; leaves the cycle index alone.
    pub fn step_on(&mut self, sample: &Sample, lr: f64) -> Result<PerceptronStep> {
        check_lr(lr)?;
        check_dim(self.unit.dim(), sample.dim())?;

        let x = sample.x();
        let y = sample.y();
        let w_before = self.unit.w().to_vec();
        let b_before = self.unit.b();

        let score = self.unit.score(x)?;
        let pred = Label::from_score(score);
        let mistake = y.sign() * score <= 0.0;

        let (delta_w, delta_b) = if mistake {
            self.unit.nudge(lr * y.sign(), x)
        } else {
            (vec![0.0; x.len()], 0.0)
        };

        Ok(PerceptronStep {
            x: x.to_vec(),
            y,
            lr,
            w_before,
            b_before,
            score,
            pred,
            mistake,
            delta_w,
            delta_b,
            w_after: self.unit.w().to_vec(),
            b_after: self.unit.b(),
        })
    }

    /// One pass over the whole dataset at the state's learning rate.
    ///
    /// With `shuffle_seed` the visiting order is a seeded permutation. The cycle
    /// index used by `step` is not touched.
    pub fn train_epoch(
        &mut self,
        dataset: &Dataset,
        shuffle_seed: Option<u64>,
    ) -> Result<Vec<PerceptronStep>> {
        let mut order: Vec<usize> = (0..dataset.len()).collect();
        if let Some(seed) = shuffle_seed {
            order.shuffle(&mut StdRng::seed_from_u64(seed));
        }
        let lr = self.lr;
        order
            .into_iter()
            .map(|idx| self.step_on(dataset.sample(idx), lr))
            .collect()
    }

    /// Mean perceptron criterion `max(0, -y * score)` over `dataset`.
    pub fn loss_on(&self, dataset: &Dataset) -> Result<f64> {
        let mut total = 0.0;
        for sample in dataset.samples() {
            total += loss::perceptron_loss(sample.y().sign(), self.score(sample.x())?);
        }
        Ok(total / dataset.len() as f64)
    }

    /// Boundary field for 2D inputs.
    pub fn linear_field(&self) -> Result<LinearField> {
        self.unit.field()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Builtin, Error};

    fn or_state() -> (Dataset, PerceptronState) {
        let ds = Dataset::builtin(Builtin::Or);
        let state = PerceptronState::reset(&ds, &PerceptronConfig::default()).unwrap();
        (ds, state)
    }

    #[test]
    fn first_or_step_is_a_zero_score_mistake() {
        let (ds, mut p) = or_state();
        let step = p.step(&ds, None).unwrap();

        assert_eq!(step.score, 0.0);
        assert_eq!(step.pred, Label::Positive);
        assert!(step.mistake);
        assert_eq!(step.w_after, vec![1.0, 1.0]);
        assert_eq!(step.b_after, -1.0);
        assert_eq!(step.delta_w, vec![1.0, 1.0]);
        assert_eq!(step.delta_b, -1.0);
        assert_eq!(p.sample_index(), 1);
    }

    #[test]
    fn zero_score_is_a_mistake_for_positive_labels_too() {
        let mut p = PerceptronState::from_parts(vec![0.0, 0.0], 0.0, 1.0).unwrap();
        let step = p
            .step_on(&Sample::new(vec![1.0, 1.0], Label::Positive), 1.0)
            .unwrap();
        assert!(step.mistake);
        assert_eq!(step.w_after, vec![1.0, 1.0]);
        assert_eq!(step.b_after, 1.0);
    }

    #[test]
    fn correct_sample_leaves_parameters_alone_but_advances() {
        let ds = Dataset::builtin(Builtin::Or);
        let mut p = PerceptronState::from_parts(vec![1.0, 1.0], 1.0, 1.0).unwrap();
        // Skip to (-1, 1) -> +1: score = 1 > 0.
        p.sample_index = 1;
        let step = p.step(&ds, None).unwrap();
        assert!(!step.mistake);
        assert_eq!(step.w_before, step.w_after);
        assert_eq!(step.delta_w, vec![0.0, 0.0]);
        assert_eq!(step.delta_b, 0.0);
        assert_eq!(p.sample_index(), 2);
    }

    #[test]
    fn index_wraps_after_last_sample() {
        let (ds, mut p) = or_state();
        for _ in 0..4 {
            p.step(&ds, None).unwrap();
        }
        assert_eq!(p.sample_index(), 0);
    }

    #[test]
    fn converges_on_or() {
        let (ds, mut p) = or_state();
        for _ in 0..5 {
            p.train_epoch(&ds, None).unwrap();
        }
        let last = p.train_epoch(&ds, None).unwrap();
        assert!(last.iter().all(|s| !s.mistake));
        assert_eq!(p.loss_on(&ds).unwrap(), 0.0);
    }

    #[test]
    fn shuffled_epoch_is_reproducible() {
        let ds = Dataset::builtin(Builtin::And);
        let mut a = PerceptronState::reset(&ds, &PerceptronConfig::default()).unwrap();
        let mut b = a.clone();
        let ra = a.train_epoch(&ds, Some(3)).unwrap();
        let rb = b.train_epoch(&ds, Some(3)).unwrap();
        assert_eq!(ra, rb);
        assert_eq!(a.sample_index(), 0);
    }

    #[test]
    fn dimension_and_lr_are_checked() {
        let (_, mut p) = or_state();
        let wide = Sample::new(vec![1.0, 1.0, 1.0], Label::Positive);
        assert!(matches!(
            p.step_on(&wide, 1.0),
            Err(Error::DimensionMismatch {
                expected: 2,
                got: 3
            })
        ));
        assert!(p.score(&[1.0]).is_err());
        assert!(matches!(
            p.step_on(&Sample::new(vec![1.0, 1.0], Label::Positive), 0.0),
            Err(Error::InvalidConfig(_))
        ));
        assert!(p.set_lr(-1.0).is_err());
    }

    #[test]
    fn random_init_depends_on_seed() {
        let ds = Dataset::builtin(Builtin::Or);
        let cfg = |seed| PerceptronConfig {
            lr: 1.0,
            init: PerceptronInit::Random { seed },
        };
        let a = PerceptronState::reset(&ds, &cfg(1)).unwrap();
        let b = PerceptronState::reset(&ds, &cfg(1)).unwrap();
        let c = PerceptronState::reset(&ds, &cfg(2)).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
