//! Two-layer perceptron: `tanh` hidden layer, single `sigmoid` output unit,
//! trained by one-sample SGD on binary cross-entropy.
//!
//! Shapes (`h` = hidden width, `d` = input dim):
//! - `hidden_w`: `h` rows of length `d`
//! - `hidden_b`, `out_w`: length `h`
//! - `out_b`: scalar
//!
//! Each step keeps a full before/after snapshot of every parameter together with
//! the activations and gradients that produced it, plus each hidden unit's
//! weights reshaped to the dataset's grid ("templates").

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::activation::Activation;
use crate::contour::{LinearField, ScalarField};
use crate::error::{check_dim, check_lr};
use crate::vector::{dot_unchecked, l1_norm, scaled};
use crate::{Dataset, Error, Label, Result, Sample, loss};

/// Initial weights are drawn from `U(-INIT_RANGE, INIT_RANGE)`.
const INIT_RANGE: f64 = 0.5;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MlpConfig {
    pub hidden_dim: usize,
    pub lr: f64,
    pub seed: u64,
}

impl Default for MlpConfig {
    fn default() -> Self {
        Self {
            hidden_dim: 2,
            lr: 0.5,
            seed: 0,
        }
    }
}

impl MlpConfig {
    pub fn validate(&self) -> Result<()> {
        if self.hidden_dim == 0 {
            return Err(Error::InvalidConfig("hidden_dim must be > 0".to_owned()));
        }
        check_lr(self.lr)
    }
}

/// Every trainable parameter of the network.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct MlpParams {
    pub hidden_w: Vec<Vec<f64>>,
    pub hidden_b: Vec<f64>,
    pub out_w: Vec<f64>,
    pub out_b: f64,
}

/// Gradients of the loss w.r.t. each parameter in [`MlpParams`], same shapes.
pub type MlpGradients = MlpParams;

impl MlpParams {
    #[inline]
    pub fn hidden_dim(&self) -> usize {
        self.hidden_w.len()
    }

    /// Checks `hidden_w` rows == `hidden_b` len == `out_w` len, and every row has
    /// length `input_dim`.
    pub fn validate(&self, input_dim: usize) -> Result<()> {
        let h = self.hidden_w.len();
        if h == 0 {
            return Err(Error::InvalidConfig("hidden_dim must be > 0".to_owned()));
        }
        check_dim(h, self.hidden_b.len())?;
        check_dim(h, self.out_w.len())?;
        for row in &self.hidden_w {
            check_dim(input_dim, row.len())?;
        }
        let finite = self.out_b.is_finite()
            && self.hidden_b.iter().chain(&self.out_w).all(|v| v.is_finite())
            && self.hidden_w.iter().flatten().all(|v| v.is_finite());
        if !finite {
            return Err(Error::InvalidConfig("parameters must be finite".to_owned()));
        }
        Ok(())
    }

    /// `self - scale * other`, parameter by parameter.
    pub fn sub_scaled(&self, scale: f64, other: &MlpParams) -> MlpParams {
        let sub = |a: &[f64], b: &[f64]| -> Vec<f64> {
            a.iter().zip(b).map(|(&x, &g)| x - scale * g).collect()
        };
        MlpParams {
            hidden_w: self
                .hidden_w
                .iter()
                .zip(&other.hidden_w)
                .map(|(a, b)| sub(a, b))
                .collect(),
            hidden_b: sub(&self.hidden_b, &other.hidden_b),
            out_w: sub(&self.out_w, &other.out_w),
            out_b: self.out_b - scale * other.out_b,
        }
    }
}

/// Activations of a forward pass.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Forward {
    pub z_hidden: Vec<f64>,
    pub a_hidden: Vec<f64>,
    pub z_out: f64,
    /// Predicted probability of the positive class.
    pub a_out: f64,
}

/// Snapshot of one MLP update.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct MlpStep {
    pub x: Vec<f64>,
    pub y: Label,
    pub y01: f64,
    pub lr: f64,
    /// Forward pass with the pre-update parameters.
    pub forward: Forward,
    /// Cross-entropy before the update.
    pub loss: f64,
    pub before: MlpParams,
    pub grads: MlpGradients,
    pub after: MlpParams,
    /// L1 norm of the hidden-layer gradients.
    pub grad_norm: f64,
    pub templates_before: Vec<Vec<Vec<f64>>>,
    pub templates_after: Vec<Vec<Vec<f64>>>,
    pub grad_templates: Vec<Vec<Vec<f64>>>,
}

/// One row of [`MlpState::evaluate`].
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct EvalRow {
    pub x: Vec<f64>,
    pub y: Label,
    pub p_hat: f64,
    pub pred: Label,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "MlpStateParts"))]
#[derive(Debug, Clone, PartialEq)]
pub struct MlpState {
    params: MlpParams,
    grid_rows: usize,
    grid_cols: usize,
    lr: f64,
    seed: u64,
    sample_index: usize,
}

/// Unvalidated state fields, used when decoding.
#[cfg_attr(feature = "serde", derive(Deserialize))]
#[derive(Debug, Clone)]
pub struct MlpStateParts {
    pub params: MlpParams,
    pub grid_rows: usize,
    pub grid_cols: usize,
    pub lr: f64,
    pub seed: u64,
    pub sample_index: usize,
}

impl TryFrom<MlpStateParts> for MlpState {
    type Error = Error;

    fn try_from(parts: MlpStateParts) -> Result<Self> {
        let mut state = Self::from_parts(
            parts.params,
            (parts.grid_rows, parts.grid_cols),
            parts.lr,
            parts.seed,
        )?;
        state.sample_index = parts.sample_index;
        Ok(state)
    }
}

impl MlpState {
    /// Seeded initialization sized for `dataset`.
    ///
    /// Hidden then output weights are drawn from one `StdRng` stream seeded with
    /// `config.seed`; biases start at zero. The same seed always yields the same
    /// network.
    pub fn reset(dataset: &Dataset, config: &MlpConfig) -> Result<Self> {
        config.validate()?;
        let (grid_rows, grid_cols) = dataset.grid_shape();
        let mut rng = StdRng::seed_from_u64(config.seed);
        let params = init_params(dataset.dim(), config.hidden_dim, &mut rng);

        tracing::debug!(
            dataset = dataset.name(),
            input_dim = dataset.dim(),
            hidden_dim = config.hidden_dim,
            seed = config.seed,
            "mlp reset"
        );
        Ok(Self {
            params,
            grid_rows,
            grid_cols,
            lr: config.lr,
            seed: config.seed,
            sample_index: 0,
        })
    }

    /// Wrap existing parameters. `grid_rows * grid_cols` is the input dim.
    pub fn from_parts(
        params: MlpParams,
        grid_shape: (usize, usize),
        lr: f64,
        seed: u64,
    ) -> Result<Self> {
        let state = Self {
            params,
            grid_rows: grid_shape.0,
            grid_cols: grid_shape.1,
            lr,
            seed,
            sample_index: 0,
        };
        state.validate()?;
        Ok(state)
    }

    pub fn validate(&self) -> Result<()> {
        if self.input_dim() == 0 {
            return Err(Error::InvalidConfig("input dim must be > 0".to_owned()));
        }
        check_lr(self.lr)?;
        self.params.validate(self.input_dim())
    }

    #[inline]
    pub fn params(&self) -> &MlpParams {
        &self.params
    }

    #[inline]
    pub fn input_dim(&self) -> usize {
        self.grid_rows * self.grid_cols
    }

    #[inline]
    pub fn hidden_dim(&self) -> usize {
        self.params.hidden_dim()
    }

    #[inline]
    pub fn grid_shape(&self) -> (usize, usize) {
        (self.grid_rows, self.grid_cols)
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
    pub fn seed(&self) -> u64 {
        self.seed
    }

    #[inline]
    pub fn sample_index(&self) -> usize {
        self.sample_index
    }

    /// Forward pass for one input.
    pub fn forward(&self, x: &[f64]) -> Result<Forward> {
        check_dim(self.input_dim(), x.len())?;
        Ok(self.forward_unchecked(x))
    }

    fn forward_unchecked(&self, x: &[f64]) -> Forward {
        let p = &self.params;
        let z_hidden: Vec<f64> = p
            .hidden_w
            .iter()
            .zip(&p.hidden_b)
            .map(|(row, &b)| dot_unchecked(row, x) + b)
            .collect();
        let a_hidden: Vec<f64> = z_hidden
            .iter()
            .map(|&z| Activation::Tanh.forward(z))
            .collect();
        let z_out = dot_unchecked(&p.out_w, &a_hidden) + p.out_b;
        Forward {
            z_hidden,
            a_hidden,
            z_out,
            a_out: Activation::Sigmoid.forward(z_out),
        }
    }

    /// Predicted probability for a 2D input, without allocating.
    fn probability_2d(&self, x1: f64, x2: f64) -> f64 {
        debug_assert_eq!(self.input_dim(), 2);

        let p = &self.params;
        let mut z_out = p.out_b;
        for ((row, &b), &v) in p.hidden_w.iter().zip(&p.hidden_b).zip(&p.out_w) {
            let z = row[0].mul_add(x1, row[1].mul_add(x2, b));
            z_out = v.mul_add(z.tanh(), z_out);
        }
        Activation::Sigmoid.forward(z_out)
    }

    /// Binary cross-entropy of `p_hat` against a `{0, 1}` target.
    #[inline]
    pub fn loss(y01: f64, p_hat: f64) -> f64 {
        loss::binary_cross_entropy(y01, p_hat)
    }

    /// Trains on the current sample and advances the cycle index.
    pub fn step(&mut self, dataset: &Dataset, lr: Option<f64>) -> Result<MlpStep> {
        let sample = dataset.sample(self.sample_index);
        let record = self.step_on(sample, lr.unwrap_or(self.lr))?;
        self.sample_index = dataset.next_index(self.sample_index);
        Ok(record)
    }

    /// One backprop + SGD update on `sample`; leaves the cycle index alone.
    pub fn step_on(&mut self, sample: &Sample, lr: f64) -> Result<MlpStep> {
        check_lr(lr)?;
        let x = sample.x();
        let forward = self.forward(x)?;
        let y01 = sample.y().as_01();
        let loss = Self::loss(y01, forward.a_out);
        let grads = self.gradients(x, &forward, y01);

        let before = self.params.clone();
        let after = before.sub_scaled(lr, &grads);
        let templates_before = self.templates_of(&before.hidden_w)?;
        let templates_after = self.templates_of(&after.hidden_w)?;
        let grad_templates = self.templates_of(&grads.hidden_w)?;
        let grad_norm = grads.hidden_w.iter().map(|row| l1_norm(row)).sum::<f64>()
            + l1_norm(&grads.hidden_b);
        self.params = after.clone();

        tracing::trace!(loss, p_hat = forward.a_out, grad_norm, "mlp step");
        Ok(MlpStep {
            x: x.to_vec(),
            y: sample.y(),
            y01,
            lr,
            forward,
            loss,
            before,
            grads,
            after,
            grad_norm,
            templates_before,
            templates_after,
            grad_templates,
        })
    }

    /// Manual backprop for one sample, using the current (pre-update) parameters.
    fn gradients(&self, x: &[f64], forward: &Forward, y01: f64) -> MlpGradients {
        let p = &self.params;
        let dz_out = loss::bce_grad_wrt_logit(forward.a_out, y01);

        let out_w = scaled(dz_out, &forward.a_hidden);
        let dz_hidden: Vec<f64> = p
            .out_w
            .iter()
            .zip(&forward.a_hidden)
            .map(|(&v, &a)| dz_out * v * Activation::Tanh.grad_from_output(a))
            .collect();
        let hidden_w = dz_hidden.iter().map(|&dz| scaled(dz, x)).collect();

        MlpGradients {
            hidden_w,
            hidden_b: dz_hidden,
            out_w,
            out_b: dz_out,
        }
    }

    /// Runs every sample forward without touching the parameters.
    pub fn evaluate(&self, dataset: &Dataset) -> Result<Vec<EvalRow>> {
        dataset
            .samples()
            .iter()
            .map(|s| {
                let p_hat = self.forward(s.x())?.a_out;
                Ok(EvalRow {
                    x: s.x().to_vec(),
                    y: s.y(),
                    p_hat,
                    pred: Label::from_score(p_hat - 0.5),
                })
            })
            .collect()
    }

    /// Fraction of samples with `pred == y`.
    pub fn accuracy(&self, dataset: &Dataset) -> Result<f64> {
        let rows = self.evaluate(dataset)?;
        let correct = rows.iter().filter(|r| r.pred == r.y).count();
        Ok(correct as f64 / rows.len() as f64)
    }

    /// Mean cross-entropy over `dataset`.
    pub fn loss_on(&self, dataset: &Dataset) -> Result<f64> {
        let rows = self.evaluate(dataset)?;
        let total: f64 = rows.iter().map(|r| Self::loss(r.y.as_01(), r.p_hat)).sum();
        Ok(total / rows.len() as f64)
    }

    /// Each hidden unit's incoming weights reshaped to the input grid.
    pub fn templates(&self) -> Result<Vec<Vec<Vec<f64>>>> {
        self.templates_of(&self.params.hidden_w)
    }

    fn templates_of(&self, rows: &[Vec<f64>]) -> Result<Vec<Vec<Vec<f64>>>> {
        rows.iter()
            .map(|w| reshape_template(w, self.grid_rows, self.grid_cols))
            .collect()
    }

    fn require_2d(&self) -> Result<()> {
        check_dim(2, self.input_dim())
    }

    /// Hidden unit `idx`'s own linear boundary `dot(hidden_w[idx], x) + hidden_b[idx]`.
    pub fn hidden_unit_field(&self, idx: usize) -> Result<LinearField> {
        self.require_2d()?;
        let row = self.params.hidden_w.get(idx).ok_or_else(|| {
            Error::InvalidConfig(format!(
                "hidden unit {idx} out of range for width {}",
                self.hidden_dim()
            ))
        })?;
        LinearField::from_weights(row, self.params.hidden_b[idx])
    }

    pub fn hidden_unit_fields(&self) -> Result<Vec<LinearField>> {
        (0..self.hidden_dim())
            .map(|i| self.hidden_unit_field(i))
            .collect()
    }

    /// The composite boundary field `p_hat(x) - 0.5`.
    pub fn probability_field(&self) -> Result<ProbabilityField<'_>> {
        self.require_2d()?;
        Ok(ProbabilityField { mlp: self })
    }
}

/// `p_hat(x1, x2) - 0.5` for a 2-input network.
#[derive(Debug, Clone, Copy)]
pub struct ProbabilityField<'a> {
    mlp: &'a MlpState,
}

impl ScalarField for ProbabilityField<'_> {
    #[inline]
    fn value(&self, x1: f64, x2: f64) -> f64 {
        self.mlp.probability_2d(x1, x2) - 0.5
    }
}

fn init_params<R: Rng + ?Sized>(input_dim: usize, hidden_dim: usize, rng: &mut R) -> MlpParams {
    let dist = Uniform::new(-INIT_RANGE, INIT_RANGE);
    let hidden_w = (0..hidden_dim)
        .map(|_| (0..input_dim).map(|_| dist.sample(rng)).collect())
        .collect();
    let out_w = (0..hidden_dim).map(|_| dist.sample(rng)).collect();
    MlpParams {
        hidden_w,
        hidden_b: vec![0.0; hidden_dim],
        out_w,
        out_b: 0.0,
    }
}

/// Reshape a flat row-major weight vector into a `rows x cols` grid.
pub fn reshape_template(weights: &[f64], rows: usize, cols: usize) -> Result<Vec<Vec<f64>>> {
    check_dim(rows * cols, weights.len())?;
    if cols == 0 {
        return Ok(vec![Vec::new(); rows]);
    }
    Ok(weights.chunks(cols).map(<[f64]>::to_vec).collect())
}
