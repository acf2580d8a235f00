//! Step-by-step training of three classical learning rules, with drawable
//! decision boundaries.
//!
//! `rust-learning-rules` is the numeric core of an interactive teaching tool. It
//! trains a perceptron, a Widrow-Hoff LMS unit and a 2-layer `tanh -> sigmoid`
//! MLP one sample at a time, returning a full snapshot of every update, and
//! turns any model snapshot into boundary segments with marching squares.
//!
//! # Design goals
//!
//! - Every update is observable: steps return before/after parameters plus the
//!   scores, errors, activations and gradients that produced them.
//! - Clear contracts: shapes are explicit and validated at the API boundary.
//! - Reproducible: seeded initialization gives identical networks for identical seeds.
//!
//! # Data layout and shapes
//!
//! - Scalars are `f64`.
//! - A [`Dataset`] is a short ordered list of [`Sample`]s that models cycle through
//!   by index. Grid inputs are flattened row-major.
//! - MLP hidden weights are one row per hidden unit, each of the input dimension.
//!
//! # Errors
//!
//! Every shape-checked entry point returns [`Result`]. The crate never panics on
//! bad input and never logs on its own; it emits `tracing` events that are free
//! when no subscriber is installed.
//!
//! # Quick start
//!
//! ```rust
//! use rust_learning_rules::{Builtin, ContourConfig, Dataset, ModelKind, Trainer};
//!
//! # fn main() -> rust_learning_rules::Result<()> {
//! let mut trainer = Trainer::with_defaults(ModelKind::Perceptron, Dataset::builtin(Builtin::Or))?;
//! for _ in 0..8 {
//!     trainer.step(None)?;
//! }
//! assert_eq!(trainer.state().count_mistakes(trainer.dataset())?, 0);
//!
//! let boundary = trainer.boundary(&ContourConfig::default())?;
//! assert!(!boundary.decision.is_empty());
//! # Ok(())
//! # }
//! ```
//!
//! # Driving a model directly
//!
//! ```rust
//! use rust_learning_rules::{Builtin, Dataset, MlpConfig, MlpState};
//!
//! # fn main() -> rust_learning_rules::Result<()> {
//! let xor = Dataset::builtin(Builtin::Xor);
//! let mut mlp = MlpState::reset(&xor, &MlpConfig { hidden_dim: 3, lr: 0.5, seed: 7 })?;
//!
//! let step = mlp.step(&xor, None)?;
//! assert_eq!(step.after, step.before.sub_scaled(step.lr, &step.grads));
//!
//! let rows = mlp.evaluate(&xor)?;
//! assert_eq!(rows.len(), 4);
//! # Ok(())
//! # }
//! ```

pub mod activation;
pub mod contour;
pub mod data;
pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod history;
pub mod linear;
pub mod lms;
pub mod loss;
pub mod metrics;
pub mod mlp;
pub mod perceptron;
pub mod vector;

#[cfg(feature = "serde")]
pub mod wire;

pub use activation::Activation;
pub use contour::{
    ContourConfig, Domain, LinearField, Point, ScalarField, Segment, extract_contour, sample_grid,
};
pub use data::{Builtin, Dataset, GridSample, Label, Sample};
pub use diagnostics::{SweepConfig, sweep_error_surface};
pub use engine::{
    Boundary, ModelKind, ModelState, ResetParams, StepOutcome, StepRecord, Trainer, evaluate,
    reset, step,
};
pub use error::{Error, Result};
pub use history::StepHistory;
pub use linear::LinearUnit;
pub use lms::{LmsConfig, LmsState, LmsStep};
pub use mlp::{EvalRow, Forward, MlpConfig, MlpParams, MlpState, MlpStep, reshape_template};
pub use perceptron::{PerceptronConfig, PerceptronInit, PerceptronState, PerceptronStep};

#[cfg(feature = "serde")]
pub use wire::WireSnapshot;
