//! One entry point per user action, dispatched over the three learning rules.
//!
//! A caller holds a single [`ModelState`] and feeds it back into [`step`] after
//! every update. [`Trainer`] bundles that state with its dataset and a bounded
//! step history for callers that do not want to do the bookkeeping themselves.
//!
//! Nothing here is shared: concurrent calls on independent states are fine,
//! concurrent calls on the same state must be serialized by the caller.

use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::contour::{ContourConfig, Segment};
use crate::history::StepHistory;
use crate::lms::{LmsConfig, LmsState, LmsStep};
use crate::mlp::{EvalRow, MlpConfig, MlpState, MlpStep};
use crate::perceptron::{PerceptronConfig, PerceptronState, PerceptronStep};
use crate::{Dataset, Error, Label, Result};

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelKind {
    Perceptron,
    Lms,
    Mlp,
}

impl ModelKind {
    pub fn name(self) -> &'static str {
        match self {
            ModelKind::Perceptron => "perceptron",
            ModelKind::Lms => "lms",
            ModelKind::Mlp => "mlp",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ModelKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "perceptron" => Ok(ModelKind::Perceptron),
            "lms" => Ok(ModelKind::Lms),
            "mlp" => Ok(ModelKind::Mlp),
            other => Err(Error::InvalidConfig(format!("unknown model kind {other:?}"))),
        }
    }
}

/// Hyperparameters for [`reset`], one variant per kind.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResetParams {
    Perceptron(PerceptronConfig),
    Lms(LmsConfig),
    Mlp(MlpConfig),
}

impl ResetParams {
    /// The default configuration for `kind`.
    pub fn defaults(kind: ModelKind) -> Self {
        match kind {
            ModelKind::Perceptron => ResetParams::Perceptron(PerceptronConfig::default()),
            ModelKind::Lms => ResetParams::Lms(LmsConfig::default()),
            ModelKind::Mlp => ResetParams::Mlp(MlpConfig::default()),
        }
    }

    pub fn kind(&self) -> ModelKind {
        match self {
            ResetParams::Perceptron(_) => ModelKind::Perceptron,
            ResetParams::Lms(_) => ModelKind::Lms,
            ResetParams::Mlp(_) => ModelKind::Mlp,
        }
    }
}

impl From<PerceptronConfig> for ResetParams {
    fn from(config: PerceptronConfig) -> Self {
        ResetParams::Perceptron(config)
    }
}

impl From<LmsConfig> for ResetParams {
    fn from(config: LmsConfig) -> Self {
        ResetParams::Lms(config)
    }
}

impl From<MlpConfig> for ResetParams {
    fn from(config: MlpConfig) -> Self {
        ResetParams::Mlp(config)
    }
}

/// The live parameters of whichever rule is being trained.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
#[derive(Debug, Clone, PartialEq)]
pub enum ModelState {
    Perceptron(PerceptronState),
    Lms(LmsState),
    Mlp(MlpState),
}

impl ModelState {
    pub fn kind(&self) -> ModelKind {
        match self {
            ModelState::Perceptron(_) => ModelKind::Perceptron,
            ModelState::Lms(_) => ModelKind::Lms,
            ModelState::Mlp(_) => ModelKind::Mlp,
        }
    }

    pub fn sample_index(&self) -> usize {
        match self {
            ModelState::Perceptron(s) => s.sample_index(),
            ModelState::Lms(s) => s.sample_index(),
            ModelState::Mlp(s) => s.sample_index(),
        }
    }

    pub fn lr(&self) -> f64 {
        match self {
            ModelState::Perceptron(s) => s.lr(),
            ModelState::Lms(s) => s.lr(),
            ModelState::Mlp(s) => s.lr(),
        }
    }

    /// Shape and range checks for states built outside [`reset`].
    pub fn validate(&self) -> Result<()> {
        match self {
            ModelState::Perceptron(s) => s.validate(),
            ModelState::Lms(s) => s.validate(),
            ModelState::Mlp(s) => s.validate(),
        }
    }

    /// Decision boundary plus, for the MLP, each hidden unit's own boundary.
    ///
    /// Needs 2D inputs.
    pub fn boundary(&self, config: &ContourConfig) -> Result<Boundary> {
        config.validate()?;
        match self {
            ModelState::Perceptron(s) => Ok(Boundary::linear(config.extract(&s.linear_field()?)?)),
            ModelState::Lms(s) => Ok(Boundary::linear(config.extract(&s.linear_field()?)?)),
            ModelState::Mlp(s) => {
                let decision = config.extract(&s.probability_field()?)?;
                let hidden_units = s
                    .hidden_unit_fields()?
                    .iter()
                    .map(|field| config.extract(field))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Boundary {
                    decision,
                    hidden_units,
                })
            }
        }
    }
}

/// Record of one update, tagged by kind.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
#[derive(Debug, Clone, PartialEq)]
pub enum StepRecord {
    Perceptron(PerceptronStep),
    Lms(LmsStep),
    Mlp(MlpStep),
}

impl StepRecord {
    pub fn kind(&self) -> ModelKind {
        match self {
            StepRecord::Perceptron(_) => ModelKind::Perceptron,
            StepRecord::Lms(_) => ModelKind::Lms,
            StepRecord::Mlp(_) => ModelKind::Mlp,
        }
    }

    pub fn x(&self) -> &[f64] {
        match self {
            StepRecord::Perceptron(s) => &s.x,
            StepRecord::Lms(s) => &s.x,
            StepRecord::Mlp(s) => &s.x,
        }
    }

    pub fn y(&self) -> Label {
        match self {
            StepRecord::Perceptron(s) => s.y,
            StepRecord::Lms(s) => s.y,
            StepRecord::Mlp(s) => s.y,
        }
    }

    /// Loss on this sample before the update, in the rule's own criterion.
    pub fn loss(&self) -> f64 {
        match self {
            StepRecord::Perceptron(s) => crate::loss::perceptron_loss(s.y.sign(), s.score),
            StepRecord::Lms(s) => s.loss,
            StepRecord::Mlp(s) => s.loss,
        }
    }
}

/// A step record plus where in the dataset cycle it happened.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    /// Index of the sample that was trained on.
    pub sample_index: usize,
    /// Index the next step will train on.
    pub next_index: usize,
    pub record: StepRecord,
}

/// Boundary segments for a model snapshot.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Boundary {
    pub decision: Vec<Segment>,
    /// One entry per hidden unit; empty for linear models.
    pub hidden_units: Vec<Vec<Segment>>,
}

impl Boundary {
    fn linear(decision: Vec<Segment>) -> Self {
        Self {
            decision,
            hidden_units: Vec::new(),
        }
    }
}

/// Fresh state for `kind` sized for `dataset`.
///
/// `params` must be for the same kind.
pub fn reset(kind: ModelKind, dataset: &Dataset, params: &ResetParams) -> Result<ModelState> {
    if params.kind() != kind {
        return Err(Error::InvalidConfig(format!(
            "{} params given to reset a {kind} model",
            params.kind()
        )));
    }
    Ok(match params {
        ResetParams::Perceptron(c) => ModelState::Perceptron(PerceptronState::reset(dataset, c)?),
        ResetParams::Lms(c) => ModelState::Lms(LmsState::reset(dataset, c)?),
        ResetParams::Mlp(c) => ModelState::Mlp(MlpState::reset(dataset, c)?),
    })
}

/// Trains `state` on its current sample. `lr` overrides the state's rate for
/// this step only.
///
/// On error the state is left untouched.
pub fn step(state: &mut ModelState, dataset: &Dataset, lr: Option<f64>) -> Result<StepOutcome> {
    let sample_index = state.sample_index() % dataset.len();
    let record = match state {
        ModelState::Perceptron(s) => StepRecord::Perceptron(s.step(dataset, lr)?),
        ModelState::Lms(s) => StepRecord::Lms(s.step(dataset, lr)?),
        ModelState::Mlp(s) => StepRecord::Mlp(s.step(dataset, lr)?),
    };
    let outcome = StepOutcome {
        sample_index,
        next_index: state.sample_index(),
        record,
    };
    tracing::debug!(
        kind = %state.kind(),
        sample_index,
        loss = outcome.record.loss(),
        "step"
    );
    Ok(outcome)
}

/// Per-sample probabilities and predictions. MLP only.
pub fn evaluate(state: &ModelState, dataset: &Dataset) -> Result<Vec<EvalRow>> {
    match state {
        ModelState::Mlp(s) => s.evaluate(dataset),
        other => Err(Error::InvalidConfig(format!(
            "evaluate is only available for mlp models, not {}",
            other.kind()
        ))),
    }
}

/// Training session: a dataset, one model state, and the most recent steps.
#[derive(Debug, Clone)]
pub struct Trainer {
    dataset: Dataset,
    params: ResetParams,
    state: ModelState,
    history: StepHistory<StepOutcome>,
}

impl Trainer {
    pub fn new(dataset: Dataset, params: ResetParams) -> Result<Self> {
        let state = reset(params.kind(), &dataset, &params)?;
        Ok(Self {
            dataset,
            params,
            state,
            history: StepHistory::default(),
        })
    }

    /// Session with the default hyperparameters for `kind`.
    pub fn with_defaults(kind: ModelKind, dataset: Dataset) -> Result<Self> {
        Self::new(dataset, ResetParams::defaults(kind))
    }

    #[inline]
    pub fn kind(&self) -> ModelKind {
        self.state.kind()
    }

    #[inline]
    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    #[inline]
    pub fn params(&self) -> &ResetParams {
        &self.params
    }

    #[inline]
    pub fn state(&self) -> &ModelState {
        &self.state
    }

    #[inline]
    pub fn history(&self) -> &StepHistory<StepOutcome> {
        &self.history
    }

    /// One update; the outcome is also appended to the history.
    pub fn step(&mut self, lr: Option<f64>) -> Result<StepOutcome> {
        let outcome = step(&mut self.state, &self.dataset, lr)?;
        self.history.push(outcome.clone());
        Ok(outcome)
    }

    /// Re-initializes the model from the session's params and clears the history.
    pub fn reset(&mut self) -> Result<()> {
        self.state = reset(self.params.kind(), &self.dataset, &self.params)?;
        self.history.clear();
        Ok(())
    }

    /// Switches hyperparameters (and possibly kind), then resets.
    ///
    /// On error the session is unchanged.
    pub fn reset_with(&mut self, params: ResetParams) -> Result<()> {
        self.state = reset(params.kind(), &self.dataset, &params)?;
        self.params = params;
        self.history.clear();
        Ok(())
    }

    /// Swaps in a new dataset, then resets.
    ///
    /// On error the session is unchanged.
    pub fn set_dataset(&mut self, dataset: Dataset) -> Result<()> {
        self.state = reset(self.params.kind(), &dataset, &self.params)?;
        self.dataset = dataset;
        self.history.clear();
        Ok(())
    }

    pub fn evaluate(&self) -> Result<Vec<EvalRow>> {
        evaluate(&self.state, &self.dataset)
    }

    pub fn boundary(&self, config: &ContourConfig) -> Result<Boundary> {
        self.state.boundary(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Builtin;

    #[test]
    fn reset_rejects_params_of_another_kind() {
        let ds = Dataset::builtin(Builtin::Or);
        let err = reset(
            ModelKind::Lms,
            &ds,
            &ResetParams::defaults(ModelKind::Perceptron),
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn step_reports_cycle_position() {
        let ds = Dataset::builtin(Builtin::Or);
        let mut state =
            reset(ModelKind::Perceptron, &ds, &ResetParams::defaults(ModelKind::Perceptron))
                .unwrap();
        let mut seen = Vec::new();
        for _ in 0..5 {
            let out = step(&mut state, &ds, None).unwrap();
            seen.push((out.sample_index, out.next_index));
        }
        assert_eq!(seen, vec![(0, 1), (1, 2), (2, 3), (3, 0), (0, 1)]);
    }

    #[test]
    fn lr_override_is_per_step() {
        let ds = Dataset::builtin(Builtin::Or);
        let mut state = reset(ModelKind::Lms, &ds, &ResetParams::defaults(ModelKind::Lms)).unwrap();
        let out = step(&mut state, &ds, Some(0.5)).unwrap();
        match out.record {
            StepRecord::Lms(s) => assert_eq!(s.lr, 0.5),
            other => panic!("unexpected record {other:?}"),
        }
        assert_eq!(state.lr(), 0.1);
    }

    #[test]
    fn failed_step_leaves_state_alone() {
        let ds = Dataset::builtin(Builtin::Or);
        let mut state = reset(ModelKind::Mlp, &ds, &ResetParams::defaults(ModelKind::Mlp)).unwrap();
        let before = state.clone();
        assert!(step(&mut state, &ds, Some(-1.0)).is_err());
        assert_eq!(state, before);
    }

    #[test]
    fn evaluate_is_mlp_only() {
        let ds = Dataset::builtin(Builtin::Xor);
        let lms = reset(ModelKind::Lms, &ds, &ResetParams::defaults(ModelKind::Lms)).unwrap();
        assert!(matches!(evaluate(&lms, &ds), Err(Error::InvalidConfig(_))));

        let mlp = reset(ModelKind::Mlp, &ds, &ResetParams::defaults(ModelKind::Mlp)).unwrap();
        assert_eq!(evaluate(&mlp, &ds).unwrap().len(), 4);
    }

    #[test]
    fn trainer_keeps_bounded_history_and_resets() {
        let mut t = Trainer::with_defaults(ModelKind::Mlp, Dataset::builtin(Builtin::Xor)).unwrap();
        let initial = t.state().clone();
        for _ in 0..40 {
            t.step(None).unwrap();
        }
        assert_eq!(t.history().len(), 32);
        assert_ne!(t.state(), &initial);

        t.reset().unwrap();
        assert!(t.history().is_empty());
        assert_eq!(t.state(), &initial);
    }

    #[test]
    fn trainer_boundary_per_kind() {
        let mut t =
            Trainer::with_defaults(ModelKind::Perceptron, Dataset::builtin(Builtin::Or)).unwrap();
        // Zero weights: no boundary.
        let b = t.boundary(&ContourConfig::default()).unwrap();
        assert!(b.decision.is_empty());
        assert!(b.hidden_units.is_empty());

        t.step(None).unwrap();
        let b = t.boundary(&ContourConfig::default()).unwrap();
        assert!(!b.decision.is_empty());

        t.reset_with(ResetParams::Mlp(MlpConfig {
            hidden_dim: 3,
            ..MlpConfig::default()
        }))
        .unwrap();
        assert_eq!(t.kind(), ModelKind::Mlp);
        let b = t.boundary(&ContourConfig::default()).unwrap();
        assert_eq!(b.hidden_units.len(), 3);
    }

    #[test]
    fn set_dataset_failure_keeps_session() {
        let mut t = Trainer::with_defaults(ModelKind::Lms, Dataset::builtin(Builtin::And)).unwrap();
        t.step(None).unwrap();
        assert!(t.reset_with(ResetParams::Lms(LmsConfig { lr: 0.0 })).is_err());
        assert_eq!(t.history().len(), 1);
        assert_eq!(t.dataset().name(), "and");

        t.set_dataset(Dataset::builtin(Builtin::Xor)).unwrap();
        assert_eq!(t.dataset().name(), "xor");
        assert!(t.history().is_empty());
    }

    #[test]
    fn kind_parses_case_insensitively() {
        assert_eq!("MLP".parse::<ModelKind>().unwrap(), ModelKind::Mlp);
        assert!("adaline".parse::<ModelKind>().is_err());
        assert_eq!(ModelKind::Lms.to_string(), "lms");
    }
}
