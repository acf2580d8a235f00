//! Datasets.
//!
//! A dataset is a small, fixed, ordered list of samples that the models cycle
//! through by index. All samples share one input dimension, and every dataset
//! remembers the grid shape its inputs were flattened from (row-major) so hidden
//! unit weights can be reshaped back into templates.

use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::activation::Activation;
use crate::{Error, Result};

/// A binary class label.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(into = "i8", try_from = "i8"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Label {
    Negative,
    Positive,
}

impl Label {
    /// `+1.0` / `-1.0`, as used by the perceptron and LMS rules.
    #[inline]
    pub fn sign(self) -> f64 {
        match self {
            Label::Positive => 1.0,
            Label::Negative => -1.0,
        }
    }

    /// `1.0` / `0.0`, as used by cross-entropy.
    #[inline]
    pub fn as_01(self) -> f64 {
        match self {
            Label::Positive => 1.0,
            Label::Negative => 0.0,
        }
    }

    /// Thresholds `score` with [`Activation::Sign`]: positive for `score >= 0`.
    #[inline]
    pub fn from_score(score: f64) -> Self {
        if Activation::Sign.forward(score) > 0.0 {
            Label::Positive
        } else {
            Label::Negative
        }
    }
}

impl From<Label> for i8 {
    fn from(label: Label) -> Self {
        match label {
            Label::Positive => 1,
            Label::Negative => -1,
        }
    }
}

impl TryFrom<i8> for Label {
    type Error = Error;

    fn try_from(value: i8) -> Result<Self> {
        match value {
            1 => Ok(Label::Positive),
            -1 => Ok(Label::Negative),
            other => Err(Error::InvalidDataset(format!(
                "labels must be -1 or +1, got {other}"
            ))),
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Positive => f.write_str("+1"),
            Label::Negative => f.write_str("-1"),
        }
    }
}

/// One input vector and its label. Immutable once constructed.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    x: Vec<f64>,
    y: Label,
}

impl Sample {
    pub fn new(x: Vec<f64>, y: Label) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn x(&self) -> &[f64] {
        &self.x
    }

    #[inline]
    pub fn y(&self) -> Label {
        self.y
    }

    #[inline]
    pub fn dim(&self) -> usize {
        self.x.len()
    }
}

/// A custom sample drawn on a grid; flattened row-major into the input vector.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct GridSample {
    pub grid: Vec<Vec<f64>>,
    pub label: Label,
}

/// The named built-in datasets over inputs in `{-1, +1}^2`.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    Or,
    And,
    Xor,
}

impl Builtin {
    pub fn name(self) -> &'static str {
        match self {
            Builtin::Or => "or",
            Builtin::And => "and",
            Builtin::Xor => "xor",
        }
    }

    fn truth(self, a: bool, b: bool) -> bool {
        match self {
            Builtin::Or => a || b,
            Builtin::And => a && b,
            Builtin::Xor => a != b,
        }
    }
}

impl FromStr for Builtin {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "or" => Ok(Builtin::Or),
            "and" => Ok(Builtin::And),
            "xor" => Ok(Builtin::Xor),
            other => Err(Error::InvalidDataset(format!(
                "unknown dataset {other:?}; expected \"or\", \"and\" or \"xor\""
            ))),
        }
    }
}

/// A validated, non-empty dataset whose samples share one dimension.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "DatasetParts"))]
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    name: String,
    grid_rows: usize,
    grid_cols: usize,
    samples: Vec<Sample>,
}

/// Unvalidated dataset fields, used when decoding.
#[cfg_attr(feature = "serde", derive(Deserialize))]
#[derive(Debug, Clone)]
pub struct DatasetParts {
    pub name: String,
    pub grid_rows: usize,
    pub grid_cols: usize,
    pub samples: Vec<Sample>,
}

impl TryFrom<DatasetParts> for Dataset {
    type Error = Error;

    fn try_from(parts: DatasetParts) -> Result<Self> {
        Self::build(parts.name, parts.grid_rows, parts.grid_cols, parts.samples)
    }
}

impl From<Builtin> for Dataset {
    fn from(kind: Builtin) -> Self {
        Dataset::builtin(kind)
    }
}

impl Dataset {
    /// One of the classic two-input logic datasets, in the order
    /// `(-1,-1), (-1,1), (1,-1), (1,1)`.
    pub fn builtin(kind: Builtin) -> Self {
        let samples = [(-1.0, -1.0), (-1.0, 1.0), (1.0, -1.0), (1.0, 1.0)]
            .into_iter()
            .map(|(a, b)| {
                let y = if kind.truth(a > 0.0, b > 0.0) {
                    Label::Positive
                } else {
                    Label::Negative
                };
                Sample::new(vec![a, b], y)
            })
            .collect();

        Self {
            name: kind.name().to_owned(),
            grid_rows: 1,
            grid_cols: 2,
            samples,
        }
    }

    /// Look up a built-in dataset by name (`"or"`, `"and"`, `"xor"`).
    pub fn named(name: &str) -> Result<Self> {
        Ok(Self::builtin(name.parse()?))
    }

    /// Build a dataset from arbitrary input vectors (grid shape `1 x d`).
    pub fn from_samples(samples: Vec<Sample>) -> Result<Self> {
        let dim = samples.first().map(Sample::dim).unwrap_or(0);
        Self::build("custom".to_owned(), 1, dim, samples)
    }

    /// Build a dataset from `rows x cols` grids whose cells are `-1` or `+1`.
    pub fn from_grids(rows: usize, cols: usize, samples: &[GridSample]) -> Result<Self> {
        if rows == 0 || cols == 0 {
            return Err(Error::InvalidDataset(format!(
                "grid shape must be at least 1x1, got {rows}x{cols}"
            )));
        }

        let mut flat = Vec::with_capacity(samples.len());
        for (i, sample) in samples.iter().enumerate() {
            if sample.grid.len() != rows {
                return Err(Error::InvalidDataset(format!(
                    "sample {i} has {} grid rows, expected {rows}",
                    sample.grid.len()
                )));
            }
            let mut x = Vec::with_capacity(rows * cols);
            for row in &sample.grid {
                if row.len() != cols {
                    return Err(Error::InvalidDataset(format!(
                        "sample {i} has a grid row of len {}, expected {cols}",
                        row.len()
                    )));
                }
                for &cell in row {
                    if cell != 1.0 && cell != -1.0 {
                        return Err(Error::InvalidDataset(format!(
                            "sample {i} grid cells must be -1 or +1, got {cell}"
                        )));
                    }
                    x.push(cell);
                }
            }
            flat.push(Sample::new(x, sample.label));
        }

        Self::build("custom".to_owned(), rows, cols, flat)
    }

    /// Good-vs-bad shape placement dataset.
    ///
    /// Mask cells `> 0` belong to the shape. With `translations`, every valid
    /// placement of each mask on the `board_rows x board_cols` board becomes one
    /// sample (shape cells `+1`, the rest `-1`); good placements come first.
    /// Without, each mask must already be board sized and yields one sample.
    pub fn shapes(
        good_mask: &[Vec<i32>],
        bad_mask: &[Vec<i32>],
        board_rows: usize,
        board_cols: usize,
        translations: bool,
    ) -> Result<Self> {
        let mut samples = Vec::new();
        for (mask, label) in [(good_mask, Label::Positive), (bad_mask, Label::Negative)] {
            let placements = if translations {
                translate_mask(mask, board_rows, board_cols)?
            } else {
                let (h, w) = mask_shape(mask)?;
                if h != board_rows || w != board_cols {
                    return Err(Error::InvalidDataset(format!(
                        "mask is {h}x{w} but the board is {board_rows}x{board_cols}"
                    )));
                }
                vec![
                    mask.iter()
                        .flatten()
                        .map(|&c| if c > 0 { 1.0 } else { -1.0 })
                        .collect(),
                ]
            };
            samples.extend(placements.into_iter().map(|x| Sample::new(x, label)));
        }

        Self::build("shapes".to_owned(), board_rows, board_cols, samples)
    }

    fn build(name: String, rows: usize, cols: usize, samples: Vec<Sample>) -> Result<Self> {
        if samples.is_empty() {
            return Err(Error::InvalidDataset(
                "dataset must not be empty".to_owned(),
            ));
        }
        let dim = rows * cols;
        if dim == 0 {
            return Err(Error::InvalidDataset(
                "samples must have at least one input".to_owned(),
            ));
        }
        for (i, sample) in samples.iter().enumerate() {
            if sample.dim() != dim {
                return Err(Error::InvalidDataset(format!(
                    "sample {i} has dimension {}, expected {dim}",
                    sample.dim()
                )));
            }
            if sample.x.iter().any(|v| !v.is_finite()) {
                return Err(Error::InvalidDataset(format!(
                    "sample {i} has a non-finite input"
                )));
            }
        }

        Ok(Self {
            name,
            grid_rows: rows,
            grid_cols: cols,
            samples,
        })
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Always `false`: empty datasets are rejected on construction.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Input dimension shared by every sample.
    #[inline]
    pub fn dim(&self) -> usize {
        self.grid_rows * self.grid_cols
    }

    /// `(rows, cols)` the inputs were flattened from.
    #[inline]
    pub fn grid_shape(&self) -> (usize, usize) {
        (self.grid_rows, self.grid_cols)
    }

    #[inline]
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// The sample at `idx`, wrapping around the dataset.
    #[inline]
    pub fn sample(&self, idx: usize) -> &Sample {
        &self.samples[idx % self.samples.len()]
    }

    /// `(idx + 1) mod len`.
    #[inline]
    pub fn next_index(&self, idx: usize) -> usize {
        (idx + 1) % self.samples.len()
    }
}

fn mask_shape(mask: &[Vec<i32>]) -> Result<(usize, usize)> {
    let h = mask.len();
    let w = mask.first().map(Vec::len).unwrap_or(0);
    if h == 0 || w == 0 {
        return Err(Error::InvalidDataset("shape mask must be non-empty".to_owned()));
    }
    if mask.iter().any(|row| row.len() != w) {
        return Err(Error::InvalidDataset(
            "shape mask rows must all have the same length".to_owned(),
        ));
    }
    Ok((h, w))
}

fn translate_mask(mask: &[Vec<i32>], board_rows: usize, board_cols: usize) -> Result<Vec<Vec<f64>>> {
    let (h, w) = mask_shape(mask)?;
    if board_rows < h || board_cols < w {
        return Err(Error::InvalidDataset(format!(
            "board {board_rows}x{board_cols} is smaller than the {h}x{w} shape"
        )));
    }

    let mut placements = Vec::with_capacity((board_rows - h + 1) * (board_cols - w + 1));
    for top in 0..=board_rows - h {
        for left in 0..=board_cols - w {
            let mut x = vec![-1.0; board_rows * board_cols];
            for (r, row) in mask.iter().enumerate() {
                for (c, &cell) in row.iter().enumerate() {
                    if cell > 0 {
                        x[(top + r) * board_cols + left + c] = 1.0;
                    }
                }
            }
            placements.push(x);
        }
    }
    Ok(placements)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(ds: &Dataset) -> Vec<i8> {
        ds.samples().iter().map(|s| i8::from(s.y())).collect()
    }

    #[test]
    fn builtin_truth_tables() {
        assert_eq!(labels(&Dataset::builtin(Builtin::Or)), vec![-1, 1, 1, 1]);
        assert_eq!(labels(&Dataset::builtin(Builtin::And)), vec![-1, -1, -1, 1]);
        assert_eq!(labels(&Dataset::builtin(Builtin::Xor)), vec![-1, 1, 1, -1]);

        let or = Dataset::named("or").unwrap();
        assert_eq!(or.sample(0).x(), &[-1.0, -1.0]);
        assert_eq!(or.grid_shape(), (1, 2));
        assert!(Dataset::named("nand").is_err());
    }

    #[test]
    fn label_conversions() {
        assert_eq!(Label::Positive.sign(), 1.0);
        assert_eq!(Label::Negative.sign(), -1.0);
        assert_eq!(Label::Negative.as_01(), 0.0);
        assert_eq!(Label::from_score(0.0), Label::Positive);
        assert_eq!(Label::from_score(-1e-12), Label::Negative);
        assert!(Label::try_from(0_i8).is_err());
        assert_eq!(Label::try_from(-1_i8).unwrap(), Label::Negative);
    }

    #[test]
    fn index_cycles() {
        let ds = Dataset::builtin(Builtin::Xor);
        assert_eq!(ds.next_index(2), 3);
        assert_eq!(ds.next_index(3), 0);
        assert_eq!(ds.sample(5), ds.sample(1));
    }

    #[test]
    fn custom_grids_flatten_row_major() {
        let samples = vec![
            GridSample {
                grid: vec![vec![1.0, -1.0], vec![-1.0, -1.0]],
                label: Label::Positive,
            },
            GridSample {
                grid: vec![vec![-1.0, -1.0], vec![-1.0, 1.0]],
                label: Label::Negative,
            },
        ];
        let ds = Dataset::from_grids(2, 2, &samples).unwrap();
        assert_eq!(ds.dim(), 4);
        assert_eq!(ds.name(), "custom");
        assert_eq!(ds.sample(1).x(), &[-1.0, -1.0, -1.0, 1.0]);
    }

    #[test]
    fn custom_grids_are_validated() {
        let ragged = vec![GridSample {
            grid: vec![vec![1.0, -1.0], vec![1.0]],
            label: Label::Positive,
        }];
        assert!(matches!(
            Dataset::from_grids(2, 2, &ragged),
            Err(Error::InvalidDataset(_))
        ));

        let bad_value = vec![GridSample {
            grid: vec![vec![0.5]],
            label: Label::Positive,
        }];
        assert!(Dataset::from_grids(1, 1, &bad_value).is_err());
        assert!(Dataset::from_grids(1, 1, &[]).is_err());
    }

    #[test]
    fn from_samples_rejects_mixed_dimensions() {
        let err = Dataset::from_samples(vec![
            Sample::new(vec![1.0, 2.0], Label::Positive),
            Sample::new(vec![1.0], Label::Negative),
        ])
        .unwrap_err();
        assert!(matches!(err, Error::InvalidDataset(_)));

        assert!(Dataset::from_samples(Vec::new()).is_err());
        assert!(Dataset::from_samples(vec![Sample::new(vec![f64::NAN], Label::Positive)]).is_err());
    }

    #[test]
    fn shape_translations_cover_every_placement() {
        let good = vec![vec![1, 1]];
        let bad = vec![vec![1], vec![1]];
        let ds = Dataset::shapes(&good, &bad, 2, 3, true).unwrap();
        // 2x2 placements of the horizontal bar, 1x3 of the vertical one.
        assert_eq!(ds.len(), 4 + 3);
        assert_eq!(ds.dim(), 6);
        assert_eq!(ds.sample(0).x(), &[1.0, 1.0, -1.0, -1.0, -1.0, -1.0]);
        assert_eq!(ds.sample(0).y(), Label::Positive);
        assert_eq!(ds.sample(4).x(), &[1.0, -1.0, -1.0, 1.0, -1.0, -1.0]);
        assert_eq!(ds.sample(4).y(), Label::Negative);

        assert!(Dataset::shapes(&good, &bad, 1, 1, true).is_err());
        assert!(Dataset::shapes(&good, &bad, 2, 3, false).is_err());
    }
}
