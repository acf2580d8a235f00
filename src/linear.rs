//! The weight vector + bias shared by the perceptron and LMS rules.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use rand::Rng;

use crate::contour::LinearField;
use crate::error::check_dim;
use crate::vector::{dot_unchecked, scaled};
use crate::{Error, Result};

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "LinearUnitParts"))]
#[derive(Debug, Clone, PartialEq)]
pub struct LinearUnit {
    w: Vec<f64>,
    b: f64,
}

/// Unvalidated unit fields, used when decoding.
#[cfg_attr(feature = "serde", derive(Deserialize))]
#[derive(Debug, Clone)]
pub struct LinearUnitParts {
    pub w: Vec<f64>,
    pub b: f64,
}

impl TryFrom<LinearUnitParts> for LinearUnit {
    type Error = Error;

    fn try_from(parts: LinearUnitParts) -> Result<Self> {
        Self::from_parts(parts.w, parts.b)
    }
}

impl LinearUnit {
    pub fn zeros(dim: usize) -> Result<Self> {
        if dim == 0 {
            return Err(Error::InvalidConfig("input dim must be > 0".to_owned()));
        }
        Ok(Self {
            w: vec![0.0; dim],
            b: 0.0,
        })
    }

    /// Weights and bias drawn uniformly from `[-0.5, 0.5)`.
    pub fn random<R: Rng + ?Sized>(dim: usize, rng: &mut R) -> Result<Self> {
        let mut unit = Self::zeros(dim)?;
        for w in &mut unit.w {
            *w = rng.gen_range(-0.5..0.5);
        }
        unit.b = rng.gen_range(-0.5..0.5);
        Ok(unit)
    }

    pub fn from_parts(w: Vec<f64>, b: f64) -> Result<Self> {
        let unit = Self { w, b };
        unit.validate()?;
        Ok(unit)
    }

    /// Non-empty, all finite.
    pub fn validate(&self) -> Result<()> {
        if self.w.is_empty() {
            return Err(Error::InvalidConfig("input dim must be > 0".to_owned()));
        }
        if !(self.b.is_finite() && self.w.iter().all(|v| v.is_finite())) {
            return Err(Error::InvalidConfig("parameters must be finite".to_owned()));
        }
        Ok(())
    }

    #[inline]
    pub fn w(&self) -> &[f64] {
        &self.w
    }

    #[inline]
    pub fn b(&self) -> f64 {
        self.b
    }

    #[inline]
    pub fn dim(&self) -> usize {
        self.w.len()
    }

    /// `dot(w, x) + b`.
    #[inline]
    pub fn score(&self, x: &[f64]) -> Result<f64> {
        check_dim(self.w.len(), x.len())?;
        Ok(dot_unchecked(&self.w, x) + self.b)
    }

    /// `w <- w + scale * x`, `b <- b + scale`. Returns the applied deltas.
    pub(crate) fn nudge(&mut self, scale: f64, x: &[f64]) -> (Vec<f64>, f64) {
        debug_assert_eq!(x.len(), self.w.len());

        let delta_w = scaled(scale, x);
        for (w, d) in self.w.iter_mut().zip(&delta_w) {
            *w += d;
        }
        self.b += scale;
        (delta_w, scale)
    }

    /// The 2D boundary field; inputs must be two dimensional.
    pub fn field(&self) -> Result<LinearField> {
        LinearField::from_weights(&self.w, self.b)
    }
}
