use thiserror::Error;

/// Errors reported by the training engine and the boundary extractor.
///
/// Every variant is reported synchronously to the immediate caller. Nothing is
/// retried internally.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// An input vector does not match the parameter vector it is combined with.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// Empty dataset, or samples that do not share one shape.
    #[error("invalid dataset: {0}")]
    InvalidDataset(String),

    /// A hyperparameter or grid setting outside its valid range.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// A wire snapshot that could not be encoded or decoded, or has an
    /// unsupported format version.
    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Fails with `DimensionMismatch` unless `got == expected`.
#[inline]
pub(crate) fn check_dim(expected: usize, got: usize) -> Result<()> {
    if expected != got {
        return Err(Error::DimensionMismatch { expected, got });
    }
    Ok(())
}

/// Learning rates must be finite and strictly positive.
pub(crate) fn check_lr(lr: f64) -> Result<()> {
    if !(lr.is_finite() && lr > 0.0) {
        return Err(Error::InvalidConfig(format!(
            "learning rate must be finite and > 0, got {lr}"
        )));
    }
    Ok(())
}

/// Sampling grids need at least two steps per axis.
pub(crate) fn check_steps(steps: usize) -> Result<()> {
    if steps < 2 {
        return Err(Error::InvalidConfig(format!(
            "grid steps must be >= 2, got {steps}"
        )));
    }
    Ok(())
}
