//! Small dense-vector helpers shared by every model.
//!
//! The checked variants return `DimensionMismatch` instead of truncating or
//! padding. Callers that have already validated shapes can use the `_unchecked`
//! forms, which only `debug_assert!` the contract.

use crate::error::{Result, check_dim};

/// `sum_i a[i] * b[i]`.
#[inline]
pub fn dot(a: &[f64], b: &[f64]) -> Result<f64> {
    check_dim(a.len(), b.len())?;
    Ok(dot_unchecked(a, b))
}

#[inline]
pub(crate) fn dot_unchecked(a: &[f64], b: &[f64]) -> f64 {
    debug_assert_eq!(a.len(), b.len());

    let mut sum = 0.0_f64;
    for (&x, &y) in a.iter().zip(b) {
        sum = x.mul_add(y, sum);
    }
    sum
}

/// `y <- y + alpha * x`, in place.
#[inline]
pub fn axpy(alpha: f64, x: &[f64], y: &mut [f64]) -> Result<()> {
    check_dim(y.len(), x.len())?;
    for (yi, &xi) in y.iter_mut().zip(x) {
        *yi = alpha.mul_add(xi, *yi);
    }
    Ok(())
}

/// Returns `alpha * x` as a new vector.
#[inline]
pub fn scaled(alpha: f64, x: &[f64]) -> Vec<f64> {
    x.iter().map(|&v| alpha * v).collect()
}

/// Element-wise `a + b`.
pub fn add(a: &[f64], b: &[f64]) -> Result<Vec<f64>> {
    check_dim(a.len(), b.len())?;
    Ok(a.iter().zip(b).map(|(&x, &y)| x + y).collect())
}

/// Element-wise `a - b`.
pub fn sub(a: &[f64], b: &[f64]) -> Result<Vec<f64>> {
    check_dim(a.len(), b.len())?;
    Ok(a.iter().zip(b).map(|(&x, &y)| x - y).collect())
}

/// Sum of absolute values.
#[inline]
pub fn l1_norm(x: &[f64]) -> f64 {
    x.iter().map(|v| v.abs()).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn dot_of_matching_vectors() {
        assert_eq!(dot(&[1.0, 2.0, 3.0], &[4.0, -5.0, 6.0]).unwrap(), 12.0);
        assert_eq!(dot(&[], &[]).unwrap(), 0.0);
    }

    #[test]
    fn dot_rejects_length_mismatch() {
        let err = dot(&[1.0, 2.0], &[1.0]).unwrap_err();
        assert_eq!(
            err,
            Error::DimensionMismatch {
                expected: 2,
                got: 1
            }
        );
    }

    #[test]
    fn axpy_accumulates_in_place() {
        let mut y = vec![1.0, 1.0];
        axpy(0.5, &[2.0, -4.0], &mut y).unwrap();
        assert_eq!(y, vec![2.0, -1.0]);

        assert!(axpy(1.0, &[1.0, 2.0, 3.0], &mut y).is_err());
        // Untouched on failure.
        assert_eq!(y, vec![2.0, -1.0]);
    }

    #[test]
    fn add_sub_scale() {
        assert_eq!(add(&[1.0, 2.0], &[3.0, 4.0]).unwrap(), vec![4.0, 6.0]);
        assert_eq!(sub(&[1.0, 2.0], &[3.0, 4.0]).unwrap(), vec![-2.0, -2.0]);
        assert_eq!(scaled(-2.0, &[1.0, 0.5]), vec![-2.0, -1.0]);
        assert_eq!(l1_norm(&[-1.0, 2.0, -0.5]), 3.5);
        assert!(sub(&[1.0], &[]).is_err());
    }
}
