//! Per-sample loss functions.
//!
//! Labels enter as `f64`: `±1` for the perceptron / LMS losses and `{0, 1}` for
//! cross-entropy (see [`crate::Label::as_01`]).

/// Probabilities are clamped into `[BCE_EPS, 1 - BCE_EPS]` before taking logs.
pub const BCE_EPS: f64 = 1e-12;

/// Perceptron criterion: `max(0, -y * score)`.
#[inline]
pub fn perceptron_loss(y: f64, score: f64) -> f64 {
    (-y * score).max(0.0)
}

/// Half squared error: `0.5 * (y - y_hat)^2`.
#[inline]
pub fn squared_error(y: f64, y_hat: f64) -> f64 {
    let diff = y - y_hat;
    0.5 * diff * diff
}

/// Gradient of [`squared_error`] w.r.t. `y_hat`.
#[inline]
pub fn squared_error_grad(y: f64, y_hat: f64) -> f64 {
    y_hat - y
}

/// Binary cross-entropy for a target in `{0, 1}` and a predicted probability.
///
/// `p_hat` is clamped away from 0 and 1, so the result is always finite.
#[inline]
pub fn binary_cross_entropy(y01: f64, p_hat: f64) -> f64 {
    let p = p_hat.clamp(BCE_EPS, 1.0 - BCE_EPS);
    -(y01 * p.ln() + (1.0 - y01) * (1.0 - p).ln())
}

/// Gradient of sigmoid + BCE w.r.t. the logit: `p_hat - y01`.
#[inline]
pub fn bce_grad_wrt_logit(p_hat: f64, y01: f64) -> f64 {
    p_hat - y01
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perceptron_loss_is_zero_when_correct() {
        assert_eq!(perceptron_loss(1.0, 2.0), 0.0);
        assert_eq!(perceptron_loss(-1.0, 2.0), 2.0);
        assert_eq!(perceptron_loss(-1.0, 0.0), 0.0);
    }

    #[test]
    fn squared_error_and_grad() {
        assert_eq!(squared_error(1.0, 0.0), 0.5);
        assert_eq!(squared_error_grad(1.0, 0.0), -1.0);
    }

    #[test]
    fn bce_is_finite_at_the_extremes() {
        assert!(binary_cross_entropy(1.0, 0.0).is_finite());
        assert!(binary_cross_entropy(0.0, 1.0).is_finite());
        assert!(binary_cross_entropy(1.0, 0.0) > 20.0);
        assert!((binary_cross_entropy(1.0, 0.5) - 2.0_f64.ln()).abs() < 1e-12);
        assert!(binary_cross_entropy(1.0, 1.0) < 1e-9);
    }

    #[test]
    fn bce_logit_gradient_matches_finite_difference() {
        let z = 0.3_f64;
        let y = 1.0;
        let eps = 1e-6;
        let f = |z: f64| binary_cross_entropy(y, crate::activation::sigmoid(z));
        let numeric = (f(z + eps) - f(z - eps)) / (2.0 * eps);
        let analytic = bce_grad_wrt_logit(crate::activation::sigmoid(z), y);
        assert!((numeric - analytic).abs() < 1e-6);
    }
}
