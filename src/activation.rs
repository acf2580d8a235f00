//! Activation functions.
//!
//! The perceptron thresholds its score with `Sign`; the MLP uses `Tanh` on the
//! hidden layer and `Sigmoid` on the output unit. Derivatives are expressed in
//! terms of the cached post-activation output `y`, which is what the step
//! records keep around for display anyway.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Element-wise activation function.
pub enum Activation {
    /// Hard threshold onto {-1, +1}; `0` maps to `+1`.
    Sign,
    Tanh,
    Sigmoid,
}

impl Activation {
    #[inline]
    pub fn forward(self, x: f64) -> f64 {
        match self {
            Activation::Sign => sign(x),
            Activation::Tanh => x.tanh(),
            Activation::Sigmoid => sigmoid(x),
        }
    }

    /// Derivative of the activation with respect to its input, expressed in terms
    /// of the cached post-activation output `y`.
    ///
    /// `Sign` is treated as having zero gradient everywhere.
    #[inline]
    pub fn grad_from_output(self, y: f64) -> f64 {
        match self {
            Activation::Sign => 0.0,
            Activation::Tanh => 1.0 - y * y,
            Activation::Sigmoid => y * (1.0 - y),
        }
    }
}

/// `+1` for `x >= 0`, `-1` otherwise.
#[inline]
pub fn sign(x: f64) -> f64 {
    if x >= 0.0 { 1.0 } else { -1.0 }
}

/// Logistic sigmoid.
#[inline]
pub fn sigmoid(x: f64) -> f64 {
    // Numerically stable sigmoid.
    if x >= 0.0 {
        let z = (-x).exp();
        1.0 / (1.0 + z)
    } else {
        let z = x.exp();
        z / (1.0 + z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_counts_zero_as_positive() {
        assert_eq!(Activation::Sign.forward(0.0), 1.0);
        assert_eq!(Activation::Sign.forward(-1e-12), -1.0);
        assert_eq!(Activation::Sign.forward(3.0), 1.0);
    }

    #[test]
    fn sigmoid_basic_values() {
        let y0 = Activation::Sigmoid.forward(0.0);
        assert!((y0 - 0.5).abs() < 1e-12);

        let y_pos = Activation::Sigmoid.forward(10.0);
        let y_neg = Activation::Sigmoid.forward(-10.0);
        assert!(y_pos > 0.9999);
        assert!(y_neg < 0.0001);

        // No overflow for large magnitudes.
        assert_eq!(sigmoid(-1000.0), 0.0);
        assert_eq!(sigmoid(1000.0), 1.0);
    }

    #[test]
    fn tanh_and_sigmoid_gradients_from_output() {
        let y_tanh = Activation::Tanh.forward(0.3);
        let g_tanh = Activation::Tanh.grad_from_output(y_tanh);
        assert!((g_tanh - (1.0 - y_tanh * y_tanh)).abs() < 1e-12);

        let y_sig = Activation::Sigmoid.forward(0.0);
        let g_sig = Activation::Sigmoid.grad_from_output(y_sig);
        assert!((g_sig - 0.25).abs() < 1e-12);
    }
}
