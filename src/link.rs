//! Rectifying nonlinearities mapping an activation to a Poisson rate.
//!
//! Both links are evaluated in forms that cannot overflow: softplus is
//! computed through `ln_1p`, and the exponential link saturates the
//! activation at [`MAX_LOG_RATE`].

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Activations above this are treated as this value by [`Link::Exp`].
/// `e^50` is far past any spike rate, and well short of `f64` overflow.
pub const MAX_LOG_RATE: f64 = 50.0;

/// Below this, `softplus(x)` and `e^x` agree to double precision in log space.
const SOFTPLUS_LINEAR_REGIME: f64 = -30.0;

/// Link from activation to rate, `rate = f(psi)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Link {
    /// `f(x) = ln(1 + e^x)`, a smooth rectifier.
    Softplus,
    /// `f(x) = e^x`.
    Exp,
}

impl Link {
    /// `f(x)`.
    pub fn rate(self, x: f64) -> f64 {
        match self {
            Link::Softplus => softplus(x),
            Link::Exp => x.min(MAX_LOG_RATE).exp(),
        }
    }

    /// `f'(x)`.
    pub fn grad_rate(self, x: f64) -> f64 {
        match self {
            Link::Softplus => sigmoid(x),
            Link::Exp if x > MAX_LOG_RATE => 0.0,
            Link::Exp => x.exp(),
        }
    }

    /// `ln f(x)`, finite for every finite `x`.
    pub fn log_rate(self, x: f64) -> f64 {
        match self {
            Link::Softplus if x < SOFTPLUS_LINEAR_REGIME => x,
            Link::Softplus => softplus(x).ln(),
            Link::Exp => x.min(MAX_LOG_RATE),
        }
    }

    /// `f'(x) / f(x)`, the derivative of [`Link::log_rate`].
    pub fn grad_log_rate(self, x: f64) -> f64 {
        match self {
            Link::Softplus if x < SOFTPLUS_LINEAR_REGIME => 1.0,
            Link::Softplus => sigmoid(x) / softplus(x),
            Link::Exp if x > MAX_LOG_RATE => 0.0,
            Link::Exp => 1.0,
        }
    }
}

/// `ln(1 + e^x)` without overflow.
pub(crate) fn softplus(x: f64) -> f64 {
    if x > 0.0 {
        x + (-x).exp().ln_1p()
    } else {
        x.exp().ln_1p()
    }
}

/// Logistic function `1 / (1 + e^{-x})`.
pub(crate) fn sigmoid(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

/// `ln σ(x) = -softplus(-x)`.
pub(crate) fn log_sigmoid(x: f64) -> f64 {
    -softplus(-x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn softplus_matches_naive_form_in_safe_range() {
        for x in [-5.0_f64, -0.3, 0.0, 0.7, 4.0] {
            assert_relative_eq!(Link::Softplus.rate(x), (1.0 + x.exp()).ln(), epsilon = 1e-12);
            assert_relative_eq!(
                Link::Softplus.grad_rate(x),
                x.exp() / (1.0 + x.exp()),
                epsilon = 1e-12
            );
        }
    }

    #[test]
    fn softplus_is_finite_at_extremes() {
        for x in [-1e4, -800.0, 800.0, 1e4] {
            let l = Link::Softplus;
            assert!(l.rate(x).is_finite());
            assert!(l.log_rate(x).is_finite());
            assert!(l.grad_log_rate(x).is_finite());
        }
        assert_relative_eq!(Link::Softplus.log_rate(-800.0), -800.0);
        assert_relative_eq!(Link::Softplus.rate(800.0), 800.0);
    }

    #[test]
    fn exp_link_saturates() {
        let l = Link::Exp;
        assert_relative_eq!(l.rate(1.5), 1.5_f64.exp());
        assert_relative_eq!(l.grad_rate(1.5), 1.5_f64.exp());
        assert_eq!(l.rate(1e6), MAX_LOG_RATE.exp());
        assert_eq!(l.grad_rate(1e6), 0.0);
        assert_eq!(l.log_rate(1e6), MAX_LOG_RATE);
        assert!(l.rate(-1e6) >= 0.0);
    }

    #[test]
    fn grad_log_rate_is_ratio_of_derivative_and_rate() {
        for l in [Link::Softplus, Link::Exp] {
            for x in [-3.0, -0.5, 0.0, 2.0] {
                assert_relative_eq!(
                    l.grad_log_rate(x),
                    l.grad_rate(x) / l.rate(x),
                    max_relative = 1e-12
                );
            }
        }
    }

    #[test]
    fn log_sigmoid_is_stable() {
        assert_relative_eq!(log_sigmoid(0.0), -(2.0_f64.ln()));
        assert_relative_eq!(log_sigmoid(-1000.0), -1000.0);
        assert!(log_sigmoid(1000.0).abs() < 1e-300);
    }
}
