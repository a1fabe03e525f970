//! Gaussian update of the activation once the Polya-Gamma auxiliaries are known.
//!
//! Given `omega`, the augmented likelihood of bin `t` is proportional to
//! `exp(kappa_t psi_t - omega_t psi_t² / 2)`. With the prior
//! `psi_t ~ N(mu_t, sigma)` the conditional is Gaussian with
//!
//! ```text
//! var_t  = 1 / (1/sigma + omega_t)
//! mean_t = var_t (kappa_t + mu_t / sigma)
//! ```
//!
//! `kappa_t` is `(y_t - xi)/2` for negative-binomial counts and `y_t - 1/2`
//! for Bernoulli ones.

use crate::model::ActivationPrior;
use ndarray::{Array1, ArrayView1, Zip};
use rand::Rng;
use rand::distributions::Distribution;
use statrs::distribution::Normal;

/// Per-bin Gaussian conditional of the activation.
#[derive(Debug, Clone, PartialEq)]
pub struct ConjugatePosterior {
    pub mean: Array1<f64>,
    pub variance: Array1<f64>,
}

impl ConjugatePosterior {
    pub(crate) fn new(
        prior: &ActivationPrior,
        omega: ArrayView1<'_, f64>,
        kappa: ArrayView1<'_, f64>,
    ) -> Self {
        let variance = posterior_variance(prior.sigma, omega);
        let mut mean = Array1::zeros(variance.len());
        Zip::from(&mut mean)
            .and(&variance)
            .and(kappa)
            .and(&prior.mean)
            .for_each(|m, &v, &k, &mu| *m = v * (k + mu / prior.sigma));
        Self { mean, variance }
    }

    /// One independent draw per bin.
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> Array1<f64> {
        let std_norm = Normal::standard();
        Zip::from(&self.mean)
            .and(&self.variance)
            .map_collect(|&m, &v| m + v.sqrt() * std_norm.sample(rng))
    }
}

/// `1 / (1/sigma + omega_t)`. Strictly positive for `sigma > 0`, `omega_t >= 0`.
pub fn posterior_variance(sigma: f64, omega: ArrayView1<'_, f64>) -> Array1<f64> {
    let precision = 1.0 / sigma;
    omega.mapv(|w| 1.0 / (precision + w))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn matches_closed_form() {
        let prior = ActivationPrior {
            mean: array![0.0, 1.0],
            sigma: 2.0,
        };
        let post =
            ConjugatePosterior::new(&prior, array![0.5, 1.5].view(), array![1.0, -0.5].view());
        assert_relative_eq!(post.variance[0], 1.0);
        assert_relative_eq!(post.variance[1], 0.5);
        assert_relative_eq!(post.mean[0], 1.0);
        assert_relative_eq!(post.mean[1], 0.0);
    }

    #[test]
    fn draws_have_posterior_moments() {
        let n = 20_000;
        let prior = ActivationPrior {
            mean: Array1::from_elem(n, 1.0),
            sigma: 1.0,
        };
        let omega = Array1::from_elem(n, 3.0);
        let kappa = Array1::from_elem(n, 1.0);
        let post = ConjugatePosterior::new(&prior, omega.view(), kappa.view());
        let x = post.draw(&mut StdRng::seed_from_u64(1));
        let mean = x.mean().unwrap();
        let var = x.var(1.0);
        assert!((mean - 0.5).abs() < 0.01, "mean {mean}");
        assert!((var - 0.25).abs() < 0.01, "var {var}");
    }

    proptest! {
        #[test]
        fn posterior_variance_is_positive(
            sigma in 1e-6f64..1e6,
            omega in proptest::collection::vec(0.0f64..1e6, 1..64),
        ) {
            let v = posterior_variance(sigma, ArrayView1::from(&omega[..]));
            prop_assert!(v.iter().all(|&s| s > 0.0 && s <= sigma * (1.0 + 1e-12)));
        }
    }
}
