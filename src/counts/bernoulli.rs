//! Binary observations (logistic regression) with Polya-Gamma augmentation.
//!
//! # Model
//! - yₜ | ψₜ ∼ Bernoulli(σ(ψₜ))
//! - ψₜ ∼ N(μₜ, sigma)
//! - ωₜ | ψₜ ∼ PG(1, ψₜ)
//!
//! Given ω the activation is Gaussian with `κₜ = yₜ − 1/2`.

use super::conjugate::ConjugatePosterior;
use super::series::CountSeries;
use super::{Resample, initial_polya_gamma_state};
use crate::categorical::sample_log_weights;
use crate::error::{CountsError, Result};
use crate::link::log_sigmoid;
use crate::model::{ActivationPrior, ParentModel};
use crate::polya_gamma::PolyaGamma;
use ndarray::{Array1, ArrayView1, ArrayView2, Zip};
use rand::Rng;

/// Binary spike indicators of one neuron with their latent activation and
/// Polya-Gamma auxiliaries.
#[derive(Debug, Clone)]
pub struct BernoulliCounts<'a> {
    series: CountSeries<'a>,
    psi: Array1<f64>,
    omega: Array1<f64>,
    pg: PolyaGamma,
}

impl<'a> BernoulliCounts<'a> {
    /// # Errors
    /// As [`super::NegativeBinomialCounts::new`], plus
    /// [`CountsError::NonBinaryCount`] for any count above 1.
    pub fn new<M, R>(
        design: ArrayView2<'a, f64>,
        counts: Array1<u32>,
        model: &M,
        rng: &mut R,
    ) -> Result<Self>
    where
        M: ParentModel + ?Sized,
        R: Rng + ?Sized,
    {
        if let Some((index, &value)) = counts.iter().enumerate().find(|&(_, &y)| y > 1) {
            return Err(CountsError::NonBinaryCount { index, value });
        }
        let series = CountSeries::new(design, counts)?;
        let prior = ActivationPrior::read(model, series.design(), series.len())?;
        let pg = PolyaGamma::new();
        let (psi, omega) = initial_polya_gamma_state(&pg, &prior, rng)?;
        Ok(Self {
            series,
            psi,
            omega,
            pg,
        })
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.len() == 0
    }

    pub fn counts(&self) -> ArrayView1<'_, u32> {
        self.series.counts()
    }

    pub fn design(&self) -> ArrayView2<'a, f64> {
        self.series.design()
    }

    pub fn activation(&self) -> ArrayView1<'_, f64> {
        self.psi.view()
    }

    pub fn auxiliary(&self) -> ArrayView1<'_, f64> {
        self.omega.view()
    }

    /// Gaussian conditional of the activation given the current auxiliaries.
    pub fn activation_conditional<M: ParentModel + ?Sized>(
        &self,
        model: &M,
    ) -> Result<ConjugatePosterior> {
        let prior = ActivationPrior::read(model, self.series.design(), self.len())?;
        Ok(ConjugatePosterior::new(
            &prior,
            self.omega.view(),
            self.kappa().view(),
        ))
    }

    /// `Σₜ yₜ ln σ(xₜ) + (1 − yₜ) ln σ(−xₜ)`.
    pub fn log_likelihood(&self, x: ArrayView1<'_, f64>) -> Result<f64> {
        self.series.check_activation(x)?;
        Ok(Zip::from(&self.series.counts())
            .and(x)
            .fold(0.0, |acc, &y, &psi| {
                acc + if y == 1 {
                    log_sigmoid(psi)
                } else {
                    log_sigmoid(-psi)
                }
            }))
    }

    /// Redraw each indicator from `p(y | ψ) ∝ exp((y − 1/2) ψ)`, `y ∈ {0, 1}`.
    pub fn geweke_resample_counts<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<()> {
        let mut counts = Array1::zeros(self.len());
        for (y, &psi) in counts.iter_mut().zip(&self.psi) {
            *y = sample_log_weights(rng, &[-0.5 * psi, 0.5 * psi])? as u32;
        }
        self.series.set_counts(counts);
        Ok(())
    }

    fn kappa(&self) -> Array1<f64> {
        self.series.counts_f64().mapv(|y| y - 0.5)
    }
}

impl Resample for BernoulliCounts<'_> {
    /// Draw `ω ~ PG(1, ψ)`, then `ψ | ω` from its Gaussian conditional.
    fn resample<M, R>(&mut self, model: &M, rng: &mut R) -> Result<()>
    where
        M: ParentModel + ?Sized,
        R: Rng + ?Sized,
    {
        self.omega = self
            .pg
            .draw_vec(rng, &vec![1.0; self.len()], &self.psi.to_vec())?;

        let prior = ActivationPrior::read(model, self.series.design(), self.len())?;
        let posterior = ConjugatePosterior::new(&prior, self.omega.view(), self.kappa().view());
        self.psi = posterior.draw(rng);
        Ok(())
    }
}
