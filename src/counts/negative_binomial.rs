//! Negative-binomial counts with Polya-Gamma augmentation.
//!
//! # Model
//! - yₜ | ψₜ, ξ ∼ NB(ξ, σ(ψₜ)),
//!   i.e. `p(y) ∝ Γ(y+ξ)/y! · σ(ψ)^y (1−σ(ψ))^ξ`
//! - ψₜ ∼ N(μₜ, sigma), with μ from the parent's `mean_activation`
//! - ωₜ | yₜ, ψₜ ∼ PG(yₜ + ξ, ψₜ)
//!
//! Given ω the activation is Gaussian with `κₜ = (yₜ − ξ)/2`, see
//! [`ConjugatePosterior`].

use super::conjugate::ConjugatePosterior;
use super::series::CountSeries;
use super::{Resample, initial_polya_gamma_state};
use crate::categorical::sample_log_weights_along;
use crate::error::{CountsError, Result};
use crate::link::log_sigmoid;
use crate::model::{ActivationPrior, ParentModel, dispersion};
use crate::polya_gamma::PolyaGamma;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis, Zip};
use rand::Rng;
use statrs::function::gamma::ln_gamma;

/// Counts enumerated by [`NegativeBinomialCounts::geweke_resample_counts`].
pub const DEFAULT_GEWEKE_TRUNCATION: usize = 100;

/// Negative-binomial spike counts of one neuron with their latent activation
/// and Polya-Gamma auxiliaries.
///
/// # Example
/// ```rust
/// # use ndarray::{array, Array2};
/// # use rand::SeedableRng;
/// # use rand::rngs::StdRng;
/// use pg_counts::{LinearNeuron, NegativeBinomialCounts, Resample};
///
/// let design = Array2::<f64>::zeros((5, 1));
/// let neuron = LinearNeuron::constant(1, 0.0, 1.0).with_xi(1.0);
/// let mut rng = StdRng::seed_from_u64(0);
///
/// let mut counts =
///     NegativeBinomialCounts::new(design.view(), array![0, 1, 2, 0, 3], &neuron, &mut rng)
///         .unwrap();
/// counts.resample(&neuron, &mut rng).unwrap();
/// assert!(counts.auxiliary().iter().all(|&w| w > 0.0));
/// ```
#[derive(Debug, Clone)]
pub struct NegativeBinomialCounts<'a> {
    series: CountSeries<'a>,
    /// Latent activation, one per bin
    psi: Array1<f64>,
    /// Polya-Gamma auxiliaries, one per bin
    omega: Array1<f64>,
    pg: PolyaGamma,
}

impl<'a> NegativeBinomialCounts<'a> {
    /// Pair `counts` with their `design` rows and draw an initial state from
    /// the parent's prior.
    ///
    /// # Errors
    /// Empty or mismatched series, or an invalid `sigma`. `xi` is read on the
    /// first [`Resample::resample`].
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
    /// After a [`Resample::resample`] this is the law the activation was drawn from.
    pub fn activation_conditional<M: ParentModel + ?Sized>(
        &self,
        model: &M,
    ) -> Result<ConjugatePosterior> {
        let xi = dispersion(model)?;
        let prior = ActivationPrior::read(model, self.series.design(), self.len())?;
        Ok(ConjugatePosterior::new(
            &prior,
            self.omega.view(),
            self.kappa(xi).view(),
        ))
    }

    /// `Σₜ ln NB(yₜ; ξ, σ(xₜ))`, normalized.
    pub fn log_likelihood<M: ParentModel + ?Sized>(
        &self,
        model: &M,
        x: ArrayView1<'_, f64>,
    ) -> Result<f64> {
        self.series.check_activation(x)?;
        let xi = dispersion(model)?;
        let ln_gamma_xi = ln_gamma(xi);
        Ok(Zip::from(&self.series.counts())
            .and(x)
            .fold(0.0, |acc, &y, &psi| {
                let y = f64::from(y);
                acc + ln_gamma(y + xi) - ln_gamma_xi - ln_gamma(y + 1.0)
                    + y * log_sigmoid(psi)
                    + xi * log_sigmoid(-psi)
            }))
    }

    /// Redraw every count from `p(y | ξ, ψ)` over `y ∈ [0, DEFAULT_GEWEKE_TRUNCATION)`.
    pub fn geweke_resample_counts<M, R>(&mut self, model: &M, rng: &mut R) -> Result<()>
    where
        M: ParentModel + ?Sized,
        R: Rng + ?Sized,
    {
        self.geweke_resample_counts_truncated(model, DEFAULT_GEWEKE_TRUNCATION, rng)
    }

    /// Redraw every count from `p(y | ξ, ψ)` restricted to `y ∈ [0, trunc)`.
    ///
    /// The conditional is enumerated exactly in log space,
    /// `ln p(y) = ln Γ(y+ξ) − ln y! + y ln σ(ψ) + const`, and one category is
    /// drawn per bin.
    pub fn geweke_resample_counts_truncated<M, R>(
        &mut self,
        model: &M,
        trunc: usize,
        rng: &mut R,
    ) -> Result<()>
    where
        M: ParentModel + ?Sized,
        R: Rng + ?Sized,
    {
        if trunc == 0 {
            return Err(CountsError::InvalidConfig(
                "Geweke truncation must be at least 1".to_string(),
            ));
        }
        let xi = dispersion(model)?;
        let log_p = Array2::from_shape_fn((trunc, self.len()), |(y, t)| {
            let y = y as f64;
            ln_gamma(y + xi) - ln_gamma(y + 1.0) + y * log_sigmoid(self.psi[t])
        });
        let draws = sample_log_weights_along(rng, log_p.view(), Axis(0))?;
        let clipped = draws.iter().filter(|&&y| y + 1 == trunc).count();
        if clipped > 0 {
            log::warn!(
                "{clipped} Geweke count draws landed on the truncation bound {}; raise it",
                trunc - 1
            );
        }
        self.series
            .set_counts(draws.into_iter().map(|y| y as u32).collect());
        Ok(())
    }

    fn kappa(&self, xi: f64) -> Array1<f64> {
        self.series.counts_f64().mapv(|y| 0.5 * (y - xi))
    }
}

impl Resample for NegativeBinomialCounts<'_> {
    /// Draw `ω ~ PG(y + ξ, ψ)`, then `ψ | ω` from its Gaussian conditional.
    fn resample<M, R>(&mut self, model: &M, rng: &mut R) -> Result<()>
    where
        M: ParentModel + ?Sized,
        R: Rng + ?Sized,
    {
        let xi = dispersion(model)?;
        let prior = ActivationPrior::read(model, self.series.design(), self.len())?;

        let shapes: Vec<f64> = self.series.counts().iter().map(|&y| f64::from(y) + xi).collect();
        self.omega = self.pg.draw_vec(rng, &shapes, &self.psi.to_vec())?;

        let posterior = ConjugatePosterior::new(&prior, self.omega.view(), self.kappa(xi).view());
        self.psi = posterior.draw(rng);
        Ok(())
    }
}
