//! Linear-nonlinear-Poisson counts, resampled with HMC.
//!
//! # Model
//! - yₜ | ψₜ ∼ Poisson(f(ψₜ)) for a rectifying [`Link`] f
//! - ψₜ ∼ N(μₜ, sigma)
//!
//! No augmentation makes this conjugate, so each sweep moves the activation
//! with one [`hmc::transition`] over the factorized posterior.

use super::Resample;
use super::series::CountSeries;
use crate::error::Result;
use crate::hmc::{self, FactorizedTarget, HmcConfig, HmcStats};
use crate::link::Link;
use crate::model::{ActivationPrior, ParentModel};
use ndarray::{Array1, ArrayView1, ArrayView2, Zip};
use rand::Rng;
use rand::distributions::Distribution;
use statrs::distribution::Poisson;

/// Poisson spike counts of one neuron with their latent activation.
///
/// # Example
/// ```rust
/// # use ndarray::{array, Array2};
/// # use rand::SeedableRng;
/// # use rand::rngs::StdRng;
/// use pg_counts::{HmcConfig, Link, LinearNeuron, PoissonCounts, Resample};
///
/// let design = Array2::<f64>::zeros((1, 1));
/// let neuron = LinearNeuron::constant(1, 0.0, 1.0);
/// let mut counts = PoissonCounts::new(
///     design.view(),
///     array![2],
///     &neuron,
///     Link::Exp,
///     HmcConfig::new(3, 0.01),
/// )
/// .unwrap();
/// counts.resample(&neuron, &mut StdRng::seed_from_u64(0)).unwrap();
/// assert!(counts.activation()[0].is_finite());
/// ```
#[derive(Debug, Clone)]
pub struct PoissonCounts<'a> {
    series: CountSeries<'a>,
    psi: Array1<f64>,
    link: Link,
    config: HmcConfig,
    stats: HmcStats,
}

impl<'a> PoissonCounts<'a> {
    /// Pair `counts` with their `design` rows; the activation starts at the
    /// prior mean.
    ///
    /// # Errors
    /// Empty or mismatched series, invalid `sigma`, or an invalid `config`.
    pub fn new<M: ParentModel + ?Sized>(
        design: ArrayView2<'a, f64>,
        counts: Array1<u32>,
        model: &M,
        link: Link,
        config: HmcConfig,
    ) -> Result<Self> {
        config.validate()?;
        let series = CountSeries::new(design, counts)?;
        let prior = ActivationPrior::read(model, series.design(), series.len())?;
        Ok(Self {
            series,
            psi: prior.mean,
            link,
            config,
            stats: HmcStats::default(),
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

    pub fn link(&self) -> Link {
        self.link
    }

    pub fn config(&self) -> &HmcConfig {
        &self.config
    }

    /// Acceptance counts over every sweep so far.
    pub fn stats(&self) -> HmcStats {
        self.stats
    }

    pub fn acceptance_rate(&self) -> Option<f64> {
        self.stats.acceptance_rate()
    }

    /// `Σₜ yₜ ln f(xₜ) − f(xₜ)`, without the `−ln yₜ!` constant.
    pub fn log_likelihood(&self, x: ArrayView1<'_, f64>) -> Result<f64> {
        self.series.check_activation(x)?;
        Ok(self.likelihood_terms(x).sum())
    }

    /// Gradient of [`PoissonCounts::log_likelihood`]: `yₜ f'/f − f'`.
    pub fn grad_log_likelihood(&self, x: ArrayView1<'_, f64>) -> Result<Array1<f64>> {
        self.series.check_activation(x)?;
        let link = self.link;
        Ok(Zip::from(&self.series.counts())
            .and(x)
            .map_collect(|&y, &psi| f64::from(y) * link.grad_log_rate(psi) - link.grad_rate(psi)))
    }

    /// Log likelihood plus the Gaussian prior `−(x − μ)² / (2 sigma)`.
    pub fn log_posterior<M: ParentModel + ?Sized>(
        &self,
        model: &M,
        x: ArrayView1<'_, f64>,
    ) -> Result<f64> {
        self.series.check_activation(x)?;
        let prior = ActivationPrior::read(model, self.series.design(), self.len())?;
        Ok(self.target(&prior).log_density_terms(x).sum())
    }

    pub fn grad_log_posterior<M: ParentModel + ?Sized>(
        &self,
        model: &M,
        x: ArrayView1<'_, f64>,
    ) -> Result<Array1<f64>> {
        self.series.check_activation(x)?;
        let prior = ActivationPrior::read(model, self.series.design(), self.len())?;
        Ok(self.target(&prior).grad_log_density(x))
    }

    /// Redraw each count from `Poisson(f(ψₜ))`.
    ///
    /// Counts are stored as `u32`, so a draw past `u32::MAX` (a rate of
    /// order 1e9 or more) is clamped there and reported with a warning.
    pub fn geweke_resample_counts<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<()> {
        let link = self.link;
        let mut clipped = 0usize;
        let counts = self.psi.mapv(|psi| {
            let draw = match Poisson::new(link.rate(psi)) {
                Ok(d) => Distribution::<f64>::sample(&d, rng),
                // only a zero rate is rejected, and Poisson(0) is always 0
                Err(_) => 0.0,
            };
            if draw > f64::from(u32::MAX) {
                clipped += 1;
                u32::MAX
            } else {
                draw as u32
            }
        });
        if clipped > 0 {
            log::warn!("{clipped} Geweke count draws exceeded u32::MAX and were clamped");
        }
        self.series.set_counts(counts);
        Ok(())
    }

    fn likelihood_terms(&self, x: ArrayView1<'_, f64>) -> Array1<f64> {
        let link = self.link;
        Zip::from(&self.series.counts())
            .and(x)
            .map_collect(|&y, &psi| f64::from(y) * link.log_rate(psi) - link.rate(psi))
    }

    fn target<'s>(&'s self, prior: &'s ActivationPrior) -> ActivationPosterior<'s, 'a> {
        ActivationPosterior {
            counts: self,
            prior,
        }
    }
}

impl Resample for PoissonCounts<'_> {
    /// One HMC trajectory over the whole activation vector.
    fn resample<M, R>(&mut self, model: &M, rng: &mut R) -> Result<()>
    where
        M: ParentModel + ?Sized,
        R: Rng + ?Sized,
    {
        let prior = ActivationPrior::read(model, self.series.design(), self.len())?;
        let step = hmc::transition(&self.target(&prior), self.psi.view(), &self.config, rng);

        if step.divergent > 0 {
            log::warn!(
                "{} of {} HMC trajectories diverged (step size {}); \
                 those bins keep their activation",
                step.divergent,
                self.len(),
                self.config.step_size
            );
        }
        log::debug!(
            "HMC sweep over {} bins accepted {} ({:?} rule)",
            self.len(),
            step.accepted,
            self.config.acceptance
        );

        self.stats.record(&step);
        self.psi = step.position;
        Ok(())
    }
}

/// Per-bin activation posterior of a [`PoissonCounts`] under a fixed prior.
struct ActivationPosterior<'s, 'a> {
    counts: &'s PoissonCounts<'a>,
    prior: &'s ActivationPrior,
}

impl FactorizedTarget for ActivationPosterior<'_, '_> {
    fn log_density_terms(&self, x: ArrayView1<'_, f64>) -> Array1<f64> {
        let half_prec = 0.5 / self.prior.sigma;
        let mut terms = self.counts.likelihood_terms(x);
        Zip::from(&mut terms)
            .and(x)
            .and(&self.prior.mean)
            .for_each(|l, &psi, &mu| *l -= half_prec * (psi - mu) * (psi - mu));
        terms
    }

    fn grad_log_density(&self, x: ArrayView1<'_, f64>) -> Array1<f64> {
        let link = self.counts.link;
        let prec = 1.0 / self.prior.sigma;
        Zip::from(&self.counts.series.counts())
            .and(x)
            .and(&self.prior.mean)
            .map_collect(|&y, &psi, &mu| {
                f64::from(y) * link.grad_log_rate(psi) - link.grad_rate(psi) - prec * (psi - mu)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CountsError;
    use crate::model::LinearNeuron;
    use approx::assert_relative_eq;
    use ndarray::{Array2, array};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn single_bin() -> (Array2<f64>, LinearNeuron, Array1<u32>) {
        (
            Array2::zeros((1, 1)),
            LinearNeuron::constant(1, 0.0, 1.0),
            array![2],
        )
    }

    #[test]
    fn rejects_invalid_config() {
        let (x, neuron, y) = single_bin();
        assert!(matches!(
            PoissonCounts::new(x.view(), y, &neuron, Link::Exp, HmcConfig::new(0, 0.1)),
            Err(CountsError::InvalidConfig(_))
        ));
    }

    #[test]
    fn starts_at_prior_mean() {
        let x = Array2::zeros((3, 1));
        let neuron = LinearNeuron::constant(1, -0.7, 1.0);
        let p = PoissonCounts::new(
            x.view(),
            array![0, 1, 4],
            &neuron,
            Link::Softplus,
            HmcConfig::default(),
        )
        .unwrap();
        assert_eq!(p.activation(), array![-0.7, -0.7, -0.7].view());
    }

    #[test]
    fn gradient_matches_finite_differences() {
        let x = Array2::zeros((3, 1));
        let neuron = LinearNeuron::constant(1, 0.2, 0.5);
        for link in [Link::Softplus, Link::Exp] {
            let p =
                PoissonCounts::new(x.view(), array![0, 1, 4], &neuron, link, HmcConfig::default())
                    .unwrap();
            let at = array![-1.0, 0.3, 1.1];
            let grad = p.grad_log_posterior(&neuron, at.view()).unwrap();
            let h = 1e-6;
            for t in 0..3 {
                let mut up = at.clone();
                let mut down = at.clone();
                up[t] += h;
                down[t] -= h;
                let fd = (p.log_posterior(&neuron, up.view()).unwrap()
                    - p.log_posterior(&neuron, down.view()).unwrap())
                    / (2.0 * h);
                assert_relative_eq!(grad[t], fd, max_relative = 1e-5);
            }
        }
    }

    #[test]
    fn likelihood_terms_use_the_link() {
        let x = Array2::zeros((2, 1));
        let neuron = LinearNeuron::constant(1, 0.0, 1.0);
        let p = PoissonCounts::new(x.view(), array![2, 0], &neuron, Link::Exp, HmcConfig::default())
            .unwrap();
        let ll = p.log_likelihood(array![0.5, -1.0].view()).unwrap();
        assert_relative_eq!(ll, (2.0 * 0.5 - 0.5_f64.exp()) - (-1.0_f64).exp());
        let g = p.grad_log_likelihood(array![0.5, -1.0].view()).unwrap();
        assert_relative_eq!(g[0], 2.0 - 0.5_f64.exp());
        assert_relative_eq!(g[1], -(-1.0_f64).exp());
    }

    #[test]
    fn tame_single_bin_stays_finite() {
        let (x, neuron, y) = single_bin();
        let mut p =
            PoissonCounts::new(x.view(), y, &neuron, Link::Exp, HmcConfig::new(3, 0.01)).unwrap();
        let mut rng = StdRng::seed_from_u64(21);
        for _ in 0..100 {
            p.resample(&neuron, &mut rng).unwrap();
            assert!(p.activation()[0].is_finite());
            assert_eq!(p.counts(), array![2].view());
        }
        assert_eq!(p.stats().proposals, 100);
        assert!(p.acceptance_rate().unwrap() > 0.9);
    }

    #[test]
    fn geweke_counts_saturate_at_u32_max() {
        // exp(30) is about 1e13, far past what a u32 count can hold
        let x = Array2::zeros((2, 1));
        let neuron = LinearNeuron::constant(1, 30.0, 1.0);
        let mut p =
            PoissonCounts::new(x.view(), array![0, 0], &neuron, Link::Exp, HmcConfig::default())
                .unwrap();
        let mut rng = StdRng::seed_from_u64(8);
        p.geweke_resample_counts(&mut rng).unwrap();
        assert_eq!(p.counts(), array![u32::MAX, u32::MAX].view());

        // moderate rates are untouched
        let neuron = LinearNeuron::constant(1, 1.0, 1.0);
        let mut p =
            PoissonCounts::new(x.view(), array![0, 0], &neuron, Link::Exp, HmcConfig::default())
                .unwrap();
        p.geweke_resample_counts(&mut rng).unwrap();
        assert!(p.counts().iter().all(|&y| y < 100));
    }

    #[test]
    fn extreme_activation_does_not_overflow() {
        let x = Array2::zeros((2, 1));
        let neuron = LinearNeuron::constant(1, 400.0, 1.0);
        let mut p =
            PoissonCounts::new(x.view(), array![0, 3], &neuron, Link::Exp, HmcConfig::new(5, 0.5))
                .unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        assert!(p.log_likelihood(p.activation()).unwrap().is_finite());
        p.resample(&neuron, &mut rng).unwrap();
        assert!(p.activation().iter().all(|v| v.is_finite()));
    }
}
