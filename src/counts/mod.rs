//! Count observations with latent activations, resampled by Gibbs sweeps.
//!
//! Each variant holds one neuron's counts, the design rows they line up with,
//! and the latent activation `psi` (one real per time bin). A call to
//! [`Resample::resample`] updates the latent state given the parent's prior:
//!
//! - [`NegativeBinomialCounts`] and [`BernoulliCounts`] draw Polya-Gamma
//!   auxiliaries `omega` and then `psi` from its Gaussian conditional.
//! - [`PoissonCounts`] has no auxiliaries and moves `psi` with one HMC
//!   trajectory per sweep.
//!
//! [`AugmentedCounts`] wraps the three in a closed enum for callers that
//! hold a mixed population.

use crate::error::{CountsError, Result};
use crate::hmc::{HmcConfig, HmcStats};
use crate::link::Link;
use crate::model::{ActivationPrior, ParentModel};
use crate::polya_gamma::PolyaGamma;
use ndarray::{Array1, ArrayView1, ArrayView2};
use rand::Rng;
use rand::distributions::Distribution;
use statrs::distribution::Normal;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub use bernoulli::BernoulliCounts;
pub use conjugate::{ConjugatePosterior, posterior_variance};
pub use negative_binomial::{DEFAULT_GEWEKE_TRUNCATION, NegativeBinomialCounts};
pub use poisson::PoissonCounts;

mod bernoulli;
mod conjugate;
mod negative_binomial;
mod poisson;
mod series;

/// One Gibbs update of the latent state given the parent model.
pub trait Resample {
    /// Update auxiliaries and activation in place. Counts are never touched.
    fn resample<M, R>(&mut self, model: &M, rng: &mut R) -> Result<()>
    where
        M: ParentModel + ?Sized,
        R: Rng + ?Sized;
}

/// Observation model of an [`AugmentedCounts`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ObservationKind {
    NegativeBinomial,
    Bernoulli,
    PoissonSoftplus,
    PoissonExp,
}

impl ObservationKind {
    /// The rate nonlinearity, for the Poisson kinds.
    pub fn link(self) -> Option<Link> {
        match self {
            ObservationKind::PoissonSoftplus => Some(Link::Softplus),
            ObservationKind::PoissonExp => Some(Link::Exp),
            ObservationKind::NegativeBinomial | ObservationKind::Bernoulli => None,
        }
    }
}

/// Any of the augmented count models.
#[derive(Debug, Clone)]
pub enum AugmentedCounts<'a> {
    NegativeBinomial(NegativeBinomialCounts<'a>),
    Bernoulli(BernoulliCounts<'a>),
    Poisson(PoissonCounts<'a>),
}

impl<'a> AugmentedCounts<'a> {
    /// Build the variant for `kind`. Poisson kinds get [`HmcConfig::default`];
    /// build a [`PoissonCounts`] directly for other tuning.
    pub fn new<M, R>(
        kind: ObservationKind,
        design: ArrayView2<'a, f64>,
        counts: Array1<u32>,
        model: &M,
        rng: &mut R,
    ) -> Result<Self>
    where
        M: ParentModel + ?Sized,
        R: Rng + ?Sized,
    {
        Ok(match kind {
            ObservationKind::NegativeBinomial => {
                NegativeBinomialCounts::new(design, counts, model, rng)?.into()
            }
            ObservationKind::Bernoulli => BernoulliCounts::new(design, counts, model, rng)?.into(),
            ObservationKind::PoissonSoftplus => {
                PoissonCounts::new(design, counts, model, Link::Softplus, HmcConfig::default())?
                    .into()
            }
            ObservationKind::PoissonExp => {
                PoissonCounts::new(design, counts, model, Link::Exp, HmcConfig::default())?.into()
            }
        })
    }

    pub fn kind(&self) -> ObservationKind {
        match self {
            AugmentedCounts::NegativeBinomial(_) => ObservationKind::NegativeBinomial,
            AugmentedCounts::Bernoulli(_) => ObservationKind::Bernoulli,
            AugmentedCounts::Poisson(p) => match p.link() {
                Link::Softplus => ObservationKind::PoissonSoftplus,
                Link::Exp => ObservationKind::PoissonExp,
            },
        }
    }

    /// Number of time bins.
    pub fn len(&self) -> usize {
        match self {
            AugmentedCounts::NegativeBinomial(c) => c.len(),
            AugmentedCounts::Bernoulli(c) => c.len(),
            AugmentedCounts::Poisson(c) => c.len(),
        }
    }

    /// Always false: empty series are rejected at construction.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn counts(&self) -> ArrayView1<'_, u32> {
        match self {
            AugmentedCounts::NegativeBinomial(c) => c.counts(),
            AugmentedCounts::Bernoulli(c) => c.counts(),
            AugmentedCounts::Poisson(c) => c.counts(),
        }
    }

    pub fn design(&self) -> ArrayView2<'a, f64> {
        match self {
            AugmentedCounts::NegativeBinomial(c) => c.design(),
            AugmentedCounts::Bernoulli(c) => c.design(),
            AugmentedCounts::Poisson(c) => c.design(),
        }
    }

    /// Current latent activation `psi`.
    pub fn activation(&self) -> ArrayView1<'_, f64> {
        match self {
            AugmentedCounts::NegativeBinomial(c) => c.activation(),
            AugmentedCounts::Bernoulli(c) => c.activation(),
            AugmentedCounts::Poisson(c) => c.activation(),
        }
    }

    /// Current Polya-Gamma auxiliaries; `None` for Poisson counts.
    pub fn auxiliary(&self) -> Option<ArrayView1<'_, f64>> {
        match self {
            AugmentedCounts::NegativeBinomial(c) => Some(c.auxiliary()),
            AugmentedCounts::Bernoulli(c) => Some(c.auxiliary()),
            AugmentedCounts::Poisson(_) => None,
        }
    }

    /// HMC acceptance counts; `None` for the Polya-Gamma variants.
    pub fn hmc_stats(&self) -> Option<HmcStats> {
        match self {
            AugmentedCounts::Poisson(c) => Some(c.stats()),
            _ => None,
        }
    }

    /// Log likelihood of the counts at activation `x`.
    pub fn log_likelihood<M: ParentModel + ?Sized>(
        &self,
        model: &M,
        x: ArrayView1<'_, f64>,
    ) -> Result<f64> {
        match self {
            AugmentedCounts::NegativeBinomial(c) => c.log_likelihood(model, x),
            AugmentedCounts::Bernoulli(c) => c.log_likelihood(x),
            AugmentedCounts::Poisson(c) => c.log_likelihood(x),
        }
    }

    /// Rate `f(x)` of the Poisson link.
    pub fn rate(&self, x: f64) -> Result<f64> {
        match self {
            AugmentedCounts::Poisson(c) => Ok(c.link().rate(x)),
            _ => Err(CountsError::Unsupported("rate")),
        }
    }

    /// Derivative `f'(x)` of the Poisson link.
    pub fn grad_rate(&self, x: f64) -> Result<f64> {
        match self {
            AugmentedCounts::Poisson(c) => Ok(c.link().grad_rate(x)),
            _ => Err(CountsError::Unsupported("grad_rate")),
        }
    }

    /// Fresh observations cannot be drawn from an augmented series; they only
    /// exist conditioned on the parent model. Always an error.
    pub fn rvs(&self, _size: usize) -> Result<Array1<u32>> {
        Err(CountsError::Unsupported("rvs"))
    }

    /// Redraw the counts from `p(counts | psi)`. Only for Geweke-style
    /// validation of the joint sampler; never part of inference.
    pub fn geweke_resample_counts<M, R>(&mut self, model: &M, rng: &mut R) -> Result<()>
    where
        M: ParentModel + ?Sized,
        R: Rng + ?Sized,
    {
        match self {
            AugmentedCounts::NegativeBinomial(c) => c.geweke_resample_counts(model, rng),
            AugmentedCounts::Bernoulli(c) => c.geweke_resample_counts(rng),
            AugmentedCounts::Poisson(c) => c.geweke_resample_counts(rng),
        }
    }
}

impl Resample for AugmentedCounts<'_> {
    fn resample<M, R>(&mut self, model: &M, rng: &mut R) -> Result<()>
    where
        M: ParentModel + ?Sized,
        R: Rng + ?Sized,
    {
        match self {
            AugmentedCounts::NegativeBinomial(c) => c.resample(model, rng),
            AugmentedCounts::Bernoulli(c) => c.resample(model, rng),
            AugmentedCounts::Poisson(c) => c.resample(model, rng),
        }
    }
}

impl<'a> From<NegativeBinomialCounts<'a>> for AugmentedCounts<'a> {
    fn from(c: NegativeBinomialCounts<'a>) -> Self {
        AugmentedCounts::NegativeBinomial(c)
    }
}

impl<'a> From<BernoulliCounts<'a>> for AugmentedCounts<'a> {
    fn from(c: BernoulliCounts<'a>) -> Self {
        AugmentedCounts::Bernoulli(c)
    }
}

impl<'a> From<PoissonCounts<'a>> for AugmentedCounts<'a> {
    fn from(c: PoissonCounts<'a>) -> Self {
        AugmentedCounts::Poisson(c)
    }
}

/// Starting state of the Polya-Gamma variants: `psi` drawn from the prior,
/// `omega ~ PG(1, psi)`.
fn initial_polya_gamma_state<R: Rng + ?Sized>(
    pg: &PolyaGamma,
    prior: &ActivationPrior,
    rng: &mut R,
) -> Result<(Array1<f64>, Array1<f64>)> {
    let std_norm = Normal::standard();
    let sd = prior.sigma.sqrt();
    let psi = prior.mean.mapv(|mu| mu + sd * std_norm.sample(rng));
    let omega = pg.draw_vec(rng, &vec![1.0; psi.len()], &psi.to_vec())?;
    Ok((psi, omega))
}
