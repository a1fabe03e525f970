//! Hamiltonian Monte Carlo over a factorized target.
//!
//! The Poisson activation posterior is a product of independent
//! one-dimensional densities, one per time bin, so a leapfrog trajectory over
//! the whole activation vector is really `T` decoupled trajectories run in
//! lock step. [`transition`] integrates them together and then applies the
//! configured [`AcceptanceRule`].

use crate::error::{CountsError, Result};
use ndarray::{Array1, ArrayView1, Zip};
use rand::Rng;
use rand::distributions::Distribution;
use statrs::distribution::Normal;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A log density that is a sum of per-coordinate terms.
pub trait FactorizedTarget {
    /// `log p_t(x_t)` for every coordinate; the joint log density is the sum.
    fn log_density_terms(&self, x: ArrayView1<'_, f64>) -> Array1<f64>;

    /// `d log p_t / d x_t` for every coordinate.
    fn grad_log_density(&self, x: ArrayView1<'_, f64>) -> Array1<f64>;
}

/// How the end of a trajectory is accepted or rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum AcceptanceRule {
    /// Coordinate `t` is kept iff `ln u_t <= ΔU_t + ΔK_t`, using only that
    /// coordinate's potential and kinetic energy. Exact for factorized targets.
    #[default]
    PerCoordinate,
    /// One Metropolis test on the summed energies; the whole trajectory is kept
    /// or the whole state reverts.
    Joint,
    /// Coordinate `t` is kept iff `ln u_t <= Σ ΔU + Σ K_curr - K_prop,t`.
    ///
    /// Mixes a joint potential difference with a per-coordinate kinetic term.
    /// This does not leave the target invariant; it exists to reproduce chains
    /// produced with that rule.
    SummedPotential,
}

/// Fixed HMC tuning.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HmcConfig {
    /// Leapfrog steps per trajectory.
    pub n_steps: usize,
    /// Leapfrog step size.
    pub step_size: f64,
    pub acceptance: AcceptanceRule,
}

impl Default for HmcConfig {
    fn default() -> Self {
        Self {
            n_steps: 3,
            step_size: 0.1,
            acceptance: AcceptanceRule::PerCoordinate,
        }
    }
}

impl HmcConfig {
    pub fn new(n_steps: usize, step_size: f64) -> Self {
        Self {
            n_steps,
            step_size,
            ..Self::default()
        }
    }

    pub fn with_acceptance(mut self, acceptance: AcceptanceRule) -> Self {
        self.acceptance = acceptance;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.n_steps == 0 {
            return Err(CountsError::InvalidConfig(
                "HMC needs at least one leapfrog step".to_string(),
            ));
        }
        if !(self.step_size.is_finite() && self.step_size > 0.0) {
            return Err(CountsError::InvalidConfig(format!(
                "HMC step size must be finite and positive, got {}",
                self.step_size
            )));
        }
        Ok(())
    }
}

/// Running acceptance counts, one proposal per coordinate per trajectory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HmcStats {
    pub proposals: u64,
    pub accepted: u64,
    /// Coordinates whose trajectory ended at a non-finite position or energy.
    pub divergent: u64,
}

impl HmcStats {
    /// Fraction of coordinate proposals accepted so far, `None` before the first.
    pub fn acceptance_rate(&self) -> Option<f64> {
        (self.proposals > 0).then(|| self.accepted as f64 / self.proposals as f64)
    }

    pub(crate) fn record(&mut self, transition: &Transition) {
        self.proposals += transition.position.len() as u64;
        self.accepted += transition.accepted as u64;
        self.divergent += transition.divergent as u64;
    }
}

/// Outcome of one trajectory.
#[derive(Debug, Clone)]
pub struct Transition {
    /// New state: proposal where accepted, the starting point elsewhere.
    pub position: Array1<f64>,
    pub accepted: usize,
    pub divergent: usize,
}

/// Run one leapfrog trajectory from `current` and accept or reject it.
///
/// Momentum is drawn fresh from `N(0, I)`. The integrator makes a half
/// momentum step, then `n_steps` position steps each followed by a momentum
/// step (full, except a half step at the end), and finally negates the
/// momentum. Coordinates that end non-finite are always rejected.
///
/// `config` is assumed valid; see [`HmcConfig::validate`].
pub fn transition<T, R>(
    target: &T,
    current: ArrayView1<'_, f64>,
    config: &HmcConfig,
    rng: &mut R,
) -> Transition
where
    T: FactorizedTarget + ?Sized,
    R: Rng + ?Sized,
{
    let eps = config.step_size;
    let std_norm = Normal::standard();
    let p0: Array1<f64> = (0..current.len()).map(|_| std_norm.sample(rng)).collect();

    let mut x = current.to_owned();
    let mut p = p0.clone();
    p.scaled_add(0.5 * eps, &target.grad_log_density(x.view()));
    for step in 0..config.n_steps {
        x.scaled_add(eps, &p);
        let g = target.grad_log_density(x.view());
        let scale = if step + 1 < config.n_steps { eps } else { 0.5 * eps };
        p.scaled_add(scale, &g);
    }
    p.mapv_inplace(|v| -v);

    let energies = Energies {
        u_curr: target.log_density_terms(current).mapv(|l| -l),
        u_prop: target.log_density_terms(x.view()).mapv(|l| -l),
        k_curr: p0.mapv(|v| 0.5 * v * v),
        k_prop: p.mapv(|v| 0.5 * v * v),
    };
    let finite = Zip::from(&x)
        .and(&energies.u_prop)
        .and(&p)
        .map_collect(|&xi, &u, &pi| xi.is_finite() && u.is_finite() && pi.is_finite());
    let divergent = finite.iter().filter(|ok| !**ok).count();
    let keep = config.acceptance.decide(&energies, &finite, rng);

    let mut accepted = 0;
    for (t, &ok) in keep.iter().enumerate() {
        if ok {
            accepted += 1;
        } else {
            x[t] = current[t];
        }
    }

    Transition {
        position: x,
        accepted,
        divergent,
    }
}

/// Potential and kinetic energy per coordinate at both ends of a trajectory.
struct Energies {
    u_curr: Array1<f64>,
    u_prop: Array1<f64>,
    k_curr: Array1<f64>,
    k_prop: Array1<f64>,
}

impl AcceptanceRule {
    /// Which coordinates keep their proposal. `finite[t]` is false where the
    /// trajectory diverged.
    fn decide<R: Rng + ?Sized>(
        self,
        e: &Energies,
        finite: &Array1<bool>,
        rng: &mut R,
    ) -> Vec<bool> {
        let n = finite.len();
        let all_finite = finite.iter().all(|&ok| ok);
        match self {
            AcceptanceRule::PerCoordinate => (0..n)
                .map(|t| {
                    let delta = (e.u_curr[t] - e.u_prop[t]) + (e.k_curr[t] - e.k_prop[t]);
                    let log_u = rng.r#gen::<f64>().ln();
                    finite[t] && log_u <= delta
                })
                .collect(),
            AcceptanceRule::Joint => {
                let delta =
                    (e.u_curr.sum() - e.u_prop.sum()) + (e.k_curr.sum() - e.k_prop.sum());
                let log_u = rng.r#gen::<f64>().ln();
                vec![all_finite && log_u <= delta; n]
            }
            AcceptanceRule::SummedPotential => {
                let du = e.u_curr.sum() - e.u_prop.sum();
                let kc = e.k_curr.sum();
                (0..n)
                    .map(|t| {
                        let log_u = rng.r#gen::<f64>().ln();
                        all_finite && log_u <= du + kc - e.k_prop[t]
                    })
                    .collect()
            }
        }
    }
}
