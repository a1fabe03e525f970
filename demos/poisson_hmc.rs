//! HMC updates for Poisson neurons with softplus and exponential links.
//!
//! Simulates counts from a slowly varying activation, then runs the HMC
//! sweep under each link and acceptance rule and reports acceptance rates.
//! Set `RUST_LOG=debug` to see per-sweep acceptance counts.

use ndarray::{Array1, Array2};
use pg_counts::{AcceptanceRule, DefaultRng, HmcConfig, Link, LinearNeuron, PoissonCounts, Resample};
use rand::SeedableRng;
use rand::distributions::Distribution;
use statrs::distribution::Poisson;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let mut rng = DefaultRng::seed_from_u64(7);

    let bins = 1_000;
    let x = Array2::<f64>::zeros((bins, 1));
    let neuron = LinearNeuron::constant(1, 0.5, 0.5);

    let psi_true: Array1<f64> = (0..bins)
        .map(|t| 0.5 + (t as f64 / 50.0).sin())
        .collect();

    for link in [Link::Softplus, Link::Exp] {
        let mut counts = Array1::<u32>::zeros(bins);
        for (y, &psi) in counts.iter_mut().zip(&psi_true) {
            let poisson = Poisson::new(link.rate(psi))?;
            *y = Distribution::<f64>::sample(&poisson, &mut rng) as u32;
        }

        for rule in [
            AcceptanceRule::PerCoordinate,
            AcceptanceRule::Joint,
            AcceptanceRule::SummedPotential,
        ] {
            let config = HmcConfig::new(10, 0.1).with_acceptance(rule);
            let mut p = PoissonCounts::new(x.view(), counts.clone(), &neuron, link, config)?;
            let mut psi_mean = Array1::<f64>::zeros(bins);
            let (burnin, samples) = (200, 300);
            for i in 0..burnin + samples {
                p.resample(&neuron, &mut rng)?;
                if i >= burnin {
                    psi_mean += &p.activation();
                }
            }
            psi_mean /= samples as f64;
            let rmse = (&psi_mean - &psi_true)
                .mapv(|d| d * d)
                .mean()
                .unwrap_or(0.0)
                .sqrt();
            println!(
                "{link:?} / {rule:?}: acceptance {:.3}, divergent {}, activation RMSE {rmse:.4}",
                p.acceptance_rate().unwrap_or(0.0),
                p.stats().divergent
            );
        }
    }
    Ok(())
}
