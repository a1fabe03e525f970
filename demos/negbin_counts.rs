//! Gibbs sampling of the latent activation of one negative-binomial neuron.
//!
//! The example:
//! 1. Simulates overdispersed spike counts from a known activation trace
//! 2. Augments them with Polya-Gamma auxiliaries
//! 3. Runs Gibbs sweeps over the activation given a linear prior
//! 4. Compares the posterior mean activation to the truth
//!
//! Run with `RUST_LOG=debug cargo run --example negbin_counts` to see the
//! sampler's log output.

use ndarray::{Array1, Array2, Axis};
use pg_counts::{DefaultRng, LinearNeuron, NegativeBinomialCounts, Resample};
use rand::SeedableRng;
use rand::distributions::Distribution;
use statrs::distribution::{Gamma, Normal, Poisson};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let mut rng = DefaultRng::seed_from_u64(42);

    // Design: intercept-free stimulus with two features per bin
    let bins = 500;
    let normal = Normal::new(0.0, 1.0)?;
    let x = Array2::from_shape_fn((bins, 2), |_| normal.sample(&mut rng));

    let neuron = LinearNeuron {
        weights: ndarray::array![0.8, -0.4],
        bias: 0.2,
        sigma: 0.25,
        xi: Some(3.0),
    };
    let xi = 3.0;

    // True activation, then counts from the gamma-Poisson mixture
    let noise = Normal::new(0.0, neuron.sigma.sqrt())?;
    let psi_true =
        x.dot(&neuron.weights) + neuron.bias + x.map_axis(Axis(1), |_| noise.sample(&mut rng));
    let gamma = Gamma::new(xi, 1.0)?;
    let mut counts = Array1::<u32>::zeros(bins);
    for (y, &psi) in counts.iter_mut().zip(&psi_true) {
        let g: f64 = gamma.sample(&mut rng);
        let poisson = Poisson::new(g * psi.exp())?;
        *y = Distribution::<f64>::sample(&poisson, &mut rng) as u32;
    }
    println!("Simulated {bins} bins, {} spikes", counts.sum());
    println!("Mean count: {:.2}", counts.mapv(f64::from).mean().unwrap_or(0.0));

    let mut nb = NegativeBinomialCounts::new(x.view(), counts, &neuron, &mut rng)?;

    let burnin = 200;
    let samples = 500;
    let mut psi_mean = Array1::<f64>::zeros(bins);
    for i in 0..burnin + samples {
        nb.resample(&neuron, &mut rng)?;
        if i >= burnin {
            psi_mean += &nb.activation();
        }
    }
    psi_mean /= samples as f64;

    let rmse = ((&psi_mean - &psi_true).mapv(|d| d * d).mean().unwrap_or(0.0)).sqrt();
    let prior_rmse = ((x.dot(&neuron.weights) + neuron.bias - &psi_true)
        .mapv(|d| d * d)
        .mean()
        .unwrap_or(0.0))
    .sqrt();
    println!("\nActivation RMSE");
    println!("  prior mean:     {prior_rmse:.4}");
    println!("  posterior mean: {rmse:.4}");
    println!(
        "Mean auxiliary after the last sweep: {:.4}",
        nb.auxiliary().mean().unwrap_or(0.0)
    );
    Ok(())
}
