//! Geweke joint-distribution tests.
//!
//! Alternating `resample` (activation | counts) with `geweke_resample_counts`
//! (counts | activation) is a Gibbs sampler on the joint prior, so the
//! activation must keep the prior marginal N(mu, sigma). With a constant
//! prior mean every bin is an independent chain, and the bins at the end of
//! the run are an iid sample of that marginal.

use ndarray::{Array1, Array2};
use pg_counts::{
    AugmentedCounts, HmcConfig, Link, LinearNeuron, ObservationKind, PoissonCounts, Resample,
};
use rand::SeedableRng;
use rand::rngs::StdRng;

fn assert_prior_marginal(psi: &Array1<f64>, mu: f64, sigma: f64, what: &str) {
    let n = psi.len() as f64;
    let mean = psi.mean().unwrap();
    let var = psi.var(1.0);
    // about five standard errors on both moments
    let mean_tol = 5.0 * (sigma / n).sqrt();
    let var_tol = 5.0 * sigma * (2.0 / n).sqrt();
    assert!(
        (mean - mu).abs() < mean_tol,
        "{what}: activation mean {mean:.4}, prior mean {mu}"
    );
    assert!(
        (var - sigma).abs() < var_tol,
        "{what}: activation variance {var:.4}, prior variance {sigma}"
    );
}

fn run_geweke(
    mut counts: AugmentedCounts<'_>,
    neuron: &LinearNeuron,
    iters: usize,
    seed: u64,
) -> Array1<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    for _ in 0..iters {
        counts.geweke_resample_counts(neuron, &mut rng).unwrap();
        counts.resample(neuron, &mut rng).unwrap();
    }
    counts.activation().to_owned()
}

#[test]
fn negative_binomial_recovers_prior() {
    let _ = env_logger::builder().is_test(true).try_init();
    let bins = 1_000;
    let x = Array2::zeros((bins, 1));
    let neuron = LinearNeuron::constant(1, -0.5, 1.0).with_xi(2.0);
    let mut rng = StdRng::seed_from_u64(1);
    let counts = AugmentedCounts::new(
        ObservationKind::NegativeBinomial,
        x.view(),
        Array1::zeros(bins),
        &neuron,
        &mut rng,
    )
    .unwrap();
    let psi = run_geweke(counts, &neuron, 60, 2);
    assert_prior_marginal(&psi, -0.5, 1.0, "negative binomial");
}

#[test]
fn bernoulli_recovers_prior() {
    let bins = 2_000;
    let x = Array2::zeros((bins, 1));
    let neuron = LinearNeuron::constant(1, 0.3, 2.0);
    let mut rng = StdRng::seed_from_u64(3);
    let counts = AugmentedCounts::new(
        ObservationKind::Bernoulli,
        x.view(),
        Array1::zeros(bins),
        &neuron,
        &mut rng,
    )
    .unwrap();
    let psi = run_geweke(counts, &neuron, 60, 4);
    assert_prior_marginal(&psi, 0.3, 2.0, "bernoulli");
}

#[test]
fn poisson_hmc_recovers_prior() {
    let _ = env_logger::builder().is_test(true).try_init();
    let bins = 1_000;
    let x = Array2::zeros((bins, 1));
    for link in [Link::Softplus, Link::Exp] {
        let neuron = LinearNeuron::constant(1, 0.5, 1.0);
        let counts = PoissonCounts::new(
            x.view(),
            Array1::zeros(bins),
            &neuron,
            link,
            HmcConfig::new(12, 0.15),
        )
        .unwrap();
        let psi = run_geweke(counts.into(), &neuron, 300, 5);
        assert_prior_marginal(&psi, 0.5, 1.0, &format!("poisson {link:?}"));
    }
}
