use criterion::{Criterion, black_box, criterion_group, criterion_main};
use ndarray::{Array1, Array2};
use pg_counts::population::resample_population;
use pg_counts::{AugmentedCounts, DefaultRng, LinearNeuron, ObservationKind, Resample};
use rand::SeedableRng;

const BINS: usize = 2_000;

fn spikes() -> Array1<u32> {
    (0..BINS).map(|t| ((t * 7919) % 5) as u32 % 2).collect()
}

fn bench_single_unit(c: &mut Criterion) {
    let x = Array2::zeros((BINS, 1));
    let neuron = LinearNeuron::constant(1, -0.5, 1.0).with_xi(2.0);
    let mut rng = DefaultRng::seed_from_u64(7);
    for kind in [
        ObservationKind::NegativeBinomial,
        ObservationKind::Bernoulli,
        ObservationKind::PoissonSoftplus,
        ObservationKind::PoissonExp,
    ] {
        let mut unit = AugmentedCounts::new(kind, x.view(), spikes(), &neuron, &mut rng).unwrap();
        c.bench_function(&format!("resample_{kind:?}_{BINS}"), |bencher| {
            bencher.iter(|| {
                unit.resample(&neuron, &mut rng).unwrap();
                black_box(unit.activation()[0]);
            });
        });
    }
}

fn bench_population(c: &mut Criterion) {
    let x = Array2::zeros((BINS, 1));
    let neurons: Vec<_> = (0..16)
        .map(|i| LinearNeuron::constant(1, -1.0 + 0.1 * i as f64, 1.0).with_xi(2.0))
        .collect();
    let mut rng = DefaultRng::seed_from_u64(11);
    let mut units: Vec<_> = neurons
        .iter()
        .map(|n| {
            AugmentedCounts::new(ObservationKind::NegativeBinomial, x.view(), spikes(), n, &mut rng)
                .unwrap()
        })
        .collect();

    c.bench_function("population_serial_16", |bencher| {
        bencher.iter(|| resample_population(&mut units, &neurons, &mut rng).unwrap());
    });

    #[cfg(feature = "rayon")]
    c.bench_function("population_par_16", |bencher| {
        bencher.iter(|| {
            pg_counts::population::resample_population_par(&mut units, &neurons, &mut rng).unwrap()
        });
    });
}

criterion_group!(benches, bench_single_unit, bench_population);
criterion_main!(benches);
