use super::PolyaGamma;
use rand::{Rng, prelude::Distribution};
use statrs::distribution::Gamma;
use std::f64::consts::FRAC_PI_2;

/// Primitive draws the Polya-Gamma routines are built from.
pub(super) trait BaseDraws<R: Rng + ?Sized> {
    fn sample_exp(&self, rng: &mut R) -> f64;
    fn sample_norm(&self, rng: &mut R) -> f64;
    fn sample_unif(&self, rng: &mut R) -> f64;
    fn sample_gamma(&self, rng: &mut R, gamma: &Gamma) -> f64;
    fn sample_trunc_inv_gauss(&self, rng: &mut R, z: f64, truncation: f64) -> f64;
}

impl<R: Rng + ?Sized> BaseDraws<R> for PolyaGamma {
    #[inline(always)]
    fn sample_exp(&self, rng: &mut R) -> f64 {
        self.exp.sample(rng)
    }

    #[inline(always)]
    fn sample_norm(&self, rng: &mut R) -> f64 {
        self.std_norm.sample(rng)
    }

    #[inline(always)]
    fn sample_unif(&self, rng: &mut R) -> f64 {
        self.unif.sample(rng)
    }

    #[inline(always)]
    fn sample_gamma(&self, rng: &mut R, gamma: &Gamma) -> f64 {
        gamma.sample(rng)
    }

    /// Inverse Gaussian IG(1/z, 1) restricted to (0, truncation].
    ///
    /// With mean `1/z` above the truncation point the chi-square proposal of
    /// `sample_small_z` is cheaper; otherwise draw untruncated
    /// inverse Gaussians and reject the ones past the bound.
    #[inline(always)]
    fn sample_trunc_inv_gauss(&self, rng: &mut R, z: f64, truncation: f64) -> f64 {
        let z = z.abs();
        if z < FRAC_PI_2 {
            self.sample_small_z(rng, z, truncation)
        } else {
            self.sample_large_z(rng, 1.0 / z, truncation)
        }
    }
}
