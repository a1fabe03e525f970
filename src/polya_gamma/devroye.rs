//! Devroye's exact sampler for PG(1, c).
//!
//! Algorithm 1 of Polson, Scott & Windle (2013): PG(1, c) is `J*(1, c/2) / 4`
//! where `J*` is a tilted Jacobi variate. Proposals come from a mixture of a
//! truncated inverse Gaussian (left of `t = 2/π`) and an exponential tail
//! (right of `t`), accepted with the alternating-series method.

use super::{PI_SQ, PolyaGamma, rng::BaseDraws};
use rand::Rng;
use statrs::distribution::ContinuousCDF;
use std::f64::consts::{FRAC_2_PI, FRAC_PI_2, PI};

/// Truncation point `t` between the two proposal pieces.
const TRUNC: f64 = FRAC_2_PI;

impl PolyaGamma {
    /// One PG(1, c) variate.
    ///
    /// # Arguments
    /// * `rng` - A mutable reference to a random number generator
    /// * `c` - The tilt parameter; only `|c|` matters
    ///
    /// # Returns
    /// A random variate from the PG(1, c) distribution
    pub(super) fn sample_polya_gamma_devroye<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        c: f64,
    ) -> f64 {
        let z = c.abs() * 0.5;
        let k = 0.125 * PI_SQ + 0.5 * z * z;
        let p_tail = self.exponential_tail_mass(z);

        loop {
            let x = if self.sample_unif(rng) < p_tail {
                TRUNC + self.sample_exp(rng) / k
            } else {
                self.sample_trunc_inv_gauss(rng, z, TRUNC)
            };

            // Alternating series: partial sums bracket the target density.
            let mut s = jacobi_coefficient(0, x);
            let y = self.sample_unif(rng) * s;
            let mut n = 0;
            loop {
                n += 1;
                let a_n = jacobi_coefficient(n, x);
                if n % 2 == 1 {
                    s -= a_n;
                    if y <= s {
                        return 0.25 * x;
                    }
                } else {
                    s += a_n;
                    if y > s {
                        break;
                    }
                }
            }
        }
    }

    /// Probability of drawing from the exponential piece, `p / (p + q)`.
    ///
    /// # Arguments
    /// * `z` - Half the absolute tilt, `|c| / 2`
    ///
    /// # Returns
    /// The mixture weight of the exponential tail, between 0 and 1
    fn exponential_tail_mass(&self, z: f64) -> f64 {
        let k = 0.125 * PI_SQ + 0.5 * z * z;
        let b = FRAC_PI_2.sqrt() * (TRUNC * z - 1.0);
        let a = -FRAC_PI_2.sqrt() * (TRUNC * z + 1.0);

        let log_pk = k.ln() + k * TRUNC;
        // ln Φ(a) heads to -inf for large z; exp() then gives the correct 0.
        let log_q_hi = log_pk - z + self.std_norm.cdf(b).ln();
        let log_q_lo = log_pk + z + self.std_norm.cdf(a).ln();

        let ratio = (4.0 / PI) * (log_q_hi.exp() + log_q_lo.exp());
        1.0 / (1.0 + ratio)
    }

    /// Chi-square proposal for small `z`: `X = t / (1 + t E)²`, accepted with
    /// probability `exp(-z² X / 2)`.
    ///
    /// # Arguments
    /// * `rng` - Random number generator
    /// * `z` - Half the absolute tilt
    /// * `t` - The upper truncation point
    ///
    /// # Returns
    /// A draw from IG(1/z, 1) restricted to (0, t]
    pub(super) fn sample_small_z<R: Rng + ?Sized>(&self, rng: &mut R, z: f64, t: f64) -> f64 {
        let mut alpha = 0.0;
        let mut x = 0.0;
        while alpha < self.sample_unif(rng) {
            let e = loop {
                let e1 = self.sample_exp(rng);
                let e2 = self.sample_exp(rng);
                if e1 * e1 <= 2.0 * e2 / t {
                    break e1;
                }
            };
            x = 1.0 + e * t;
            x = t / (x * x);
            alpha = (-0.5 * z * z * x).exp();
        }
        x
    }

    /// Inverse Gaussian with mean `mu` and unit shape, rejected until `X <= t`.
    ///
    /// # Arguments
    /// * `rng` - Random number generator
    /// * `mu` - The mean of the inverse Gaussian, `1/z`
    /// * `t` - The upper truncation point
    ///
    /// # Returns
    /// A draw from IG(mu, 1) restricted to (0, t]
    pub(super) fn sample_large_z<R: Rng + ?Sized>(&self, rng: &mut R, mu: f64, t: f64) -> f64 {
        let mut x = f64::INFINITY;
        while x > t {
            let y = self.sample_norm(rng);
            let muy = mu * y * y;
            x = mu + 0.5 * mu * muy - 0.5 * mu * (4.0 * muy + muy * muy).sqrt();
            if self.sample_unif(rng) > mu / (mu + x) {
                x = mu * mu / x;
            }
        }
        x
    }
}

/// n-th term `a_n(x)` of the Jacobi density series, piecewise around `t`:
///
/// - `x <= t`: `π k (2 / (π x))^{3/2} exp(-2 k² / x)`
/// - `x > t`:  `π k exp(-k² π² x / 2)`
///
/// with `k = n + 1/2`.
fn jacobi_coefficient(n: usize, x: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    let k = n as f64 + 0.5;
    if x <= TRUNC {
        PI * k * (FRAC_2_PI / x).powf(1.5) * (-2.0 * k * k / x).exp()
    } else {
        PI * k * (-0.5 * k * k * PI_SQ * x).exp()
    }
}
