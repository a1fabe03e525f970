//! Polya-Gamma random variates PG(b, c).
//!
//! The augmented-counts models need one auxiliary draw per time bin, with a
//! shape that changes from bin to bin (`counts[t] + xi` for the negative
//! binomial model). [`PolyaGamma`] therefore takes the shape per draw rather
//! than fixing it at construction.
//!
//! - b = 1: Devroye's exact sampler (Polson, Scott & Windle, 2013).
//! - integer b: sum of b independent PG(1, c) variates.
//! - non-integer b: the integer part as above plus a PG(frac(b), c) variate
//!   from the truncated sum-of-gammas representation, with the expected
//!   remainder of the series added back.
//!
//! See Windle, Polson & Scott (2014), *Sampling Pólya-Gamma random variates:
//! alternate and approximate techniques*, arXiv:1405.0506.

use crate::error::{CountsError, Result};
use ndarray::Array1;
use rand::Rng;
use statrs::distribution::{Exp, Gamma, Normal, Uniform};
use std::f64::consts::PI;

#[cfg(feature = "rayon")]
use rand::SeedableRng;
#[cfg(feature = "rayon")]
use rayon::prelude::*;

use rng::BaseDraws;

mod devroye;
mod rng;

const PI_SQ: f64 = PI * PI;
const PI2_SQ_RECIP: f64 = 1.0 / (2.0 * PI_SQ);

/// Stop adding gamma terms once the expected size of the next one drops below this.
const SERIES_TOL: f64 = 1e-5;

/// Chunk length for parallel draws; each chunk gets its own seed.
#[cfg(feature = "rayon")]
const PAR_CHUNK: usize = 32;

/// Polya-Gamma sampler.
///
/// Holds the fixed proposal distributions used by the Devroye sampler. The
/// shape `b` and tilt `c` are supplied with every draw.
///
/// # Example
/// ```rust
/// # use rand::SeedableRng;
/// # use rand::rngs::StdRng;
/// use pg_counts::PolyaGamma;
/// let pg = PolyaGamma::new();
/// let mut rng = StdRng::seed_from_u64(0);
/// let omega = pg.draw(&mut rng, 3.5, -1.2);
/// assert!(omega > 0.0);
/// ```
#[derive(Debug, Clone)]
pub struct PolyaGamma {
    exp: Exp,
    std_norm: Normal,
    unif: Uniform,
}

impl Default for PolyaGamma {
    fn default() -> Self {
        Self::new()
    }
}

impl PolyaGamma {
    /// Create a sampler. The shape and tilt are passed to each draw, so one
    /// sampler serves every bin of a series.
    pub fn new() -> Self {
        Self {
            exp: Exp::new(1.0).expect("Exp(1) is always valid"),
            std_norm: Normal::standard(),
            unif: Uniform::standard(),
        }
    }

    /// Draw a single PG(b, c) variate.
    ///
    /// # Arguments
    /// * `rng` - A mutable reference to a random number generator
    /// * `b` - The shape parameter; integer parts use Devroye's exact sampler
    /// * `c` - The tilt parameter, of either sign
    ///
    /// # Returns
    /// A positive random variate from PG(b, c)
    ///
    /// # Panics
    /// Panics if `b` is not finite and positive. Use [`PolyaGamma::draw_vec`]
    /// for validated input.
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R, b: f64, c: f64) -> f64 {
        assert!(
            b.is_finite() && b > 0.0,
            "Shape parameter b must be finite and positive"
        );
        self.draw_internal(rng, b, c)
    }

    /// Draw `PG(shapes[i], tilts[i])` for every `i`, in order, from one RNG stream.
    ///
    /// # Arguments
    /// * `rng` - A mutable reference to a random number generator
    /// * `shapes` - One shape parameter per draw, e.g. `y + ξ` for each bin
    /// * `tilts` - One tilt parameter per draw, the same length as `shapes`
    ///
    /// # Returns
    /// An array of `shapes.len()` variates, the i-th drawn from PG(shapes[i], tilts[i])
    ///
    /// # Errors
    /// [`CountsError::LengthMismatch`] if the slices differ in length and
    /// [`CountsError::InvalidPolyaGammaShape`] for any shape that is not
    /// finite and positive. Nothing is drawn when validation fails.
    ///
    /// # Example
    /// ```rust
    /// # use rand::SeedableRng;
    /// # use rand::rngs::StdRng;
    /// use pg_counts::PolyaGamma;
    /// let pg = PolyaGamma::new();
    /// let mut rng = StdRng::seed_from_u64(7);
    /// let omega = pg.draw_vec(&mut rng, &[1.0, 2.0, 4.5], &[0.0, 0.5, -3.0]).unwrap();
    /// assert_eq!(omega.len(), 3);
    /// ```
    pub fn draw_vec<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        shapes: &[f64],
        tilts: &[f64],
    ) -> Result<Array1<f64>> {
        validate(shapes, tilts)?;
        Ok(shapes
            .iter()
            .zip(tilts)
            .map(|(&b, &c)| self.draw_internal(rng, b, c))
            .collect())
    }

    /// Parallel version of [`PolyaGamma::draw_vec`].
    ///
    /// A single seed is drawn from `rng`; chunk `i` of the input is then sampled
    /// with `R::seed_from_u64(seed + i)`. The output depends only on the state
    /// of `rng`, not on how rayon schedules the chunks, though it differs from
    /// the serial stream.
    ///
    /// # Arguments
    /// * `rng` - Seed source for the per-chunk generators; advanced by one `u64`
    /// * `shapes` - One shape parameter per draw
    /// * `tilts` - One tilt parameter per draw, the same length as `shapes`
    ///
    /// # Returns
    /// An array of `shapes.len()` variates in input order
    ///
    /// # Errors
    /// The same validation errors as [`PolyaGamma::draw_vec`].
    #[cfg(feature = "rayon")]
    pub fn draw_vec_par<R: SeedableRng + Rng>(
        &self,
        rng: &mut R,
        shapes: &[f64],
        tilts: &[f64],
    ) -> Result<Array1<f64>> {
        validate(shapes, tilts)?;
        let seed = rng.next_u64();
        let draws: Vec<f64> = shapes
            .par_chunks(PAR_CHUNK)
            .zip(tilts.par_chunks(PAR_CHUNK))
            .enumerate()
            .flat_map_iter(|(i, (bs, cs))| {
                let mut chunk_rng = R::seed_from_u64(seed.wrapping_add(i as u64));
                bs.iter()
                    .zip(cs)
                    .map(|(&b, &c)| self.draw_internal(&mut chunk_rng, b, c))
                    .collect::<Vec<_>>()
            })
            .collect();
        Ok(Array1::from(draws))
    }
}

impl PolyaGamma {
    #[inline]
    fn draw_internal<R: Rng + ?Sized>(&self, rng: &mut R, b: f64, c: f64) -> f64 {
        debug_assert!(b > 0.0);
        let whole = b.floor();
        let frac = b - whole;
        let mut total: f64 = (0..whole as usize)
            .map(|_| self.sample_polya_gamma_devroye(rng, c))
            .sum();
        if frac > 0.0 {
            total += self.draw_fractional(rng, frac, c);
        }
        total
    }

    /// PG(b, c) for 0 < b < 1 via
    /// `PG(b, c) = 1/(2π²) Σ_k g_k / ((k - 1/2)² + c²/(4π²))`, `g_k ~ Gamma(b, 1)`.
    ///
    /// The sum is cut once `b / den_{k+1}` falls below [`SERIES_TOL`] and the
    /// expected value of the dropped terms is added, which keeps the mean exact
    /// up to the integral approximation of the tail.
    fn draw_fractional<R: Rng + ?Sized>(&self, rng: &mut R, b: f64, c: f64) -> f64 {
        let gamma = Gamma::new(b, 1.0).expect("Gamma(b, 1) is valid for 0 < b < 1");
        let c2 = (c / (2.0 * PI)).powi(2);

        let mut sum = 0.0;
        let mut k: usize = 1;
        loop {
            let kf = k as f64 - 0.5;
            sum += self.sample_gamma(rng, &gamma) / (kf * kf + c2);

            let next = k as f64 + 0.5;
            if b / (next * next + c2) < SERIES_TOL {
                break;
            }
            k += 1;
        }

        (sum + b * series_tail(k as f64, c2)) * PI2_SQ_RECIP
    }
}

/// Midpoint-rule estimate of `Σ_{j > k} 1 / ((j - 1/2)² + c2)`, i.e. `∫_k^∞ dx / (x² + c2)`.
fn series_tail(k: f64, c2: f64) -> f64 {
    if c2 > 0.0 {
        let c = c2.sqrt();
        (0.5 * PI - (k / c).atan()) / c
    } else {
        1.0 / k
    }
}

fn validate(shapes: &[f64], tilts: &[f64]) -> Result<()> {
    if shapes.len() != tilts.len() {
        return Err(CountsError::LengthMismatch {
            what: "Polya-Gamma tilts",
            expected: shapes.len(),
            actual: tilts.len(),
        });
    }
    if let Some((index, &value)) = shapes
        .iter()
        .enumerate()
        .find(|&(_, b)| !(b.is_finite() && *b > 0.0))
    {
        return Err(CountsError::InvalidPolyaGammaShape { index, value });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn empirical_mean(b: f64, c: f64, n: usize, seed: u64) -> f64 {
        let pg = PolyaGamma::new();
        let mut rng = StdRng::seed_from_u64(seed);
        (0..n).map(|_| pg.draw(&mut rng, b, c)).sum::<f64>() / n as f64
    }

    /// E[ω] = b tanh(c/2) / (2c), or b/4 at c = 0
    fn theoretical_mean(b: f64, c: f64) -> f64 {
        if c.abs() < 1e-12 {
            b / 4.0
        } else {
            b * (0.5 * c).tanh() / (2.0 * c)
        }
    }

    #[test]
    fn fractional_shapes_match_theoretical_mean() {
        let n = 20_000;
        for (i, &(b, c)) in [(0.4, 0.0), (1.7, 0.0), (1.7, 1.0), (2.5, -2.0)]
            .iter()
            .enumerate()
        {
            let emp = empirical_mean(b, c, n, i as u64 + 1);
            let th = theoretical_mean(b, c);
            assert!(
                (emp - th).abs() / th < 0.05,
                "PG({b}, {c}): empirical {emp}, theory {th}"
            );
        }
    }

    #[test]
    fn series_tail_matches_partial_sums() {
        // terms 201..=199_999 cover the midpoint cells of [200, 199_999]
        for c2 in [0.0, 0.3, 40.0] {
            let partial: f64 = (201..200_000)
                .map(|j| {
                    let jf = j as f64 - 0.5;
                    1.0 / (jf * jf + c2)
                })
                .sum();
            let estimate = series_tail(200.0, c2) - series_tail(199_999.0, c2);
            assert!(
                (estimate - partial).abs() / partial < 1e-4,
                "c2 = {c2}: estimate {estimate}, partial sum {partial}"
            );
        }
    }

    #[test]
    fn draw_vec_rejects_bad_input() {
        let pg = PolyaGamma::new();
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(
            pg.draw_vec(&mut rng, &[1.0, 2.0], &[0.0]),
            Err(CountsError::LengthMismatch {
                what: "Polya-Gamma tilts",
                expected: 2,
                actual: 1
            })
        );
        assert_eq!(
            pg.draw_vec(&mut rng, &[1.0, 0.0], &[0.0, 0.0]),
            Err(CountsError::InvalidPolyaGammaShape {
                index: 1,
                value: 0.0
            })
        );
    }

    #[test]
    fn draw_vec_is_reproducible() {
        let pg = PolyaGamma::new();
        let shapes = [1.0, 3.0, 0.5, 7.25];
        let tilts = [0.1, -2.0, 4.0, 0.0];
        let a = pg
            .draw_vec(&mut StdRng::seed_from_u64(11), &shapes, &tilts)
            .unwrap();
        let b = pg
            .draw_vec(&mut StdRng::seed_from_u64(11), &shapes, &tilts)
            .unwrap();
        assert_eq!(a, b);
        assert!(a.iter().all(|&w| w > 0.0));
    }

    #[cfg(feature = "rayon")]
    #[test]
    fn parallel_draws_are_deterministic() {
        let pg = PolyaGamma::new();
        let shapes = vec![2.0; 100];
        let tilts: Vec<f64> = (0..100).map(|i| i as f64 / 25.0 - 2.0).collect();
        let a = pg
            .draw_vec_par(&mut StdRng::seed_from_u64(5), &shapes, &tilts)
            .unwrap();
        let b = pg
            .draw_vec_par(&mut StdRng::seed_from_u64(5), &shapes, &tilts)
            .unwrap();
        assert_eq!(a.len(), 100);
        assert_eq!(a, b);
    }
}
