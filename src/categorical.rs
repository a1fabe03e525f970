//! Categorical draws from unnormalized log weights (log-sum-exp trick).

use crate::error::{CountsError, Result};
use ndarray::{ArrayView1, ArrayView2, Axis};
use rand::Rng;
use rand::distributions::{Distribution, WeightedIndex};

/// Draw an index `i` with probability `exp(w_i) / Σ_j exp(w_j)`.
///
/// Weights are shifted by their maximum before exponentiating, so very large
/// or very small log weights are fine. Entries equal to `-inf` have zero
/// probability.
///
/// # Errors
/// [`CountsError::DegenerateLogWeights`] if the weights are empty, contain a
/// NaN, or are all `-inf`.
pub fn sample_log_weights<R: Rng + ?Sized>(rng: &mut R, log_weights: &[f64]) -> Result<usize> {
    sample_lane(rng, ArrayView1::from(log_weights))
}

/// Independent draws, one per lane of `log_weights` along `axis`.
///
/// For a `(K, T)` matrix and `Axis(0)` this returns `T` draws, the `t`-th
/// choosing among the `K` entries of column `t`.
///
/// # Errors
/// See [`sample_log_weights`]; the first degenerate lane aborts the call.
pub fn sample_log_weights_along<R: Rng + ?Sized>(
    rng: &mut R,
    log_weights: ArrayView2<'_, f64>,
    axis: Axis,
) -> Result<Vec<usize>> {
    log_weights
        .lanes(axis)
        .into_iter()
        .map(|lane| sample_lane(rng, lane))
        .collect()
}

fn sample_lane<R: Rng + ?Sized>(rng: &mut R, lane: ArrayView1<'_, f64>) -> Result<usize> {
    if lane.is_empty() || lane.iter().any(|w| w.is_nan()) {
        return Err(CountsError::DegenerateLogWeights);
    }
    let max = lane.fold(f64::NEG_INFINITY, |m, &w| m.max(w));
    if !max.is_finite() {
        // all -inf, or a +inf that would swamp every other weight
        return Err(CountsError::DegenerateLogWeights);
    }

    let dist = WeightedIndex::<f64>::new(lane.iter().map(|&w| (w - max).exp()))
        .map_err(|_| CountsError::DegenerateLogWeights)?;
    Ok(dist.sample(rng))
}
