//! Gibbs sweeps over a population of neurons.
//!
//! Each unit is resampled against its own parent; units share nothing, so the
//! parallel sweep only has to keep the random streams reproducible.

use crate::counts::{AugmentedCounts, Resample};
use crate::error::{CountsError, Result};
use crate::model::ParentModel;
use rand::Rng;

#[cfg(feature = "rayon")]
use rand::SeedableRng;
#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Resample every unit once, in order, from one RNG stream.
///
/// # Errors
/// [`CountsError::LengthMismatch`] if `models` does not have one entry per
/// unit; otherwise the first error raised by a unit. Units before the failing
/// one have already been updated.
pub fn resample_population<M, R>(
    units: &mut [AugmentedCounts<'_>],
    models: &[M],
    rng: &mut R,
) -> Result<()>
where
    M: ParentModel,
    R: Rng + ?Sized,
{
    check_lengths(units.len(), models.len())?;
    for (i, (unit, model)) in units.iter_mut().zip(models).enumerate() {
        log::trace!("resampling unit {i} ({:?}, {} bins)", unit.kind(), unit.len());
        unit.resample(model, rng)?;
    }
    Ok(())
}

/// Parallel version of [`resample_population`].
///
/// One seed is drawn from `rng`; unit `i` is resampled with
/// `R::seed_from_u64(seed + i)`. The result depends only on the state of
/// `rng`, not on thread scheduling, though it differs from the serial sweep.
#[cfg(feature = "rayon")]
pub fn resample_population_par<M, R>(
    units: &mut [AugmentedCounts<'_>],
    models: &[M],
    rng: &mut R,
) -> Result<()>
where
    M: ParentModel + Sync,
    R: SeedableRng + Rng,
{
    check_lengths(units.len(), models.len())?;
    let seed: u64 = rng.r#gen();
    units
        .par_iter_mut()
        .zip(models.par_iter())
        .enumerate()
        .try_for_each(|(i, (unit, model))| {
            log::trace!("resampling unit {i} ({:?}, {} bins)", unit.kind(), unit.len());
            let mut unit_rng = R::seed_from_u64(seed.wrapping_add(i as u64));
            unit.resample(model, &mut unit_rng)
        })
}

fn check_lengths(units: usize, models: usize) -> Result<()> {
    if units != models {
        return Err(CountsError::LengthMismatch {
            what: "parent models",
            expected: units,
            actual: models,
        });
    }
    Ok(())
}
