//! The parent model interface: what an augmented-counts object needs to know
//! about the regression that owns it.

use crate::error::{CountsError, Result};
use ndarray::{Array1, ArrayView2};

/// Supplies the prior over the activation of one neuron.
///
/// Augmented-counts objects never hold on to their parent; it is passed by
/// reference to every call that reads it, so resampling can never mutate
/// the parent or extend its lifetime.
pub trait ParentModel {
    /// Prior mean of the activation in every time bin of `design`.
    fn mean_activation(&self, design: ArrayView2<'_, f64>) -> Result<Array1<f64>>;

    /// Prior variance of the activation around its mean. Must be positive.
    fn sigma(&self) -> f64;

    /// Negative-binomial dispersion, for count models that need one.
    fn xi(&self) -> Option<f64> {
        None
    }
}

impl<M: ParentModel + ?Sized> ParentModel for &M {
    fn mean_activation(&self, design: ArrayView2<'_, f64>) -> Result<Array1<f64>> {
        (**self).mean_activation(design)
    }

    fn sigma(&self) -> f64 {
        (**self).sigma()
    }

    fn xi(&self) -> Option<f64> {
        (**self).xi()
    }
}

/// Gaussian prior on the activation, read from the parent at the point of use.
#[derive(Debug, Clone)]
pub(crate) struct ActivationPrior {
    pub mean: Array1<f64>,
    pub sigma: f64,
}

impl ActivationPrior {
    /// Read and validate the prior for a series of `bins` time bins.
    pub fn read<M: ParentModel + ?Sized>(
        model: &M,
        design: ArrayView2<'_, f64>,
        bins: usize,
    ) -> Result<Self> {
        let sigma = positive("sigma", model.sigma())?;
        let mean = model.mean_activation(design)?;
        if mean.len() != bins {
            return Err(CountsError::LengthMismatch {
                what: "mean activation",
                expected: bins,
                actual: mean.len(),
            });
        }
        Ok(Self { mean, sigma })
    }
}

/// Dispersion `xi`, required and validated.
pub(crate) fn dispersion<M: ParentModel + ?Sized>(model: &M) -> Result<f64> {
    let xi = model.xi().ok_or(CountsError::MissingHyperparameter("xi"))?;
    positive("xi", xi)
}

fn positive(name: &'static str, value: f64) -> Result<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(CountsError::InvalidHyperparameter { name, value })
    }
}

/// A single neuron with a linear prior mean, `mean_activation(X) = X w + b`.
///
/// This is the smallest useful parent: enough to drive the augmented counts
/// in tests, benches and demos. Network priors and weight resampling belong
/// to the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearNeuron {
    pub weights: Array1<f64>,
    pub bias: f64,
    pub sigma: f64,
    pub xi: Option<f64>,
}

impl LinearNeuron {
    /// Zero weights over `features` inputs, so the prior mean is `bias` everywhere.
    pub fn constant(features: usize, bias: f64, sigma: f64) -> Self {
        Self {
            weights: Array1::zeros(features),
            bias,
            sigma,
            xi: None,
        }
    }

    pub fn with_xi(mut self, xi: f64) -> Self {
        self.xi = Some(xi);
        self
    }
}

impl ParentModel for LinearNeuron {
    fn mean_activation(&self, design: ArrayView2<'_, f64>) -> Result<Array1<f64>> {
        if design.ncols() != self.weights.len() {
            return Err(CountsError::LengthMismatch {
                what: "design row",
                expected: self.weights.len(),
                actual: design.ncols(),
            });
        }
        Ok(design.dot(&self.weights) + self.bias)
    }

    fn sigma(&self) -> f64 {
        self.sigma
    }

    fn xi(&self) -> Option<f64> {
        self.xi
    }
}
