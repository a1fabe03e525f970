//! Error type shared by every augmented-counts operation.

use thiserror::Error;

/// Errors raised while constructing or resampling augmented count observations.
///
/// Shape problems are reported at construction, hyperparameter problems at the
/// point where the hyperparameter is read. A rejected HMC proposal is not an
/// error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CountsError {
    #[error("count series is empty")]
    EmptySeries,

    #[error("design has {rows} rows but {bins} count bins were supplied")]
    DesignMismatch { rows: usize, bins: usize },

    #[error("{what} has length {actual}, expected {expected}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Bernoulli count at bin {index} is {value}, expected 0 or 1")]
    NonBinaryCount { index: usize, value: u32 },

    #[error("hyperparameter `{name}` must be finite and positive, got {value}")]
    InvalidHyperparameter { name: &'static str, value: f64 },

    #[error("parent model does not provide hyperparameter `{0}`")]
    MissingHyperparameter(&'static str),

    #[error("Polya-Gamma shape at index {index} must be finite and positive, got {value}")]
    InvalidPolyaGammaShape { index: usize, value: f64 },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("log weights are empty, NaN, or all -inf")]
    DegenerateLogWeights,

    #[error("`{0}` is not supported by this observation model")]
    Unsupported(&'static str),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, CountsError>;
