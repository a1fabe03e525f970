use crate::error::{CountsError, Result};
use ndarray::{Array1, ArrayView1, ArrayView2};

/// Observed counts and the design rows they line up with.
///
/// The design is borrowed from the caller for the lifetime of the series;
/// its row count is checked against the number of bins once, here.
#[derive(Debug, Clone)]
pub(crate) struct CountSeries<'a> {
    design: ArrayView2<'a, f64>,
    counts: Array1<u32>,
}

impl<'a> CountSeries<'a> {
    pub fn new(design: ArrayView2<'a, f64>, counts: Array1<u32>) -> Result<Self> {
        if counts.is_empty() {
            return Err(CountsError::EmptySeries);
        }
        if design.nrows() != counts.len() {
            return Err(CountsError::DesignMismatch {
                rows: design.nrows(),
                bins: counts.len(),
            });
        }
        Ok(Self { design, counts })
    }

    pub fn design(&self) -> ArrayView2<'a, f64> {
        self.design
    }

    pub fn counts(&self) -> ArrayView1<'_, u32> {
        self.counts.view()
    }

    /// Counts as `f64`, the form every update formula wants.
    pub fn counts_f64(&self) -> Array1<f64> {
        self.counts.mapv(f64::from)
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Replace the counts. Only the Geweke diagnostics do this; the length
    /// never changes.
    pub fn set_counts(&mut self, counts: Array1<u32>) {
        debug_assert_eq!(counts.len(), self.counts.len());
        self.counts = counts;
    }

    /// Check that a candidate activation covers exactly the bins of this series.
    pub fn check_activation(&self, x: ArrayView1<'_, f64>) -> Result<()> {
        if x.len() != self.len() {
            return Err(CountsError::LengthMismatch {
                what: "activation",
                expected: self.len(),
                actual: x.len(),
            });
        }
        Ok(())
    }
}
