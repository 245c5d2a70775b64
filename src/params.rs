//! Analysis parameters.
//!
//! [`AnalysisParams`] bundles everything the engine needs besides the data.
//! It deserialises from any serde format with every field optional; missing
//! fields take the values of [`AnalysisParams::default`].
//!
//! # Example
//!
//! ```
//! use spikecorr::{AnalysisParams, CellSubset, Comparison, Covariate};
//!
//! let mut params = AnalysisParams {
//!     max_lag: 0.05,
//!     n_shuffle: 200,
//!     cells: CellSubset::Indices(vec![0, 2, 5]),
//!     shuffle_covariates: vec![Covariate::new("position", vec![0.0, 50.0, 100.0])],
//!     ..AnalysisParams::default()
//! };
//! params.predicates.insert("speed".into(), Comparison::GreaterOrEqual(2.0));
//! assert!(params.validate().is_ok());
//!
//! params.n_shuffle = 0;
//! assert!(params.validate().is_err());
//! ```

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::discretize::Covariate;
use crate::error::{AnalysisError, Result};
use crate::selection::PredicateSet;

/// Which cells are candidates for analysis.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellSubset {
    /// Every column of the spike matrix
    #[default]
    All,
    /// Explicit column indices, in the order given
    Indices(Vec<usize>),
}

impl CellSubset {
    /// Candidate column indices for a matrix with `n_cells` columns.
    ///
    /// Explicit indices must be in range and distinct.
    pub fn resolve(&self, n_cells: usize) -> Result<Vec<usize>> {
        match self {
            CellSubset::All => Ok((0..n_cells).collect()),
            CellSubset::Indices(indices) => {
                let mut seen = BTreeSet::new();
                for &index in indices {
                    if index >= n_cells {
                        return Err(AnalysisError::CellIndexOutOfRange { index, n_cells });
                    }
                    if !seen.insert(index) {
                        return Err(AnalysisError::DuplicateCellIndex(index));
                    }
                }
                Ok(indices.clone())
            }
        }
    }
}

/// Parameter bundle for one cross-correlation analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisParams {
    /// Inclusion predicates over behaviour columns
    pub predicates: PredicateSet,
    /// Candidate cells before thresholding
    pub cells: CellSubset,
    /// Cells need strictly more spikes than this inside the window
    pub min_spikes: f64,
    /// Boxcar smoothing window (seconds)
    pub smoothing_window: f64,
    /// Largest correlogram lag (seconds)
    pub max_lag: f64,
    /// Covariates whose joint bins constrain the shuffle
    pub shuffle_covariates: Vec<Covariate>,
    /// Number of shuffle draws
    pub n_shuffle: usize,
    /// Base seed for the shuffle generators
    pub seed: u64,
    /// Expected sampling rate (Hz), cross-checked against the timeline
    pub sample_rate: Option<f64>,
}

impl Default for AnalysisParams {
    fn default() -> Self {
        Self {
            predicates: PredicateSet::new(),
            cells: CellSubset::All,
            min_spikes: 0.0,
            smoothing_window: 0.01,
            max_lag: 0.1,
            shuffle_covariates: Vec::new(),
            n_shuffle: 100,
            seed: 0,
            sample_rate: None,
        }
    }
}

impl AnalysisParams {
    /// Rejects parameters that would invalidate every downstream tensor.
    pub fn validate(&self) -> Result<()> {
        if self.n_shuffle == 0 {
            return Err(AnalysisError::InvalidShuffleCount);
        }
        if !(self.smoothing_window.is_finite() && self.smoothing_window > 0.0) {
            return Err(AnalysisError::InvalidSmoothingWindow(self.smoothing_window));
        }
        if !(self.max_lag.is_finite() && self.max_lag >= 0.0) {
            return Err(AnalysisError::InvalidMaxLag(self.max_lag));
        }
        if !self.min_spikes.is_finite() {
            return Err(AnalysisError::InvalidSpikeThreshold(self.min_spikes));
        }
        for covariate in &self.shuffle_covariates {
            covariate.validate()?;
        }
        Ok(())
    }
}
