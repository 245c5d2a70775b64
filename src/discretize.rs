//! Discretisation of behavioural covariates into a joint bin index.
//!
//! Each [`Covariate`] carries strictly increasing bin edges; `edges.len() - 1`
//! half-open bins `[e_k, e_{k+1})` are formed per covariate. A sample's
//! per-covariate bins are combined row-major over the Cartesian product of
//! all covariates, so with bin counts `n_0, n_1, ..., n_{m-1}`:
//!
//! ```text
//! id = ((b_0 · n_1 + b_1) · n_2 + b_2) · ... + b_{m-1}
//! ```
//!
//! A sample outside the edges of any covariate (or `NaN`) has no bin. With no
//! covariates configured every sample falls in bin 0.
//!
//! # Example
//!
//! ```
//! use spikecorr::{discretize, BehaviorTable, Covariate};
//!
//! let table = BehaviorTable::new(vec![0.0, 1.0, 2.0, 3.0])
//!     .unwrap()
//!     .with_column("position", vec![0.1, 0.6, 0.9, 1.2])
//!     .unwrap()
//!     .with_column("speed", vec![1.0, 5.0, 1.0, 5.0])
//!     .unwrap();
//!
//! let covariates = [
//!     Covariate::new("position", vec![0.0, 0.5, 1.0]),
//!     Covariate::new("speed", vec![0.0, 2.0, 10.0]),
//! ];
//! let bins = discretize(&table, &covariates).unwrap();
//! assert_eq!(bins, vec![Some(0), Some(3), Some(2), None]);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};
use crate::session::BehaviorTable;

/// A behavioural covariate and its bin edges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Covariate {
    /// Behaviour column to bin
    pub name: String,
    /// Strictly increasing bin boundaries
    pub edges: Vec<f64>,
}

impl Covariate {
    pub fn new(name: impl Into<String>, edges: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            edges,
        }
    }

    /// Number of bins the edges define.
    pub fn n_bins(&self) -> usize {
        self.edges.len().saturating_sub(1)
    }

    /// Checks the edges form at least one bin and strictly increase.
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason| AnalysisError::InvalidBinEdges {
            covariate: self.name.clone(),
            reason,
        };
        if self.edges.len() < 2 {
            return Err(invalid("at least two edges are required"));
        }
        if self.edges.iter().any(|e| !e.is_finite()) {
            return Err(invalid("edges must be finite"));
        }
        if self.edges.windows(2).any(|w| w[1] <= w[0]) {
            return Err(invalid("edges must be strictly increasing"));
        }
        Ok(())
    }

    /// Half-open bin containing `value`, if any.
    #[inline]
    pub fn bin_of(&self, value: f64) -> Option<usize> {
        let above = self.edges.partition_point(|&e| e <= value);
        if above == 0 || above == self.edges.len() {
            None
        } else {
            Some(above - 1)
        }
    }
}

/// Total number of joint bins across `covariates`.
pub fn joint_bin_count(covariates: &[Covariate]) -> usize {
    covariates.iter().map(Covariate::n_bins).product()
}

/// Assigns every timeline sample to a joint bin.
///
/// # Errors
///
/// - [`AnalysisError::InvalidBinEdges`] if any covariate's edges are unusable
/// - [`AnalysisError::UnknownCovariate`] if a covariate is not in the table
pub fn discretize(table: &BehaviorTable, covariates: &[Covariate]) -> Result<Vec<Option<usize>>> {
    let mut bins = vec![Some(0); table.len()];

    for covariate in covariates {
        covariate.validate()?;
        let column = table
            .column(&covariate.name)
            .ok_or_else(|| AnalysisError::UnknownCovariate(covariate.name.clone()))?;
        let n_bins = covariate.n_bins();

        for (bin, &value) in bins.iter_mut().zip(column) {
            *bin = match (*bin, covariate.bin_of(value)) {
                (Some(id), Some(b)) => Some(id * n_bins + b),
                _ => None,
            };
        }
    }

    Ok(bins)
}
