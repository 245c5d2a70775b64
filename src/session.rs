//! Recording-session inputs: the behaviour table and the spike-count matrix.
//!
//! Both are aligned sample-for-sample with one timeline. The behaviour table
//! owns the timestamps and derives the session sampling rate from them; the
//! spike matrix stores one column per cell.
//!
//! # Example
//!
//! ```
//! use spikecorr::{BehaviorTable, SpikeMatrix};
//!
//! let timestamps: Vec<f64> = (0..4).map(|i| i as f64 * 0.001).collect();
//! let table = BehaviorTable::new(timestamps)
//!     .unwrap()
//!     .with_column("speed", vec![0.0, 1.0, 2.0, 3.0])
//!     .unwrap();
//! assert!((table.sample_rate() - 1000.0).abs() < 1e-6);
//!
//! let spikes = SpikeMatrix::from_rows(&[
//!     vec![0.0, 1.0],
//!     vec![1.0, 0.0],
//!     vec![0.0, 0.0],
//!     vec![2.0, 1.0],
//! ])
//! .unwrap();
//! assert_eq!(spikes.n_cells(), 2);
//! assert_eq!(spikes.cell(0), &[0.0, 1.0, 0.0, 2.0]);
//! ```

use std::collections::BTreeMap;

use crate::error::{AnalysisError, Result};

/// Named behavioural covariates sampled on a regular timeline.
#[derive(Debug, Clone, PartialEq)]
pub struct BehaviorTable {
    timestamps: Vec<f64>,
    sample_rate: f64,
    columns: BTreeMap<String, Vec<f64>>,
}

impl BehaviorTable {
    /// Creates an empty table over the given timestamps (seconds).
    ///
    /// The sampling rate is the reciprocal of the mean inter-sample interval.
    /// Sampling is assumed regular, so a single rate covers the session.
    ///
    /// # Errors
    ///
    /// [`AnalysisError::InsufficientTimeline`] if there are fewer than two
    /// timestamps or the mean interval is not positive and finite.
    pub fn new(timestamps: Vec<f64>) -> Result<Self> {
        let n = timestamps.len();
        if n < 2 {
            return Err(AnalysisError::InsufficientTimeline(n));
        }
        let mean_interval = (timestamps[n - 1] - timestamps[0]) / (n - 1) as f64;
        if !(mean_interval.is_finite() && mean_interval > 0.0) {
            return Err(AnalysisError::InsufficientTimeline(n));
        }

        Ok(Self {
            timestamps,
            sample_rate: 1.0 / mean_interval,
            columns: BTreeMap::new(),
        })
    }

    /// Adds or replaces a covariate column.
    ///
    /// # Errors
    ///
    /// [`AnalysisError::LengthMismatch`] if `values` is not aligned with the timeline.
    pub fn with_column(mut self, name: impl Into<String>, values: Vec<f64>) -> Result<Self> {
        self.insert(name, values)?;
        Ok(self)
    }

    /// In-place form of [`with_column`](Self::with_column).
    pub fn insert(&mut self, name: impl Into<String>, values: Vec<f64>) -> Result<()> {
        let name = name.into();
        if values.len() != self.len() {
            return Err(AnalysisError::LengthMismatch {
                what: format!("behaviour column `{name}`"),
                expected: self.len(),
                actual: values.len(),
            });
        }
        self.columns.insert(name, values);
        Ok(())
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns.get(name).map(Vec::as_slice)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    pub fn timestamps(&self) -> &[f64] {
        &self.timestamps
    }

    /// Sampling rate in Hz derived from the timestamps.
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Number of timeline samples.
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }
}

/// Non-negative spike counts, one column per cell, aligned with the timeline.
///
/// `NaN` entries are allowed and read as absent samples. The matrix is never
/// mutated by the analysis; smoothed and shuffled versions are derived copies.
#[derive(Debug, Clone, PartialEq)]
pub struct SpikeMatrix {
    n_samples: usize,
    cells: Vec<Vec<f64>>,
}

impl SpikeMatrix {
    /// Builds a matrix from per-cell columns.
    ///
    /// # Errors
    ///
    /// - [`AnalysisError::LengthMismatch`] if columns differ in length
    /// - [`AnalysisError::NegativeSpikeCount`] if any count is below zero
    pub fn from_columns(cells: Vec<Vec<f64>>) -> Result<Self> {
        let n_samples = cells.first().map_or(0, Vec::len);
        for (cell, column) in cells.iter().enumerate() {
            if column.len() != n_samples {
                return Err(AnalysisError::LengthMismatch {
                    what: format!("spike column {cell}"),
                    expected: n_samples,
                    actual: column.len(),
                });
            }
            if let Some(sample) = column.iter().position(|&v| v < 0.0) {
                return Err(AnalysisError::NegativeSpikeCount { cell, sample });
            }
        }
        Ok(Self { n_samples, cells })
    }

    /// Builds a matrix from time-ordered rows (one value per cell per row).
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        let n_cells = rows.first().map_or(0, Vec::len);
        let mut cells = vec![Vec::with_capacity(rows.len()); n_cells];
        for (t, row) in rows.iter().enumerate() {
            if row.len() != n_cells {
                return Err(AnalysisError::LengthMismatch {
                    what: format!("spike row {t}"),
                    expected: n_cells,
                    actual: row.len(),
                });
            }
            for (column, &v) in cells.iter_mut().zip(row) {
                column.push(v);
            }
        }
        Self::from_columns(cells)
    }

    /// Wraps columns already known to be valid (derived from a checked matrix).
    pub(crate) fn from_validated(n_samples: usize, cells: Vec<Vec<f64>>) -> Self {
        debug_assert!(cells.iter().all(|c| c.len() == n_samples));
        Self { n_samples, cells }
    }

    pub fn n_cells(&self) -> usize {
        self.cells.len()
    }

    pub fn n_samples(&self) -> usize {
        self.n_samples
    }

    /// Spike train of one cell.
    ///
    /// # Panics
    ///
    /// Panics if `cell >= n_cells()`.
    pub fn cell(&self, cell: usize) -> &[f64] {
        &self.cells[cell]
    }

    pub fn cells(&self) -> impl Iterator<Item = &[f64]> {
        self.cells.iter().map(Vec::as_slice)
    }

    /// Copies the given columns, in order, into a new matrix.
    ///
    /// # Errors
    ///
    /// [`AnalysisError::CellIndexOutOfRange`] for an index past the last column.
    pub fn select(&self, indices: &[usize]) -> Result<Self> {
        let mut cells = Vec::with_capacity(indices.len());
        for &index in indices {
            let column = self
                .cells
                .get(index)
                .ok_or(AnalysisError::CellIndexOutOfRange {
                    index,
                    n_cells: self.n_cells(),
                })?;
            cells.push(column.clone());
        }
        Ok(Self::from_validated(self.n_samples, cells))
    }
}
