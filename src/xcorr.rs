//! Lag-resolved spike-train cross-correlation for every cell pair.
//!
//! # Overview
//!
//! For an ordered pair `(i, j)` with smoothed signals `s_i`, `s_j` restricted
//! to the inclusion mask `M`:
//!
//! ```text
//! cc(i, j, k) = Σ_{t ∈ M, s_i[t] > 0} s_i[t] · s_j[t + k]
//!               ─────────────────────────────────────────
//!                 sqrt( Σ_{t ∈ M} s_i[t]² · Σ_{t ∈ M} s_j[t]² )
//! ```
//!
//! The numerator is a spike-weighted triggered sum (see [`crate::triggered`])
//! with cell `i` as trigger and cell `j` as target; samples outside `M` are
//! absent on both sides and never enter the sum. The denominator is the
//! geometric mean of the two zero-lag self terms. This is not a Pearson
//! coefficient: no mean is removed, and values only stay within `[-1, 1]`
//! for sparse, spike-like signals.
//!
//! A zero denominator (a cell silent inside the window) makes the whole pair
//! absent. Only the strict upper triangle is computed; the lower triangle is
//! filled by [`CorrTensor::symmetrize_with_lag_reversal`].
//!
//! # Example
//!
//! ```
//! use spikecorr::xcorr::{cross_correlate, LagAxis};
//!
//! let lags = LagAxis::from_max_lag(0.002, 1000.0, 8);
//! assert_eq!(lags.offsets(), &[-2, -1, 0, 1, 2]);
//!
//! // Cell 1 repeats cell 0 one sample later
//! let a = [0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0];
//! let b = [0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0];
//! let signals: Vec<Vec<Option<f64>>> = [a, b]
//!     .iter()
//!     .map(|s| s.iter().map(|&v| Some(v)).collect())
//!     .collect();
//!
//! let cc = cross_correlate(&signals, &[true; 8], &lags);
//! assert_eq!(cc.get(0, 1, lags.index_of(1).unwrap()), Some(1.0));
//! assert_eq!(cc.get(1, 0, lags.index_of(-1).unwrap()), Some(1.0));
//! ```

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::tensor::CorrTensor;
use crate::triggered::triggered_sum;

/// Symmetric lag axis shared by every correlogram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LagAxis {
    offsets: Vec<isize>,
    sample_rate: f64,
}

impl LagAxis {
    /// Builds `-n..=n` sample offsets with `n = round(max_lag * sample_rate)`.
    ///
    /// `n` is capped at `n_samples - 1`, the largest offset that can pair two
    /// samples of the timeline.
    pub fn from_max_lag(max_lag: f64, sample_rate: f64, n_samples: usize) -> Self {
        let limit = n_samples.saturating_sub(1) as f64;
        let n = libm::round(max_lag * sample_rate);
        let n = if n.is_finite() && n > 0.0 {
            n.min(limit) as isize
        } else {
            0
        };
        Self {
            offsets: (-n..=n).collect(),
            sample_rate,
        }
    }

    /// Signed sample offsets in ascending order.
    pub fn offsets(&self) -> &[isize] {
        &self.offsets
    }

    /// Lag of every bin in seconds.
    pub fn seconds(&self) -> Vec<f64> {
        self.offsets
            .iter()
            .map(|&k| k as f64 / self.sample_rate)
            .collect()
    }

    /// Position of a sample offset on the axis.
    pub fn index_of(&self, offset: isize) -> Option<usize> {
        self.offsets.iter().position(|&k| k == offset)
    }

    /// Position of the zero lag (the centre of the axis).
    pub fn zero_index(&self) -> usize {
        self.offsets.len() / 2
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }
}

/// One cell's smoothed signal prepared for the pairwise pass.
///
/// Computed once per cell and shared by every pair the cell takes part in.
#[derive(Debug, Clone)]
pub struct PreparedCell {
    /// Smoothed signal, absent outside the inclusion mask
    masked: Vec<Option<f64>>,
    /// In-mask samples with a positive smoothed count
    triggers: Vec<usize>,
    /// Smoothed count at each trigger
    weights: Vec<f64>,
    /// Zero-lag self term `Σ s[t]²` over the mask
    energy: f64,
}

impl PreparedCell {
    pub fn new(smoothed: &[Option<f64>], mask: &[bool]) -> Self {
        let masked: Vec<Option<f64>> = smoothed
            .iter()
            .zip(mask)
            .map(|(&v, &keep)| if keep { v } else { None })
            .collect();

        let mut triggers = Vec::new();
        let mut weights = Vec::new();
        let mut energy = 0.0;
        for (t, v) in masked.iter().enumerate() {
            let Some(v) = *v else { continue };
            energy += v * v;
            if v > 0.0 {
                triggers.push(t);
                weights.push(v);
            }
        }

        Self {
            masked,
            triggers,
            weights,
            energy,
        }
    }

    pub fn n_triggers(&self) -> usize {
        self.triggers.len()
    }

    pub fn energy(&self) -> f64 {
        self.energy
    }
}

/// Normalised correlogram of `reference` (trigger) against `target`.
///
/// Returns one entry per offset; all entries are absent when either cell has
/// a zero self term.
pub fn correlogram(
    reference: &PreparedCell,
    target: &PreparedCell,
    offsets: &[isize],
) -> Vec<Option<f64>> {
    let denom = libm::sqrt(reference.energy * target.energy);
    if !(denom.is_finite() && denom > 0.0) {
        return vec![None; offsets.len()];
    }

    triggered_sum(
        &target.masked,
        &reference.triggers,
        offsets,
        Some(&reference.weights),
    )
    .into_iter()
    .map(|cross| cross.map(|c| c / denom))
    .collect()
}

/// Correlation tensor for every pair of `signals` (smoothed, one per cell).
///
/// Rows of the upper triangle are computed in parallel; each worker writes
/// only the slab of its own first-cell index.
pub fn cross_correlate(
    signals: &[Vec<Option<f64>>],
    mask: &[bool],
    lags: &LagAxis,
) -> CorrTensor {
    let prepared: Vec<PreparedCell> = signals
        .par_iter()
        .map(|s| PreparedCell::new(s, mask))
        .collect();
    cross_correlate_prepared(&prepared, lags)
}

/// [`cross_correlate`] over cells that are already prepared.
pub fn cross_correlate_prepared(prepared: &[PreparedCell], lags: &LagAxis) -> CorrTensor {
    let n_cells = prepared.len();
    let n_lags = lags.len();
    let mut tensor = CorrTensor::new(n_cells, n_lags);
    let slab_len = tensor.slab_len();

    tensor
        .values_mut()
        .par_chunks_mut(slab_len)
        .enumerate()
        .for_each(|(i, slab)| {
            for j in (i + 1)..n_cells {
                let cc = correlogram(&prepared[i], &prepared[j], lags.offsets());
                if cc.iter().all(Option::is_none) {
                    debug!(i, j, "pair has no defined correlogram");
                }
                slab[j * n_lags..(j + 1) * n_lags].copy_from_slice(&cc);
            }
        });

    tensor.symmetrize_with_lag_reversal();
    tensor
}
