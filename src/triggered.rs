//! Spike-triggered snippets and averages.
//!
//! For each trigger index `t` and each offset `k` of a symmetric lag window,
//! the engine reads `target[t + k]`, optionally scaled by a per-trigger
//! weight. Reads that fall before the start or past the end of the target are
//! absent rather than wrapped or clamped.
//!
//! Weighting each trigger by the triggering cell's own count at that instant
//! gives a spike-weighted average: a sample holding three coincident spikes
//! contributes three times.
//!
//! # Example
//!
//! ```
//! use spikecorr::triggered::triggered_snippets;
//!
//! let target = [Some(0.0), Some(1.0), Some(2.0), Some(3.0)];
//! let snippets = triggered_snippets(&target, &[0, 3], &[-1, 0, 1], None);
//!
//! assert_eq!(snippets.row(0), &[None, Some(0.0), Some(1.0)]);
//! assert_eq!(snippets.row(1), &[Some(2.0), Some(3.0), None]);
//! assert_eq!(snippets.sum(), vec![Some(2.0), Some(3.0), Some(1.0)]);
//! ```

use crate::missing::PresentReduce;

/// Stacked per-trigger snippets, triggers × offsets, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct Snippets {
    n_offsets: usize,
    values: Vec<Option<f64>>,
}

impl Snippets {
    pub fn n_triggers(&self) -> usize {
        if self.n_offsets == 0 {
            0
        } else {
            self.values.len() / self.n_offsets
        }
    }

    pub fn n_offsets(&self) -> usize {
        self.n_offsets
    }

    /// Snippet of one trigger across all offsets.
    pub fn row(&self, trigger: usize) -> &[Option<f64>] {
        let start = trigger * self.n_offsets;
        &self.values[start..start + self.n_offsets]
    }

    fn column(&self, offset: usize) -> impl Iterator<Item = Option<f64>> + '_ {
        self.values
            .iter()
            .skip(offset)
            .step_by(self.n_offsets.max(1))
            .copied()
    }

    /// Per-offset sum across triggers, ignoring absent entries.
    pub fn sum(&self) -> Vec<Option<f64>> {
        (0..self.n_offsets)
            .map(|k| self.column(k).sum_present())
            .collect()
    }

    /// Per-offset mean across triggers, ignoring absent entries.
    pub fn mean(&self) -> Vec<Option<f64>> {
        (0..self.n_offsets)
            .map(|k| self.column(k).mean_present())
            .collect()
    }
}

#[inline]
fn read(target: &[Option<f64>], trigger: usize, offset: isize) -> Option<f64> {
    let idx = trigger.checked_add_signed(offset)?;
    target.get(idx).copied().flatten()
}

/// Extracts the snippet of `target` around every trigger.
///
/// `weights`, when given, must hold one scalar per trigger.
///
/// # Panics
///
/// Panics if `weights` is given with a length different from `triggers`.
pub fn triggered_snippets(
    target: &[Option<f64>],
    triggers: &[usize],
    offsets: &[isize],
    weights: Option<&[f64]>,
) -> Snippets {
    if let Some(w) = weights {
        assert_eq!(w.len(), triggers.len(), "one weight per trigger required");
    }

    let mut values = Vec::with_capacity(triggers.len() * offsets.len());
    for (n, &t) in triggers.iter().enumerate() {
        let w = weights.map_or(1.0, |w| w[n]);
        values.extend(offsets.iter().map(|&k| read(target, t, k).map(|v| v * w)));
    }

    Snippets {
        n_offsets: offsets.len(),
        values,
    }
}

/// Per-offset weighted sum across triggers without stacking the snippets.
///
/// Equivalent to `triggered_snippets(..).sum()`; this is the form used on the
/// hot path of the pairwise pass.
pub fn triggered_sum(
    target: &[Option<f64>],
    triggers: &[usize],
    offsets: &[isize],
    weights: Option<&[f64]>,
) -> Vec<Option<f64>> {
    if let Some(w) = weights {
        assert_eq!(w.len(), triggers.len(), "one weight per trigger required");
    }

    let mut acc: Vec<Option<f64>> = vec![None; offsets.len()];
    for (n, &t) in triggers.iter().enumerate() {
        let w = weights.map_or(1.0, |w| w[n]);
        for (slot, &k) in acc.iter_mut().zip(offsets) {
            if let Some(v) = read(target, t, k) {
                *slot = Some(slot.unwrap_or(0.0) + v * w);
            }
        }
    }
    acc
}
