//! Time-window and cell selection.
//!
//! - [`select_time_window`] turns a set of inclusion predicates over behaviour
//!   columns into a boolean sample mask.
//! - [`select_cells`] keeps the candidate cells whose spike count inside the
//!   mask strictly exceeds a threshold.
//!
//! # Example
//!
//! ```
//! use std::collections::BTreeMap;
//! use spikecorr::{select_cells, select_time_window, BehaviorTable, Comparison, SpikeMatrix};
//!
//! let table = BehaviorTable::new(vec![0.0, 0.1, 0.2, 0.3])
//!     .unwrap()
//!     .with_column("speed", vec![0.0, 5.0, 10.0, 2.0])
//!     .unwrap();
//!
//! let mut predicates = BTreeMap::new();
//! predicates.insert("speed".to_string(), Comparison::GreaterOrEqual(2.0));
//! let mask = select_time_window(&table, &predicates);
//! assert_eq!(mask, vec![false, true, true, true]);
//!
//! let spikes = SpikeMatrix::from_columns(vec![
//!     vec![1.0, 0.0, 0.0, 0.0], // fires only outside the window
//!     vec![0.0, 1.0, 1.0, 0.0],
//! ])
//! .unwrap();
//! assert_eq!(select_cells(&spikes, &[0, 1], &mask, 0.0), vec![1]);
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::session::{BehaviorTable, SpikeMatrix};

/// Comparison applied between a behaviour column and a reference value.
///
/// `NaN` samples fail every comparison, so they are always excluded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", content = "value", rename_all = "snake_case")]
pub enum Comparison {
    Equals(f64),
    NotEquals(f64),
    /// Sample equals any of the listed values.
    MemberOf(Vec<f64>),
    GreaterOrEqual(f64),
    LessOrEqual(f64),
    Greater(f64),
    Less(f64),
    /// Closed interval `[lo, hi]`.
    Between(f64, f64),
}

impl Comparison {
    /// Evaluates the comparison for one sample.
    #[inline]
    pub fn matches(&self, sample: f64) -> bool {
        if sample.is_nan() {
            return false;
        }
        match *self {
            Comparison::Equals(v) => sample == v,
            Comparison::NotEquals(v) => sample != v,
            Comparison::MemberOf(ref set) => set.iter().any(|&v| sample == v),
            Comparison::GreaterOrEqual(v) => sample >= v,
            Comparison::LessOrEqual(v) => sample <= v,
            Comparison::Greater(v) => sample > v,
            Comparison::Less(v) => sample < v,
            Comparison::Between(lo, hi) => sample >= lo && sample <= hi,
        }
    }
}

/// Inclusion predicates keyed by behaviour column name.
pub type PredicateSet = BTreeMap<String, Comparison>;

/// Builds the inclusion mask for a session.
///
/// Starts from all-true and ANDs in every predicate whose name matches a
/// column. Predicates naming an absent column are logged and skipped: a
/// configuration may reference fields a given session does not record.
pub fn select_time_window(table: &BehaviorTable, predicates: &PredicateSet) -> Vec<bool> {
    let mut mask = vec![true; table.len()];

    for (name, comparison) in predicates {
        let Some(column) = table.column(name) else {
            warn!(covariate = %name, "inclusion predicate references unknown covariate, skipping");
            continue;
        };
        for (keep, &sample) in mask.iter_mut().zip(column) {
            *keep &= comparison.matches(sample);
        }
    }

    mask
}

/// Filters candidate cells by their spike count inside the mask.
///
/// Absent samples count as zero. A cell is kept when its total strictly
/// exceeds `min_spikes`. The result is a subset of `candidates` in the same
/// order.
///
/// # Panics
///
/// Panics if a candidate index is out of range for `spikes`.
pub fn select_cells(
    spikes: &SpikeMatrix,
    candidates: &[usize],
    mask: &[bool],
    min_spikes: f64,
) -> Vec<usize> {
    candidates
        .iter()
        .copied()
        .filter(|&cell| {
            let total: f64 = spikes
                .cell(cell)
                .iter()
                .zip(mask)
                .filter(|&(v, &keep)| keep && !v.is_nan())
                .map(|(v, _)| v)
                .sum();
            let keep = total > min_spikes;
            if !keep {
                debug!(cell, total, min_spikes, "cell below spike threshold, excluded");
            }
            keep
        })
        .collect()
}
