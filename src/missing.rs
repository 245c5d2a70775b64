//! Absent-value arithmetic.
//!
//! Every signal, tensor and statistic in this crate stores `Option<f64>`:
//! `None` marks a sample that was excluded, out of range, or numerically
//! undefined. Reductions skip absent entries instead of propagating them, and
//! a reduction over nothing present is itself absent.
//!
//! # Example
//!
//! ```
//! use spikecorr::missing::{from_raw, PresentReduce};
//!
//! let values = [Some(1.0), None, Some(3.0)];
//! assert_eq!(values.iter().copied().sum_present(), Some(4.0));
//! assert_eq!(values.iter().copied().mean_present(), Some(2.0));
//!
//! let none: [Option<f64>; 2] = [None, None];
//! assert_eq!(none.iter().copied().sum_present(), None);
//!
//! assert_eq!(from_raw(f64::NAN), None);
//! ```

use crate::stats::RunningStats;

/// Convert a raw sample into an optional value, reading `NaN` as absent.
#[inline]
pub fn from_raw(value: f64) -> Option<f64> {
    if value.is_nan() {
        None
    } else {
        Some(value)
    }
}

/// Reductions over optional values that ignore absent entries.
pub trait PresentReduce: Iterator<Item = Option<f64>> + Sized {
    /// Sum of the present values, or `None` if nothing is present.
    fn sum_present(self) -> Option<f64> {
        self.flatten().fold(None, |acc, v| Some(acc.unwrap_or(0.0) + v))
    }

    /// Sum of the present values, counting absent entries as zero.
    fn sum_or_zero(self) -> f64 {
        self.flatten().sum()
    }

    /// Arithmetic mean of the present values.
    fn mean_present(self) -> Option<f64> {
        let stats = self.collect_stats();
        stats.mean()
    }

    /// Sample standard deviation (n - 1) of the present values.
    fn std_present(self) -> Option<f64> {
        let stats = self.collect_stats();
        stats.std_dev()
    }

    /// Index and value of the entry with the largest magnitude.
    ///
    /// Ties resolve to the first occurrence.
    fn argmax_abs(self) -> Option<(usize, f64)> {
        let mut best: Option<(usize, f64)> = None;
        for (idx, value) in self.enumerate() {
            let Some(v) = value else { continue };
            match best {
                Some((_, b)) if v.abs() <= b.abs() => {}
                _ => best = Some((idx, v)),
            }
        }
        best
    }

    /// Feed every present value into a [`RunningStats`] accumulator.
    fn collect_stats(self) -> RunningStats {
        let mut stats = RunningStats::new();
        for v in self.flatten() {
            stats.update(v);
        }
        stats
    }
}

impl<I: Iterator<Item = Option<f64>>> PresentReduce for I {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sum_present_skips_absent() {
        let values = [Some(2.0), None, Some(-0.5), None];
        assert_eq!(values.iter().copied().sum_present(), Some(1.5));
        assert_eq!(values.iter().copied().sum_or_zero(), 1.5);
    }

    #[test]
    fn test_empty_reductions_are_absent() {
        let empty: [Option<f64>; 0] = [];
        assert_eq!(empty.iter().copied().sum_present(), None);
        assert_eq!(empty.iter().copied().mean_present(), None);
        assert_eq!(empty.iter().copied().std_present(), None);
        assert_eq!(empty.iter().copied().argmax_abs(), None);
        assert_eq!(empty.iter().copied().sum_or_zero(), 0.0);
    }

    #[test]
    fn test_std_present() {
        let values = [Some(1.0), Some(2.0), None, Some(3.0), Some(4.0)];
        let std = values.iter().copied().std_present().unwrap();
        // Sample variance of 1..=4 is 5/3
        assert!((std - (5.0f64 / 3.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_argmax_abs_first_occurrence() {
        let values = [Some(0.2), Some(-0.9), None, Some(0.9), Some(0.1)];
        assert_eq!(values.iter().copied().argmax_abs(), Some((1, -0.9)));
    }

    #[test]
    fn test_from_raw() {
        assert_eq!(from_raw(3.0), Some(3.0));
        assert_eq!(from_raw(f64::NAN), None);
        assert_eq!(from_raw(f64::INFINITY), Some(f64::INFINITY));
    }
}
