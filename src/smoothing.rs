//! Boxcar smoothing of spike trains.
//!
//! The correlation input for each cell is a centred moving *sum* over an odd
//! window: the moving average scaled by the window length. Near the edges the
//! window shrinks to the samples that exist and the average is taken over
//! those, so boundary samples are not zero-padded.
//!
//! ```text
//! w    = 2 * floor(0.5 * timewin * rate) + 1
//! s[t] = w * mean(x[t - h ..= t + h] ∩ [0, N))      with h = (w - 1) / 2
//! ```
//!
//! Absent input samples are left out of the mean. A window with no present
//! sample produces an absent output.

use rayon::prelude::*;

use crate::missing::from_raw;
use crate::session::SpikeMatrix;

/// Odd smoothing window length in samples for a duration in seconds.
///
/// The half-width is capped at `n_samples`: a wider window already spans the
/// whole train from every sample.
///
/// # Example
///
/// ```
/// use spikecorr::smoothing::window_length;
///
/// assert_eq!(window_length(0.01, 1000.0, 5000), 11);
/// assert_eq!(window_length(0.005, 1000.0, 5000), 5);
/// // Windows shorter than two samples collapse to the identity
/// assert_eq!(window_length(0.001, 1000.0, 5000), 1);
/// ```
pub fn window_length(timewin: f64, sample_rate: f64, n_samples: usize) -> usize {
    let half = libm::floor(0.5 * timewin * sample_rate);
    if half.is_finite() && half > 0.0 {
        2 * half.min(n_samples as f64) as usize + 1
    } else {
        1
    }
}

/// Moving sum of one spike train with shrinking edges.
///
/// # Example
///
/// ```
/// use spikecorr::smoothing::boxcar_sum;
///
/// let smoothed = boxcar_sum(&[0.0, 0.0, 1.0, 0.0, 0.0], 3);
/// assert_eq!(smoothed, vec![Some(0.0), Some(1.0), Some(1.0), Some(1.0), Some(0.0)]);
/// ```
pub fn boxcar_sum(train: &[f64], window: usize) -> Vec<Option<f64>> {
    let n = train.len();
    let half = window / 2;
    let scale = window as f64;

    // Prefix sums of present values and of present-sample counts
    let mut sums = Vec::with_capacity(n + 1);
    let mut counts = Vec::with_capacity(n + 1);
    sums.push(0.0);
    counts.push(0usize);
    for &x in train {
        let (s, c) = match from_raw(x) {
            Some(v) => (v, 1),
            None => (0.0, 0),
        };
        sums.push(sums[sums.len() - 1] + s);
        counts.push(counts[counts.len() - 1] + c);
    }

    (0..n)
        .map(|t| {
            let lo = t.saturating_sub(half);
            let hi = (t + half + 1).min(n);
            let present = counts[hi] - counts[lo];
            if present == 0 {
                None
            } else {
                Some(scale * (sums[hi] - sums[lo]) / present as f64)
            }
        })
        .collect()
}

/// Smooths every cell of a spike matrix with the same window.
pub fn smooth_matrix(spikes: &SpikeMatrix, window: usize) -> Vec<Vec<Option<f64>>> {
    (0..spikes.n_cells())
        .into_par_iter()
        .map(|cell| boxcar_sum(spikes.cell(cell), window))
        .collect()
}
