//! Summary statistics from the real and shuffled correlation tensors.
//!
//! For every pair `(i, j)` and lag `k`, with `S` shuffle draws `sh_s`:
//!
//! ```text
//! signal(i, j, k)   = mean_s  sh_s(i, j, k)
//! noise(i, j, k)    = cc(i, j, k) - signal(i, j, k)
//! noise_sd(i, j, k) = std_s  (cc(i, j, k) - sh_s(i, j, k))
//! ```
//!
//! Both reductions skip absent draws. Note that `noise_sd` is the dispersion
//! of the per-draw noise estimate, which for a fixed `cc` equals the
//! dispersion of the shuffled values themselves.
//!
//! Per pair, the best correlation and lag are the value and lag of the
//! largest-magnitude entry of the real correlogram (first occurrence on ties).
//! The p-value is the fraction of draws whose own largest magnitude over lags
//! strictly exceeds the real best magnitude, i.e. `k / S` for an integer `k`.

use crate::missing::PresentReduce;
use crate::tensor::{CorrTensor, PairMatrix, ShuffleTensor};
use crate::xcorr::LagAxis;

/// Per-lag and per-pair statistics in the analysed (reduced) index space.
#[derive(Debug, Clone, PartialEq)]
pub struct PairStatistics {
    pub signal: CorrTensor,
    pub noise: CorrTensor,
    pub noise_sd: CorrTensor,
    pub best_corr: PairMatrix,
    /// Lag of `best_corr`, in seconds
    pub best_lag: PairMatrix,
    pub p_value: PairMatrix,
}

/// Mean over draws of every `(i, j, k)` entry, ignoring absent draws.
pub fn signal_estimate(shuffles: &ShuffleTensor, n_cells: usize, n_lags: usize) -> CorrTensor {
    let mut signal = CorrTensor::new(n_cells, n_lags);
    for i in 0..n_cells {
        for j in 0..n_cells {
            for k in 0..n_lags {
                signal.set(i, j, k, shuffles.across_draws(i, j, k).mean_present());
            }
        }
    }
    signal
}

/// Standard deviation over draws of `real - shuffled`.
pub fn noise_dispersion(real: &CorrTensor, shuffles: &ShuffleTensor) -> CorrTensor {
    let (n_cells, n_lags) = (real.n_cells(), real.n_lags());
    let mut sd = CorrTensor::new(n_cells, n_lags);
    for i in 0..n_cells {
        for j in 0..n_cells {
            for k in 0..n_lags {
                let Some(cc) = real.get(i, j, k) else { continue };
                let value = shuffles
                    .across_draws(i, j, k)
                    .map(|sh| sh.map(|v| cc - v))
                    .std_present();
                sd.set(i, j, k, value);
            }
        }
    }
    sd
}

/// Empirical permutation p-value for pair `(i, j)` given its real best value.
///
/// `None` when there are no draws.
pub fn pair_p_value(shuffles: &ShuffleTensor, i: usize, j: usize, best: f64) -> Option<f64> {
    let n_shuffle = shuffles.n_shuffles();
    if n_shuffle == 0 {
        return None;
    }
    let exceed = shuffles
        .draws()
        .iter()
        .filter_map(|draw| draw.pair(i, j).iter().copied().argmax_abs())
        .filter(|&(_, v)| v.abs() > best.abs())
        .count();
    Some(exceed as f64 / n_shuffle as f64)
}

/// Computes every statistic from the real tensor and its shuffle stack.
///
/// # Panics
///
/// Panics if the shuffle draws and the real tensor differ in shape.
pub fn finalize(real: &CorrTensor, shuffles: &ShuffleTensor, lags: &LagAxis) -> PairStatistics {
    let (n_cells, n_lags) = (real.n_cells(), real.n_lags());
    let seconds = lags.seconds();

    let signal = signal_estimate(shuffles, n_cells, n_lags);
    let noise = real.zip_map(&signal, |cc, sig| Some(cc? - sig?));
    let noise_sd = noise_dispersion(real, shuffles);

    let mut best_corr = PairMatrix::new(n_cells);
    let mut best_lag = PairMatrix::new(n_cells);
    let mut p_value = PairMatrix::new(n_cells);
    for i in 0..n_cells {
        for j in 0..n_cells {
            let Some((k, v)) = real.pair(i, j).iter().copied().argmax_abs() else {
                continue;
            };
            best_corr.set(i, j, Some(v));
            best_lag.set(i, j, Some(seconds[k]));
            p_value.set(i, j, pair_p_value(shuffles, i, j, v));
        }
    }

    PairStatistics {
        signal,
        noise,
        noise_sd,
        best_corr,
        best_lag,
        p_value,
    }
}
