//! Shuffle-corrected pairwise cross-correlation analysis.
//!
//! [`CrossSpikeAnalysis`] runs the full pipeline on one session:
//!
//! 1. Build the inclusion mask from the predicates ([`crate::selection`])
//! 2. Keep candidate cells with enough spikes inside the mask
//! 3. Smooth the selected spike trains and correlate every pair ([`crate::xcorr`])
//! 4. Bin the shuffle covariates and draw the null distribution ([`crate::null`])
//! 5. Derive signal, noise, best lag and p-values ([`crate::finalize`])
//! 6. Scatter everything back to original cell indexing ([`crate::scatter`])
//!
//! # Example
//!
//! ```
//! use spikecorr::{AnalysisParams, BehaviorTable, CrossSpikeAnalysis, SpikeMatrix};
//!
//! let n = 400;
//! let timestamps: Vec<f64> = (0..n).map(|i| i as f64 / 1000.0).collect();
//! let behavior = BehaviorTable::new(timestamps).unwrap();
//!
//! let train: Vec<f64> = (0..n).map(|t| (t % 37 == 5) as u8 as f64).collect();
//! let silent = vec![0.0; n];
//! let spikes = SpikeMatrix::from_columns(vec![train.clone(), silent, train]).unwrap();
//!
//! let params = AnalysisParams {
//!     smoothing_window: 0.004,
//!     max_lag: 0.01,
//!     n_shuffle: 20,
//!     seed: 7,
//!     ..AnalysisParams::default()
//! };
//! let results = CrossSpikeAnalysis::new(params).unwrap().run(&behavior, &spikes).unwrap();
//!
//! // The silent cell is dropped; outputs keep original indexing
//! assert_eq!(results.cell_indices, vec![0, 2]);
//! assert_eq!(results.best_lag.get(0, 2), Some(0.0));
//! assert!((results.best_corr.get(0, 2).unwrap() - 1.0).abs() < 1e-9);
//! assert_eq!(results.p_value.get(0, 2), Some(0.0));
//! assert_eq!(results.best_corr.get(0, 1), None);
//! ```

use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::discretize::discretize;
use crate::error::{AnalysisError, Result};
use crate::finalize::finalize;
use crate::null::{null_distribution, NullConfig};
use crate::params::AnalysisParams;
use crate::scatter::{scatter_matrix, scatter_tensor};
use crate::selection::{select_cells, select_time_window};
use crate::session::{BehaviorTable, SpikeMatrix};
use crate::shuffle::BinGroups;
use crate::smoothing::{smooth_matrix, window_length};
use crate::tensor::{CorrTensor, PairMatrix};
use crate::xcorr::{cross_correlate, LagAxis};

/// Relative disagreement tolerated between configured and measured rates.
const SAMPLE_RATE_TOLERANCE: f64 = 0.01;

/// Parameters as actually applied to a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectiveParams {
    /// The parameter bundle the analysis was run with
    pub params: AnalysisParams,
    /// Sampling rate derived from the timeline (Hz)
    pub sample_rate: f64,
    /// Smoothing window in samples
    pub smoothing_samples: usize,
    /// Resolved inclusion mask over the timeline
    pub time_mask: Vec<bool>,
}

/// Output bundle, every matrix sized to the original cell count.
///
/// Entries involving a cell outside [`cell_indices`](Self::cell_indices), and
/// diagonal entries, are absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossCorrResults {
    /// Lag of every correlogram bin (seconds)
    pub lags: Vec<f64>,
    /// Correlograms of the recorded spike trains
    pub real: CorrTensor,
    /// Real minus the shuffle mean
    pub noise: CorrTensor,
    /// Shuffle mean, the part explained by shared tuning
    pub signal: CorrTensor,
    /// Standard deviation over draws of real minus shuffled
    pub noise_sd: CorrTensor,
    /// Largest-magnitude real correlation per pair
    pub best_corr: PairMatrix,
    /// Lag of `best_corr` (seconds)
    pub best_lag: PairMatrix,
    /// Fraction of draws whose peak magnitude exceeds `best_corr`
    pub p_value: PairMatrix,
    /// Original indices of the analysed cells
    pub cell_indices: Vec<usize>,
    pub effective: EffectiveParams,
}

/// Configured cross-correlation engine.
#[derive(Debug, Clone)]
pub struct CrossSpikeAnalysis {
    params: AnalysisParams,
}

impl CrossSpikeAnalysis {
    /// Validates `params` and builds the engine.
    pub fn new(params: AnalysisParams) -> Result<Self> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn params(&self) -> &AnalysisParams {
        &self.params
    }

    /// Runs the analysis on one session.
    ///
    /// # Errors
    ///
    /// Structural problems only: a spike matrix not aligned with the timeline,
    /// an explicit cell index out of range or repeated, or a shuffle covariate
    /// missing from the behaviour table. Degenerate cells and pairs give absent
    /// entries instead.
    #[instrument(skip_all, fields(n_cells = spikes.n_cells(), n_samples = behavior.len()))]
    pub fn run(&self, behavior: &BehaviorTable, spikes: &SpikeMatrix) -> Result<CrossCorrResults> {
        let params = &self.params;
        let n_total = spikes.n_cells();
        if n_total > 0 && spikes.n_samples() != behavior.len() {
            return Err(AnalysisError::LengthMismatch {
                what: "spike matrix rows".into(),
                expected: behavior.len(),
                actual: spikes.n_samples(),
            });
        }

        let sample_rate = behavior.sample_rate();
        if let Some(configured) = params.sample_rate {
            if (configured - sample_rate).abs() > SAMPLE_RATE_TOLERANCE * sample_rate {
                warn!(
                    configured,
                    measured = sample_rate,
                    "configured sample rate disagrees with timeline"
                );
            }
        }

        let time_mask = select_time_window(behavior, &params.predicates);
        let candidates = params.cells.resolve(n_total)?;
        let cell_indices = select_cells(spikes, &candidates, &time_mask, params.min_spikes);
        if cell_indices.len() < 2 {
            warn!(
                n_selected = cell_indices.len(),
                "fewer than two cells selected, no pairs to correlate"
            );
        }
        let subset = spikes.select(&cell_indices)?;
        let bins = discretize(behavior, &params.shuffle_covariates)?;

        let n_samples = behavior.len();
        let window = window_length(params.smoothing_window, sample_rate, n_samples);
        let lags = LagAxis::from_max_lag(params.max_lag, sample_rate, n_samples);
        info!(
            n_selected = cell_indices.len(),
            n_lags = lags.len(),
            window,
            n_shuffle = params.n_shuffle,
            "starting cross-correlation analysis"
        );

        let smoothed = smooth_matrix(&subset, window);
        let real = cross_correlate(&smoothed, &time_mask, &lags);

        let groups = BinGroups::from_masked_bins(&bins, &time_mask);
        let config = NullConfig {
            groups: &groups,
            mask: &time_mask,
            window,
            lags: &lags,
            seed: params.seed,
        };
        let shuffles = null_distribution(&subset, &config, params.n_shuffle);
        let stats = finalize(&real, &shuffles, &lags);

        let results = CrossCorrResults {
            lags: lags.seconds(),
            real: scatter_tensor(&real, &cell_indices, n_total),
            noise: scatter_tensor(&stats.noise, &cell_indices, n_total),
            signal: scatter_tensor(&stats.signal, &cell_indices, n_total),
            noise_sd: scatter_tensor(&stats.noise_sd, &cell_indices, n_total),
            best_corr: scatter_matrix(&stats.best_corr, &cell_indices, n_total),
            best_lag: scatter_matrix(&stats.best_lag, &cell_indices, n_total),
            p_value: scatter_matrix(&stats.p_value, &cell_indices, n_total),
            cell_indices,
            effective: EffectiveParams {
                params: params.clone(),
                sample_rate,
                smoothing_samples: window,
                time_mask,
            },
        };
        info!("cross-correlation analysis finished");
        Ok(results)
    }
}

/// Validates `params` and runs one analysis.
pub fn cross_spike_analysis(
    behavior: &BehaviorTable,
    spikes: &SpikeMatrix,
    params: AnalysisParams,
) -> Result<CrossCorrResults> {
    CrossSpikeAnalysis::new(params)?.run(behavior, spikes)
}
