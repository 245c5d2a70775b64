//! Shuffle-corrected pairwise cross-correlation of spike trains.
//!
//! Given a behaviour timeline and a spike-count matrix recorded on the same
//! samples, [`CrossSpikeAnalysis`] selects a time window and a set of cells,
//! smooths each train, and computes a lag-resolved correlogram for every
//! ordered cell pair. Spike trains are then permuted within joint bins of
//! chosen behavioural covariates to build a null distribution, which splits
//! each correlogram into a covariate-explained signal part and a residual
//! noise part and yields an empirical p-value for the peak.
//!
//! Missing values are `Option<f64>` throughout; `NaN` inputs are read as
//! absent (see [`missing`]).

pub mod analysis;
pub mod discretize;
pub mod error;
pub mod finalize;
pub mod missing;
pub mod null;
pub mod params;
pub mod scatter;
pub mod selection;
pub mod session;
pub mod shuffle;
pub mod smoothing;
mod stats;
pub mod tensor;
pub mod triggered;
pub mod xcorr;

pub use analysis::{cross_spike_analysis, CrossCorrResults, CrossSpikeAnalysis, EffectiveParams};
pub use discretize::{discretize, joint_bin_count, Covariate};
pub use error::{AnalysisError, Result};
pub use finalize::{finalize, PairStatistics};
pub use missing::PresentReduce;
pub use null::{null_distribution, NullConfig};
pub use params::{AnalysisParams, CellSubset};
pub use scatter::{scatter_matrix, scatter_tensor};
pub use selection::{select_cells, select_time_window, Comparison, PredicateSet};
pub use session::{BehaviorTable, SpikeMatrix};
pub use shuffle::{shuffle_within_bins, BinGroups};
pub use smoothing::{boxcar_sum, smooth_matrix, window_length};
pub use stats::RunningStats;
pub use tensor::{CorrTensor, PairMatrix, ShuffleTensor};
pub use triggered::{triggered_snippets, triggered_sum, Snippets};
pub use xcorr::{cross_correlate, LagAxis};
