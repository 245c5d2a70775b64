//! Error types for the cross-correlation engine.
//!
//! Only structural and configuration problems are errors. Numeric edge cases
//! (zero spikes in the window, a zero normalisation denominator, an empty
//! behavioural bin) are resolved locally into absent values and never reach
//! the caller as an `Err`.

use thiserror::Error;

/// Errors that reject an analysis before any computation starts.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    /// Bin edges for a shuffle covariate are unusable.
    #[error("invalid bin edges for covariate `{covariate}`: {reason}")]
    InvalidBinEdges {
        /// Covariate the edges belong to
        covariate: String,
        /// What is wrong with them
        reason: &'static str,
    },

    /// The shuffle count must be at least one.
    #[error("shuffle count must be positive")]
    InvalidShuffleCount,

    /// The smoothing window must be a positive, finite duration.
    #[error("smoothing window must be positive and finite, got {0}")]
    InvalidSmoothingWindow(f64),

    /// The maximum lag must be a non-negative, finite duration.
    #[error("max lag must be non-negative and finite, got {0}")]
    InvalidMaxLag(f64),

    /// The minimum spike threshold must be finite.
    #[error("minimum spike threshold must be finite, got {0}")]
    InvalidSpikeThreshold(f64),

    /// The timeline cannot produce a sampling rate.
    #[error("timeline with {0} samples cannot define a sampling rate")]
    InsufficientTimeline(usize),

    /// Two aligned sequences disagree in length.
    #[error("{what}: expected length {expected}, got {actual}")]
    LengthMismatch {
        /// Which input is misaligned
        what: String,
        /// Length implied by the timeline
        expected: usize,
        /// Length actually supplied
        actual: usize,
    },

    /// A spike count is negative.
    #[error("negative spike count for cell {cell} at sample {sample}")]
    NegativeSpikeCount {
        /// Column of the offending value
        cell: usize,
        /// Row of the offending value
        sample: usize,
    },

    /// An explicit cell subset names a column that does not exist.
    #[error("cell index {index} out of range for {n_cells} cells")]
    CellIndexOutOfRange {
        /// Requested index
        index: usize,
        /// Number of columns in the spike matrix
        n_cells: usize,
    },

    /// An explicit cell subset names the same column more than once.
    #[error("cell index {0} listed more than once")]
    DuplicateCellIndex(usize),

    /// A shuffle covariate is missing from the behaviour table.
    #[error("shuffle covariate `{0}` is not present in the behaviour table")]
    UnknownCovariate(String),
}

/// Result alias used throughout the crate.
pub type Result<T> = core::result::Result<T, AnalysisError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = AnalysisError::InvalidBinEdges {
            covariate: "speed".into(),
            reason: "edges must be strictly increasing",
        };
        assert_eq!(
            err.to_string(),
            "invalid bin edges for covariate `speed`: edges must be strictly increasing"
        );

        let err = AnalysisError::CellIndexOutOfRange {
            index: 7,
            n_cells: 3,
        };
        assert_eq!(err.to_string(), "cell index 7 out of range for 3 cells");

        let err = AnalysisError::DuplicateCellIndex(4);
        assert_eq!(err.to_string(), "cell index 4 listed more than once");
    }
}
