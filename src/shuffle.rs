//! Within-bin permutation of spike trains.
//!
//! For every joint behavioural bin and every cell independently, the cell's
//! values at the samples belonging to that bin are permuted uniformly at
//! random. The multiset of values per (bin, cell) is preserved exactly, values
//! never move between bins, and cells are permuted independently, so tuning
//! to the binned covariates survives while fine-timescale coincidence between
//! cells is destroyed.
//!
//! # Reproducibility
//!
//! Each permutation draws from its own generator, seeded by mixing
//! `(seed, shuffle index, bin id, cell)` through SplitMix64. No generator is
//! shared across units of work, so results do not depend on how many threads
//! run or in which order they finish.
//!
//! # Example
//!
//! ```
//! use spikecorr::shuffle::{shuffle_within_bins, BinGroups};
//! use spikecorr::SpikeMatrix;
//!
//! let spikes = SpikeMatrix::from_columns(vec![vec![1.0, 0.0, 0.0, 2.0, 0.0, 0.0]]).unwrap();
//! // Samples 0-2 in bin 0, samples 3-5 in bin 1
//! let groups = BinGroups::from_bins(&[Some(0), Some(0), Some(0), Some(1), Some(1), Some(1)]);
//!
//! let shuffled = shuffle_within_bins(&spikes, &groups, 42, 0);
//! let first: f64 = shuffled.cell(0)[..3].iter().sum();
//! let second: f64 = shuffled.cell(0)[3..].iter().sum();
//! assert_eq!((first, second), (1.0, 2.0));
//!
//! // Same seed, same draw
//! assert_eq!(shuffled, shuffle_within_bins(&spikes, &groups, 42, 0));
//! ```

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rayon::prelude::*;

use crate::session::SpikeMatrix;

/// Sample positions grouped by joint bin id, ascending within each bin.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BinGroups {
    groups: BTreeMap<usize, Vec<usize>>,
}

impl BinGroups {
    /// Groups sample positions by bin; samples without a bin are left out.
    pub fn from_bins(bins: &[Option<usize>]) -> Self {
        let mut groups: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for (t, bin) in bins.iter().enumerate() {
            if let Some(id) = *bin {
                groups.entry(id).or_default().push(t);
            }
        }
        Self { groups }
    }

    /// Like [`from_bins`](Self::from_bins), leaving out samples outside `mask`.
    pub fn from_masked_bins(bins: &[Option<usize>], mask: &[bool]) -> Self {
        let masked: Vec<Option<usize>> = bins
            .iter()
            .zip(mask)
            .map(|(&bin, &keep)| if keep { bin } else { None })
            .collect();
        Self::from_bins(&masked)
    }

    /// Bin ids that hold at least one sample.
    pub fn bin_ids(&self) -> impl Iterator<Item = usize> + '_ {
        self.groups.keys().copied()
    }

    /// Positions belonging to one bin.
    pub fn positions(&self, bin: usize) -> &[usize] {
        self.groups.get(&bin).map(Vec::as_slice).unwrap_or(&[])
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (usize, &[usize])> + '_ {
        self.groups.iter().map(|(&id, p)| (id, p.as_slice()))
    }
}

#[inline]
fn splitmix64(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Seed for one (shuffle, bin, cell) permutation.
pub fn derive_seed(seed: u64, shuffle: usize, bin: usize, cell: usize) -> u64 {
    let mut h = splitmix64(seed);
    for part in [shuffle, bin, cell] {
        h = splitmix64(h ^ part as u64);
    }
    h
}

/// Permutes one cell's values within every bin.
pub fn shuffle_cell(
    train: &[f64],
    groups: &BinGroups,
    seed: u64,
    shuffle: usize,
    cell: usize,
) -> Vec<f64> {
    let mut out = train.to_vec();
    let mut values = Vec::new();

    for (bin, positions) in groups.iter() {
        // Nothing to permute
        if positions.len() < 2 {
            continue;
        }
        values.clear();
        values.extend(positions.iter().map(|&t| train[t]));

        let mut rng = StdRng::seed_from_u64(derive_seed(seed, shuffle, bin, cell));
        values.shuffle(&mut rng);

        for (&t, &v) in positions.iter().zip(&values) {
            out[t] = v;
        }
    }

    out
}

/// Shuffled copy of every cell of `spikes`, for draw number `shuffle`.
///
/// Cells are identified by their column position, so the same seed gives the
/// same draw for the same columns however the matrix was assembled.
pub fn shuffle_within_bins(
    spikes: &SpikeMatrix,
    groups: &BinGroups,
    seed: u64,
    shuffle: usize,
) -> SpikeMatrix {
    let cells: Vec<Vec<f64>> = (0..spikes.n_cells())
        .into_par_iter()
        .map(|cell| shuffle_cell(spikes.cell(cell), groups, seed, shuffle, cell))
        .collect();
    SpikeMatrix::from_validated(spikes.n_samples(), cells)
}
