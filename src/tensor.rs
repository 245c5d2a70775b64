//! Cell × cell × lag correlation tensors.
//!
//! A [`CorrTensor`] stores one correlogram per ordered cell pair, all sharing
//! the same lag axis. Entries are `Option<f64>`; absent marks a pair (or lag)
//! that could not be evaluated. The pairwise pass fills only the strict upper
//! triangle and then calls [`CorrTensor::symmetrize_with_lag_reversal`], which
//! establishes
//!
//! ```text
//! cc(j, i, lag) == cc(i, j, -lag)
//! ```
//!
//! A [`ShuffleTensor`] stacks one correlation tensor per shuffle draw.
//!
//! # Example
//!
//! ```
//! use spikecorr::CorrTensor;
//!
//! let mut cc = CorrTensor::new(2, 3);
//! cc.pair_mut(0, 1).copy_from_slice(&[Some(0.1), Some(0.5), Some(0.2)]);
//! cc.symmetrize_with_lag_reversal();
//!
//! assert_eq!(cc.pair(1, 0), &[Some(0.2), Some(0.5), Some(0.1)]);
//! assert_eq!(cc.get(0, 0, 1), None);
//! ```

use serde::{Deserialize, Serialize};

/// Dense cell × cell × lag tensor of optional values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrTensor {
    n_cells: usize,
    n_lags: usize,
    values: Vec<Option<f64>>,
}

impl CorrTensor {
    /// Creates a tensor with every entry absent.
    pub fn new(n_cells: usize, n_lags: usize) -> Self {
        Self {
            n_cells,
            n_lags,
            values: vec![None; n_cells * n_cells * n_lags],
        }
    }

    pub fn n_cells(&self) -> usize {
        self.n_cells
    }

    pub fn n_lags(&self) -> usize {
        self.n_lags
    }

    #[inline]
    fn offset(&self, i: usize, j: usize) -> usize {
        debug_assert!(i < self.n_cells && j < self.n_cells);
        (i * self.n_cells + j) * self.n_lags
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize, lag: usize) -> Option<f64> {
        self.values[self.offset(i, j) + lag]
    }

    #[inline]
    pub fn set(&mut self, i: usize, j: usize, lag: usize, value: Option<f64>) {
        let at = self.offset(i, j) + lag;
        self.values[at] = value;
    }

    /// Correlogram of the ordered pair `(i, j)` across all lags.
    pub fn pair(&self, i: usize, j: usize) -> &[Option<f64>] {
        let start = self.offset(i, j);
        &self.values[start..start + self.n_lags]
    }

    pub fn pair_mut(&mut self, i: usize, j: usize) -> &mut [Option<f64>] {
        let start = self.offset(i, j);
        &mut self.values[start..start + self.n_lags]
    }

    /// Length of the row slab holding the correlograms `(i, 0..n_cells)`.
    ///
    /// Chunking [`values_mut`](Self::values_mut) by this length yields one
    /// non-overlapping slab per first-cell index.
    pub(crate) fn slab_len(&self) -> usize {
        (self.n_cells * self.n_lags).max(1)
    }

    pub(crate) fn values_mut(&mut self) -> &mut [Option<f64>] {
        &mut self.values
    }

    /// Mirrors the strict upper triangle into the strict lower triangle,
    /// reversing the lag axis: `cc[j][i][k] = cc[i][j][L - 1 - k]`.
    ///
    /// The diagonal and upper triangle are left untouched.
    pub fn symmetrize_with_lag_reversal(&mut self) {
        let n_lags = self.n_lags;
        for i in 0..self.n_cells {
            for j in (i + 1)..self.n_cells {
                let src = self.offset(i, j);
                let dst = self.offset(j, i);
                for k in 0..n_lags {
                    self.values[dst + k] = self.values[src + n_lags - 1 - k];
                }
            }
        }
    }

    /// Applies `f` to every entry pairwise with `other`.
    ///
    /// # Panics
    ///
    /// Panics if the shapes differ.
    pub fn zip_map(
        &self,
        other: &CorrTensor,
        mut f: impl FnMut(Option<f64>, Option<f64>) -> Option<f64>,
    ) -> CorrTensor {
        assert_eq!(
            (self.n_cells, self.n_lags),
            (other.n_cells, other.n_lags),
            "tensor shapes differ"
        );
        CorrTensor {
            n_cells: self.n_cells,
            n_lags: self.n_lags,
            values: self
                .values
                .iter()
                .zip(&other.values)
                .map(|(&a, &b)| f(a, b))
                .collect(),
        }
    }

    pub fn values(&self) -> &[Option<f64>] {
        &self.values
    }
}

/// One correlation tensor per shuffle draw, indexed `[shuffle](i, j, lag)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShuffleTensor {
    draws: Vec<CorrTensor>,
}

impl ShuffleTensor {
    /// Stacks draws that share one shape.
    ///
    /// # Panics
    ///
    /// Panics if the draws differ in shape.
    pub fn from_draws(draws: Vec<CorrTensor>) -> Self {
        if let Some(first) = draws.first() {
            let shape = (first.n_cells, first.n_lags);
            assert!(
                draws.iter().all(|d| (d.n_cells, d.n_lags) == shape),
                "shuffle draws differ in shape"
            );
        }
        Self { draws }
    }

    pub fn n_shuffles(&self) -> usize {
        self.draws.len()
    }

    pub fn draw(&self, shuffle: usize) -> &CorrTensor {
        &self.draws[shuffle]
    }

    pub fn draws(&self) -> &[CorrTensor] {
        &self.draws
    }

    /// Values of one `(i, j, lag)` entry across every draw.
    pub fn across_draws(
        &self,
        i: usize,
        j: usize,
        lag: usize,
    ) -> impl Iterator<Item = Option<f64>> + '_ {
        self.draws.iter().map(move |d| d.get(i, j, lag))
    }
}

/// Dense cell × cell matrix of optional scalars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairMatrix {
    n_cells: usize,
    values: Vec<Option<f64>>,
}

impl PairMatrix {
    pub fn new(n_cells: usize) -> Self {
        Self {
            n_cells,
            values: vec![None; n_cells * n_cells],
        }
    }

    pub fn n_cells(&self) -> usize {
        self.n_cells
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> Option<f64> {
        self.values[i * self.n_cells + j]
    }

    #[inline]
    pub fn set(&mut self, i: usize, j: usize, value: Option<f64>) {
        self.values[i * self.n_cells + j] = value;
    }

    pub fn values(&self) -> &[Option<f64>] {
        &self.values
    }
}
