//! Reindexing of subset results into full-size outputs.
//!
//! Statistics are computed over the analysed cells only, indexed `0..k`.
//! Scattering places entry `(a, b)` at `(indices[a], indices[b])` of a matrix
//! sized to the original cell count; every other entry stays absent. Nothing
//! is recomputed.

use crate::tensor::{CorrTensor, PairMatrix};

/// Expands a reduced correlation tensor to `n_total` cells.
///
/// # Panics
///
/// Panics if `indices` does not match the tensor's cell count or holds an
/// index `>= n_total`.
pub fn scatter_tensor(reduced: &CorrTensor, indices: &[usize], n_total: usize) -> CorrTensor {
    assert_eq!(reduced.n_cells(), indices.len(), "one index per analysed cell");
    let mut full = CorrTensor::new(n_total, reduced.n_lags());
    for (a, &i) in indices.iter().enumerate() {
        for (b, &j) in indices.iter().enumerate() {
            full.pair_mut(i, j).copy_from_slice(reduced.pair(a, b));
        }
    }
    full
}

/// Expands a reduced pair matrix to `n_total` cells.
///
/// # Panics
///
/// Same conditions as [`scatter_tensor`].
pub fn scatter_matrix(reduced: &PairMatrix, indices: &[usize], n_total: usize) -> PairMatrix {
    assert_eq!(reduced.n_cells(), indices.len(), "one index per analysed cell");
    let mut full = PairMatrix::new(n_total);
    for (a, &i) in indices.iter().enumerate() {
        for (b, &j) in indices.iter().enumerate() {
            full.set(i, j, reduced.get(a, b));
        }
    }
    full
}
