//! Pairwise kinship coefficients over a pedigree, and relatedness pruning of the resulting matrix.

/// Absolute tolerance used whenever two kinship coefficients (or a coefficient and a threshold) are compared.
///
/// Coefficients are sums of powers of 0.5, thus exact in theory, but floating point accumulation
/// over deep pedigrees may drift by a few ulps.
pub const KINSHIP_EPSILON: f64 = 1e-9;

mod matrix;
pub use matrix::KinshipMatrix;

mod engine;
pub use engine::{compute_kinship, CohortKinship};

pub mod pruner;
pub use pruner::{prune, validate_pruned, PruneReport, PruneStrategy, RelatednessGraph};

mod error;
pub use error::{KinshipError, PruneError};

/// Index of entry `(i, j)` within a packed, row-major lower triangular table.
#[inline]
pub(crate) fn packed_index(i: usize, j: usize) -> usize {
    let (row, col) = if i >= j {(i, j)} else {(j, i)};
    row * (row + 1) / 2 + col
}

/// Number of entries of a packed lower triangular table of dimension `n`, or `None` on overflow.
#[inline]
pub(crate) fn packed_len(n: usize) -> Option<usize> {
    n.checked_add(1)?.checked_mul(n).map(|len| len / 2)
}
