use indexmap::IndexSet;

use crate::{packed_index, packed_len, KinshipError, KINSHIP_EPSILON};

/// Symmetric matrix of kinship coefficients, over an ordered set of individuals.
///
/// # Fields:
/// - `ids`   : ordered, duplicate-free set of registry identifiers. Defines row/column indices.
/// - `values`: packed lower triangular coefficients. entry (i, j) with `j <= i` lies at `i*(i+1)/2 + j`
///
/// Symmetry holds by construction, since both (i, j) and (j, i) address the same entry.
/// Lookups on an unknown identifier return `None`: a missing coefficient is never silently read as 0.
#[derive(Debug, Clone, PartialEq)]
pub struct KinshipMatrix {
    ids   : IndexSet<String>,
    values: Vec<f64>,
}

impl KinshipMatrix {
    pub(crate) fn from_packed(ids: IndexSet<String>, values: Vec<f64>) -> Self {
        debug_assert_eq!(packed_len(ids.len()), Some(values.len()));
        Self { ids, values }
    }

    /// Build a kinship matrix from a dense, square table of coefficients (e.g. after reading it from a file).
    ///
    /// # Errors
    /// - `DuplicateId` if any identifier is present twice.
    /// - `NotSquare` if the number of rows or the length of any row does not match the number of ids.
    /// - `OutOfRange` or `InvalidSelfKinship` if a coefficient is not a valid kinship value.
    /// - `Asymmetric` if `rows[i][j]` and `rows[j][i]` differ by more than `KINSHIP_EPSILON`
    pub fn from_dense(ids: Vec<String>, rows: &[Vec<f64>]) -> Result<Self, KinshipError> {
        let n = ids.len();
        let mut set = IndexSet::with_capacity(n);
        for id in ids {
            if set.contains(&id) {
                return Err(KinshipError::DuplicateId(id))
            }
            set.insert(id);
        }

        if rows.len() != n {
            let id = set.last().cloned().unwrap_or_default();
            return Err(KinshipError::NotSquare{id, expected: n, got: rows.len()})
        }

        let len = packed_len(n).ok_or(KinshipError::TableTooLarge(n))?;
        let mut values = Vec::with_capacity(len);
        for (i, row) in rows.iter().enumerate() {
            let id = |k: usize| set.get_index(k).cloned().unwrap_or_default();
            if row.len() != n {
                return Err(KinshipError::NotSquare{id: id(i), expected: n, got: row.len()})
            }
            for (j, &value) in row.iter().enumerate().take(i + 1) {
                if !(0.0..=1.0).contains(&value) {
                    return Err(KinshipError::OutOfRange{a: id(i), b: id(j), value})
                }
                let mirror = rows[j][i];
                if (value - mirror).abs() > KINSHIP_EPSILON {
                    return Err(KinshipError::Asymmetric{a: id(i), b: id(j), ab: value, ba: mirror})
                }
                if i == j && value < 0.5 - KINSHIP_EPSILON {
                    return Err(KinshipError::InvalidSelfKinship{id: id(i), value})
                }
                values.push(value);
            }
        }
        Ok(Self::from_packed(set, values))
    }

    /// Number of individuals covered by this matrix.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Identifiers of this matrix, in row order.
    pub fn ids(&self) -> impl ExactSizeIterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }

    #[must_use]
    pub fn id(&self, index: usize) -> Option<&str> {
        self.ids.get_index(index).map(String::as_str)
    }

    #[must_use]
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.ids.get_index_of(id)
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Kinship coefficient between two individuals, or `None` if any of them is absent from the matrix.
    #[must_use]
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        Some(self.get_by_index(self.index_of(a)?, self.index_of(b)?))
    }

    /// Kinship coefficient between two row indices.
    ///
    /// # Panics
    /// - if any index is out of bounds.
    #[must_use]
    #[inline]
    pub fn get_by_index(&self, i: usize, j: usize) -> f64 {
        assert!(i < self.len() && j < self.len(), "Kinship matrix index out of bounds: ({i}, {j})");
        self.values[packed_index(i, j)]
    }

    /// Self-kinship of an individual: `0.5 * (1 + F)`
    #[must_use]
    pub fn self_kinship(&self, id: &str) -> Option<f64> {
        self.get(id, id)
    }

    /// Inbreeding coefficient of an individual: `2 * k(i, i) - 1`
    #[must_use]
    pub fn inbreeding(&self, id: &str) -> Option<f64> {
        self.self_kinship(id).map(|k| 2.0 * k - 1.0)
    }

    /// Iterate over the full row of individual `i` (diagonal included).
    pub fn row(&self, i: usize) -> impl Iterator<Item = f64> + '_ {
        (0..self.len()).map(move |j| self.get_by_index(i, j))
    }

    /// Maximum off-diagonal coefficient, along with the corresponding pair of indices.
    /// Ties are resolved in favor of the first pair encountered in row-major order.
    #[must_use]
    pub fn max_off_diagonal(&self) -> Option<(usize, usize, f64)> {
        let mut best: Option<(usize, usize, f64)> = None;
        for i in 1..self.len() {
            for j in 0..i {
                let value = self.get_by_index(i, j);
                if best.map_or(true, |(_, _, max)| value > max) {
                    best = Some((j, i, value));
                }
            }
        }
        best
    }

    /// Extract the submatrix spanning `ids`, in the provided order.
    ///
    /// # Errors
    /// - `UnknownIds`, listing every requested identifier absent from this matrix.
    /// - `DuplicateId` if an identifier is requested twice.
    pub fn subset<S: AsRef<str>>(&self, ids: &[S]) -> Result<Self, KinshipError> {
        let unknown: Vec<String> = ids.iter()
            .map(AsRef::as_ref)
            .filter(|id| !self.contains(id))
            .map(str::to_string)
            .collect();
        if !unknown.is_empty() {
            return Err(KinshipError::UnknownIds(unknown))
        }

        let mut set = IndexSet::with_capacity(ids.len());
        let mut indices = Vec::with_capacity(ids.len());
        for id in ids.iter().map(AsRef::as_ref) {
            if !set.insert(id.to_string()) {
                return Err(KinshipError::DuplicateId(id.to_string()))
            }
            indices.extend(self.index_of(id));
        }

        let len = packed_len(indices.len()).ok_or(KinshipError::TableTooLarge(indices.len()))?;
        let mut values = Vec::with_capacity(len);
        for (a, &i) in indices.iter().enumerate() {
            values.extend(indices[..=a].iter().map(|&j| self.get_by_index(i, j)));
        }
        Ok(Self::from_packed(set, values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(labels: &[&str]) -> Vec<String> {
        labels.iter().map(|s| s.to_string()).collect()
    }

    fn trio() -> KinshipMatrix {
        KinshipMatrix::from_dense(ids(&["A", "B", "C"]), &[
            vec![0.5,  0.0,  0.25],
            vec![0.0,  0.5,  0.25],
            vec![0.25, 0.25, 0.5 ],
        ]).expect("valid matrix")
    }

    #[test]
    fn symmetric_lookup() {
        let matrix = trio();
        assert_eq!(matrix.len(), 3);
        assert_eq!(matrix.get("A", "C"), Some(0.25));
        assert_eq!(matrix.get("C", "A"), Some(0.25));
        assert_eq!(matrix.get("A", "B"), Some(0.0));
        assert_eq!(matrix.get("A", "Z"), None);
        assert_eq!(matrix.inbreeding("C"), Some(0.0));
        assert_eq!(matrix.row(2).collect::<Vec<_>>(), vec![0.25, 0.25, 0.5]);
    }

    #[test]
    fn max_off_diagonal() {
        assert_eq!(trio().max_off_diagonal(), Some((0, 2, 0.25)));
        let single = KinshipMatrix::from_dense(ids(&["A"]), &[vec![0.5]]).expect("valid matrix");
        assert_eq!(single.max_off_diagonal(), None);
    }

    #[test]
    fn subset_preserves_requested_order() -> Result<(), KinshipError> {
        let sub = trio().subset(&["C", "A"])?;
        assert_eq!(sub.ids().collect::<Vec<_>>(), ["C", "A"]);
        assert_eq!(sub.get_by_index(0, 1), 0.25);
        assert_eq!(sub.get_by_index(0, 0), 0.5);
        assert_eq!(trio().subset(&["A", "X", "Y"]), Err(KinshipError::UnknownIds(ids(&["X", "Y"]))));
        assert_eq!(trio().subset(&["A", "A"]), Err(KinshipError::DuplicateId("A".to_string())));
        Ok(())
    }

    #[test]
    fn invalid_dense_tables() {
        let asym = KinshipMatrix::from_dense(ids(&["A", "B"]), &[vec![0.5, 0.1], vec![0.2, 0.5]]);
        assert!(matches!(asym, Err(KinshipError::Asymmetric{..})));

        let ragged = KinshipMatrix::from_dense(ids(&["A", "B"]), &[vec![0.5, 0.1], vec![0.1]]);
        assert!(matches!(ragged, Err(KinshipError::NotSquare{got: 1, ..})));

        let low_diag = KinshipMatrix::from_dense(ids(&["A"]), &[vec![0.4]]);
        assert!(matches!(low_diag, Err(KinshipError::InvalidSelfKinship{..})));

        let negative = KinshipMatrix::from_dense(ids(&["A", "B"]), &[vec![0.5, -0.1], vec![-0.1, 0.5]]);
        assert!(matches!(negative, Err(KinshipError::OutOfRange{..})));

        let duplicate = KinshipMatrix::from_dense(ids(&["A", "A"]), &[vec![0.5, 0.0], vec![0.0, 0.5]]);
        assert_eq!(duplicate, Err(KinshipError::DuplicateId("A".to_string())));
    }
}
