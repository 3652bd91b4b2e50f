use std::collections::BTreeSet;

use ahash::AHashMap;
use indexmap::IndexSet;
use log::{debug, info, warn};
use rayon::prelude::*;

use logger::Logger;
use pedigree::{IndividualId, Pedigree};

use crate::{packed_index, packed_len, KinshipError, KinshipMatrix};

/// Minimum number of coefficients handled by a single rayon task, when filling a row of the table.
const ROW_CHUNK_LEN: usize = 4096;

/// Kinship coefficients of a cohort, along with the requested identifiers that could not be found.
/// # Fields:
/// - `matrix` : kinship matrix spanning every resolved cohort individual, in request order.
/// - `missing`: requested identifiers absent from the pedigree, in request order.
#[derive(Debug, Clone)]
pub struct CohortKinship {
    pub matrix : KinshipMatrix,
    pub missing: Vec<String>,
}

/// Packed lower triangular table of kinship coefficients, indexed by topological position.
struct KinshipTable {
    values: Vec<f64>,
}

impl KinshipTable {
    /// Fill the table in a single forward pass.
    ///
    /// `parents[i]` holds the topological positions of the father and mother of individual `i`, which
    /// are both strictly lower than `i`. Thus, every coefficient of row `i` only reads rows `< i`:
    /// - `k(i, i) = 0.5`                                 if `i` is a founder
    /// - `k(i, i) = 0.5 * (1 + k(father, mother))`       otherwise
    /// - `k(i, j) = 0`                                   if `i` is a founder (j < i)
    /// - `k(i, j) = 0.5 * (k(father, j) + k(mother, j))` otherwise (j < i)
    fn compute(parents: &[Option<(usize, usize)>]) -> Result<Self, KinshipError> {
        let n   = parents.len();
        let len = packed_len(n).ok_or(KinshipError::TableTooLarge(n))?;
        let mut values = vec![0.0; len];

        let progress = Logger::progress_bar(n as u64, "Computing kinship");
        for (i, parents) in parents.iter().enumerate() {
            let (previous, current) = values.split_at_mut(packed_index(i, 0));
            let previous: &[f64] = previous;
            let row = &mut current[..=i];
            match *parents {
                None => row[i] = 0.5,
                Some((father, mother)) => {
                    debug_assert!(father < i && mother < i, "Parents must precede their offspring");
                    row[..i].par_iter_mut()
                        .with_min_len(ROW_CHUNK_LEN)
                        .enumerate()
                        .for_each(|(j, value)| {
                            *value = 0.5 * (previous[packed_index(father, j)] + previous[packed_index(mother, j)]);
                        });
                    row[i] = 0.5 * (1.0 + previous[packed_index(father, mother)]);
                }
            }
            progress.inc(1);
        }
        progress.finish_and_clear();
        Ok(Self { values })
    }

    #[inline]
    fn get(&self, i: usize, j: usize) -> f64 {
        self.values[packed_index(i, j)]
    }
}

/// Compute the pairwise kinship coefficients of a cohort.
///
/// The full pedigree is used for ancestor lookups, but coefficients are only computed over the
/// ancestor closure of the cohort, and the table is freed as soon as the cohort submatrix is extracted.
///
/// Identifiers missing from the pedigree are reported within `CohortKinship::missing` and skipped.
///
/// # Errors
/// - `DuplicateCohortId` if the cohort lists any identifier more than once.
/// - `TableTooLarge` if the ancestor closure is too large to be addressed.
pub fn compute_kinship<S: AsRef<str>>(pedigree: &Pedigree, cohort: &[S]) -> Result<CohortKinship, KinshipError> {
    // ---- Cohort must be duplicate-free.
    let mut seen = IndexSet::with_capacity(cohort.len());
    let duplicates: BTreeSet<String> = cohort.iter()
        .map(AsRef::as_ref)
        .filter(|label| !seen.insert(*label))
        .map(str::to_string)
        .collect();
    if !duplicates.is_empty() {
        return Err(KinshipError::DuplicateCohortId(duplicates.into_iter().collect()))
    }

    // ---- Resolve cohort members, and report missing ones.
    let mut probands: IndexSet<String> = IndexSet::with_capacity(cohort.len());
    let mut proband_ids: Vec<IndividualId> = Vec::with_capacity(cohort.len());
    let mut missing = Vec::new();
    for label in cohort.iter().map(AsRef::as_ref) {
        match pedigree.id_of(label) {
            Some(id) => { probands.insert(label.to_string()); proband_ids.push(id); },
            None     => {
                warn!("Cohort individual {label} is not part of the pedigree. Skipping it.");
                missing.push(label.to_string());
            }
        }
    }
    if !missing.is_empty() {
        warn!("{} cohort individual(s) are missing from the pedigree", missing.len());
    }

    // ---- Restrict the topological order to the ancestor closure of our cohort.
    let closure = pedigree.ancestor_closure(&proband_ids);
    let order   = pedigree.topological_subset(&closure);
    let position: AHashMap<IndividualId, usize> = order.iter().enumerate().map(|(i, id)| (*id, i)).collect();
    let parents: Vec<Option<(usize, usize)>> = order.iter()
        .map(|id| {
            pedigree.individual(*id)
                .and_then(|ind| ind.parents())
                .and_then(|p| Some((*position.get(&p.father)?, *position.get(&p.mother)?)))
        })
        .collect();
    info!("Computing kinship coefficients of {} individual(s), spanning {} ancestor(s)", probands.len(), order.len());

    let table = KinshipTable::compute(&parents)?;

    // ---- Extract the cohort submatrix and release the full table.
    let cohort_positions: Vec<usize> = proband_ids.iter()
        .filter_map(|id| position.get(id).copied())
        .collect();
    let len = packed_len(cohort_positions.len()).ok_or(KinshipError::TableTooLarge(cohort_positions.len()))?;
    let mut values = Vec::with_capacity(len);
    for (a, &i) in cohort_positions.iter().enumerate() {
        values.extend(cohort_positions[..=a].iter().map(|&j| table.get(i, j)));
    }
    drop(table);
    debug!("Released the ancestor kinship table");

    Ok(CohortKinship { matrix: KinshipMatrix::from_packed(probands, values), missing })
}
