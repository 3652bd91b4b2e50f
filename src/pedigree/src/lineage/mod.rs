//! Lineage-depth queries: is every ancestor recorded, up to a given number of generations?

use ahash::AHashSet;
use log::{debug, warn};

use crate::{IndividualId, Pedigree, PedigreeError};

/// Outcome of a lineage-depth pre-filtering pass over a cohort.
/// # Fields:
/// - `kept`    : individuals with a complete lineage, in cohort order.
/// - `excluded`: individuals with an incomplete lineage, along with their registered ancestor count.
/// - `missing` : cohort identifiers that are not part of the pedigree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DepthFilterReport {
    pub kept    : Vec<String>,
    pub excluded: Vec<(String, usize)>,
    pub missing : Vec<String>,
}

/// Number of distinct registered ancestors reachable from `label` within `max_generations` steps
/// up the parent edges. The individual itself is not counted, and neither are placeholder parents.
///
/// Ancestors reachable through multiple paths (pedigree loops) are counted once.
///
/// # Errors
/// - `UnknownIndividual` if `label` is not part of the pedigree.
pub fn ancestor_count(pedigree: &Pedigree, label: &str, max_generations: u32) -> Result<usize, PedigreeError> {
    let root = pedigree.try_get(label)?.id;

    let mut seen: AHashSet<IndividualId> = AHashSet::new();
    let mut frontier = vec![root];
    for _ in 0..max_generations {
        let mut next = Vec::with_capacity(frontier.len() * 2);
        for id in frontier {
            let Some(parents) = pedigree.individual(id).and_then(|ind| ind.parents()) else { continue };
            for parent in parents.iter() {
                let registered = pedigree.individual(parent).is_some_and(|ind| ind.origin.is_registered());
                if registered && seen.insert(parent) {
                    next.push(parent);
                }
            }
        }
        if next.is_empty() {
            break
        }
        frontier = next;
    }
    Ok(seen.len())
}

/// Deepest lineage whose full ancestor count still fits within a `usize`.
pub const MAX_LINEAGE_DEPTH: u32 = usize::BITS - 2;

/// Number of ancestors of a complete, loop-free lineage spanning `generations` (e.g. 2 -> 2 parents + 4 grandparents = 6)
///
/// # Errors
/// - `LineageDepth` if `generations` exceeds `MAX_LINEAGE_DEPTH`.
pub fn full_depth_count(generations: u32) -> Result<usize, PedigreeError> {
    generations.checked_add(1)
        .and_then(|shift| 1usize.checked_shl(shift))
        .and_then(|count| count.checked_sub(2))
        .filter(|_| generations <= MAX_LINEAGE_DEPTH)
        .ok_or(PedigreeError::LineageDepth{generations, max: MAX_LINEAGE_DEPTH})
}

/// Whether every ancestor of `label` is registered up to `generations`.
pub fn is_full_depth(pedigree: &Pedigree, label: &str, generations: u32) -> Result<bool, PedigreeError> {
    let expected = full_depth_count(generations)?;
    Ok(ancestor_count(pedigree, label, generations)? == expected)
}

/// Split a cohort into individuals with a complete lineage up to `generations`, and the rest.
///
/// Unknown identifiers are reported within `DepthFilterReport::missing`, not treated as an error.
///
/// # Errors
/// - `LineageDepth` if `generations` exceeds `MAX_LINEAGE_DEPTH`.
pub fn depth_filter(pedigree: &Pedigree, cohort: &[String], generations: u32) -> Result<DepthFilterReport, PedigreeError> {
    let expected = full_depth_count(generations)?;
    let mut report = DepthFilterReport::default();
    for label in cohort {
        match ancestor_count(pedigree, label, generations) {
            Ok(count) if count == expected => report.kept.push(label.clone()),
            Ok(count) => {
                debug!("Excluding {label}: {count}/{expected} ancestors registered over {generations} generation(s)");
                report.excluded.push((label.clone(), count));
            },
            Err(_) => {
                warn!("Cannot apply the lineage-depth filter on {label}: individual is not part of the pedigree");
                report.missing.push(label.clone());
            }
        }
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{IndividualRecord, Sex};

    /// Proband P, parents F & M, grandparents FF FM MF MM.
    fn three_generations(drop: Option<&str>) -> Pedigree {
        let mut records = vec![
            IndividualRecord::new("FF", None, None, Sex::Male),
            IndividualRecord::new("FM", None, None, Sex::Female),
            IndividualRecord::new("MF", None, None, Sex::Male),
            IndividualRecord::new("MM", None, None, Sex::Female),
            IndividualRecord::new("F", Some("FF"), Some("FM"), Sex::Male),
            IndividualRecord::new("M", Some("MF"), Some("MM"), Sex::Female),
            IndividualRecord::new("P", Some("F"), Some("M"), Sex::Unknown),
        ];
        if let Some(dropped) = drop {
            records.retain(|r| r.id != dropped);
            for record in &mut records {
                if record.father.as_deref() == Some(dropped) { record.father = None }
                if record.mother.as_deref() == Some(dropped) { record.mother = None }
            }
        }
        Pedigree::from_records(&records).expect("valid pedigree").0
    }

    #[test]
    fn full_depth_counts() -> Result<(), PedigreeError> {
        assert_eq!(full_depth_count(0)?, 0);
        assert_eq!(full_depth_count(1)?, 2);
        assert_eq!(full_depth_count(2)?, 6);
        assert_eq!(full_depth_count(3)?, 14);
        assert_eq!(full_depth_count(MAX_LINEAGE_DEPTH)?, (1usize << (MAX_LINEAGE_DEPTH + 1)) - 2);
        Ok(())
    }

    #[test]
    fn lineage_depth_upper_bound() {
        let pedigree = three_generations(None);
        let cohort = ["P".to_string()];
        for generations in [MAX_LINEAGE_DEPTH + 1, 64, u32::MAX] {
            let expected = Err(PedigreeError::LineageDepth{generations, max: MAX_LINEAGE_DEPTH});
            assert_eq!(full_depth_count(generations), expected);
            assert_eq!(depth_filter(&pedigree, &cohort, generations), expected.map(|_| DepthFilterReport::default()));
            assert!(is_full_depth(&pedigree, "P", generations).is_err());
        }
        assert!(depth_filter(&pedigree, &cohort, MAX_LINEAGE_DEPTH).is_ok());
    }

    #[test]
    fn complete_grandparents() -> Result<(), PedigreeError> {
        let pedigree = three_generations(None);
        assert_eq!(ancestor_count(&pedigree, "P", 2)?, 6);
        assert_eq!(ancestor_count(&pedigree, "P", 1)?, 2);
        assert_eq!(ancestor_count(&pedigree, "P", 0)?, 0);
        assert_eq!(ancestor_count(&pedigree, "P", 10)?, 6);
        assert!(is_full_depth(&pedigree, "P", 2)?);
        Ok(())
    }

    #[test]
    fn missing_grandparent() -> Result<(), PedigreeError> {
        let pedigree = three_generations(Some("MM"));
        // ---- The placeholder mother of M is not counted.
        assert!(pedigree.contains("~mother-of:M"));
        assert_eq!(ancestor_count(&pedigree, "P", 2)?, 5);
        assert!(!is_full_depth(&pedigree, "P", 2)?);
        Ok(())
    }

    #[test]
    fn converging_lineages_count_once() -> Result<(), PedigreeError> {
        // ---- Half-siblings F and M share a father: P has only three distinct grandparents.
        let records = vec![
            IndividualRecord::new("G", None, None, Sex::Male),
            IndividualRecord::new("GM1", None, None, Sex::Female),
            IndividualRecord::new("GM2", None, None, Sex::Female),
            IndividualRecord::new("F", Some("G"), Some("GM1"), Sex::Male),
            IndividualRecord::new("M", Some("G"), Some("GM2"), Sex::Female),
            IndividualRecord::new("P", Some("F"), Some("M"), Sex::Male),
        ];
        let (pedigree, _) = Pedigree::from_records(&records).expect("valid pedigree");
        assert_eq!(ancestor_count(&pedigree, "P", 2)?, 5);
        Ok(())
    }

    #[test]
    fn unknown_individual() {
        let pedigree = three_generations(None);
        assert_eq!(ancestor_count(&pedigree, "X", 2), Err(PedigreeError::UnknownIndividual("X".to_string())));
    }

    #[test]
    fn filter_cohort() {
        let pedigree = three_generations(Some("FF"));
        let cohort = ["P", "F", "X"].map(String::from);
        let report = depth_filter(&pedigree, &cohort, 1).expect("valid depth");
        assert_eq!(report.kept, vec!["P".to_string()]);
        assert_eq!(report.excluded, vec![("F".to_string(), 1)]);
        assert_eq!(report.missing, vec!["X".to_string()]);
    }
}
