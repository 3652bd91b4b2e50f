use std::{collections::BTreeSet, fmt::{self, Display, Formatter}};

use ahash::AHashMap;
use log::{debug, warn};

use super::Pedigree;
use crate::{IndividualId, IndividualRecord, Origin, Parents, PedigreeError, Sex};

/// Label prefix of synthesized placeholder parents.
pub const PLACEHOLDER_PREFIX: char = '~';

/// Summary of the corrections applied while repairing a pedigree. Repair never removes anything.
/// # Fields:
/// - `referenced_added`  : parents referenced by some record, but lacking a record of their own.
/// - `placeholders_added`: parents synthesized for records carrying a single parent reference.
/// - `sex_corrections`   : individuals whose recorded sex was overwritten to match their parental role.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RepairStats {
    pub referenced_added  : usize,
    pub placeholders_added: usize,
    pub sex_corrections   : usize,
}

impl RepairStats {
    /// Total number of individuals added during repair.
    #[must_use]
    pub fn added(&self) -> usize {
        self.referenced_added + self.placeholders_added
    }
}

impl Display for RepairStats {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "added {} referenced parent(s) and {} placeholder parent(s) - corrected the sex of {} individual(s)",
            self.referenced_added, self.placeholders_added, self.sex_corrections
        )
    }
}

/// Format the label of a placeholder parent (e.g. `~mother-of:I1024`)
pub(crate) fn placeholder_label(role: Sex, child: &str) -> String {
    let role = match role {
        Sex::Male => "father",
        _         => "mother",
    };
    format!("{PLACEHOLDER_PREFIX}{role}-of:{child}")
}

pub(super) fn repair(records: &[IndividualRecord]) -> Result<(Pedigree, RepairStats), PedigreeError> {
    check_records(records)?;
    let roles = parental_roles(records)?;

    let mut stats    = RepairStats::default();
    let mut pedigree = Pedigree::with_capacity(records.len());

    // ---- Recorded individuals come first, in input order.
    records.iter().for_each(|record| {pedigree.insert_record(record);});

    // ---- Referenced-but-absent parents, in order of first reference.
    for record in records {
        for (parent, role) in [(&record.father, Sex::Male), (&record.mother, Sex::Female)] {
            match parent {
                Some(label) if !pedigree.contains(label) => {
                    debug!("Adding missing {role} parent {label}, referenced by {}", record.id);
                    pedigree.insert(label, role, Origin::Referenced);
                    stats.referenced_added += 1;
                },
                _ => (),
            }
        }
    }

    // ---- The parental role is authoritative over the recorded sex.
    for individual in pedigree.individuals.values_mut() {
        if let Some(&role) = roles.get(individual.label.as_str()) {
            if individual.sex != role {
                warn!("Overwriting the sex of {} from {} to {role}, to match its parental role", individual.label, individual.sex);
                individual.sex = role;
                stats.sex_corrections += 1;
            }
        }
    }

    // ---- Link parents, synthesizing a placeholder for any missing half of a parent pair.
    for record in records {
        if record.father.is_none() && record.mother.is_none() {
            continue
        }
        let father = resolve_parent(&mut pedigree, &mut stats, &record.id, record.father.as_deref(), Sex::Male)?;
        let mother = resolve_parent(&mut pedigree, &mut stats, &record.id, record.mother.as_deref(), Sex::Female)?;
        let child  = pedigree.id_of(&record.id).ok_or_else(|| PedigreeError::UnknownIndividual(record.id.clone()))?;
        pedigree.individuals[child].set_parents(Parents::new(father, mother));
    }

    pedigree.build_order()?;
    Ok((pedigree, stats))
}

/// Fetch the key of a parent, or insert a placeholder founder if the parent is unknown.
fn resolve_parent(pedigree: &mut Pedigree, stats: &mut RepairStats, child: &str, parent: Option<&str>, role: Sex) -> Result<IndividualId, PedigreeError> {
    if let Some(label) = parent {
        return pedigree.id_of(label).ok_or_else(|| PedigreeError::UnknownIndividual(label.to_string()))
    }

    let label = placeholder_label(role, child);
    if pedigree.contains(&label) {
        return Err(PedigreeError::PlaceholderCollision(label))
    }
    debug!("{child} has a single recorded parent. Adding placeholder {label}");
    stats.placeholders_added += 1;
    Ok(pedigree.insert(&label, role, Origin::Placeholder))
}

/// Reject duplicate identifiers and degenerate parent references.
fn check_records(records: &[IndividualRecord]) -> Result<(), PedigreeError> {
    let mut seen: AHashMap<&str, usize> = AHashMap::with_capacity(records.len());
    for record in records {
        *seen.entry(record.id.as_str()).or_default() += 1;
    }
    let duplicates: BTreeSet<&str> = seen.into_iter()
        .filter_map(|(id, count)| (count > 1).then_some(id))
        .collect();
    if !duplicates.is_empty() {
        return Err(PedigreeError::DuplicateId(duplicates.into_iter().map(str::to_string).collect()))
    }

    for record in records {
        let own_id = Some(&record.id);
        if record.father.as_ref() == own_id || record.mother.as_ref() == own_id {
            return Err(PedigreeError::SelfParent(record.id.clone()))
        }
        if let (Some(father), Some(mother)) = (&record.father, &record.mother) {
            if father == mother {
                return Err(PedigreeError::IdenticalParents{child: record.id.clone(), parent: father.clone()})
            }
        }
    }
    Ok(())
}

/// Map every identifier used as a parent to the sex implied by its role.
///
/// # Errors
/// - `SexConflict`, listing every identifier used both as a father and as a mother.
fn parental_roles(records: &[IndividualRecord]) -> Result<AHashMap<&str, Sex>, PedigreeError> {
    let mut roles: AHashMap<&str, Sex> = AHashMap::new();
    let mut conflicts: BTreeSet<&str> = BTreeSet::new();
    for record in records {
        for (parent, role) in [(&record.father, Sex::Male), (&record.mother, Sex::Female)] {
            let Some(label) = parent else { continue };
            if *roles.entry(label.as_str()).or_insert(role) != role {
                conflicts.insert(label.as_str());
            }
        }
    }

    match conflicts.is_empty() {
        true  => Ok(roles),
        false => Err(PedigreeError::SexConflict(conflicts.into_iter().map(str::to_string).collect())),
    }
}
