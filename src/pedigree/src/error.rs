use thiserror::Error;

use crate::Sex;

/// Pedigree-level errors.
///
/// All variants except `UnknownIndividual` are fatal: they either signal corrupted input data
/// (duplicate ids, conflicting parental roles, cycles), or a broken post-repair invariant.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PedigreeError {
    #[error("Found duplicate individual identifier(s) within the input records: {0:?}")]
    DuplicateId(Vec<String>),

    #[error("Individual {0} is referenced as its own parent")]
    SelfParent(String),

    #[error("Individual {child} references {parent} as both its father and mother")]
    IdenticalParents{child: String, parent: String},

    #[error("Individual(s) {0:?} are used as a father in one relationship and as a mother in another")]
    SexConflict(Vec<String>),

    #[error("Cannot synthesize a placeholder parent: identifier {0} is already taken")]
    PlaceholderCollision(String),

    #[error("Cyclic parent references: {} individual(s) are their own ancestor or descend from one: {0:?}", .0.len())]
    Cycle(Vec<String>),

    #[error("Individual {0} is not part of the pedigree")]
    UnknownIndividual(String),

    #[error("Cannot filter on {generations} generation(s): lineage depth is limited to {max} generations")]
    LineageDepth{generations: u32, max: u32},

    #[error("Invalid parent sex: {parent} is the {role} of {child}, but is marked as {sex}")]
    InvalidParentSex{child: String, parent: String, role: &'static str, sex: Sex},
}
