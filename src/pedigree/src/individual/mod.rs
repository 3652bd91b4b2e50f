use std::{fmt::{self, Display, Formatter}, str::FromStr};

use crate::Sex;

mod parents;
pub use parents::Parents;

mod record;
pub use record::IndividualRecord;

/// Space padding lengths used for `std::fmt::Display` of Individual
const LABEL_DISPLAY_LEN : usize = 12;
const ORIGIN_DISPLAY_LEN: usize = 10;

slotmap::new_key_type! {
    /// Stable arena key of an individual within a `Pedigree`.
    pub struct IndividualId;
}

/// How an individual came to exist within the pedigree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Origin {
    /// Carried its own input record.
    Recorded,
    /// Had no record of its own, but was referenced as a parent by some other record.
    Referenced,
    /// Synthesized to complete the parent pair of an individual with a single recorded parent.
    Placeholder,
}

impl Origin {
    /// Whether this individual is backed by an actual registry identifier.
    #[must_use]
    pub fn is_registered(&self) -> bool {
        !matches!(self, Self::Placeholder)
    }
}

impl Display for Origin {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Recorded    => "recorded",
            Self::Referenced  => "referenced",
            Self::Placeholder => "placeholder",
        })
    }
}

impl FromStr for Origin {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "recorded"    => Ok(Self::Recorded),
            "referenced"  => Ok(Self::Referenced),
            "placeholder" => Ok(Self::Placeholder),
            other         => Err(format!("expected one of 'recorded', 'referenced' or 'placeholder', got '{other}'")),
        }
    }
}

/// Pedigree Individual.
/// # Fields:
/// - `id`         : arena key of this individual.
/// - `label`      : registry identifier of the individual.
/// - `sex`        : recorded sex, possibly corrected during repair to match the parental role.
/// - `parents`    : father and mother keys. `None` if the individual is a founder.
/// - `origin`     : whether the individual was recorded, referenced, or synthesized as a placeholder.
/// - `birth_place`: optional, free-form place of birth (carried through, never interpreted).
/// - `birth_year` : optional year of birth.
/// - `region`     : optional birth-region code carried by the input record.
#[derive(Debug, Clone)]
pub struct Individual {
    pub id         : IndividualId,
    pub label      : String,
    pub sex        : Sex,
    parents        : Option<Parents>,
    pub origin     : Origin,
    pub birth_place: Option<String>,
    pub birth_year : Option<i32>,
    pub region     : Option<u8>,
}

impl Display for Individual {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "label: {: <LABEL_DISPLAY_LEN$} sex: {: <7} origin: {: <ORIGIN_DISPLAY_LEN$}", self.label, self.sex, self.origin)
    }
}

impl PartialEq for Individual {
    fn eq(&self, other: &Individual) -> bool {
        self.label == other.label
    }
}

impl Eq for Individual {}

impl Individual {
    pub(crate) fn new(id: IndividualId, label: &str, sex: Sex, origin: Origin) -> Self {
        Self { id, label: label.to_string(), sex, parents: None, origin, birth_place: None, birth_year: None, region: None }
    }

    pub(crate) fn from_record(id: IndividualId, record: &IndividualRecord) -> Self {
        Self {
            birth_place: record.birth_place.clone(),
            birth_year : record.birth_year,
            region     : record.region,
            ..Self::new(id, &record.id, record.sex, record.origin)
        }
    }

    pub(crate) fn set_parents(&mut self, parents: Parents) {
        self.parents = Some(parents);
    }

    /// Return the father and mother keys of this individual, or `None` for founders.
    #[must_use]
    pub fn parents(&self) -> Option<Parents> {
        self.parents
    }

    #[must_use]
    pub fn is_founder(&self) -> bool {
        self.parents.is_none()
    }
}
