use crate::{Origin, Sex};

/// A raw, unrepaired input record: `{id, father_id, mother_id, sex, birth_place, birth_year, region}`
///
/// `origin` is `Recorded` unless the record was read back from a repaired pedigree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndividualRecord {
    pub id         : String,
    pub father     : Option<String>,
    pub mother     : Option<String>,
    pub sex        : Sex,
    pub birth_place: Option<String>,
    pub birth_year : Option<i32>,
    pub region     : Option<u8>,
    pub origin     : Origin,
}

impl IndividualRecord {
    pub fn new(id: &str, father: Option<&str>, mother: Option<&str>, sex: Sex) -> Self {
        Self {
            id         : id.to_string(),
            father     : father.map(str::to_string),
            mother     : mother.map(str::to_string),
            sex,
            birth_place: None,
            birth_year : None,
            region     : None,
            origin     : Origin::Recorded,
        }
    }

    #[must_use]
    pub fn with_region(mut self, region: u8) -> Self {
        self.region = Some(region);
        self
    }

    #[must_use]
    pub fn with_origin(mut self, origin: Origin) -> Self {
        self.origin = origin;
        self
    }

    #[must_use]
    pub fn with_birth(mut self, place: Option<&str>, year: Option<i32>) -> Self {
        self.birth_place = place.map(str::to_string);
        self.birth_year  = year;
        self
    }
}
