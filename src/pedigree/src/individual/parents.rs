use super::IndividualId;

/// Father and mother of an offspring, as weak arena keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Parents {
    pub father: IndividualId,
    pub mother: IndividualId,
}

impl Parents {
    #[must_use]
    pub fn new(father: IndividualId, mother: IndividualId) -> Self {
        Self { father, mother }
    }

    /// Iterate over both parents: father first.
    pub fn iter(&self) -> impl Iterator<Item = IndividualId> {
        [self.father, self.mother].into_iter()
    }
}
