//! Pedigree arena, repair of incomplete parent records, generation ordering and lineage-depth queries.

mod sex;
pub use sex::Sex;

mod individual;
pub use individual::{Individual, IndividualId, IndividualRecord, Origin, Parents};

mod pedigree;
pub use pedigree::{Pedigree, RepairStats};

pub mod lineage;

mod error;
pub use error::PedigreeError;
