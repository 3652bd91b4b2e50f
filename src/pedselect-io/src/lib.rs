//! Tabular exchange formats of the selection pipeline: input records, region lookups, identifier
//! lists, kinship matrices and candidate lists.

pub mod parse;
pub mod read;
pub mod write;
