mod error;
pub use error::ReaderError;

mod tsv;
pub use tsv::{Header, Row, TsvReader};

mod records;
pub use records::{parse_records, read_records};

mod regions;
pub use regions::{parse_region_lookup, read_region_lookup, read_sample_names};

mod ids;
pub use ids::read_id_list;

mod matrix;
pub use matrix::{parse_kinship_matrix, read_kinship_matrix};

/// Tokens standing for a missing value, within any optional field.
pub const MISSING_TOKENS: [&str; 4] = ["", "0", "NA", "."];
