//! Region-stratified random sampling of a pruned cohort.

mod region;
pub use region::{Region, RegionAssignment};

mod quotas;
pub use quotas::Quotas;

mod sample;
pub use sample::{sample, Shortfall, StratifiedSample};

mod error;
pub use error::{QuotaError, SamplerError};
