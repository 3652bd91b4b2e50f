use thiserror::Error;

use crate::{Region, Shortfall};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SamplerError {
    #[error("Invalid region code '{0}'. Expected an integer within [1, 255]")]
    InvalidRegion(String),

    #[error("Found duplicate identifier(s) within the pruned set: {0:?}")]
    DuplicateId(Vec<String>),

    #[error("Not enough eligible individuals to fill every regional quota: {}",
        .0.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
    )]
    Shortfall(Vec<Shortfall>),

    #[error(transparent)]
    Quota(#[from] QuotaError),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum QuotaError {
    #[error("Cannot allocate quotas: no region was provided")]
    NoRegions,

    #[error("Invalid weight for region {region}: {weight}. Weights must be finite and positive")]
    InvalidWeight{region: Region, weight: f64},

    #[error("Cannot allocate proportional quotas: region weights sum to zero")]
    ZeroWeights,

    #[error("Regional quotas sum to {got}, while the requested total is {expected}")]
    TotalMismatch{expected: usize, got: usize},
}
