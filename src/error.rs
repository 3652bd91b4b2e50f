use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    #[error("No region assignment available: provide a region lookup table with --regions, or a 'region' column within the records")]
    NoRegionAssignment,
}
