use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum KinshipError {
    #[error("Found duplicate identifier(s) within the requested cohort: {0:?}")]
    DuplicateCohortId(Vec<String>),

    #[error("Cannot allocate a kinship table spanning {0} individuals")]
    TableTooLarge(usize),

    #[error("Kinship matrix is not square: expected {expected} values on the row of {id}, got {got}")]
    NotSquare{id: String, expected: usize, got: usize},

    #[error("Kinship matrix header contains duplicate identifier {0}")]
    DuplicateId(String),

    #[error("Kinship matrix is not symmetric: k({a}, {b}) = {ab}, while k({b}, {a}) = {ba}")]
    Asymmetric{a: String, b: String, ab: f64, ba: f64},

    #[error("Kinship coefficient k({a}, {b}) = {value} lies outside of [0, 1]")]
    OutOfRange{a: String, b: String, value: f64},

    #[error("Self-kinship of {id} = {value} lies outside of [0.5, 1]")]
    InvalidSelfKinship{id: String, value: f64},

    #[error("Identifier(s) {0:?} are not part of the kinship matrix")]
    UnknownIds(Vec<String>),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PruneError {
    #[error("Invalid kinship threshold: {0}. Must be a finite value")]
    InvalidThreshold(f64),

    #[error("Pruned set violates the kinship threshold: k({a}, {b}) = {kinship} > {threshold}")]
    ThresholdViolated{a: String, b: String, kinship: f64, threshold: f64},

    #[error(transparent)]
    Matrix(#[from] KinshipError),
}
