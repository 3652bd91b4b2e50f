use thiserror::Error;
use crate::FileEntity;

#[derive(Error, Debug)]
pub enum ParserError {
    #[error("{0} {1} does not exist")]
    MissingFileEntity(FileEntity, String),

    #[error("{1} is not a {0}")]
    InvalidFileEntity(FileEntity, String),

    #[error("Invalid region weight '{value}': {reason}. Expected <REGION>:<WEIGHT>, e.g. '3:0.25'")]
    ParseRegionWeight{value: String, reason: String},

    #[error("Invalid kinship threshold '{0}'. Expected a value within [0, 1]")]
    ParseThreshold(String),

    #[error("Invalid lineage depth '{value}'. Expected an integer within [0, {max}]")]
    ParseDepthFilter{value: String, max: u32},

    #[error("Failed to serialize command line arguments: [{0}]")]
    Serialize(String),

    #[error("Unable to write command line arguments into {0}")]
    WriteArguments(String),

    #[error("Unable to read command line arguments from {0}")]
    ReadArguments(String),
}
