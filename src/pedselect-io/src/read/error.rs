use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReaderError {
    #[error("Failed to open file {}", .0.display())]
    OpenFile(PathBuf, #[source] std::io::Error),

    #[error("Failed to read line {0}")]
    ReadLine(usize, #[source] std::io::Error),

    #[error("File does not contain any header line")]
    MissingHeader,

    #[error("Header is missing the required column '{0}'")]
    MissingColumn(&'static str),

    #[error("Line {line}: missing value for column '{column}'")]
    MissingField{line: usize, column: &'static str},

    #[error("Line {line}: invalid value '{value}' for column '{column}': {reason}")]
    InvalidField{line: usize, column: &'static str, value: String, reason: String},

    #[error("Found duplicate identifier(s): {0:?}")]
    DuplicateId(Vec<String>),

    #[error("Line {line}: kinship matrix row {id} does not match any column of the header")]
    UnknownRow{line: usize, id: String},

    #[error("Kinship matrix is missing the row(s) of {0:?}")]
    MissingRows(Vec<String>),
}
