use std::{fs::File, io::{BufRead, BufReader}, path::Path};

use ahash::AHashMap;
use anyhow::Result;

use located_error::LocatedError;

use super::ReaderError;

/// Tab-separated table reader. Blank lines and `#`-prefixed comment lines are skipped.
///
/// # Fields:
/// - `source` : Boxed `BufRead`: either a file, or any in-memory reader.
/// - `line_no`: 1-based number of the last line read.
pub struct TsvReader<'a> {
    source : Box<dyn BufRead + 'a>,
    line_no: usize,
}

impl<'a> TsvReader<'a> {
    pub fn new(source: impl BufRead + 'a) -> Self {
        Self { source: Box::new(source), line_no: 0 }
    }

    /// # Errors
    /// - `OpenFile` if `path` cannot be opened.
    pub fn open(path: &Path) -> Result<Self> {
        File::open(path)
            .map(|file| Self::new(BufReader::new(file)))
            .map_err(|e| ReaderError::OpenFile(path.to_path_buf(), e))
            .loc("While attempting to open a tab-separated file")
    }

    /// Read the next non-empty, non-comment line.
    ///
    /// # Errors
    /// - `ReadLine` if the underlying reader fails, or the line is not valid UTF-8.
    pub fn next_row(&mut self) -> Result<Option<Row>> {
        let mut buffer = String::new();
        loop {
            buffer.clear();
            self.line_no += 1;
            let read = self.source.read_line(&mut buffer)
                .map_err(|e| ReaderError::ReadLine(self.line_no, e))
                .loc("While reading a tab-separated file")?;
            if read == 0 {
                return Ok(None)
            }
            let line = buffer.trim_end_matches(['\n', '\r']);
            if line.trim().is_empty() || line.starts_with('#') {
                continue
            }
            let fields = line.split('\t').map(|field| field.trim().to_string()).collect();
            return Ok(Some(Row { line: self.line_no, fields }))
        }
    }

    /// Read the header line.
    ///
    /// # Errors
    /// - `MissingHeader` if the file does not contain a single row.
    pub fn header(&mut self) -> Result<Header> {
        let row = self.next_row()?.ok_or(ReaderError::MissingHeader).loc("While parsing header")?;
        Ok(Header::new(row.fields))
    }

    /// Read every remaining row.
    pub fn rows(&mut self) -> Result<Vec<Row>> {
        let mut rows = Vec::new();
        while let Some(row) = self.next_row()? {
            rows.push(row);
        }
        Ok(rows)
    }
}

/// A single, split line of a table.
/// # Fields:
/// - `line`  : 1-based line number, for error reporting.
/// - `fields`: trimmed fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub line  : usize,
    pub fields: Vec<String>,
}

impl Row {
    /// Field at `index`. Trailing columns missing from the line are read as empty fields.
    #[must_use]
    pub fn get(&self, index: usize) -> &str {
        self.fields.get(index).map_or("", String::as_str)
    }

    /// Non-empty field at `index`.
    ///
    /// # Errors
    /// - `MissingField` if the field is absent or empty.
    pub fn required(&self, index: usize, column: &'static str) -> Result<&str, ReaderError> {
        match self.get(index) {
            "" => Err(ReaderError::MissingField{line: self.line, column}),
            field => Ok(field),
        }
    }

    /// Wrap a field conversion failure with the line and column it happened on.
    pub fn invalid(&self, index: usize, column: &'static str, reason: impl ToString) -> ReaderError {
        ReaderError::InvalidField{line: self.line, column, value: self.get(index).to_string(), reason: reason.to_string()}
    }
}

/// Column names of a table, mapped to their index.
#[derive(Debug, Clone)]
pub struct Header {
    names  : Vec<String>,
    columns: AHashMap<String, usize>,
}

impl Header {
    fn new(names: Vec<String>) -> Self {
        let mut columns = AHashMap::with_capacity(names.len());
        for (i, name) in names.iter().enumerate() {
            columns.entry(name.to_lowercase()).or_insert(i);
        }
        Self { names, columns }
    }

    /// Column names, in file order.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Index of a column. Lookups are case-insensitive.
    #[must_use]
    pub fn optional(&self, column: &str) -> Option<usize> {
        self.columns.get(&column.to_lowercase()).copied()
    }

    /// # Errors
    /// - `MissingColumn` if the header does not contain `column`.
    pub fn required(&self, column: &'static str) -> Result<usize, ReaderError> {
        self.optional(column).ok_or(ReaderError::MissingColumn(column))
    }
}
