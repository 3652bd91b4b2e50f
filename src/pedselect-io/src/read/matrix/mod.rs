use std::path::Path;

use ahash::AHashMap;
use anyhow::Result;
use log::info;

use kinship::KinshipMatrix;
use located_error::LocatedError;

use super::{ReaderError, TsvReader};

/// Parse a square kinship matrix: header `id  <id_1> ... <id_n>`, then one row per identifier.
///
/// Rows are matched to columns by identifier, not by position: rows may be listed in any order.
///
/// # Errors
/// - `UnknownRow` if a row identifier is absent from the header.
/// - `DuplicateId` if a row is listed twice.
/// - `MissingRows` if any header identifier lacks a row.
/// - `InvalidField` if any coefficient cannot be parsed.
/// - any `KinshipError` raised while validating the matrix (asymmetry, out-of-range values, etc.)
pub fn parse_kinship_matrix(mut reader: TsvReader) -> Result<KinshipMatrix> {
    let header = reader.header()?;
    let ids: Vec<String> = header.names().iter().skip(1).cloned().collect();
    let column_of: AHashMap<&str, usize> = ids.iter().enumerate().map(|(i, id)| (id.as_str(), i)).collect();

    let mut rows: Vec<Option<Vec<f64>>> = vec![None; ids.len()];
    for row in reader.rows()? {
        let id = row.required(0, "id").loc("While parsing kinship matrix")?;
        let index = column_of.get(id).copied()
            .ok_or_else(|| ReaderError::UnknownRow{line: row.line, id: id.to_string()})
            .loc("While parsing kinship matrix")?;
        if rows[index].is_some() {
            return Err(ReaderError::DuplicateId(vec![id.to_string()])).loc("While parsing kinship matrix")
        }
        let values = row.fields.iter().enumerate().skip(1)
            .map(|(i, value)| value.parse::<f64>().map_err(|e| row.invalid(i, "kinship", e)))
            .collect::<Result<Vec<f64>, ReaderError>>()
            .loc("While parsing kinship matrix")?;
        rows[index] = Some(values);
    }

    let missing: Vec<String> = ids.iter().zip(&rows).filter(|(_, row)| row.is_none()).map(|(id, _)| id.clone()).collect();
    if !missing.is_empty() {
        return Err(ReaderError::MissingRows(missing)).loc("While parsing kinship matrix")
    }
    let rows: Vec<Vec<f64>> = rows.into_iter().flatten().collect();
    KinshipMatrix::from_dense(ids, &rows).loc("While validating kinship matrix")
}

/// Read a kinship matrix. See [`parse_kinship_matrix`].
pub fn read_kinship_matrix(path: &Path) -> Result<KinshipMatrix> {
    let loc_msg = || format!("While reading kinship matrix {}", path.display());
    let matrix = parse_kinship_matrix(TsvReader::open(path).with_loc(loc_msg)?).with_loc(loc_msg)?;
    info!("Read a {n}x{n} kinship matrix from {}", path.display(), n = matrix.len());
    Ok(matrix)
}
