use std::{collections::BTreeSet, path::Path};

use ahash::AHashSet;
use anyhow::Result;
use log::info;

use located_error::LocatedError;

use super::{ReaderError, TsvReader};

/// Read a list of identifiers: one per line, no header. Only the first field of each line is considered.
///
/// # Errors
/// - if the file cannot be opened or read.
/// - `DuplicateId` if any identifier is listed more than once.
pub fn read_id_list(path: &Path) -> Result<Vec<String>> {
    let loc_msg = || format!("While reading identifier list {}", path.display());
    let mut reader = TsvReader::open(path).with_loc(loc_msg)?;
    let ids: Vec<String> = reader.rows().with_loc(loc_msg)?
        .into_iter()
        .filter_map(|row| row.fields.into_iter().next())
        .filter(|id| !id.is_empty())
        .collect();

    let mut seen = AHashSet::with_capacity(ids.len());
    let duplicates: BTreeSet<&String> = ids.iter().filter(|id| !seen.insert(*id)).collect();
    if !duplicates.is_empty() {
        let duplicates = duplicates.into_iter().cloned().collect();
        return Err(ReaderError::DuplicateId(duplicates)).with_loc(loc_msg)
    }
    info!("Read {} identifier(s) from {}", ids.len(), path.display());
    Ok(ids)
}
