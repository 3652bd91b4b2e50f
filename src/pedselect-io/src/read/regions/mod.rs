use std::{collections::BTreeSet, path::Path};

use ahash::{AHashMap, AHashSet};
use anyhow::Result;
use log::info;

use located_error::LocatedError;
use sampler::{Region, RegionAssignment};

use super::{ReaderError, TsvReader};

/// Keep the first (id, value) pair of every identifier, and fail if any identifier is listed twice.
fn unique_pairs<T>(pairs: Vec<(String, T)>) -> Result<Vec<(String, T)>, ReaderError> {
    let mut seen = AHashSet::with_capacity(pairs.len());
    let duplicates: BTreeSet<&str> = pairs.iter()
        .map(|(id, _)| id.as_str())
        .filter(|id| !seen.insert(*id))
        .collect();
    match duplicates.is_empty() {
        true  => Ok(pairs),
        false => Err(ReaderError::DuplicateId(duplicates.into_iter().map(str::to_string).collect())),
    }
}

/// Parse a region lookup table (`id  region`). Missing regions (`NA`, `.`, empty field) are kept unassigned.
pub fn parse_region_lookup(mut reader: TsvReader) -> Result<RegionAssignment> {
    let header = reader.header()?;
    let id     = header.required("id").loc("While parsing region lookup header")?;
    let region = header.required("region").loc("While parsing region lookup header")?;

    let pairs = reader.rows()?
        .iter()
        .map(|row| -> Result<(String, Option<Region>), ReaderError> {
            let code = Region::parse_optional(row.get(region)).map_err(|e| row.invalid(region, "region", e))?;
            Ok((row.required(id, "id")?.to_string(), code))
        })
        .collect::<Result<Vec<(String, Option<Region>)>, ReaderError>>()
        .loc("While parsing region lookup")?;

    Ok(unique_pairs(pairs).loc("While parsing region lookup")?.into_iter().collect())
}

/// Read a region lookup table. See [`parse_region_lookup`].
pub fn read_region_lookup(path: &Path) -> Result<RegionAssignment> {
    let loc_msg = || format!("While reading region lookup {}", path.display());
    let assignment = parse_region_lookup(TsvReader::open(path).with_loc(loc_msg)?).with_loc(loc_msg)?;
    info!("Read the region of {} individual(s) from {}", assignment.len(), path.display());
    Ok(assignment)
}

/// Read an external sample name table (`id  name`).
pub fn read_sample_names(path: &Path) -> Result<AHashMap<String, String>> {
    let loc_msg = || format!("While reading sample names from {}", path.display());
    let mut reader = TsvReader::open(path).with_loc(loc_msg)?;
    let header = reader.header().with_loc(loc_msg)?;
    let id   = header.required("id").with_loc(loc_msg)?;
    let name = header.required("name").with_loc(loc_msg)?;

    let pairs = reader.rows()?
        .iter()
        .map(|row| -> Result<(String, String), ReaderError> {
            Ok((row.required(id, "id")?.to_string(), row.required(name, "name")?.to_string()))
        })
        .collect::<Result<Vec<(String, String)>, ReaderError>>()
        .with_loc(loc_msg)?;
    Ok(unique_pairs(pairs).with_loc(loc_msg)?.into_iter().collect())
}
