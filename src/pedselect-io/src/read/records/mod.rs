use std::{io::BufRead, path::Path};

use anyhow::Result;
use log::info;

use located_error::LocatedError;
use pedigree::{IndividualRecord, Origin, Sex};
use sampler::Region;

use super::{ReaderError, Row, TsvReader, MISSING_TOKENS};

fn optional(field: &str) -> Option<&str> {
    (!MISSING_TOKENS.contains(&field)).then_some(field)
}

/// Read raw individual records from a tab-separated file.
///
/// Columns: `id  father_id  mother_id  sex  [birth_place]  [birth_year]  [region]  [origin]`, in any order.
/// Missing parents, birth data and regions may be written as an empty field, `0`, `NA` or `.`.
/// The `origin` column of a repaired pedigree is preserved. Records without one are `recorded`.
///
/// # Errors
/// - if the file cannot be opened or read.
/// - `MissingColumn` if any of the `id`, `father_id`, `mother_id` or `sex` columns is absent.
/// - `MissingField` if a record lacks an identifier.
/// - `InvalidField` if a birth year, region or origin cannot be parsed.
pub fn read_records(path: &Path) -> Result<Vec<IndividualRecord>> {
    let loc_msg = || format!("While reading individual records from {}", path.display());
    let records = parse_records(TsvReader::open(path).with_loc(loc_msg)?).with_loc(loc_msg)?;
    info!("Read {} individual record(s) from {}", records.len(), path.display());
    Ok(records)
}

/// Parse individual records out of an already opened table. See [`read_records`].
pub fn parse_records(mut reader: TsvReader) -> Result<Vec<IndividualRecord>> {
    let header = reader.header()?;
    let columns = [
        header.required("id"),
        header.required("father_id"),
        header.required("mother_id"),
        header.required("sex"),
    ].into_iter().collect::<Result<Vec<usize>, ReaderError>>().loc("While parsing the header of individual records")?;
    let (id, father, mother, sex) = (columns[0], columns[1], columns[2], columns[3]);
    let birth_place = header.optional("birth_place");
    let birth_year  = header.optional("birth_year");
    let region      = header.optional("region");
    let origin      = header.optional("origin");

    let parse_record = |row: &Row| -> Result<IndividualRecord, ReaderError> {
        let sex = row.get(sex).parse::<Sex>().unwrap_or(Sex::Unknown);
        let mut record = IndividualRecord::new(row.required(id, "id")?, optional(row.get(father)), optional(row.get(mother)), sex);

        let place = birth_place.and_then(|i| optional(row.get(i)));
        let year  = match birth_year.map(|i| (i, optional(row.get(i)))) {
            Some((i, Some(year))) => Some(year.parse::<i32>().map_err(|e| row.invalid(i, "birth_year", e))?),
            _ => None,
        };
        record = record.with_birth(place, year);

        if let Some(i) = region {
            let code = Region::parse_optional(row.get(i)).map_err(|e| row.invalid(i, "region", e))?;
            if let Some(code) = code {
                record = record.with_region(code.code());
            }
        }

        if let Some(i) = origin {
            if let Some(value) = optional(row.get(i)) {
                record = record.with_origin(value.parse::<Origin>().map_err(|e| row.invalid(i, "origin", e))?);
            }
        }
        Ok(record)
    };

    reader.rows()?
        .iter()
        .map(parse_record)
        .collect::<Result<Vec<_>, _>>()
        .loc("While parsing individual records")
}
